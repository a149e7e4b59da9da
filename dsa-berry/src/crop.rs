//! 随机裁剪窗口.
//!
//! 每个样本只抽取一次裁剪窗口, 所有视角和上一阶段输出都共用它,
//! 否则各通道在空间上无法对齐.
//!
//! 窗口同时以两种形式给出:
//!
//! 1. 绝对体素坐标 `start..end`, 用于直接切片体数据;
//! 2. 分数坐标 `start / size` 与 `crop / size`, 与分辨率无关,
//!   供反投影器在几何空间中使用.
//!
//! 两种形式总是由同一次抽取推导而来, 因此必然指向同一块区域.

use std::ops::Range;

use ndarray::{s, ArrayBase, ArrayView, Data, Ix3};
use rand::Rng;

use crate::error::{DatasetError, Result};
use crate::Shape3d;

/// 检查 `0 < crop[i] <= size[i]` 对每个轴成立.
pub fn check_crop(size: &Shape3d, crop: &Shape3d) -> Result<()> {
    for (axis, (&s, &c)) in size.iter().zip(crop.iter()).enumerate() {
        if c == 0 || c > s {
            return Err(DatasetError::InvalidCrop {
                axis,
                crop: c,
                size: s,
            });
        }
    }
    Ok(())
}

/// 绝对体素坐标下的 3D 裁剪窗口, 按 (深度, 高, 宽) 组织.
///
/// 反序列化时同样经过 [`CropWindow::new`] 的校验.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawCropWindow"))]
pub struct CropWindow {
    size: Shape3d,
    crop: Shape3d,
    start: Shape3d,
}

impl CropWindow {
    /// 直接构建窗口.
    ///
    /// 要求 `0 < crop[i] <= size[i]` 且 `start[i] + crop[i] <= size[i]`.
    pub fn new(size: Shape3d, crop: Shape3d, start: Shape3d) -> Result<Self> {
        check_crop(&size, &crop)?;
        for axis in 0..3 {
            let max = size[axis] - crop[axis];
            if start[axis] > max {
                return Err(DatasetError::InvalidStart {
                    axis,
                    start: start[axis],
                    max,
                });
            }
        }
        Ok(Self { size, crop, start })
    }

    /// 每个轴独立地从闭区间 `[0, size[i] - crop[i]]` 中均匀抽取起点.
    pub fn sample<R: Rng + ?Sized>(size: Shape3d, crop: Shape3d, rng: &mut R) -> Result<Self> {
        check_crop(&size, &crop)?;
        let start = [0, 1, 2].map(|i| rng.gen_range(0..=size[i] - crop[i]));
        Ok(Self { size, crop, start })
    }

    /// 完整体数据尺寸.
    #[inline]
    pub fn full_size(&self) -> Shape3d {
        self.size
    }

    /// 裁剪尺寸.
    #[inline]
    pub fn crop_size(&self) -> Shape3d {
        self.crop
    }

    /// 各轴起点 (含).
    #[inline]
    pub fn start(&self) -> Shape3d {
        self.start
    }

    /// 各轴终点 (不含).
    #[inline]
    pub fn end(&self) -> Shape3d {
        [0, 1, 2].map(|i| self.start[i] + self.crop[i])
    }

    /// 第 `axis` 轴的绝对区间. `axis >= 3` 时 panic.
    #[inline]
    pub fn range(&self, axis: usize) -> Range<usize> {
        self.start[axis]..self.start[axis] + self.crop[axis]
    }

    /// 深度方向 (第 0 轴) 的绝对区间. 2D 投影图像只沿该方向裁剪.
    #[inline]
    pub fn depth_range(&self) -> Range<usize> {
        self.range(0)
    }

    /// 与该窗口等价的分数坐标窗口.
    pub fn fractional(&self) -> FractionalWindow {
        FractionalWindow {
            start: [0, 1, 2].map(|i| self.start[i] as f64 / self.size[i] as f64),
            size: [0, 1, 2].map(|i| self.crop[i] as f64 / self.size[i] as f64),
        }
    }

    /// 从完整体数据中切出该窗口.
    ///
    /// `volume` 的形状必须等于 [`CropWindow::full_size`], 否则返回 `None`.
    pub fn slice<'a, A, S>(&self, volume: &'a ArrayBase<S, Ix3>) -> Option<ArrayView<'a, A, Ix3>>
    where
        S: Data<Elem = A>,
    {
        if volume.shape() != self.size.as_slice() {
            return None;
        }
        let [r0, r1, r2] = [0, 1, 2].map(|i| self.range(i));
        Some(volume.slice(s![r0, r1, r2]))
    }
}

/// 未经校验的 [`CropWindow`] 字段.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawCropWindow {
    size: Shape3d,
    crop: Shape3d,
    start: Shape3d,
}

#[cfg(feature = "serde")]
impl TryFrom<RawCropWindow> for CropWindow {
    type Error = DatasetError;

    fn try_from(raw: RawCropWindow) -> Result<Self> {
        Self::new(raw.size, raw.crop, raw.start)
    }
}

/// 分数坐标 (与分辨率无关) 下的 3D 裁剪窗口. 所有值都位于 `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FractionalWindow {
    /// 各轴起点占完整尺寸的比例.
    pub start: [f64; 3],

    /// 各轴裁剪尺寸占完整尺寸的比例.
    pub size: [f64; 3],
}

impl FractionalWindow {
    /// 完整体数据窗口.
    pub const FULL: FractionalWindow = FractionalWindow {
        start: [0.0; 3],
        size: [1.0; 3],
    };

    /// 第 `axis` 轴的分数终点.
    #[inline]
    pub fn end(&self, axis: usize) -> f64 {
        self.start[axis] + self.size[axis]
    }

    /// 将第 `axis` 轴上、裁剪尺寸为 `n` 的离散网格中第 `i` 个体素的中心映射到
    /// 完整体数据中的分数坐标.
    #[inline]
    pub fn voxel_center(&self, axis: usize, i: usize, n: usize) -> f64 {
        self.start[axis] + (i as f64 + 0.5) / n as f64 * self.size[axis]
    }
}
