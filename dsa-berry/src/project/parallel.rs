//! 平行束反投影 (smear).
//!
//! 坐标约定:
//!
//! 1. 投影图像的行对应体数据的深度轴 (第 0 轴), 按分数坐标一一对应.
//! 2. 体数据的 (高, 宽) 平面绕中心旋转采集角度后, 其在探测器方向上的分量决定
//!   投影图像的列. 0 度时列方向与宽方向一致, 180 度时恰好左右镜像.
//! 3. 所有计算都在分数坐标下进行, 因此结果与完整体数据的分辨率无关,
//!   并且只会对窗口内的体素求值.

use ndarray::{Array1, Array2, Array3, ArrayView2, Axis, Zip};

use super::BackProjector;
use crate::crop::FractionalWindow;
use crate::error::Result;
use crate::Shape3d;

/// 平行束几何下的参考反投影器.
///
/// 每个体素取其中心投影到探测器上的双线性插值. 投影落在探测器之外的体素为 0.
#[derive(Copy, Clone, Debug, Default)]
pub struct ParallelBeam;

/// 一维线性插值的两个采样点及后一个点的权重.
#[derive(Copy, Clone, Debug)]
struct Tap {
    lo: usize,
    hi: usize,
    weight: f32,
}

impl Tap {
    /// 像素坐标 `c` (像素中心位于整数处) 在长度为 `n` 的采样线上的插值.
    ///
    /// 超出 `[-0.5, n - 0.5]` 即探测器之外时返回 `None`.
    fn at(c: f64, n: usize) -> Option<Tap> {
        if n == 0 || !(-0.5..=n as f64 - 0.5).contains(&c) {
            return None;
        }
        let c = c.clamp(0.0, (n - 1) as f64);
        let lo = c.floor() as usize;
        let hi = (lo + 1).min(n - 1);
        Some(Tap {
            lo,
            hi,
            weight: (c - lo as f64) as f32,
        })
    }

    /// 由分数坐标 `t` 构建.
    #[inline]
    fn at_fraction(t: f64, n: usize) -> Option<Tap> {
        Self::at(t * n as f64 - 0.5, n)
    }

    #[inline]
    fn sample(&self, line: &Array1<f32>) -> f32 {
        line[self.lo] * (1.0 - self.weight) + line[self.hi] * self.weight
    }
}

impl ParallelBeam {
    /// 深度分数坐标 `t` 处, 投影图像在行方向插值后的一整行.
    fn detector_row(image: &ArrayView2<'_, f32>, t: f64) -> Option<Array1<f32>> {
        let tap = Tap::at_fraction(t, image.nrows())?;
        let lo = image.index_axis(Axis(0), tap.lo);
        let hi = image.index_axis(Axis(0), tap.hi);
        Some(&lo * (1.0 - tap.weight) + &hi * tap.weight)
    }
}

impl BackProjector for ParallelBeam {
    fn back_project(
        &self,
        image: ArrayView2<'_, f32>,
        angle: f64,
        window: &FractionalWindow,
        crop: Shape3d,
    ) -> Result<Array3<f32>> {
        let [nz, ny, nx] = crop;
        let (sin, cos) = angle.to_radians().sin_cos();
        let width = image.ncols();

        // 探测器列坐标只与 (高, 宽) 有关, 对所有深度共用.
        let columns = Array2::from_shape_fn((ny, nx), |(iy, ix)| {
            let y = window.voxel_center(1, iy, ny) - 0.5;
            let x = window.voxel_center(2, ix, nx) - 0.5;
            Tap::at_fraction(x * cos + y * sin + 0.5, width)
        });

        let mut volume = Array3::zeros(crop);
        for (iz, mut plane) in volume.axis_iter_mut(Axis(0)).enumerate() {
            let Some(row) = Self::detector_row(&image, window.voxel_center(0, iz, nz)) else {
                continue;
            };
            Zip::from(&mut plane).and(&columns).for_each(|v, tap| {
                if let Some(tap) = tap {
                    *v = tap.sample(&row);
                }
            });
        }
        Ok(volume)
    }
}
