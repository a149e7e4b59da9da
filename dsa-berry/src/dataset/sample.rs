//! 训练样本的组装.

use ndarray::{s, Array3, Array4, ArrayView2, ArrayView3, Axis};

use crate::crop::CropWindow;
use crate::error::{DatasetError, Result};

/// 一个训练样本.
#[derive(Clone, Debug)]
pub struct Sample {
    /// 病例号.
    pub case_id: u32,

    /// 本样本使用的裁剪窗口. 可据此取得对应的真值体数据.
    pub window: CropWindow,

    /// 体数据栈, 形状为 `[通道, 深度, 高, 宽]`.
    /// 前 `num_views` 个通道按视角顺序排列, 链式阶段最后追加上一阶段输出.
    pub volumes: Array4<f32>,

    /// 2D 投影栈, 形状为 `[num_views, 裁剪深度, 完整宽度]`. 只沿深度方向裁剪.
    pub projections: Array3<f32>,
}

impl Sample {
    /// 丢弃附加信息, 只保留 `(体数据栈, 投影栈)`.
    #[inline]
    pub fn into_pair(self) -> (Array4<f32>, Array3<f32>) {
        (self.volumes, self.projections)
    }

    /// 体数据栈的通道数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.volumes.len_of(Axis(0))
    }
}

/// 按通道顺序逐个写入的样本缓冲区. 所有内存在创建时一次分配.
pub(crate) struct SampleBuilder {
    window: CropWindow,
    volumes: Array4<f32>,
    projections: Array3<f32>,
    next_channel: usize,
    next_view: usize,
}

impl SampleBuilder {
    /// 按给定的体数据栈与投影栈形状分配缓冲区.
    pub(crate) fn new(window: CropWindow, volumes: [usize; 4], projections: [usize; 3]) -> Self {
        Self {
            window,
            volumes: Array4::zeros(volumes),
            projections: Array3::zeros(projections),
            next_channel: 0,
            next_view: 0,
        }
    }

    /// 写入一个视角: 反投影得到的体数据, 以及完整的归一化投影图像.
    pub(crate) fn push_view(&mut self, volume: Array3<f32>, image: ArrayView2<'_, f32>) -> Result<()> {
        let view = self.next_view;
        let mut dst = self.projections.index_axis_mut(Axis(0), view);
        let depth = self.window.depth_range();
        if image.nrows() < depth.end || image.ncols() != dst.ncols() {
            return Err(DatasetError::ProjectorShape {
                view,
                expected: vec![self.window.full_size()[0], dst.ncols()],
                found: image.shape().to_vec(),
            });
        }
        dst.assign(&image.slice(s![depth, ..]));
        self.push_volume(view, volume.view())?;
        self.next_view += 1;
        Ok(())
    }

    /// 追加上一阶段输出 (已裁剪) 作为最后一个通道.
    pub(crate) fn push_prior(&mut self, volume: ArrayView3<'_, f32>) -> Result<()> {
        self.push_volume(self.next_view, volume)
    }

    fn push_volume(&mut self, view: usize, volume: ArrayView3<'_, f32>) -> Result<()> {
        let mut dst = self.volumes.index_axis_mut(Axis(0), self.next_channel);
        if volume.shape() != dst.shape() {
            return Err(DatasetError::ProjectorShape {
                view,
                expected: dst.shape().to_vec(),
                found: volume.shape().to_vec(),
            });
        }
        dst.assign(&volume);
        self.next_channel += 1;
        Ok(())
    }

    /// 完成组装. 结果中含有 NaN 或 inf 时返回 `Err`.
    pub(crate) fn finish(self, case_id: u32) -> Result<Sample> {
        debug_assert_eq!(self.next_channel, self.volumes.len_of(Axis(0)));
        debug_assert_eq!(self.next_view, self.projections.len_of(Axis(0)));
        let finite = self.volumes.iter().chain(self.projections.iter()).all(|p| p.is_finite());
        if !finite {
            return Err(DatasetError::NonFinite { case_id });
        }
        Ok(Sample {
            case_id,
            window: self.window,
            volumes: self.volumes,
            projections: self.projections,
        })
    }
}
