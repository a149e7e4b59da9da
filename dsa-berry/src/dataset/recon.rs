//! 分阶段三维重建网络的训练数据集.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::index::CaseIndex;
use super::sample::{Sample, SampleBuilder};
use crate::config::{DatasetOptions, StageConfig};
use crate::consts::naming::{predict_file, projection_file, GT_PREFIX, TRAIN_DATA_DIR};
use crate::crop::CropWindow;
use crate::data::{min_max_normalize, read_projection, CtWindow, DegeneratePolicy};
use crate::data::{NiftiVolumeReader, VolumeReader};
use crate::error::{DatasetError, Result};
use crate::project::{view_angles, BackProjector, ParallelBeam};
use crate::Shape3d;

/// 训练数据集.
///
/// 目录结构:
///
/// ```text
/// <input_path>/
///   traingt<id>.nii.gz                     真值体数据, 决定样本集合与顺序
///   traindata/<n>view[_low]/train<id>_<v>.jpg   第 v 个视角的 2D 投影
/// <last_path>/
///   predict<id>.nii.gz                     上一阶段网络输出 (链式阶段)
/// ```
///
/// 每次取样本都会重新抽取裁剪窗口并重新读取所有文件, 不做任何缓存.
pub struct DsaReconDataset<P = ParallelBeam, R = NiftiVolumeReader> {
    config: StageConfig,
    num_views: usize,
    view_dir: PathBuf,
    prior_dir: Option<PathBuf>,
    degenerate: DegeneratePolicy,
    index: CaseIndex,
    projector: P,
    reader: R,
    rng: StdRng,
}

impl DsaReconDataset {
    /// 使用平行束反投影器与 nifti 读取器打开数据集.
    pub fn open(options: &DatasetOptions) -> Result<Self> {
        Self::with_parts(options, ParallelBeam, NiftiVolumeReader)
    }
}

impl<P: BackProjector, R: VolumeReader> DsaReconDataset<P, R> {
    /// 使用给定的反投影器与体数据读取器打开数据集.
    ///
    /// 先校验全部选项, 校验失败时不会访问文件系统. 之后扫描输入根目录建立索引.
    pub fn with_parts(options: &DatasetOptions, projector: P, reader: R) -> Result<Self> {
        let config = options.validate()?;
        let index = CaseIndex::scan(&options.input_path, GT_PREFIX)?;
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let view_dir = options
            .input_path
            .join(TRAIN_DATA_DIR)
            .join(config.projections().dir_name(options.num_views));
        let prior_dir = options.last_path.clone().filter(|_| config.is_chained());
        info!(
            "stage {}: {} views from {}, size {:?}, crop {:?}",
            config.stage(),
            options.num_views,
            view_dir.display(),
            config.size(),
            config.crop_size()
        );
        Ok(Self {
            config,
            num_views: options.num_views,
            view_dir,
            prior_dir,
            degenerate: options.degenerate,
            index,
            projector,
            reader,
            rng,
        })
    }

    /// 样本个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// 是否没有任何样本.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// 阶段配置.
    #[inline]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// 视角数.
    #[inline]
    pub fn num_views(&self) -> usize {
        self.num_views
    }

    /// 样本索引.
    #[inline]
    pub fn cases(&self) -> &CaseIndex {
        &self.index
    }

    /// 每个样本体数据栈的通道数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.num_views + usize::from(self.prior_dir.is_some())
    }

    /// 每个样本的 (体数据栈, 投影栈) 形状.
    pub fn sample_shapes(&self) -> ([usize; 4], [usize; 3]) {
        let [d, h, w] = self.config.crop_size();
        let (_, width) = self.config.projection_shape();
        ([self.channels(), d, h, w], [self.num_views, d, width])
    }

    /// 获取第 `index` 个样本, 裁剪窗口由数据集自带的随机数生成器抽取.
    ///
    /// 索引越界时不会推进随机数生成器.
    pub fn get(&mut self, index: usize) -> Result<Sample> {
        let case_id = self.index.get(index)?.case_id();
        let window = CropWindow::sample(self.config.size(), self.config.crop_size(), &mut self.rng)?;
        self.build(case_id, window)
    }

    /// 同 [`DsaReconDataset::get`], 但使用调用者提供的随机数生成器.
    pub fn get_with_rng<G: Rng + ?Sized>(&self, index: usize, rng: &mut G) -> Result<Sample> {
        let case_id = self.index.get(index)?.case_id();
        let window = CropWindow::sample(self.config.size(), self.config.crop_size(), rng)?;
        self.build(case_id, window)
    }

    /// 以固定的裁剪起点获取第 `index` 个样本.
    pub fn get_at(&self, index: usize, start: Shape3d) -> Result<Sample> {
        let case_id = self.index.get(index)?.case_id();
        let window = CropWindow::new(self.config.size(), self.config.crop_size(), start)?;
        self.build(case_id, window)
    }

    /// 读取第 `index` 个样本的真值体数据, 按 `window` 裁剪后做 CTA 掩膜窗归一化.
    pub fn target_volume(&self, index: usize, window: &CropWindow) -> Result<Array3<f32>> {
        let path = self.index.path(index)?;
        let volume = self.reader.read_volume(&path)?;
        let cropped = crop_volume(&path, &volume, window)?;
        Ok(CtWindow::from_cta_mask().normalize_array(&cropped))
    }

    fn build(&self, case_id: u32, window: CropWindow) -> Result<Sample> {
        debug!(
            "case {case_id}: crop {:?}..{:?}",
            window.start(),
            window.end()
        );
        let (volumes, projections) = self.sample_shapes();
        let mut builder = SampleBuilder::new(window, volumes, projections);
        let fractional = window.fractional();

        for (view, angle) in view_angles(self.num_views).enumerate() {
            let image = self.load_view(&self.view_dir.join(projection_file(case_id, view)))?;
            let volume =
                self.projector
                    .back_project(image.view(), angle, &fractional, window.crop_size())?;
            builder.push_view(volume, image.view())?;
        }

        if let Some(dir) = &self.prior_dir {
            let path = dir.join(predict_file(case_id));
            let prior = self.reader.read_volume(&path)?;
            builder.push_prior(crop_volume(&path, &prior, &window)?)?;
        }
        builder.finish(case_id)
    }

    /// 读取并归一化单个视角的 2D 投影图像.
    fn load_view(&self, path: &Path) -> Result<Array2<f32>> {
        let raw = read_projection(path, Some(self.config.projection_shape()))?;
        match min_max_normalize(&raw) {
            Some(image) => Ok(image),
            None if self.degenerate.is_fail() => Err(DatasetError::DegenerateImage {
                path: path.to_owned(),
            }),
            None => {
                warn!("{} has zero dynamic range, replaced by zeros", path.display());
                Ok(Array2::zeros(raw.raw_dim()))
            }
        }
    }
}

fn crop_volume<'a>(
    path: &Path,
    volume: &'a Array3<f32>,
    window: &CropWindow,
) -> Result<ndarray::ArrayView3<'a, f32>> {
    window
        .slice(volume)
        .ok_or_else(|| DatasetError::ShapeMismatch {
            path: path.to_owned(),
            expected: window.full_size().to_vec(),
            found: volume.shape().to_vec(),
        })
}
