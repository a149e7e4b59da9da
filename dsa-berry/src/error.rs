//! 样本构建的运行时错误.

use std::path::PathBuf;
use thiserror::Error;

/// 数据集构建与样本获取过程中的所有错误.
///
/// 所有错误都直接上抛给调用者, 内部不做任何重试或替代填充:
/// 用空白视角替代缺失视角会破坏多视角之间的几何对齐.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// 该阶段需要拼接上一阶段的输出, 但没有提供 `last_path`.
    #[error("stage {stage} chains the previous stage output, but `last_path` is not configured")]
    MissingLastPath {
        /// 阶段号.
        stage: u32,
    },

    /// 该阶段没有预设尺寸表, 需要显式给出 [`crate::StageConfig`].
    #[error("stage {0} has no preset size table")]
    UnsupportedStage(u32),

    /// 阶段号必须从 1 开始.
    #[error("stage number must be positive")]
    ZeroStage,

    /// 视角数必须为正.
    #[error("number of views must be positive")]
    NoViews,

    /// 裁剪尺寸不合法 (为零或超过完整尺寸).
    #[error("crop size {crop} on axis {axis} must be in 1..={size}")]
    InvalidCrop {
        /// 轴.
        axis: usize,
        /// 该轴裁剪尺寸.
        crop: usize,
        /// 该轴完整尺寸.
        size: usize,
    },

    /// 裁剪起点使窗口越出完整体数据.
    #[error("crop start {start} on axis {axis} must be in 0..={max}")]
    InvalidStart {
        /// 轴.
        axis: usize,
        /// 该轴起点.
        start: usize,
        /// 该轴允许的最大起点, 即完整尺寸减裁剪尺寸.
        max: usize,
    },

    /// 满足前缀的文件名中不包含任何数字, 或最后一段数字超出 `u32` 范围
    /// (大于 4294967295), 无法得到病例号.
    #[error("no usable case id in sample file name `{0}`")]
    NoCaseId(String),

    /// 样本索引越界.
    #[error("sample index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// 请求的索引.
        index: usize,
        /// 数据集大小.
        len: usize,
    },

    /// 底层 I/O 错误.
    #[error("I/O error on `{}`", .path.display())]
    Io {
        /// 出错路径.
        path: PathBuf,
        /// 原始错误.
        #[source]
        source: std::io::Error,
    },

    /// 2D 投影图像打开或解码失败.
    #[error("cannot read projection image `{}`", .path.display())]
    Image {
        /// 出错路径.
        path: PathBuf,
        /// 原始错误.
        #[source]
        source: image::ImageError,
    },

    /// nifti 体数据读取失败.
    #[error("cannot read nifti volume `{}`", .path.display())]
    Nifti {
        /// 出错路径.
        path: PathBuf,
        /// 原始错误.
        #[source]
        source: nifti::NiftiError,
    },

    /// npy 体数据读取失败.
    #[error("cannot read npy volume `{}`", .path.display())]
    Npy {
        /// 出错路径.
        path: PathBuf,
        /// 原始错误.
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    /// 读到的数据形状与阶段配置不符.
    #[error("`{}` has shape {found:?}, expected {expected:?}", .path.display())]
    ShapeMismatch {
        /// 出错路径.
        path: PathBuf,
        /// 期望形状.
        expected: Vec<usize>,
        /// 实际形状.
        found: Vec<usize>,
    },

    /// 文件中的数据不是 3D 体数据.
    #[error("`{}` is not a 3D volume (shape {found:?})", .path.display())]
    NotVolume {
        /// 出错路径.
        path: PathBuf,
        /// 实际形状.
        found: Vec<usize>,
    },

    /// 投影图像像素值全部相同, 无法做 min-max 归一化.
    #[error("projection image `{}` has zero dynamic range", .path.display())]
    DegenerateImage {
        /// 出错路径.
        path: PathBuf,
    },

    /// 反投影器输出的体数据, 或投影图像, 与样本栈的形状不符.
    #[error("view {view} has shape {found:?}, which does not fit the sample stack (expected {expected:?})")]
    ProjectorShape {
        /// 视角索引.
        view: usize,
        /// 期望形状.
        expected: Vec<usize>,
        /// 实际形状.
        found: Vec<usize>,
    },

    /// 组装后的样本中出现了 NaN 或 inf.
    #[error("sample of case {case_id} contains non-finite values")]
    NonFinite {
        /// 病例号.
        case_id: u32,
    },

    /// TOML 配置解析失败.
    #[cfg(feature = "serde")]
    #[error("invalid dataset options")]
    Toml(#[from] toml::de::Error),
}

/// 样本构建结果.
pub type Result<T> = std::result::Result<T, DatasetError>;
