//! 阶段配置与数据集选项.
//!
//! 阶段号同时决定了三件互相独立的事: 完整体数据尺寸, 裁剪尺寸, 以及 2D
//! 投影图像所在的子目录. 这里把它们收拢成一个显式的 [`StageConfig`],
//! 在构建数据集时一次性校验, 之后只传递该结构, 不再从裸阶段号反复推导.

use std::env;
use std::path::{Path, PathBuf};

use crate::consts::preset::*;
use crate::crop::check_crop;
use crate::data::DegeneratePolicy;
use crate::error::{DatasetError, Result};
use crate::{Idx2d, Shape3d};

/// 环境变量: 输入根目录.
pub const INPUT_DIR_ENV: &str = "DSA_INPUT_DIR";

/// 环境变量: 上一阶段输出目录.
pub const LAST_DIR_ENV: &str = "DSA_LAST_DIR";

/// 2D 投影图像集合.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProjectionSet {
    /// 低分辨率投影, 位于 `<views>view_low`.
    Low,

    /// 全分辨率投影, 位于 `<views>view`.
    Full,
}

impl ProjectionSet {
    /// 该集合在 `traindata` 下的子目录名.
    pub fn dir_name(&self, num_views: usize) -> String {
        match self {
            ProjectionSet::Low => format!("{num_views}view_low"),
            ProjectionSet::Full => format!("{num_views}view"),
        }
    }
}

/// 经过校验的单阶段配置.
///
/// 保证 `0 < crop_size[i] <= size[i]` 对每个轴成立. 阶段号大于 1
/// 时会拼接上一阶段网络的输出作为额外通道.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StageConfig {
    stage: u32,
    size: Shape3d,
    crop_size: Shape3d,
    projections: ProjectionSet,
}

impl StageConfig {
    /// 预设阶段配置.
    ///
    /// | 阶段 | 完整尺寸 | 裁剪尺寸 | 投影 |
    /// |---|---|---|---|
    /// | 1 | `[128, 256, 256]` | `[32, 256, 256]` | 低分辨率 |
    /// | 2 | `[395, 512, 512]` | `[32, 512, 512]` | 全分辨率 |
    ///
    /// 其他阶段返回 `Err`, 需使用 [`StageConfig::custom`].
    pub fn preset(stage: u32) -> Result<Self> {
        match stage {
            0 => Err(DatasetError::ZeroStage),
            1 => Self::custom(1, STAGE1_SIZE, STAGE1_CROP, ProjectionSet::Low),
            2 => Self::custom(2, STAGE2_SIZE, STAGE2_CROP, ProjectionSet::Full),
            s => Err(DatasetError::UnsupportedStage(s)),
        }
    }

    /// 自定义阶段配置. 阶段号必须为正, 裁剪尺寸必须不超过完整尺寸.
    pub fn custom(
        stage: u32,
        size: Shape3d,
        crop_size: Shape3d,
        projections: ProjectionSet,
    ) -> Result<Self> {
        if stage == 0 {
            return Err(DatasetError::ZeroStage);
        }
        check_crop(&size, &crop_size)?;
        Ok(Self {
            stage,
            size,
            crop_size,
            projections,
        })
    }

    /// 阶段号.
    #[inline]
    pub fn stage(&self) -> u32 {
        self.stage
    }

    /// 完整体数据尺寸.
    #[inline]
    pub fn size(&self) -> Shape3d {
        self.size
    }

    /// 裁剪尺寸.
    #[inline]
    pub fn crop_size(&self) -> Shape3d {
        self.crop_size
    }

    /// 投影图像集合.
    #[inline]
    pub fn projections(&self) -> ProjectionSet {
        self.projections
    }

    /// 是否需要拼接上一阶段的输出.
    #[inline]
    pub fn is_chained(&self) -> bool {
        self.stage > 1
    }

    /// 2D 投影图像应有的 (高, 宽), 即完整尺寸的前两个轴.
    #[inline]
    pub fn projection_shape(&self) -> Idx2d {
        (self.size[0], self.size[1])
    }
}

/// 数据集构建选项.
///
/// 只有 `stage`, `num_views` 和 `input_path` 是必需的. `size`, `crop_size`,
/// `projections` 缺省时取预设值.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DatasetOptions {
    /// 阶段号.
    pub stage: u32,

    /// 视角数.
    pub num_views: usize,

    /// 输入根目录. 其下存放真值体数据和 `traindata` 目录.
    pub input_path: PathBuf,

    /// 上一阶段网络输出目录. 阶段号大于 1 时必需.
    pub last_path: Option<PathBuf>,

    /// 裁剪随机数种子. 缺省时从系统熵源初始化.
    pub seed: Option<u64>,

    /// 零动态范围投影图像的处理策略.
    #[cfg_attr(feature = "serde", serde(default))]
    pub degenerate: DegeneratePolicy,

    /// 覆盖预设的完整体数据尺寸.
    pub size: Option<Shape3d>,

    /// 覆盖预设的裁剪尺寸.
    pub crop_size: Option<Shape3d>,

    /// 覆盖预设的投影图像集合.
    pub projections: Option<ProjectionSet>,
}

impl DatasetOptions {
    /// 以预设阶段配置初始化.
    pub fn new<P: AsRef<Path>>(stage: u32, num_views: usize, input_path: P) -> Self {
        Self {
            stage,
            num_views,
            input_path: input_path.as_ref().to_owned(),
            last_path: None,
            seed: None,
            degenerate: DegeneratePolicy::default(),
            size: None,
            crop_size: None,
            projections: None,
        }
    }

    /// 从环境变量初始化.
    ///
    /// 1. 若 `$DSA_INPUT_DIR` 非空, 则以其为输入根目录; 否则使用
    ///   `$HOME/dataset/dsa`. 两者都无法获得时返回 `None`.
    /// 2. 若 `$DSA_LAST_DIR` 非空, 则以其为上一阶段输出目录.
    pub fn from_env(stage: u32, num_views: usize) -> Option<Self> {
        let input = input_dir_from_env_or_home()?;
        let mut ans = Self::new(stage, num_views, input);
        ans.last_path = last_dir_from_env();
        Some(ans)
    }

    /// 从 TOML 文本解析.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// 设置上一阶段网络输出目录.
    pub fn with_last_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.last_path = Some(path.as_ref().to_owned());
        self
    }

    /// 设置裁剪随机数种子.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 设置零动态范围图像的处理策略.
    pub fn with_degenerate(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate = policy;
        self
    }

    /// 覆盖完整体数据尺寸与裁剪尺寸.
    pub fn with_geometry(mut self, size: Shape3d, crop_size: Shape3d) -> Self {
        self.size = Some(size);
        self.crop_size = Some(crop_size);
        self
    }

    /// 覆盖投影图像集合.
    pub fn with_projections(mut self, set: ProjectionSet) -> Self {
        self.projections = Some(set);
        self
    }

    /// 解析并校验阶段配置.
    ///
    /// 没有任何覆盖项时等价于 [`StageConfig::preset`]. 只要有覆盖项,
    /// 缺失的部分仍从预设中补齐; 此时无预设的阶段必须给出完整的尺寸和裁剪尺寸.
    pub fn stage_config(&self) -> Result<StageConfig> {
        if self.size.is_none() && self.crop_size.is_none() && self.projections.is_none() {
            return StageConfig::preset(self.stage);
        }
        let preset = StageConfig::preset(self.stage).ok();
        let pick = |over: Option<Shape3d>, f: fn(&StageConfig) -> Shape3d| {
            over.or_else(|| preset.as_ref().map(f))
                .ok_or(DatasetError::UnsupportedStage(self.stage))
        };
        let size = pick(self.size, StageConfig::size)?;
        let crop_size = pick(self.crop_size, StageConfig::crop_size)?;
        let projections = self
            .projections
            .or_else(|| preset.map(|p| p.projections()))
            .unwrap_or(if self.stage == 1 {
                ProjectionSet::Low
            } else {
                ProjectionSet::Full
            });
        StageConfig::custom(self.stage, size, crop_size, projections)
    }

    /// 校验全部选项. 不会访问文件系统.
    pub fn validate(&self) -> Result<StageConfig> {
        let config = self.stage_config()?;
        if self.num_views == 0 {
            return Err(DatasetError::NoViews);
        }
        if config.is_chained() && self.last_path.is_none() {
            return Err(DatasetError::MissingLastPath {
                stage: config.stage(),
            });
        }
        Ok(config)
    }
}

/// 获取输入根目录.
///
/// 1. 若环境变量 `$DSA_INPUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/dsa`.
pub fn input_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var(INPUT_DIR_ENV) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => crate::dataset::home_dataset_dir_with(["dsa"]),
    }
}

/// 若环境变量 `$DSA_LAST_DIR` 非空, 则返回其值.
pub fn last_dir_from_env() -> Option<PathBuf> {
    env::var(LAST_DIR_ENV)
        .ok()
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::{DatasetOptions, ProjectionSet, StageConfig};
    use crate::error::DatasetError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presets() {
        let s1 = StageConfig::preset(1).unwrap();
        assert_eq!(s1.size(), [128, 256, 256]);
        assert_eq!(s1.crop_size(), [32, 256, 256]);
        assert_eq!(s1.projections(), ProjectionSet::Low);
        assert!(!s1.is_chained());
        assert_eq!(s1.projection_shape(), (128, 256));

        let s2 = StageConfig::preset(2).unwrap();
        assert_eq!(s2.size(), [395, 512, 512]);
        assert_eq!(s2.crop_size(), [32, 512, 512]);
        assert_eq!(s2.projections(), ProjectionSet::Full);
        assert!(s2.is_chained());

        for s in [s1, s2] {
            for i in 0..3 {
                assert!(s.crop_size()[i] <= s.size()[i]);
            }
        }

        assert!(matches!(StageConfig::preset(0), Err(DatasetError::ZeroStage)));
        assert!(matches!(
            StageConfig::preset(3),
            Err(DatasetError::UnsupportedStage(3))
        ));
    }

    #[test]
    fn test_custom_rejects_large_crop() {
        let err = StageConfig::custom(1, [8, 8, 8], [8, 9, 8], ProjectionSet::Low).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidCrop { axis: 1, crop: 9, size: 8 }));
    }

    #[test]
    fn test_dir_name() {
        assert_eq!(ProjectionSet::Low.dir_name(3), "3view_low");
        assert_eq!(ProjectionSet::Full.dir_name(8), "8view");
    }

    #[test]
    fn test_missing_last_path() {
        let opts = DatasetOptions::new(2, 3, "/nonexistent");
        assert!(matches!(
            opts.validate(),
            Err(DatasetError::MissingLastPath { stage: 2 })
        ));
        assert!(opts.with_last_path("/nonexistent/last").validate().is_ok());
    }

    #[test]
    fn test_no_views() {
        let opts = DatasetOptions::new(1, 0, "/nonexistent");
        assert!(matches!(opts.validate(), Err(DatasetError::NoViews)));
    }

    #[test]
    fn test_overrides() {
        let opts = DatasetOptions::new(2, 3, "/x").with_geometry([16, 8, 8], [4, 8, 8]);
        let c = opts.stage_config().unwrap();
        assert_eq!(c.size(), [16, 8, 8]);
        assert_eq!(c.projections(), ProjectionSet::Full);

        // 第三阶段没有预设, 只给出尺寸时可以工作.
        let c = DatasetOptions::new(3, 3, "/x")
            .with_geometry([16, 8, 8], [4, 8, 8])
            .stage_config()
            .unwrap();
        assert!(c.is_chained());
        assert_eq!(c.projections(), ProjectionSet::Full);

        let opts = DatasetOptions::new(3, 3, "/x").with_projections(ProjectionSet::Low);
        assert!(matches!(
            opts.stage_config(),
            Err(DatasetError::UnsupportedStage(3))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_toml() {
        let opts = DatasetOptions::from_toml_str(
            r#"
            stage = 2
            num_views = 3
            input_path = "/data/dsa"
            last_path = "/data/stage1_out"
            seed = 42
            degenerate = "zero"
            "#,
        )
        .unwrap();
        assert_eq!(
            opts,
            DatasetOptions::new(2, 3, "/data/dsa")
                .with_last_path("/data/stage1_out")
                .with_seed(42)
                .with_degenerate(crate::data::DegeneratePolicy::Zero)
        );
        assert!(DatasetOptions::from_toml_str("stage = 1").is_err());
    }
}
