//! 通用常量.

/// 文件命名规则.
pub mod naming {
    /// 输入根目录下, 真值体数据文件名的前缀. 只有以此开头的目录项才被视为样本.
    pub const GT_PREFIX: &str = "traingt";

    /// 输入根目录下, 存放 2D 投影图像的子目录.
    pub const TRAIN_DATA_DIR: &str = "traindata";

    /// 上一阶段网络输出文件名的前缀.
    pub const PREDICT_PREFIX: &str = "predict";

    /// 上一阶段网络输出文件的扩展名.
    pub const PREDICT_EXT: &str = "nii.gz";

    /// 2D 投影图像文件名.
    #[inline]
    pub fn projection_file(case_id: u32, view: usize) -> String {
        format!("train{case_id}_{view}.jpg")
    }

    /// 上一阶段网络输出文件名.
    #[inline]
    pub fn predict_file(case_id: u32) -> String {
        format!("{PREDICT_PREFIX}{case_id}.{PREDICT_EXT}")
    }
}

/// 各阶段的预设体数据尺寸, 按 (深度, 高, 宽) 组织.
pub mod preset {
    use crate::Shape3d;

    /// 第一阶段 (低分辨率) 完整体数据尺寸.
    pub const STAGE1_SIZE: Shape3d = [128, 256, 256];

    /// 第一阶段随机裁剪尺寸.
    pub const STAGE1_CROP: Shape3d = [32, 256, 256];

    /// 第二阶段 (全分辨率) 完整体数据尺寸.
    pub const STAGE2_SIZE: Shape3d = [395, 512, 512];

    /// 第二阶段随机裁剪尺寸.
    pub const STAGE2_CROP: Shape3d = [32, 512, 512];
}

/// 所有视角均匀分布的扫描总角度 (度).
pub const SWEEP_DEGREES: f64 = 180.0;

/// CTA 血管掩膜的 HU 窗下限.
pub const CTA_MASK_LOW_HU: f32 = -263.0;

/// CTA 血管掩膜的 HU 窗上限.
pub const CTA_MASK_HIGH_HU: f32 = 553.0;
