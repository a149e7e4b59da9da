#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 为多视角 DSA 投影的分阶段三维重建网络构建训练样本.
//!
//! 一个样本由同一病例的 `num_views` 张 2D 投影图像构成: 每张图像经 min-max
//! 归一化后, 按其采集角度反投影到同一个随机裁剪窗口内, 再沿新的通道轴堆叠.
//! 第二阶段及以后还会拼接上一阶段网络的输出作为最后一个通道.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 体数据一律按 (深度, 高, 宽) 即 (z, y, x) 组织.
//! 2. 任何缺失或损坏的文件都会使当前样本直接返回 `Err`, 不做替代填充.
//!
//! # 开发计划
//!
//! ### 样本文件索引 ✅
//!
//! 只选取以 `traingt` 开头的目录项, 按文件名排序, 从最后一段数字取得病例号.
//!
//! 实现位于 `dsa-berry/src/dataset/index.rs`.
//!
//! ### 随机裁剪窗口 ✅
//!
//! 同时给出绝对体素坐标与分数坐标两种形式.
//!
//! 实现位于 `dsa-berry/src/crop.rs`.
//!
//! ### 强度归一化 ✅
//!
//! 1. 2D 投影图像的逐样本 min-max 归一化. ✅
//! 2. 体数据的 HU 窗归一化 (CTA 掩膜窗). ✅
//!
//! 实现位于 `dsa-berry/src/data`.
//!
//! ### 反投影 ✅
//!
//! 反投影器只是一个 trait, 附带一个平行束几何的参考实现.
//!
//! 实现位于 `dsa-berry/src/project`.
//!
//! ### 分阶段样本组装 ✅
//!
//! 实现位于 `dsa-berry/src/dataset/recon.rs`.
//!
//! ### 多线程批量取样本 ✅
//!
//! 需要打开 `rayon` feature. 结果与线程调度无关.
//!
//! ### 锥束几何反投影 ⌛️
//!
//! 目前只有平行束参考实现.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维尺寸, 按 (深度, 高, 宽) 组织.
pub type Shape3d = [usize; 3];

pub mod config;
pub mod consts;
pub mod crop;

/// 体数据与投影图像的读取及归一化.
pub mod data;

pub mod dataset;
mod error;
pub mod prelude;
pub mod project;

pub use config::{DatasetOptions, ProjectionSet, StageConfig};
pub use crop::{CropWindow, FractionalWindow};
pub use data::{CtWindow, DegeneratePolicy, NiftiVolumeReader, NpyVolumeReader, VolumeReader};
pub use dataset::{CaseIndex, DsaReconDataset, Sample};
pub use error::{DatasetError, Result};
pub use project::{BackProjector, ParallelBeam};
