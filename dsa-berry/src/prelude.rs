//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Shape3d};

pub use crate::config::{DatasetOptions, ProjectionSet, StageConfig};
pub use crate::crop::{CropWindow, FractionalWindow};
pub use crate::data::window::CtWindow;
pub use crate::data::{min_max_normalize, window_normalize, DegeneratePolicy};
pub use crate::data::{NiftiVolumeReader, NpyVolumeReader, VolumeReader};

pub use crate::consts::naming::GT_PREFIX;
pub use crate::consts::{CTA_MASK_HIGH_HU, CTA_MASK_LOW_HU};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{self, DsaReconDataset, Sample};

pub use crate::error::{DatasetError, Result};
pub use crate::project::{view_angle, BackProjector, ParallelBeam};
