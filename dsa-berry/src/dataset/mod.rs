//! 数据集操作.

use std::path::{Path, PathBuf};

pub mod index;
mod recon;
mod sample;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        mod batch;

        pub use batch::batch_seed;
    }
}

pub use index::{case_id, CaseEntry, CaseIndex};
pub use recon::DsaReconDataset;
pub use sample::Sample;

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}
