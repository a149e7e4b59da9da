//! 多线程批量取样本.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use super::recon::DsaReconDataset;
use super::sample::Sample;
use crate::data::VolumeReader;
use crate::error::Result;
use crate::project::BackProjector;

/// 批量取样时第 `index` 个样本的随机数种子.
///
/// 只依赖 `seed` 和样本索引, 与线程调度无关.
#[inline]
pub fn batch_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

impl<P: BackProjector, R: VolumeReader> DsaReconDataset<P, R> {
    /// 并行获取 `indices` 中的所有样本, 结果按 `indices` 的顺序排列.
    ///
    /// 每个样本使用以 [`batch_seed`] 初始化的独立随机数生成器,
    /// 因此相同的 `seed` 与 `indices` 总是得到相同的结果.
    /// 任一样本失败时返回其中一个错误.
    pub fn par_batch(&self, indices: &[usize], seed: u64) -> Result<Vec<Sample>> {
        indices
            .par_iter()
            .map(|&index| {
                let mut rng = StdRng::seed_from_u64(batch_seed(seed, index));
                self.get_with_rng(index, &mut rng)
            })
            .collect()
    }
}
