//! 逐样本 min-max 强度归一化.

use itertools::{Itertools, MinMaxResult};
use ndarray::{Array, ArrayBase, Data, Dimension};
use num::Float;

/// 投影图像动态范围为零 (所有像素值相同) 时的处理策略.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DegeneratePolicy {
    /// 直接报错, 整个样本构建失败.
    #[default]
    Fail,

    /// 将整幅图像置为 0.
    Zero,
}

impl DegeneratePolicy {
    /// 是否为报错策略.
    #[inline]
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

/// 减去最小值, 再除以 (相减后的) 最大值, 使输出落在 `[0, 1]`.
/// 原最小值映射为 0, 原最大值映射为 1.
///
/// 当 `image` 为空、只有一个元素、像素值全部相同或含有 inf 导致范围无意义时,
/// 返回 `None`. 该函数永远不会产生 NaN.
pub fn min_max_normalize<A, S, D>(image: &ArrayBase<S, D>) -> Option<Array<A, D>>
where
    A: Float,
    S: Data<Elem = A>,
    D: Dimension,
{
    let (min, max) = match image.iter().copied().minmax() {
        MinMaxResult::MinMax(lo, hi) => (lo, hi),
        MinMaxResult::OneElement(_) | MinMaxResult::NoElements => return None,
    };
    let range = max - min;
    if !(range.is_finite() && range > A::zero()) {
        return None;
    }
    Some(image.mapv(|p| (p - min) / range))
}
