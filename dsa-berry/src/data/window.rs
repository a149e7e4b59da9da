//! 固定物理窗口的强度归一化.

use crate::consts::{CTA_MASK_HIGH_HU, CTA_MASK_LOW_HU};
use ndarray::{Array, ArrayBase, Data, Dimension};

/// CT 窗口, 包含窗位 (window level) 和窗宽 (window width).
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CtWindow {
    level: f32,
    width: f32,
}

impl CtWindow {
    /// 构建 CT 窗.
    ///
    /// `level` 和 `width` 必须在合理范围内, 否则返回 `None`.
    pub fn new(level: f32, width: f32) -> Option<CtWindow> {
        if (-1e5..=1e5).contains(&level) && 0.0 < width && width <= 1e5 {
            Some(Self { level, width })
        } else {
            None
        }
    }

    /// 由窗下限 `low` 和窗上限 `high` 构建 CT 窗.
    ///
    /// 要求 `low < high`, 且换算出的窗位窗宽在合理范围内, 否则返回 `None`.
    pub fn from_bounds(low: f32, high: f32) -> Option<CtWindow> {
        if !(low.is_finite() && high.is_finite()) || low >= high {
            return None;
        }
        Self::new((low + high) / 2.0, high - low)
    }

    /// CTA 血管掩膜窗口. 窗下限 -263 HU, 窗上限 553 HU.
    #[inline]
    pub fn from_cta_mask() -> CtWindow {
        Self {
            level: (CTA_MASK_LOW_HU + CTA_MASK_HIGH_HU) / 2.0,
            width: CTA_MASK_HIGH_HU - CTA_MASK_LOW_HU,
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width / 2.0
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.level + self.width / 2.0
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// 将 `hu` 线性映射到 `[0, 1]`: 窗下限映射为 0, 窗上限映射为 1, 窗外截断.
    ///
    /// 如果 `hu` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn normalize(&self, hu: f32) -> Option<f32> {
        hu.is_finite().then(|| self.clamp_unit(hu))
    }

    /// 对整块数据逐元素应用 [`CtWindow::normalize`].
    ///
    /// NaN 会原样保留下来, 由调用方决定如何处理.
    pub fn normalize_array<S, D>(&self, data: &ArrayBase<S, D>) -> Array<f32, D>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        data.mapv(|hu| self.clamp_unit(hu))
    }

    #[inline]
    fn clamp_unit(&self, hu: f32) -> f32 {
        ((hu - self.lower_bound()) / self.width).clamp(0.0, 1.0)
    }
}

/// 以 `[low, high]` 为窗口线性归一化 `volume`: `low` 映射为 0, `high` 映射为 1,
/// 输出截断到 `[0, 1]`.
///
/// `low >= high` 或边界无意义时返回 `None`.
pub fn window_normalize<S, D>(volume: &ArrayBase<S, D>, low: f32, high: f32) -> Option<Array<f32, D>>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    CtWindow::from_bounds(low, high).map(|w| w.normalize_array(volume))
}

#[cfg(test)]
mod tests {
    use super::{window_normalize, CtWindow};
    use ndarray::{array, Array3};
    use proptest::prelude::*;

    fn is_valid_init(level: f32, width: f32) -> bool {
        CtWindow::new(level, width).is_some()
    }

    #[test]
    fn test_ct_window_invalid_input() {
        assert!(!is_valid_init(0.0, -1.0));
        assert!(!is_valid_init(0.0, 0.0));
        assert!(CtWindow::from_bounds(1.0, 1.0).is_none());
        assert!(CtWindow::from_bounds(2.0, 1.0).is_none());
        assert!(CtWindow::from_bounds(f32::NAN, 1.0).is_none());
    }

    fn float_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_cta_mask_bounds() {
        let w = CtWindow::from_cta_mask();
        assert!(float_eq(w.lower_bound(), -263.0));
        assert!(float_eq(w.upper_bound(), 553.0));
        assert_eq!(Some(w), CtWindow::from_bounds(-263.0, 553.0));
    }

    #[test]
    fn test_ct_window_generic() {
        // [60, 100]
        let ct = CtWindow::from_bounds(60.0, 100.0).unwrap();
        assert_eq!(ct.normalize(f32::NAN), None);
        assert_eq!(ct.normalize(f32::INFINITY), None);
        assert_eq!(ct.normalize(f32::MIN), Some(0.0));
        assert_eq!(ct.normalize(f32::MAX), Some(1.0));

        assert_eq!(ct.normalize(50.0), Some(0.0));
        assert!(float_eq(ct.normalize(60.0).unwrap(), 0.0));
        assert!(float_eq(ct.normalize(70.0).unwrap(), 0.25));
        assert!(float_eq(ct.normalize(80.0).unwrap(), 0.5));
        assert!(float_eq(ct.normalize(90.0).unwrap(), 0.75));
        assert!(float_eq(ct.normalize(100.0).unwrap(), 1.0));
        assert_eq!(ct.normalize(120.0), Some(1.0));
    }

    #[test]
    fn test_window_normalize_volume() {
        let v = array![[[-300.0f32, -263.0], [145.0, 553.0]], [[600.0, 0.0], [-1000.0, 2000.0]]];
        let n = window_normalize(&v, -263.0, 553.0).unwrap();
        assert_eq!(n.shape(), v.shape());
        assert_eq!(n[[0, 0, 0]], 0.0);
        assert_eq!(n[[0, 0, 1]], 0.0);
        assert!(float_eq(n[[0, 1, 0]], 0.5));
        assert_eq!(n[[0, 1, 1]], 1.0);
        assert_eq!(n[[1, 0, 0]], 1.0);
        assert!(float_eq(n[[1, 0, 1]], 263.0 / 816.0));
        assert!(window_normalize(&v, 1.0, 0.0).is_none());
    }

    #[test]
    fn test_nan_survives_array_normalize() {
        let v = Array3::from_elem((1, 1, 2), f32::NAN);
        let n = CtWindow::from_cta_mask().normalize_array(&v);
        assert!(n.iter().all(|p| p.is_nan()));
    }

    proptest! {
        #[test]
        fn window_output_in_unit_range(hu in -5000.0f32..5000.0, low in -2000.0f32..0.0, w in 1.0f32..3000.0) {
            let win = CtWindow::from_bounds(low, low + w).unwrap();
            let v = win.normalize(hu).unwrap();
            prop_assert!((0.0..=1.0).contains(&v));
        }

        #[test]
        fn unit_window_is_idempotent(data in proptest::collection::vec(-3.0f32..3.0, 1..64)) {
            let v = ndarray::Array1::from(data);
            let once = window_normalize(&v, 0.0, 1.0).unwrap();
            let twice = window_normalize(&once, 0.0, 1.0).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
