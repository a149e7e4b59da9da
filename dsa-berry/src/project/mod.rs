//! 2D 投影 -> 3D 体数据的反投影.
//!
//! 反投影器只通过 [`BackProjector`] 与样本构建流程交互: 输入归一化后的 2D
//! 投影图像、采集角度与分数坐标裁剪窗口, 输出裁剪窗口内的 3D 体数据.
//! 几何模型可以被整体替换, 测试时也可以直接传入闭包.

use ndarray::{Array3, ArrayView2};

use crate::consts::SWEEP_DEGREES;
use crate::crop::FractionalWindow;
use crate::error::Result;
use crate::Shape3d;

mod parallel;

pub use parallel::ParallelBeam;

/// 反投影器.
///
/// # 约定
///
/// 1. 返回的体数据形状必须等于 `crop`, 即分数裁剪尺寸乘以完整尺寸.
/// 2. 像素到体素的映射依赖采集角度, 0 度与 180 度互为镜像.
/// 3. 只计算 `window` 内的体素, 不应构造完整体数据.
/// 4. 纯函数, 不持有可变状态.
pub trait BackProjector: Send + Sync {
    /// 将单张 2D 投影图像 `image` 按采集角度 `angle` (度) 反投影到 `window` 内.
    fn back_project(
        &self,
        image: ArrayView2<'_, f32>,
        angle: f64,
        window: &FractionalWindow,
        crop: Shape3d,
    ) -> Result<Array3<f32>>;
}

impl<F> BackProjector for F
where
    F: Fn(ArrayView2<'_, f32>, f64, &FractionalWindow, Shape3d) -> Result<Array3<f32>>
        + Send
        + Sync,
{
    #[inline]
    fn back_project(
        &self,
        image: ArrayView2<'_, f32>,
        angle: f64,
        window: &FractionalWindow,
        crop: Shape3d,
    ) -> Result<Array3<f32>> {
        self(image, angle, window, crop)
    }
}

/// 第 `view` 个视角的采集角度 (度).
///
/// `num_views` 个视角均匀分布在 180 度扫描范围内, 第一个视角为
/// `180 / num_views`, 最后一个视角为 180. `num_views` 为 0 时结果无意义.
#[inline]
pub fn view_angle(view: usize, num_views: usize) -> f64 {
    SWEEP_DEGREES / num_views as f64 * (view + 1) as f64
}

/// 按视角顺序给出所有采集角度.
pub fn view_angles(num_views: usize) -> impl ExactSizeIterator<Item = f64> {
    (0..num_views).map(move |i| view_angle(i, num_views))
}

#[cfg(test)]
mod tests {
    use super::{view_angle, view_angles, BackProjector};
    use crate::crop::FractionalWindow;
    use crate::error::Result;
    use itertools::Itertools;
    use ndarray::{Array2, Array3, ArrayView2};
    use rstest::rstest;

    #[rstest(/**/ view, num_views, expected,
             case(0, 1, 180.0),
             case(0, 3, 60.0),
             case(1, 3, 120.0),
             case(2, 3, 180.0),
             case(3, 4, 180.0),
             case(0, 8, 22.5),
    )]
    fn test_view_angle(view: usize, num_views: usize, expected: f64) {
        assert!((view_angle(view, num_views) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_angles_strictly_increasing() {
        for n in 1..=16 {
            let angles = view_angles(n).collect_vec();
            assert_eq!(angles.len(), n);
            assert!(angles.iter().tuple_windows().all(|(a, b)| a < b));
            assert!((angles[n - 1] - 180.0).abs() < 1e-9);
        }
    }

    fn fill_with_angle(
        _: ArrayView2<'_, f32>,
        angle: f64,
        _: &FractionalWindow,
        crop: [usize; 3],
    ) -> Result<Array3<f32>> {
        Ok(Array3::from_elem(crop, angle as f32))
    }

    #[test]
    fn test_fn_is_projector() {
        let img = Array2::<f32>::zeros((2, 2));
        let v = fill_with_angle
            .back_project(img.view(), 90.0, &FractionalWindow::FULL, [1, 2, 3])
            .unwrap();
        assert_eq!(v.shape(), &[1, 2, 3]);
        assert!(v.iter().all(|p| *p == 90.0));
    }
}
