use std::path::Path;

use ndarray::{Array2, Array3, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use crate::error::{DatasetError, Result};
use crate::Idx2d;

pub mod normalize;
pub mod window;

pub use normalize::{min_max_normalize, DegeneratePolicy};
pub use window::{window_normalize, CtWindow};

/// 3D 体数据读取器.
///
/// 读取结果一律按 (z, H, W) 即 (深度, 高, 宽) 组织, 以后均按照该模式访问.
/// 实现者不应持有可变状态, 同一个读取器会被多个线程同时使用.
pub trait VolumeReader: Send + Sync {
    /// 读取 `path` 处的完整体数据.
    fn read_volume(&self, path: &Path) -> Result<Array3<f32>>;
}

/// nii / nii.gz 格式体数据读取器. gzip 压缩由 `nifti` 根据扩展名自动处理.
#[derive(Copy, Clone, Debug, Default)]
pub struct NiftiVolumeReader;

impl VolumeReader for NiftiVolumeReader {
    fn read_volume(&self, path: &Path) -> Result<Array3<f32>> {
        let nifti_err = |source| DatasetError::Nifti {
            path: path.to_owned(),
            source,
        };
        let obj = ReaderOptions::new().read_file(path).map_err(nifti_err)?;
        let data = obj.into_volume().into_ndarray::<f32>().map_err(nifti_err)?;
        let found = data.shape().to_vec();
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| DatasetError::NotVolume {
                path: path.to_owned(),
                found,
            })?;

        // [W, H, z] -> [z, H, W].
        // hint: 原第一维向下增长, 原第二维向右增长.
        Ok(data
            .permuted_axes([2, 1, 0])
            .as_standard_layout()
            .into_owned())
    }
}

/// npy 格式体数据读取器. 要求文件本身已按 (z, H, W) 保存为 `f32`.
#[derive(Copy, Clone, Debug, Default)]
pub struct NpyVolumeReader;

impl VolumeReader for NpyVolumeReader {
    fn read_volume(&self, path: &Path) -> Result<Array3<f32>> {
        ndarray_npy::read_npy(path).map_err(|source| DatasetError::Npy {
            path: path.to_owned(),
            source,
        })
    }
}

/// 以单通道 8-bit 灰度模式读取 2D 投影图像, 返回 (H, W) 形状的 `f32` 矩阵.
///
/// 若 `expected` 非空且与图像形状 (高, 宽) 不符, 返回 `Err`.
pub fn read_projection(path: &Path, expected: Option<Idx2d>) -> Result<Array2<f32>> {
    let gray = image::open(path)
        .map_err(|source| DatasetError::Image {
            path: path.to_owned(),
            source,
        })?
        .into_luma8();
    let (width, height) = gray.dimensions();
    let shape = (height as usize, width as usize);
    if let Some((h, w)) = expected.filter(|e| *e != shape) {
        return Err(DatasetError::ShapeMismatch {
            path: path.to_owned(),
            expected: vec![h, w],
            found: vec![shape.0, shape.1],
        });
    }

    // `GrayImage` 本身就是行优先存储.
    let raw: Vec<f32> = gray.into_raw().into_iter().map(f32::from).collect();
    let len = raw.len();
    Array2::from_shape_vec(shape, raw).map_err(|_| DatasetError::ShapeMismatch {
        path: path.to_owned(),
        expected: vec![shape.0, shape.1],
        found: vec![len],
    })
}
