use std::ops::Index;
use std::path::Path;

use ndarray::{Array2, ArrayView2};
use ndarray_npy::{read_npy, write_npy, ReadNpyError, WriteNpyError};

use crate::consts::projection::{FAR, NEAR};
use crate::consts::{SIM_HEIGHT, SIM_WIDTH};
use crate::Idx2d;

mod aov;

pub mod save;
pub mod window;

pub use save::ImgWriteVis;
pub use window::DepthWindow;

/// 打开/解码原始深度文件错误.
#[derive(Debug)]
pub enum OpenDepthError {
    /// 底层 OpenEXR 文件读取错误.
    Exr(exr::error::Error),

    /// 文件中不存在期望的深度通道.
    MissingChannel(&'static str),

    /// 文件自身声明的尺寸与模拟器渲染分辨率不一致.
    ///
    /// 第一个参数代表期望的 (高, 宽), 第二个参数代表文件实际声明的 (高, 宽).
    ShapeMismatch(Idx2d, Idx2d),
}

/// 从 exr 文件读出的原始深度通道.
///
/// 样本为规格化的非线性深度缓冲值, 尚未线性化. 数组形状以文件自身声明的
/// data window 为准, (高, 宽) 格式.
#[derive(Debug, Clone)]
pub struct RawDepth {
    data: Array2<f32>,
}

impl Index<Idx2d> for RawDepth {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl RawDepth {
    /// 打开 exr 文件并读出其中的深度 AOV 通道. `path` 为 exr 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OpenDepthError> {
        aov::read_depth_channel(path)
    }

    /// 根据裸通道数据直接创建 `RawDepth` 实体.
    ///
    /// # 注意
    ///
    /// 该方法可能会创建与任何 exr 文件都不对应的实体,
    /// 因此你应仅将其用于实验目的.
    #[inline]
    pub fn fake(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// 文件声明的形状, (高, 宽) 格式.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let s = self.data.shape();
        (s[0], s[1])
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }
}

/// 透视投影参数, 包含远/近裁剪面距离.
///
/// 该结构是只读的. 若要修改投影参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct Projection {
    far: f32,
    near: f32,
}

impl Projection {
    /// 构建投影参数.
    ///
    /// `far` 和 `near` 必须为有限正值且 `near < far`, 否则返回 `None`.
    pub fn new(far: f32, near: f32) -> Option<Projection> {
        if far.is_finite() && 0.0 < near && near < far {
            Some(Self { far, near })
        } else {
            None
        }
    }

    /// 构建 EndoMapper Simulator 序列所使用的投影参数. 远裁剪面为
    /// 4.0 米, 近裁剪面为 0.01 米.
    #[inline]
    pub const fn from_sim_endomapper() -> Projection {
        Self {
            far: FAR,
            near: NEAR,
        }
    }

    /// 远裁剪面距离.
    #[inline]
    pub fn far(&self) -> f32 {
        self.far
    }

    /// 近裁剪面距离.
    #[inline]
    pub fn near(&self) -> f32 {
        self.near
    }

    /// 线性化系数 (z, w). 由投影矩阵逆推得到:
    /// `x = 1 - far/near`, `y = far/near`, `z = x/far`, `w = y/far`.
    #[inline]
    fn coefficients(&self) -> (f32, f32) {
        let x = 1.0 - self.far / self.near;
        let y = self.far / self.near;
        (x / self.far, y / self.far)
    }

    /// 将规格化的非线性深度缓冲值 `raw` 还原为以米为单位的度量深度.
    ///
    /// 即标准透视投影深度缓冲的逆变换
    /// `1 / (z * (1 - raw) + w)`. `raw` 为 0 时取值为远裁剪面距离,
    /// 为 1 时取值为 `1/w` (即近裁剪面距离).
    #[inline]
    pub fn linearize(&self, raw: f32) -> f32 {
        let (z, w) = self.coefficients();
        1.0 / (z * (1.0 - raw) + w)
    }
}

/// 度量深度图. 以米为单位的 f32 二维数组, 形状固定为
/// ([`SIM_HEIGHT`], [`SIM_WIDTH`]).
#[derive(Debug, Clone)]
pub struct DepthMap {
    data: Array2<f32>,
}

impl Index<Idx2d> for DepthMap {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl DepthMap {
    /// 将原始深度通道按投影参数逐元素线性化为度量深度.
    ///
    /// `raw` 声明的形状必须恰好为 ([`SIM_HEIGHT`], [`SIM_WIDTH`]), 否则返回
    /// [`OpenDepthError::ShapeMismatch`]. 这里显式校验而不做 reshape,
    /// 以避免在分辨率不符时静默产出损坏的数据.
    pub fn from_raw(raw: &RawDepth, proj: &Projection) -> Result<DepthMap, OpenDepthError> {
        let expected = (SIM_HEIGHT, SIM_WIDTH);
        let actual = raw.shape();
        if actual != expected {
            return Err(OpenDepthError::ShapeMismatch(expected, actual));
        }

        let data = raw.data.mapv(|v| proj.linearize(v));
        Ok(Self { data })
    }

    /// 从 f32 npy 文件打开度量深度图.
    pub fn open_npy<P: AsRef<Path>>(path: P) -> Result<DepthMap, ReadNpyError> {
        let data: Array2<f32> = read_npy(path)?;
        Ok(Self { data })
    }

    /// 将度量深度图按原样保存为 f32 npy 文件.
    pub fn save_npy<P: AsRef<Path>>(&self, path: P) -> Result<(), WriteNpyError> {
        write_npy(path, &self.data)
    }

    /// 根据裸深度数据直接创建 `DepthMap` 实体.
    ///
    /// # 注意
    ///
    /// 该方法不校验形状与取值, 可能会创建不一致的实体,
    /// 因此你应仅将其用于实验目的.
    #[inline]
    pub fn fake(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// 形状, (高, 宽) 格式.
    #[inline]
    pub fn shape(&self) -> Idx2d {
        let s = self.data.shape();
        (s[0], s[1])
    }

    /// 像素总数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 深度的最小值与最大值, 只统计有限值.
    ///
    /// 图像为空或不含任何有限值时返回 `None`.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut it = self.data.iter().copied().filter(|v| v.is_finite());
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView2<'_, f32> {
        self.data.view()
    }
}
