//! EndoMapper Simulator 序列的文件布局约定与帧选取.
//!
//! 源序列目录布局 (Synapse 上的未处理形态):
//!
//! ```text
//! <input>/depth/aov_image_{frame:04}.exr
//! <input>/rgb/image_{frame:04}.png
//! <input>/trajectory.csv
//! ```
//!
//! 输出目录布局 (MonoGS 输入):
//!
//! ```text
//! <output>/rgb/{frame:08}.png
//! <output>/depth_exr/{frame:08}.exr
//! <output>/depth_npy/{frame:08}.npy
//! <output>/depth/{frame:08}.png
//! ```

use crate::data::{DepthMap, OpenDepthError, RawDepth};
use ndarray_npy::ReadNpyError;
use std::fs;
use std::io;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// 轨迹 CSV 在源序列中的文件名.
pub const TRAJECTORY_FILE: &str = "trajectory.csv";

/// 源序列中原始深度帧 (深度 AOV exr) 的文件名.
#[inline]
pub fn source_depth_name(frame: u32) -> String {
    format!("aov_image_{frame:04}.exr")
}

/// 源序列中彩色帧的文件名.
#[inline]
pub fn source_color_name(frame: u32) -> String {
    format!("image_{frame:04}.png")
}

/// 输出文件统一的 8 位零填充文件名主干.
///
/// 四种帧产物 (rgb png / exr / npy / depth png) 共用该主干,
/// 仅扩展名不同.
#[inline]
pub fn frame_stem(frame: u32) -> String {
    format!("{frame:08}")
}

/// 帧选取结果. 按模态分别记录实际拷贝成功的帧号 (升序).
///
/// 源目录中缺失的帧不会进入该结构, 也不会中断拷贝
/// (逐帧、逐模态独立跳过). 后续阶段均以该结构为准:
/// 索引文件和深度解码只处理真实落盘的帧.
#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    /// 拷贝成功的彩色帧号.
    pub color: Vec<u32>,

    /// 拷贝成功的原始深度帧号.
    pub depth: Vec<u32>,
}

impl CopyReport {
    /// 两种模态拷贝成功的帧总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.color.len() + self.depth.len()
    }

    /// 是否没有任何帧被拷贝.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.color.is_empty() && self.depth.is_empty()
    }
}

/// 将闭区间 `range` 内存在的原始帧拷贝进输出目录, 并统一重命名为
/// 8 位零填充帧号:
///
/// - 深度帧: `<input>/depth/aov_image_{f:04}.exr` -> `<output>/depth_exr/{f:08}.exr`
/// - 彩色帧: `<input>/rgb/image_{f:04}.png` -> `<output>/rgb/{f:08}.png`
///
/// 输出目录及两个子目录不存在时会被创建 (重复创建无害).
/// 源文件缺失的帧按模态独立跳过, 只记 debug 日志;
/// 其余底层 I/O 错误原样返回.
pub fn select_frames<P: AsRef<Path>, Q: AsRef<Path>>(
    input_root: P,
    output_root: Q,
    range: RangeInclusive<u32>,
) -> io::Result<CopyReport> {
    let input_root = input_root.as_ref();

    let depth_out = output_root.as_ref().join("depth_exr");
    let color_out = output_root.as_ref().join("rgb");
    fs::create_dir_all(&depth_out)?;
    fs::create_dir_all(&color_out)?;

    let mut report = CopyReport::default();
    for frame in range {
        let exr_src = input_root.join("depth").join(source_depth_name(frame));
        if exr_src.is_file() {
            fs::copy(&exr_src, depth_out.join(format!("{}.exr", frame_stem(frame))))?;
            report.depth.push(frame);
        } else {
            log::debug!("深度帧 {frame} 缺失, 跳过: {}", exr_src.display());
        }

        let png_src = input_root.join("rgb").join(source_color_name(frame));
        if png_src.is_file() {
            fs::copy(&png_src, color_out.join(format!("{}.png", frame_stem(frame))))?;
            report.color.push(frame);
        } else {
            log::debug!("彩色帧 {frame} 缺失, 跳过: {}", png_src.display());
        }
    }
    Ok(report)
}

/// 从指定帧号和路径创建已拷贝原始深度帧 (exr) 的加载器.
///
/// # 注意
///
/// 1. `path` 必须是目录, 否则程序 panic.
/// 2. `frames` 的所有取值 `value` 必须在 `path` 下有形如 `{value:08}.exr`
///   的文件, 否则加载器在迭代时会返回 `Result::Error`.
pub fn exr_loader<I: IntoIterator<Item = u32>, P: AsRef<Path>>(frames: I, path: P) -> ExrLoader {
    let path = path.as_ref().to_owned();
    assert!(path.is_dir());

    let mut frames: Vec<u32> = frames.into_iter().collect();
    frames.reverse();

    ExrLoader {
        path,
        frames_rev: frames,
    }
}

/// 原始深度帧 (exr) 加载器, 并在内部自动转换文件名.
#[derive(Debug)]
pub struct ExrLoader {
    path: PathBuf,
    frames_rev: Vec<u32>,
}

impl Iterator for ExrLoader {
    type Item = (u32, Result<RawDepth, OpenDepthError>);

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frames_rev.pop()?;

        self.path.push(format!("{}.exr", frame_stem(frame)));
        let data = RawDepth::open(self.path.as_path());
        self.path.pop();

        Some((frame, data))
    }
}

impl ExactSizeIterator for ExrLoader {
    #[inline]
    fn len(&self) -> usize {
        self.frames_rev.len()
    }
}

/// 从指定帧号和路径创建度量深度 (npy) 的加载器.
///
/// # 注意
///
/// 1. `path` 必须是目录, 否则程序 panic.
/// 2. `frames` 的所有取值 `value` 必须在 `path` 下有形如 `{value:08}.npy`
///   的文件, 否则加载器在迭代时会返回 `Result::Error`.
pub fn npy_loader<I: IntoIterator<Item = u32>, P: AsRef<Path>>(frames: I, path: P) -> NpyLoader {
    let path = path.as_ref().to_owned();
    assert!(path.is_dir());

    let mut frames: Vec<u32> = frames.into_iter().collect();
    frames.reverse();

    NpyLoader {
        path,
        frames_rev: frames,
    }
}

/// 度量深度 (npy) 加载器, 并在内部自动转换文件名.
#[derive(Debug)]
pub struct NpyLoader {
    path: PathBuf,
    frames_rev: Vec<u32>,
}

impl Iterator for NpyLoader {
    type Item = (u32, Result<DepthMap, ReadNpyError>);

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frames_rev.pop()?;

        self.path.push(format!("{}.npy", frame_stem(frame)));
        let data = DepthMap::open_npy(self.path.as_path());
        self.path.pop();

        Some((frame, data))
    }
}

impl ExactSizeIterator for NpyLoader {
    #[inline]
    fn len(&self) -> usize {
        self.frames_rev.len()
    }
}
