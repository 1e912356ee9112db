//! 程序运行函数.

use endo_berry::prelude::*;
use endo_berry::trajectory::tum::Modality;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::Args;

/// 转换错误.
#[derive(Debug)]
pub enum ConvertError {
    /// 轨迹表读取/写出错误, 或帧范围超出表内行数.
    Trajectory(TrajectoryError),

    /// 原始深度帧解码错误.
    ///
    /// 第一个参数代表出错的帧号.
    Depth(u32, OpenDepthError),

    /// 度量深度 npy 写出错误.
    NpyWrite(u32, ndarray_npy::WriteNpyError),

    /// 度量深度 npy 读入错误.
    NpyRead(u32, ndarray_npy::ReadNpyError),

    /// 深度可视化 png 写出错误.
    Raster(u32, image::ImageError),

    /// 其他底层 I/O 错误.
    Io(io::Error),
}

/// 实际运行.
pub fn run(args: &Args) -> Result<(), ConvertError> {
    let input = args.input_folder.as_path();
    assert!(input.is_dir(), "输入路径必须是序列目录: {}", input.display());

    let range = args.start_frame..=args.end_frame;
    assert!(
        args.start_frame <= args.end_frame,
        "开始帧 {} 不能大于结束帧 {}",
        args.start_frame,
        args.end_frame
    );
    if !endo_berry::consts::is_conventional_range(args.start_frame, args.end_frame) {
        warn!(
            "帧范围 {}..={} 超出数据集惯用片段 71..=250",
            args.start_frame, args.end_frame
        );
    }

    // 先整体校验帧范围, 越界时在产生任何输出前中止.
    let table = PoseTable::open(input.join(sim_seq::TRAJECTORY_FILE))
        .map_err(ConvertError::Trajectory)?;
    table.check_range(&range).map_err(ConvertError::Trajectory)?;

    let output = output_root(input);
    info!(
        "选取帧 {}..={} -> {}",
        args.start_frame,
        args.end_frame,
        output.display()
    );
    let report =
        sim_seq::select_frames(input, &output, range.clone()).map_err(ConvertError::Io)?;
    info!(
        "拷贝完成: 彩色 {} 帧, 深度 {} 帧",
        report.color.len(),
        report.depth.len()
    );

    write_tum_files(&table, range, &report, &output)?;
    decode_depth(&report, &output)?;
    rasterize_depth(&report, &output)?;

    println!("Convert Finished.");
    Ok(())
}

/// 输出目录: 输入目录同级的 `<name>_monogs`.
fn output_root(input: &Path) -> PathBuf {
    let mut name = input
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push("_monogs");
    input.with_file_name(name)
}

/// 写出 TUM 三件套: groundtruth.txt 由位姿表整段驱动,
/// rgb.txt / depth.txt 只为实际拷贝成功的帧发行.
fn write_tum_files(
    table: &PoseTable,
    range: RangeInclusive<u32>,
    report: &CopyReport,
    output: &Path,
) -> Result<(), ConvertError> {
    let gt = File::create(output.join("groundtruth.txt")).map_err(ConvertError::Io)?;
    tum::write_groundtruth(
        &mut BufWriter::new(gt),
        table,
        range,
        sim_seq::TRAJECTORY_FILE,
    )
    .map_err(ConvertError::Trajectory)?;

    for (modality, frames) in [
        (Modality::Color, &report.color),
        (Modality::Depth, &report.depth),
    ] {
        let file = File::create(output.join(modality.index_name())).map_err(ConvertError::Io)?;
        tum::write_index(&mut BufWriter::new(file), table, frames, modality)
            .map_err(ConvertError::Trajectory)?;
    }
    Ok(())
}

/// 深度解码阶段: exr -> 线性化度量深度 -> f32 npy.
fn decode_depth(report: &CopyReport, output: &Path) -> Result<(), ConvertError> {
    let npy_dir = output.join("depth_npy");
    fs::create_dir_all(&npy_dir).map_err(ConvertError::Io)?;

    let proj = Projection::from_sim_endomapper();
    let loader = sim_seq::exr_loader(report.depth.iter().copied(), output.join("depth_exr"));
    for (frame, raw) in loader {
        let raw = raw.map_err(|e| ConvertError::Depth(frame, e))?;
        let map = DepthMap::from_raw(&raw, &proj).map_err(|e| ConvertError::Depth(frame, e))?;
        map.save_npy(npy_dir.join(format!("{}.npy", sim_seq::frame_stem(frame))))
            .map_err(|e| ConvertError::NpyWrite(frame, e))?;
    }
    Ok(())
}

/// 深度可视化阶段: npy -> 逐图 min-max 规格化 -> 8-bit 灰度 png.
fn rasterize_depth(report: &CopyReport, output: &Path) -> Result<(), ConvertError> {
    let png_dir = output.join("depth");
    fs::create_dir_all(&png_dir).map_err(ConvertError::Io)?;

    let loader = sim_seq::npy_loader(report.depth.iter().copied(), output.join("depth_npy"));
    for (frame, map) in loader {
        let map = map.map_err(|e| ConvertError::NpyRead(frame, e))?;
        map.save(png_dir.join(format!("{}.png", sim_seq::frame_stem(frame))))
            .map_err(|e| ConvertError::Raster(frame, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_output_root() {
        assert_eq!(
            output_root(Path::new("/data/seq01")),
            Path::new("/data/seq01_monogs")
        );
        assert_eq!(
            output_root(Path::new("relative/seq")),
            Path::new("relative/seq_monogs")
        );
        // 尾随分隔符不影响结果.
        assert_eq!(
            output_root(Path::new("/data/seq01/")),
            Path::new("/data/seq01_monogs")
        );
    }

    fn scratch_root(tag: &str) -> PathBuf {
        static SEQ: AtomicUsize = AtomicUsize::new(0);
        let n = SEQ.fetch_add(1, Ordering::Relaxed);
        let root =
            std::env::temp_dir().join(format!("em2gs-runner-{}-{tag}-{n}", std::process::id()));
        fs::create_dir_all(&root).unwrap();
        root
    }

    /// 搭建一个只有彩色帧的最小序列 (深度 exr 缺失属于合法输入,
    /// 逐模态独立跳过).
    fn build_color_only_source(input: &Path, frames: std::ops::RangeInclusive<u32>) {
        fs::create_dir_all(input.join("depth")).unwrap();
        fs::create_dir_all(input.join("rgb")).unwrap();

        let mut csv = String::from("tx;ty;tz;qx;qy;qz;qw;timestamp\n");
        for i in 0..=*frames.end() {
            csv.push_str(&format!("{i};0;0;0;0;0;1;{}\n", i as f64 / 30.0));
        }
        fs::write(input.join("trajectory.csv"), csv).unwrap();

        for f in frames {
            let img = image::GrayImage::from_pixel(4, 4, image::Luma([f as u8]));
            img.save(input.join("rgb").join(sim_seq::source_color_name(f)))
                .unwrap();
        }
    }

    #[test]
    fn test_run_color_only_sequence() {
        let root = scratch_root("color-only");
        let input = root.join("seq");
        build_color_only_source(&input, 1..=4);

        let args = Args {
            input_folder: input.clone(),
            start_frame: 2,
            end_frame: 4,
        };
        run(&args).unwrap();

        let output = root.join("seq_monogs");
        assert!(output.join("rgb").join("00000002.png").is_file());
        assert!(output.join("rgb").join("00000004.png").is_file());
        assert!(output.join("depth_npy").is_dir());
        assert!(output.join("depth").is_dir());

        // groundtruth 覆盖整个闭区间 (3 行注释 + 3 行数据).
        let gt = fs::read_to_string(output.join("groundtruth.txt")).unwrap();
        assert_eq!(gt.lines().count(), 6);
        assert!(gt.lines().all(|l| l.starts_with('#')
            || l.split_whitespace().count() == 8));

        // rgb 索引只为实际拷贝成功的帧发行; 深度索引为空.
        let rgb = fs::read_to_string(output.join("rgb.txt")).unwrap();
        assert!(rgb.contains("rgb/00000002.png"));
        assert_eq!(rgb.lines().count(), 6);
        let depth = fs::read_to_string(output.join("depth.txt")).unwrap();
        assert_eq!(depth.lines().count(), 3);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_run_rejects_out_of_range_before_output() {
        let root = scratch_root("out-of-range");
        let input = root.join("seq");
        build_color_only_source(&input, 1..=4);

        let args = Args {
            input_folder: input.clone(),
            start_frame: 2,
            end_frame: 40,
        };
        let err = run(&args);
        assert!(matches!(
            err,
            Err(ConvertError::Trajectory(TrajectoryError::RowOutOfRange(40, 5)))
        ));

        // 中止发生在任何输出目录创建之前.
        assert!(!root.join("seq_monogs").exists());

        fs::remove_dir_all(&root).unwrap();
    }
}
