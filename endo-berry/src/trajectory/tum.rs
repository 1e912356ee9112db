//! MonoGS (TUM) 输入格式的文本输出.
//!
//! 三个文本产物 (`groundtruth.txt`, `rgb.txt`, `depth.txt`) 均以三行
//! `#` 注释开头, 随后每帧一行数据.

use super::{PoseRecord, PoseTable, TrajectoryError};
use itertools::Itertools;
use std::io::{self, Write};
use std::ops::RangeInclusive;

/// 索引文件的成像模态.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Modality {
    /// 彩色图像, 索引行指向 `rgb/{frame:08}.png`.
    Color,

    /// 深度可视化图像, 索引行指向 `depth/{frame:08}.png`.
    ///
    /// 注意: 指向的是最终栅格化的 png 输出, 而非 exr 或 npy 中间产物.
    /// 这是 TUM 下游约定, 即使该 png 在流水线中晚于索引文件生成.
    Depth,
}

impl Modality {
    /// 注释头第一行的模态描述.
    #[inline]
    fn description(&self) -> &'static str {
        match self {
            Self::Color => "color images",
            Self::Depth => "depth images",
        }
    }

    /// 索引文件自身的文件名.
    #[inline]
    pub fn index_name(&self) -> &'static str {
        match self {
            Self::Color => "rgb.txt",
            Self::Depth => "depth.txt",
        }
    }

    /// 帧号对应的图像相对路径 (相对输出根目录).
    pub fn relative_path(&self, frame: u32) -> String {
        match self {
            Self::Color => format!("rgb/{frame:08}.png"),
            Self::Depth => format!("depth/{frame:08}.png"),
        }
    }
}

/// 从源文件名派生 groundtruth 注释头的前缀:
/// 取以 '.' 分隔的最后三个部分, 用 '_' 连接.
pub fn filename_prefix(source_name: &str) -> String {
    let parts: Vec<&str> = source_name.split('.').collect();
    let skip = parts.len().saturating_sub(3);
    parts[skip..].iter().join("_")
}

/// 将闭区间帧范围内的位姿写为 TUM ground truth 轨迹.
///
/// 输出以三行注释开头, 随后每帧一行
/// `timestamp tx ty tz qx qy qz qw`, 按帧号升序. 平移与四元数字段
/// 按源表原样写出. 轨迹只由位姿表驱动, 与图像帧是否实际存在无关.
///
/// 帧范围越界时返回 [`TrajectoryError::RowOutOfRange`]. 该校验发生在
/// 任何内容写入 `w` 之前.
pub fn write_groundtruth<W: Write>(
    w: &mut W,
    table: &PoseTable,
    range: RangeInclusive<u32>,
    source_name: &str,
) -> Result<(), TrajectoryError> {
    let mut records = Vec::new();
    for frame in range {
        records.push(table.record(frame)?);
    }

    emit_groundtruth(w, &records, source_name).map_err(TrajectoryError::Io)
}

fn emit_groundtruth<W: Write>(
    w: &mut W,
    records: &[&PoseRecord],
    source_name: &str,
) -> io::Result<()> {
    writeln!(w, "# ground truth trajectory")?;
    writeln!(w, "# file: '{}'", filename_prefix(source_name))?;
    writeln!(w, "# timestamp tx ty tz qx qy qz qw")?;

    for rec in records {
        writeln!(
            w,
            "{} {} {}",
            rec.timestamp(),
            rec.translation().iter().join(" "),
            rec.quaternion().iter().join(" "),
        )?;
    }
    Ok(())
}

/// 将给定帧号集合写为 TUM 索引文件 (`rgb.txt` / `depth.txt`).
///
/// 每行格式为 `{timestamp} {relative_path}`. `frames` 应当为升序的、
/// 实际拷贝成功的帧号集合. 索引只为磁盘上真实存在的图像发行,
/// 源目录中缺失的帧不会出现在索引中.
///
/// 任一帧号越界时返回 [`TrajectoryError::RowOutOfRange`]. 该校验发生在
/// 任何内容写入 `w` 之前.
pub fn write_index<W: Write>(
    w: &mut W,
    table: &PoseTable,
    frames: &[u32],
    modality: Modality,
) -> Result<(), TrajectoryError> {
    let mut lines = Vec::with_capacity(frames.len());
    for &frame in frames {
        lines.push((table.record(frame)?.timestamp(), modality.relative_path(frame)));
    }

    emit_index(w, &lines, modality).map_err(TrajectoryError::Io)
}

fn emit_index<W: Write>(w: &mut W, lines: &[(f64, String)], modality: Modality) -> io::Result<()> {
    writeln!(w, "# {}", modality.description())?;
    writeln!(w, "# file: '{}'", modality.index_name())?;
    writeln!(w, "# timestamp filename")?;

    for (timestamp, path) in lines {
        writeln!(w, "{timestamp} {path}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_prefix() {
        assert_eq!(filename_prefix("trajectory.csv"), "trajectory_csv");
        assert_eq!(filename_prefix("a.b.c.d"), "b_c_d");
        assert_eq!(filename_prefix("noext"), "noext");
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(Modality::Color.relative_path(71), "rgb/00000071.png");
        assert_eq!(Modality::Depth.relative_path(3), "depth/00000003.png");
    }

    /// 构建 `n` 行的合成轨迹表, 第 `i` 行时间戳为 `i / 30` 秒.
    fn synthetic_table(n: usize) -> PoseTable {
        let mut src = String::from("tx;ty;tz;qx;qy;qz;qw;timestamp\n");
        for i in 0..n {
            let ts = i as f64 / 30.0;
            src.push_str(&format!("{i}.1;{i}.2;{i}.3;0;0;0;1;{ts}\n"));
        }
        PoseTable::from_reader(src.as_bytes()).unwrap()
    }

    #[test]
    fn test_write_groundtruth_exact() {
        let table = synthetic_table(3);
        let mut buf = Vec::new();
        write_groundtruth(&mut buf, &table, 1..=2, "trajectory.csv").unwrap();

        let expect = "\
# ground truth trajectory
# file: 'trajectory_csv'
# timestamp tx ty tz qx qy qz qw
0.03333333333333333 1.1 1.2 1.3 0 0 0 1
0.06666666666666667 2.1 2.2 2.3 0 0 0 1
";
        assert_eq!(std::str::from_utf8(&buf).unwrap(), expect);
    }

    #[test]
    fn test_write_groundtruth_line_count() {
        // 数据集惯用场景: 表有 0..400 行, 选取 71..=250.
        let table = synthetic_table(400);
        let mut buf = Vec::new();
        write_groundtruth(&mut buf, &table, 71..=250, "trajectory.csv").unwrap();

        let text = std::str::from_utf8(&buf).unwrap();
        let data_lines: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(data_lines.len(), 180);

        // 每行 8 个空白分隔字段, 按帧号升序.
        assert!(data_lines
            .iter()
            .all(|l| l.split_whitespace().count() == 8));
        assert!(data_lines[0].starts_with(&format!("{} ", 71.0 / 30.0)));
    }

    #[test]
    fn test_write_groundtruth_out_of_range_writes_nothing() {
        let table = synthetic_table(3);
        let mut buf = Vec::new();
        let err = write_groundtruth(&mut buf, &table, 0..=3, "trajectory.csv");

        assert!(matches!(err, Err(TrajectoryError::RowOutOfRange(3, 3))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_write_index_exact() {
        let table = synthetic_table(400);
        let mut buf = Vec::new();
        write_index(&mut buf, &table, &[71, 72], Modality::Color).unwrap();

        let text = std::str::from_utf8(&buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("# color images"));
        assert_eq!(lines.next(), Some("# file: 'rgb.txt'"));
        assert_eq!(lines.next(), Some("# timestamp filename"));
        assert_eq!(
            lines.next(),
            Some(format!("{} rgb/00000071.png", 71.0 / 30.0).as_str())
        );
        assert_eq!(
            lines.next(),
            Some(format!("{} rgb/00000072.png", 72.0 / 30.0).as_str())
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_write_index_skipped_frames() {
        // 索引只为实际拷贝成功的帧发行.
        let table = synthetic_table(10);
        let mut buf = Vec::new();
        write_index(&mut buf, &table, &[2, 5], Modality::Depth).unwrap();

        let text = std::str::from_utf8(&buf).unwrap();
        assert!(text.contains("depth/00000002.png"));
        assert!(text.contains("depth/00000005.png"));
        assert_eq!(text.lines().count(), 5);
    }
}
