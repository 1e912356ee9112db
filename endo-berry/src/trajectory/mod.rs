//! 位姿轨迹表.
//!
//! 解析模拟器随序列导出的分号分隔轨迹 CSV. 表中不存在独立的帧号列,
//! 行位置即帧号 (跳过表头后从 0 计), 这也是与图像帧对齐的唯一依据.

use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;

pub mod tum;

/// 轨迹表错误.
#[derive(Debug)]
pub enum TrajectoryError {
    /// 底层 CSV 读取/解析错误.
    Csv(csv::Error),

    /// 行内字段个数不足.
    ///
    /// 第一个参数代表行号, 第二个参数代表该行实际字段个数 (至少需要 8 个).
    TooFewFields(usize, usize),

    /// 时间戳字段无法解析为浮点秒.
    ///
    /// 第一个参数代表行号, 第二个参数代表原始字段内容.
    BadTimestamp(usize, String),

    /// 行号越界.
    ///
    /// 第一个参数代表请求的帧号, 第二个参数代表表内实际行数.
    RowOutOfRange(u32, usize),

    /// 其他底层 I/O 错误.
    Io(std::io::Error),
}

/// 一条位姿记录.
///
/// 只有时间戳在读入时被解析为浮点秒; 平移与四元数分量以字符串原样保存,
/// 写出时不做数值重解析, 从而与源表逐字节一致.
#[derive(Debug, Clone)]
pub struct PoseRecord {
    timestamp: f64,
    translation: [String; 3],
    quaternion: [String; 4],
}

impl PoseRecord {
    /// 解析一行记录. `row` 只用于错误报告.
    fn from_record(row: usize, record: &StringRecord) -> Result<PoseRecord, TrajectoryError> {
        if record.len() < 8 {
            return Err(TrajectoryError::TooFewFields(row, record.len()));
        }

        let timestamp = record[7]
            .trim()
            .parse::<f64>()
            .map_err(|_| TrajectoryError::BadTimestamp(row, record[7].to_owned()))?;

        Ok(PoseRecord {
            timestamp,
            translation: [
                record[0].to_owned(),
                record[1].to_owned(),
                record[2].to_owned(),
            ],
            quaternion: [
                record[3].to_owned(),
                record[4].to_owned(),
                record[5].to_owned(),
                record[6].to_owned(),
            ],
        })
    }

    /// 时间戳 (秒).
    #[inline]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// 平移分量 (tx, ty, tz), 原样字符串.
    #[inline]
    pub fn translation(&self) -> &[String; 3] {
        &self.translation
    }

    /// 单位四元数分量 (qx, qy, qz, qw), 原样字符串.
    #[inline]
    pub fn quaternion(&self) -> &[String; 4] {
        &self.quaternion
    }
}

/// 位姿轨迹表. 行序与源文件一致, 表头行已被丢弃.
#[derive(Debug, Clone)]
pub struct PoseTable {
    rows: Vec<PoseRecord>,
}

impl PoseTable {
    /// 打开分号分隔的轨迹 CSV 文件.
    ///
    /// 第一行视为表头并被丢弃. 随后每行至少需要 8 个字段: 前三个为平移,
    /// 接着四个为四元数 (qx, qy, qz, qw), 第八个为时间戳.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<PoseTable, TrajectoryError> {
        let reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_path(path.as_ref())
            .map_err(TrajectoryError::Csv)?;
        Self::collect_rows(reader)
    }

    /// 从任意 `Read` 打开轨迹表, 格式约定与 [`PoseTable::open`] 相同.
    pub fn from_reader<R: Read>(r: R) -> Result<PoseTable, TrajectoryError> {
        let reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(r);
        Self::collect_rows(reader)
    }

    fn collect_rows<R: Read>(mut reader: csv::Reader<R>) -> Result<PoseTable, TrajectoryError> {
        let mut rows = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(TrajectoryError::Csv)?;
            rows.push(PoseRecord::from_record(row, &record)?);
        }
        Ok(Self { rows })
    }

    /// 表内数据行数 (不含表头).
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 表内是否没有任何数据行.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 获取帧号 `frame` (即行号) 对应的位姿记录.
    ///
    /// 帧号越界时返回 [`TrajectoryError::RowOutOfRange`].
    pub fn record(&self, frame: u32) -> Result<&PoseRecord, TrajectoryError> {
        self.rows
            .get(frame as usize)
            .ok_or(TrajectoryError::RowOutOfRange(frame, self.rows.len()))
    }

    /// 检查闭区间帧范围是否整体落在表内.
    ///
    /// 调用者应在产生任何输出文件之前先做该校验,
    /// 以免越界的范围留下不一致的部分输出.
    pub fn check_range(&self, range: &RangeInclusive<u32>) -> Result<(), TrajectoryError> {
        let end = *range.end();
        if (end as usize) < self.rows.len() {
            Ok(())
        } else {
            Err(TrajectoryError::RowOutOfRange(end, self.rows.len()))
        }
    }
}
