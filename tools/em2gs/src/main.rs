//! 将 EndoMapper Simulator 序列数据集转换成 MonoGS 模型 (TUM) 输入格式.
//!
//! ```text
//! em2gs --input_folder <序列目录> [--start_frame 71] [--end_frame 320]
//! ```
//!
//! 输入目录应为从 Synapse 下载的未处理序列, 其下包含 `depth/`, `rgb/`
//! 与 `trajectory.csv`. 输出固定写入同级的 `<序列目录>_monogs`.

use clap::Parser;
use std::path::PathBuf;

mod runner;

/// 命令行参数.
#[derive(Debug, Parser)]
#[command(author, version, about = "EndoMapper Simulator 序列 -> MonoGS (TUM) 输入格式")]
struct Args {
    /// 需要转换的模拟器序列目录.
    #[arg(long = "input_folder")]
    input_folder: PathBuf,

    /// 开始帧编号 (闭区间).
    #[arg(long = "start_frame", default_value_t = endo_berry::consts::DEFAULT_START_FRAME)]
    start_frame: u32,

    /// 结束帧编号 (闭区间). 数据集文档建议的惯用片段为 71..=250.
    #[arg(long = "end_frame", default_value_t = endo_berry::consts::DEFAULT_END_FRAME)]
    end_frame: u32,
}

fn main() {
    simple_logger::init_with_level(log::Level::Info).expect("logger init");

    if let Err(err) = runner::run(&Args::parse()) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}
