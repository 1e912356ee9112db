#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供 EndoMapper Simulator 内窥镜序列数据集的结构化读取,
//! 以及向 MonoGS 模型 (TUM) 输入格式转换的基础组件.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 针对 Synapse 上发布的 EndoMapper Simulated Sequence
//!   数据集的目录组织方式, 没有对其它源的数据进行直接适配
//!   (但如果新数据按照相同模式进行组织, 也可以工作).
//! 2. 在非期望情况下, 程序会直接 panic, 而不会导致内存错误. As what Rust promises.
//!
//! # 功能导览
//!
//! ### 帧选取 ✅
//!
//! 把闭区间帧范围内存在的原始深度/彩色帧拷贝进输出目录,
//! 并统一重命名为 8 位零填充帧号.
//!
//! 实现位于 `endo-berry/src/dataset/sim_seq.rs`.
//!
//! ### 轨迹转换 ✅
//!
//! 分号分隔的轨迹 CSV -> TUM 格式 groundtruth 轨迹与 rgb/depth 索引文件.
//! 行位置即帧号, 表中不存在独立的帧号列.
//!
//! 实现位于 `endo-berry/src/trajectory`.
//!
//! ### 深度解码 ✅
//!
//! 读取 exr 深度 AOV 通道, 按数据集发布者给出的投影参数做深度缓冲
//! 线性化, 还原以米为单位的度量深度, 并持久化为 f32 npy.
//!
//! 实现位于 `endo-berry/src/data`.
//!
//! ### 深度可视化 ✅
//!
//! 度量深度按逐图 min-max 窗口规格化为 8-bit 灰度 png.
//!
//! 实现位于 `endo-berry/src/data/window.rs`.

/// 二维索引, 同时也可一定程度上用作非负整数向量. (高, 宽) 格式.
pub type Idx2d = (usize, usize);

/// 深度图像基础数据结构.
mod data;

pub use data::{DepthMap, DepthWindow, ImgWriteVis, OpenDepthError, Projection, RawDepth};

pub mod consts;

pub mod dataset;
pub mod prelude;
pub mod trajectory;
