//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;

pub use crate::consts::projection;
pub use crate::consts::{SIM_HEIGHT, SIM_WIDTH};

pub use crate::data::{DepthMap, DepthWindow, ImgWriteVis, OpenDepthError, Projection, RawDepth};

pub use crate::dataset::sim_seq::{self, CopyReport};
pub use crate::dataset::{self, home_dataset_dir_with};

pub use crate::trajectory::{tum, PoseRecord, PoseTable, TrajectoryError};
