//! 深度 AOV (OpenEXR) 通道读取.

use super::{OpenDepthError, RawDepth};
use exr::prelude::{read_first_flat_layer_from_file, Text};
use ndarray::Array2;
use std::path::Path;

/// 模拟器把深度 AOV 渲染进 exr 文件的 R 通道.
const DEPTH_CHANNEL: &str = "R";

/// 读取 exr 文件中的单一深度通道.
///
/// 只取第一个 flat layer. 返回数组的形状以该 layer 自身声明的 data window
/// 为准 ((高, 宽) 格式), 样本统一转换为 `f32`, 不做任何缩放或线性化.
pub(super) fn read_depth_channel<P: AsRef<Path>>(path: P) -> Result<RawDepth, OpenDepthError> {
    let image = read_first_flat_layer_from_file(path.as_ref()).map_err(OpenDepthError::Exr)?;
    let layer = image.layer_data;

    // exr 的 Vec2 为 (宽, 高) 序.
    let (width, height) = (layer.size.0, layer.size.1);

    let channel = layer
        .channel_data
        .list
        .iter()
        .find(|c| c.name == Text::from(DEPTH_CHANNEL))
        .ok_or(OpenDepthError::MissingChannel(DEPTH_CHANNEL))?;

    // 样本按行优先、自上而下存储, 与 (高, 宽) 数组布局一致.
    let values: Vec<f32> = channel.sample_data.values_as_f32().collect();
    debug_assert_eq!(values.len(), width * height);

    // 该操作不会生成 `Err`, 可直接 unwrap.
    let data = Array2::from_shape_vec((height, width), values).unwrap();
    Ok(RawDepth { data })
}
