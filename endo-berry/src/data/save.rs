//! 图像的持久化存储.

use super::{DepthMap, DepthWindow};
use crate::consts::gray::GRAY;
use image::ImageResult;
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// `ImgWriteVis` trait 的意图是, 图像将以 "可视化友好" 的方式保存,
/// 而不是 "as is" 的方式. 这意味着, 对于 `DepthMap` 这类以米为单位存储的
/// 深度图, 在保存时会用其自身的 min-max 窗口规格化为肉眼可区分的灰度;
/// "as is" 的持久化由 [`DepthMap::save_npy`] 负责.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

/// 逐图 min-max 窗口规格化为 8-bit 灰度.
/// 常值深度图窗口退化, 整图以中灰色呈现; 个别非有限像素同样落到中灰.
impl ImgWriteVis for DepthMap {
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        let (height, width) = self.shape();
        let buf = match DepthWindow::from_depth(self) {
            Some(window) => {
                let mut buf = image::GrayImage::new(width as u32, height as u32);
                for ((h, w), &d) in self.data().indexed_iter() {
                    let gray = window.eval(d).unwrap_or(GRAY);
                    buf.put_pixel(w as u32, h as u32, image::Luma([gray]));
                }
                buf
            }
            None => image::GrayImage::from_pixel(width as u32, height as u32, image::Luma([GRAY])),
        };
        buf.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scratch_png(tag: &str) -> PathBuf {
        static SEQ: AtomicUsize = AtomicUsize::new(0);
        let n = SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "endo-berry-save-{}-{tag}-{n}.png",
            std::process::id()
        ))
    }

    #[test]
    fn test_save_min_max_mapping() {
        let map =
            DepthMap::fake(Array2::from_shape_vec((2, 2), vec![0.0, 1.0, 2.0, 4.0]).unwrap());
        let path = scratch_png("generic");
        map.save(&path).unwrap();

        let img = image::open(&path).unwrap().into_luma8();
        assert_eq!(img.dimensions(), (2, 2));

        // 最小值 -> 0, 最大值 -> 255, 中间值截断.
        assert_eq!(img.get_pixel(0, 0).0, [0]);
        assert_eq!(img.get_pixel(1, 0).0, [(255.0 * 0.25) as u8]);
        assert_eq!(img.get_pixel(0, 1).0, [(255.0 * 0.5) as u8]);
        assert_eq!(img.get_pixel(1, 1).0, [255]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_degenerate_is_mid_gray() {
        let map = DepthMap::fake(Array2::from_elem((3, 2), 1.5));
        let path = scratch_png("degenerate");
        map.save(&path).unwrap();

        let img = image::open(&path).unwrap().into_luma8();
        assert_eq!(img.dimensions(), (2, 3));
        assert!(img.pixels().all(|p| p.0 == [GRAY]));

        std::fs::remove_file(&path).unwrap();
    }
}
