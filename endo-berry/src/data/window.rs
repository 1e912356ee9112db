use super::DepthMap;

/// 深度可视化窗口, 包含窗下限 (lower) 和窗上限 (upper).
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct DepthWindow {
    lower: f32,
    upper: f32,
}

impl DepthWindow {
    /// 构建深度窗.
    ///
    /// `lower` 和 `upper` 必须均为有限值且 `lower < upper`, 否则返回 `None`.
    pub fn new(lower: f32, upper: f32) -> Option<DepthWindow> {
        if lower.is_finite() && upper.is_finite() && lower < upper {
            Some(Self { lower, upper })
        } else {
            None
        }
    }

    /// 从深度图自身的取值范围构建窗口. 这是逐图 min-max,
    /// 而不是全局固定范围.
    ///
    /// 当深度图为常值 (max == min) 或不含任何有限值时窗口退化,
    /// 返回 `None`.
    pub fn from_depth(map: &DepthMap) -> Option<DepthWindow> {
        let (lo, hi) = map.min_max()?;
        Self::new(lo, hi)
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.lower
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.upper
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.upper - self.lower
    }

    /// 求在当前窗口设置下, 深度值 `d` 对应的灰度图像素整数值 (0 <= value <= 255).
    ///
    /// 如果 `d` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, d: f32) -> Option<u8> {
        if !d.is_finite() {
            return None;
        }
        if d <= self.lower {
            Some(u8::MIN)
        } else if d >= self.upper {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some((((d - self.lower) / self.width()) * 255.0) as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DepthMap;
    use ndarray::Array2;

    fn is_valid_init(lower: f32, upper: f32) -> bool {
        DepthWindow::new(lower, upper).is_some()
    }

    #[test]
    fn test_depth_window_invalid_input() {
        assert!(!is_valid_init(1.0, 1.0));
        assert!(!is_valid_init(2.0, 1.0));
        assert!(!is_valid_init(f32::NAN, 1.0));
        assert!(!is_valid_init(0.0, f32::INFINITY));
    }

    #[test]
    fn test_depth_window_generic() {
        // [0, 4]
        let w = DepthWindow::new(0.0, 4.0).unwrap();
        assert_eq!(w.eval(f32::NAN), None);
        assert_eq!(w.eval(f32::MIN), Some(0));
        assert_eq!(w.eval(f32::MAX), Some(255));

        assert_eq!(w.eval(-1.0), Some(0));
        assert_eq!(w.eval(0.0), Some(0));

        assert_eq!(w.eval(1.0).unwrap(), (255.0 * 0.25) as u8);
        assert_eq!(w.eval(2.0).unwrap(), (255.0 * 0.5) as u8);
        assert_eq!(w.eval(3.0).unwrap(), (255.0 * 0.75) as u8);

        // boundary
        assert_eq!(w.eval(3.999), Some(254));
        // -- boundary

        assert_eq!(w.eval(4.0), Some(u8::MAX));
        assert_eq!(w.eval(5.0), Some(u8::MAX));
    }

    #[test]
    fn test_from_depth() {
        let map =
            DepthMap::fake(Array2::from_shape_vec((2, 2), vec![0.5, 2.0, 1.0, 0.25]).unwrap());
        let w = DepthWindow::from_depth(&map).unwrap();
        assert_eq!(w.lower_bound(), 0.25);
        assert_eq!(w.upper_bound(), 2.0);

        // 数组最小值映射到 0, 最大值映射到 255.
        assert_eq!(w.eval(0.25), Some(0));
        assert_eq!(w.eval(2.0), Some(255));
    }

    #[test]
    fn test_from_depth_degenerate() {
        // 常值深度图没有有效窗口.
        let map = DepthMap::fake(Array2::from_elem((2, 2), 1.5));
        assert!(DepthWindow::from_depth(&map).is_none());
    }
}
