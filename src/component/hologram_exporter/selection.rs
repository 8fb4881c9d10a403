use crate::config::RotationDirection;
use crate::error::{HologramError, Result};
use crate::tools::CircularRange;

/// 起點或終點把手
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeHandle {
    Start,
    End,
}

/// 使用者在環狀影格上選取的弧線
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeSelection {
    pub start: usize,
    pub end: usize,
    pub direction: Option<RotationDirection>,
    /// 勾選時先交換起點與終點再走訪
    pub loop_around: bool,
}

impl RangeSelection {
    #[must_use]
    pub const fn new(start: usize, end: usize, direction: RotationDirection) -> Self {
        Self {
            start,
            end,
            direction: Some(direction),
            loop_around: false,
        }
    }

    /// 涵蓋全部影格的選取（0 ..= N-1）
    #[must_use]
    pub const fn full(frame_count: usize, direction: RotationDirection) -> Self {
        Self::new(0, frame_count.saturating_sub(1), direction)
    }

    /// 交換（若有勾選）後的起點與終點
    #[must_use]
    pub const fn endpoints(&self) -> (usize, usize) {
        if self.loop_around {
            (self.end, self.start)
        } else {
            (self.start, self.end)
        }
    }

    #[must_use]
    pub const fn index(&self, handle: RangeHandle) -> usize {
        match handle {
            RangeHandle::Start => self.start,
            RangeHandle::End => self.end,
        }
    }

    /// 在寫入任何檔案之前檢查選取是否合法
    pub fn validate(&self, frame_count: usize) -> Result<RotationDirection> {
        if frame_count == 0 {
            return Err(HologramError::invalid_selection("沒有可用的影格"));
        }
        let direction = self
            .direction
            .ok_or_else(|| HologramError::invalid_selection("尚未選擇旋轉方向"))?;
        for (name, index) in [("起點", self.start), ("終點", self.end)] {
            if index >= frame_count {
                return Err(HologramError::invalid_selection(format!(
                    "{name} {index} 超出範圍 0..={}",
                    frame_count - 1
                )));
            }
        }
        Ok(direction)
    }

    /// 走訪順序：包含起點與終點的弧線
    ///
    /// 順時針由起點遞增到終點；逆時針由終點遞減回起點。
    pub fn traversal(&self, frame_count: usize) -> Result<CircularRange> {
        let direction = self.validate(frame_count)?;
        let (start, end) = self.endpoints();
        let (start, end) = (start as i64, end as i64);

        match direction {
            RotationDirection::Clockwise => {
                CircularRange::new(start, end + 1, direction.step(), frame_count)
            }
            RotationDirection::CounterClockwise => {
                CircularRange::new(end, start - 1, direction.step(), frame_count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(selection: RangeSelection, frame_count: usize) -> Vec<usize> {
        selection.traversal(frame_count).unwrap().iter().collect()
    }

    #[test]
    fn test_clockwise_traversal_is_inclusive() {
        let selection = RangeSelection::new(2, 5, RotationDirection::Clockwise);
        assert_eq!(order(selection, 10), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_clockwise_traversal_wraps_across_seam() {
        let selection = RangeSelection::new(8, 1, RotationDirection::Clockwise);
        assert_eq!(order(selection, 10), vec![8, 9, 0, 1]);
    }

    #[test]
    fn test_counter_clockwise_runs_from_end_back_to_start() {
        let selection = RangeSelection::new(2, 5, RotationDirection::CounterClockwise);
        assert_eq!(order(selection, 10), vec![5, 4, 3, 2]);

        let wrapping = RangeSelection::new(8, 1, RotationDirection::CounterClockwise);
        assert_eq!(order(wrapping, 10), vec![1, 0, 9, 8]);
    }

    #[test]
    fn test_loop_around_swaps_endpoints() {
        let mut selection = RangeSelection::new(2, 5, RotationDirection::Clockwise);
        selection.loop_around = true;
        assert_eq!(selection.endpoints(), (5, 2));
        assert_eq!(order(selection, 8), vec![5, 6, 7, 0, 1, 2]);
    }

    #[test]
    fn test_full_selection() {
        let selection = RangeSelection::full(6, RotationDirection::Clockwise);
        assert_eq!(order(selection, 6), vec![0, 1, 2, 3, 4, 5]);

        let reverse = RangeSelection::full(6, RotationDirection::CounterClockwise);
        assert_eq!(order(reverse, 6), vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_validate_rejects_bad_selections() {
        let out_of_range = RangeSelection::new(0, 10, RotationDirection::Clockwise);
        assert!(matches!(
            out_of_range.validate(10),
            Err(HologramError::InvalidSelection(_))
        ));

        let no_direction = RangeSelection {
            start: 0,
            end: 3,
            direction: None,
            loop_around: false,
        };
        assert!(no_direction.validate(10).is_err());

        let empty = RangeSelection::new(0, 0, RotationDirection::Clockwise);
        assert!(empty.validate(0).is_err());
    }
}
