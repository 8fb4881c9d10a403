use crate::error::{HologramError, Result};

/// 環狀索引範圍
///
/// 在 `0..modulo` 的環狀空間上走訪一段連續弧線，可順向（`step > 0`）
/// 或逆向（`step < 0`），並允許跨越 `modulo-1 → 0` 的接縫。
///
/// 順向：`start <= stop` 時產生 `start..stop`；`start > stop` 時先走到
/// `modulo-1`，再從 `0` 走到 `stop-1`。
/// 逆向：`start >= stop` 時由 `start` 遞減到 `stop+1`；`start < stop` 時
/// 先減到 `0`，再從 `modulo-1` 減到 `stop+1`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircularRange {
    start: i64,
    stop: i64,
    step: i64,
    modulo: i64,
}

impl CircularRange {
    /// 建立範圍
    ///
    /// `stop` 為不包含的終點，允許 `-1..=modulo`，
    /// 讓呼叫端可以直接以 `end + 1` 或 `start - 1` 表示包含端點的弧線。
    pub fn new(start: i64, stop: i64, step: i64, modulo: usize) -> Result<Self> {
        if step == 0 {
            return Err(HologramError::invalid_selection("step 不可為 0"));
        }

        let modulo = i64::try_from(modulo)
            .map_err(|_| HologramError::invalid_selection("環狀範圍過大"))?;
        if modulo == 0 {
            return Err(HologramError::invalid_selection("環狀範圍不可為空"));
        }
        if !(0..modulo).contains(&start) {
            return Err(HologramError::invalid_selection(format!(
                "起點 {start} 超出範圍 0..{modulo}"
            )));
        }
        if !(-1..=modulo).contains(&stop) {
            return Err(HologramError::invalid_selection(format!(
                "終點 {stop} 超出範圍 -1..={modulo}"
            )));
        }

        Ok(Self {
            start,
            stop,
            step,
            modulo,
        })
    }

    /// 從 0 開始、步進 1 的範圍，等同 `new(0, stop, 1, modulo)`
    pub fn from_zero(stop: i64, modulo: usize) -> Result<Self> {
        Self::new(0, stop, 1, modulo)
    }

    #[must_use]
    pub const fn is_forward(&self) -> bool {
        self.step > 0
    }

    /// 是否跨越環狀接縫
    #[must_use]
    pub const fn wraps(&self) -> bool {
        if self.is_forward() {
            self.start > self.stop
        } else {
            self.start < self.stop
        }
    }

    #[must_use]
    pub const fn iter(&self) -> CircularRangeIter {
        CircularRangeIter {
            range: *self,
            next: self.start,
            in_head: self.wraps(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// 位置 `n` 是否會被走訪到，結果與 `iter()` 一致
    ///
    /// `start == stop` 是空範圍，任何位置都回傳 `false`，
    /// 不會被當成繞行一整圈。
    #[must_use]
    pub fn contains(&self, n: usize) -> bool {
        let Ok(n) = i64::try_from(n) else {
            return false;
        };
        if n >= self.modulo {
            return false;
        }

        match self.step {
            1 => {
                if self.wraps() {
                    (self.start..self.modulo).contains(&n) || (0..self.stop).contains(&n)
                } else {
                    (self.start..self.stop).contains(&n)
                }
            }
            -1 => {
                if self.wraps() {
                    (0..=self.start).contains(&n) || (self.stop + 1..self.modulo).contains(&n)
                } else {
                    (self.stop + 1..=self.start).contains(&n)
                }
            }
            _ => self.iter().any(|position| position as i64 == n),
        }
    }
}

impl IntoIterator for &CircularRange {
    type Item = usize;
    type IntoIter = CircularRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// 環狀範圍的走訪器，每次 `iter()` 都會從頭開始
#[derive(Debug, Clone)]
pub struct CircularRangeIter {
    range: CircularRange,
    next: i64,
    /// 仍在接縫之前的那一段
    in_head: bool,
}

impl Iterator for CircularRangeIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let CircularRange {
            stop, step, modulo, ..
        } = self.range;

        if step > 0 {
            if self.in_head {
                if self.next < modulo {
                    return Some(self.advance(step));
                }
                self.in_head = false;
                self.next = 0;
            }
            (self.next < stop).then(|| self.advance(step))
        } else {
            if self.in_head {
                if self.next >= 0 {
                    return Some(self.advance(step));
                }
                self.in_head = false;
                self.next = modulo - 1;
            }
            (self.next > stop).then(|| self.advance(step))
        }
    }
}

impl CircularRangeIter {
    fn advance(&mut self, step: i64) -> usize {
        let current = self.next;
        self.next += step;
        // 建構時已保證所有走訪位置落在 0..modulo
        current as usize
    }
}
