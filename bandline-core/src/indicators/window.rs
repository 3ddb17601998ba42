//! Fixed-window rolling sum with O(1) amortized updates.
//!
//! The running total is rebuilt from the buffered values every time the ring
//! wraps, so accumulated rounding error never spans more than one window. A
//! window holding only zeros always sums to exactly 0.0, which the flow
//! oscillators rely on for their zero-denominator check.
//! The result is a pure function of the pushed sequence.

#[derive(Debug, Clone, PartialEq)]
pub struct RollingSum {
    buf: Vec<f64>,
    head: usize,
    filled: usize,
    nonzero: usize,
    sum: f64,
}

impl RollingSum {
    /// `window` must be >= 1; callers validate it at construction.
    pub fn new(window: usize) -> Self {
        Self {
            buf: vec![0.0; window.max(1)],
            head: 0,
            filled: 0,
            nonzero: 0,
            sum: 0.0,
        }
    }

    pub fn window(&self) -> usize {
        self.buf.len()
    }

    /// Push a value, evicting the oldest one once the window is full.
    pub fn push(&mut self, value: f64) {
        let evicting = self.filled == self.buf.len();
        let leaving = self.buf[self.head];
        self.buf[self.head] = value;
        self.head += 1;
        if evicting {
            self.sum += value - leaving;
            if leaving != 0.0 {
                self.nonzero -= 1;
            }
        } else {
            self.filled += 1;
            self.sum += value;
        }
        if value != 0.0 {
            self.nonzero += 1;
        }
        if self.head == self.buf.len() {
            self.head = 0;
            self.sum = self.buf.iter().sum();
        }
        if self.nonzero == 0 {
            self.sum = 0.0;
        }
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.buf.len()
    }

    /// Sum of the window, or `None` until `window` values have been pushed.
    pub fn sum(&self) -> Option<f64> {
        self.is_full().then_some(self.sum)
    }

    /// Mean of the window, or `None` until `window` values have been pushed.
    pub fn mean(&self) -> Option<f64> {
        self.sum().map(|s| s / self.buf.len() as f64)
    }
}
