//! Fixed-window filters used by calibration and loop-period tracking.
//!
//! Window sizes are compile-time constants so the filters never allocate
//! after construction and are safe to run inside the control cycle.

use heapless::Vec;

/// Rolling mean over the last `N` samples.
///
/// Backed by a fixed ring buffer with a running sum, so `push` and
/// `average` are O(1) regardless of window size.
#[derive(Debug, Clone)]
pub struct MovingAverage<const N: usize> {
    samples: Vec<f64, N>,
    next: usize,
    sum: f64,
}

impl<const N: usize> MovingAverage<N> {
    pub const fn new() -> Self {
        Self {
            samples: Vec::new(),
            next: 0,
            sum: 0.0,
        }
    }

    /// Feed one sample, evicting the oldest once the window is full.
    pub fn push(&mut self, value: f64) {
        if self.samples.len() < N {
            // Cannot fail: len < N.
            let _ = self.samples.push(value);
            self.sum += value;
        } else {
            self.sum += value - self.samples[self.next];
            self.samples[self.next] = value;
        }
        self.next = (self.next + 1) % N;
    }

    /// Mean of the samples currently in the window. Zero while empty.
    #[inline]
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.sum / self.samples.len() as f64
        }
    }

    /// Number of samples currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True once `N` samples have been observed.
    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.samples.len() == N
    }

    /// Drop all samples and start over.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.next = 0;
        self.sum = 0.0;
    }
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_averages_zero() {
        let filter: MovingAverage<4> = MovingAverage::new();
        assert_eq!(filter.average(), 0.0);
        assert!(filter.is_empty());
        assert!(!filter.is_saturated());
    }

    #[test]
    fn partial_window_averages_what_it_has() {
        let mut filter: MovingAverage<4> = MovingAverage::new();
        filter.push(2.0);
        filter.push(4.0);
        assert_eq!(filter.len(), 2);
        assert!((filter.average() - 3.0).abs() < 1e-12);
        assert!(!filter.is_saturated());
    }

    #[test]
    fn full_window_evicts_oldest() {
        let mut filter: MovingAverage<3> = MovingAverage::new();
        for v in [1.0, 2.0, 3.0] {
            filter.push(v);
        }
        assert!(filter.is_saturated());
        assert!((filter.average() - 2.0).abs() < 1e-12);

        // 1.0 leaves, 7.0 enters: mean of {2, 3, 7}.
        filter.push(7.0);
        assert_eq!(filter.len(), 3);
        assert!((filter.average() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn long_run_stays_consistent() {
        let mut filter: MovingAverage<10> = MovingAverage::new();
        for i in 0..1000 {
            filter.push(i as f64);
        }
        // Last 10 samples are 990..=999.
        assert!((filter.average() - 994.5).abs() < 1e-6);
    }

    #[test]
    fn reset_empties_the_window() {
        let mut filter: MovingAverage<3> = MovingAverage::new();
        filter.push(5.0);
        filter.push(6.0);
        filter.reset();
        assert!(filter.is_empty());
        assert_eq!(filter.average(), 0.0);
        filter.push(1.0);
        assert!((filter.average() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn binary_stillness_fraction_use() {
        // Calibration feeds 0/1 movement flags; the average is the
        // fraction of the window spent moving.
        let mut filter: MovingAverage<10> = MovingAverage::new();
        for _ in 0..9 {
            filter.push(0.0);
        }
        filter.push(1.0);
        assert!((filter.average() - 0.1).abs() < 1e-12);
    }
}
