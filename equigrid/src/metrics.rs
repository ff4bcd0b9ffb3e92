// src/metrics.rs
//
// Online statistics for evaluation batches.
// - OnlineStats: Welford running mean/variance + min/max, with a normal
//   approximation 95% confidence half-width.
//
// Deterministic given the order of samples.

use serde::{Deserialize, Serialize};

/// z-score of the two-sided 95% normal interval.
const Z_95: f64 = 1.96;

#[derive(Debug, Clone, Copy)]
pub struct OnlineStats {
    n: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for OnlineStats {
    fn default() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl OnlineStats {
    /// Adds a sample if finite. Non-finite samples are ignored.
    pub fn add(&mut self, x: f64) {
        if !x.is_finite() {
            return;
        }

        self.n += 1;
        self.min = self.min.min(x);
        self.max = self.max.max(x);

        let delta = x - self.mean;
        self.mean += delta / (self.n as f64);
        self.m2 += delta * (x - self.mean);
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn min(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.min
        }
    }

    pub fn max(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.max
        }
    }

    /// Sample variance (divide by n-1).
    pub fn variance_sample(&self) -> f64 {
        if self.n <= 1 {
            0.0
        } else {
            self.m2 / ((self.n as f64) - 1.0)
        }
    }

    pub fn stddev_sample(&self) -> f64 {
        self.variance_sample().sqrt()
    }

    /// Standard error of the mean.
    pub fn std_error(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.stddev_sample() / (self.n as f64).sqrt()
        }
    }

    /// Half-width of the 95% confidence interval for the mean.
    pub fn ci95_half_width(&self) -> f64 {
        Z_95 * self.std_error()
    }

    pub fn summary(&self) -> StatSummary {
        StatSummary {
            n: self.n,
            mean: self.mean(),
            stddev: self.stddev_sample(),
            min: self.min(),
            max: self.max(),
            ci95: self.ci95_half_width(),
        }
    }
}

/// Serializable snapshot of an [`OnlineStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    pub n: u64,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    /// 95% CI half-width for the mean.
    pub ci95: f64,
}
