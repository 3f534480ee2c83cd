//! Univariate Gaussian kernel density estimation.
//!
//! The bandwidth uses the normal reference rule
//! `h = 1.059 * min(s, IQR / 1.349) * n^(-1/5)` (falling back to `s` when the
//! IQR is zero). The cumulative distribution is tabulated on an evenly spaced
//! support grid reaching three bandwidths past the sample extremes, which is
//! what the inverse cumulative function interpolates on.

use serde::Serialize;
use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use statrs::statistics::{Data, OrderStatistics, Statistics};

use crate::error::FitError;

/// Support grid size used unless a caller asks for something else.
pub const DEFAULT_GRID_SIZE: usize = 2000;

/// How far (in bandwidths) the support extends past the sample range.
const CUT: f64 = 3.0;

const FAMILY: &str = "KernelDensity";

#[derive(Debug, Clone, Serialize)]
pub struct KernelDensity {
    bandwidth: f64,
    samples: Vec<f64>,
    support: Vec<f64>,
    cumulative: Vec<f64>,
    #[serde(skip)]
    kernel: StandardKernel,
}

#[derive(Debug, Clone)]
struct StandardKernel(Normal);

impl Default for StandardKernel {
    fn default() -> Self {
        StandardKernel(Normal::standard())
    }
}

impl KernelDensity {
    /// Estimate a density from `sample`.
    pub fn fit(sample: &[f64], grid_size: usize) -> Result<Self, FitError> {
        if sample.len() < 2 {
            return Err(FitError::invalid_sample(FAMILY, "at least 2 samples are required"));
        }
        if sample.iter().any(|v| !v.is_finite()) {
            return Err(FitError::invalid_sample(FAMILY, "sample contains non-finite values"));
        }

        let bandwidth = normal_reference_bandwidth(sample);
        if !(bandwidth.is_finite() && bandwidth > 0.0) {
            return Err(FitError::invalid_sample(FAMILY, "sample has zero spread"));
        }

        let kernel = StandardKernel::default();
        let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
        let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = min - CUT * bandwidth;
        let hi = max + CUT * bandwidth;

        let n = grid_size.max(2);
        let step = (hi - lo) / (n as f64 - 1.0);
        let support: Vec<f64> = (0..n).map(|i| lo + step * i as f64).collect();
        let cumulative: Vec<f64> = support
            .iter()
            .map(|&x| kernel_cdf(&kernel.0, sample, bandwidth, x))
            .collect();

        Ok(Self {
            bandwidth,
            samples: sample.to_vec(),
            support,
            cumulative,
            kernel,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let sum: f64 = self
            .samples
            .iter()
            .map(|&xi| self.kernel.0.pdf((x - xi) / h))
            .sum();
        sum / (self.samples.len() as f64 * h)
    }

    pub fn cdf(&self, x: f64) -> f64 {
        kernel_cdf(&self.kernel.0, &self.samples, self.bandwidth, x)
    }

    /// Inverse cumulative distribution, interpolated on the support grid.
    ///
    /// Probabilities outside the tabulated range clamp to the grid ends.
    pub fn icdf(&self, p: f64) -> f64 {
        let last = self.support.len() - 1;
        if p <= self.cumulative[0] {
            return self.support[0];
        }
        if p >= self.cumulative[last] {
            return self.support[last];
        }

        let hi = self.cumulative.partition_point(|&c| c < p).clamp(1, last);
        let lo = hi - 1;
        let (c0, c1) = (self.cumulative[lo], self.cumulative[hi]);
        if (c1 - c0).abs() < f64::EPSILON {
            return self.support[lo];
        }
        let u = (p - c0) / (c1 - c0);
        self.support[lo] + u * (self.support[hi] - self.support[lo])
    }
}

fn kernel_cdf(kernel: &Normal, sample: &[f64], h: f64, x: f64) -> f64 {
    let sum: f64 = sample.iter().map(|&xi| kernel.cdf((x - xi) / h)).sum();
    sum / sample.len() as f64
}

fn normal_reference_bandwidth(sample: &[f64]) -> f64 {
    let n = sample.len() as f64;
    let std = sample.iter().std_dev();
    let mut data = Data::new(sample.to_vec());
    let iqr = data.interquartile_range() / 1.349;
    let spread = if iqr > 0.0 { std.min(iqr) } else { std };
    1.059 * spread * n.powf(-0.2)
}
