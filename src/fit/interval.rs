//! Interval partitioning of a covariate and per-interval marginal fits.
//!
//! The covariate domain `[0, max)` is split into equally wide intervals. Each
//! interval collects the sample values whose covariate lies in
//! `[center - width/2, center + width/2)` and is fitted on its own. Intervals
//! that are too sparse (or whose sample cannot be fitted) are dropped with a
//! warning; the samples of a dropped interval are not redistributed.

use rayon::prelude::*;
use serde::Serialize;

use crate::domain::{BasicFit, Family, IntervalSpacing};
use crate::error::FitError;
use crate::fit::marginal::{MarginalOptions, fit_basic};

/// Intervals with fewer members are dropped.
pub const MIN_SAMPLES_PER_INTERVAL: usize = 10;

/// A partition needs at least this many fitted intervals.
pub const MIN_INTERVALS: usize = 3;

/// An interval that did not contribute a fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedInterval {
    pub center: f64,
    pub count: usize,
    pub reason: String,
}

/// Surviving intervals (in ascending center order) and their fits.
#[derive(Debug, Clone, Serialize)]
pub struct Partition {
    pub centers: Vec<f64>,
    pub width: f64,
    pub fits: Vec<BasicFit>,
    pub dropped: Vec<DroppedInterval>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}

/// Check `spacing` on its own, before any covariate is known.
pub fn validate_spacing(spacing: IntervalSpacing, dimension: usize) -> Result<(), FitError> {
    match spacing {
        IntervalSpacing::Count(0) => Err(FitError::InvalidIntervalSpacing {
            dimension,
            reason: "number_of_intervals must be at least 1".to_string(),
        }),
        IntervalSpacing::Width(w) if !(w.is_finite() && w > 0.0) => Err(FitError::InvalidIntervalSpacing {
            dimension,
            reason: format!("width_of_intervals must be positive and finite, got {w}"),
        }),
        _ => Ok(()),
    }
}

/// Candidate interval centers and the common width for `spacing`.
///
/// - `Count(n)`: `step = max / n`, centers `step * (i + 1/2)`
/// - `Width(w)`: centers `w * (k + 1/2)` until `max` is covered
///
/// More candidates than `observations` is rejected: such a partition can
/// never give every interval enough members.
pub fn interval_centers(
    max: f64,
    spacing: IntervalSpacing,
    observations: usize,
    dimension: usize,
) -> Result<(Vec<f64>, f64), FitError> {
    validate_spacing(spacing, dimension)?;
    let too_many = |candidates: f64| FitError::InvalidIntervalSpacing {
        dimension,
        reason: format!("{candidates} candidate intervals for {observations} observations"),
    };

    match spacing {
        IntervalSpacing::Count(n) => {
            if n > observations {
                return Err(too_many(n as f64));
            }
            if !(max > 0.0) {
                return Ok((Vec::new(), 0.0));
            }
            let step = max / n as f64;
            Ok(((0..n).map(|i| step * (i as f64 + 0.5)).collect(), step))
        }
        IntervalSpacing::Width(w) => {
            if !(max > 0.0) {
                return Ok((Vec::new(), w));
            }
            let candidates = (max / w).ceil();
            if !(candidates <= observations as f64) {
                return Err(too_many(candidates));
            }
            let count = candidates as usize;
            Ok(((0..count).map(|k| w * (k as f64 + 0.5)).collect(), w))
        }
    }
}

enum Outcome {
    Fitted(f64, BasicFit),
    Dropped(DroppedInterval),
}

/// Partition `sample` by `covariate` and fit `family` within every interval.
///
/// `dimension` is the covariate's dimension; it is only used in messages.
pub fn partition(
    sample: &[f64],
    covariate: &[f64],
    spacing: IntervalSpacing,
    family: Family,
    dimension: usize,
    options: &MarginalOptions,
) -> Result<Partition, FitError> {
    if sample.len() != covariate.len() {
        return Err(FitError::InvalidInput(format!(
            "sample has {} values but covariate dimension {dimension} has {}",
            sample.len(),
            covariate.len()
        )));
    }

    let max = covariate.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (candidates, width) = interval_centers(max, spacing, covariate.len(), dimension)?;

    let mut pairs: Vec<(f64, f64)> = covariate.iter().copied().zip(sample.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let outcomes: Vec<Outcome> = candidates
        .par_iter()
        .map(|&center| {
            let lo = pairs.partition_point(|p| p.0 < center - 0.5 * width);
            let hi = pairs.partition_point(|p| p.0 < center + 0.5 * width);
            let members: Vec<f64> = pairs[lo..hi].iter().map(|p| p.1).collect();

            if members.len() < MIN_SAMPLES_PER_INTERVAL {
                return Ok(Outcome::Dropped(DroppedInterval {
                    center,
                    count: members.len(),
                    reason: format!(
                        "only {} samples (at least {MIN_SAMPLES_PER_INTERVAL} required)",
                        members.len()
                    ),
                }));
            }
            match fit_basic(&members, family, options) {
                Ok(fit) => Ok(Outcome::Fitted(center, fit)),
                Err(e) if e.is_recoverable() => Ok(Outcome::Dropped(DroppedInterval {
                    center,
                    count: members.len(),
                    reason: e.to_string(),
                })),
                Err(e) => Err(e),
            }
        })
        .collect::<Result<_, FitError>>()?;

    let mut centers = Vec::new();
    let mut fits = Vec::new();
    let mut dropped = Vec::new();
    for outcome in outcomes {
        match outcome {
            Outcome::Fitted(center, fit) => {
                centers.push(center);
                fits.push(fit);
            }
            Outcome::Dropped(d) => {
                tracing::warn!(
                    dimension,
                    center = d.center,
                    count = d.count,
                    "dropping interval: {}",
                    d.reason
                );
                dropped.push(d);
            }
        }
    }

    if centers.len() < MIN_INTERVALS {
        return Err(FitError::InsufficientIntervals {
            dimension,
            produced: centers.len(),
            required: MIN_INTERVALS,
        });
    }

    tracing::debug!(
        dimension,
        intervals = centers.len(),
        dropped = dropped.len(),
        width,
        "partitioned covariate"
    );

    Ok(Partition {
        centers,
        width,
        fits,
        dropped,
    })
}
