//! Diagnostics recorded while fitting one dimension.
//!
//! Nothing here feeds back into the fitted distribution; it exists so that
//! callers can check how each parameter was obtained (which intervals, which
//! per-interval estimates, which curve).

use serde::Serialize;

use crate::domain::{BasicFit, ParamSlot};
use crate::fit::curve::CurveFit;
use crate::fit::interval::{DroppedInterval, Partition};

/// How one parameter slot was obtained.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SlotInspection {
    /// Covariate dimension, `None` for an independent slot.
    pub dependency: Option<usize>,
    /// Interval centers of the covariate. An independent slot is fitted over
    /// the whole sample as one interval and records no center.
    pub centers: Vec<f64>,
    /// One fit per interval, or a single fit over the whole sample.
    pub fits: Vec<BasicFit>,
    pub dropped: Vec<DroppedInterval>,
    pub curve: Option<CurveFit>,
}

impl SlotInspection {
    pub(crate) fn independent(fit: BasicFit) -> Self {
        Self {
            fits: vec![fit],
            ..Self::default()
        }
    }

    pub(crate) fn dependent(target: usize, partition: &Partition, curve: CurveFit) -> Self {
        Self {
            dependency: Some(target),
            centers: partition.centers.clone(),
            fits: partition.fits.clone(),
            dropped: partition.dropped.clone(),
            curve: Some(curve),
        }
    }

    /// Per-interval estimates of `slot`, in center order.
    pub fn values(&self, slot: ParamSlot) -> Vec<f64> {
        self.fits.iter().map(|f| f.param(slot)).collect()
    }

    /// Raw samples of every interval, in center order.
    pub fn samples(&self) -> Vec<&[f64]> {
        self.fits.iter().map(|f| f.samples.as_slice()).collect()
    }
}

/// Diagnostics for one fitted dimension.
#[derive(Debug, Clone, Serialize)]
pub struct FitInspection {
    pub dimension: usize,
    /// Indexed by slot (shape, loc, scale).
    pub slots: [SlotInspection; 3],
    /// Intervals used by this dimension's dependent slots; 1 if it has none.
    pub used_number_of_intervals: usize,
}

impl FitInspection {
    pub(crate) fn empty(dimension: usize) -> Self {
        Self {
            dimension,
            slots: Default::default(),
            used_number_of_intervals: 1,
        }
    }

    pub fn slot(&self, slot: ParamSlot) -> &SlotInspection {
        &self.slots[slot.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(shape: f64, n: usize) -> BasicFit {
        BasicFit {
            shape,
            loc: 0.0,
            scale: 1.0,
            samples: vec![shape; n],
        }
    }

    #[test]
    fn empty_inspection_defaults_to_one_interval() {
        let inspection = FitInspection::empty(2);
        assert_eq!(inspection.used_number_of_intervals, 1);
        assert!(inspection.slot(ParamSlot::Scale).fits.is_empty());
        assert!(inspection.slot(ParamSlot::Shape).curve.is_none());
    }

    #[test]
    fn slot_accessors() {
        let independent = SlotInspection::independent(basic(2.0, 5));
        assert_eq!(independent.values(ParamSlot::Shape), vec![2.0]);
        assert!(independent.centers.is_empty());
        assert_eq!(independent.dependency, None);

        let partition = Partition {
            centers: vec![1.0, 3.0],
            width: 2.0,
            fits: vec![basic(1.0, 3), basic(1.5, 4)],
            dropped: Vec::new(),
        };
        let curve = CurveFit {
            function: crate::domain::DependencyFunction::Power,
            a: 1.0,
            b: 1.0,
            c: 1.0,
            evaluations: 3,
            retried: false,
        };
        let dependent = SlotInspection::dependent(0, &partition, curve);
        assert_eq!(dependent.dependency, Some(0));
        assert_eq!(dependent.values(ParamSlot::Shape), vec![1.0, 1.5]);
        assert_eq!(dependent.samples().iter().map(|s| s.len()).collect::<Vec<_>>(), vec![3, 4]);
    }
}
