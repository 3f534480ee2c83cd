//! Shared domain types.
//!
//! These types are intentionally small and serializable so they can be:
//!
//! - built in code or loaded from a JSON descriptor file
//! - used in-memory during fitting
//! - exported alongside the fit results

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::FitError;

/// Distribution family a dimension is fitted with.
///
/// Parametric families use the (shape, loc, scale) convention. Families that
/// do not have one of these parameters carry a fixed placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Family {
    Weibull,
    Normal,
    /// Lognormal parameterized by shape (`σ`) and scale (`exp(μ)`).
    #[serde(rename = "Lognormal_1")]
    LognormalShapeScale,
    /// Lognormal parameterized by `σ` and `μ` (the scale slot carries `μ`).
    #[serde(rename = "Lognormal_2")]
    LognormalSigmaMu,
    /// Non-parametric Gaussian kernel density (never conditional).
    KernelDensity,
}

impl Family {
    pub const ALL: [Family; 5] = [
        Family::Weibull,
        Family::Normal,
        Family::LognormalShapeScale,
        Family::LognormalSigmaMu,
        Family::KernelDensity,
    ];

    /// Name used in descriptor files and messages.
    pub fn name(self) -> &'static str {
        match self {
            Family::Weibull => "Weibull",
            Family::Normal => "Normal",
            Family::LognormalShapeScale => "Lognormal_1",
            Family::LognormalSigmaMu => "Lognormal_2",
            Family::KernelDensity => "KernelDensity",
        }
    }

    pub fn is_parametric(self) -> bool {
        self != Family::KernelDensity
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Weibull" => Ok(Family::Weibull),
            "Normal" => Ok(Family::Normal),
            "Lognormal" | "Lognormal_1" => Ok(Family::LognormalShapeScale),
            "Lognormal_2" => Ok(Family::LognormalSigmaMu),
            "KernelDensity" => Ok(Family::KernelDensity),
            other => Err(FitError::UnknownFamily(other.to_string())),
        }
    }
}

/// Functional form used to describe how a parameter varies with a covariate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyFunction {
    /// `a + b * x^c`
    Power,
    /// `a + b * exp(c * x)`
    Exponential,
}

impl DependencyFunction {
    pub fn name(self) -> &'static str {
        match self {
            DependencyFunction::Power => "power",
            DependencyFunction::Exponential => "exponential",
        }
    }

    /// Human-readable formula for reports.
    pub fn formula(self) -> &'static str {
        match self {
            DependencyFunction::Power => "a + b * x^c",
            DependencyFunction::Exponential => "a + b * exp(c * x)",
        }
    }

    /// Evaluate the function at `x` with coefficients `(a, b, c)`.
    pub fn evaluate(self, x: f64, a: f64, b: f64, c: f64) -> f64 {
        match self {
            DependencyFunction::Power => a + b * x.powf(c),
            DependencyFunction::Exponential => a + b * (c * x).exp(),
        }
    }

    /// The term multiplied by `b`, i.e. `x^c` or `exp(c * x)`.
    pub fn basis(self, x: f64, c: f64) -> f64 {
        match self {
            DependencyFunction::Power => x.powf(c),
            DependencyFunction::Exponential => (c * x).exp(),
        }
    }
}

impl fmt::Display for DependencyFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DependencyFunction {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "power" | "f1" => Ok(DependencyFunction::Power),
            "exponential" | "exp" | "f2" => Ok(DependencyFunction::Exponential),
            _ => Err(FitError::UnknownFunction(s.to_string())),
        }
    }
}

/// How a dimension is divided into intervals when other dimensions depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalSpacing {
    /// Fixed number of equally wide intervals over `[0, max)`.
    Count(usize),
    /// Fixed interval width; the count follows from the data maximum.
    Width(f64),
}

/// One of the three parameter slots of a parametric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamSlot {
    Shape,
    Loc,
    Scale,
}

impl ParamSlot {
    pub const ALL: [ParamSlot; 3] = [ParamSlot::Shape, ParamSlot::Loc, ParamSlot::Scale];

    pub fn index(self) -> usize {
        match self {
            ParamSlot::Shape => 0,
            ParamSlot::Loc => 1,
            ParamSlot::Scale => 2,
        }
    }

    /// Parameter name as the family calls it (`sigma`/`mu` for the sigma/mu lognormal).
    pub fn label(self, family: Family) -> &'static str {
        match (self, family) {
            (ParamSlot::Shape, Family::LognormalSigmaMu) => "sigma",
            (ParamSlot::Scale, Family::LognormalSigmaMu) => "mu",
            (ParamSlot::Shape, _) => "shape",
            (ParamSlot::Loc, _) => "loc",
            (ParamSlot::Scale, _) => "scale",
        }
    }
}

/// Per-dimension fitting instructions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionDescriptor {
    pub family: Family,
    /// Dependency target per slot in the order (shape, loc, scale).
    pub dependency: [Option<usize>; 3],
    /// Dependency function per slot; only read for dependent slots.
    pub functions: [Option<DependencyFunction>; 3],
    /// Interval spacing used when other dimensions depend on this one.
    pub spacing: Option<IntervalSpacing>,
}

impl DistributionDescriptor {
    /// A descriptor with all parameters independent and no interval spacing.
    pub fn new(family: Family) -> Self {
        Self {
            family,
            dependency: [None; 3],
            functions: [None; 3],
            spacing: None,
        }
    }

    /// Make `slot` depend on dimension `target` through `function`.
    pub fn depends(mut self, slot: ParamSlot, target: usize, function: DependencyFunction) -> Self {
        self.dependency[slot.index()] = Some(target);
        self.functions[slot.index()] = Some(function);
        self
    }

    pub fn with_intervals(mut self, spacing: IntervalSpacing) -> Self {
        self.spacing = Some(spacing);
        self
    }

    pub fn is_conditional(&self) -> bool {
        self.dependency.iter().any(Option::is_some)
    }
}

/// Parameters of a single marginal fit plus the samples it was fitted to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicFit {
    pub shape: f64,
    pub loc: f64,
    pub scale: f64,
    pub samples: Vec<f64>,
}

impl BasicFit {
    pub fn param(&self, slot: ParamSlot) -> f64 {
        match slot {
            ParamSlot::Shape => self.shape,
            ParamSlot::Loc => self.loc,
            ParamSlot::Scale => self.scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_parses_both_lognormal_spellings() {
        assert_eq!("Lognormal".parse::<Family>().unwrap(), Family::LognormalShapeScale);
        assert_eq!("Lognormal_1".parse::<Family>().unwrap(), Family::LognormalShapeScale);
        assert_eq!("Lognormal_2".parse::<Family>().unwrap(), Family::LognormalSigmaMu);
        for family in Family::ALL {
            assert_eq!(family.name().parse::<Family>().unwrap(), family);
        }
    }

    #[test]
    fn unknown_family_fails_fast() {
        let err = "Gumbel".parse::<Family>().unwrap_err();
        assert!(matches!(err, FitError::UnknownFamily(ref n) if n == "Gumbel"));
    }

    #[test]
    fn function_aliases() {
        assert_eq!("f1".parse::<DependencyFunction>().unwrap(), DependencyFunction::Power);
        assert_eq!("F2".parse::<DependencyFunction>().unwrap(), DependencyFunction::Exponential);
        assert!(matches!(
            "polynomial".parse::<DependencyFunction>(),
            Err(FitError::UnknownFunction(_))
        ));
    }

    #[test]
    fn function_evaluation() {
        let p = DependencyFunction::Power.evaluate(4.0, 1.0, 2.0, 0.5);
        assert!((p - 5.0).abs() < 1e-12);
        let e = DependencyFunction::Exponential.evaluate(0.0, 1.0, 2.0, 3.0);
        assert!((e - 3.0).abs() < 1e-12);
    }

    #[test]
    fn slot_labels_follow_family() {
        assert_eq!(ParamSlot::Scale.label(Family::LognormalSigmaMu), "mu");
        assert_eq!(ParamSlot::Shape.label(Family::LognormalSigmaMu), "sigma");
        assert_eq!(ParamSlot::Scale.label(Family::Weibull), "scale");
    }

    #[test]
    fn descriptor_builder() {
        let d = DistributionDescriptor::new(Family::Normal)
            .depends(ParamSlot::Loc, 0, DependencyFunction::Power)
            .with_intervals(IntervalSpacing::Count(5));
        assert_eq!(d.dependency, [None, Some(0), None]);
        assert_eq!(d.functions[1], Some(DependencyFunction::Power));
        assert!(d.is_conditional());
        assert_eq!(d.spacing, Some(IntervalSpacing::Count(5)));
    }
}
