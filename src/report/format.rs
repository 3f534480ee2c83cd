//! Formatted terminal output for a fit run.
//!
//! We keep formatting code in one place so the fitting code stays free of
//! presentation concerns.

use crate::domain::ParamSlot;
use crate::fit::{Fit, FitInspection};
use crate::io::SampleSet;
use crate::models::{MarginalDistribution, ParamValue};

/// Format the full run summary (dataset stats + one block per dimension).
pub fn format_run_summary(set: &SampleSet, fit: &Fit) -> String {
    let mut out = String::new();

    out.push_str("=== dfit - conditional distribution fit ===\n");
    out.push_str(&format!(
        "Samples: n={} | dimensions={}\n",
        set.observations(),
        set.dimensions()
    ));
    for (dimension, sample) in set.samples.iter().enumerate() {
        let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
        let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        out.push_str(&format!(
            "  [{dimension}] {:<24} range=[{min:.3}, {max:.3}]\n",
            name(set, dimension)
        ));
    }

    for (dimension, dist) in fit.joint.distributions().iter().enumerate() {
        out.push('\n');
        out.push_str(&format!(
            "Dimension {dimension} ({}): {}\n",
            name(set, dimension),
            dist.family()
        ));
        match dist {
            MarginalDistribution::Parametric(p) => {
                for slot in ParamSlot::ALL {
                    let label = slot.label(p.family);
                    let value = fmt_param(p.param(slot), fit.joint.dependencies()[dimension][slot.index()]);
                    let detail = fit
                        .inspection
                        .get(dimension)
                        .map(|i| fmt_slot_detail(i, slot))
                        .unwrap_or_default();
                    out.push_str(&format!("  {label:<6}= {value}{detail}\n"));
                }
            }
            MarginalDistribution::KernelDensity(kde) => {
                out.push_str(&format!("  bandwidth = {:.4}\n", kde.bandwidth()));
            }
        }
    }

    out.push_str(&format!("\nInterval counts: {:?}\n", fit.interval_counts));
    out
}

fn name(set: &SampleSet, dimension: usize) -> &str {
    set.names.get(dimension).map_or("?", String::as_str)
}

fn fmt_param(value: &ParamValue, dependency: Option<usize>) -> String {
    match *value {
        ParamValue::Constant { value } => format!("{value:.4}"),
        ParamValue::Function { function, a, b, c } => {
            let x = dependency.map_or_else(|| "x".to_string(), |d| format!("x{d}"));
            let formula = function.formula().replace("* x", &format!("* {x}"));
            format!("{formula} with a={a:.4}, b={b:.4}, c={c:.4}")
        }
    }
}

fn fmt_slot_detail(inspection: &FitInspection, slot: ParamSlot) -> String {
    let s = inspection.slot(slot);
    let Some(curve) = &s.curve else {
        return String::new();
    };
    let mut out = format!(
        "  [{} intervals, {} dropped, {} evals",
        s.centers.len(),
        s.dropped.len(),
        curve.evaluations
    );
    if curve.retried {
        out.push_str(", retried");
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DependencyFunction;

    #[test]
    fn constant_and_function_formatting() {
        assert_eq!(fmt_param(&ParamValue::constant(1.5), None), "1.5000");
        let p = ParamValue::function(DependencyFunction::Power, 1.0, 2.0, 0.5);
        assert_eq!(fmt_param(&p, None), "a + b * x^c with a=1.0000, b=2.0000, c=0.5000");
        let f = ParamValue::function(DependencyFunction::Exponential, 0.1, 1.5, 0.2);
        assert_eq!(
            fmt_param(&f, Some(0)),
            "a + b * exp(c * x0) with a=0.1000, b=1.5000, c=0.2000"
        );
    }
}
