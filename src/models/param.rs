//! Distribution parameter values.
//!
//! A parameter is either a constant or a function of a covariate (the value of
//! the dimension it depends on). Both are evaluated through the same call.

use serde::Serialize;

use crate::domain::DependencyFunction;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParamValue {
    Constant {
        value: f64,
    },
    Function {
        function: DependencyFunction,
        a: f64,
        b: f64,
        c: f64,
    },
}

impl ParamValue {
    pub fn constant(value: f64) -> Self {
        ParamValue::Constant { value }
    }

    pub fn function(function: DependencyFunction, a: f64, b: f64, c: f64) -> Self {
        ParamValue::Function { function, a, b, c }
    }

    /// Evaluate the parameter.
    ///
    /// Constants ignore the covariate. A function-valued parameter needs one and
    /// returns `None` without it.
    pub fn evaluate(&self, covariate: Option<f64>) -> Option<f64> {
        match *self {
            ParamValue::Constant { value } => Some(value),
            ParamValue::Function { function, a, b, c } => {
                covariate.map(|x| function.evaluate(x, a, b, c))
            }
        }
    }

    /// Evaluate at a known covariate value.
    pub fn at(&self, x: f64) -> f64 {
        match *self {
            ParamValue::Constant { value } => value,
            ParamValue::Function { function, a, b, c } => function.evaluate(x, a, b, c),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, ParamValue::Constant { .. })
    }

    /// Apply `f` to the parameter's output.
    ///
    /// Only constants can be transformed in closed form; function values are
    /// returned unchanged and the caller decides how to interpret them.
    pub(crate) fn map_constant(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            ParamValue::Constant { value } => ParamValue::Constant { value: f(value) },
            other => other,
        }
    }
}
