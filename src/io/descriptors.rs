//! Distribution descriptor JSON.
//!
//! A descriptor file is a JSON array with one object per dimension:
//!
//! ```json
//! [
//!   {"name": "Weibull", "dependency": [null, null, null], "width_of_intervals": 2},
//!   {"name": "Lognormal_1", "dependency": [null, null, 0],
//!    "functions": [null, null, "exponential"]}
//! ]
//! ```
//!
//! `dependency` and `functions` default to all-`null`. At most one of
//! `number_of_intervals` / `width_of_intervals` may be given.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{DependencyFunction, DistributionDescriptor, Family, IntervalSpacing};
use crate::error::FitError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    name: String,
    #[serde(default)]
    dependency: [Option<usize>; 3],
    #[serde(default)]
    functions: [Option<String>; 3],
    #[serde(default)]
    number_of_intervals: Option<usize>,
    #[serde(default)]
    width_of_intervals: Option<f64>,
}

/// Load descriptors from a JSON file.
pub fn load_descriptors(path: &Path) -> Result<Vec<DistributionDescriptor>, FitError> {
    let file = File::open(path).map_err(|source| FitError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_descriptors(file)
}

/// Parse descriptors from any JSON reader.
pub fn read_descriptors<R: Read>(reader: R) -> Result<Vec<DistributionDescriptor>, FitError> {
    let raw: Vec<RawDescriptor> = serde_json::from_reader(reader)
        .map_err(|e| FitError::Parse(format!("Invalid descriptor JSON: {e}")))?;
    raw.into_iter()
        .enumerate()
        .map(|(dimension, r)| convert(dimension, r))
        .collect()
}

fn convert(dimension: usize, raw: RawDescriptor) -> Result<DistributionDescriptor, FitError> {
    let family: Family = raw.name.parse()?;

    let mut functions = [None; 3];
    for (slot, name) in raw.functions.iter().enumerate() {
        if let Some(name) = name {
            functions[slot] = Some(name.parse::<DependencyFunction>()?);
        }
    }

    let spacing = match (raw.number_of_intervals, raw.width_of_intervals) {
        (Some(_), Some(_)) => return Err(FitError::ConflictingIntervalSpacing { dimension }),
        (Some(n), None) => Some(IntervalSpacing::Count(n)),
        (None, Some(w)) => Some(IntervalSpacing::Width(w)),
        (None, None) => None,
    };

    Ok(DistributionDescriptor {
        family,
        dependency: raw.dependency,
        functions,
        spacing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documented_format() {
        let json = r#"[
            {"name": "Weibull", "dependency": [null, null, null], "width_of_intervals": 2},
            {"name": "Lognormal", "dependency": [null, null, 0],
             "functions": [null, null, "f2"]},
            {"name": "Normal", "number_of_intervals": 5}
        ]"#;
        let d = read_descriptors(json.as_bytes()).unwrap();
        assert_eq!(d.len(), 3);
        assert_eq!(d[0].family, Family::Weibull);
        assert_eq!(d[0].spacing, Some(IntervalSpacing::Width(2.0)));
        assert_eq!(d[1].family, Family::LognormalShapeScale);
        assert_eq!(d[1].dependency, [None, None, Some(0)]);
        assert_eq!(d[1].functions[2], Some(DependencyFunction::Exponential));
        assert_eq!(d[1].spacing, None);
        assert_eq!(d[2].spacing, Some(IntervalSpacing::Count(5)));
        assert!(!d[2].is_conditional());
    }

    #[test]
    fn both_spacings_conflict() {
        let json = r#"[{"name": "Weibull", "number_of_intervals": 3, "width_of_intervals": 1.0}]"#;
        let err = read_descriptors(json.as_bytes()).unwrap_err();
        assert!(matches!(err, FitError::ConflictingIntervalSpacing { dimension: 0 }));
    }

    #[test]
    fn unknown_names_fail_fast() {
        let err = read_descriptors(r#"[{"name": "Gamma"}]"#.as_bytes()).unwrap_err();
        assert!(matches!(err, FitError::UnknownFamily(_)));
        let err = read_descriptors(
            r#"[{"name": "Normal", "dependency": [null, 0, null], "functions": [null, "cubic", null]}]"#
                .as_bytes(),
        )
        .unwrap_err();
        assert!(matches!(err, FitError::UnknownFunction(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = read_descriptors(r#"[{"name": "Normal", "colour": 1}]"#.as_bytes()).unwrap_err();
        assert!(matches!(err, FitError::Parse(_)));
        assert!(read_descriptors("{".as_bytes()).is_err());
    }
}
