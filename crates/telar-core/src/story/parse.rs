//! Lenient parsing of spreadsheet-exported step fields.
//!
//! Spreadsheet exports mix numbers, numeric strings and blanks. Anything that is
//! not cleanly numeric is treated as absent so the step simply makes no camera move.

use serde_json::Value;

use super::models::{CameraTarget, Region, ViewPoint};

/// Why a step's camera target was dropped
#[derive(Debug, Clone, PartialEq)]
pub enum TargetProblem {
    /// Some of x/y/zoom present but not all of them numeric
    IncompletePoint,
    /// Region string without exactly four numeric parts
    MalformedRegion(String),
}

impl std::fmt::Display for TargetProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetProblem::IncompletePoint => {
                write!(f, "x, y and zoom must all be numeric")
            }
            TargetProblem::MalformedRegion(raw) => {
                write!(f, "region '{}' is not x,y,width,height", raw)
            }
        }
    }
}

/// Parse a number from a JSON number or a numeric string
pub fn parse_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Parse an optional string field, treating blanks as absent
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Render a loose scalar (number or string) as an identifier
pub fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => Some(n.to_string()),
        },
        Value::String(s) => non_blank(Some(s.as_str())),
        _ => None,
    }
}

/// Parse a `x,y,width,height` region string
pub fn parse_region(raw: &str) -> Option<Region> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .ok()?;

    match parts.as_slice() {
        [x, y, width, height] if parts.iter().all(|v| v.is_finite()) => Some(Region {
            x: *x,
            y: *y,
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

/// Build a camera target from the raw step fields.
///
/// A complete numeric x/y/zoom triple wins over a region. Returns `Ok(None)`
/// when the step specifies no framing at all.
pub fn parse_target(
    x: Option<&Value>,
    y: Option<&Value>,
    zoom: Option<&Value>,
    region: Option<&str>,
) -> std::result::Result<Option<CameraTarget>, TargetProblem> {
    let present = |v: Option<&Value>| match v {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    };

    let point = match (x.and_then(parse_number), y.and_then(parse_number), zoom.and_then(parse_number)) {
        (Some(x), Some(y), Some(zoom)) => Some(ViewPoint { x, y, zoom }),
        _ => None,
    };
    if let Some(point) = point {
        return Ok(Some(CameraTarget::Point(point)));
    }

    if let Some(raw) = non_blank(region) {
        return match parse_region(&raw) {
            Some(region) => Ok(Some(CameraTarget::Region(region))),
            None => Err(TargetProblem::MalformedRegion(raw)),
        };
    }

    if present(x) || present(y) || present(zoom) {
        Err(TargetProblem::IncompletePoint)
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number_accepts_numeric_strings() {
        assert_eq!(parse_number(&json!(0.5)), Some(0.5));
        assert_eq!(parse_number(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!("")), None);
        assert_eq!(parse_number(&json!(null)), None);
    }

    #[test]
    fn test_point_target() {
        let target = parse_target(Some(&json!("0.2")), Some(&json!(0.8)), Some(&json!(2)), None);
        assert_eq!(
            target,
            Ok(Some(CameraTarget::Point(ViewPoint { x: 0.2, y: 0.8, zoom: 2.0 })))
        );
    }

    #[test]
    fn test_region_target_when_point_absent() {
        let target = parse_target(None, None, None, Some("0.1, 0.2, 0.3, 0.4"));
        assert_eq!(
            target,
            Ok(Some(CameraTarget::Region(Region { x: 0.1, y: 0.2, width: 0.3, height: 0.4 })))
        );
    }

    #[test]
    fn test_wrong_arity_region_is_rejected() {
        let target = parse_target(None, None, None, Some("0.1,0.2,0.3"));
        assert_eq!(target, Err(TargetProblem::MalformedRegion("0.1,0.2,0.3".into())));
    }

    #[test]
    fn test_non_numeric_point_is_rejected() {
        let target = parse_target(Some(&json!("left")), Some(&json!(0.5)), Some(&json!(1)), None);
        assert_eq!(target, Err(TargetProblem::IncompletePoint));
    }

    #[test]
    fn test_blank_fields_mean_no_move() {
        let target = parse_target(Some(&json!("")), Some(&json!(" ")), None, Some(""));
        assert_eq!(target, Ok(None));
    }

    #[test]
    fn test_scalar_id() {
        assert_eq!(scalar_id(&json!(3)), Some("3".to_string()));
        assert_eq!(scalar_id(&json!(" 4 ")), Some("4".to_string()));
        assert_eq!(scalar_id(&json!(null)), None);
    }
}
