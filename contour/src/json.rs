//! JSON bridge for paths, options and whole operation requests.

use crate::algorithms::boolean::{boolean_with, BoolOp};
use crate::algorithms::graph::validate_path;
use crate::error::{BooleanError, Result};
use crate::geometry::limits;
use crate::model::Path;
use crate::options::BooleanOptions;
use serde::{Deserialize, Serialize};

/// One boolean operation as a document:
/// `{"op": "union", "subject": {...}, "clip": {...}, "options": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BooleanRequest {
    pub op: BoolOp,
    pub subject: Path,
    pub clip: Path,
    #[serde(default)]
    pub options: BooleanOptions,
}

fn check_size(s: &str) -> Result<()> {
    if s.len() > limits::MAX_JSON_BYTES {
        return Err(BooleanError::Json(format!("document exceeds {} bytes", limits::MAX_JSON_BYTES)));
    }
    Ok(())
}

pub fn path_from_json(s: &str) -> Result<Path> {
    path_from_json_with(s, &BooleanOptions::default())
}

/// Parse a path and check it against the command cap and coordinate bounds.
pub fn path_from_json_with(s: &str, options: &BooleanOptions) -> Result<Path> {
    check_size(s)?;
    let path: Path = serde_json::from_str(s)?;
    validate_path(&path, options)?;
    Ok(path)
}

pub fn path_to_json(path: &Path) -> Result<String> {
    Ok(serde_json::to_string(path)?)
}

pub fn options_from_json(s: &str) -> Result<BooleanOptions> {
    check_size(s)?;
    let options: BooleanOptions = serde_json::from_str(s)?;
    if options.max_commands == 0 {
        return Err(BooleanError::Json("max_commands must be positive".into()));
    }
    Ok(options)
}

pub fn request_from_json(s: &str) -> Result<BooleanRequest> {
    check_size(s)?;
    let request: BooleanRequest = serde_json::from_str(s)?;
    validate_path(&request.subject, &request.options)?;
    validate_path(&request.clip, &request.options)?;
    Ok(request)
}

/// Run a JSON request and return the result path as JSON.
pub fn run_json_request(s: &str) -> Result<String> {
    let request = request_from_json(s)?;
    let out = boolean_with(request.op, &request.subject, &request.clip, &request.options)?;
    path_to_json(&out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FillRule, PathCommand, Vec2};
    use crate::options::QuadraticPolicy;

    #[test]
    fn path_roundtrip() {
        let p = Path::rect(0.0, 0.0, 4.0, 3.0);
        let s = path_to_json(&p).unwrap();
        assert_eq!(path_from_json(&s).unwrap(), p);
    }

    #[test]
    fn fill_rule_defaults_to_nonzero() {
        let p = path_from_json(r#"{"commands":[{"kind":"move_to","to":{"x":1,"y":2}},{"kind":"close"}]}"#).unwrap();
        assert_eq!(p.fill_rule, FillRule::NonZero);
        assert_eq!(p.commands[0], PathCommand::MoveTo { to: Vec2::new(1.0, 2.0) });
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(path_from_json("{"), Err(BooleanError::Json(_))));
        assert!(matches!(path_from_json(r#"{"commands":[{"kind":"arc_to"}]}"#), Err(BooleanError::Json(_))));
        let far = r#"{"commands":[{"kind":"move_to","to":{"x":1e9,"y":0}}]}"#;
        assert!(matches!(path_from_json(far), Err(BooleanError::CoordinateOutOfRange { index: 0, .. })));
        assert!(matches!(options_from_json(r#"{"max_commands":0}"#), Err(BooleanError::Json(_))));
    }

    #[test]
    fn command_cap_from_options() {
        let options = BooleanOptions { max_commands: 2, ..Default::default() };
        let s = path_to_json(&Path::rect(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert_eq!(path_from_json_with(&s, &options), Err(BooleanError::TooManyCommands { limit: 2 }));
    }

    #[test]
    fn options_document() {
        let o = options_from_json(r#"{"quadratics":"drop"}"#).unwrap();
        assert_eq!(o.quadratics, QuadraticPolicy::Drop);
    }

    #[test]
    fn request_runs_operation() {
        let request = BooleanRequest {
            op: BoolOp::Intersect,
            subject: Path::rect(0.0, 0.0, 10.0, 10.0),
            clip: Path::rect(5.0, 5.0, 10.0, 10.0),
            options: BooleanOptions::default(),
        };
        let s = serde_json::to_string(&request).unwrap();
        assert!(s.contains("\"op\":\"intersect\""), "{}", s);
        let out = path_from_json(&run_json_request(&s).unwrap()).unwrap();
        assert_eq!(out.fill_rule, FillRule::EvenOdd);
        assert_eq!(out.contour_count(), 1);
        let b = out.control_bounds();
        assert!((b.min_x - 5.0).abs() < 1e-9 && (b.max_x - 10.0).abs() < 1e-9);
    }
}
