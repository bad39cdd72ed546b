use contour_boolean::geometry::limits::{MAX_PATH_COMMANDS, MAX_SUBPATHS};
use contour_boolean::json::{path_from_json, path_to_json, run_json_request};
use contour_boolean::svg::{path_from_svg, path_to_svg};
use contour_boolean::{union, union_with, BezierGraph, BooleanError, BooleanOptions, Path, PathCommand, Vec2};
use serde_json::json;

#[test]
fn command_cap() {
    let mut p = Path::new();
    p.move_to(0.0, 0.0);
    for i in 0..MAX_PATH_COMMANDS {
        p.line_to((i % 100) as f64, (i / 100) as f64);
    }
    assert_eq!(
        BezierGraph::from_path(&p),
        Err(BooleanError::TooManyCommands { limit: MAX_PATH_COMMANDS })
    );

    let small = BooleanOptions { max_commands: 4, ..Default::default() };
    let rect = Path::rect(0.0, 0.0, 1.0, 1.0);
    assert_eq!(union_with(&rect, &rect, &small), Err(BooleanError::TooManyCommands { limit: 4 }));
}

#[test]
fn subpath_cap() {
    let mut p = Path::new();
    for i in 0..=MAX_SUBPATHS {
        let x = (i % 100) as f64 * 3.0;
        let y = (i / 100) as f64 * 3.0;
        p.move_to(x, y).line_to(x + 1.0, y).line_to(x + 1.0, y + 1.0).close();
    }
    assert_eq!(BezierGraph::from_path(&p), Err(BooleanError::TooManySubpaths { limit: MAX_SUBPATHS }));
}

#[test]
fn invalid_numbers() {
    let mut nan = Path::rect(0.0, 0.0, 1.0, 1.0);
    nan.commands[2] = PathCommand::LineTo { to: Vec2::new(f64::NAN, 1.0) };
    assert_eq!(union(&nan, &Path::new()), Err(BooleanError::NonFiniteCoordinate { index: 2 }));

    let mut far = Path::new();
    far.move_to(0.0, 0.0).line_to(1.0e38, 0.0).line_to(0.0, 1.0).close();
    assert!(matches!(
        BezierGraph::from_path(&far),
        Err(BooleanError::CoordinateOutOfRange { index: 1, .. })
    ));
}

#[test]
fn svg_overlong_data_is_rejected() {
    let long = "M 0 0 L 1 1 ".repeat(1_000_000);
    assert!(matches!(path_from_svg(&long), Err(BooleanError::Svg { .. })));
}

#[test]
fn svg_operands_through_union() {
    let a = path_from_svg("M0 0 H10 V10 H0 Z").unwrap();
    let b = path_from_svg("m5 5 h10 v10 h-10 z").unwrap();
    let out = union(&a, &b).unwrap();
    let d = path_to_svg(&out);
    assert!(d.starts_with('M') && d.ends_with('Z'), "{}", d);
    let back = path_from_svg(&d).unwrap();
    assert_eq!(back.commands, out.commands);
    assert_eq!(BezierGraph::from_path(&back).unwrap().contour_count(), 1);
}

#[test]
fn json_invalid_numbers() {
    let far = json!({"commands": [
        {"kind": "move_to", "to": {"x": 0.0, "y": 0.0}},
        {"kind": "line_to", "to": {"x": 1.0e38, "y": 0.0}},
        {"kind": "close"}
    ]});
    assert!(matches!(
        path_from_json(&far.to_string()),
        Err(BooleanError::CoordinateOutOfRange { index: 1, .. })
    ));
    let overflow = r#"{"commands":[{"kind":"move_to","to":{"x":1e400,"y":0}}]}"#;
    assert!(matches!(path_from_json(overflow), Err(BooleanError::Json(_))));
}

#[test]
fn json_request_roundtrip() {
    let request = json!({
        "op": "difference",
        "subject": serde_json::from_str::<serde_json::Value>(&path_to_json(&Path::rect(0.0, 0.0, 10.0, 10.0)).unwrap()).unwrap(),
        "clip": serde_json::from_str::<serde_json::Value>(&path_to_json(&Path::rect(2.0, 2.0, 4.0, 4.0)).unwrap()).unwrap(),
    });
    let out = path_from_json(&run_json_request(&request.to_string()).unwrap()).unwrap();
    assert_eq!(out.contour_count(), 2);

    let bad = json!({"op": "merge", "subject": {"commands": []}, "clip": {"commands": []}});
    assert!(matches!(run_json_request(&bad.to_string()), Err(BooleanError::Json(_))));
}
