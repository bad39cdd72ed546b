use contour_boolean::{
    difference_with, intersect, union, union_with, BezierGraph, BooleanError, BooleanOptions, Path, QuadraticPolicy,
    Vec2,
};

fn graph(p: &Path) -> BezierGraph {
    BezierGraph::from_path(p).unwrap()
}

#[test]
fn zero_length_segments_are_skipped() {
    let mut p = Path::new();
    p.move_to(0.0, 0.0)
        .line_to(0.0, 0.0)
        .line_to(10.0, 0.0)
        .line_to(10.0, 0.0)
        .cubic_to(10.0, 0.0, 10.0, 0.0, 10.0, 0.0)
        .line_to(10.0, 10.0)
        .line_to(0.0, 10.0)
        .close();
    let g = graph(&p);
    assert_eq!(g.contour_count(), 1);
    assert_eq!(g.edge_count(), 4);
}

#[test]
fn lone_moves_make_no_contours() {
    let mut p = Path::new();
    p.move_to(1.0, 1.0).move_to(5.0, 5.0).close();
    assert!(graph(&p).is_empty());
}

#[test]
fn empty_operand() {
    let a = Path::rect(0.0, 0.0, 10.0, 10.0);
    let empty = Path::new();
    assert_eq!(graph(&union(&a, &empty).unwrap()), graph(&a).union(&BezierGraph::new()));
    assert_eq!(graph(&union(&a, &empty).unwrap()).contour_count(), 1);
    assert_eq!(graph(&union(&empty, &a).unwrap()).contour_count(), 1);
    assert!(intersect(&a, &empty).unwrap().is_empty());
    assert!(intersect(&empty, &empty).unwrap().is_empty());
}

#[test]
fn unclosed_subpath_is_closed() {
    let mut p = Path::new();
    p.move_to(0.0, 0.0).line_to(10.0, 0.0).line_to(10.0, 10.0);
    let g = graph(&p);
    assert_eq!(g.contour_count(), 1);
    assert_eq!(g.edge_count(), 3);
    let e = g.contour(0).edges();
    assert_eq!(e[2].p3, Vec2::new(0.0, 0.0));
}

fn lens() -> Path {
    let mut p = Path::new();
    p.move_to(0.0, 5.0).quad_to(5.0, -5.0, 10.0, 5.0).quad_to(5.0, 15.0, 0.0, 5.0).close();
    p
}

#[test]
fn quadratic_policies() {
    let b = Path::rect(4.0, -1.0, 2.0, 12.0);

    assert_eq!(
        union_with(&lens(), &b, &BooleanOptions::default()),
        Err(BooleanError::UnsupportedQuadratic { index: 1 })
    );

    // Dropped quadratics leave nothing to close
    let dropped = BooleanOptions::default().with_quadratics(QuadraticPolicy::Drop);
    let out = union_with(&lens(), &b, &dropped).unwrap();
    assert_eq!(graph(&out).contour_count(), 1);

    let elevated = BooleanOptions::default().with_quadratics(QuadraticPolicy::Elevate);
    let g = BezierGraph::from_path_with(&lens(), &elevated).unwrap();
    assert_eq!(g.edge_count(), 2);
    let bounds = g.bounds();
    assert!((bounds.min_y - 0.0).abs() < 1e-9 && (bounds.max_y - 10.0).abs() < 1e-9);

    let d = graph(&difference_with(&lens(), &b, &elevated).unwrap());
    assert_eq!(d.contour_count(), 2);
}

#[test]
fn identical_operands_with_extra_vertices() {
    // Same square, one copy with its top edge split in two
    let a = Path::rect(0.0, 0.0, 10.0, 10.0);
    let mut b = Path::new();
    b.move_to(0.0, 0.0).line_to(4.0, 0.0).line_to(10.0, 0.0).line_to(10.0, 10.0).line_to(0.0, 10.0).close();
    let u = graph(&union(&a, &b).unwrap());
    assert_eq!(u.contour_count(), 1);
    assert_eq!(u.bounds(), graph(&a).bounds());
    assert!(graph(&intersect(&a, &b).unwrap()).contour_count() == 1);
}

#[test]
fn tiny_shapes_survive() {
    let a = graph(&Path::rect(0.0, 0.0, 1e-3, 1e-3));
    let b = graph(&Path::rect(10.0, 10.0, 1.0, 1.0));
    assert_eq!(a.union(&b).contour_count(), 2);
}
