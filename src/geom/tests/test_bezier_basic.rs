use crate::geom::{
    BezierPolynomial, BezierSegment, BsplineCurve, BsplineError, FunctionRR2ToRR2, Matrix4d,
    NewtonOptions, NewtonSolver2d, Point3, Point4, StrokeOptions, StrokeParameterMapping, Strokes,
    Vec3, curve_close_approach, integrate_newton_cotes,
};

fn line(a: Point3, b: Point3) -> BsplineCurve {
    BsplineCurve::from_poles(&[a, b], 2, false).expect("valid line")
}

fn arch() -> BsplineCurve {
    BsplineCurve::from_poles(
        &[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ],
        4,
        false,
    )
    .expect("valid cubic")
}

fn wave() -> BsplineCurve {
    BsplineCurve::from_poles(
        &[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, -1.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
            Point3::new(4.0, -1.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
        ],
        4,
        false,
    )
    .expect("valid wave")
}

fn quarter_circle() -> BsplineCurve {
    let s = std::f64::consts::FRAC_1_SQRT_2;
    BsplineCurve::from_weighted_poles(
        &[
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        &[1.0, s, 1.0],
        3,
        false,
    )
    .expect("valid conic")
}

#[test]
fn from_poles_validates_input() {
    let one = vec![Point4::new(0.0, 0.0, 0.0, 1.0)];
    assert_eq!(BezierSegment::from_poles(one, 0.0, 1.0), Err(BsplineError::BadOrder));
    let two = vec![Point4::new(0.0, 0.0, 0.0, 1.0), Point4::new(1.0, 0.0, 0.0, 1.0)];
    assert_eq!(
        BezierSegment::from_poles(two.clone(), 1.0, 0.0),
        Err(BsplineError::BadKnots)
    );
    let seg = BezierSegment::from_poles(two, 2.0, 4.0).expect("valid segment");
    assert_eq!(seg.knots(), &[2.0, 4.0]);
    assert!((seg.knot_to_fraction(3.0) - 0.5).abs() < 1e-15);
}

#[test]
fn curve_spans_match_curve_points() {
    let curve = wave();
    let segments = curve.bezier_segments().expect("segments");
    assert_eq!(segments.len(), curve.bezier_spans().len());
    for seg in &segments {
        assert_eq!(seg.order(), 4);
        for f in [0.0, 0.3, 0.7, 1.0] {
            let expected = curve.evaluate_parameter(seg.fraction_to_knot(f));
            let actual = seg.fraction_to_point(f);
            assert!(actual.max_diff(expected) < 1e-12, "span {} at {f}", seg.index());
        }
    }
}

#[test]
fn span_knots_are_saturated() {
    let curve = wave();
    let seg = &curve.bezier_segments().expect("segments")[1];
    let (u0, u1) = (seg.u_min(), seg.u_max());
    assert_eq!(seg.knots(), &[u0, u0, u0, u1, u1, u1]);
}

#[test]
fn subdivide_to_intersection_clips_range() {
    let curve = arch();
    let mut seg = curve.bezier_segments().expect("segments").remove(0);
    let original = seg.clone();
    assert!(!seg.subdivide_to_intersection(2.0, 3.0));
    assert_eq!(seg, original);

    assert!(seg.subdivide_to_intersection(0.75, 0.25));
    assert!((seg.u_min() - 0.25).abs() < 1e-15);
    assert!((seg.u_max() - 0.75).abs() < 1e-15);
    let start = seg.fraction_to_point(0.0);
    assert!(start.max_diff(original.fraction_to_point(0.25)) < 1e-12);
    let end = seg.fraction_to_point(1.0);
    assert!(end.max_diff(original.fraction_to_point(0.75)) < 1e-12);
}

#[test]
fn straight_line_strokes_once() {
    let curve = line(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
    let strokes = curve.strokes(&StrokeOptions::default()).expect("strokes");
    assert_eq!(strokes.len(), 2);
    assert_eq!(strokes.params, vec![0.0, 1.0]);
}

#[test]
fn max_edge_length_splits_line() {
    let curve = line(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
    let options = StrokeOptions {
        max_edge_length: 0.25,
        ..StrokeOptions::default()
    };
    let strokes = curve.strokes(&options).expect("strokes");
    assert_eq!(strokes.len(), 5);
    for (point, param) in strokes.points.iter().zip(&strokes.params) {
        assert!((point.x - param).abs() < 1e-12);
    }
}

#[test]
fn strokes_share_span_junctions() {
    let curve = wave();
    let strokes = curve.strokes(&StrokeOptions::default()).expect("strokes");
    for w in strokes.params.windows(2) {
        assert!(w[1] > w[0], "parameters must increase: {w:?}");
    }
    assert!((strokes.params[0]).abs() < 1e-15);
    assert!((strokes.params[strokes.len() - 1] - 1.0).abs() < 1e-12);
    for (point, param) in strokes.points.iter().zip(&strokes.params) {
        assert!(point.max_diff(curve.evaluate(*param)) < 1e-10);
    }
}

#[test]
fn stroke_mapping_reports_requested_parameter() {
    let curve = arch();
    let seg = curve.bezier_segments().expect("segments").remove(0);
    let options = StrokeOptions {
        max_edge_length: 10.0,
        angle_tolerance: 0.0,
        parameter_mapping: StrokeParameterMapping::BezierFraction,
        ..StrokeOptions::default()
    };
    let mut strokes = Strokes::default();
    seg.add_strokes(&mut strokes, &options, 0.5, 1.0, false, None);
    assert_eq!(strokes.len(), 1);
    assert!((strokes.params[0] - 1.0).abs() < 1e-15);
}

#[test]
fn rational_strokes_stay_on_circle() {
    let curve = quarter_circle();
    let options = StrokeOptions {
        chord_tolerance: 1e-3,
        ..StrokeOptions::default()
    };
    let strokes = curve.strokes(&options).expect("strokes");
    assert!(strokes.len() > 2);
    for p in &strokes.points {
        assert!((p.to_vec3().length() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn line_length_is_exact() {
    let curve = line(Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 4.0, 0.0));
    let length = curve.length().expect("length");
    assert!((length - 5.0).abs() < 1e-12);
}

#[test]
fn circle_length_and_centroid() {
    let curve = quarter_circle();
    let length = curve.length().expect("length");
    assert!((length - std::f64::consts::FRAC_PI_2).abs() < 1e-9);

    let (l, c) = curve.wire_centroid().expect("centroid").expect("non-zero length");
    let expected = 2.0 / std::f64::consts::PI;
    assert!((l - length).abs() < 1e-12);
    assert!((c.x - expected).abs() < 1e-8);
    assert!((c.y - expected).abs() < 1e-8);
}

#[test]
fn extrema_of_arch_at_midpoint() {
    let curve = arch();
    let mut seg = curve.bezier_segments().expect("segments").remove(0);
    let fractions = seg.extrema_fractions(None);
    assert_eq!(fractions.len(), 1);
    assert!((fractions[0] - 0.5).abs() < 1e-10);

    let mut strokes = Strokes::default();
    seg.add_extrema(&mut strokes, None, false, true);
    assert_eq!(strokes.len(), 3);
    assert!((strokes.points[1].y - 1.5).abs() < 1e-10);
}

#[test]
fn extrema_in_local_frame_leave_poles_untouched() {
    let curve = arch();
    let mut seg = curve.bezier_segments().expect("segments").remove(0);
    let swap = Matrix4d::from_affine(
        [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        Vec3::new(5.0, 0.0, 0.0),
    );
    let fractions = seg.extrema_fractions(Some(&swap));
    assert_eq!(fractions.len(), 1);
    assert!((fractions[0] - 0.5).abs() < 1e-10);
    assert_eq!(seg.poles()[1], Point4::new(1.0, 2.0, 0.0, 1.0));
    assert!(seg.work_poles()[1].max_abs_diff(seg.poles()[1]) > 1.0);
}

#[test]
fn skew_lines_close_approach() {
    let a = line(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0));
    let b = line(Point3::new(1.0, -1.0, 1.0), Point3::new(1.0, 1.0, 1.0));
    let approach = curve_close_approach(&a, &b, &StrokeOptions::default(), &NewtonOptions::default())
        .expect("strokes")
        .expect("approach");
    assert!((approach.distance - 1.0).abs() < 1e-10);
    assert!((approach.fraction_a - 0.5).abs() < 1e-10);
    assert!((approach.fraction_b - 0.5).abs() < 1e-10);
    assert!(approach.point_a.max_diff(Point3::new(1.0, 0.0, 0.0)) < 1e-10);
}

#[test]
fn bernstein_roots_skip_degenerate_cases() {
    assert!(BezierPolynomial::new(vec![0.0, 0.0]).roots_in_unit_interval().is_empty());
    assert!(BezierPolynomial::new(vec![1.0, 2.0, 1.0]).roots_in_unit_interval().is_empty());
    let roots = BezierPolynomial::new(vec![0.0, 1.0]).roots_in_unit_interval();
    assert_eq!(roots, vec![0.0]);
}

#[test]
fn bernstein_derivative_and_product() {
    let p = BezierPolynomial::new(vec![0.0, 0.5, 1.0]);
    let d = p.derivative();
    assert_eq!(d.degree(), 1);
    assert!((d.evaluate(0.3) - 1.0).abs() < 1e-15);
    let sq = p.product(&p);
    assert_eq!(sq.degree(), 4);
    assert!((sq.evaluate(0.6) - 0.36).abs() < 1e-14);
}

#[test]
fn boole_quadrature_integrates_polynomials() {
    let [a, b] = integrate_newton_cotes(&|x: f64| [x * x, 1.0], 0.0, 1.0, 1e-14, 1e-12);
    assert!((a - 1.0 / 3.0).abs() < 1e-14);
    assert!((b - 1.0).abs() < 1e-14);
    let [s] = integrate_newton_cotes(&|x: f64| [x.sin()], 0.0, std::f64::consts::PI, 0.0, 1e-12);
    assert!((s - 2.0).abs() < 1e-10);
}

struct SqrtTwo;

impl FunctionRR2ToRR2 for SqrtTwo {
    fn evaluate(&self, u: f64, v: f64) -> Option<[f64; 6]> {
        Some([u * u - 2.0, v - u, 2.0 * u, 0.0, -1.0, 1.0])
    }
}

#[test]
fn newton_converges_and_caps() {
    let solver = NewtonSolver2d::default();
    let (u, v) = solver.run(&SqrtTwo, 1.0, 0.0).expect("converges");
    assert!((u - std::f64::consts::SQRT_2).abs() < 1e-10);
    assert!((v - u).abs() < 1e-10);

    let capped = NewtonSolver2d::new(NewtonOptions {
        max_iterations: 1,
        ..NewtonOptions::default()
    });
    assert!(capped.run(&SqrtTwo, 1.0, 0.0).is_none());
}
