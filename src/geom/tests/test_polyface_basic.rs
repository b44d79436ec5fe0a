use crate::geom::{
    CloseApproachOptions, FacetLocationDetail, Point2, Point3, Point4, PolyfaceQuery, Ray3,
    StrokePick, Vec3, append_stroke_pick, closest_facet_point, pick_facets_by_stroke,
    search_closest_approach, search_self_closest_approach, set_visibility_bits,
};

/// `n` x `n` grid of unit quads in the plane `z = height`, with params equal
/// to the grid xy.
fn grid(n: usize, shift: Vec3, height: f64) -> (Vec<Point3>, Vec<Point2>, Vec<i32>) {
    let mut points = Vec::new();
    let mut params = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as f64, j as f64);
            points.push(Point3::new(x + shift.x, y + shift.y, height + shift.z));
            params.push(Point2::new(x, y));
        }
    }
    let row = n + 1;
    let mut index = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let k = (j * row + i) as i32 + 1;
            let r = row as i32;
            index.extend([k, k + 1, k + 1 + r, k + r]);
        }
    }
    (points, params, index)
}

fn unit_square(height: f64) -> Vec<Point3> {
    vec![
        Point3::new(0.0, 0.0, height),
        Point3::new(1.0, 0.0, height),
        Point3::new(1.0, 1.0, height),
        Point3::new(0.0, 1.0, height),
    ]
}

// ── visitor ──────────────────────────────────────────────────────────────

#[test]
fn visitor_walks_fixed_size_faces() {
    let (points, _, index) = grid(2, Vec3::ZERO, 0.0);
    let mesh = PolyfaceQuery::new(&points, &index, 4);
    let mut visitor = mesh.visitor();
    let mut read = Vec::new();
    while visitor.advance_to_next_face() {
        assert_eq!(visitor.num_edges_this_face(), 4);
        read.push(visitor.read_index());
    }
    assert_eq!(read, vec![0, 4, 8, 12]);

    assert!(visitor.move_to_facet_by_read_index(8));
    assert_eq!(visitor.client_point_index(), &[3, 4, 7, 6]);
    let normal = visitor.facet_normal().expect("planar quad");
    assert!((normal.z - 1.0).abs() < 1e-12);
    assert!(!visitor.move_to_facet_by_read_index(16));
}

#[test]
fn visitor_skips_facets_with_missing_points() {
    let points = unit_square(0.0);
    let index = [1, 2, 9, 0, 1, 3, 4, 0];
    let mesh = PolyfaceQuery::new(&points, &index, 0);
    let mut visitor = mesh.visitor();
    assert!(visitor.advance_to_next_face());
    assert_eq!(visitor.read_index(), 4);
    assert!(!visitor.advance_to_next_face());
}

#[test]
fn cyclic_vertex_data_wraps() {
    let points = unit_square(0.0);
    let index = [1, 2, 3, 4];
    let mesh = PolyfaceQuery::new(&points, &index, 4);
    let mut visitor = mesh.visitor();
    assert!(visitor.advance_to_next_face());
    let detail = visitor.load_cyclic_vertex_data(5).expect("vertex");
    assert_eq!(detail.try_get_point(), Some(Point3::new(1.0, 0.0, 0.0)));
    assert_eq!(detail.vertex_index(0), Some(1));
    assert!(visitor.load_vertex_data(4).is_none());
}

#[test]
fn close_facet_point_respects_tolerance() {
    let points = unit_square(0.0);
    let index = [1, 2, 3, 4];
    let mesh = PolyfaceQuery::new(&points, &index, 4);
    let mut visitor = mesh.visitor();
    let loc = visitor
        .advance_to_facet_by_search_point(Point3::new(1.5, 0.5, 0.0), 0.6)
        .expect("within tolerance");
    assert_eq!(loc.edge_index, Some(1));
    assert!((loc.edge_fraction - 0.5).abs() < 1e-12);
    assert!(
        visitor
            .try_find_close_facet_point(Point3::new(1.5, 0.5, 0.0), 0.4)
            .is_none()
    );
}

#[test]
fn ray_detail_interpolates_params() {
    let (points, params, index) = grid(3, Vec3::ZERO, 0.0);
    let mesh = PolyfaceQuery::new(&points, &index, 4).with_params(&params);
    let mut visitor = mesh.visitor();
    let ray = Ray3::new(Point3::new(1.2, 0.3, 5.0), Vec3::new(0.0, 0.0, -1.0));
    let detail = visitor.advance_to_facet_by_search_ray_detail(&ray).expect("hit");
    assert_eq!(detail.read_index, 4);
    assert!((detail.a - 5.0).abs() < 1e-12);
    assert!(detail.is_interior);
    let point = detail.try_get_point().expect("point");
    assert!(point.max_diff(Point3::new(1.2, 0.3, 0.0)) < 1e-12);
    let uv = detail.try_get_param().expect("param");
    assert!((uv.x - 1.2).abs() < 1e-12 && (uv.y - 0.3).abs() < 1e-12);
}

#[test]
fn ray_edge_tolerance_snaps_to_boundary() {
    let points = unit_square(0.0);
    let index = [1, 2, 3, 4];
    let mesh = PolyfaceQuery::new(&points, &index, 4);
    let mut visitor = mesh.visitor();
    assert!(visitor.advance_to_next_face());
    let ray = Ray3::new(Point3::new(1.05, 0.5, 1.0), Vec3::new(0.0, 0.0, -2.0));
    assert!(visitor.try_find_facet_ray_intersection(&ray, 0.01).is_none());
    let (point, a) = visitor.try_find_facet_ray_intersection(&ray, 0.1).expect("near edge");
    assert!(point.max_diff(Point3::new(1.0, 0.5, 0.0)) < 1e-12);
    assert!((a - 0.5).abs() < 1e-12);

    let parallel = Ray3::new(Point3::new(0.5, 0.5, 1.0), Vec3::new(1.0, 0.0, 0.0));
    assert!(visitor.try_find_facet_ray_intersection(&parallel, 1.0).is_none());
}

#[test]
fn triangle_param_detail_is_exact() {
    let points = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 2.0),
    ];
    let params = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
    let index = [1, 2, 3];
    let mesh = PolyfaceQuery::new(&points, &index, 3).with_params(&params);
    let mut visitor = mesh.visitor();
    assert!(visitor.advance_to_next_face());
    let detail = visitor
        .try_param_to_facet_location_detail(Point2::new(0.25, 0.5))
        .expect("detail");
    assert!(detail.point.max_diff(Point3::new(0.5, 1.0, 1.0)) < 1e-12);
    assert!((detail.d_x_du - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-12);
    assert!((detail.d_x_dv - Vec3::new(0.0, 2.0, 2.0)).length() < 1e-12);
    assert_eq!(detail.num_weights(), 3);
    assert!((detail.weight(2).expect("weight") - 0.5).abs() < 1e-12);
    assert!(detail.is_interior);

    let outside = visitor
        .try_param_to_facet_location_detail(Point2::new(1.0, 1.0))
        .expect("extrapolated");
    assert!(!outside.is_interior);
}

#[test]
fn quad_param_detail_uses_scan_brackets() {
    let (points, params, index) = grid(3, Vec3::ZERO, 0.0);
    let mesh = PolyfaceQuery::new(&points, &index, 4).with_params(&params);
    let mut visitor = mesh.visitor();
    assert!(visitor.move_to_facet_by_read_index(4));
    let uv = Point2::new(1.25, 0.5);
    let ((left, right), (below, above)) = visitor.try_param_to_scan_brackets(uv).expect("brackets");
    assert!((left.param.x - 1.0).abs() < 1e-12 && (right.param.x - 2.0).abs() < 1e-12);
    assert!(below.param.y.abs() < 1e-12 && (above.param.y - 1.0).abs() < 1e-12);

    let detail = visitor.try_param_to_facet_location_detail(uv).expect("detail");
    assert!(detail.point.max_diff(Point3::new(1.25, 0.5, 0.0)) < 1e-12);
    assert!((detail.d_x_du - Vec3::X).length() < 1e-12);
    assert!((detail.d_x_dv - Vec3::Y).length() < 1e-12);
    assert!(
        visitor
            .try_param_to_facet_location_detail(Point2::new(5.0, 0.5))
            .is_none()
    );
}

#[test]
fn details_sort_by_uv_and_a() {
    let mut a = FacetLocationDetail::new(0, 3.0);
    a.set_param(Point2::new(1.0, 0.0));
    let mut b = FacetLocationDetail::new(1, 1.0);
    b.set_param(Point2::new(0.0, 2.0));
    let mut c = FacetLocationDetail::new(2, 2.0);
    c.set_param(Point2::new(0.0, 1.0));

    let mut details = [a, b, c];
    FacetLocationDetail::sort_uv(&mut details);
    assert_eq!(details.map(|d| d.read_index), [2, 1, 0]);
    FacetLocationDetail::sort_by_a(&mut details);
    assert_eq!(details.map(|d| d.read_index), [1, 2, 0]);
}

// ── closest approach ─────────────────────────────────────────────────────

#[test]
fn parallel_squares_brute_force() {
    let lower = unit_square(0.0);
    let upper: Vec<Point3> = unit_square(2.0)
        .into_iter()
        .map(|p| Point3::new(p.x + 0.5, p.y, p.z))
        .collect();
    let index = [1, 2, 3, 4];
    let mesh_a = PolyfaceQuery::new(&lower, &index, 4);
    let mesh_b = PolyfaceQuery::new(&upper, &index, 4);
    let (approach, diagnostics) =
        search_closest_approach(&mesh_a, &mesh_b, &CloseApproachOptions::default());
    let approach = approach.expect("approach");
    assert!((approach.distance - 2.0).abs() < 1e-12);
    assert!((approach.segment.length() - 2.0).abs() < 1e-12);
    assert!(approach.segment.start.z.abs() < 1e-12);
    assert!(diagnostics.brute_force_used);
    assert_eq!(diagnostics.pairs_tested, 1);
}

#[test]
fn tree_search_matches_brute_force() {
    let (points_a, _, index_a) = grid(3, Vec3::ZERO, 0.0);
    let (points_b, _, index_b) = grid(3, Vec3::new(1.5, 0.25, 0.0), 0.5);
    let mesh_a = PolyfaceQuery::new(&points_a, &index_a, 4);
    let mesh_b = PolyfaceQuery::new(&points_b, &index_b, 4);

    let (tree, tree_diag) = search_closest_approach(&mesh_a, &mesh_b, &CloseApproachOptions::default());
    let brute_options = CloseApproachOptions {
        brute_force_point_limit: usize::MAX,
        ..CloseApproachOptions::default()
    };
    let (brute, brute_diag) = search_closest_approach(&mesh_a, &mesh_b, &brute_options);

    assert!(!tree_diag.brute_force_used);
    assert!(tree_diag.presample_bound.is_some());
    assert!(brute_diag.brute_force_used);
    assert_eq!(brute_diag.pairs_tested, 81);
    let (tree, brute) = (tree.expect("tree"), brute.expect("brute"));
    assert!((tree.distance - 0.5).abs() < 1e-12);
    assert!((tree.distance - brute.distance).abs() < 1e-12);
}

#[test]
fn max_distance_filters_result() {
    let lower = unit_square(0.0);
    let upper = unit_square(2.0);
    let index = [1, 2, 3, 4];
    let mesh_a = PolyfaceQuery::new(&lower, &index, 4);
    let mesh_b = PolyfaceQuery::new(&upper, &index, 4);
    let options = CloseApproachOptions {
        max_distance: 1.0,
        ..CloseApproachOptions::default()
    };
    let (approach, _) = search_closest_approach(&mesh_a, &mesh_b, &options);
    assert!(approach.is_none());
}

#[test]
fn self_approach_skips_shared_vertices() {
    let points = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 3.0),
        Point3::new(0.2, 0.0, 3.0),
        Point3::new(0.0, 0.2, 3.0),
    ];
    let index = [1, 2, 3, 2, 4, 3, 5, 6, 7];
    let mesh = PolyfaceQuery::new(&points, &index, 3);
    let (approach, diagnostics) = search_self_closest_approach(&mesh, &CloseApproachOptions::default());
    let approach = approach.expect("approach");
    assert_eq!((approach.read_index_a, approach.read_index_b), (0, 6));
    assert!((approach.distance - 3.0).abs() < 1e-12);
    assert_eq!(diagnostics.pairs_sharing_vertices, 1);
    assert_eq!(diagnostics.pairs_tested, 2);
}

#[test]
fn self_approach_normal_test_rejects_coplanar_neighbours() {
    let points = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.1, 0.0, 0.0),
        Point3::new(2.1, 0.0, 0.0),
        Point3::new(1.1, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.2, 0.0, 1.0),
        Point3::new(0.0, 0.2, 1.0),
    ];
    let index = [1, 2, 3, 4, 5, 6, 7, 8, 9];
    let mesh = PolyfaceQuery::new(&points, &index, 3);

    let (plain, _) = search_self_closest_approach(&mesh, &CloseApproachOptions::default());
    let plain = plain.expect("approach");
    assert_eq!((plain.read_index_a, plain.read_index_b), (0, 3));
    assert!((plain.distance - 0.1).abs() < 1e-12);

    let options = CloseApproachOptions {
        normal_test_radians: 0.1,
        ..CloseApproachOptions::default()
    };
    let (filtered, diagnostics) = search_self_closest_approach(&mesh, &options);
    let filtered = filtered.expect("approach");
    assert_eq!((filtered.read_index_a, filtered.read_index_b), (0, 6));
    assert!((filtered.distance - 1.0).abs() < 1e-12);
    assert_eq!(diagnostics.pairs_rejected_by_normal, 1);
}

#[test]
fn nearest_facet_point_reports_distance_and_params() {
    let (points, params, index) = grid(3, Vec3::ZERO, 0.0);
    let mesh = PolyfaceQuery::new(&points, &index, 4).with_params(&params);
    let (detail, _) = closest_facet_point(&mesh, Point3::new(1.5, 1.5, 2.0), 0.0);
    let detail = detail.expect("nearest");
    assert_eq!(detail.read_index, 16);
    assert!((detail.a - 2.0).abs() < 1e-12);
    assert!(detail.point.max_diff(Point3::new(1.5, 1.5, 0.0)) < 1e-12);
    let uv = detail.try_get_param().expect("param");
    assert!((uv.x - 1.5).abs() < 1e-12 && (uv.y - 1.5).abs() < 1e-12);

    let (none, _) = closest_facet_point(&mesh, Point3::new(1.5, 1.5, 2.0), 1.0);
    assert!(none.is_none());
}

// ── stroke picking ───────────────────────────────────────────────────────

#[test]
fn stroke_pick_crosses_square() {
    let points = unit_square(0.0);
    let index = [1, 2, 3, 4];
    let mesh = PolyfaceQuery::new(&points, &index, 4);
    let eye = Point4::new(0.0, 0.0, 1.0, 0.0);
    let (hits, diagnostics) = pick_facets_by_stroke(
        &mesh,
        eye,
        Point3::new(-1.0, 0.5, 0.0),
        Point3::new(2.0, 0.5, 0.0),
        false,
    );
    assert_eq!(hits.len(), 1);
    assert_eq!(diagnostics.facets_visited, 1);
    let hit = hits[0];
    assert!(hit.start.point.max_diff(Point3::new(0.0, 0.5, 0.0)) < 1e-12);
    assert!(hit.end.point.max_diff(Point3::new(1.0, 0.5, 0.0)) < 1e-12);
    assert!((hit.start.a - 1.0 / 3.0).abs() < 1e-12);
    assert!((hit.end.a - 2.0 / 3.0).abs() < 1e-12);
    assert!(hit.start.param.y.abs() < 1e-12);
}

#[test]
fn stroke_pick_clips_to_stroke_ends() {
    let points = unit_square(0.0);
    let index = [1, 2, 3, 4];
    let mesh = PolyfaceQuery::new(&points, &index, 4);
    let eye = Point4::new(0.0, 0.0, 1.0, 0.0);
    let (hits, _) = pick_facets_by_stroke(
        &mesh,
        eye,
        Point3::new(0.25, 0.5, 0.0),
        Point3::new(0.75, 0.5, 0.0),
        false,
    );
    assert_eq!(hits.len(), 1);
    assert!(hits[0].start.point.max_diff(Point3::new(0.25, 0.5, 0.0)) < 1e-12);
    assert!(hits[0].end.point.max_diff(Point3::new(0.75, 0.5, 0.0)) < 1e-12);
    assert!(hits[0].start.a.abs() < 1e-12);
    assert!((hits[0].end.a - 1.0).abs() < 1e-12);
}

#[test]
fn stroke_pick_misses_and_degenerates() {
    let points = unit_square(0.0);
    let index = [1, 2, 3, 4];
    let mesh = PolyfaceQuery::new(&points, &index, 4);
    let eye = Point4::new(0.0, 0.0, 1.0, 0.0);
    let (miss, _) = pick_facets_by_stroke(
        &mesh,
        eye,
        Point3::new(0.0, 2.0, 0.0),
        Point3::new(1.0, 2.0, 0.0),
        false,
    );
    assert!(miss.is_empty());

    let p = Point3::new(0.5, 0.5, 0.0);
    let (none, diagnostics) = pick_facets_by_stroke(&mesh, eye, p, p, false);
    assert!(none.is_empty());
    assert_eq!(diagnostics.warnings.len(), 1);
}

#[test]
fn stacked_squares_hide_the_lower_one() {
    // The upper square overhangs the lower one along the stroke.
    let mut points = unit_square(0.0);
    points.extend([
        Point3::new(-0.5, 0.0, 1.0),
        Point3::new(1.5, 0.0, 1.0),
        Point3::new(1.5, 1.0, 1.0),
        Point3::new(-0.5, 1.0, 1.0),
    ]);
    let index = [1, 2, 3, 4, 5, 6, 7, 8];
    let mesh = PolyfaceQuery::new(&points, &index, 4);
    let eye = Point4::new(0.0, 0.0, 1.0, 0.0);
    let (hits, _) = pick_facets_by_stroke(
        &mesh,
        eye,
        Point3::new(-1.0, 0.5, 0.0),
        Point3::new(2.0, 0.5, 0.0),
        false,
    );
    assert_eq!(hits.len(), 2);
    let (first, _) = pick_facets_by_stroke(
        &mesh,
        eye,
        Point3::new(-1.0, 0.5, 0.0),
        Point3::new(2.0, 0.5, 0.0),
        true,
    );
    assert_eq!(first.len(), 1);

    let mut picks: Vec<StrokePick> = hits.iter().map(StrokePick::from_hit).collect();
    set_visibility_bits(&mut picks);
    for pick in &picks {
        if pick.read_index == 0 {
            assert!(pick.is_hidden && !pick.is_visible);
        } else {
            assert!(pick.is_visible && !pick.is_hidden);
        }
    }
}

#[test]
fn partial_cover_sets_both_flags() {
    let mut picks = vec![
        StrokePick::new(1.0, 1.0, 3.0, 1.0, 1),
        StrokePick::new(2.0, 0.0, 0.0, 0.0, 0),
    ];
    set_visibility_bits(&mut picks);
    assert_eq!(picks[0].read_index, 0);
    assert!(picks[0].is_visible && picks[0].is_hidden);
    assert!(picks[1].is_visible && !picks[1].is_hidden);
}

#[test]
fn visibility_reports_overlap_counts() {
    let mut picks = vec![
        StrokePick::new(0.0, 0.0, 2.0, 0.0, 0),
        StrokePick::new(1.0, 1.0, 3.0, 1.0, 1),
        StrokePick::new(5.0, 0.0, 6.0, 0.0, 2),
    ];
    let diagnostics = set_visibility_bits(&mut picks);
    assert_eq!(diagnostics.facets_visited, 3);
    // Only the first two overlap, and each sees the other.
    assert_eq!(diagnostics.pairs_tested, 2);
    assert!(picks[2].is_visible && !picks[2].is_hidden);
}

#[cfg(all(feature = "kernel_metrics", not(target_arch = "wasm32")))]
#[test]
fn visibility_fills_timing_bucket() {
    let mut picks: Vec<StrokePick> = (0..200u32)
        .map(|i| {
            let u = f64::from(i) * 0.01;
            StrokePick::new(u, f64::from(i % 7), u + 0.5, f64::from(i % 5), i as usize)
        })
        .collect();
    let diagnostics = set_visibility_bits(&mut picks);
    let timing = diagnostics.timing.expect("timing report");
    assert!(timing.visibility_ns > 0);
    assert_eq!(timing.total_ns(), timing.visibility_ns);
}

#[test]
fn interior_depth_interpolates() {
    let pick = StrokePick::new(0.0, 0.0, 2.0, 4.0, 0);
    assert_eq!(pick.interior_z_at_u(1.0), (2.0, 2.0, true));
    assert_eq!(pick.interior_z_at_u(-1.0), (0.0, 0.0, false));
    assert_eq!(pick.interior_z_at_u(3.0), (4.0, 4.0, false));
    let vertical = StrokePick::new(1.0, 3.0, 1.0, 1.0, 0);
    assert_eq!(vertical.interior_z_at_u(1.0), (1.0, 3.0, true));
    assert!(!vertical.interior_z_at_u(1.5).2);
}

#[test]
fn append_pick_uses_selected_axis() {
    let mut picks = Vec::new();
    let points = [
        Point3::new(2.0, 0.0, 1.0),
        Point3::new(1.0, 5.0, 7.0),
        Point3::new(0.0, 4.0, 3.0),
    ];
    assert!(append_stroke_pick(&mut picks, 2, &points, 7));
    assert_eq!((picks[0].u0, picks[0].z0, picks[0].u1, picks[0].z1), (0.0, 3.0, 2.0, 1.0));
    assert!(append_stroke_pick(&mut picks, 1, &points, 8));
    assert_eq!(picks[1].z0, 4.0);
    assert!(!append_stroke_pick(&mut picks, 2, &points[..1], 9));
    assert_eq!(picks.len(), 2);
}
