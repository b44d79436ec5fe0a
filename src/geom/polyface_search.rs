//! Mesh-to-mesh closest approach, nearest facet queries and stroke picking.
//!
//! Searches read meshes through [`PolyfaceVisitor`] only and never mutate
//! them. Every entry point returns its result together with the
//! [`SearchDiagnostics`] of the run.

use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::bvh::FacetRangeTree;
use super::core::{BBox, Point2, Point3, Point4, Segment3, Vec3};
use super::diagnostics::SearchDiagnostics;
use super::matrix4d::Matrix4d;
use super::metrics::{KernelMetrics, TimingBucket};
use super::polyface::{
    FacetLocationDetail, PolyfaceQuery, PolyfaceVisitor, closest_polygon_point, segment_polygon_pierce,
};

/// Meshes with at most this many points are searched pair by pair.
pub const BRUTE_FORCE_POINT_LIMIT: usize = 10;

/// Depth slack when deciding that one stroke pick hides another.
pub const VISIBILITY_Z_TOLERANCE: f64 = 1e-10;

// ─────────────────────────────────────────────────────────────────────────────
// Options and results
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloseApproachOptions {
    /// Largest distance of interest; `0` accepts every pair.
    pub max_distance: f64,
    /// Point count at or below which the all-pairs path runs.
    pub brute_force_point_limit: usize,
    /// Facet stride of the presample pass; `0` picks `ceil(sqrt(facets))`.
    pub presample_stride: usize,
    /// Self approach only: reject approach vectors within this angle of
    /// perpendicular to either facet normal. `0` disables the test.
    pub normal_test_radians: f64,
}

impl Default for CloseApproachOptions {
    fn default() -> Self {
        Self {
            max_distance: 0.0,
            brute_force_point_limit: BRUTE_FORCE_POINT_LIMIT,
            presample_stride: 0,
            normal_test_radians: 0.0,
        }
    }
}

impl CloseApproachOptions {
    fn distance_bound(&self) -> f64 {
        if self.max_distance > 0.0 {
            self.max_distance
        } else {
            f64::INFINITY
        }
    }
}

/// Shortest segment found between two facets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestApproach {
    pub read_index_a: usize,
    pub read_index_b: usize,
    /// Runs from the facet of `read_index_a` to the facet of `read_index_b`.
    pub segment: Segment3,
    pub distance: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Facet records
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct FacetRecord {
    read_index: usize,
    points: Vec<Point3>,
    indices: Vec<usize>,
    normal: Option<Vec3>,
    bbox: BBox,
}

impl FacetRecord {
    fn shares_vertex(&self, other: &Self) -> bool {
        self.indices.iter().any(|i| other.indices.contains(i))
    }

    fn edges(&self) -> impl Iterator<Item = Segment3> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| Segment3::new(self.points[i], self.points[(i + 1) % n]))
    }
}

fn collect_facets(mesh: &PolyfaceQuery<'_>, diagnostics: &mut SearchDiagnostics) -> Vec<FacetRecord> {
    let mut visitor = mesh.visitor();
    let mut facets = Vec::new();
    while visitor.advance_to_next_face() {
        diagnostics.facets_visited += 1;
        let Some(bbox) = visitor.facet_range() else {
            continue;
        };
        facets.push(FacetRecord {
            read_index: visitor.read_index(),
            points: visitor.points().to_vec(),
            indices: visitor.client_point_index().to_vec(),
            normal: visitor.facet_normal(),
            bbox,
        });
    }
    facets
}

/// Shortest segment from facet `a` to facet `b`.
fn facet_pair_approach(a: &FacetRecord, b: &FacetRecord) -> Option<(f64, Segment3)> {
    let mut best: Option<(f64, Segment3)> = None;
    let mut offer = |start: Point3, end: Point3| {
        let d = start.distance_to(end);
        if best.is_none_or(|(b, _)| d < b) {
            best = Some((d, Segment3::new(start, end)));
        }
    };

    for &p in &a.points {
        if let Some(loc) = closest_polygon_point(&b.points, p) {
            offer(p, loc.point);
        }
    }
    for &q in &b.points {
        if let Some(loc) = closest_polygon_point(&a.points, q) {
            offer(loc.point, q);
        }
    }
    for ea in a.edges() {
        for eb in b.edges() {
            let (_, _, pa, pb) = ea.closest_approach(eb);
            offer(pa, pb);
        }
    }
    // Edges through the other facet's interior touch at distance zero.
    if let Some(normal) = b.normal {
        for ea in a.edges() {
            if let Some(q) = segment_polygon_pierce(&b.points, normal, ea) {
                offer(q, q);
            }
        }
    }
    if let Some(normal) = a.normal {
        for eb in b.edges() {
            if let Some(q) = segment_polygon_pierce(&a.points, normal, eb) {
                offer(q, q);
            }
        }
    }
    best
}

#[derive(Debug, Clone, Copy)]
struct PairCandidate {
    facet_a: usize,
    facet_b: usize,
    distance: f64,
    segment: Segment3,
}

impl PairCandidate {
    fn keep_nearer(best: &mut Option<Self>, candidate: Self) {
        if best.is_none_or(|b| candidate.distance < b.distance) {
            *best = Some(candidate);
        }
    }
}

fn to_closest_approach(
    candidate: Option<PairCandidate>,
    facets_a: &[FacetRecord],
    facets_b: &[FacetRecord],
    max_distance: f64,
) -> Option<ClosestApproach> {
    let c = candidate?;
    (c.distance <= max_distance).then(|| ClosestApproach {
        read_index_a: facets_a[c.facet_a].read_index,
        read_index_b: facets_b[c.facet_b].read_index,
        segment: c.segment,
        distance: c.distance,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Two-mesh closest approach
// ─────────────────────────────────────────────────────────────────────────────

/// Closest approach between facets of two meshes.
///
/// Small meshes (either at or under `brute_force_point_limit` points) are
/// searched over all facet pairs. Larger ones get a range tree each; a
/// strided presample seeds the distance bound and the dual-tree traversal
/// then visits only facet pairs whose boxes are within the running bound.
#[must_use]
pub fn search_closest_approach(
    mesh_a: &PolyfaceQuery<'_>,
    mesh_b: &PolyfaceQuery<'_>,
    options: &CloseApproachOptions,
) -> (Option<ClosestApproach>, SearchDiagnostics) {
    let mut diagnostics = SearchDiagnostics::new();
    let mut metrics = KernelMetrics::default();
    metrics.begin();

    let (facets_a, facets_b) = metrics.time(TimingBucket::FacetCollection, || {
        (
            collect_facets(mesh_a, &mut diagnostics),
            collect_facets(mesh_b, &mut diagnostics),
        )
    });
    let max_distance = options.distance_bound();
    let limit = options.brute_force_point_limit;

    let best = if mesh_a.points().len() <= limit || mesh_b.points().len() <= limit {
        log::debug!(
            "closest approach: brute force over {}x{} facets",
            facets_a.len(),
            facets_b.len()
        );
        diagnostics.brute_force_used = true;
        metrics.time(TimingBucket::PairSearch, || {
            brute_force_pairs(&facets_a, &facets_b, &mut diagnostics)
        })
    } else {
        tree_search_pairs(&facets_a, &facets_b, options, &mut metrics, &mut diagnostics)
    };

    diagnostics.timing = metrics.end();
    let approach = to_closest_approach(best, &facets_a, &facets_b, max_distance);
    log::debug!("closest approach: {}", diagnostics.summary());
    (approach, diagnostics)
}

fn brute_force_pairs(
    facets_a: &[FacetRecord],
    facets_b: &[FacetRecord],
    diagnostics: &mut SearchDiagnostics,
) -> Option<PairCandidate> {
    let mut best = None;
    for (ia, a) in facets_a.iter().enumerate() {
        for (ib, b) in facets_b.iter().enumerate() {
            diagnostics.pairs_tested += 1;
            if let Some((distance, segment)) = facet_pair_approach(a, b) {
                PairCandidate::keep_nearer(
                    &mut best,
                    PairCandidate {
                        facet_a: ia,
                        facet_b: ib,
                        distance,
                        segment,
                    },
                );
            }
        }
    }
    best
}

fn presample_stride(options: &CloseApproachOptions, count: usize) -> usize {
    if options.presample_stride > 0 {
        return options.presample_stride;
    }
    let mut stride = 1;
    while stride * stride < count {
        stride += 1;
    }
    stride
}

fn tree_search_pairs(
    facets_a: &[FacetRecord],
    facets_b: &[FacetRecord],
    options: &CloseApproachOptions,
    metrics: &mut KernelMetrics,
    diagnostics: &mut SearchDiagnostics,
) -> Option<PairCandidate> {
    let boxes_a: Vec<BBox> = facets_a.iter().map(|f| f.bbox).collect();
    let boxes_b: Vec<BBox> = facets_b.iter().map(|f| f.bbox).collect();
    let (tree_a, tree_b) = metrics.time(TimingBucket::TreeBuild, || {
        (FacetRangeTree::build(&boxes_a), FacetRangeTree::build(&boxes_b))
    });
    let (tree_a, tree_b) = (tree_a?, tree_b?);

    let mut best: Option<PairCandidate> = None;
    metrics.time(TimingBucket::Presample, || {
        let stride_a = presample_stride(options, facets_a.len());
        let stride_b = presample_stride(options, facets_b.len());
        for ia in (0..facets_a.len()).step_by(stride_a) {
            for ib in (0..facets_b.len()).step_by(stride_b) {
                diagnostics.pairs_tested += 1;
                if let Some((distance, segment)) = facet_pair_approach(&facets_a[ia], &facets_b[ib]) {
                    PairCandidate::keep_nearer(
                        &mut best,
                        PairCandidate {
                            facet_a: ia,
                            facet_b: ib,
                            distance,
                            segment,
                        },
                    );
                }
            }
        }
    });
    diagnostics.presample_bound = best.map(|c| c.distance);

    let bound = best.map_or(options.distance_bound(), |c| c.distance.min(options.distance_bound()));
    let stats = metrics.time(TimingBucket::PairSearch, || {
        tree_a.search_pairs(&tree_b, bound, |ia, ib| {
            let (distance, segment) = facet_pair_approach(&facets_a[ia], &facets_b[ib])?;
            PairCandidate::keep_nearer(
                &mut best,
                PairCandidate {
                    facet_a: ia,
                    facet_b: ib,
                    distance,
                    segment,
                },
            );
            Some(distance)
        })
    });
    diagnostics.pairs_tested += stats.pairs_tested;
    diagnostics.pairs_pruned += stats.pairs_pruned;
    best
}

// ─────────────────────────────────────────────────────────────────────────────
// Self closest approach
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
struct RowResult {
    best: Option<PairCandidate>,
    tested: usize,
    shared: usize,
    rejected_by_normal: usize,
}

/// True when `v` is within `radians` of perpendicular to `normal`.
fn is_near_tangent(v: Vec3, normal: Option<Vec3>, radians: f64) -> bool {
    let Some(normal) = normal else {
        return false;
    };
    if v.length() == 0.0 {
        return false;
    }
    (v.angle_to(normal) - std::f64::consts::FRAC_PI_2).abs() < radians
}

fn scan_self_row(facets: &[FacetRecord], i: usize, options: &CloseApproachOptions) -> RowResult {
    let mut row = RowResult::default();
    let a = &facets[i];
    let bound = options.distance_bound();
    for (j, b) in facets.iter().enumerate().skip(i + 1) {
        if a.shares_vertex(b) {
            row.shared += 1;
            continue;
        }
        if a.bbox.distance_to_bbox(b.bbox) > bound {
            continue;
        }
        row.tested += 1;
        let Some((distance, segment)) = facet_pair_approach(a, b) else {
            continue;
        };
        if options.normal_test_radians > 0.0 {
            let v = segment.end - segment.start;
            if is_near_tangent(v, a.normal, options.normal_test_radians)
                || is_near_tangent(v, b.normal, options.normal_test_radians)
            {
                row.rejected_by_normal += 1;
                continue;
            }
        }
        PairCandidate::keep_nearer(
            &mut row.best,
            PairCandidate {
                facet_a: i,
                facet_b: j,
                distance,
                segment,
            },
        );
    }
    row
}

#[cfg(feature = "parallel")]
fn scan_self_rows(facets: &[FacetRecord], options: &CloseApproachOptions) -> Vec<RowResult> {
    (0..facets.len())
        .into_par_iter()
        .map(|i| scan_self_row(facets, i, options))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn scan_self_rows(facets: &[FacetRecord], options: &CloseApproachOptions) -> Vec<RowResult> {
    (0..facets.len())
        .map(|i| scan_self_row(facets, i, options))
        .collect()
}

/// Closest approach between distinct facets of one mesh.
///
/// Facets sharing a point index are never paired. With
/// `normal_test_radians > 0`, approach segments lying nearly in either
/// facet's plane are rejected as coplanar neighbours.
#[must_use]
pub fn search_self_closest_approach(
    mesh: &PolyfaceQuery<'_>,
    options: &CloseApproachOptions,
) -> (Option<ClosestApproach>, SearchDiagnostics) {
    let mut diagnostics = SearchDiagnostics::new();
    let mut metrics = KernelMetrics::default();
    metrics.begin();

    let facets = metrics.time(TimingBucket::FacetCollection, || collect_facets(mesh, &mut diagnostics));
    let rows = metrics.time(TimingBucket::PairSearch, || scan_self_rows(&facets, options));

    // Rows reduce in index order so ties resolve identically with or
    // without the parallel scan.
    let mut best = None;
    for row in rows {
        diagnostics.pairs_tested += row.tested;
        diagnostics.pairs_sharing_vertices += row.shared;
        diagnostics.pairs_rejected_by_normal += row.rejected_by_normal;
        if let Some(candidate) = row.best {
            PairCandidate::keep_nearer(&mut best, candidate);
        }
    }

    diagnostics.timing = metrics.end();
    let approach = to_closest_approach(best, &facets, &facets, options.distance_bound());
    log::debug!("self closest approach: {}", diagnostics.summary());
    (approach, diagnostics)
}

// ─────────────────────────────────────────────────────────────────────────────
// Nearest facet
// ─────────────────────────────────────────────────────────────────────────────

/// Facet point nearest `space_point`, within `max_distance` (`0` means
/// unbounded). `a` of the returned detail holds the distance.
#[must_use]
pub fn closest_facet_point(
    mesh: &PolyfaceQuery<'_>,
    space_point: Point3,
    max_distance: f64,
) -> (Option<FacetLocationDetail>, SearchDiagnostics) {
    let mut diagnostics = SearchDiagnostics::new();
    let mut metrics = KernelMetrics::default();
    metrics.begin();

    let facets = metrics.time(TimingBucket::FacetCollection, || collect_facets(mesh, &mut diagnostics));
    let boxes: Vec<BBox> = facets.iter().map(|f| f.bbox).collect();
    let tree = metrics.time(TimingBucket::TreeBuild, || FacetRangeTree::build(&boxes));
    let bound = if max_distance > 0.0 { max_distance } else { f64::INFINITY };
    let found = tree.and_then(|tree| {
        metrics.time(TimingBucket::PairSearch, || {
            tree.nearest(space_point, bound, |i| {
                diagnostics.pairs_tested += 1;
                closest_polygon_point(&facets[i].points, space_point)
                    .map(|loc| loc.point.distance_squared_to(space_point))
            })
        })
    });

    let detail = found.and_then(|(facet, dist2)| nearest_facet_detail(mesh, &facets[facet], space_point, dist2));
    diagnostics.timing = metrics.end();
    log::debug!("closest facet point: {}", diagnostics.summary());
    (detail, diagnostics)
}

fn nearest_facet_detail(
    mesh: &PolyfaceQuery<'_>,
    facet: &FacetRecord,
    space_point: Point3,
    dist2: f64,
) -> Option<FacetLocationDetail> {
    let mut visitor = mesh.visitor();
    if visitor.move_to_facet_by_read_index(facet.read_index) {
        closest_polygon_point(&facet.points, space_point).map(|loc| {
            let mut detail = visitor
                .location_detail_at_point(loc.point)
                .unwrap_or_else(|| FacetLocationDetail::new(visitor.read_index(), 0.0));
            detail.set_point(loc.point);
            detail.a = dist2.sqrt();
            detail
        })
    } else {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stroke picking
// ─────────────────────────────────────────────────────────────────────────────

/// Portion of one facet swept by a pick stroke.
///
/// In `start` and `end`, `point` is on the facet, `param` holds the stroke
/// coordinates `(u, v)` (u along the stroke, v toward the eye) and `a`
/// repeats u. `start.a <= end.a`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeFacetHit {
    pub read_index: usize,
    pub start: FacetLocationDetail,
    pub end: FacetLocationDetail,
}

/// Homogeneous frame of the pick plane: x along the stroke, y toward the
/// eye, z normal to the plane, origin at the stroke start.
fn stroke_frame(eye: Point4, start: Point3, end: Point3) -> Option<Matrix4d> {
    let along = end - start;
    let toward_eye = if eye.w == 0.0 {
        eye.xyz_vec()
    } else {
        eye.xyz_vec() / eye.w - start.to_vec3()
    };
    let normal = along.cross(toward_eye).normalized()?;
    Some(Matrix4d::from_columns(
        Point4::new(along.x, along.y, along.z, 0.0),
        eye,
        Point4::new(normal.x, normal.y, normal.z, 0.0),
        start.with_weight(1.0),
    ))
}

/// Picks every facet crossed by the plane through `eye` and the stroke
/// `start..end`, clipped to the stroke. `eye` with `w == 0` is a view
/// direction. An unusable stroke (zero length, or through the eye) picks
/// nothing and leaves a warning.
#[must_use]
pub fn pick_facets_by_stroke(
    mesh: &PolyfaceQuery<'_>,
    eye: Point4,
    start: Point3,
    end: Point3,
    exit_after_first: bool,
) -> (Vec<StrokeFacetHit>, SearchDiagnostics) {
    let mut diagnostics = SearchDiagnostics::new();
    let mut metrics = KernelMetrics::default();
    metrics.begin();
    let mut hits = Vec::new();

    let world_to_local = metrics.time(TimingBucket::MatrixAlgebra, || {
        stroke_frame(eye, start, end).and_then(|local_to_world| local_to_world.invert_qr())
    });
    let Some(world_to_local) = world_to_local else {
        diagnostics.add_warning("degenerate stroke frame");
        diagnostics.timing = metrics.end();
        log::debug!("stroke pick: degenerate stroke frame; {}", diagnostics.summary());
        return (hits, diagnostics);
    };

    metrics.time(TimingBucket::Picking, || {
        let mut visitor = mesh.visitor();
        while visitor.advance_to_next_face() {
            diagnostics.facets_visited += 1;
            let local: Vec<Point4> = visitor
                .points()
                .iter()
                .map(|p| world_to_local.multiply_xyzw(*p, 1.0))
                .collect();
            if let Some(hit) = pick_facet(&visitor, &local) {
                hits.push(hit);
                if exit_after_first {
                    break;
                }
            }
        }
    });

    diagnostics.timing = metrics.end();
    log::debug!("stroke pick: {} hits; {}", hits.len(), diagnostics.summary());
    (hits, diagnostics)
}

#[derive(Debug, Clone, Copy)]
struct PlaneCrossing {
    edge: usize,
    fraction: f64,
    local: Point4,
}

impl PlaneCrossing {
    fn u(&self) -> f64 {
        self.local.x / self.local.w
    }
}

fn pick_facet(visitor: &PolyfaceVisitor<'_>, local: &[Point4]) -> Option<StrokeFacetHit> {
    let n = local.len();
    let mut crossings = Vec::new();
    for i in 0..n {
        let (a, b) = (local[i], local[(i + 1) % n]);
        let (za, zb) = (a.z, b.z);
        if za == 0.0 {
            crossings.push(PlaneCrossing {
                edge: i,
                fraction: 0.0,
                local: a,
            });
        } else if (za < 0.0) != (zb < 0.0) && zb != 0.0 {
            let s = za / (za - zb);
            crossings.push(PlaneCrossing {
                edge: i,
                fraction: s,
                local: a.interpolate(s, b),
            });
        }
    }
    crossings.retain(|c| c.local.w != 0.0);
    let first = *crossings.iter().min_by(|p, q| p.u().total_cmp(&q.u()))?;
    let last = *crossings.iter().max_by(|p, q| p.u().total_cmp(&q.u()))?;
    if last.u() < 0.0 || first.u() > 1.0 {
        return None;
    }

    let clip = |c: PlaneCrossing, other: PlaneCrossing, bound: f64| -> (Point4, Point3) {
        let world_c = crossing_world_point(visitor, c);
        let world_o = crossing_world_point(visitor, other);
        let du = other.local.x - c.local.x;
        let dw = other.local.w - c.local.w;
        let denom = du - bound * dw;
        if denom == 0.0 {
            return (c.local, world_c);
        }
        let s = (bound * c.local.w - c.local.x) / denom;
        (c.local.interpolate(s, other.local), world_c.lerp(world_o, s))
    };

    let (local0, world0) = if first.u() < 0.0 {
        clip(first, last, 0.0)
    } else {
        (first.local, crossing_world_point(visitor, first))
    };
    let (local1, world1) = if last.u() > 1.0 {
        clip(last, first, 1.0)
    } else {
        (last.local, crossing_world_point(visitor, last))
    };

    let detail = |crossing: PlaneCrossing, local: Point4, world: Point3| {
        let n = visitor.points().len();
        let mut detail = FacetLocationDetail::new(visitor.read_index(), 0.0);
        let j = (crossing.edge + 1) % n;
        for (index, w) in [(crossing.edge, 1.0 - crossing.fraction), (j, crossing.fraction)] {
            if let Some(vertex) = visitor.load_vertex_data(index) {
                detail.accumulate_scaled_data(&vertex, w);
            }
        }
        let u = local.x / local.w;
        detail.set_point(world);
        detail.set_param(Point2::new(u, local.y / local.w));
        detail.a = u;
        detail.is_interior = true;
        detail
    };

    Some(StrokeFacetHit {
        read_index: visitor.read_index(),
        start: detail(first, local0, world0),
        end: detail(last, local1, world1),
    })
}

fn crossing_world_point(visitor: &PolyfaceVisitor<'_>, c: PlaneCrossing) -> Point3 {
    let points = visitor.points();
    let a = points[c.edge];
    let b = points[(c.edge + 1) % points.len()];
    a.lerp(b, c.fraction)
}

/// Depth interval of one facet along a pick stroke.
///
/// `z` grows toward the eye, so at equal `u` a larger `z` hides a smaller one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePick {
    pub u0: f64,
    pub u1: f64,
    pub z0: f64,
    pub z1: f64,
    pub read_index: usize,
    pub is_visible: bool,
    pub is_hidden: bool,
}

impl StrokePick {
    /// Pick spanning `(u0, z0)..(u1, z1)`, reordered so `u0 <= u1`.
    #[must_use]
    pub fn new(u0: f64, z0: f64, u1: f64, z1: f64, read_index: usize) -> Self {
        let (u0, z0, u1, z1) = if u1 < u0 { (u1, z1, u0, z0) } else { (u0, z0, u1, z1) };
        Self {
            u0,
            u1,
            z0,
            z1,
            read_index,
            is_visible: false,
            is_hidden: false,
        }
    }

    #[must_use]
    pub fn from_hit(hit: &StrokeFacetHit) -> Self {
        Self::new(hit.start.param.x, hit.start.param.y, hit.end.param.x, hit.end.param.y, hit.read_index)
    }

    /// Depth range at `u` and whether `u` lies within the pick.
    ///
    /// Inside the span the depth is interpolated and the range collapses to
    /// it. A degenerate span reports its sorted depth range (valid only at
    /// its own `u`). Outside a proper span the nearer end depth is reported
    /// as not valid.
    #[must_use]
    pub fn interior_z_at_u(&self, u: f64) -> (f64, f64, bool) {
        let sorted = (self.z0.min(self.z1), self.z0.max(self.z1));
        if self.u0 == self.u1 {
            return (sorted.0, sorted.1, u == self.u0);
        }
        if u < self.u0 {
            return (self.z0, self.z0, false);
        }
        if u > self.u1 {
            return (self.z1, self.z1, false);
        }
        let t = (u - self.u0) / (self.u1 - self.u0);
        let z = self.z0 + t * (self.z1 - self.z0);
        (z, z, true)
    }

    fn overlaps(&self, other: &Self) -> bool {
        self.u0 <= other.u1 && other.u0 <= self.u1
    }
}

/// Appends the pick spanned by the first and last of `points`, taking `u`
/// from x and depth from coordinate `axis_select`. Returns false when there
/// are fewer than two points.
pub fn append_stroke_pick(picks: &mut Vec<StrokePick>, axis_select: usize, points: &[Point3], read_index: usize) -> bool {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return false;
    };
    if points.len() < 2 {
        return false;
    }
    picks.push(StrokePick::new(
        first.x,
        first.component(axis_select),
        last.x,
        last.component(axis_select),
        read_index,
    ));
    true
}

/// Sorts `picks` by left end and marks each as visible where no overlapping
/// pick lies above it and hidden where one does. A partially covered pick
/// ends up with both flags.
///
/// The diagnostics count picks as facets and overlapping neighbours as
/// tested pairs.
pub fn set_visibility_bits(picks: &mut [StrokePick]) -> SearchDiagnostics {
    let mut diagnostics = SearchDiagnostics::new();
    let mut metrics = KernelMetrics::default();
    metrics.begin();

    let tested = metrics.time(TimingBucket::Visibility, || mark_visibility(picks));
    diagnostics.facets_visited = picks.len();
    diagnostics.pairs_tested = tested;
    diagnostics.timing = metrics.end();
    log::debug!("visibility: {}", diagnostics.summary());
    diagnostics
}

/// Returns the number of overlapping pick pairs compared.
fn mark_visibility(picks: &mut [StrokePick]) -> usize {
    picks.sort_by(|a, b| a.u0.total_cmp(&b.u0).then_with(|| a.u1.total_cmp(&b.u1)));

    let mut tested = 0;
    let mut flags = Vec::with_capacity(picks.len());
    for i in 0..picks.len() {
        let current = picks[i];
        let mut neighbours: Vec<StrokePick> = picks[..i]
            .iter()
            .filter(|left| left.overlaps(&current))
            .copied()
            .collect();
        neighbours.extend(
            picks[i + 1..]
                .iter()
                .take_while(|right| right.u0 <= current.u1)
                .filter(|right| right.overlaps(&current))
                .copied(),
        );

        tested += neighbours.len();
        let samples = sample_parameters(&current, &neighbours);
        let mut visible = false;
        let mut hidden = false;
        for u in samples {
            let (_, z_high, _) = current.interior_z_at_u(u);
            let covered = neighbours.iter().any(|other| {
                let (z, _, valid) = other.interior_z_at_u(u);
                valid && z > z_high + VISIBILITY_Z_TOLERANCE
            });
            if covered {
                hidden = true;
            } else {
                visible = true;
            }
        }
        flags.push((visible, hidden));
    }

    for (pick, (visible, hidden)) in picks.iter_mut().zip(flags) {
        pick.is_visible = visible;
        pick.is_hidden = hidden;
    }
    tested
}

/// Midpoints between the breakpoints that neighbours put inside `pick`.
fn sample_parameters(pick: &StrokePick, neighbours: &[StrokePick]) -> Vec<f64> {
    if pick.u0 == pick.u1 {
        return vec![pick.u0];
    }
    let mut breaks = vec![pick.u0, pick.u1];
    for other in neighbours {
        for u in [other.u0, other.u1] {
            if u > pick.u0 && u < pick.u1 {
                breaks.push(u);
            }
        }
    }
    breaks.sort_by(f64::total_cmp);
    breaks.dedup();
    breaks.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
}
