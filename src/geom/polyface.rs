//! Borrowed mesh view, facet visitor and per-facet hit tests.
//!
//! A [`PolyfaceQuery`] borrows caller-owned arrays: points, optional
//! per-point params and normals, and a 1-based signed point index. A negative
//! index marks the edge leaving that vertex as hidden. With
//! `num_per_face == 0` faces are variable-size and each ends with a `0`;
//! otherwise every face occupies exactly `num_per_face` slots and a `0` pads
//! short faces. The read index of a facet is the position of its first slot.

use std::cmp::Ordering;

use super::bspline::polygon_normal;
use super::core::{BBox, Point2, Point3, Ray3, Segment3, Vec3};

/// Capacity of the vertex blend tables in a [`FacetLocationDetail`].
pub const MAX_FACET_LOCATION_INDEX: usize = 4;

/// Barycentric slack for "inside the triangle" tests.
const BARYCENTRIC_TOLERANCE: f64 = 1e-12;

const POINT_MASK: u32 = 0x01;
const PARAM_MASK: u32 = 0x02;
const NORMAL_MASK: u32 = 0x04;

// ─────────────────────────────────────────────────────────────────────────────
// Mesh view
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct PolyfaceQuery<'a> {
    points: &'a [Point3],
    point_index: &'a [i32],
    params: Option<&'a [Point2]>,
    normals: Option<&'a [Vec3]>,
    num_per_face: usize,
}

impl<'a> PolyfaceQuery<'a> {
    #[must_use]
    pub const fn new(points: &'a [Point3], point_index: &'a [i32], num_per_face: usize) -> Self {
        Self {
            points,
            point_index,
            params: None,
            normals: None,
            num_per_face,
        }
    }

    /// Attaches per-point params, indexed like the points.
    #[must_use]
    pub const fn with_params(mut self, params: &'a [Point2]) -> Self {
        self.params = Some(params);
        self
    }

    /// Attaches per-point normals, indexed like the points.
    #[must_use]
    pub const fn with_normals(mut self, normals: &'a [Vec3]) -> Self {
        self.normals = Some(normals);
        self
    }

    #[must_use]
    pub const fn points(&self) -> &'a [Point3] {
        self.points
    }

    #[must_use]
    pub const fn point_index(&self) -> &'a [i32] {
        self.point_index
    }

    #[must_use]
    pub const fn params(&self) -> Option<&'a [Point2]> {
        self.params
    }

    #[must_use]
    pub const fn normals(&self) -> Option<&'a [Vec3]> {
        self.normals
    }

    #[must_use]
    pub const fn num_per_face(&self) -> usize {
        self.num_per_face
    }

    /// Visitor positioned before the first facet.
    #[must_use]
    pub fn visitor(&self) -> PolyfaceVisitor<'a> {
        PolyfaceVisitor::new(*self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FacetLocationDetail
// ─────────────────────────────────────────────────────────────────────────────

/// Interpolated data at a location on a facet.
///
/// Built by scaled accumulation of per-vertex details; refers back to the
/// facet only through `read_index` and the facet-local `source_index` table.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FacetLocationDetail {
    pub is_interior: bool,
    pub read_index: usize,
    pub point: Point3,
    pub param: Point2,
    pub normal: Vec3,
    /// Facet-local vertex indices blended into this location.
    pub source_index: [usize; MAX_FACET_LOCATION_INDEX],
    /// Blend weight of each entry of `source_index`.
    pub source_fraction: [f64; MAX_FACET_LOCATION_INDEX],
    pub num_source_index: usize,
    /// Ray or scan parameter of the location.
    pub a: f64,
    pub d_x_du: Vec3,
    pub d_x_dv: Vec3,
    active_mask: u32,
}

impl FacetLocationDetail {
    #[must_use]
    pub fn new(read_index: usize, a: f64) -> Self {
        Self {
            read_index,
            a,
            ..Self::default()
        }
    }

    /// Adds `fraction` times every numeric field of `source`, and appends its
    /// vertex table with fractions scaled by `fraction` while space remains.
    pub fn accumulate_scaled_data(&mut self, source: &Self, fraction: f64) {
        self.point = self.point + source.point.to_vec3() * fraction;
        self.param = Point2::new(
            self.param.x + source.param.x * fraction,
            self.param.y + source.param.y * fraction,
        );
        self.normal = self.normal + source.normal * fraction;
        self.d_x_du = self.d_x_du + source.d_x_du * fraction;
        self.d_x_dv = self.d_x_dv + source.d_x_dv * fraction;
        self.a += source.a * fraction;
        self.active_mask |= source.active_mask;
        for k in 0..source.num_source_index {
            if self.num_source_index >= MAX_FACET_LOCATION_INDEX {
                break;
            }
            self.source_index[self.num_source_index] = source.source_index[k];
            self.source_fraction[self.num_source_index] = source.source_fraction[k] * fraction;
            self.num_source_index += 1;
        }
    }

    pub fn set_point(&mut self, point: Point3) {
        self.point = point;
        self.active_mask |= POINT_MASK;
    }

    pub fn set_param(&mut self, param: Point2) {
        self.param = param;
        self.active_mask |= PARAM_MASK;
    }

    pub fn set_normal(&mut self, normal: Vec3) {
        self.normal = normal;
        self.active_mask |= NORMAL_MASK;
    }

    #[must_use]
    pub fn try_get_point(&self) -> Option<Point3> {
        (self.active_mask & POINT_MASK != 0).then_some(self.point)
    }

    #[must_use]
    pub fn try_get_param(&self) -> Option<Point2> {
        (self.active_mask & PARAM_MASK != 0).then_some(self.param)
    }

    #[must_use]
    pub fn try_get_normal(&self) -> Option<Vec3> {
        (self.active_mask & NORMAL_MASK != 0).then_some(self.normal)
    }

    #[must_use]
    pub const fn num_weights(&self) -> usize {
        self.num_source_index
    }

    #[must_use]
    pub fn weight(&self, i: usize) -> Option<f64> {
        (i < self.num_source_index).then(|| self.source_fraction[i])
    }

    #[must_use]
    pub fn vertex_index(&self, i: usize) -> Option<usize> {
        (i < self.num_source_index).then(|| self.source_index[i])
    }

    /// Lexical order on `(param.x, param.y)`.
    #[must_use]
    pub fn compare_uv(&self, other: &Self) -> Ordering {
        self.param
            .x
            .total_cmp(&other.param.x)
            .then_with(|| self.param.y.total_cmp(&other.param.y))
    }

    pub fn sort_uv(details: &mut [Self]) {
        details.sort_by(Self::compare_uv);
    }

    pub fn sort_by_a(details: &mut [Self]) {
        details.sort_by(|p, q| p.a.total_cmp(&q.a));
    }
}

/// Nearest point of a facet to a space point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacetPointLocation {
    pub point: Point3,
    /// `None` for a true interior point, else the facet-local index of the
    /// edge's base vertex (or of the vertex itself when `edge_fraction == 0`).
    pub edge_index: Option<usize>,
    pub edge_fraction: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Visitor
// ─────────────────────────────────────────────────────────────────────────────

/// Cursor over the facets of a [`PolyfaceQuery`], holding copies of the
/// current facet's vertex data.
#[derive(Debug, Clone)]
pub struct PolyfaceVisitor<'a> {
    mesh: PolyfaceQuery<'a>,
    read_index: usize,
    next_read_index: usize,
    points: Vec<Point3>,
    params: Vec<Point2>,
    normals: Vec<Vec3>,
    point_indices: Vec<usize>,
    visible: Vec<bool>,
}

impl<'a> PolyfaceVisitor<'a> {
    #[must_use]
    pub fn new(mesh: PolyfaceQuery<'a>) -> Self {
        Self {
            mesh,
            read_index: 0,
            next_read_index: 0,
            points: Vec::new(),
            params: Vec::new(),
            normals: Vec::new(),
            point_indices: Vec::new(),
            visible: Vec::new(),
        }
    }

    #[must_use]
    pub const fn mesh(&self) -> &PolyfaceQuery<'a> {
        &self.mesh
    }

    /// Rewinds to before the first facet.
    pub fn reset(&mut self) {
        self.next_read_index = 0;
        self.read_index = 0;
        self.clear_all_arrays();
    }

    pub fn clear_all_arrays(&mut self) {
        self.points.clear();
        self.params.clear();
        self.normals.clear();
        self.point_indices.clear();
        self.visible.clear();
    }

    /// Loads the next non-empty facet. Returns false once all facets have
    /// been visited. Facets referencing points out of range are skipped.
    pub fn advance_to_next_face(&mut self) -> bool {
        let index = self.mesh.point_index;
        loop {
            self.clear_all_arrays();
            let start = self.next_read_index;
            if start >= index.len() {
                return false;
            }
            let (end, next) = if self.mesh.num_per_face == 0 {
                let end = index[start..]
                    .iter()
                    .position(|i| *i == 0)
                    .map_or(index.len(), |p| start + p);
                (end, end + 1)
            } else {
                let limit = (start + self.mesh.num_per_face).min(index.len());
                let end = index[start..limit]
                    .iter()
                    .position(|i| *i == 0)
                    .map_or(limit, |p| start + p);
                (end, start + self.mesh.num_per_face)
            };
            self.next_read_index = next;
            if end == start {
                continue;
            }
            if self.load_face(start, end) {
                self.read_index = start;
                return true;
            }
            log::debug!("polyface visitor: facet at read index {start} references a missing point");
        }
    }

    fn load_face(&mut self, start: usize, end: usize) -> bool {
        for &raw in &self.mesh.point_index[start..end] {
            let k = raw.unsigned_abs() as usize - 1;
            let Some(&point) = self.mesh.points.get(k) else {
                self.clear_all_arrays();
                return false;
            };
            self.points.push(point);
            self.point_indices.push(k);
            self.visible.push(raw > 0);
            if let Some(params) = self.mesh.params {
                if let Some(&uv) = params.get(k) {
                    self.params.push(uv);
                }
            }
            if let Some(normals) = self.mesh.normals {
                if let Some(&n) = normals.get(k) {
                    self.normals.push(n);
                }
            }
        }
        if self.params.len() != self.points.len() {
            self.params.clear();
        }
        if self.normals.len() != self.points.len() {
            self.normals.clear();
        }
        true
    }

    /// Read index of the current facet.
    #[must_use]
    pub const fn read_index(&self) -> usize {
        self.read_index
    }

    /// Repositions onto the facet starting at `read_index`.
    pub fn move_to_facet_by_read_index(&mut self, read_index: usize) -> bool {
        self.next_read_index = read_index;
        self.advance_to_next_face() && self.read_index == read_index
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Params of the current facet; empty when the mesh has none.
    #[must_use]
    pub fn params(&self) -> &[Point2] {
        &self.params
    }

    /// Normals of the current facet; empty when the mesh has none.
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Zero-based mesh point indices of the current facet.
    #[must_use]
    pub fn client_point_index(&self) -> &[usize] {
        &self.point_indices
    }

    /// Visibility of the edge leaving each vertex.
    #[must_use]
    pub fn visible(&self) -> &[bool] {
        &self.visible
    }

    #[must_use]
    pub fn num_edges_this_face(&self) -> usize {
        self.points.len()
    }

    /// Newell normal of the current facet, unit length.
    #[must_use]
    pub fn facet_normal(&self) -> Option<Vec3> {
        polygon_normal(&self.points)
    }

    #[must_use]
    pub fn facet_range(&self) -> Option<BBox> {
        BBox::from_points(&self.points)
    }

    // ── hit tests ───────────────────────────────────────────────────────

    /// Nearest point of the current facet to `p`.
    #[must_use]
    pub fn closest_facet_point(&self, p: Point3) -> Option<FacetPointLocation> {
        closest_polygon_point(&self.points, p)
    }

    /// Point of the current facet within `tolerance` of `space_point`.
    #[must_use]
    pub fn try_find_close_facet_point(&self, space_point: Point3, tolerance: f64) -> Option<Point3> {
        let loc = self.closest_facet_point(space_point)?;
        (space_point.distance_squared_to(loc.point) <= tolerance * tolerance).then_some(loc.point)
    }

    /// Ray hit on the current facet: the plane pierce point when it is
    /// inside the facet, else the nearest edge point when within `tolerance`
    /// of the pierce point. Returns the facet point and the ray parameter.
    #[must_use]
    pub fn try_find_facet_ray_intersection(&self, ray: &Ray3, tolerance: f64) -> Option<(Point3, f64)> {
        let normal = self.facet_normal()?;
        let denom = normal.dot(ray.direction);
        if !denom.is_finite() || denom.abs() <= f64::EPSILON * ray.direction.length() {
            return None;
        }
        let a = normal.dot(self.points[0] - ray.origin) / denom;
        let pierce = ray.point_at(a);
        if planar_polygon_contains(&self.points, normal, pierce) {
            return Some((pierce, a));
        }
        let loc = closest_polygon_edge_point(&self.points, pierce)?;
        (pierce.distance_squared_to(loc.point) <= tolerance * tolerance).then_some((loc.point, a))
    }

    /// Advances until a facet comes within `tolerance` of `xyz`.
    pub fn advance_to_facet_by_search_point(&mut self, xyz: Point3, tolerance: f64) -> Option<FacetPointLocation> {
        while self.advance_to_next_face() {
            if let Some(loc) = self.closest_facet_point(xyz) {
                if xyz.distance_squared_to(loc.point) <= tolerance * tolerance {
                    return Some(loc);
                }
            }
        }
        None
    }

    /// Advances until a facet is hit by `ray` (see
    /// [`try_find_facet_ray_intersection`](Self::try_find_facet_ray_intersection)).
    pub fn advance_to_facet_by_search_ray(&mut self, ray: &Ray3, tolerance: f64) -> Option<(Point3, f64)> {
        while self.advance_to_next_face() {
            if let Some(hit) = self.try_find_facet_ray_intersection(ray, tolerance) {
                return Some(hit);
            }
        }
        None
    }

    /// Like [`advance_to_facet_by_search_ray`](Self::advance_to_facet_by_search_ray)
    /// with zero tolerance, returning full interpolated data at the hit.
    pub fn advance_to_facet_by_search_ray_detail(&mut self, ray: &Ray3) -> Option<FacetLocationDetail> {
        while self.advance_to_next_face() {
            if let Some((point, a)) = self.try_find_facet_ray_intersection(ray, 0.0) {
                if let Some(mut detail) = self.location_detail_at_point(point) {
                    detail.a = a;
                    return Some(detail);
                }
            }
        }
        None
    }

    // ── interpolation ───────────────────────────────────────────────────

    /// Detail holding the data of vertex `index` of the current facet.
    #[must_use]
    pub fn load_vertex_data(&self, index: usize) -> Option<FacetLocationDetail> {
        let point = *self.points.get(index)?;
        let mut detail = FacetLocationDetail::new(self.read_index, 0.0);
        detail.set_point(point);
        if let Some(&uv) = self.params.get(index) {
            detail.set_param(uv);
        }
        if let Some(&n) = self.normals.get(index) {
            detail.set_normal(n);
        }
        detail.source_index[0] = index;
        detail.source_fraction[0] = 1.0;
        detail.num_source_index = 1;
        Some(detail)
    }

    /// Vertex data with the index taken cyclically.
    #[must_use]
    pub fn load_cyclic_vertex_data(&self, index: usize) -> Option<FacetLocationDetail> {
        if self.points.is_empty() {
            return None;
        }
        self.load_vertex_data(index % self.points.len())
    }

    fn blend(&self, weights: &[(usize, f64)]) -> Option<FacetLocationDetail> {
        let mut detail = FacetLocationDetail::new(self.read_index, 0.0);
        for &(index, w) in weights {
            detail.accumulate_scaled_data(&self.load_vertex_data(index)?, w);
        }
        Some(detail)
    }

    /// Interpolated data at a point on the current facet, blended over the
    /// fan triangle `(0, i, i + 1)` containing it (or the nearest one).
    #[must_use]
    pub fn location_detail_at_point(&self, p: Point3) -> Option<FacetLocationDetail> {
        let n = self.points.len();
        if n < 3 {
            return None;
        }
        let mut best: Option<(f64, usize, [f64; 3])> = None;
        for i in 1..n - 1 {
            let Some(b) = barycentric(p, self.points[0], self.points[i], self.points[i + 1]) else {
                continue;
            };
            let worst = b.iter().fold(f64::INFINITY, |m, v| m.min(*v));
            if best.is_none_or(|(w, _, _)| worst > w) {
                best = Some((worst, i, b));
            }
        }
        let (worst, i, b) = best?;
        let mut detail = self.blend(&[(0, b[0]), (i, b[1]), (i + 1, b[2])])?;
        detail.is_interior = worst >= -BARYCENTRIC_TOLERANCE;
        Some(detail)
    }

    /// Interpolated data at parameter `uv` of the current facet.
    ///
    /// Triangles are solved exactly in barycentric coordinates. Larger facets
    /// (assumed convex) interpolate between the edge crossings that bracket
    /// `uv` along its constant-v and constant-u scan lines. `None` when the
    /// facet has no params or a bracket is missing.
    #[must_use]
    pub fn try_param_to_facet_location_detail(&self, uv: Point2) -> Option<FacetLocationDetail> {
        let n = self.points.len();
        if n < 3 || self.params.len() != n {
            return None;
        }
        if n == 3 {
            return self.triangle_param_to_detail(uv);
        }
        let (left, right) = self.scan_bracket(uv, ScanAxis::ConstantV)?;
        let (below, above) = self.scan_bracket(uv, ScanAxis::ConstantU)?;

        let du = right.param.x - left.param.x;
        let t = if du == 0.0 { 0.0 } else { (uv.x - left.param.x) / du };
        let mut detail = FacetLocationDetail::new(self.read_index, 0.0);
        detail.accumulate_scaled_data(&left, 1.0 - t);
        detail.accumulate_scaled_data(&right, t);
        detail.set_param(uv);
        if du != 0.0 {
            detail.d_x_du = (right.point - left.point) / du;
        }
        let dv = above.param.y - below.param.y;
        if dv != 0.0 {
            detail.d_x_dv = (above.point - below.point) / dv;
        }
        detail.is_interior = true;
        Some(detail)
    }

    /// Edge crossings nearest to `uv` on either side along one scan line.
    pub fn try_param_to_scan_brackets(
        &self,
        uv: Point2,
    ) -> Option<((FacetLocationDetail, FacetLocationDetail), (FacetLocationDetail, FacetLocationDetail))> {
        if self.params.len() != self.points.len() || self.points.len() < 3 {
            return None;
        }
        Some((
            self.scan_bracket(uv, ScanAxis::ConstantV)?,
            self.scan_bracket(uv, ScanAxis::ConstantU)?,
        ))
    }

    fn scan_bracket(&self, uv: Point2, axis: ScanAxis) -> Option<(FacetLocationDetail, FacetLocationDetail)> {
        let (fixed_of, scan_of): (fn(Point2) -> f64, fn(Point2) -> f64) = match axis {
            ScanAxis::ConstantV => (|p: Point2| p.y, |p: Point2| p.x),
            ScanAxis::ConstantU => (|p: Point2| p.x, |p: Point2| p.y),
        };
        let fixed = fixed_of(uv);
        let target = scan_of(uv);
        let n = self.points.len();
        let mut low: Option<(f64, FacetLocationDetail)> = None;
        let mut high: Option<(f64, FacetLocationDetail)> = None;
        for i in 0..n {
            let j = (i + 1) % n;
            let (fa, fb) = (fixed_of(self.params[i]), fixed_of(self.params[j]));
            if fa == fb || fixed < fa.min(fb) || fixed > fa.max(fb) {
                continue;
            }
            let s = (fixed - fa) / (fb - fa);
            let scan = scan_of(self.params[i]) + s * (scan_of(self.params[j]) - scan_of(self.params[i]));
            let crossing = self.blend(&[(i, 1.0 - s), (j, s)])?;
            if scan <= target && low.is_none_or(|(v, _)| scan > v) {
                low = Some((scan, crossing));
            }
            if scan >= target && high.is_none_or(|(v, _)| scan < v) {
                high = Some((scan, crossing));
            }
        }
        Some((low?.1, high?.1))
    }

    fn triangle_param_to_detail(&self, uv: Point2) -> Option<FacetLocationDetail> {
        let [p0, p1, p2] = [self.params[0], self.params[1], self.params[2]];
        let (du1, dv1) = (p1.x - p0.x, p1.y - p0.y);
        let (du2, dv2) = (p2.x - p0.x, p2.y - p0.y);
        let det = du1 * dv2 - du2 * dv1;
        if !det.is_finite() || det.abs() <= f64::MIN_POSITIVE {
            return None;
        }
        let (eu, ev) = (uv.x - p0.x, uv.y - p0.y);
        let s = (eu * dv2 - du2 * ev) / det;
        let t = (du1 * ev - eu * dv1) / det;
        let weights = [1.0 - s - t, s, t];
        let mut detail = self.blend(&[(0, weights[0]), (1, weights[1]), (2, weights[2])])?;
        detail.set_param(uv);
        let dxds = self.points[1] - self.points[0];
        let dxdt = self.points[2] - self.points[0];
        detail.d_x_du = (dxds * dv2 - dxdt * dv1) / det;
        detail.d_x_dv = (dxdt * du1 - dxds * du2) / det;
        detail.is_interior = weights.iter().all(|w| *w >= -BARYCENTRIC_TOLERANCE);
        Some(detail)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Polygon helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Crossing-number test for `p`, assumed on the polygon plane, projected
/// along the dominant axis of `normal`.
pub(crate) fn planar_polygon_contains(points: &[Point3], normal: Vec3, p: Point3) -> bool {
    let (ia, ib) = match dominant_axis(normal) {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };
    let (px, py) = (p.component(ia), p.component(ib));
    let mut inside = false;
    let Some(mut prev) = points.last().copied() else {
        return false;
    };
    for &cur in points {
        let (xi, yi) = (cur.component(ia), cur.component(ib));
        let (xj, yj) = (prev.component(ia), prev.component(ib));
        if (yi > py) != (yj > py) {
            let x = xj + (py - yj) * (xi - xj) / (yi - yj);
            if px < x {
                inside = !inside;
            }
        }
        prev = cur;
    }
    inside
}

pub(crate) fn closest_polygon_edge_point(points: &[Point3], p: Point3) -> Option<FacetPointLocation> {
    let n = points.len();
    let mut best: Option<(f64, FacetPointLocation)> = None;
    for i in 0..n {
        let (f, q) = Segment3::new(points[i], points[(i + 1) % n]).closest_point(p);
        let d2 = p.distance_squared_to(q);
        if best.is_some_and(|(b, _)| b <= d2) {
            continue;
        }
        let (edge_index, edge_fraction) = if f >= 1.0 { ((i + 1) % n, 0.0) } else { (i, f) };
        best = Some((
            d2,
            FacetPointLocation {
                point: q,
                edge_index: Some(edge_index),
                edge_fraction,
            },
        ));
    }
    best.map(|(_, loc)| loc)
}

/// Nearest point of a planar polygon: the plane projection when it falls
/// inside, else the nearest boundary point.
pub(crate) fn closest_polygon_point(points: &[Point3], p: Point3) -> Option<FacetPointLocation> {
    let first = *points.first()?;
    if let Some(normal) = polygon_normal(points) {
        let projected = p - normal * (p - first).dot(normal);
        if planar_polygon_contains(points, normal, projected) {
            return Some(FacetPointLocation {
                point: projected,
                edge_index: None,
                edge_fraction: 0.0,
            });
        }
    }
    closest_polygon_edge_point(points, p)
}

/// Point where `segment` crosses the interior of a planar polygon.
pub(crate) fn segment_polygon_pierce(points: &[Point3], normal: Vec3, segment: Segment3) -> Option<Point3> {
    let origin = *points.first()?;
    let h0 = normal.dot(segment.start - origin);
    let h1 = normal.dot(segment.end - origin);
    if (h0 > 0.0 && h1 > 0.0) || (h0 < 0.0 && h1 < 0.0) || h0 == h1 {
        return None;
    }
    let q = segment.fraction_to_point(h0 / (h0 - h1));
    planar_polygon_contains(points, normal, q).then_some(q)
}

#[derive(Debug, Clone, Copy)]
enum ScanAxis {
    ConstantV,
    ConstantU,
}

fn dominant_axis(v: Vec3) -> usize {
    let (x, y, z) = (v.x.abs(), v.y.abs(), v.z.abs());
    if x >= y && x >= z {
        0
    } else if y >= z {
        1
    } else {
        2
    }
}

/// Barycentric coordinates of `p` (projected onto the triangle plane).
fn barycentric(p: Point3, a: Point3, b: Point3, c: Point3) -> Option<[f64; 3]> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if !denom.is_finite() || denom.abs() <= f64::MIN_POSITIVE {
        return None;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Some([1.0 - v - w, v, w])
}
