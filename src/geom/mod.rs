mod bezier;
mod bspline;
mod bspline_edit;
mod bvh;
mod core;
mod diagnostics;
mod knots;
mod map4d;
mod matrix4d;
mod metrics;
mod numeric;
mod polyface;
mod polyface_search;

pub use bezier::{
    BezierSegment, CurveCloseApproach, MAX_STROKES_PER_BEZIER, StrokeOptions,
    StrokeParameterMapping, Strokes, WIRE_INTEGRAL_REL_TOLERANCE, curve_close_approach,
    refine_close_approach,
};
pub use bspline::{
    BsplineCurve, BsplineError, FRAME_TOLERANCE, FrenetFrame, LINEAR_CURVATURE,
    POINT_ABS_TOLERANCE, POINT_REL_TOLERANCE, SUCCESS, WEIGHT_TOLERANCE, chain_rule,
    is_same_point, is_same_rational_point, polygon_normal, status_of,
};
pub use bspline_edit::KnotSpan;
pub use bvh::{FacetRangeTree, PairSearchStats};
pub use self::core::{BBox, ClosedIndex, Point2, Point3, Point4, Ray3, Segment3, Tolerance, Vec3};
pub use diagnostics::SearchDiagnostics;
pub use knots::{
    KNOT_TOLERANCE_BASIS, MAX_ORDER, MIN_KNOT_TOLERANCE, basis_functions, compute_knot_vector,
    find_span, increase_knot_degree, is_non_decreasing, knot_multiplicities, knot_range,
    knot_tolerance, multiplicity_at, normalize_knot_vector, num_interior_knots, num_knots,
    symmetric_functions,
};
pub use map4d::{FRAME, Map4d, MapError, PERSPECTIVE, SCALE, SINGULAR, TRANSLATE};
pub use matrix4d::{DEFAULT_PERSPECTIVE_TOLERANCE, Matrix4d, PrincipalMoments};
pub use metrics::{KernelMetrics, KernelTimingReport, TimingBucket};
pub use numeric::{
    BezierPolynomial, FunctionRR2ToRR2, NewtonOptions, NewtonSolver2d, integrate_newton_cotes,
};
pub use polyface::{
    FacetLocationDetail, FacetPointLocation, MAX_FACET_LOCATION_INDEX, PolyfaceQuery,
    PolyfaceVisitor,
};
pub use polyface_search::{
    BRUTE_FORCE_POINT_LIMIT, CloseApproachOptions, ClosestApproach, StrokeFacetHit, StrokePick,
    VISIBILITY_Z_TOLERANCE, append_stroke_pick, closest_facet_point, pick_facets_by_stroke,
    search_closest_approach, search_self_closest_approach, set_visibility_bits,
};

#[cfg(test)]
mod tests;
