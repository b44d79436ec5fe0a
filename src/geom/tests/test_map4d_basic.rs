use crate::geom::{
    FRAME, Map4d, MapError, PERSPECTIVE, Point3, Point4, SCALE, SINGULAR, TRANSLATE, Vec3,
};

fn project(map: &Map4d, p: Point3) -> Point3 {
    map.transform_point(p.with_weight(1.0))
        .normalize()
        .expect("finite image")
}

#[test]
fn scale_with_zero_factor_is_singular() {
    let map = Map4d::scale(0.0, 1.0, 1.0);
    assert!(map.is_singular());
    assert!(map.has(SCALE));
    assert_eq!(map.m1.coff[0][0], 0.0);
    assert_eq!(map.m1.coff[1][1], 1.0);
}

#[test]
fn invert_twice_is_exact() {
    let map = Map4d::frustum(-1.0, 2.0, -0.5, 0.75, 1.0, 10.0).expect("frustum");
    assert_eq!(map.invert().invert(), map);
}

#[test]
fn translation_inverse_round_trips() {
    let map = Map4d::translation(Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(map.mask, TRANSLATE);
    let p = Point4::new(4.0, 5.0, 6.0, 1.0);
    assert_eq!(map.inverse_transform_point(map.transform_point(p)), p);
}

#[test]
fn box_to_box_maps_corners() {
    let map = Map4d::box_to_box(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 2.0, 4.0),
        Point3::new(-1.0, -1.0, -1.0),
        Point3::new(1.0, 1.0, 1.0),
    )
    .expect("boxes have extent");
    let hi = project(&map, Point3::new(1.0, 2.0, 4.0));
    assert!(hi.distance_to(Point3::new(1.0, 1.0, 1.0)) < 1e-12);
    assert!(map.inverse_error() < 1e-12);
}

#[test]
fn box_to_box_rejects_flat_box() {
    let err = Map4d::box_to_box(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 1.0),
    )
    .unwrap_err();
    assert_eq!(err, MapError::DegenerateBox);
}

#[test]
fn rotation_rejects_zero_axis() {
    assert_eq!(
        Map4d::rotation_radians(Vec3::ZERO, 0.3).unwrap_err(),
        MapError::DegenerateAxis
    );
}

#[test]
fn rotation_inverse_is_transpose() {
    let map = Map4d::rotation_radians(Vec3::new(1.0, 1.0, 0.0), 0.7).expect("rotation");
    assert!(map.has(FRAME));
    assert!(map.inverse_error() < 1e-12);
}

#[test]
fn ortho_maps_view_box_to_unit_cube() {
    let map = Map4d::ortho(-2.0, 2.0, -1.0, 1.0, 1.0, 5.0).expect("ortho");
    let corner = project(&map, Point3::new(2.0, 1.0, -5.0));
    assert!(corner.distance_to(Point3::new(1.0, 1.0, 1.0)) < 1e-12);
    assert!(map.inverse_error() < 1e-12);
}

#[test]
fn frustum_maps_near_and_far_planes() {
    let map = Map4d::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0).expect("frustum");
    assert!(map.has(PERSPECTIVE));
    let near = project(&map, Point3::new(1.0, 1.0, -1.0));
    assert!(near.distance_to(Point3::new(1.0, 1.0, -1.0)) < 1e-12);
    let far = project(&map, Point3::new(-10.0, 10.0, -10.0));
    assert!(far.distance_to(Point3::new(-1.0, 1.0, 1.0)) < 1e-12);
    assert!(map.inverse_error() < 1e-12);
}

#[test]
fn frustum_rejects_zero_near_plane() {
    assert_eq!(
        Map4d::frustum(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0).unwrap_err(),
        MapError::DegenerateFrustum
    );
}

#[test]
fn camera_frustum_back_plane_is_z_zero() {
    let map = Map4d::camera_frustum(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
        4.0,
        0.5,
    )
    .expect("camera frustum");
    assert!(map.has(PERSPECTIVE));
    let back = project(&map, Point3::new(2.0, 2.0, 0.0));
    assert!(back.distance_to(Point3::new(1.0, 1.0, 0.0)) < 1e-12);
    assert!(map.inverse_error() < 1e-10);
}

#[test]
fn skew_frame_rejects_collinear_points() {
    let err = Map4d::skew_frame(
        Point3::ORIGIN,
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
    )
    .unwrap_err();
    assert_eq!(err, MapError::SingularFrame);
}

#[test]
fn multiply_rederives_singular_bit() {
    let a = Map4d::scale(0.0, 1.0, 1.0);
    let b = Map4d::scale(1.0, 2.0, 2.0);
    let table = a.compose(&b);
    let general = a.multiply(&b);
    assert_eq!(table.m0, general.m0);
    assert!(general.has(SINGULAR | SCALE));
    assert!(!general.has(PERSPECTIVE));
}

#[test]
fn multiply_clears_scale_when_factors_cancel() {
    let a = Map4d::scale(2.0, 2.0, 2.0);
    let b = Map4d::scale(0.5, 0.5, 0.5);
    assert!(a.compose(&b).has(SCALE));
    assert!(!a.multiply(&b).has(SCALE));
}

#[test]
fn sandwich_conjugates_by_frame() {
    let rotate = Map4d::rotation_quadrant(Vec3::Z, 1).expect("rotation");
    let shift = Map4d::translation(Vec3::new(1.0, 0.0, 0.0));
    let about_point = Map4d::sandwich(&rotate, Some(&shift), None);
    // Rotation about (-1, 0, 0): the center itself is fixed.
    let fixed = project(&about_point, Point3::new(-1.0, 0.0, 0.0));
    assert!(fixed.distance_to(Point3::new(-1.0, 0.0, 0.0)) < 1e-12);
    assert_eq!(Map4d::sandwich(&rotate, None, None).m0, rotate.m0);
}
