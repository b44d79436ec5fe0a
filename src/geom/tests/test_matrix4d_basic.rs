use crate::geom::{Matrix4d, Point3, Point4, Vec3};

fn sample_matrix() -> Matrix4d {
    Matrix4d::from_rows([
        [4.0, 1.0, -2.0, 3.0],
        [0.5, 3.0, 1.0, -1.0],
        [2.0, -1.0, 5.0, 0.25],
        [0.1, 0.2, -0.3, 2.0],
    ])
}

fn is_upper_triangular(m: &Matrix4d, tol: f64) -> bool {
    (0..4).all(|i| (0..i).all(|j| m.coff[i][j].abs() < tol))
}

#[test]
fn factor_qr_reproduces_matrix() {
    let a = sample_matrix();
    let (q, r) = a.factor_qr().expect("full rank matrix factors");
    assert!(is_upper_triangular(&r, 1e-12));
    assert!((q * r).max_abs_diff(&a) < 1e-12);
    let qtq = q.transpose() * q;
    assert!(qtq.max_abs_diff(&Matrix4d::identity()) < 1e-12);
}

#[test]
fn factor_qr_rejects_zero_matrix() {
    assert!(Matrix4d::zero().factor_qr().is_none());
    assert!(Matrix4d::zero().invert_qr().is_none());
}

#[test]
fn invert_qr_of_affine_matrix() {
    let linear = [[2.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 0.5]];
    let m = Matrix4d::from_affine(linear, Vec3::new(1.0, -2.0, 3.0));
    let inv = m.invert_qr().expect("invertible");
    assert!((m * inv).max_abs_diff(&Matrix4d::identity()) < 1e-12);
    let p = inv.multiply_xyzw(Point3::new(3.0, 2.0, 3.5), 1.0);
    assert!(p.max_abs_diff(Point4::new(1.0, 1.0, 1.0, 1.0)) < 1e-12);
}

#[test]
fn zero_column_stops_factorization() {
    let mut m = sample_matrix();
    for row in &mut m.coff {
        row[0] = 0.0;
    }
    assert!(m.factor_qr().is_none());
    assert!(m.invert_qr().is_none());
}

#[test]
fn symmetric_eigenvectors_diagonalize() {
    let a = Matrix4d::from_rows([
        [4.0, 1.0, 0.5, 0.0],
        [1.0, 3.0, 0.0, 0.2],
        [0.5, 0.0, 2.0, 0.1],
        [0.0, 0.2, 0.1, 1.0],
    ]);
    let (q, d) = a.symmetric_eigenvectors();
    let mut diag = Matrix4d::zero();
    for k in 0..4 {
        diag.coff[k][k] = d.component(k);
    }
    let rebuilt = q * diag * q.transpose();
    assert!(rebuilt.max_abs_diff(&a) < 1e-10);
    let trace: f64 = (0..4).map(|k| d.component(k)).sum();
    assert!((trace - 10.0).abs() < 1e-10);
}

#[test]
fn null_vector_of_singular_upper_triangle() {
    let r = Matrix4d::from_rows([
        [1.0, 2.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);
    let (x, residual) = r
        .approximate_null_vector_for_upper_triangle()
        .expect("null vector");
    assert!(residual.abs() < 1e-12);
    assert!((x.y - 1.0).abs() < 1e-12);
    let image = r.multiply_point4(x);
    assert!(image.max_abs_diff(Point4::ZERO) < 1e-12);
}

#[test]
fn image_grid_uses_row_major_index() {
    let m = Matrix4d::translation(Vec3::new(10.0, 20.0, 0.0));
    let grid = m.evaluate_image_grid(1.0, 2.0, 3, 2, 0.0).expect("affine grid");
    assert_eq!(grid.len(), 6);
    // index j * m + i
    let p = grid[3 + 2];
    assert!((p.x - 13.0).abs() < 1e-12);
    assert!((p.y - 23.0).abs() < 1e-12);
}

#[test]
fn image_grid_divides_by_weight() {
    let mut m = Matrix4d::identity();
    m.coff[3] = [0.5, 0.0, 0.0, 1.0];
    let grid = m.evaluate_image_grid(0.0, 0.0, 3, 1, 0.0).expect("positive weights");
    // (2, 0, 0, 1) maps to w = 2
    assert!((grid[2].x - 1.0).abs() < 1e-12);
}

#[test]
fn image_grid_fails_on_vanishing_weight() {
    let mut m = Matrix4d::identity();
    m.coff[3] = [-0.5, 0.0, 0.0, 1.0];
    assert!(m.evaluate_image_grid(0.0, 0.0, 3, 1, 0.0).is_none());
}

#[test]
fn point_masses_give_principal_moments() {
    let mut products = Matrix4d::zero();
    products.add_symmetric_scaled_outer_product(Point3::new(1.0, 0.0, 0.0), 1.0);
    products.add_symmetric_scaled_outer_product(Point3::new(-1.0, 0.0, 0.0), 1.0);
    let moments = products
        .convert_inertia_products_to_principal_moments()
        .expect("nonzero mass");
    assert!((moments.volume - 2.0).abs() < 1e-12);
    assert!(moments.centroid.distance_to(Point3::ORIGIN) < 1e-12);
    let mut values = [moments.moments.x, moments.moments.y, moments.moments.z];
    values.sort_by(f64::total_cmp);
    assert!(values[0].abs() < 1e-12);
    assert!((values[1] - 2.0).abs() < 1e-12);
    assert!((values[2] - 2.0).abs() < 1e-12);
}

#[test]
fn principal_moments_in_translated_frame_shift_centroid() {
    let mut products = Matrix4d::zero();
    products.add_symmetric_scaled_outer_product(Point3::new(1.0, 0.0, 0.0), 1.0);
    products.add_symmetric_scaled_outer_product(Point3::new(-1.0, 0.0, 0.0), 1.0);
    let frame = Matrix4d::translation(Vec3::new(0.0, 5.0, 0.0));
    let moments = products
        .convert_inertia_products_to_principal_moments_in(&frame)
        .expect("nonzero mass");
    assert!(moments.centroid.distance_to(Point3::new(0.0, 5.0, 0.0)) < 1e-12);
}

#[test]
fn zero_mass_has_no_principal_moments() {
    assert!(Matrix4d::zero().convert_inertia_products_to_principal_moments().is_none());
}
