use crate::geom::{BBox, FacetRangeTree, Point3};

fn unit_box_at(x: f64, y: f64, z: f64) -> BBox {
    BBox::new(Point3::new(x, y, z), Point3::new(x + 1.0, y + 1.0, z + 1.0))
}

fn box_row(count: usize, spacing: f64, z: f64) -> Vec<BBox> {
    (0..count).map(|i| unit_box_at(i as f64 * spacing, 0.0, z)).collect()
}

#[test]
fn build_covers_every_box() {
    assert!(FacetRangeTree::build(&[]).is_none());

    let boxes = box_row(9, 2.0, 0.0);
    let tree = FacetRangeTree::build_with_leaf_size(&boxes, 2).expect("tree build");
    assert_eq!(tree.len(), 9);
    assert!(!tree.is_empty());
    let root = tree.root_box();
    assert_eq!(root.min, Point3::new(0.0, 0.0, 0.0));
    assert_eq!(root.max, Point3::new(17.0, 1.0, 1.0));
}

#[test]
fn nearest_finds_closest_box() {
    let boxes = vec![
        unit_box_at(10.0, 0.0, 0.0),
        unit_box_at(1.0, 0.0, 0.0),
        unit_box_at(-5.0, 0.0, 0.0),
    ];
    let tree = FacetRangeTree::build_with_leaf_size(&boxes, 1).expect("tree build");
    let point = Point3::new(0.0, 0.5, 0.5);

    let (index, dist2) = tree
        .nearest(point, f64::INFINITY, |i| Some(boxes[i].distance_squared_to_point(point)))
        .expect("nearest hit");
    assert_eq!(index, 1);
    assert!((dist2 - 1.0).abs() < 1e-12);

    let bounded = tree.nearest(point, 0.5, |i| Some(boxes[i].distance_squared_to_point(point)));
    assert!(bounded.is_none());
}

#[test]
fn nearest_skips_facets_without_distance() {
    let boxes = box_row(4, 3.0, 0.0);
    let tree = FacetRangeTree::build(&boxes).expect("tree build");
    let point = Point3::new(-1.0, 0.5, 0.5);
    let (index, _) = tree
        .nearest(point, f64::INFINITY, |i| {
            (i != 0).then(|| boxes[i].distance_squared_to_point(point))
        })
        .expect("nearest hit");
    assert_eq!(index, 1);
}

#[test]
fn search_pairs_matches_brute_force_minimum() {
    let lower = box_row(12, 1.5, 0.0);
    let upper: Vec<BBox> = (0..12)
        .map(|i| unit_box_at(i as f64 * 1.5 + 0.7, 0.3, 3.0 + 0.1 * i as f64))
        .collect();
    let tree_a = FacetRangeTree::build_with_leaf_size(&lower, 2).expect("tree a");
    let tree_b = FacetRangeTree::build_with_leaf_size(&upper, 2).expect("tree b");

    let brute = lower
        .iter()
        .flat_map(|a| upper.iter().map(move |b| a.distance_to_bbox(*b)))
        .fold(f64::INFINITY, f64::min);

    let mut best = f64::INFINITY;
    let stats = tree_a.search_pairs(&tree_b, f64::INFINITY, |a, b| {
        let d = lower[a].distance_to_bbox(upper[b]);
        best = best.min(d);
        Some(d)
    });
    assert!((best - brute).abs() < 1e-12);
    assert!((best - 2.0).abs() < 1e-12);
    assert!(stats.pairs_pruned > 0);
    assert!(stats.pairs_tested < lower.len() * upper.len());
}

#[test]
fn search_pairs_respects_initial_bound() {
    let lower = box_row(3, 2.0, 0.0);
    let upper = box_row(3, 2.0, 5.0);
    let tree_a = FacetRangeTree::build(&lower).expect("tree a");
    let tree_b = FacetRangeTree::build(&upper).expect("tree b");

    let mut calls = 0;
    let stats = tree_a.search_pairs(&tree_b, 1.0, |_, _| {
        calls += 1;
        None
    });
    assert_eq!(calls, 0);
    assert_eq!(stats.pairs_tested, 0);
    assert!(stats.pairs_pruned >= 1);
}
