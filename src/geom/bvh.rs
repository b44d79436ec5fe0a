//! Range tree over facet boxes.
//!
//! Median-split bounding volume hierarchy used by the polyface closest
//! approach search. Leaves hold facet ordinals (positions in the box slice
//! the tree was built from), not mesh read indices.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::core::{BBox, Point3};

#[derive(Debug, Clone, Copy)]
struct RangeNode {
    bbox: BBox,
    left: u32,
    right: u32,
    start: u32,
    count: u32,
}

impl RangeNode {
    const fn leaf(bbox: BBox, start: u32, count: u32) -> Self {
        Self {
            bbox,
            left: u32::MAX,
            right: u32::MAX,
            start,
            count,
        }
    }

    const fn inner(bbox: BBox, left: u32, right: u32) -> Self {
        Self {
            bbox,
            left,
            right,
            start: 0,
            count: 0,
        }
    }

    const fn is_leaf(self) -> bool {
        self.count != 0
    }
}

/// Counters from a [`FacetRangeTree::search_pairs`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairSearchStats {
    /// Facet pairs handed to the pair test.
    pub pairs_tested: usize,
    /// Node or facet pairs skipped because their boxes were beyond the bound.
    pub pairs_pruned: usize,
}

#[derive(Debug, Clone)]
pub struct FacetRangeTree {
    nodes: Vec<RangeNode>,
    boxes: Vec<BBox>,
    order: Vec<u32>,
}

impl FacetRangeTree {
    pub const DEFAULT_LEAF_SIZE: usize = 4;

    /// Builds a tree over `boxes`; `None` when there are none.
    #[must_use]
    pub fn build(boxes: &[BBox]) -> Option<Self> {
        Self::build_with_leaf_size(boxes, Self::DEFAULT_LEAF_SIZE)
    }

    #[must_use]
    pub fn build_with_leaf_size(boxes: &[BBox], leaf_size: usize) -> Option<Self> {
        if boxes.is_empty() {
            return None;
        }
        let leaf_size = leaf_size.clamp(1, 256);
        let mut tree = Self {
            nodes: Vec::with_capacity(boxes.len().saturating_mul(2)),
            boxes: boxes.to_vec(),
            order: (0..boxes.len() as u32).collect(),
        };
        tree.build_node(0, boxes.len(), leaf_size);
        Some(tree)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Box enclosing every facet.
    #[must_use]
    pub fn root_box(&self) -> BBox {
        self.nodes[0].bbox
    }

    fn build_node(&mut self, start: usize, end: usize, leaf_size: usize) -> u32 {
        let node_index = self.nodes.len() as u32;
        let bbox = self.range_box(start, end);
        self.nodes.push(RangeNode::leaf(bbox, 0, 0));
        let count = end - start;

        if count <= leaf_size {
            self.nodes[node_index as usize] = RangeNode::leaf(bbox, start as u32, count as u32);
            return node_index;
        }

        let axis = self.split_axis(start, end);
        let mid = start + count / 2;
        let boxes = &self.boxes;
        self.order[start..end].select_nth_unstable_by(mid - start, |a, b| {
            let ca = boxes[*a as usize].center().component(axis);
            let cb = boxes[*b as usize].center().component(axis);
            ca.total_cmp(&cb)
        });

        let left = self.build_node(start, mid, leaf_size);
        let right = self.build_node(mid, end, leaf_size);
        self.nodes[node_index as usize] = RangeNode::inner(bbox, left, right);
        node_index
    }

    fn range_box(&self, start: usize, end: usize) -> BBox {
        self.order[start + 1..end]
            .iter()
            .fold(self.boxes[self.order[start] as usize], |acc, &i| {
                acc.union(self.boxes[i as usize])
            })
    }

    fn split_axis(&self, start: usize, end: usize) -> usize {
        let first = BBox::from_point(self.boxes[self.order[start] as usize].center());
        let spread = self.order[start + 1..end]
            .iter()
            .fold(first, |acc, &i| acc.expand_point(self.boxes[i as usize].center()))
            .size();
        if spread.x >= spread.y && spread.x >= spread.z {
            0
        } else if spread.y >= spread.z {
            1
        } else {
            2
        }
    }

    fn leaf_facets(&self, node: RangeNode) -> &[u32] {
        let start = node.start as usize;
        &self.order[start..start + node.count as usize]
    }

    /// Dual-tree traversal over facet pairs `(a in self, b in other)`.
    ///
    /// A node pair is visited only while its box separation is at most the
    /// current bound. `test(a, b)` returns the pair's distance when it has
    /// one; smaller distances shrink the bound for the rest of the search.
    pub fn search_pairs<F>(&self, other: &Self, mut bound: f64, mut test: F) -> PairSearchStats
    where
        F: FnMut(usize, usize) -> Option<f64>,
    {
        let mut stats = PairSearchStats::default();
        if self.nodes.is_empty() || other.nodes.is_empty() {
            return stats;
        }

        let mut stack = vec![(0u32, 0u32)];
        while let Some((ia, ib)) = stack.pop() {
            let node_a = self.nodes[ia as usize];
            let node_b = other.nodes[ib as usize];
            if node_a.bbox.distance_to_bbox(node_b.bbox) > bound {
                stats.pairs_pruned += 1;
                continue;
            }

            if node_a.is_leaf() && node_b.is_leaf() {
                for &a in self.leaf_facets(node_a) {
                    for &b in other.leaf_facets(node_b) {
                        let (a, b) = (a as usize, b as usize);
                        if self.boxes[a].distance_to_bbox(other.boxes[b]) > bound {
                            stats.pairs_pruned += 1;
                            continue;
                        }
                        stats.pairs_tested += 1;
                        if let Some(d) = test(a, b) {
                            bound = bound.min(d);
                        }
                    }
                }
                continue;
            }

            let split_a = !node_a.is_leaf()
                && (node_b.is_leaf() || node_a.bbox.diagonal() >= node_b.bbox.diagonal());
            let mut children = if split_a {
                [(node_a.left, ib), (node_a.right, ib)]
            } else {
                [(ia, node_b.left), (ia, node_b.right)]
            };
            let distance = |pair: &(u32, u32)| {
                self.nodes[pair.0 as usize]
                    .bbox
                    .distance_to_bbox(other.nodes[pair.1 as usize].bbox)
            };
            // Nearer pair on top of the stack.
            if distance(&children[0]) < distance(&children[1]) {
                children.swap(0, 1);
            }
            stack.extend(children);
        }
        stats
    }

    /// Best-first search for the facet nearest `point`.
    ///
    /// `distance_to_facet` returns the squared distance to a facet; facets
    /// farther than `max_distance` are ignored. Returns the facet ordinal and
    /// its squared distance.
    pub fn nearest<F>(&self, point: Point3, max_distance: f64, mut distance_to_facet: F) -> Option<(usize, f64)>
    where
        F: FnMut(usize) -> Option<f64>,
    {
        if self.nodes.is_empty() {
            return None;
        }

        let mut best_dist2 = max_distance * max_distance;
        let mut best: Option<usize> = None;
        let mut heap = BinaryHeap::new();
        heap.push(HeapEntry {
            dist2: self.nodes[0].bbox.distance_squared_to_point(point),
            node: 0,
        });

        while let Some(entry) = heap.pop() {
            if entry.dist2 > best_dist2 {
                break;
            }
            let node = self.nodes[entry.node as usize];
            if node.is_leaf() {
                for &facet in self.leaf_facets(node) {
                    let facet = facet as usize;
                    let Some(d2) = distance_to_facet(facet) else {
                        continue;
                    };
                    if d2.is_finite() && d2 <= best_dist2 {
                        best_dist2 = d2;
                        best = Some(facet);
                    }
                }
                continue;
            }
            for child in [node.left, node.right] {
                let d2 = self.nodes[child as usize].bbox.distance_squared_to_point(point);
                if d2 <= best_dist2 {
                    heap.push(HeapEntry { dist2: d2, node: child });
                }
            }
        }
        best.map(|facet| (facet, best_dist2))
    }
}

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    dist2: f64,
    node: u32,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist2 == other.dist2 && self.node == other.node
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on dist2.
        other
            .dist2
            .total_cmp(&self.dist2)
            .then_with(|| self.node.cmp(&other.node))
    }
}
