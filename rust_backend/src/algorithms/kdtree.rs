//! A 3-D k-d tree over unit vectors on the celestial sphere.
//!
//! Cone searches on the sphere become ball searches in 3-D: two directions
//! separated by angle θ are `2·sin(θ/2)` apart as unit vectors, so a radius
//! query with that chord length returns exactly the points inside the cone.

/// Balanced k-d tree, built once and queried many times.
///
/// Nodes live in a flat arena; child links are indices into it.
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: Vec<[f64; 3]>,
}

#[derive(Debug, Clone)]
struct KdNode {
    /// Index into the points array
    point_idx: usize,
    left: Option<usize>,
    right: Option<usize>,
    /// Split axis (0 = x, 1 = y, 2 = z)
    split_dim: usize,
}

impl KdTree {
    /// Build a tree using median splits.
    ///
    /// Returns `None` for an empty point set.
    pub fn build(points: &[[f64; 3]]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let points_vec = points.to_vec();
        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());

        Self::build_recursive(&points_vec, &mut indices, 0, &mut nodes);

        Some(Self {
            nodes,
            points: points_vec,
        })
    }

    fn build_recursive(
        points: &[[f64; 3]],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut Vec<KdNode>,
    ) -> Option<usize> {
        if indices.is_empty() {
            return None;
        }

        let split_dim = depth % 3;
        // Ties broken by index so the tree shape does not depend on sort stability
        indices.sort_by(|&a, &b| {
            points[a][split_dim]
                .total_cmp(&points[b][split_dim])
                .then(a.cmp(&b))
        });

        let median = indices.len() / 2;
        let point_idx = indices[median];

        let node_idx = nodes.len();
        nodes.push(KdNode {
            point_idx,
            left: None,
            right: None,
            split_dim,
        });

        let (left_indices, right_part) = indices.split_at_mut(median);
        let right_indices = &mut right_part[1..];

        let left = Self::build_recursive(points, left_indices, depth + 1, nodes);
        let right = Self::build_recursive(points, right_indices, depth + 1, nodes);

        nodes[node_idx].left = left;
        nodes[node_idx].right = right;

        Some(node_idx)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points within `radius` of `query` (inclusive).
    ///
    /// # Returns
    /// `(index, distance_squared)` pairs ordered by distance, then index.
    pub fn radius_search(&self, query: [f64; 3], radius: f64) -> Vec<(usize, f64)> {
        if self.nodes.is_empty() || radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }

        let radius_sq = radius * radius;
        let mut results = Vec::new();
        self.radius_search_recursive(0, query, radius_sq, &mut results);
        results.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        results
    }

    fn radius_search_recursive(
        &self,
        node_idx: usize,
        query: [f64; 3],
        radius_sq: f64,
        results: &mut Vec<(usize, f64)>,
    ) {
        let node = &self.nodes[node_idx];
        let point = self.points[node.point_idx];

        let dist_sq = distance_squared(query, point);
        if dist_sq <= radius_sq {
            results.push((node.point_idx, dist_sq));
        }

        let diff = query[node.split_dim] - point[node.split_dim];
        let diff_sq = diff * diff;

        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near_idx) = near {
            self.radius_search_recursive(near_idx, query, radius_sq, results);
        }
        // The far side can only hold matches if the splitting plane is within range
        if let Some(far_idx) = far {
            if diff_sq <= radius_sq {
                self.radius_search_recursive(far_idx, query, radius_sq, results);
            }
        }
    }
}

#[inline]
fn distance_squared(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}
