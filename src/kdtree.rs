//! 2D KD-tree over points with snap-tolerance deduplication.
//!
//! The splitting axis alternates with depth: x at even depths (the root), y at odd
//! depths. Points closer than the tree's tolerance to an existing node are merged into
//! it, bumping its count instead of growing the tree. The tree never freezes; nodes
//! are only ever added.
//!
//! Nodes live in a single arena vector and refer to their children by index.

use tracing::trace;

use crate::envelope::{Coord, Envelope};
use crate::error::{IndexError, Result};

type NodeId = usize;

/// A point stored in a [`SnapKdTree`].
#[derive(Debug)]
pub struct KdNode<T> {
    coord: Coord,
    data: Option<T>,
    count: usize,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl<T> KdNode<T> {
    fn new(coord: Coord, data: Option<T>) -> Self {
        Self { coord, data, count: 1, left: None, right: None }
    }

    /// Location of the node (the first point inserted there).
    pub fn coord(&self) -> Coord {
        self.coord
    }

    /// X ordinate.
    pub fn x(&self) -> f64 {
        self.coord.x
    }

    /// Y ordinate.
    pub fn y(&self) -> f64 {
        self.coord.y
    }

    /// Payload given by the first insertion at this location, if any.
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// How many inserted points snapped to this node (at least one).
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether more than one point snapped to this node.
    pub fn is_repeated(&self) -> bool {
        self.count > 1
    }

    #[inline]
    fn split_value(&self, depth: usize) -> f64 {
        if depth % 2 == 0 { self.coord.x } else { self.coord.y }
    }

    /// Whether `p` descends to the left of this node at `depth`.
    #[inline]
    fn is_point_on_left(&self, depth: usize, p: &Coord) -> bool {
        let ordinate = if depth % 2 == 0 { p.x } else { p.y };
        ordinate < self.split_value(depth)
    }

    /// Whether `env` reaches into the left subtree at `depth`.
    #[inline]
    fn is_range_over_left(&self, depth: usize, env: &Envelope) -> bool {
        let env_min = if depth % 2 == 0 { env.min_x } else { env.min_y };
        env_min < self.split_value(depth)
    }

    /// Whether `env` reaches into the right subtree at `depth`.
    #[inline]
    fn is_range_over_right(&self, depth: usize, env: &Envelope) -> bool {
        let env_max = if depth % 2 == 0 { env.max_x } else { env.max_y };
        self.split_value(depth) <= env_max
    }
}

/// A KD-tree of 2D points that snaps near-duplicates together.
///
/// With the default tolerance of `0.0` only exactly coincident points merge.
///
/// # Example
/// ```
/// use spindex::{Coord, Envelope, SnapKdTree};
///
/// let mut tree = SnapKdTree::with_tolerance(0.5).unwrap();
/// tree.insert(Coord::new(1.0, 1.0), Some("first"));
/// let node = tree.insert(Coord::new(1.2, 1.1), Some("second"));
/// assert_eq!(node.count(), 2);
/// assert_eq!(node.data(), Some(&"first"));
///
/// let search = Envelope::new(0.0, 0.0, 2.0, 2.0).unwrap();
/// assert_eq!(tree.query(&search).len(), 1);
/// ```
#[derive(Debug)]
pub struct SnapKdTree<T> {
    nodes: Vec<KdNode<T>>,
    root: Option<NodeId>,
    tolerance: f64,
    tolerance_sq: f64,
}

impl<T> SnapKdTree<T> {
    /// Creates an empty tree that merges only exactly coincident points.
    pub fn new() -> Self {
        Self { nodes: Vec::new(), root: None, tolerance: 0.0, tolerance_sq: 0.0 }
    }

    /// Creates an empty tree with the given snap tolerance.
    ///
    /// # Errors
    /// [`IndexError::InvalidTolerance`] if `tolerance` is negative, NaN or infinite.
    pub fn with_tolerance(tolerance: f64) -> Result<Self> {
        if !(tolerance >= 0.0) || !tolerance.is_finite() {
            return Err(IndexError::InvalidTolerance(tolerance));
        }
        Ok(Self {
            nodes: Vec::new(),
            root: None,
            tolerance,
            tolerance_sq: tolerance * tolerance,
        })
    }

    /// Snap tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Whether no point has been inserted.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of distinct nodes (snapped points are not counted twice).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Inserts a point carrying no payload. See [`insert`](Self::insert).
    pub fn insert_point(&mut self, p: Coord) -> &KdNode<T> {
        self.insert(p, None)
    }

    /// Inserts `p`, returning the node it now belongs to.
    ///
    /// If a node already lies within the tolerance of `p`, that node's count is
    /// incremented and `data` is dropped: the first payload at a location wins.
    pub fn insert(&mut self, p: Coord, data: Option<T>) -> &KdNode<T> {
        let id = self.insert_index(p, data);
        &self.nodes[id]
    }

    fn insert_index(&mut self, p: Coord, data: Option<T>) -> NodeId {
        let Some(root) = self.root else {
            self.nodes.push(KdNode::new(p, data));
            self.root = Some(0);
            return 0;
        };

        if self.tolerance > 0.0 {
            if let Some(id) = self.best_match(&p) {
                self.snap(id, &p);
                return id;
            }
        }

        let mut current = Some(root);
        let mut parent = root;
        let mut go_left = true;
        let mut depth = 0;
        while let Some(id) = current {
            let node = &self.nodes[id];
            // checked before choosing a side so a near-duplicate is never missed here
            if p.distance_sq(&node.coord) <= self.tolerance_sq {
                self.snap(id, &p);
                return id;
            }
            go_left = node.is_point_on_left(depth, &p);
            parent = id;
            current = if go_left { node.left } else { node.right };
            depth += 1;
        }

        let id = self.nodes.len();
        self.nodes.push(KdNode::new(p, data));
        let parent = &mut self.nodes[parent];
        if go_left {
            parent.left = Some(id);
        } else {
            parent.right = Some(id);
        }
        id
    }

    fn snap(&mut self, id: NodeId, p: &Coord) {
        let node = &mut self.nodes[id];
        node.count += 1;
        trace!(x = p.x, y = p.y, count = node.count, "point snapped onto existing kd node");
    }

    /// Closest node within tolerance of `p`; ties go to the lesser coordinate.
    fn best_match(&self, p: &Coord) -> Option<NodeId> {
        let search = Envelope::from_point(p.x, p.y).expand_by(self.tolerance);
        let mut best: Option<(NodeId, f64)> = None;
        self.visit(&search, |id| {
            let candidate = &self.nodes[id];
            // squared, like the descent check, so both agree on the boundary
            let dist = p.distance_sq(&candidate.coord);
            if dist > self.tolerance_sq {
                return;
            }
            let better = match best {
                None => true,
                Some((best_id, best_dist)) => {
                    dist < best_dist
                        || (dist == best_dist
                            && candidate.coord.compare(&self.nodes[best_id].coord).is_le())
                }
            };
            if better {
                best = Some((id, dist));
            }
        });
        best.map(|(id, _)| id)
    }

    /// Range search reporting node ids, driven by an explicit stack.
    fn visit<F>(&self, search: &Envelope, mut visitor: F)
    where
        F: FnMut(NodeId),
    {
        let Some(root) = self.root else {
            return;
        };
        let mut stack = vec![(root, 0_usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = &self.nodes[id];
            if search.contains_coord(&node.coord) {
                visitor(id);
            }
            if let Some(right) = node.right {
                if node.is_range_over_right(depth, search) {
                    stack.push((right, depth + 1));
                }
            }
            if let Some(left) = node.left {
                if node.is_range_over_left(depth, search) {
                    stack.push((left, depth + 1));
                }
            }
        }
    }

    /// Calls `visitor` for every node whose point lies inside `search` (closed).
    ///
    /// An inverted or NaN `search` matches nothing.
    pub fn query_with<'a, F>(&'a self, search: &Envelope, mut visitor: F)
    where
        F: FnMut(&'a KdNode<T>),
    {
        if !search.is_valid() {
            return;
        }
        let nodes = &self.nodes;
        self.visit(search, |id| visitor(&nodes[id]));
    }

    /// Collects every node whose point lies inside `search` (closed).
    pub fn query(&self, search: &Envelope) -> Vec<&KdNode<T>> {
        let mut results = Vec::new();
        self.query_with(search, |node| results.push(node));
        results
    }

    /// Finds the node located exactly at `p`, if any.
    pub fn find(&self, p: Coord) -> Option<&KdNode<T>> {
        let mut current = self.root;
        let mut depth = 0;
        while let Some(id) = current {
            let node = &self.nodes[id];
            if node.coord == p {
                return Some(node);
            }
            current = if node.is_point_on_left(depth, &p) { node.left } else { node.right };
            depth += 1;
        }
        None
    }

    /// All nodes, in-order (left subtree, node, right subtree).
    pub fn nodes(&self) -> Vec<&KdNode<T>> {
        let mut list = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut current = self.root;
        loop {
            if let Some(id) = current {
                stack.push(id);
                current = self.nodes[id].left;
            } else if let Some(id) = stack.pop() {
                let node = &self.nodes[id];
                list.push(node);
                current = node.right;
            } else {
                break;
            }
        }
        list
    }

    /// Number of nodes on the longest root-to-leaf path; zero for an empty tree.
    pub fn depth(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut deepest = 0;
        let mut stack = vec![(root, 1_usize)];
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            let node = &self.nodes[id];
            let children = node.left.iter().chain(node.right.iter());
            stack.extend(children.map(|&child| (child, level + 1)));
        }
        deepest
    }

    /// Coordinates of `nodes`, each repeated `count` times when `include_repeated`.
    pub fn to_coords(nodes: &[&KdNode<T>], include_repeated: bool) -> Vec<Coord> {
        let mut coords = Vec::with_capacity(nodes.len());
        for node in nodes {
            let times = if include_repeated { node.count } else { 1 };
            coords.extend(std::iter::repeat_n(node.coord, times));
        }
        coords
    }
}

impl<T> Default for SnapKdTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_alternates_with_depth() {
        let mut tree: SnapKdTree<()> = SnapKdTree::new();
        tree.insert_point(Coord::new(5.0, 5.0));
        // root splits on x: 1 < 5 goes left
        tree.insert_point(Coord::new(1.0, 9.0));
        // depth 1 splits on y: 2 < 9 goes left of (1, 9)
        tree.insert_point(Coord::new(0.0, 2.0));
        let root = &tree.nodes[0];
        let left = root.left.unwrap();
        assert_eq!(tree.nodes[left].coord, Coord::new(1.0, 9.0));
        assert!(root.right.is_none());
        let grandchild = tree.nodes[left].left.unwrap();
        assert_eq!(tree.nodes[grandchild].coord, Coord::new(0.0, 2.0));
    }

    #[test]
    fn test_equal_split_value_goes_right() {
        let mut tree: SnapKdTree<()> = SnapKdTree::new();
        tree.insert_point(Coord::new(5.0, 5.0));
        tree.insert_point(Coord::new(5.0, 1.0));
        assert!(tree.nodes[0].left.is_none());
        assert_eq!(tree.nodes[0].right, Some(1));
    }

    #[test]
    fn test_best_match_prefers_closest() {
        let mut tree: SnapKdTree<()> = SnapKdTree::with_tolerance(1.0).unwrap();
        tree.insert_point(Coord::new(0.0, 0.0));
        tree.insert_point(Coord::new(3.0, 0.0));
        assert_eq!(tree.best_match(&Coord::new(2.5, 0.0)), Some(1));
        // 1.5 away from both
        assert_eq!(tree.best_match(&Coord::new(1.5, 0.0)), None);
    }

    #[test]
    fn test_best_match_agrees_with_descent_on_boundary() {
        let tolerance = 0.3;
        let mut tree: SnapKdTree<()> = SnapKdTree::with_tolerance(tolerance).unwrap();
        tree.insert_point(Coord::new(0.0, 0.0));
        let origin = Coord::new(0.0, 0.0);
        for step in 0..720_i32 {
            let angle = f64::from(step).to_radians() / 2.0;
            let p = Coord::new(tolerance * angle.cos(), tolerance * angle.sin());
            let within = p.distance_sq(&origin) <= tree.tolerance_sq;
            assert_eq!(tree.best_match(&p).is_some(), within, "disagreement at {p:?}");
        }
    }

    #[test]
    fn test_best_match_tie_prefers_lesser_coordinate() {
        let mut tree: SnapKdTree<()> = SnapKdTree::with_tolerance(1.0).unwrap();
        tree.insert_point(Coord::new(2.0, 0.0));
        tree.insert_point(Coord::new(0.0, 0.0));
        assert_eq!(tree.best_match(&Coord::new(1.0, 0.0)), Some(1));
    }
}
