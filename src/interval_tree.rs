//! Static 1D interval tree built by pairwise merging of sorted leaves.
//!
//! Leaves are sorted by interval midpoint, then each level is merged two by two into
//! branches whose interval is the union of their children. An odd node at the end of
//! a level is carried up unchanged. The result is a balanced binary tree whose
//! branch intervals let a query prune whole subtrees.

use std::time::Instant;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{IndexError, Result};

/// Tree node: a leaf holding one item, or a branch over exactly two children.
#[derive(Debug)]
enum IntervalNode<T> {
    Leaf {
        min: f64,
        max: f64,
        item: T,
    },
    Branch {
        min: f64,
        max: f64,
        children: Box<[IntervalNode<T>; 2]>,
    },
}

impl<T> IntervalNode<T> {
    fn branch(left: Self, right: Self) -> Self {
        Self::Branch {
            min: left.min().min(right.min()),
            max: left.max().max(right.max()),
            children: Box::new([left, right]),
        }
    }

    #[inline]
    fn min(&self) -> f64 {
        match self {
            Self::Leaf { min, .. } | Self::Branch { min, .. } => *min,
        }
    }

    #[inline]
    fn max(&self) -> f64 {
        match self {
            Self::Leaf { max, .. } | Self::Branch { max, .. } => *max,
        }
    }

    #[inline]
    fn midpoint(&self) -> f64 {
        (self.min() + self.max()) / 2.0
    }

    #[inline]
    fn overlaps(&self, query_min: f64, query_max: f64) -> bool {
        !(self.max() < query_min || self.min() > query_max)
    }

    fn query<'a, F>(&'a self, query_min: f64, query_max: f64, visitor: &mut F)
    where
        F: FnMut(&'a T),
    {
        if !self.overlaps(query_min, query_max) {
            return;
        }
        match self {
            Self::Leaf { item, .. } => visitor(item),
            Self::Branch { children, .. } => {
                children[0].query(query_min, query_max, visitor);
                children[1].query(query_min, query_max, visitor);
            }
        }
    }
}

fn merge_levels<T>(mut leaves: Vec<IntervalNode<T>>) -> Option<IntervalNode<T>> {
    // stable, so equal midpoints keep insertion order
    leaves.sort_by(|a, b| a.midpoint().total_cmp(&b.midpoint()));

    let mut level = leaves;
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        let mut nodes = level.into_iter();
        while let Some(left) = nodes.next() {
            match nodes.next() {
                Some(right) => next.push(IntervalNode::branch(left, right)),
                None => next.push(left),
            }
        }
        level = next;
    }
    level.pop()
}

/// A static interval tree over closed intervals `[min, max]`.
///
/// Intervals are inserted first; the tree is built once by the first query (or by
/// [`build`](Self::build)) and is read-only afterwards.
///
/// # Example
/// ```
/// use spindex::IntervalTree;
///
/// let mut tree = IntervalTree::new();
/// tree.insert(0.0, 10.0, 'A').unwrap();
/// tree.insert(20.0, 30.0, 'B').unwrap();
/// tree.insert(5.0, 25.0, 'C').unwrap();
///
/// let mut found = tree.query(9.0, 11.0);
/// found.sort();
/// assert_eq!(found, vec![&'A', &'C']);
/// ```
#[derive(Debug)]
pub struct IntervalTree<T> {
    leaves: Mutex<Vec<IntervalNode<T>>>,
    root: OnceCell<Option<IntervalNode<T>>>,
    num_items: usize,
}

impl<T> IntervalTree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tree with room for `capacity` intervals.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            leaves: Mutex::new(Vec::with_capacity(capacity)),
            root: OnceCell::new(),
            num_items: 0,
        }
    }

    /// Adds `item` under the closed interval `[min, max]`.
    ///
    /// A degenerate interval (`min == max`) stands for a single value.
    ///
    /// # Errors
    /// [`IndexError::UseAfterFreeze`] once the tree has been built, and
    /// [`IndexError::InvalidInterval`] if `min > max` or either bound is NaN.
    pub fn insert(&mut self, min: f64, max: f64, item: T) -> Result<()> {
        if self.root.get().is_some() {
            warn!(items = self.num_items, "insert into a built interval tree refused");
            return Err(IndexError::UseAfterFreeze);
        }
        if !(min <= max) {
            return Err(IndexError::InvalidInterval { min, max });
        }
        self.leaves.get_mut().push(IntervalNode::Leaf { min, max, item });
        self.num_items += 1;
        Ok(())
    }

    /// Builds the tree. Idempotent; queries call it implicitly.
    pub fn build(&self) {
        let _ = self.root();
    }

    fn root(&self) -> Option<&IntervalNode<T>> {
        self.root
            .get_or_init(|| {
                let start = Instant::now();
                let leaves = std::mem::take(&mut *self.leaves.lock());
                let count = leaves.len();
                let root = merge_levels(leaves);
                debug!(items = count, elapsed = ?start.elapsed(), "built interval tree");
                root
            })
            .as_ref()
    }

    /// Whether the tree has been built (and is therefore frozen).
    pub fn is_built(&self) -> bool {
        self.root.get().is_some()
    }

    /// Number of intervals.
    pub fn len(&self) -> usize {
        self.num_items
    }

    /// Whether no interval has been inserted.
    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    /// Calls `visitor` for every item whose interval overlaps `[min, max]`.
    ///
    /// Overlap is closed: touching endpoints count. An inverted query (`min > max`)
    /// matches nothing. Visiting order is unspecified.
    pub fn query_with<'a, F>(&'a self, min: f64, max: f64, mut visitor: F)
    where
        F: FnMut(&'a T),
    {
        let Some(root) = self.root() else {
            return;
        };
        if !(min <= max) {
            return;
        }
        root.query(min, max, &mut visitor);
    }

    /// Collects every item whose interval overlaps `[min, max]`.
    pub fn query(&self, min: f64, max: f64) -> Vec<&T> {
        let mut results = Vec::new();
        self.query_with(min, max, |item| results.push(item));
        results
    }
}

impl<T> Default for IntervalTree<T> {
    fn default() -> Self {
        Self::new()
    }
}
