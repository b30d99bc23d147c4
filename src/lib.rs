//! # spindex - static spatial indexes
//!
//! Three in-memory indexes for geometry processing:
//!
//! - [`IntervalTree`]: closed 1D intervals, built once by pairwise merging of
//!   midpoint-sorted leaves.
//! - [`HilbertRTree`]: 2D envelopes, packed once along a Hilbert curve into flat
//!   per-layer bound arrays.
//! - [`SnapKdTree`]: 2D points in a KD-tree that merges points closer than a snap
//!   tolerance into a single counted node.
//!
//! The interval tree and the R-tree are build-once: items are inserted first, the
//! first query (or an explicit `build()`) freezes them, and later inserts fail with
//! [`IndexError::UseAfterFreeze`]. Building is guarded so concurrent first queries
//! through a shared reference pack the tree exactly once. The KD-tree grows
//! incrementally and is never frozen.
//!
//! ## Quick Start
//!
//! ```rust
//! use spindex::prelude::*;
//!
//! let mut boxes = HilbertRTree::new();
//! boxes.add(0.0, 0.0, 2.0, 2.0, 0).unwrap();
//! boxes.add(1.0, 1.0, 3.0, 3.0, 1).unwrap();
//! boxes.add(5.0, 5.0, 6.0, 6.0, 2).unwrap();
//!
//! let search = Envelope::new(1.2, 1.2, 2.8, 2.8).unwrap();
//! let mut hits = boxes.query(&search);
//! hits.sort();
//! assert_eq!(hits, vec![&0, &1]);
//!
//! // the tree is frozen now
//! assert_eq!(boxes.add(7.0, 7.0, 8.0, 8.0, 3), Err(IndexError::UseAfterFreeze));
//!
//! let mut points: SnapKdTree<()> = SnapKdTree::with_tolerance(0.1).unwrap();
//! points.insert_point(Coord::new(1.0, 1.0));
//! let node = points.insert_point(Coord::new(1.05, 1.0));
//! assert_eq!(node.count(), 2);
//! ```
//!
//! ## How It Works
//!
//! The R-tree sorts items by the Hilbert index of their envelope midpoints, so items
//! that are close in the plane end up close in the item array. Consecutive blocks of
//! `node_capacity` items form the leaf layer; blocks of leaf nodes form the next layer,
//! and so on. Queries walk the layers top-down and test item envelopes exactly.

pub mod envelope;
pub mod error;
pub mod hilbert;
pub mod hilbert_rtree;
pub mod interval_tree;
pub mod kdtree;
pub mod prelude;

pub use envelope::{Coord, Envelope};
pub use error::{IndexError, Result};
pub use hilbert::HilbertEncoder;
pub use hilbert_rtree::{HilbertRTree, RTreeOptions};
pub use interval_tree::IntervalTree;
pub use kdtree::{KdNode, SnapKdTree};

#[cfg(test)]
mod comparison_tests;
#[cfg(test)]
mod integration_test;
