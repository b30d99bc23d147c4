//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from the crate.
//! Users can import everything they need with:
//!
//! ```
//! use spindex::prelude::*;
//! ```

pub use crate::{
    Coord, Envelope, HilbertRTree, IndexError, IntervalTree, KdNode, RTreeOptions, SnapKdTree,
};
