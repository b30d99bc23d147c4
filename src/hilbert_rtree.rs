//! Hilbert-packed R-tree over axis-aligned envelopes.
//!
//! Items are staged in insertion order, then packed once: sorted by the Hilbert
//! index of their envelope midpoint and grouped bottom-up into layers of
//! `node_capacity` children. Node bounds live in four flat arrays (one per bound)
//! addressed through `layer_start`; there are no per-node allocations.
//!
//! Layer `0` groups items, layer `L` groups nodes of layer `L - 1`. Node `i` of a
//! layer covers children `[i * cap, (i + 1) * cap)` of the layer below, truncated
//! at that layer's end. Packing stops once a layer would shrink to one node, so the
//! top stored layer is scanned in full at query time.

use std::time::Instant;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::envelope::Envelope;
use crate::error::{IndexError, Result};
use crate::hilbert::{self, HilbertEncoder};

/// Default fan-out of a packed node.
pub const DEFAULT_NODE_CAPACITY: usize = 4;
/// Default Hilbert curve order used for the packing sort (a 4096 x 4096 grid).
pub const DEFAULT_HILBERT_ORDER: u32 = 12;

/// Construction parameters for a [`HilbertRTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RTreeOptions {
    /// Children (or items, at the leaf layer) grouped under one node.
    pub node_capacity: usize,
    /// Order of the Hilbert curve used to sort items, in `1..=16`.
    pub hilbert_order: u32,
    /// Number of items to preallocate staging space for.
    pub capacity: usize,
}

impl Default for RTreeOptions {
    fn default() -> Self {
        Self {
            node_capacity: DEFAULT_NODE_CAPACITY,
            hilbert_order: DEFAULT_HILBERT_ORDER,
            capacity: 0,
        }
    }
}

#[derive(Debug)]
struct Item<T> {
    env: Envelope,
    item: T,
}

/// Flat node storage shared by all layers.
#[derive(Debug)]
struct Layers {
    /// Start of each layer in the bound arrays; the last entry is the node count.
    layer_start: Vec<usize>,
    min_x: Vec<f64>,
    min_y: Vec<f64>,
    max_x: Vec<f64>,
    max_y: Vec<f64>,
}

impl Layers {
    fn with_layout(layer_start: Vec<usize>) -> Self {
        let num_nodes = layer_start.last().copied().unwrap_or(0);
        Self {
            layer_start,
            min_x: vec![f64::INFINITY; num_nodes],
            min_y: vec![f64::INFINITY; num_nodes],
            max_x: vec![f64::NEG_INFINITY; num_nodes],
            max_y: vec![f64::NEG_INFINITY; num_nodes],
        }
    }

    #[inline]
    fn layer_count(&self) -> usize {
        self.layer_start.len() - 1
    }

    #[inline]
    fn layer_size(&self, layer: usize) -> usize {
        self.layer_start[layer + 1] - self.layer_start[layer]
    }

    #[inline]
    fn num_nodes(&self) -> usize {
        self.min_x.len()
    }

    #[inline]
    fn expand_node(&mut self, pos: usize, env: &Envelope) {
        self.min_x[pos] = self.min_x[pos].min(env.min_x);
        self.min_y[pos] = self.min_y[pos].min(env.min_y);
        self.max_x[pos] = self.max_x[pos].max(env.max_x);
        self.max_y[pos] = self.max_y[pos].max(env.max_y);
    }

    #[inline]
    fn node_envelope(&self, pos: usize) -> Envelope {
        Envelope {
            min_x: self.min_x[pos],
            min_y: self.min_y[pos],
            max_x: self.max_x[pos],
            max_y: self.max_y[pos],
        }
    }

    #[inline]
    fn intersects(&self, layer: usize, node: usize, search: &Envelope) -> bool {
        let pos = self.layer_start[layer] + node;
        search.max_x >= self.min_x[pos]
            && search.max_y >= self.min_y[pos]
            && search.min_x <= self.max_x[pos]
            && search.min_y <= self.max_y[pos]
    }
}

/// The frozen form: Hilbert-sorted items plus, when worth it, the packed layers.
#[derive(Debug)]
struct Packed<T> {
    items: Vec<Item<T>>,
    layers: Option<Layers>,
}

impl<T> Packed<T> {
    fn pack(
        mut items: Vec<Item<T>>,
        extent: &Envelope,
        node_capacity: usize,
        hilbert_order: u32,
    ) -> Self {
        // tiny trees (and a fan-out of one, which never converges) are scanned linearly
        if items.len() <= node_capacity || node_capacity < 2 {
            debug!(
                items = items.len(),
                node_capacity, "hilbert r-tree left unpacked, queries scan linearly"
            );
            return Self { items, layers: None };
        }

        let start = Instant::now();
        let encoder = HilbertEncoder::new_unchecked(hilbert_order, extent);
        items.sort_by_cached_key(|entry| encoder.encode(&entry.env));

        let mut layers = Layers::with_layout(layer_starts(items.len(), node_capacity));

        // leaf layer: one node per block of items
        for node in 0..layers.layer_size(0) {
            let first = node * node_capacity;
            let last = (first + node_capacity).min(items.len());
            for entry in &items[first..last] {
                layers.expand_node(node, &entry.env);
            }
        }

        // upper layers, bottom-up: one node per block of child nodes
        for layer in 1..layers.layer_count() {
            let child_start = layers.layer_start[layer - 1];
            let child_count = layers.layer_size(layer - 1);
            for node in 0..layers.layer_size(layer) {
                let pos = layers.layer_start[layer] + node;
                let first = node * node_capacity;
                let last = (first + node_capacity).min(child_count);
                for child in first..last {
                    let child_env = layers.node_envelope(child_start + child);
                    layers.expand_node(pos, &child_env);
                }
            }
        }

        debug!(
            items = items.len(),
            layers = layers.layer_count(),
            nodes = layers.num_nodes(),
            elapsed = ?start.elapsed(),
            "packed hilbert r-tree"
        );
        Self { items, layers: Some(layers) }
    }
}

/// Computes where each layer starts, in nodes.
///
/// Layer sizes are `ceil(n / cap)`, `ceil(ceil(n / cap) / cap)`, ... and stop once a
/// layer of size one is reached; that single root is not stored. The returned vector
/// has one entry per stored layer plus the total node count.
fn layer_starts(num_items: usize, node_capacity: usize) -> Vec<usize> {
    let mut starts = Vec::with_capacity(16);
    starts.push(0);
    let mut layer_size = num_items.div_ceil(node_capacity);
    loop {
        let layer_end = starts[starts.len() - 1] + layer_size;
        starts.push(layer_end);
        layer_size = layer_size.div_ceil(node_capacity);
        if layer_size <= 1 {
            break;
        }
    }
    starts
}

/// A static R-tree packed along a Hilbert curve.
///
/// Items are added with [`insert`](Self::insert) and the tree is packed once, either
/// explicitly with [`build`](Self::build) or by the first query. After that the
/// tree is read-only; further inserts fail with [`IndexError::UseAfterFreeze`].
///
/// Concurrent first queries are safe: exactly one of them packs the tree while the
/// others wait for it.
///
/// # Example
/// ```
/// use spindex::{Envelope, HilbertRTree};
///
/// let mut tree = HilbertRTree::new();
/// tree.add(0.0, 0.0, 2.0, 2.0, "a").unwrap();
/// tree.add(1.0, 1.0, 3.0, 3.0, "b").unwrap();
/// tree.add(5.0, 5.0, 6.0, 6.0, "c").unwrap();
///
/// let search = Envelope::new(1.5, 1.5, 2.5, 2.5).unwrap();
/// let mut found = tree.query(&search);
/// found.sort();
/// assert_eq!(found, vec![&"a", &"b"]);
/// ```
#[derive(Debug)]
pub struct HilbertRTree<T> {
    /// Items in insertion order, moved out when the tree is packed
    staged: Mutex<Vec<Item<T>>>,
    packed: OnceCell<Packed<T>>,
    /// Bounding box of all items
    extent: Envelope,
    num_items: usize,
    node_capacity: usize,
    hilbert_order: u32,
}

impl<T> HilbertRTree<T> {
    /// Creates an empty tree with the default node capacity and curve order.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tree with room for `capacity` items before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            staged: Mutex::new(Vec::with_capacity(capacity)),
            packed: OnceCell::new(),
            extent: Envelope::EMPTY,
            num_items: 0,
            node_capacity: DEFAULT_NODE_CAPACITY,
            hilbert_order: DEFAULT_HILBERT_ORDER,
        }
    }

    /// Creates an empty tree with the given fan-out.
    ///
    /// # Errors
    /// [`IndexError::InvalidNodeCapacity`] if `node_capacity` is zero.
    pub fn with_node_capacity(node_capacity: usize) -> Result<Self> {
        Self::with_options(RTreeOptions { node_capacity, ..RTreeOptions::default() })
    }

    /// Creates an empty tree from explicit options.
    ///
    /// # Errors
    /// [`IndexError::InvalidNodeCapacity`] for a zero fan-out,
    /// [`IndexError::InvalidHilbertOrder`] for an order outside `1..=16`.
    pub fn with_options(options: RTreeOptions) -> Result<Self> {
        if options.node_capacity == 0 {
            return Err(IndexError::InvalidNodeCapacity(options.node_capacity));
        }
        if options.hilbert_order == 0 || options.hilbert_order > hilbert::MAX_ORDER {
            return Err(IndexError::InvalidHilbertOrder(options.hilbert_order));
        }
        let mut tree = Self::with_capacity(options.capacity);
        tree.node_capacity = options.node_capacity;
        tree.hilbert_order = options.hilbert_order;
        Ok(tree)
    }

    /// Adds an item under `env`.
    ///
    /// # Errors
    /// [`IndexError::UseAfterFreeze`] once the tree has been built, and
    /// [`IndexError::InvalidEnvelope`] if `env` is inverted or NaN on some axis.
    /// Either way the tree is left untouched.
    pub fn insert(&mut self, env: Envelope, item: T) -> Result<()> {
        if self.packed.get().is_some() {
            warn!(items = self.num_items, "insert into a built hilbert r-tree refused");
            return Err(IndexError::UseAfterFreeze);
        }
        env.check()?;
        self.staged.get_mut().push(Item { env, item });
        self.extent.expand_to_include(&env);
        self.num_items += 1;
        Ok(())
    }

    /// Adds an item under the box `(min_x, min_y) .. (max_x, max_y)`.
    ///
    /// # Errors
    /// [`IndexError::InvalidEnvelope`] for an inverted box, otherwise as
    /// [`insert`](Self::insert).
    pub fn add(&mut self, min_x: f64, min_y: f64, max_x: f64, max_y: f64, item: T) -> Result<()> {
        self.insert(Envelope { min_x, min_y, max_x, max_y }, item)
    }

    /// Packs the tree. Idempotent; later calls (and queries) reuse the first build.
    pub fn build(&self) {
        let _ = self.packed();
    }

    fn packed(&self) -> &Packed<T> {
        self.packed.get_or_init(|| {
            let items = std::mem::take(&mut *self.staged.lock());
            Packed::pack(items, &self.extent, self.node_capacity, self.hilbert_order)
        })
    }

    /// Whether the tree has been packed (and is therefore frozen).
    pub fn is_built(&self) -> bool {
        self.packed.get().is_some()
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.num_items
    }

    /// Whether no item has been inserted.
    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    /// Fan-out of packed nodes.
    pub fn node_capacity(&self) -> usize {
        self.node_capacity
    }

    /// Order of the Hilbert curve used for packing.
    pub fn hilbert_order(&self) -> u32 {
        self.hilbert_order
    }

    /// Envelope enclosing every item, or `None` for an empty tree.
    pub fn extent(&self) -> Option<Envelope> {
        if self.is_empty() { None } else { Some(self.extent) }
    }

    /// Number of stored node layers; zero when the tree scans linearly.
    ///
    /// Builds the tree if needed.
    pub fn layer_count(&self) -> usize {
        self.packed().layers.as_ref().map_or(0, Layers::layer_count)
    }

    /// Envelopes of every stored node, leaf layer first.
    ///
    /// Empty when the tree holds too few items to be packed. Builds the tree if needed.
    pub fn node_bounds(&self) -> Vec<Envelope> {
        match &self.packed().layers {
            Some(layers) => (0..layers.num_nodes()).map(|pos| layers.node_envelope(pos)).collect(),
            None => Vec::new(),
        }
    }

    /// Calls `visitor` once for every item whose envelope intersects `search`.
    ///
    /// The test against item envelopes is exact, so no false positives are reported.
    /// An inverted or NaN `search` matches nothing. Visiting order is unspecified.
    /// Builds the tree if needed.
    pub fn query_with<'a, F>(&'a self, search: &Envelope, mut visitor: F)
    where
        F: FnMut(&'a T),
    {
        let packed = self.packed();
        if self.num_items == 0 || !search.is_valid() || !self.extent.intersects(search) {
            return;
        }

        let Some(layers) = &packed.layers else {
            for entry in &packed.items {
                if entry.env.intersects(search) {
                    visitor(&entry.item);
                }
            }
            return;
        };

        let cap = self.node_capacity;
        let top = layers.layer_count() - 1;
        let mut stack: Vec<(usize, usize)> =
            (0..layers.layer_size(top)).rev().map(|node| (top, node)).collect();

        while let Some((layer, node)) = stack.pop() {
            if !layers.intersects(layer, node, search) {
                continue;
            }
            let first = node * cap;
            if layer == 0 {
                let last = (first + cap).min(packed.items.len());
                for entry in &packed.items[first..last] {
                    if entry.env.intersects(search) {
                        visitor(&entry.item);
                    }
                }
            } else {
                let last = (first + cap).min(layers.layer_size(layer - 1));
                stack.extend((first..last).rev().map(|child| (layer - 1, child)));
            }
        }
    }

    /// Collects every item whose envelope intersects `search`.
    pub fn query(&self, search: &Envelope) -> Vec<&T> {
        let mut results = Vec::new();
        self.query_with(search, |item| results.push(item));
        results
    }
}

impl<T> Default for HilbertRTree<T> {
    fn default() -> Self {
        Self::new()
    }
}
