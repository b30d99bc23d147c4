//! Key types: 2D coordinates and axis-aligned envelopes.

use std::cmp::Ordering;

use crate::error::{IndexError, Result};

/// A 2D coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coord {
    /// X ordinate.
    pub x: f64,
    /// Y ordinate.
    pub y: f64,
}

impl Coord {
    /// Creates a coordinate.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`.
    #[inline]
    pub fn distance_sq(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(&self, other: &Self) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Lexicographic order: x first, then y.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.x.total_cmp(&other.x).then(self.y.total_cmp(&other.y))
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box: `[min_x, max_x] x [min_y, max_y]`, closed on all sides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    /// Left edge.
    pub min_x: f64,
    /// Bottom edge.
    pub min_y: f64,
    /// Right edge.
    pub max_x: f64,
    /// Top edge.
    pub max_y: f64,
}

impl Envelope {
    /// The empty envelope. Expanding it by any box yields that box.
    pub const EMPTY: Self = Self {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    /// Creates an envelope, rejecting inverted or NaN extents.
    ///
    /// # Errors
    /// [`IndexError::InvalidEnvelope`] if `min_x > max_x`, `min_y > max_y`,
    /// or any ordinate is NaN.
    ///
    /// # Example
    /// ```
    /// use spindex::Envelope;
    /// assert!(Envelope::new(0.0, 0.0, 1.0, 1.0).is_ok());
    /// assert!(Envelope::new(2.0, 0.0, 1.0, 1.0).is_err());
    /// ```
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self> {
        let env = Self { min_x, min_y, max_x, max_y };
        env.check()?;
        Ok(env)
    }

    /// Whether both axes are ordered (`min <= max`) and free of NaN.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Fails with [`IndexError::InvalidEnvelope`] unless [`is_valid`](Self::is_valid).
    ///
    /// # Errors
    /// [`IndexError::InvalidEnvelope`] for an inverted or NaN extent.
    pub fn check(&self) -> Result<()> {
        if !self.is_valid() {
            return Err(IndexError::InvalidEnvelope {
                min_x: self.min_x,
                min_y: self.min_y,
                max_x: self.max_x,
                max_y: self.max_y,
            });
        }
        Ok(())
    }

    /// A zero-area envelope at `(x, y)`.
    pub const fn from_point(x: f64, y: f64) -> Self {
        Self { min_x: x, min_y: y, max_x: x, max_y: y }
    }

    /// Whether this is the [`Envelope::EMPTY`] sentinel (or any inverted box).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Width along x, zero when empty.
    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_x - self.min_x }
    }

    /// Height along y, zero when empty.
    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max_y - self.min_y }
    }

    /// Midpoint of the box.
    pub fn center(&self) -> Coord {
        Coord::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Closed intersection test; touching edges or corners intersect.
    ///
    /// Any NaN ordinate makes the test fail.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        other.min_x <= self.max_x
            && other.max_x >= self.min_x
            && other.min_y <= self.max_y
            && other.max_y >= self.min_y
    }

    /// Whether `p` lies inside or on the boundary.
    #[inline]
    pub fn contains_coord(&self, p: &Coord) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Grows this envelope to cover `other`.
    #[inline]
    pub fn expand_to_include(&mut self, other: &Self) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Returns a copy grown by `distance` on every side.
    #[must_use]
    pub fn expand_by(&self, distance: f64) -> Self {
        Self {
            min_x: self.min_x - distance,
            min_y: self.min_y - distance,
            max_x: self.max_x + distance,
            max_y: self.max_y + distance,
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::EMPTY
    }
}
