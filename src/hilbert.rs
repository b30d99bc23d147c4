//! Hilbert curve encoding used to order items before packing.
//!
//! The curve of order `n` covers a `2^n x 2^n` integer grid; [`encode`] maps a grid
//! cell to its position along the curve and [`decode`] maps it back. Both are the
//! branch-free prefix-scan formulation, computed at 16 bits and shifted down to `n`.
//! From https://github.com/rawrunprotected/hilbert_curves (public domain)

use crate::envelope::Envelope;
use crate::error::{IndexError, Result};

/// Highest supported curve order (16 bits per axis, 32-bit index).
pub const MAX_ORDER: u32 = 16;

/// Largest grid ordinate at `order`, i.e. `2^order - 1`.
#[inline]
pub fn max_ordinate(order: u32) -> u32 {
    (1_u32 << order) - 1
}

fn check_order(order: u32) -> Result<()> {
    if order == 0 || order > MAX_ORDER {
        return Err(IndexError::InvalidHilbertOrder(order));
    }
    Ok(())
}

/// Encodes grid cell `(x, y)` as its index along the order-`order` Hilbert curve.
///
/// Ordinates above [`max_ordinate`] are masked to the grid.
///
/// # Errors
/// [`IndexError::InvalidHilbertOrder`] unless `1 <= order <= 16`.
pub fn encode(order: u32, x: u32, y: u32) -> Result<u32> {
    check_order(order)?;
    let mask = max_ordinate(order);
    let shift = MAX_ORDER - order;
    let index = xy_to_index_16((x & mask) << shift, (y & mask) << shift);
    Ok(index >> (32 - 2 * order))
}

/// Decodes a curve index back into its grid cell.
///
/// # Errors
/// [`IndexError::InvalidHilbertOrder`] unless `1 <= order <= 16`.
pub fn decode(order: u32, index: u32) -> Result<(u32, u32)> {
    check_order(order)?;
    let i = index << (32 - 2 * order);
    let i0 = deinterleave(i);
    let i1 = deinterleave(i >> 1);

    let t0 = (i0 | i1) ^ 0xFFFF;
    let t1 = i0 & i1;
    let prefix_t0 = prefix_scan(t0);
    let prefix_t1 = prefix_scan(t1);
    let a = ((i0 ^ 0xFFFF) & prefix_t1) | (i0 & prefix_t0);

    let shift = MAX_ORDER - order;
    Ok(((a ^ i1) >> shift, (a ^ i0 ^ i1) >> shift))
}

/// Maps envelope midpoints onto a Hilbert grid spanning a fixed extent.
///
/// Built once per tree build from the tree's total extent.
#[derive(Clone, Copy, Debug)]
pub struct HilbertEncoder {
    order: u32,
    max_ordinate: f64,
    min_x: f64,
    min_y: f64,
    stride_x: f64,
    stride_y: f64,
}

impl HilbertEncoder {
    /// Creates an encoder of the given order over `extent`.
    ///
    /// # Errors
    /// [`IndexError::InvalidHilbertOrder`] unless `1 <= order <= 16`.
    pub fn new(order: u32, extent: &Envelope) -> Result<Self> {
        check_order(order)?;
        Ok(Self::new_unchecked(order, extent))
    }

    /// Same as [`new`](Self::new) for an order the caller has already validated.
    pub(crate) fn new_unchecked(order: u32, extent: &Envelope) -> Self {
        let side = f64::from(max_ordinate(order));
        Self {
            order,
            max_ordinate: side,
            min_x: extent.min_x,
            min_y: extent.min_y,
            stride_x: extent.width() / side,
            stride_y: extent.height() / side,
        }
    }

    /// Curve order of this encoder.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Hilbert index of the midpoint of `env`.
    pub fn encode(&self, env: &Envelope) -> u32 {
        let mid = env.center();
        let x = self.grid_ordinate(mid.x, self.min_x, self.stride_x);
        let y = self.grid_ordinate(mid.y, self.min_y, self.stride_y);
        let shift = MAX_ORDER - self.order;
        xy_to_index_16(x << shift, y << shift) >> (32 - 2 * self.order)
    }

    #[inline]
    #[expect(clippy::cast_possible_truncation, reason = "clamped to the grid first")]
    fn grid_ordinate(&self, value: f64, min: f64, stride: f64) -> u32 {
        // a degenerate extent collapses the axis onto the first column
        if stride <= 0.0 || !stride.is_finite() {
            return 0;
        }
        ((value - min) / stride).clamp(0.0, self.max_ordinate) as u32
    }
}

fn interleave(mut x: u32) -> u32 {
    x = (x | (x << 8)) & 0x00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333;
    x = (x | (x << 1)) & 0x5555_5555;
    x
}

fn deinterleave(mut x: u32) -> u32 {
    x &= 0x5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF;
    x
}

fn prefix_scan(mut x: u32) -> u32 {
    x ^= x >> 8;
    x ^= x >> 4;
    x ^= x >> 2;
    x ^= x >> 1;
    x
}

/// Full 16-bit Hilbert index of `(x, y)`, both in `0..=0xFFFF`.
#[expect(non_snake_case, reason = "upper-case names mirror the reference algorithm")]
fn xy_to_index_16(x: u32, y: u32) -> u32 {
    // Initial prefix scan round, prime with x and y
    let mut a = x ^ y;
    let mut b = 0xFFFF ^ a;
    let mut c = 0xFFFF ^ (x | y);
    let mut d = x & (y ^ 0xFFFF);
    let mut A = a | (b >> 1);
    let mut B = (a >> 1) ^ a;
    let mut C = ((c >> 1) ^ (b & (d >> 1))) ^ c;
    let mut D = ((a & (c >> 1)) ^ (d >> 1)) ^ d;

    a = A;
    b = B;
    c = C;
    d = D;
    A = (a & (a >> 2)) ^ (b & (b >> 2));
    B = (a & (b >> 2)) ^ (b & ((a ^ b) >> 2));
    C ^= (a & (c >> 2)) ^ (b & (d >> 2));
    D ^= (b & (c >> 2)) ^ ((a ^ b) & (d >> 2));

    a = A;
    b = B;
    c = C;
    d = D;
    A = (a & (a >> 4)) ^ (b & (b >> 4));
    B = (a & (b >> 4)) ^ (b & ((a ^ b) >> 4));
    C ^= (a & (c >> 4)) ^ (b & (d >> 4));
    D ^= (b & (c >> 4)) ^ ((a ^ b) & (d >> 4));

    // Final round and projection
    a = A;
    b = B;
    c = C;
    d = D;
    C ^= (a & (c >> 8)) ^ (b & (d >> 8));
    D ^= (b & (c >> 8)) ^ ((a ^ b) & (d >> 8));

    // Undo transformation prefix scan
    a = C ^ (C >> 1);
    b = D ^ (D >> 1);

    // Recover index bits
    let i0 = x ^ y;
    let i1 = b | (0xFFFF ^ (i0 | a));

    (interleave(i1) << 1) | interleave(i0)
}
