//! 64 bit results over buffers of any size, strided planes, and djb2 state
//! that can be carried across calls or combined between chunks.

use crate::dispatch::Dispatcher;
use crate::tables::{DJB2_MUL, DJB2_SEED};
use std::hash::Hasher;

/// 2^15 bytes is at most 2^18 differing bits per chunk.
pub const HAMMING_CHUNK: usize = 1 << 15;

/// 2^16 * 255^2 < 2^32, so every chunk's 32 bit sum is exact.
pub const SSE_CHUNK: usize = 1 << 16;

impl Dispatcher {
    /// Hamming distance without the 32 bit limit.
    pub fn compute_hamming_distance(&self, a: &[u8], b: &[u8]) -> u64 {
        assert_eq!(a.len(), b.len(), "compute_hamming_distance on buffers of different length");
        tracing::trace!(len = a.len(), chunk = HAMMING_CHUNK, "chunked hamming distance");
        a.chunks(HAMMING_CHUNK)
            .zip(b.chunks(HAMMING_CHUNK))
            .map(|(x, y)| self.hamming_distance(x, y) as u64)
            .sum()
    }

    /// Sum of squared error without the 32 bit limit.
    pub fn compute_sum_square_error(&self, a: &[u8], b: &[u8]) -> u64 {
        assert_eq!(a.len(), b.len(), "compute_sum_square_error on buffers of different length");
        tracing::trace!(len = a.len(), chunk = SSE_CHUNK, "chunked sum square error");
        a.chunks(SSE_CHUNK)
            .zip(b.chunks(SSE_CHUNK))
            .map(|(x, y)| self.sum_square_error(x, y) as u64)
            .sum()
    }

    /// SSE of two `width` x `height` planes laid out with the given strides.
    ///
    /// # Panics
    /// If a stride is smaller than `width` or a plane is too short.
    pub fn sum_square_error_plane(
        &self,
        a: &[u8],
        stride_a: usize,
        b: &[u8],
        stride_b: usize,
        width: usize,
        height: usize,
    ) -> u64 {
        assert!(stride_a >= width && stride_b >= width, "stride smaller than plane width");
        if width == 0 || height == 0 {
            return 0;
        }

        // Rows are back to back: one pass over the whole plane.
        if stride_a == width && stride_b == width {
            let len = width * height;
            return self.compute_sum_square_error(&a[..len], &b[..len]);
        }

        (0..height)
            .map(|row| {
                let row_a = &a[row * stride_a..row * stride_a + width];
                let row_b = &b[row * stride_b..row * stride_b + width];
                self.compute_sum_square_error(row_a, row_b)
            })
            .sum()
    }
}

pub fn compute_hamming_distance(a: &[u8], b: &[u8]) -> u64 {
    Dispatcher::global().compute_hamming_distance(a, b)
}

pub fn compute_sum_square_error(a: &[u8], b: &[u8]) -> u64 {
    Dispatcher::global().compute_sum_square_error(a, b)
}

pub fn sum_square_error_plane(
    a: &[u8],
    stride_a: usize,
    b: &[u8],
    stride_b: usize,
    width: usize,
    height: usize,
) -> u64 {
    Dispatcher::global().sum_square_error_plane(a, stride_a, b, stride_b, width, height)
}

/// 33^n mod 2^32.
pub fn pow33(n: u64) -> u32 {
    let mut base = DJB2_MUL;
    let mut exp = n;
    let mut result = 1u32;
    while exp != 0 {
        if exp & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    result
}

/// Hash of `X ++ Y` from the hash of `X` and the zero-seeded hash of `Y`.
///
/// The recurrence is linear: `hash(s, Y) == s * 33^|Y| + hash(0, Y)`.
pub fn djb2_combine(prefix: u32, suffix_from_zero: u32, suffix_len: u64) -> u32 {
    prefix.wrapping_mul(pow33(suffix_len)).wrapping_add(suffix_from_zero)
}

/// Incremental djb2. Feeding bytes in any split gives the one-shot hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Djb2 {
    hash: u32,
    len: u64,
}

impl Djb2 {
    pub fn new(seed: u32) -> Self {
        Self { hash: seed, len: 0 }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hash = Dispatcher::global().hash_djb2(data, self.hash);
        self.len += data.len() as u64;
    }

    pub fn finish(&self) -> u32 {
        self.hash
    }

    /// Bytes fed so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Djb2 {
    fn default() -> Self {
        Self::new(DJB2_SEED)
    }
}

impl Hasher for Djb2 {
    fn finish(&self) -> u64 {
        self.hash as u64
    }

    fn write(&mut self, bytes: &[u8]) {
        self.update(bytes);
    }
}
