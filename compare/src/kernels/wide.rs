//! Portable lane kernels on top of the `wide` crate.
//!
//! `wide` lowers to SSE/AVX/NEON/simd128 when the build target enables them
//! and to plain integer code otherwise, so this tier is valid everywhere.
//! Integer lane arithmetic in `wide` wraps, matching the scalar reference.

use super::split_tail;
use crate::scalar;
use crate::tables::{HASH_16X33, HASH_BLOCK, HASH_MUL};
use wide::{i32x8, u64x4};

const WORD: usize = size_of::<u64>();

#[inline(always)]
fn load_u64x4(bytes: &[u8]) -> u64x4 {
    u64x4::from(core::array::from_fn::<u64, 4, _>(|lane| {
        let mut word = [0u8; WORD];
        word.copy_from_slice(&bytes[lane * WORD..(lane + 1) * WORD]);
        u64::from_le_bytes(word)
    }))
}

#[inline(always)]
fn widen_i32x8(bytes: &[u8]) -> i32x8 {
    i32x8::from(core::array::from_fn::<i32, 8, _>(|lane| bytes[lane] as i32))
}

#[inline(always)]
fn reduce_i32x8(v: i32x8) -> u32 {
    v.to_array()
        .iter()
        .fold(0u32, |acc, &lane| acc.wrapping_add(lane as u32))
}

/// 32 bytes per step as one `u64x4` XOR, then per-lane popcount.
pub fn hamming_distance_wide(a: &[u8], b: &[u8]) -> u32 {
    const BLOCK: usize = 32;
    debug_assert_eq!(a.len(), b.len());

    let head = split_tail(a.len(), BLOCK);

    let diff = a[..head]
        .chunks_exact(BLOCK)
        .zip(b[..head].chunks_exact(BLOCK))
        .map(|(x, y)| {
            (load_u64x4(x) ^ load_u64x4(y))
                .as_array_ref()
                .iter()
                .map(|e| e.count_ones())
                .sum::<u32>()
        })
        .fold(0u32, u32::wrapping_add);

    diff.wrapping_add(scalar::hamming_distance(&a[head..], &b[head..]))
}

/// 16 bytes per step: bytes widened to two `i32x8`, differenced and squared
/// into an `i32x8` accumulator reduced once at the end.
pub fn sum_square_error_wide(a: &[u8], b: &[u8]) -> u32 {
    const BLOCK: usize = 16;
    debug_assert_eq!(a.len(), b.len());

    let head = split_tail(a.len(), BLOCK);

    let mut acc = i32x8::splat(0);
    for (x, y) in a[..head].chunks_exact(BLOCK).zip(b[..head].chunks_exact(BLOCK)) {
        let d0 = widen_i32x8(&x[..8]) - widen_i32x8(&y[..8]);
        let d1 = widen_i32x8(&x[8..]) - widen_i32x8(&y[8..]);
        acc = acc + d0 * d0 + d1 * d1;
    }

    reduce_i32x8(acc).wrapping_add(scalar::sum_square_error(&a[head..], &b[head..]))
}

pub fn hash_djb2_wide(src: &[u8], seed: u32) -> u32 {
    let head = split_tail(src.len(), HASH_BLOCK);

    let mul_lo = i32x8::from(core::array::from_fn::<i32, 8, _>(|lane| HASH_MUL[lane] as i32));
    let mul_hi = i32x8::from(core::array::from_fn::<i32, 8, _>(|lane| HASH_MUL[lane + 8] as i32));

    let hash = src[..head].chunks_exact(HASH_BLOCK).fold(seed, |hash, block| {
        let weighted = widen_i32x8(&block[..8]) * mul_lo + widen_i32x8(&block[8..]) * mul_hi;
        hash.wrapping_mul(HASH_16X33).wrapping_add(reduce_i32x8(weighted))
    });

    scalar::hash_djb2(&src[head..], hash)
}
