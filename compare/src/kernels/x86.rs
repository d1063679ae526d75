//! x86_64 kernels.
//!
//! Every kernel consumes the block-aligned prefix with vector code and
//! hands the tail to the scalar reference. All loads are unaligned.

use super::split_tail;
use crate::scalar;
use crate::tables::{HASH_16X33, HASH_BLOCK, HASH_MUL, NIBBLE_BIT_COUNT};
use std::arch::x86_64::*;

#[inline(always)]
unsafe fn load128(ptr: *const u8) -> __m128i {
    _mm_loadu_si128(ptr as *const __m128i)
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn load256(ptr: *const u8) -> __m256i {
    _mm256_loadu_si256(ptr as *const __m256i)
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn hsum_epi32(v: __m128i) -> u32 {
    let v = _mm_add_epi32(v, _mm_shuffle_epi32::<0xee>(v));
    let v = _mm_add_epi32(v, _mm_shuffle_epi32::<0x01>(v));
    _mm_cvtsi128_si32(v) as u32
}

#[inline]
#[target_feature(enable = "sse2")]
unsafe fn hsum_epi64(v: __m128i) -> u64 {
    let lo = _mm_cvtsi128_si64(v) as u64;
    let hi = _mm_cvtsi128_si64(_mm_unpackhi_epi64(v, v)) as u64;
    lo.wrapping_add(hi)
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn fold_256(v: __m256i) -> __m128i {
    _mm_add_epi32(_mm256_castsi256_si128(v), _mm256_extracti128_si256::<1>(v))
}

// ============================================================================
// Hamming distance
// ============================================================================

/// 8 bytes per step: 64 bit XOR and hardware popcount.
#[target_feature(enable = "popcnt")]
pub unsafe fn hamming_distance_popcnt(a: &[u8], b: &[u8]) -> u32 {
    const BLOCK: usize = 8;
    debug_assert_eq!(a.len(), b.len());

    let head = split_tail(a.len(), BLOCK);
    let (pa, pb) = (a.as_ptr(), b.as_ptr());

    let mut diff = 0u32;
    let mut i = 0;
    while i < head {
        let x = (pa.add(i) as *const u64).read_unaligned();
        let y = (pb.add(i) as *const u64).read_unaligned();
        diff = diff.wrapping_add(_popcnt64((x ^ y) as i64) as u32);
        i += BLOCK;
    }

    diff.wrapping_add(scalar::hamming_distance(&a[head..], &b[head..]))
}

/// Per-byte popcount by looking both nibbles up in `NIBBLE_BIT_COUNT`.
#[inline]
#[target_feature(enable = "ssse3")]
unsafe fn popcount_bytes_ssse3(x: __m128i, lut: __m128i, nibble: __m128i) -> __m128i {
    let lo = _mm_and_si128(x, nibble);
    let hi = _mm_and_si128(_mm_srli_epi16::<4>(x), nibble);
    _mm_add_epi8(_mm_shuffle_epi8(lut, lo), _mm_shuffle_epi8(lut, hi))
}

#[target_feature(enable = "ssse3")]
pub unsafe fn hamming_distance_ssse3(a: &[u8], b: &[u8]) -> u32 {
    const BLOCK: usize = 16;
    debug_assert_eq!(a.len(), b.len());

    let head = split_tail(a.len(), BLOCK);
    let (pa, pb) = (a.as_ptr(), b.as_ptr());

    let lut = load128(NIBBLE_BIT_COUNT.as_ptr());
    let nibble = _mm_set1_epi8(0x0f);
    let zero = _mm_setzero_si128();
    let mut acc = _mm_setzero_si128();

    let mut i = 0;
    while i < head {
        let x = _mm_xor_si128(load128(pa.add(i)), load128(pb.add(i)));
        let counts = popcount_bytes_ssse3(x, lut, nibble);
        acc = _mm_add_epi64(acc, _mm_sad_epu8(counts, zero));
        i += BLOCK;
    }

    let diff = hsum_epi64(acc) as u32;
    diff.wrapping_add(scalar::hamming_distance(&a[head..], &b[head..]))
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn popcount_bytes_avx2(x: __m256i, lut: __m256i, nibble: __m256i) -> __m256i {
    let lo = _mm256_and_si256(x, nibble);
    let hi = _mm256_and_si256(_mm256_srli_epi16::<4>(x), nibble);
    _mm256_add_epi8(_mm256_shuffle_epi8(lut, lo), _mm256_shuffle_epi8(lut, hi))
}

/// 64 bytes per step as two 256 bit halves. Byte counts of both halves are
/// added (at most 16 per lane) before the SAD reduction to 64 bit lanes.
#[target_feature(enable = "avx2")]
pub unsafe fn hamming_distance_avx2(a: &[u8], b: &[u8]) -> u32 {
    const BLOCK: usize = 64;
    debug_assert_eq!(a.len(), b.len());

    let head = split_tail(a.len(), BLOCK);
    let (pa, pb) = (a.as_ptr(), b.as_ptr());

    // vpshufb looks up within each 128 bit lane, so the table goes in both.
    let lut = _mm256_broadcastsi128_si256(load128(NIBBLE_BIT_COUNT.as_ptr()));
    let nibble = _mm256_set1_epi8(0x0f);
    let zero = _mm256_setzero_si256();
    let mut acc = _mm256_setzero_si256();

    let mut i = 0;
    while i < head {
        let x0 = _mm256_xor_si256(load256(pa.add(i)), load256(pb.add(i)));
        let x1 = _mm256_xor_si256(load256(pa.add(i + 32)), load256(pb.add(i + 32)));
        let counts = _mm256_add_epi8(
            popcount_bytes_avx2(x0, lut, nibble),
            popcount_bytes_avx2(x1, lut, nibble),
        );
        acc = _mm256_add_epi64(acc, _mm256_sad_epu8(counts, zero));
        i += BLOCK;
    }

    let acc = _mm_add_epi64(_mm256_castsi256_si128(acc), _mm256_extracti128_si256::<1>(acc));
    let diff = hsum_epi64(acc) as u32;
    diff.wrapping_add(scalar::hamming_distance(&a[head..], &b[head..]))
}

// ============================================================================
// Sum of squared error
// ============================================================================

/// |a - b| per byte as `subs(a, b) | subs(b, a)`, zero-extended to 16 bits
/// and squared pairwise into 32 bit lanes with `pmaddwd`.
#[target_feature(enable = "sse2")]
pub unsafe fn sum_square_error_sse2(a: &[u8], b: &[u8]) -> u32 {
    const BLOCK: usize = 16;
    debug_assert_eq!(a.len(), b.len());

    let head = split_tail(a.len(), BLOCK);
    let (pa, pb) = (a.as_ptr(), b.as_ptr());

    let zero = _mm_setzero_si128();
    let mut acc = _mm_setzero_si128();

    let mut i = 0;
    while i < head {
        let va = load128(pa.add(i));
        let vb = load128(pb.add(i));
        let diff = _mm_or_si128(_mm_subs_epu8(va, vb), _mm_subs_epu8(vb, va));
        let lo = _mm_unpacklo_epi8(diff, zero);
        let hi = _mm_unpackhi_epi8(diff, zero);
        acc = _mm_add_epi32(acc, _mm_madd_epi16(lo, lo));
        acc = _mm_add_epi32(acc, _mm_madd_epi16(hi, hi));
        i += BLOCK;
    }

    hsum_epi32(acc).wrapping_add(scalar::sum_square_error(&a[head..], &b[head..]))
}

#[target_feature(enable = "avx2")]
pub unsafe fn sum_square_error_avx2(a: &[u8], b: &[u8]) -> u32 {
    const BLOCK: usize = 32;
    debug_assert_eq!(a.len(), b.len());

    let head = split_tail(a.len(), BLOCK);
    let (pa, pb) = (a.as_ptr(), b.as_ptr());

    let zero = _mm256_setzero_si256();
    let mut acc = _mm256_setzero_si256();

    let mut i = 0;
    while i < head {
        let va = load256(pa.add(i));
        let vb = load256(pb.add(i));
        let diff = _mm256_or_si256(_mm256_subs_epu8(va, vb), _mm256_subs_epu8(vb, va));
        // Per-lane unpack shuffles byte order, which a plain sum does not care about.
        let lo = _mm256_unpacklo_epi8(diff, zero);
        let hi = _mm256_unpackhi_epi8(diff, zero);
        acc = _mm256_add_epi32(acc, _mm256_madd_epi16(lo, lo));
        acc = _mm256_add_epi32(acc, _mm256_madd_epi16(hi, hi));
        i += BLOCK;
    }

    hsum_epi32(fold_256(acc)).wrapping_add(scalar::sum_square_error(&a[head..], &b[head..]))
}

// ============================================================================
// djb2 hash
// ============================================================================

/// newHash = hash * 33^16 + sum(byte[i] * 33^(15 - i)) per 16 byte block.
#[target_feature(enable = "sse4.1")]
pub unsafe fn hash_djb2_sse41(src: &[u8], seed: u32) -> u32 {
    let head = split_tail(src.len(), HASH_BLOCK);
    let ptr = src.as_ptr();

    let mul = HASH_MUL.as_ptr() as *const __m128i;
    let mul0 = _mm_loadu_si128(mul);
    let mul1 = _mm_loadu_si128(mul.add(1));
    let mul2 = _mm_loadu_si128(mul.add(2));
    let mul3 = _mm_loadu_si128(mul.add(3));
    let zero = _mm_setzero_si128();

    let mut hash = seed;
    let mut i = 0;
    while i < head {
        let v = load128(ptr.add(i));
        let lo = _mm_unpacklo_epi8(v, zero);
        let hi = _mm_unpackhi_epi8(v, zero);
        let w0 = _mm_mullo_epi32(_mm_unpacklo_epi16(lo, zero), mul0);
        let w1 = _mm_mullo_epi32(_mm_unpackhi_epi16(lo, zero), mul1);
        let w2 = _mm_mullo_epi32(_mm_unpacklo_epi16(hi, zero), mul2);
        let w3 = _mm_mullo_epi32(_mm_unpackhi_epi16(hi, zero), mul3);
        let sum = _mm_add_epi32(_mm_add_epi32(w0, w1), _mm_add_epi32(w2, w3));
        hash = hash.wrapping_mul(HASH_16X33).wrapping_add(hsum_epi32(sum));
        i += HASH_BLOCK;
    }

    scalar::hash_djb2(&src[head..], hash)
}

/// Same block step as SSE4.1, widening 8 bytes at a time into 256 bit lanes.
#[target_feature(enable = "avx2")]
pub unsafe fn hash_djb2_avx2(src: &[u8], seed: u32) -> u32 {
    let head = split_tail(src.len(), HASH_BLOCK);
    let ptr = src.as_ptr();

    let mul = HASH_MUL.as_ptr() as *const __m256i;
    let mul_lo = _mm256_loadu_si256(mul);
    let mul_hi = _mm256_loadu_si256(mul.add(1));

    let mut hash = seed;
    let mut i = 0;
    while i < head {
        let b0 = _mm256_cvtepu8_epi32(_mm_loadl_epi64(ptr.add(i) as *const __m128i));
        let b1 = _mm256_cvtepu8_epi32(_mm_loadl_epi64(ptr.add(i + 8) as *const __m128i));
        let sum = _mm256_add_epi32(_mm256_mullo_epi32(b0, mul_lo), _mm256_mullo_epi32(b1, mul_hi));
        hash = hash.wrapping_mul(HASH_16X33).wrapping_add(hsum_epi32(fold_256(sum)));
        i += HASH_BLOCK;
    }

    scalar::hash_djb2(&src[head..], hash)
}
