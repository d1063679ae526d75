//! aarch64 kernels. NEON is part of the base ISA there, but dispatch still
//! goes through the reported capability like every other tier.

use super::split_tail;
use crate::scalar;
use crate::tables::{HASH_16X33, HASH_BLOCK, HASH_MUL};
use std::arch::aarch64::*;

/// 64 bytes per step: four XORs, per-byte `cnt`, then one widening add
/// across the (at most 32 per lane) byte counts.
#[target_feature(enable = "neon")]
pub unsafe fn hamming_distance_neon(a: &[u8], b: &[u8]) -> u32 {
    const BLOCK: usize = 64;
    debug_assert_eq!(a.len(), b.len());

    let head = split_tail(a.len(), BLOCK);
    let (pa, pb) = (a.as_ptr(), b.as_ptr());

    let mut diff = 0u32;
    let mut i = 0;
    while i < head {
        let c0 = vcntq_u8(veorq_u8(vld1q_u8(pa.add(i)), vld1q_u8(pb.add(i))));
        let c1 = vcntq_u8(veorq_u8(vld1q_u8(pa.add(i + 16)), vld1q_u8(pb.add(i + 16))));
        let c2 = vcntq_u8(veorq_u8(vld1q_u8(pa.add(i + 32)), vld1q_u8(pb.add(i + 32))));
        let c3 = vcntq_u8(veorq_u8(vld1q_u8(pa.add(i + 48)), vld1q_u8(pb.add(i + 48))));
        let counts = vaddq_u8(vaddq_u8(c0, c1), vaddq_u8(c2, c3));
        diff = diff.wrapping_add(vaddlvq_u8(counts) as u32);
        i += BLOCK;
    }

    diff.wrapping_add(scalar::hamming_distance(&a[head..], &b[head..]))
}

/// `uabd` gives |a - b| directly; `umull` squares into 16 bits (255^2 fits)
/// and `uadalp` pairs those into the 32 bit accumulators.
#[target_feature(enable = "neon")]
pub unsafe fn sum_square_error_neon(a: &[u8], b: &[u8]) -> u32 {
    const BLOCK: usize = 16;
    debug_assert_eq!(a.len(), b.len());

    let head = split_tail(a.len(), BLOCK);
    let (pa, pb) = (a.as_ptr(), b.as_ptr());

    let mut acc0 = vdupq_n_u32(0);
    let mut acc1 = vdupq_n_u32(0);

    let mut i = 0;
    while i < head {
        let diff = vabdq_u8(vld1q_u8(pa.add(i)), vld1q_u8(pb.add(i)));
        acc0 = vpadalq_u16(acc0, vmull_u8(vget_low_u8(diff), vget_low_u8(diff)));
        acc1 = vpadalq_u16(acc1, vmull_high_u8(diff, diff));
        i += BLOCK;
    }

    let sse = vaddvq_u32(vaddq_u32(acc0, acc1));
    sse.wrapping_add(scalar::sum_square_error(&a[head..], &b[head..]))
}

#[target_feature(enable = "neon")]
pub unsafe fn hash_djb2_neon(src: &[u8], seed: u32) -> u32 {
    let head = split_tail(src.len(), HASH_BLOCK);
    let ptr = src.as_ptr();

    let mul = HASH_MUL.as_ptr();
    let mul0 = vld1q_u32(mul);
    let mul1 = vld1q_u32(mul.add(4));
    let mul2 = vld1q_u32(mul.add(8));
    let mul3 = vld1q_u32(mul.add(12));

    let mut hash = seed;
    let mut i = 0;
    while i < head {
        let v = vld1q_u8(ptr.add(i));
        let lo = vmovl_u8(vget_low_u8(v));
        let hi = vmovl_high_u8(v);
        let mut sum = vmulq_u32(vmovl_u16(vget_low_u16(lo)), mul0);
        sum = vmlaq_u32(sum, vmovl_high_u16(lo), mul1);
        sum = vmlaq_u32(sum, vmovl_u16(vget_low_u16(hi)), mul2);
        sum = vmlaq_u32(sum, vmovl_high_u16(hi), mul3);
        hash = hash.wrapping_mul(HASH_16X33).wrapping_add(vaddvq_u32(sum));
        i += HASH_BLOCK;
    }

    scalar::hash_djb2(&src[head..], hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neon_zeros_against_ones() {
        let a = [0u8; 64];
        let b = [0xffu8; 64];
        assert_eq!(unsafe { hamming_distance_neon(&a, &b) }, 512);
        assert_eq!(unsafe { sum_square_error_neon(&a[..16], &b[..16]) }, 1_040_400);
    }

    #[test]
    fn neon_hash_single_block() {
        let src: Vec<u8> = (100..116).collect();
        assert_eq!(unsafe { hash_djb2_neon(&src, 0) }, scalar::hash_djb2(&src, 0));
    }
}
