//! The kernel family: one row per (operation, instruction set) pair.
//!
//! Rows are ordered most specialized first and always end with the scalar
//! reference, which requires nothing and accepts any length.

use crate::caps::Capabilities;
use crate::scalar;
use std::fmt;

#[cfg(target_arch = "aarch64")]
pub mod neon;
pub mod wide;
#[cfg(target_arch = "x86_64")]
pub mod x86;

/// Compares two equal-length buffers.
///
/// # Safety
/// The CPU must support the kernel's required capabilities and both slices
/// must have the same length.
pub type CompareFn = unsafe fn(&[u8], &[u8]) -> u32;

/// Hashes a buffer starting from a seed.
///
/// # Safety
/// The CPU must support the kernel's required capabilities.
pub type HashFn = unsafe fn(&[u8], u32) -> u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Avx2,
    Sse41,
    Ssse3,
    Sse2,
    Popcnt,
    Neon,
    Wide,
    Scalar,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Avx2 => "avx2",
            Tier::Sse41 => "sse41",
            Tier::Ssse3 => "ssse3",
            Tier::Sse2 => "sse2",
            Tier::Popcnt => "popcnt",
            Tier::Neon => "neon",
            Tier::Wide => "wide",
            Tier::Scalar => "scalar",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Copy)]
pub struct Kernel<F> {
    pub name: &'static str,
    pub tier: Tier,
    /// Bytes consumed per loop iteration. Calls shorter than this are not
    /// routed to the kernel.
    pub block: usize,
    pub requires: Capabilities,
    run: F,
}

pub type CompareKernel = Kernel<CompareFn>;
pub type HashKernel = Kernel<HashFn>;

impl<F> fmt::Debug for Kernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .field("block", &self.block)
            .field("requires", &self.requires)
            .finish()
    }
}

impl<F> Kernel<F> {
    pub const fn new(
        name: &'static str,
        tier: Tier,
        block: usize,
        requires: Capabilities,
        run: F,
    ) -> Self {
        Self { name, tier, block, requires, run }
    }

    pub fn is_supported(&self, caps: Capabilities) -> bool {
        caps.contains(self.requires)
    }
}

impl CompareKernel {
    /// # Safety
    /// `is_supported` must hold for the running CPU and `a.len() == b.len()`.
    #[inline]
    pub unsafe fn call(&self, a: &[u8], b: &[u8]) -> u32 {
        (self.run)(a, b)
    }
}

impl HashKernel {
    /// # Safety
    /// `is_supported` must hold for the running CPU.
    #[inline]
    pub unsafe fn call(&self, src: &[u8], seed: u32) -> u32 {
        (self.run)(src, seed)
    }
}

/// Length of the prefix made of whole `block`s; the rest is the scalar tail.
#[inline(always)]
pub(crate) fn split_tail(len: usize, block: usize) -> usize {
    len - len % block
}

pub static HAMMING_KERNELS: &[CompareKernel] = &[
    #[cfg(target_arch = "x86_64")]
    CompareKernel::new("hamming_distance_avx2", Tier::Avx2, 64, Capabilities::AVX2, x86::hamming_distance_avx2),
    #[cfg(target_arch = "x86_64")]
    CompareKernel::new("hamming_distance_ssse3", Tier::Ssse3, 16, Capabilities::SSSE3, x86::hamming_distance_ssse3),
    #[cfg(target_arch = "x86_64")]
    CompareKernel::new("hamming_distance_popcnt", Tier::Popcnt, 8, Capabilities::POPCNT, x86::hamming_distance_popcnt),
    #[cfg(target_arch = "aarch64")]
    CompareKernel::new("hamming_distance_neon", Tier::Neon, 64, Capabilities::NEON, neon::hamming_distance_neon),
    CompareKernel::new("hamming_distance_wide", Tier::Wide, 32, Capabilities::WIDE, wide::hamming_distance_wide),
    CompareKernel::new("hamming_distance_scalar", Tier::Scalar, 1, Capabilities::NONE, scalar::hamming_distance),
];

pub static SSE_KERNELS: &[CompareKernel] = &[
    #[cfg(target_arch = "x86_64")]
    CompareKernel::new("sum_square_error_avx2", Tier::Avx2, 32, Capabilities::AVX2, x86::sum_square_error_avx2),
    #[cfg(target_arch = "x86_64")]
    CompareKernel::new("sum_square_error_sse2", Tier::Sse2, 16, Capabilities::SSE2, x86::sum_square_error_sse2),
    #[cfg(target_arch = "aarch64")]
    CompareKernel::new("sum_square_error_neon", Tier::Neon, 16, Capabilities::NEON, neon::sum_square_error_neon),
    CompareKernel::new("sum_square_error_wide", Tier::Wide, 16, Capabilities::WIDE, wide::sum_square_error_wide),
    CompareKernel::new("sum_square_error_scalar", Tier::Scalar, 1, Capabilities::NONE, scalar::sum_square_error),
];

pub static HASH_KERNELS: &[HashKernel] = &[
    #[cfg(target_arch = "x86_64")]
    HashKernel::new("hash_djb2_avx2", Tier::Avx2, 16, Capabilities::AVX2, x86::hash_djb2_avx2),
    #[cfg(target_arch = "x86_64")]
    HashKernel::new("hash_djb2_sse41", Tier::Sse41, 16, Capabilities::SSE41, x86::hash_djb2_sse41),
    #[cfg(target_arch = "aarch64")]
    HashKernel::new("hash_djb2_neon", Tier::Neon, 16, Capabilities::NEON, neon::hash_djb2_neon),
    HashKernel::new("hash_djb2_wide", Tier::Wide, 16, Capabilities::WIDE, wide::hash_djb2_wide),
    HashKernel::new("hash_djb2_scalar", Tier::Scalar, 1, Capabilities::NONE, scalar::hash_djb2),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::detect;
    use test_case::test_case;
    use utils::{random_bytes, random_pair};

    const MAX_BLOCK: usize = 64;

    fn lengths() -> impl Iterator<Item = usize> {
        0..=3 * MAX_BLOCK + 17
    }

    fn supported<F>(kernels: &'static [Kernel<F>]) -> impl Iterator<Item = &'static Kernel<F>> {
        let caps = detect();
        kernels.iter().filter(move |kernel| kernel.is_supported(caps))
    }

    #[test]
    fn tables_end_with_scalar() {
        for tier in [
            HAMMING_KERNELS.last().map(|k| (k.tier, k.requires)),
            SSE_KERNELS.last().map(|k| (k.tier, k.requires)),
            HASH_KERNELS.last().map(|k| (k.tier, k.requires)),
        ] {
            assert_eq!(tier, Some((Tier::Scalar, Capabilities::NONE)));
        }
        assert!(HAMMING_KERNELS.len() <= 8 && SSE_KERNELS.len() <= 8 && HASH_KERNELS.len() <= 8);
    }

    #[test]
    fn hamming_kernels_match_scalar() {
        for kernel in supported(HAMMING_KERNELS) {
            for len in lengths() {
                let (a, b) = random_pair(len, len as u64);
                let expected = scalar::hamming_distance(&a, &b);
                let actual = unsafe { kernel.call(&a, &b) };
                assert_eq!(actual, expected, "{} differs at len {len}", kernel.name);
            }
        }
    }

    #[test]
    fn sse_kernels_match_scalar() {
        for kernel in supported(SSE_KERNELS) {
            for len in lengths() {
                let (a, b) = random_pair(len, 1000 + len as u64);
                let expected = scalar::sum_square_error(&a, &b);
                let actual = unsafe { kernel.call(&a, &b) };
                assert_eq!(actual, expected, "{} differs at len {len}", kernel.name);
            }
        }
    }

    #[test]
    fn hash_kernels_match_scalar() {
        for kernel in supported(HASH_KERNELS) {
            for len in lengths() {
                let src = random_bytes(len, 2000 + len as u64);
                for seed in [0, 5381, u32::MAX] {
                    let expected = scalar::hash_djb2(&src, seed);
                    let actual = unsafe { kernel.call(&src, seed) };
                    assert_eq!(actual, expected, "{} differs at len {len} seed {seed}", kernel.name);
                }
            }
        }
    }

    #[test_case(0x00, 0xff ; "all bits differ")]
    #[test_case(0xff, 0xff ; "identical")]
    #[test_case(0x00, 0x80 ; "top bit only")]
    fn extreme_bytes(x: u8, y: u8) {
        let len = 4 * MAX_BLOCK + 5;
        let a = vec![x; len];
        let b = vec![y; len];
        for kernel in supported(HAMMING_KERNELS) {
            assert_eq!(unsafe { kernel.call(&a, &b) }, scalar::hamming_distance(&a, &b), "{}", kernel.name);
        }
        for kernel in supported(SSE_KERNELS) {
            assert_eq!(unsafe { kernel.call(&a, &b) }, scalar::sum_square_error(&a, &b), "{}", kernel.name);
            assert_eq!(unsafe { kernel.call(&b, &a) }, scalar::sum_square_error(&a, &b), "{}", kernel.name);
        }
        for kernel in supported(HASH_KERNELS) {
            assert_eq!(unsafe { kernel.call(&a, 7) }, scalar::hash_djb2(&a, 7), "{}", kernel.name);
        }
    }

    #[test]
    fn sse_lane_wraparound_matches_scalar() {
        // 255^2 per byte overflows 32 bits after ~66k bytes.
        let len = 70_000;
        let a = vec![0u8; len];
        let b = vec![0xffu8; len];
        let expected = scalar::sum_square_error(&a, &b);
        assert_eq!(expected, (len as u64 * 65025) as u32);
        for kernel in supported(SSE_KERNELS) {
            assert_eq!(unsafe { kernel.call(&a, &b) }, expected, "{}", kernel.name);
        }
    }

    #[test_case(16 ; "exact multiple")]
    #[test_case(63 ; "one short")]
    #[test_case(64 ; "largest block")]
    #[test_case(127 ; "one byte tail")]
    fn tail_split(len: usize) {
        for kernel in HAMMING_KERNELS.iter().chain(SSE_KERNELS) {
            let head = split_tail(len, kernel.block);
            assert_eq!(head % kernel.block, 0);
            assert!(len - head < kernel.block);
            if (len + 1) % kernel.block == 0 && kernel.block > 1 {
                assert_eq!(len - head, kernel.block - 1);
            }
        }
    }
}
