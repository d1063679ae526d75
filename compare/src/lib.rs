//! Byte buffer comparison primitives: bitwise Hamming distance, sum of
//! squared error and the djb2 hash.
//!
//! Each operation has a scalar reference and a family of vectorized kernels.
//! The crate-level functions go through the process-wide [`Dispatcher`],
//! which picks the widest kernel the CPU supports on first use. Every kernel
//! returns the scalar result bit for bit, including 32 bit wraparound.
//!
//! ```
//! let a = [0u8; 16];
//! let b = [0xffu8; 16];
//! assert_eq!(compare::hamming_distance(&a, &b), 128);
//! assert_eq!(compare::sum_square_error(&a, &b), 1_040_400);
//! assert_eq!(compare::hash_djb2(b"a", 0), 97);
//! ```

pub mod accumulate;
pub mod caps;
pub mod config;
pub mod dispatch;
pub mod kernels;
pub mod par;
pub mod raw;
pub mod scalar;
pub mod tables;

pub use accumulate::{compute_hamming_distance, compute_sum_square_error, Djb2};
pub use caps::{detect, Capabilities, Feature};
pub use config::DispatchConfig;
pub use dispatch::Dispatcher;
pub use kernels::{CompareKernel, HashKernel, Kernel, Tier};
pub use tables::DJB2_SEED;

/// Number of differing bits between `a` and `b`, modulo 2^32.
///
/// # Panics
/// If `a` and `b` differ in length.
#[inline]
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    Dispatcher::global().hamming_distance(a, b)
}

/// Sum of `(a[i] - b[i])^2` over unsigned bytes, modulo 2^32.
///
/// The sum is exact for up to 66051 bytes; use
/// [`compute_sum_square_error`] for longer buffers.
///
/// # Panics
/// If `a` and `b` differ in length.
#[inline]
pub fn sum_square_error(a: &[u8], b: &[u8]) -> u32 {
    Dispatcher::global().sum_square_error(a, b)
}

/// `hash = hash * 33 + byte` over `src`, starting from `seed`.
#[inline]
pub fn hash_djb2(src: &[u8], seed: u32) -> u32 {
    Dispatcher::global().hash_djb2(src, seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use utils::{flip_bits, random_bytes, random_pair};

    #[test_case(0)]
    #[test_case(15)]
    #[test_case(16)]
    #[test_case(63)]
    #[test_case(64)]
    #[test_case(1000)]
    fn identical_buffers(len: usize) {
        let a = random_bytes(len, 1);
        assert_eq!(hamming_distance(&a, &a), 0);
        assert_eq!(sum_square_error(&a, &a), 0);
    }

    #[test_case(31)]
    #[test_case(32)]
    #[test_case(127)]
    #[test_case(128)]
    #[test_case(4099)]
    fn symmetric_and_bounded(len: usize) {
        let (a, b) = random_pair(len, 2);
        let d = hamming_distance(&a, &b);
        assert_eq!(d, hamming_distance(&b, &a));
        assert!(d as usize <= 8 * len);
        assert_eq!(sum_square_error(&a, &b), sum_square_error(&b, &a));
    }

    #[test]
    fn flipped_bits_are_counted() {
        let a = random_bytes(500, 3);
        let mut b = a.clone();
        flip_bits(&mut b, 77, 4);
        assert_eq!(hamming_distance(&a, &b), 77);
    }

    #[test]
    fn zeros_against_ones() {
        let a = [0u8; 16];
        let b = [0xffu8; 16];
        assert_eq!(hamming_distance(&a, &b), 128);
        assert_eq!(sum_square_error(&a, &b), 1_040_400);
    }

    #[test]
    fn hash_known_values() {
        assert_eq!(hash_djb2(&[], DJB2_SEED), 5381);
        assert_eq!(hash_djb2(&[0x61], 0), 97);
        let src = random_bytes(777, 5);
        assert_eq!(hash_djb2(&src, 5381), hash_djb2(&src, 5381));
        assert_eq!(hash_djb2(&src, 5381), scalar::hash_djb2(&src, 5381));
    }

    #[test]
    #[should_panic(expected = "different length")]
    fn sse_length_mismatch_panics() {
        sum_square_error(&[1, 2, 3], &[1, 2]);
    }
}
