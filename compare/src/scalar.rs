//! Portable reference kernels. Every vectorized kernel must agree with these
//! bit for bit, including 32 bit wraparound.

use crate::tables::{BYTE_BIT_COUNT, DJB2_MUL};

const WORD: usize = size_of::<u64>();

#[inline]
fn load_u64(bytes: &[u8]) -> u64 {
    let mut word = [0u8; WORD];
    word.copy_from_slice(&bytes[..WORD]);
    u64::from_le_bytes(word)
}

/// Number of differing bits between `a` and `b`.
///
/// Whole 64 bit words use the native popcount; the last `len % 8` bytes go
/// through the byte lookup table.
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    debug_assert_eq!(a.len(), b.len());

    let words_a = a.chunks_exact(WORD);
    let words_b = b.chunks_exact(WORD);
    let tail_a = words_a.remainder();
    let tail_b = words_b.remainder();

    let mut diff = words_a
        .zip(words_b)
        .map(|(x, y)| (load_u64(x) ^ load_u64(y)).count_ones())
        .fold(0u32, u32::wrapping_add);

    for (&x, &y) in tail_a.iter().zip(tail_b) {
        diff = diff.wrapping_add(BYTE_BIT_COUNT[(x ^ y) as usize] as u32);
    }
    diff
}

/// Sum over the byte pairs of the squared unsigned difference.
///
/// Wraps modulo 2^32 when the true sum does not fit, same as the vector kernels.
pub fn sum_square_error(a: &[u8], b: &[u8]) -> u32 {
    debug_assert_eq!(a.len(), b.len());

    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let diff = x.abs_diff(y) as u32;
            diff * diff
        })
        .fold(0u32, u32::wrapping_add)
}

/// `h = h * 33 + byte` over `src`, starting from `seed`.
pub fn hash_djb2(src: &[u8], seed: u32) -> u32 {
    src.iter()
        .fold(seed, |hash, &byte| hash.wrapping_mul(DJB2_MUL).wrapping_add(byte as u32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn empty_inputs() {
        assert_eq!(hamming_distance(&[], &[]), 0);
        assert_eq!(sum_square_error(&[], &[]), 0);
        assert_eq!(hash_djb2(&[], 5381), 5381);
    }

    #[test]
    fn zeros_against_ones() {
        let a = [0x00u8; 16];
        let b = [0xffu8; 16];
        assert_eq!(hamming_distance(&a, &b), 128);
        assert_eq!(sum_square_error(&a, &b), 16 * 255 * 255);
        assert_eq!(sum_square_error(&a, &b), 1_040_400);
    }

    #[test]
    fn difference_is_unsigned_distance() {
        assert_eq!(sum_square_error(&[5], &[250]), 245 * 245);
        assert_eq!(sum_square_error(&[250], &[5]), 245 * 245);
    }

    #[test_case(b"a", 0, 97 ; "single byte")]
    #[test_case(b"ab", 0, 97 * 33 + 98 ; "two bytes")]
    #[test_case(b"", 5381, 5381 ; "empty keeps seed")]
    #[test_case(b"a", 5381, 5381 * 33 + 97 ; "classic seed")]
    fn djb2_known_values(src: &[u8], seed: u32, expected: u32) {
        assert_eq!(hash_djb2(src, seed), expected);
    }

    #[test]
    fn djb2_wraps() {
        let src = [0xffu8; 64];
        let mut expected = u32::MAX;
        for &byte in &src {
            expected = expected.wrapping_mul(33).wrapping_add(byte as u32);
        }
        assert_eq!(hash_djb2(&src, u32::MAX), expected);
    }

    #[test_case(7 ; "tail only")]
    #[test_case(8 ; "one word")]
    #[test_case(15 ; "word and tail")]
    #[test_case(64 ; "many words")]
    fn hamming_word_and_tail_paths_agree(len: usize) {
        let a: Vec<u8> = (0..len).map(|i| (i * 31) as u8).collect();
        let b: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
        let expected: u32 = a.iter().zip(&b).map(|(x, y)| (x ^ y).count_ones()).sum();
        assert_eq!(hamming_distance(&a, &b), expected);
    }
}
