//! Seeded test and bench inputs. The same `(len, seed)` always gives the
//! same bytes, so failures reproduce.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Two independent buffers of `len` bytes.
pub fn random_pair(len: usize, seed: u64) -> (Vec<u8>, Vec<u8>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut a = vec![0u8; len];
    let mut b = vec![0u8; len];
    rng.fill(&mut a[..]);
    rng.fill(&mut b[..]);
    (a, b)
}

/// Flips exactly `count` distinct bits of `bytes`.
///
/// Panics if `count` exceeds the number of bits.
pub fn flip_bits(bytes: &mut [u8], count: usize, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for bit in index::sample(&mut rng, bytes.len() * 8, count) {
        bytes[bit / 8] ^= 1 << (bit % 8);
    }
}
