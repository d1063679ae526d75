//! Rayon drivers. Inputs are split into `PAR_CHUNK` pieces; comparison sums
//! are added and hash pieces are joined with `djb2_combine`.

use crate::accumulate::djb2_combine;
use crate::dispatch::Dispatcher;
use rayon::prelude::*;

pub const PAR_CHUNK: usize = 1 << 18;

impl Dispatcher {
    pub fn par_hamming_distance(&self, a: &[u8], b: &[u8]) -> u64 {
        assert_eq!(a.len(), b.len(), "par_hamming_distance on buffers of different length");
        a.par_chunks(PAR_CHUNK)
            .zip(b.par_chunks(PAR_CHUNK))
            .map(|(x, y)| self.compute_hamming_distance(x, y))
            .sum()
    }

    pub fn par_sum_square_error(&self, a: &[u8], b: &[u8]) -> u64 {
        assert_eq!(a.len(), b.len(), "par_sum_square_error on buffers of different length");
        a.par_chunks(PAR_CHUNK)
            .zip(b.par_chunks(PAR_CHUNK))
            .map(|(x, y)| self.compute_sum_square_error(x, y))
            .sum()
    }

    /// Each chunk is hashed from a zero seed; `(hash, len)` pairs then reduce
    /// left to right, with `(0, 0)` as identity.
    pub fn par_hash_djb2(&self, src: &[u8], seed: u32) -> u32 {
        let (hash, len) = src
            .par_chunks(PAR_CHUNK)
            .map(|chunk| (self.hash_djb2(chunk, 0), chunk.len() as u64))
            .reduce(
                || (0, 0),
                |(left, left_len), (right, right_len)| {
                    (djb2_combine(left, right, right_len), left_len + right_len)
                },
            );
        djb2_combine(seed, hash, len)
    }
}

pub fn par_hamming_distance(a: &[u8], b: &[u8]) -> u64 {
    Dispatcher::global().par_hamming_distance(a, b)
}

pub fn par_sum_square_error(a: &[u8], b: &[u8]) -> u64 {
    Dispatcher::global().par_sum_square_error(a, b)
}

pub fn par_hash_djb2(src: &[u8], seed: u32) -> u32 {
    Dispatcher::global().par_hash_djb2(src, seed)
}
