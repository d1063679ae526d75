//! Read-only tables shared by the scalar and vectorized kernels.
//!
//! Everything here is computed at compile time and lives for the whole
//! process; no kernel ever writes to it.

/// Multiplier of the djb2 recurrence `h = h * 33 + byte`.
pub const DJB2_MUL: u32 = 33;

/// Conventional djb2 starting value.
pub const DJB2_SEED: u32 = 5381;

/// Bytes folded per vectorized hash step.
pub const HASH_BLOCK: usize = 16;

const fn pow33_const(exp: u32) -> u32 {
    let mut result = 1u32;
    let mut i = 0;
    while i < exp {
        result = result.wrapping_mul(DJB2_MUL);
        i += 1;
    }
    result
}

const fn hash_mul() -> [u32; HASH_BLOCK] {
    let mut table = [0u32; HASH_BLOCK];
    let mut i = 0;
    while i < HASH_BLOCK {
        table[i] = pow33_const((HASH_BLOCK - 1 - i) as u32);
        i += 1;
    }
    table
}

const fn byte_bit_count() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).count_ones() as u8;
        i += 1;
    }
    table
}

/// `HASH_MUL[i] == 33^(15 - i)` (mod 2^32): the weight of byte `i` inside a
/// 16 byte block, most significant byte first.
pub static HASH_MUL: [u32; HASH_BLOCK] = hash_mul();

/// 33^16 (mod 2^32): what the running hash is multiplied by per 16 byte block.
pub static HASH_16X33: u32 = pow33_const(HASH_BLOCK as u32);

/// Popcount of every nibble, laid out as a byte-shuffle lookup vector.
pub static NIBBLE_BIT_COUNT: [u8; 16] = [0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4];

/// Popcount of every byte value.
pub static BYTE_BIT_COUNT: [u8; 256] = byte_bit_count();
