//! Pointer and count entry points for callers that hold raw frame memory.
//!
//! Counts are `i32` to match the C-shaped interface these replace. A count
//! of zero never dereferences its pointers.

use crate::dispatch::Dispatcher;
use std::slice;

/// # Safety
/// `count >= 0` and `a`, `b` are each readable for `count` bytes.
pub unsafe fn hamming_distance(a: *const u8, b: *const u8, count: i32) -> u32 {
    debug_assert!(count >= 0, "negative count {count}");
    if count <= 0 {
        return 0;
    }
    let len = count as usize;
    Dispatcher::global().hamming_distance(slice::from_raw_parts(a, len), slice::from_raw_parts(b, len))
}

/// # Safety
/// `count >= 0` and `a`, `b` are each readable for `count` bytes.
pub unsafe fn sum_square_error(a: *const u8, b: *const u8, count: i32) -> u32 {
    debug_assert!(count >= 0, "negative count {count}");
    if count <= 0 {
        return 0;
    }
    let len = count as usize;
    Dispatcher::global().sum_square_error(slice::from_raw_parts(a, len), slice::from_raw_parts(b, len))
}

/// # Safety
/// `count >= 0` and `src` is readable for `count` bytes.
pub unsafe fn hash_djb2(src: *const u8, count: i32, seed: u32) -> u32 {
    debug_assert!(count >= 0, "negative count {count}");
    if count <= 0 {
        return seed;
    }
    Dispatcher::global().hash_djb2(slice::from_raw_parts(src, count as usize), seed)
}
