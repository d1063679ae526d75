//! Capability-gated kernel selection.
//!
//! A `Dispatcher` holds, per operation, a bitmask over the rows of the kernel
//! table whose required capabilities are present. A call runs the first
//! eligible row whose block size fits the input; the scalar row always
//! matches last.
//!
//! The process-wide dispatcher is resolved on first use and cached in two
//! atomics. Racing first calls compute the same value and may both store it;
//! after that the cache is read-only.

use crate::caps::{detect, Capabilities};
use crate::config::DispatchConfig;
use crate::kernels::{CompareKernel, HashKernel, Kernel, HAMMING_KERNELS, HASH_KERNELS, SSE_KERNELS};
use std::sync::atomic::{AtomicU32, Ordering};

const RESOLVED: u32 = 1 << 31;

static GLOBAL_MASKS: AtomicU32 = AtomicU32::new(0);
static GLOBAL_CAPS: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatcher {
    caps: Capabilities,
    hamming: u8,
    sse: u8,
    hash: u8,
}

fn eligible<F>(kernels: &[Kernel<F>], caps: Capabilities) -> u8 {
    debug_assert!(kernels.len() <= u8::BITS as usize);
    kernels
        .iter()
        .enumerate()
        .filter(|(_, kernel)| kernel.is_supported(caps))
        .fold(0u8, |mask, (index, _)| mask | 1u8 << index)
}

fn select<F>(kernels: &'static [Kernel<F>], mask: u8, len: usize) -> &'static Kernel<F> {
    kernels
        .iter()
        .enumerate()
        .find(|&(index, kernel)| mask & (1u8 << index) != 0 && len >= kernel.block)
        .map_or(&kernels[kernels.len() - 1], |(_, kernel)| kernel)
}

impl Dispatcher {
    /// Dispatcher restricted to `caps`. Features the CPU does not report are
    /// dropped, so every selectable kernel can run here.
    pub fn new(caps: Capabilities) -> Self {
        let caps = caps & detect();
        Self {
            caps,
            hamming: eligible(HAMMING_KERNELS, caps),
            sse: eligible(SSE_KERNELS, caps),
            hash: eligible(HASH_KERNELS, caps),
        }
    }

    /// Detected capabilities, masked by `config`.
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.apply(detect()))
    }

    /// The process-wide dispatcher: detected capabilities masked by the
    /// `COMPARE_DISABLE_*` environment, resolved once.
    #[inline]
    pub fn global() -> Self {
        let masks = GLOBAL_MASKS.load(Ordering::Acquire);
        if masks & RESOLVED != 0 {
            return Self::unpack(Capabilities::from_bits(GLOBAL_CAPS.load(Ordering::Relaxed)), masks);
        }
        Self::resolve_global()
    }

    #[cold]
    fn resolve_global() -> Self {
        let dispatcher = Self::from_config(&DispatchConfig::from_env());
        dispatcher.log_selection();

        GLOBAL_CAPS.store(dispatcher.caps.bits(), Ordering::Relaxed);
        GLOBAL_MASKS.store(dispatcher.pack(), Ordering::Release);
        dispatcher
    }

    fn pack(&self) -> u32 {
        RESOLVED | self.hamming as u32 | (self.sse as u32) << 8 | (self.hash as u32) << 16
    }

    fn unpack(caps: Capabilities, masks: u32) -> Self {
        Self {
            caps,
            hamming: masks as u8,
            sse: (masks >> 8) as u8,
            hash: (masks >> 16) as u8,
        }
    }

    fn log_selection(&self) {
        tracing::debug!(caps = %self.caps, kernel = self.hamming_kernel(usize::MAX).name, "hamming distance");
        tracing::debug!(caps = %self.caps, kernel = self.sse_kernel(usize::MAX).name, "sum square error");
        tracing::debug!(caps = %self.caps, kernel = self.hash_kernel(usize::MAX).name, "djb2 hash");
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// Kernel that services a Hamming distance call over `len` bytes.
    pub fn hamming_kernel(&self, len: usize) -> &'static CompareKernel {
        select(HAMMING_KERNELS, self.hamming, len)
    }

    pub fn sse_kernel(&self, len: usize) -> &'static CompareKernel {
        select(SSE_KERNELS, self.sse, len)
    }

    pub fn hash_kernel(&self, len: usize) -> &'static HashKernel {
        select(HASH_KERNELS, self.hash, len)
    }

    /// # Panics
    /// If `a` and `b` differ in length.
    #[inline]
    pub fn hamming_distance(&self, a: &[u8], b: &[u8]) -> u32 {
        assert_eq!(a.len(), b.len(), "hamming_distance on buffers of different length");
        let kernel = self.hamming_kernel(a.len());
        // SAFETY: `new` clamps to `detect()`, so only rows whose capabilities
        // the CPU reported are selectable, and the lengths were checked above.
        unsafe { kernel.call(a, b) }
    }

    /// # Panics
    /// If `a` and `b` differ in length.
    #[inline]
    pub fn sum_square_error(&self, a: &[u8], b: &[u8]) -> u32 {
        assert_eq!(a.len(), b.len(), "sum_square_error on buffers of different length");
        let kernel = self.sse_kernel(a.len());
        // SAFETY: as for `hamming_distance`.
        unsafe { kernel.call(a, b) }
    }

    #[inline]
    pub fn hash_djb2(&self, src: &[u8], seed: u32) -> u32 {
        let kernel = self.hash_kernel(src.len());
        // SAFETY: only rows whose capabilities were reported are selectable.
        unsafe { kernel.call(src, seed) }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::global()
    }
}
