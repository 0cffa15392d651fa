//! Kernel timing from device event profiling counters.

use std::time::Duration;

/// Start and end timestamps, in nanoseconds, of one kernel execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingSample {
    pub start_ns: u64,
    pub end_ns: u64,
}

impl TimingSample {
    pub fn new(start_ns: u64, end_ns: u64) -> Self {
        Self { start_ns, end_ns }
    }

    /// Counters are device clocks; a bogus pair saturates to zero.
    #[inline]
    pub fn elapsed_ns(&self) -> u64 {
        self.end_ns.saturating_sub(self.start_ns)
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns())
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ns() as f64 * 1.0e-6
    }

    /// Throughput in GFLOP/s, i.e. floating point operations per nanosecond.
    pub fn gflops(&self, operations: u64) -> Option<f64> {
        match self.elapsed_ns() {
            0 => None,
            ns => Some(operations as f64 / ns as f64),
        }
    }
}

/// Multiply-add count of an `n x l` by `l x m` product, two flops each.
#[inline]
pub fn matmul_operations(n: usize, l: usize, m: usize) -> u64 {
    2 * n as u64 * l as u64 * m as u64
}
