//! Human readable summary of a benchmark run.

use std::fmt;

use chrono::{DateTime, Local};

use crate::{
    error::BenchError,
    launch::LaunchConfig,
    timing::{matmul_operations, TimingSample},
    verify::BaselineOutcome,
};

#[derive(Debug, Clone)]
pub struct BenchReport {
    pub started_at: DateTime<Local>,
    pub device_name: String,
    pub dims: (usize, usize, usize),
    pub launch: LaunchConfig,
    pub timing: TimingSample,
    pub baselines: Vec<BaselineOutcome>,
}

impl BenchReport {
    pub fn operations(&self) -> u64 {
        let (n, l, m) = self.dims;
        matmul_operations(n, l, m)
    }

    pub fn gflops(&self) -> Option<f64> {
        self.timing.gflops(self.operations())
    }

    /// True when every baseline that ran agreed with the device.
    pub fn is_success(&self) -> bool {
        self.baselines.iter().all(|b| b.verification.is_success())
    }

    /// Error describing the first baseline that disagreed, if any.
    pub fn failure(&self) -> Option<BenchError> {
        self.baselines
            .iter()
            .find(|b| !b.verification.is_success())
            .and_then(|b| b.clone().into_result().err())
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n, l, m) = self.dims;
        writeln!(f, "Run started: {}", self.started_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Device: {}", self.device_name)?;
        writeln!(
            f,
            "Shape: {n}x{l} * {l}x{m}, tile {} / {} per thread",
            self.launch.tile_size, self.launch.work_per_thread
        )?;
        writeln!(f, "Global kernel time: {:.3}(ms)", self.timing.elapsed_ms())?;
        match self.gflops() {
            Some(gflops) => writeln!(f, "GFlops: {gflops:.2}")?,
            None => writeln!(f, "GFlops: n/a (kernel time below timer resolution)")?,
        }
        for outcome in &self.baselines {
            writeln!(
                f,
                "{} implementation: {:.3}(s), max abs diff {}",
                outcome.baseline,
                outcome.elapsed.as_secs_f64(),
                outcome.verification.max_abs_diff
            )?;
        }
        if self.is_success() {
            write!(f, "Result: SUCCESS")
        } else {
            write!(f, "Result: FAILURE")
        }
    }
}
