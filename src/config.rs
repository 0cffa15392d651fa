//! Run parameters.
//!
//! [`BenchConfig`] starts from the compile-time workload constants and is
//! overridden field by field from the command line. [`BenchConfig::validate`]
//! runs before any operand is allocated or any device is touched.

use std::path::PathBuf;

use crate::{
    error::{invalid_config, Result},
    launch::LaunchConfig,
    verify::Tolerance,
    KERNEL_FILE, KERNEL_NAME, L, M, N, TILE_SIZE, WORK_PER_THREAD,
};

/// Parameters of one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    pub n: usize,
    pub l: usize,
    pub m: usize,
    pub tile_size: usize,
    pub work_per_thread: usize,
    pub kernel_path: PathBuf,
    pub kernel_name: String,
    /// Fixed RNG seed for reproducible operands; random when unset.
    pub seed: Option<u64>,
    pub tolerance: Tolerance,
    pub skip_parallel: bool,
    pub skip_naive: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            n: N,
            l: L,
            m: M,
            tile_size: TILE_SIZE,
            work_per_thread: WORK_PER_THREAD,
            kernel_path: PathBuf::from(KERNEL_FILE),
            kernel_name: KERNEL_NAME.to_string(),
            seed: None,
            tolerance: Tolerance::default(),
            skip_parallel: false,
            skip_naive: false,
        }
    }
}

impl BenchConfig {
    pub fn launch(&self) -> LaunchConfig {
        LaunchConfig {
            tile_size: self.tile_size,
            work_per_thread: self.work_per_thread,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.launch().validate(self.n, self.l, self.m)?;
        if self.kernel_name.trim().is_empty() {
            return Err(invalid_config("kernel name must not be empty"));
        }
        if !(self.tolerance.abs >= 0.0 && self.tolerance.rel >= 0.0) {
            return Err(invalid_config("tolerance must be non-negative"));
        }
        Ok(())
    }
}
