//! Error types for benchmark runs.
//!
//! OpenCL calls, kernel source reads and verification all report failure
//! through [`BenchError`].

use std::path::PathBuf;

use thiserror::Error;

/// A single cell where the device result disagrees with a CPU baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub row: usize,
    pub col: usize,
    pub expected: f32,
    pub found: f32,
}

/// Errors that can occur while running a benchmark.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The OpenCL ICD reported no platforms at all.
    #[error("no OpenCL platforms available")]
    NoPlatform,

    /// Platforms exist but none exposes a GPU or CPU device.
    #[error("no suitable devices found")]
    NoSuitableDevice,

    /// The kernel source file could not be read.
    #[error("can't read kernel source {}: {message}", path.display())]
    KernelSource {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error text.
        message: String,
    },

    /// The OpenCL compiler rejected the program.
    #[error("program build failed:\n{log}")]
    ProgramBuild {
        /// Build log reported by the compiler.
        log: String,
    },

    /// Run parameters are inconsistent with the kernel's launch geometry.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Operand shapes do not allow multiplication.
    #[error("dimension mismatch: {message}")]
    DimensionMismatch { message: String },

    /// An OpenCL API call failed.
    #[error("{context}: {message}")]
    Device {
        /// The step that failed, e.g. "can't create queue".
        context: &'static str,
        /// Error text reported by the driver.
        message: String,
    },

    /// The device result disagrees with a CPU baseline.
    #[error(
        "{baseline} verification failed: {mismatches} mismatching cells{}",
        first.map(|m| format!(
            ", first at [{}][{}] (expected {}, found {})",
            m.row, m.col, m.expected, m.found
        )).unwrap_or_default()
    )]
    VerificationFailed {
        baseline: &'static str,
        mismatches: usize,
        first: Option<Mismatch>,
    },
}

/// Result type alias for benchmark operations.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Creates a configuration error.
pub fn invalid_config(message: impl Into<String>) -> BenchError {
    BenchError::InvalidConfig {
        message: message.into(),
    }
}

/// Creates a shape error.
pub fn dimension_mismatch(message: impl Into<String>) -> BenchError {
    BenchError::DimensionMismatch {
        message: message.into(),
    }
}

/// Wraps a driver error with the step that produced it.
pub fn device_error(context: &'static str, err: impl std::fmt::Display) -> BenchError {
    BenchError::Device {
        context,
        message: err.to_string(),
    }
}
