//! Tiled OpenCL matrix multiplication benchmark.
//!
//! Multiplies an `N x L` matrix by an `L x M` matrix on the best OpenCL device
//! available (discrete GPU, then integrated GPU, then CPU), times the kernel
//! with event profiling, and checks the result against a rayon-parallel and a
//! naive CPU implementation.

pub mod bench;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod launch;
pub mod logging;
pub mod matrix;
pub mod program;
pub mod reference;
pub mod report;
pub mod timing;
pub mod verify;

pub const N: usize = 2048;
pub const L: usize = 512;
pub const M: usize = 1024;

pub const TILE_SIZE: usize = 32;
pub const WORK_PER_THREAD: usize = 16;

/// Inner-dimension block used by the parallel CPU baseline.
pub const KC: usize = 256;

pub const KERNEL_FILE: &str = "kernels/matrices_mul_local.cl";
pub const KERNEL_NAME: &str = "mul";

pub use config::BenchConfig;
pub use error::{BenchError, Result};
pub use matrix::Matrix;
