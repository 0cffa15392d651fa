//! Launch geometry of the tiled kernel.
//!
//! Each work-group computes one `TILE_SIZE x TILE_SIZE` tile of `C`. A
//! work-item owns one column of that tile and `WORK_PER_THREAD` of its rows,
//! so a group holds `TILE_SIZE / WORK_PER_THREAD` by `TILE_SIZE` work-items.

use std::mem::size_of;

use crate::{
    error::{invalid_config, Result},
    TILE_SIZE, WORK_PER_THREAD,
};

/// Converts a matrix dimension to the kernel's `uint` argument type.
pub fn kernel_dim(name: &str, dim: usize) -> Result<u32> {
    u32::try_from(dim).map_err(|_| {
        invalid_config(format!(
            "dimension {name}={dim} exceeds the kernel limit of {}",
            u32::MAX
        ))
    })
}

fn define_value(name: &str, value: usize) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| invalid_config(format!("{name}={value} does not fit a compiler define")))
}

/// Element count of a `rows x cols` f32 buffer, rejecting sizes whose byte
/// length overflows `usize`.
fn buffer_len(operand: &str, rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .filter(|len| len.checked_mul(size_of::<f32>()).is_some())
        .ok_or_else(|| {
            invalid_config(format!(
                "{operand} of {rows}x{cols} elements overflows the address space"
            ))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub tile_size: usize,
    pub work_per_thread: usize,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            work_per_thread: WORK_PER_THREAD,
        }
    }
}

impl LaunchConfig {
    pub fn new(tile_size: usize, work_per_thread: usize) -> Result<Self> {
        let config = Self {
            tile_size,
            work_per_thread,
        };
        config.check_tiling()?;
        Ok(config)
    }

    fn check_tiling(&self) -> Result<()> {
        if self.tile_size == 0 || self.work_per_thread == 0 {
            return Err(invalid_config(
                "tile size and work per thread must be positive",
            ));
        }
        define_value("TILE_SIZE", self.tile_size)?;
        if self.tile_size % self.work_per_thread != 0 {
            return Err(invalid_config(format!(
                "tile size {} is not a multiple of work per thread {}",
                self.tile_size, self.work_per_thread
            )));
        }
        Ok(())
    }

    /// Checks that an `n x l` by `l x m` product maps onto whole tiles.
    ///
    /// The kernel does no bounds checking, so every dimension must be a
    /// multiple of the tile size. Dimensions must also fit the kernel's
    /// `uint` arguments, and every operand must be addressable on the host.
    pub fn validate(&self, n: usize, l: usize, m: usize) -> Result<()> {
        self.check_tiling()?;
        for (name, dim) in [("n", n), ("l", l), ("m", m)] {
            if dim == 0 {
                return Err(invalid_config(format!("dimension {name} must be positive")));
            }
            kernel_dim(name, dim)?;
            if dim % self.tile_size != 0 {
                return Err(invalid_config(format!(
                    "dimension {name}={dim} is not a multiple of tile size {}",
                    self.tile_size
                )));
            }
        }
        buffer_len("A", n, l)?;
        buffer_len("B", l, m)?;
        buffer_len("C", n, m)?;
        Ok(())
    }

    /// Total work-items: `[n / WPT, m]`.
    #[inline]
    pub fn global_work_size(&self, n: usize, m: usize) -> [usize; 2] {
        [n / self.work_per_thread, m]
    }

    /// Work-items per group: `[TS / WPT, TS]`.
    #[inline]
    pub fn local_work_size(&self) -> [usize; 2] {
        [self.tile_size / self.work_per_thread, self.tile_size]
    }

    /// Preprocessor defines passed to the OpenCL compiler.
    pub fn build_defines(&self) -> Result<[(&'static str, i32); 2]> {
        Ok([
            ("TILE_SIZE", define_value("TILE_SIZE", self.tile_size)?),
            (
                "WORK_PER_THREAD",
                define_value("WORK_PER_THREAD", self.work_per_thread)?,
            ),
        ])
    }

    /// Compiler option string, e.g. `-D TILE_SIZE=32 -D WORK_PER_THREAD=16`.
    pub fn build_options(&self) -> Result<String> {
        Ok(self
            .build_defines()?
            .iter()
            .map(|(name, value)| format!("-D {name}={value}"))
            .collect::<Vec<_>>()
            .join(" "))
    }
}
