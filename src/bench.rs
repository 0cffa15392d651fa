//! Benchmark orchestration.
//!
//! A run builds the operands, multiplies them on a [`MatmulDevice`], and
//! checks the product against the enabled CPU baselines. [`run`] wires this
//! to the OpenCL device picked from the local inventory.

use chrono::Local;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};

use crate::{
    config::BenchConfig,
    error::Result,
    matrix::Matrix,
    report::BenchReport,
    timing::TimingSample,
    verify::{verify_against, Baseline, BaselineOutcome},
};

/// Anything that can compute a timed matrix product.
pub trait MatmulDevice {
    fn name(&self) -> &str;

    fn multiply(&self, a: &Matrix, b: &Matrix) -> Result<(Matrix, TimingSample)>;
}

#[cfg(feature = "opencl")]
impl MatmulDevice for crate::device::opencl::KernelRuntime {
    fn name(&self) -> &str {
        &self.handle().profile().name
    }

    fn multiply(&self, a: &Matrix, b: &Matrix) -> Result<(Matrix, TimingSample)> {
        crate::device::opencl::KernelRuntime::multiply(self, a, b)
    }
}

/// Random integer-valued operands of the configured shape.
pub fn make_operands(config: &BenchConfig) -> (Matrix, Matrix) {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let a = Matrix::random_integers(config.n, config.l, &mut rng);
    let b = Matrix::random_integers(config.l, config.m, &mut rng);
    (a, b)
}

/// Baselines enabled by `config`, parallel first.
pub fn baselines(config: &BenchConfig) -> Vec<Baseline> {
    let mut out = Vec::with_capacity(2);
    if !config.skip_parallel {
        out.push(Baseline::Parallel);
    }
    if !config.skip_naive {
        out.push(Baseline::Naive);
    }
    out
}

/// Multiplies `a * b` on `device` and verifies the product.
///
/// Verification failures are recorded in the report rather than returned as
/// errors, so the caller can print timings before failing.
pub fn run_with<D: MatmulDevice + ?Sized>(
    device: &D,
    config: &BenchConfig,
    a: &Matrix,
    b: &Matrix,
) -> Result<BenchReport> {
    config.validate()?;
    let started_at = Local::now();

    let (result, timing) = device.multiply(a, b)?;
    info!(
        device = device.name(),
        elapsed_ms = timing.elapsed_ms(),
        "kernel finished"
    );

    let mut outcomes: Vec<BaselineOutcome> = Vec::new();
    for baseline in baselines(config) {
        info!(%baseline, "verification...");
        let outcome = verify_against(baseline, a, b, &result, config.tolerance)?;
        if !outcome.verification.is_success() {
            warn!(
                %baseline,
                mismatches = outcome.verification.mismatches,
                "something went wrong"
            );
        }
        outcomes.push(outcome);
    }

    Ok(BenchReport {
        started_at,
        device_name: device.name().to_string(),
        dims: (a.rows(), a.cols(), b.cols()),
        launch: config.launch(),
        timing,
        baselines: outcomes,
    })
}

/// Full run: inventory, device selection, program build, dispatch and
/// verification on the local OpenCL installation.
#[cfg(feature = "opencl")]
pub fn run(config: &BenchConfig) -> Result<BenchReport> {
    use crate::{
        device::opencl::{Inventory, KernelRuntime},
        program::KernelSource,
    };

    config.validate()?;

    let inventory = Inventory::scan()?;
    println!("{}", inventory.render());

    let handle = inventory.select()?;
    println!(
        "Found suitable device ({}). Device name: {}",
        handle.tier(),
        handle.profile().name
    );

    let source = KernelSource::from_path(&config.kernel_path)?;
    let runtime = KernelRuntime::new(handle, &source, &config.kernel_name, config.launch())?;

    let (a, b) = make_operands(config);
    run_with(&runtime, config, &a, &b)
}
