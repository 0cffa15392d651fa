//! End-to-end checks on a real OpenCL device.
//!
//! Each test returns early when the machine exposes no usable device, so the
//! suite stays green on hosts without an OpenCL driver.

#![cfg(feature = "opencl")]

use std::path::PathBuf;

use rand::{rngs::StdRng, SeedableRng};

use clmatbench::{
    bench::run_with,
    device::opencl::{DeviceHandle, Inventory, KernelRuntime},
    launch::LaunchConfig,
    program::KernelSource,
    reference::naive_matmul,
    verify::{compare, Tolerance},
    BenchConfig, BenchError, Matrix, KERNEL_FILE, KERNEL_NAME,
};

fn device() -> Option<DeviceHandle> {
    match Inventory::scan().and_then(|inventory| inventory.select()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("skipping: {e}");
            None
        }
    }
}

fn kernel_source() -> KernelSource {
    KernelSource::from_path(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(KERNEL_FILE)).unwrap()
}

#[test]
fn test_two_by_two_on_device() {
    let Some(handle) = device() else { return };
    let launch = LaunchConfig::new(2, 2).unwrap();
    let runtime = KernelRuntime::new(handle, &kernel_source(), KERNEL_NAME, launch).unwrap();

    let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
    let b = Matrix::from_rows(&[[5.0, 6.0], [7.0, 8.0]]).unwrap();
    let (c, timing) = runtime.multiply(&a, &b).unwrap();

    assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);
    assert!(timing.end_ns >= timing.start_ns);
}

#[test]
fn test_all_ones_on_device() {
    let Some(handle) = device() else { return };
    let launch = LaunchConfig::new(8, 2).unwrap();
    let runtime = KernelRuntime::new(handle, &kernel_source(), KERNEL_NAME, launch).unwrap();

    let (n, l, m) = (16, 24, 8);
    let a = Matrix::filled(n, l, 1.0);
    let b = Matrix::filled(l, m, 1.0);
    let (c, _) = runtime.multiply(&a, &b).unwrap();

    assert!(c.as_slice().iter().all(|&v| v == l as f32));
}

#[test]
fn test_random_product_matches_naive() {
    let Some(handle) = device() else { return };
    let launch = LaunchConfig::new(16, 4).unwrap();
    let runtime = KernelRuntime::new(handle, &kernel_source(), KERNEL_NAME, launch).unwrap();

    let mut rng = StdRng::seed_from_u64(11);
    let a = Matrix::random_integers(64, 48, &mut rng);
    let b = Matrix::random_integers(48, 32, &mut rng);
    let (c, _) = runtime.multiply(&a, &b).unwrap();

    let expected = naive_matmul(&a, &b).unwrap();
    let v = compare(&expected, &c, Tolerance::default()).unwrap();
    assert!(v.is_success(), "first mismatch: {:?}", v.first_mismatch);
}

#[test]
fn test_run_with_runtime() {
    let Some(handle) = device() else { return };
    let config = BenchConfig {
        n: 32,
        l: 32,
        m: 32,
        tile_size: 16,
        work_per_thread: 4,
        seed: Some(3),
        ..Default::default()
    };
    let runtime =
        KernelRuntime::new(handle, &kernel_source(), KERNEL_NAME, config.launch()).unwrap();
    let (a, b) = clmatbench::bench::make_operands(&config);

    let report = run_with(&runtime, &config, &a, &b).unwrap();
    assert!(report.is_success(), "{report}");
    assert_eq!(report.baselines.len(), 2);
}

#[test]
fn test_build_failure_surfaces_log() {
    let Some(handle) = device() else { return };
    let source = KernelSource::from_text(
        "__kernel void mul(__global float* c) { c[0] = undeclared_identifier; }",
    );

    match KernelRuntime::new(handle, &source, KERNEL_NAME, LaunchConfig::default()) {
        Err(BenchError::ProgramBuild { log }) => {
            assert!(!log.is_empty());
        }
        Err(other) => panic!("expected a build error, got {other}"),
        Ok(_) => panic!("broken source must not build"),
    }
}

#[test]
fn test_missing_entry_point() {
    let Some(handle) = device() else { return };
    let result = KernelRuntime::new(
        handle,
        &kernel_source(),
        "no_such_kernel",
        LaunchConfig::default(),
    );
    assert!(matches!(result, Err(BenchError::Device { .. })));
}
