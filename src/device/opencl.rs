//! OpenCL backend: platform enumeration, program build and kernel dispatch.

use ocl::{
    core,
    enums::{DeviceInfo, DeviceInfoResult, PlatformInfo, ProfilingInfo, ProfilingInfoResult},
    flags::{CommandQueueProperties, DeviceType, MemFlags},
    Buffer, Context, Device, Event, Kernel, Platform, Program, Queue,
};
use tracing::{debug, info, warn};

use super::{
    flatten_inventory, format_inventory, select_device, DeviceKind, DeviceProfile, DeviceTier,
    PlatformInventory,
};
use crate::{
    error::{device_error, dimension_mismatch, BenchError, Result},
    launch::{kernel_dim, LaunchConfig},
    matrix::Matrix,
    program::KernelSource,
    timing::TimingSample,
};

/// Enumerated platforms with their devices, plus the printable summary.
pub struct Inventory {
    handles: Vec<(Platform, Vec<Device>)>,
    summary: Vec<PlatformInventory>,
}

impl Inventory {
    /// Queries every platform and all of its devices.
    ///
    /// A platform whose device query fails is listed without devices rather
    /// than aborting the scan.
    pub fn scan() -> Result<Self> {
        let ids = core::get_platform_ids().map_err(|e| {
            warn!("can't get platform ids: {e}");
            BenchError::NoPlatform
        })?;

        let mut handles = Vec::with_capacity(ids.len());
        let mut summary = Vec::with_capacity(ids.len());

        for (i, id) in ids.into_iter().enumerate() {
            let platform = Platform::new(id);
            let name = platform
                .info(PlatformInfo::Name)
                .map(|r| r.to_string())
                .unwrap_or_default();

            let devices = match Device::list(platform.clone(), Some(DeviceType::ALL)) {
                Ok(devices) => devices,
                Err(e) => {
                    warn!(platform = %name, "can't list devices: {e}");
                    Vec::new()
                }
            };

            let profiles = devices
                .iter()
                .enumerate()
                .map(|(j, device)| profile(i, j, device))
                .collect();

            handles.push((platform, devices));
            summary.push(PlatformInventory {
                name,
                devices: profiles,
            });
        }

        Ok(Self { handles, summary })
    }

    /// Human readable listing of platforms and devices.
    pub fn render(&self) -> String {
        format_inventory(&self.summary)
    }

    /// Selects the preferred device: discrete GPU, integrated GPU, then CPU.
    pub fn select(&self) -> Result<DeviceHandle> {
        let profiles = flatten_inventory(&self.summary)?;
        let (profile, tier) = select_device(&profiles)?;
        let (platform, devices) = &self.handles[profile.platform_index];

        Ok(DeviceHandle {
            platform: platform.clone(),
            device: devices[profile.device_index].clone(),
            profile: profile.clone(),
            tier,
        })
    }
}

fn info_string(device: &Device, kind: DeviceInfo) -> String {
    match device.info(kind) {
        Ok(result) => result.to_string(),
        Err(e) => {
            debug!("device info unavailable: {e}");
            String::new()
        }
    }
}

fn profile(platform_index: usize, device_index: usize, device: &Device) -> DeviceProfile {
    let kind = match device.info(DeviceInfo::Type) {
        Ok(DeviceInfoResult::Type(t)) if t.contains(DeviceType::GPU) => DeviceKind::Gpu,
        Ok(DeviceInfoResult::Type(t)) if t.contains(DeviceType::CPU) => DeviceKind::Cpu,
        Ok(DeviceInfoResult::Type(t)) if t.contains(DeviceType::ACCELERATOR) => {
            DeviceKind::Accelerator
        }
        _ => DeviceKind::Other,
    };

    let host_unified_memory = matches!(
        device.info(DeviceInfo::HostUnifiedMemory),
        Ok(DeviceInfoResult::HostUnifiedMemory(true))
    );

    let compute_units = match device.info(DeviceInfo::MaxComputeUnits) {
        Ok(DeviceInfoResult::MaxComputeUnits(units)) => units,
        _ => 0,
    };

    let max_clock_mhz = match device.info(DeviceInfo::MaxClockFrequency) {
        Ok(DeviceInfoResult::MaxClockFrequency(mhz)) => mhz,
        _ => 0,
    };

    DeviceProfile {
        platform_index,
        device_index,
        name: info_string(device, DeviceInfo::Name),
        kind,
        host_unified_memory,
        hardware_version: info_string(device, DeviceInfo::Version),
        driver_version: info_string(device, DeviceInfo::DriverVersion),
        opencl_c_version: info_string(device, DeviceInfo::OpenclCVersion),
        compute_units,
        max_clock_mhz,
    }
}

/// The device chosen for a run.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    platform: Platform,
    device: Device,
    profile: DeviceProfile,
    tier: DeviceTier,
}

impl DeviceHandle {
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn tier(&self) -> DeviceTier {
        self.tier
    }
}

/// Context, profiling queue and compiled kernel for one device.
///
/// All OpenCL objects are released when the runtime is dropped.
pub struct KernelRuntime {
    handle: DeviceHandle,
    launch: LaunchConfig,
    queue: Queue,
    kernel: Kernel,
    // Kept alive for the kernel's lifetime.
    _program: Program,
    _context: Context,
}

impl KernelRuntime {
    pub fn new(
        handle: DeviceHandle,
        source: &KernelSource,
        kernel_name: &str,
        launch: LaunchConfig,
    ) -> Result<Self> {
        let context = Context::builder()
            .platform(handle.platform.clone())
            .devices(handle.device.clone())
            .build()
            .map_err(|e| device_error("can't create context", e))?;

        let queue = Queue::new(
            &context,
            handle.device.clone(),
            Some(CommandQueueProperties::PROFILING_ENABLE),
        )
        .map_err(|e| device_error("can't create queue", e))?;

        let program = build_program(&context, &handle, source, launch)?;

        let kernel = Kernel::builder()
            .program(&program)
            .name(kernel_name)
            .queue(queue.clone())
            .arg_named("a", None::<&Buffer<f32>>)
            .arg_named("b", None::<&Buffer<f32>>)
            .arg_named("c", None::<&Buffer<f32>>)
            .arg_named("n", 0u32)
            .arg_named("l", 0u32)
            .arg_named("m", 0u32)
            .build()
            .map_err(|e| device_error("can't create a kernel", e))?;
        info!(kernel = kernel_name, "kernel successfully created");

        Ok(Self {
            handle,
            launch,
            queue,
            kernel,
            _program: program,
            _context: context,
        })
    }

    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    /// Computes `a * b` on the device and returns the product with the
    /// kernel's profiling timestamps.
    pub fn multiply(&self, a: &Matrix, b: &Matrix) -> Result<(Matrix, TimingSample)> {
        if a.cols() != b.rows() {
            return Err(dimension_mismatch(format!(
                "can't multiply {}x{} by {}x{}",
                a.rows(),
                a.cols(),
                b.rows(),
                b.cols()
            )));
        }
        let (n, l, m) = (a.rows(), a.cols(), b.cols());
        self.launch.validate(n, l, m)?;

        let mem_a = self.buffer(MemFlags::READ_ONLY, n * l)?;
        let mem_b = self.buffer(MemFlags::READ_ONLY, l * m)?;
        let mem_c = self.buffer(MemFlags::WRITE_ONLY, n * m)?;
        debug!("buffers created");

        // SAFETY: the host slices outlive the queue's blocking read below,
        // which cannot start before these in-order writes complete.
        unsafe {
            mem_a
                .write(a.as_slice())
                .block(false)
                .enq()
                .map_err(|e| device_error("can't write in the buffers", e))?;
            mem_b
                .write(b.as_slice())
                .block(false)
                .enq()
                .map_err(|e| device_error("can't write in the buffers", e))?;
        }

        let set = |name: &'static str, r: ocl::Result<()>| {
            r.map_err(|e| device_error("can't set kernel args", format!("{name}: {e}")))
        };
        set("a", self.kernel.set_arg("a", &mem_a))?;
        set("b", self.kernel.set_arg("b", &mem_b))?;
        set("c", self.kernel.set_arg("c", &mem_c))?;
        set("n", self.kernel.set_arg("n", kernel_dim("n", n)?))?;
        set("l", self.kernel.set_arg("l", kernel_dim("l", l)?))?;
        set("m", self.kernel.set_arg("m", kernel_dim("m", m)?))?;

        let global = self.launch.global_work_size(n, m);
        let local = self.launch.local_work_size();
        debug!(?global, ?local, "enqueue range");

        let mut event = Event::empty();
        // SAFETY: all six arguments are bound to live buffers sized for the
        // validated launch geometry.
        unsafe {
            self.kernel
                .cmd()
                .global_work_size(global)
                .local_work_size(local)
                .enew(&mut event)
                .enq()
                .map_err(|e| device_error("can't enqueue range", e))?;
        }

        let mut result = vec![0.0f32; n * m];
        mem_c
            .read(&mut result)
            .enq()
            .map_err(|e| device_error("can't enqueue read buffer", e))?;
        self.queue
            .finish()
            .map_err(|e| device_error("can't finish queue", e))?;

        let timing = profiling_sample(&event)?;
        Ok((Matrix::from_vec(n, m, result)?, timing))
    }

    fn buffer(&self, flags: MemFlags, len: usize) -> Result<Buffer<f32>> {
        Buffer::<f32>::builder()
            .queue(self.queue.clone())
            .flags(flags)
            .len(len)
            .build()
            .map_err(|e| device_error("can't create buffers", e))
    }
}

fn build_program(
    context: &Context,
    handle: &DeviceHandle,
    source: &KernelSource,
    launch: LaunchConfig,
) -> Result<Program> {
    info!(options = %launch.build_options()?, "building program");

    let mut builder = Program::builder();
    builder.src(source.text()).devices(handle.device.clone());
    for (name, value) in launch.build_defines()? {
        builder.cmplr_def(name, value);
    }

    match builder.build(context) {
        Ok(program) => {
            info!("build finished");
            Ok(program)
        }
        // The driver's error text carries the compiler log.
        Err(e) => Err(BenchError::ProgramBuild { log: e.to_string() }),
    }
}

fn profiling_sample(event: &Event) -> Result<TimingSample> {
    event
        .wait_for()
        .map_err(|e| device_error("can't wait for kernel event", e))?;

    let start = match event.profiling_info(ProfilingInfo::Start) {
        Ok(ProfilingInfoResult::Start(ns)) => ns,
        Ok(other) => return Err(device_error("unexpected profiling info", format!("{other:?}"))),
        Err(e) => return Err(device_error("can't read profiling start", e)),
    };
    let end = match event.profiling_info(ProfilingInfo::End) {
        Ok(ProfilingInfoResult::End(ns)) => ns,
        Ok(other) => return Err(device_error("unexpected profiling info", format!("{other:?}"))),
        Err(e) => return Err(device_error("can't read profiling end", e)),
    };

    Ok(TimingSample::new(start, end))
}
