//! Device inventory and selection.
//!
//! Selection works on plain [`DeviceProfile`] values. The `opencl` submodule
//! turns real platforms into profiles and maps the chosen profile back to a
//! handle.

use std::fmt;

use tracing::info;

use crate::error::{BenchError, Result};

#[cfg(feature = "opencl")]
pub mod opencl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Gpu,
    Cpu,
    Accelerator,
    Other,
}

/// What the benchmark needs to know about one enumerated device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub platform_index: usize,
    pub device_index: usize,
    pub name: String,
    pub kind: DeviceKind,
    /// Set when the device shares physical memory with the host.
    pub host_unified_memory: bool,
    pub hardware_version: String,
    pub driver_version: String,
    pub opencl_c_version: String,
    pub compute_units: u32,
    /// Maximum clock frequency in MHz.
    pub max_clock_mhz: u32,
}

impl DeviceProfile {
    /// Minimal profile with empty version strings, used by tests and callers
    /// that only care about selection.
    pub fn new(
        platform_index: usize,
        device_index: usize,
        name: impl Into<String>,
        kind: DeviceKind,
        host_unified_memory: bool,
    ) -> Self {
        Self {
            platform_index,
            device_index,
            name: name.into(),
            kind,
            host_unified_memory,
            hardware_version: String::new(),
            driver_version: String::new(),
            opencl_c_version: String::new(),
            compute_units: 0,
            max_clock_mhz: 0,
        }
    }
}

/// Device classes in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeviceTier {
    DiscreteGpu,
    IntegratedGpu,
    Cpu,
}

impl DeviceTier {
    pub const ALL: [DeviceTier; 3] = [Self::DiscreteGpu, Self::IntegratedGpu, Self::Cpu];

    // Lowest number == highest priority
    pub fn priority(self) -> usize {
        match self {
            Self::DiscreteGpu => 0,
            Self::IntegratedGpu => 1,
            Self::Cpu => 2,
        }
    }

    /// Whether `profile` qualifies for this tier. `IntegratedGpu` admits every
    /// GPU, discrete or not.
    pub fn admits(self, profile: &DeviceProfile) -> bool {
        match self {
            Self::DiscreteGpu => profile.kind == DeviceKind::Gpu && !profile.host_unified_memory,
            Self::IntegratedGpu => profile.kind == DeviceKind::Gpu,
            Self::Cpu => profile.kind == DeviceKind::Cpu,
        }
    }

    /// Best tier a profile belongs to, if any.
    pub fn classify(profile: &DeviceProfile) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.admits(profile))
    }
}

impl fmt::Display for DeviceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DiscreteGpu => "discrete GPU",
            Self::IntegratedGpu => "integrated GPU",
            Self::Cpu => "CPU",
        })
    }
}

/// Picks the first device of the best available tier.
///
/// Within a tier, platforms are searched in enumeration order and devices in
/// platform order.
pub fn select_device(profiles: &[DeviceProfile]) -> Result<(&DeviceProfile, DeviceTier)> {
    // min_by_key keeps the first of equally ranked devices.
    let (profile, tier) = profiles
        .iter()
        .filter_map(|p| DeviceTier::classify(p).map(|tier| (p, tier)))
        .min_by_key(|(_, tier)| tier.priority())
        .ok_or(BenchError::NoSuitableDevice)?;
    info!(device = %profile.name, %tier, "found suitable device");
    Ok((profile, tier))
}

/// Platform name and the profiles of its devices, in enumeration order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformInventory {
    pub name: String,
    pub devices: Vec<DeviceProfile>,
}

/// Renders the inventory the way the benchmark prints it at startup.
pub fn format_inventory(platforms: &[PlatformInventory]) -> String {
    let mut out = format!("Platforms num: {}\n", platforms.len());
    for (i, platform) in platforms.iter().enumerate() {
        out += &format!("{}. Platform: {}\n", i + 1, platform.name);
        for (j, d) in platform.devices.iter().enumerate() {
            let (p, q) = (i + 1, j + 1);
            out += &format!(" {p}.{q}. Device: {}\n", d.name);
            out += &format!("  {p}.{q}.1 Hardware version: {}\n", d.hardware_version);
            out += &format!("  {p}.{q}.2 Software version: {}\n", d.driver_version);
            out += &format!("  {p}.{q}.3 OpenCL C version: {}\n", d.opencl_c_version);
            out += &format!("  {p}.{q}.4 Parallel compute units: {}\n", d.compute_units);
            out += &format!("  {p}.{q}.5 Max clock frequency: {}\n", d.max_clock_mhz);
        }
    }
    out
}

/// Flattens an inventory into selection order, failing if there are no
/// platforms at all.
pub fn flatten_inventory(platforms: &[PlatformInventory]) -> Result<Vec<DeviceProfile>> {
    if platforms.is_empty() {
        return Err(BenchError::NoPlatform);
    }
    Ok(platforms
        .iter()
        .flat_map(|p| p.devices.iter().cloned())
        .collect())
}
