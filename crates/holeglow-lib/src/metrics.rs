//! Host health metrics: CPU, memory, root disk and SoC temperature.
//!
//! CPU/memory/disk come from `sysinfo`. Temperature comes from
//! `vcgencmd measure_temp` on a Raspberry Pi, falling back to the kernel
//! thermal zone; an unreadable sensor reports 0.0 rather than failing the
//! whole sample.

use std::fmt;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use sysinfo::{Disks, System};

use crate::snapshot::SystemReport;

/// Window over which CPU usage is averaged.
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

// ── Error type ──

#[derive(Debug, Clone, PartialEq)]
pub enum MetricsError {
    Unavailable(String),
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::Unavailable(e) => write!(f, "System metrics unavailable: {e}"),
        }
    }
}

impl std::error::Error for MetricsError {}

pub type Result<T> = std::result::Result<T, MetricsError>;

// ── Trait ──

/// Source of host health readings.
pub trait MetricsSource {
    /// Take one sample. May block for the CPU sampling window.
    fn sample(&mut self) -> Result<SystemReport>;
}

// ── Parsing helpers ──

/// Parse `vcgencmd measure_temp` output, e.g. `temp=48.3'C`.
pub fn parse_vcgencmd_temp(output: &str) -> Option<f64> {
    let value = output.trim().strip_prefix("temp=")?;
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

/// Parse a sysfs thermal zone reading in millidegrees, e.g. `48312`.
pub fn parse_sysfs_temp(contents: &str) -> Option<f64> {
    contents
        .trim()
        .parse::<i64>()
        .ok()
        .map(|milli| milli as f64 / 1000.0)
}

/// `used / total` as a percentage; `None` when `total` is zero.
pub fn percent_used(used: u64, total: u64) -> Option<f64> {
    (total > 0).then(|| used as f64 / total as f64 * 100.0)
}

/// Root disk usage from sysinfo's figures.
///
/// sysinfo only reports space available to unprivileged users, so blocks
/// reserved for root count as used. On ext4 with the default 5% reserve
/// this reads about five points above `df`'s "Use%".
pub fn disk_used_percent(total: u64, available: u64) -> Option<f64> {
    percent_used(total.saturating_sub(available), total)
}

fn vcgencmd_temp() -> Option<f64> {
    let out = Command::new("vcgencmd").arg("measure_temp").output().ok()?;
    if !out.status.success() {
        return None;
    }
    parse_vcgencmd_temp(&String::from_utf8_lossy(&out.stdout))
}

fn sysfs_temp(path: &Path) -> Option<f64> {
    parse_sysfs_temp(&std::fs::read_to_string(path).ok()?)
}

/// Best-effort SoC temperature in °C; 0.0 when no sensor answers.
pub fn read_temperature() -> f64 {
    temperature_from(vcgencmd_temp, Path::new(THERMAL_ZONE))
}

fn temperature_from(primary: impl FnOnce() -> Option<f64>, zone: &Path) -> f64 {
    primary()
        .or_else(|| sysfs_temp(zone))
        .unwrap_or_else(|| {
            log::debug!("[metrics] no temperature sensor readable, reporting 0.0");
            0.0
        })
}

// ── sysinfo backend ──

/// Live metrics for the local host.
pub struct HostMetrics {
    system: System,
    cpu_window: Duration,
}

impl HostMetrics {
    pub fn new() -> Self {
        Self::with_cpu_window(CPU_SAMPLE_WINDOW)
    }

    pub fn with_cpu_window(cpu_window: Duration) -> Self {
        Self {
            system: System::new(),
            cpu_window: cpu_window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    fn cpu_percent(&mut self) -> f64 {
        // Usage is a delta between two refreshes.
        self.system.refresh_cpu();
        std::thread::sleep(self.cpu_window);
        self.system.refresh_cpu();
        self.system.global_cpu_info().cpu_usage() as f64
    }

    fn memory_percent(&mut self) -> Result<f64> {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        let used = total.saturating_sub(self.system.available_memory());
        percent_used(used, total)
            .ok_or_else(|| MetricsError::Unavailable("total memory reported as 0".into()))
    }

    fn disk_percent(&self) -> Result<f64> {
        let disks = Disks::new_with_refreshed_list();
        let root = disks
            .list()
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .ok_or_else(|| MetricsError::Unavailable("no filesystem mounted at /".into()))?;
        disk_used_percent(root.total_space(), root.available_space())
            .ok_or_else(|| MetricsError::Unavailable("root filesystem reports 0 bytes".into()))
    }
}

impl Default for HostMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for HostMetrics {
    fn sample(&mut self) -> Result<SystemReport> {
        let cpu_percent = self.cpu_percent();
        let memory_percent = self.memory_percent()?;
        let disk_percent = self.disk_percent()?;
        Ok(SystemReport {
            cpu_percent,
            memory_percent,
            temperature: read_temperature(),
            disk_percent,
        })
    }
}

// ── Scripted source for testing ──

#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;

    /// Returns queued samples in order; the last one repeats forever.
    pub struct ScriptedMetrics {
        samples: VecDeque<Result<SystemReport>>,
        pub samples_taken: usize,
    }

    impl ScriptedMetrics {
        pub fn sequence(samples: Vec<Result<SystemReport>>) -> Self {
            assert!(!samples.is_empty(), "script needs at least one sample");
            Self {
                samples: samples.into(),
                samples_taken: 0,
            }
        }

        pub fn always(sample: Result<SystemReport>) -> Self {
            Self::sequence(vec![sample])
        }
    }

    impl MetricsSource for ScriptedMetrics {
        fn sample(&mut self) -> Result<SystemReport> {
            self.samples_taken += 1;
            let next = if self.samples.len() > 1 {
                self.samples.pop_front()
            } else {
                self.samples.front().cloned()
            };
            next.unwrap_or_else(|| Err(MetricsError::Unavailable("script exhausted".into())))
        }
    }
}
