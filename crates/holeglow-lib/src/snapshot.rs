//! Poll-cycle data: what the status API and the host reported this cycle.
//!
//! Each half of a [`Snapshot`] is an `Option`: `None` means the poll
//! failed, which is a different thing from a successful reading of zero.

use std::fmt;

use serde::Serialize;

use crate::metrics::MetricsError;
use crate::status::StatusError;

/// Blocking state reported by the ad-blocker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockerState {
    Enabled,
    Disabled,
    /// Missing or unrecognised status string.
    Unknown,
}

impl BlockerState {
    pub fn from_status(s: &str) -> Self {
        match s.trim() {
            s if s.eq_ignore_ascii_case("enabled") => BlockerState::Enabled,
            s if s.eq_ignore_ascii_case("disabled") => BlockerState::Disabled,
            _ => BlockerState::Unknown,
        }
    }
}

impl fmt::Display for BlockerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockerState::Enabled => write!(f, "enabled"),
            BlockerState::Disabled => write!(f, "disabled"),
            BlockerState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Status and daily statistics of the ad-blocker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub state: BlockerState,
    pub domains_blocked: u64,
    pub queries_today: u64,
    pub blocked_today: u64,
    pub percent_blocked: f64,
    pub clients: u64,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Queries: {} | Blocked: {} ({:.1}%)",
            self.state, self.queries_today, self.blocked_today, self.percent_blocked
        )
    }
}

/// Host health readings. `temperature` is 0.0 when no sensor could be read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemReport {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub temperature: f64,
    pub disk_percent: f64,
}

impl fmt::Display for SystemReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CPU {:.1}% | Memory {:.1}% | Temp {:.1}°C | Disk {:.1}%",
            self.cpu_percent, self.memory_percent, self.temperature, self.disk_percent
        )
    }
}

/// One poll cycle's combined readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub status: Option<StatusReport>,
    pub metrics: Option<SystemReport>,
}

impl Snapshot {
    pub fn new(status: Option<StatusReport>, metrics: Option<SystemReport>) -> Self {
        Self { status, metrics }
    }

    /// Build a snapshot from raw poll results, logging each failure.
    pub fn from_polls(
        status: Result<StatusReport, StatusError>,
        metrics: Result<SystemReport, MetricsError>,
    ) -> Self {
        let status = match status {
            Ok(report) => Some(report),
            Err(e) => {
                log::warn!("[status] poll failed: {e}");
                None
            }
        };
        let metrics = match metrics {
            Ok(report) => Some(report),
            Err(e) => {
                log::warn!("[metrics] poll failed: {e}");
                None
            }
        };
        Self { status, metrics }
    }
}
