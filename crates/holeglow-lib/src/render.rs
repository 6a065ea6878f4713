//! Snapshot → light sequences.
//!
//! One display per configured arm: ad-blocker status, system health and
//! network activity. Every function here is pure; the monitor plays the
//! returned [`Sequence`]s in order.

use std::time::Duration;

use crate::config::Config;
use crate::led::{MAX_INTENSITY, Sequence, clamp_count, clamp_level, pattern, scaled};
use crate::snapshot::{BlockerState, Snapshot, StatusReport, SystemReport};

/// On/off cadence of the "status unavailable" flash.
pub const ERROR_FLASH_STEP: Duration = Duration::from_millis(300);

/// Number of "status unavailable" flashes.
pub const ERROR_FLASHES: usize = 3;

/// Gap between two colors inside one display.
pub const INTRA_DISPLAY_HOLD: Duration = Duration::from_millis(100);

/// Pause the monitor leaves between consecutive displays.
pub const INTER_DISPLAY_PAUSE: Duration = Duration::from_millis(500);

/// Minimum visible level for each display.
const STATUS_FLOOR: u8 = 20;
const METRIC_FLOOR: u8 = 10;

/// Queries per intensity step on the network arm.
const QUERIES_PER_STEP: u64 = 100;
const BLOCKED_PER_STEP: u64 = 50;

/// Ad-blocker status on the status arm.
///
/// The arm is cleared first in every case. Missing status flashes the
/// error color at full, unscaled intensity.
pub fn status_display(status: Option<&StatusReport>, config: &Config) -> Sequence {
    let arm = config.led_mapping.pihole_status_arm;
    let colors = &config.colors;
    let mut seq = Sequence::new();
    seq.arm(arm, 0);

    match status {
        None => {
            seq.extend(pattern::flash_color(
                colors.pihole_error,
                MAX_INTENSITY,
                ERROR_FLASHES,
                ERROR_FLASH_STEP,
            ));
        }
        Some(report) if report.state == BlockerState::Enabled => {
            let level = clamp_level(report.percent_blocked * 2.0, STATUS_FLOOR, MAX_INTENSITY);
            seq.color(colors.pihole_enabled, scaled(level, config.brightness_scale));
        }
        Some(_) => {
            seq.color(
                colors.pihole_disabled,
                scaled(MAX_INTENSITY, config.brightness_scale),
            );
        }
    }
    seq
}

/// Host health on the health arm, first match wins: critical temperature,
/// warning temperature, then CPU followed by memory.
///
/// Empty when metrics are missing or system monitoring is off. The arm is
/// not cleared, so a temperature alert is a single write.
pub fn health_display(metrics: Option<&SystemReport>, config: &Config) -> Sequence {
    let mut seq = Sequence::new();
    let Some(m) = metrics else {
        return seq;
    };
    if !config.features.enable_system_monitoring {
        return seq;
    }
    let colors = &config.colors;
    let scale = config.brightness_scale;
    let watch_temp = config.features.enable_temperature_monitoring;

    if watch_temp && m.temperature > config.temperature_critical {
        seq.color(colors.temperature_critical, scaled(MAX_INTENSITY, scale));
    } else if watch_temp && m.temperature > config.temperature_warning {
        seq.color(colors.temperature_warning, scaled(80, scale));
    } else {
        let cpu = clamp_level(m.cpu_percent, METRIC_FLOOR, MAX_INTENSITY);
        let mem = clamp_level(m.memory_percent, METRIC_FLOOR, MAX_INTENSITY);
        seq.color(colors.cpu_usage, scaled(cpu, scale))
            .hold(INTRA_DISPLAY_HOLD)
            .color(colors.memory_usage, scaled(mem, scale));
    }
    seq
}

/// Query volume on the network arm. Empty when status is missing or
/// network monitoring is off.
pub fn network_display(status: Option<&StatusReport>, config: &Config) -> Sequence {
    let mut seq = Sequence::new();
    let Some(report) = status else {
        return seq;
    };
    if !config.features.enable_network_monitoring {
        return seq;
    }
    let colors = &config.colors;
    let scale = config.brightness_scale;
    seq.arm(config.led_mapping.network_activity_arm, 0);

    if report.queries_today > 0 {
        let level = clamp_count(
            report.queries_today / QUERIES_PER_STEP,
            METRIC_FLOOR,
            MAX_INTENSITY,
        );
        seq.color(colors.network_queries, scaled(level, scale))
            .hold(INTRA_DISPLAY_HOLD);
        if report.blocked_today > 0 {
            let level = clamp_count(
                report.blocked_today / BLOCKED_PER_STEP,
                METRIC_FLOOR,
                MAX_INTENSITY,
            );
            seq.color(colors.blocked_queries, scaled(level, scale));
        }
    }
    seq
}

/// All three displays of a snapshot, in play order.
pub fn displays(snapshot: &Snapshot, config: &Config) -> [Sequence; 3] {
    [
        status_display(snapshot.status.as_ref(), config),
        health_display(snapshot.metrics.as_ref(), config),
        network_display(snapshot.status.as_ref(), config),
    ]
}
