//! `test` subcommand: pre-check, show one poll's displays, hold, turn off.

use std::path::Path;
use std::time::Duration;

use holeglow_lib::metrics::HostMetrics;
use holeglow_lib::monitor::{self, LightsOut, Monitor};
use holeglow_lib::snapshot::Snapshot;

use super::{Precheck, RUNNING, Result, ThreadPacer, kv, kv_indent, kv_width};

/// How long the one-shot display stays lit.
const TEST_HOLD: Duration = Duration::from_secs(10);

fn print_snapshot(snapshot: &Snapshot) {
    let w = kv_width(
        &["Status:", "System:"],
        &["Blocked today:", "Queries today:", "Clients:", "Temperature:"],
    );
    match &snapshot.status {
        Some(s) => {
            kv("Status:", &s.state, w);
            kv_indent("Queries today:", s.queries_today, w);
            kv_indent(
                "Blocked today:",
                format_args!("{} ({:.1}%)", s.blocked_today, s.percent_blocked),
                w,
            );
            kv_indent("Clients:", s.clients, w);
        }
        None => kv("Status:", "(unavailable)", w),
    }
    match &snapshot.metrics {
        Some(m) => {
            kv("System:", "", w);
            kv_indent("CPU:", format_args!("{:.1}%", m.cpu_percent), w);
            kv_indent("Memory:", format_args!("{:.1}%", m.memory_percent), w);
            kv_indent("Disk:", format_args!("{:.1}%", m.disk_percent), w);
            if m.temperature > 0.0 {
                kv_indent("Temperature:", format_args!("{:.1}°C", m.temperature), w);
            } else {
                kv_indent("Temperature:", "(no sensor)", w);
            }
        }
        None => kv("System:", "(unavailable)", w),
    }
}

pub(super) fn cmd_test(config_path: Option<&Path>) -> Result<()> {
    let (config, _) = super::load_config(config_path);
    let (client, board) = Precheck::run_until_failure(&config).into_ready()?;

    let mut monitor = Monitor::new(board, config, client, HostMetrics::new(), ThreadPacer);
    let snapshot = monitor.run_once();
    let _lights_out = LightsOut::new(monitor.board());

    print_snapshot(&snapshot);
    println!();
    println!("Holding display for {}s...", TEST_HOLD.as_secs());
    monitor::wait(TEST_HOLD, &ThreadPacer, &RUNNING);
    println!("Done.");
    Ok(())
}
