//! Default command: pre-check, then run the monitor loop until Ctrl+C.

use std::path::Path;

use holeglow_lib::metrics::HostMetrics;
use holeglow_lib::monitor::Monitor;

use super::{Precheck, RUNNING, Result, ThreadPacer, kv, kv_width};

pub(super) fn cmd_monitor(config_path: Option<&Path>) -> Result<()> {
    let (config, _) = super::load_config(config_path);

    println!("Holeglow: Pi-hole and system health on the PiGlow.");
    let w = kv_width(&["Status API:", "Interval:", "Brightness:"], &[]);
    kv("Status API:", &config.pihole_api_url, w);
    kv("Interval:", format_args!("{}s", config.update_interval), w);
    kv("Brightness:", format_args!("{:.2}", config.brightness_scale), w);
    println!();

    let (client, board) = Precheck::run_until_failure(&config).into_ready()?;

    println!("Monitoring... (Ctrl+C to stop, turns LEDs off)");
    let mut monitor = Monitor::new(board, config, client, HostMetrics::new(), ThreadPacer);
    monitor.run(&RUNNING);

    println!();
    println!("Done.");
    Ok(())
}
