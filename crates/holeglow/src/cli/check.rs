//! `check` subcommand: status API and board pre-check only.

use std::path::Path;

use super::{CheckJson, CheckOutput, Precheck, Result, kv, kv_width};

pub(super) fn cmd_check(config_path: Option<&Path>, json: bool) -> Result<()> {
    let (config, path) = super::load_config(config_path);
    let check = Precheck::run(&config);
    let api = CheckJson::from_result(&check.api);
    let board = CheckJson::from_result(&check.board);

    if json {
        let output = CheckOutput {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config_file: path.as_ref().map(|p| p.display().to_string()),
            api_url: config.pihole_api_url.clone(),
            api,
            board,
        };
        let json_str = serde_json::to_string_pretty(&output).map_err(|e| {
            holeglow_lib::HoleglowError::Config(format!("JSON serialization failed: {e}"))
        })?;
        println!("{json_str}");
    } else {
        let w = kv_width(&["Config file:", "Status API:", "PiGlow board:"], &[]);
        match &path {
            Some(p) => kv("Config file:", p.display(), w),
            None => kv("Config file:", "(none, using defaults)", w),
        }
        let label = |c: &CheckJson| match &c.error {
            None => "OK".to_string(),
            Some(e) => format!("FAILED ({e})"),
        };
        kv(
            "Status API:",
            format_args!("{} {}", config.pihole_api_url, label(&api)),
            w,
        );
        kv("PiGlow board:", label(&board), w);
    }

    check.into_ready().map(|_| ())
}
