//! CLI subcommands: monitoring, one-shot display test, pre-check.

mod check;
mod monitor;
mod test_cmd;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use crate::RUNNING;
pub(super) use holeglow_lib::board::{self, PlatformBoard};
pub(super) use holeglow_lib::config::Config;
pub(super) use holeglow_lib::error::Result;
pub(super) use holeglow_lib::led::{self, ThreadPacer};
pub(super) use holeglow_lib::status::{PiholeClient, StatusError, StatusSource};

const PADDING: usize = 2;

/// Compute alignment width for a command's key-value output.
/// Ensures at least PADDING spaces after the longest key in either level,
/// with top-level and indent values aligned to the same column.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    let top_max = top.iter().map(|k| k.len()).max().unwrap_or(0);
    let indent_max = indent.iter().map(|k| k.len()).max().unwrap_or(0);
    let top_need = if top.is_empty() { 0 } else { top_max + PADDING };
    // Indent keys lose 2 chars of inner width to the "  " prefix
    let indent_need = if indent.is_empty() {
        0
    } else {
        indent_max + PADDING + 2
    };
    top_need.max(indent_need)
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<width$}{value}", width = w)
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn format_kv_indent(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("  {key:<width$}{value}", width = w.saturating_sub(2))
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv_indent(key, value, w));
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct CheckOutput {
    pub version: String,
    pub config_file: Option<String>,
    pub api_url: String,
    pub api: CheckJson,
    pub board: CheckJson,
}

#[derive(Debug, PartialEq, Serialize)]
pub(super) struct CheckJson {
    pub ok: bool,
    pub error: Option<String>,
}

impl CheckJson {
    pub fn from_result<T, E: std::fmt::Display>(r: &std::result::Result<T, E>) -> Self {
        match r {
            Ok(_) => CheckJson {
                ok: true,
                error: None,
            },
            Err(e) => CheckJson {
                ok: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Pre-check, then show one display for 10 seconds and turn the LEDs off
    Test,

    /// Check status API connectivity and the LED board, then exit
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

// ── Shared setup ──

/// Resolve and load the config file, logging every warning.
pub(super) fn load_config(explicit: Option<&Path>) -> (Config, Option<PathBuf>) {
    let path = Config::locate(explicit);
    let Some(ref p) = path else {
        log::info!("[config] no config file found, using defaults");
        return (Config::default(), None);
    };
    if !p.exists() {
        log::warn!("[config] {} not found, using defaults", p.display());
    }
    let (config, warnings) = Config::load_from(p);
    for w in &warnings {
        log::warn!("[config] {w}");
    }
    log::debug!("[config] loaded {}", p.display());
    (config, path)
}

/// Outcome of the two start-up checks.
pub(super) struct Precheck {
    pub api: std::result::Result<PiholeClient, StatusError>,
    pub board: board::Result<PlatformBoard>,
}

impl Precheck {
    /// Ping the status API, then open the board and flash it once.
    /// Both checks always run, so every failure gets reported.
    pub fn run(config: &Config) -> Self {
        let api = check_api(config);
        let board = check_board();
        Precheck { api, board }
    }

    /// Like [`Precheck::run`], but skips the board when the API is down.
    pub fn run_until_failure(config: &Config) -> Self {
        let api = check_api(config);
        let board = match &api {
            Ok(_) => check_board(),
            Err(_) => Err(board::BoardError::OpenFailed(
                "skipped, status API check failed".into(),
            )),
        };
        Precheck { api, board }
    }

    /// Both handles, or the first failure.
    pub fn into_ready(self) -> Result<(PiholeClient, PlatformBoard)> {
        Ok((self.api?, self.board?))
    }
}

fn check_api(config: &Config) -> std::result::Result<PiholeClient, StatusError> {
    let api = PiholeClient::new(&config.pihole_api_url, &config.api_token)
        .and_then(|client| client.ping().map(|()| client));
    match &api {
        Ok(_) => log::info!("[check] status API reachable at {}", config.pihole_api_url),
        Err(e) => log::error!("[check] {e}"),
    }
    api
}

fn check_board() -> board::Result<PlatformBoard> {
    let board = board::open_board().and_then(|b| {
        led::play(&led::pattern::self_test(), &b, &ThreadPacer)?;
        Ok(b)
    });
    match &board {
        Ok(_) => log::info!("[check] PiGlow board responding"),
        Err(e) => log::error!("[check] {e}"),
    }
    board
}

pub fn run(cmd: Option<Command>, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        None => monitor::cmd_monitor(config_path),
        Some(Command::Test) => test_cmd::cmd_test(config_path),
        Some(Command::Check { json }) => check::cmd_check(config_path, json),
    }
}
