//! Monitor loop: poll and render every interval until interrupted.
//!
//! [`Monitor`] owns the board, configuration, data sources and pacer, so the
//! binary only wires real backends in while tests wire in recording ones.
//! All LEDs are turned off when [`Monitor::run`] returns or unwinds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::board::GlowBoard;
use crate::config::Config;
use crate::led::{Pacer, Sequence, pattern, play};
use crate::metrics::MetricsSource;
use crate::render;
use crate::snapshot::{Snapshot, SystemReport};
use crate::status::StatusSource;

/// Longest single sleep while waiting for the next cycle.
pub const WAIT_SLICE: Duration = Duration::from_millis(250);

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Startup,
    Polling,
    Rendering,
    Waiting,
    Shutdown,
}

// ── Threshold checks ──

/// Human-readable warnings for every reading above its configured threshold.
pub fn threshold_warnings(m: &SystemReport, config: &Config) -> Vec<String> {
    let mut warnings = Vec::new();
    if config.features.enable_temperature_monitoring {
        if m.temperature > config.temperature_critical {
            warnings.push(format!(
                "temperature critical: {:.1}°C (> {:.1}°C)",
                m.temperature, config.temperature_critical
            ));
        } else if m.temperature > config.temperature_warning {
            warnings.push(format!(
                "temperature high: {:.1}°C (> {:.1}°C)",
                m.temperature, config.temperature_warning
            ));
        }
    }
    if m.cpu_percent > config.cpu_warning {
        warnings.push(format!(
            "CPU usage high: {:.1}% (> {:.1}%)",
            m.cpu_percent, config.cpu_warning
        ));
    }
    if m.memory_percent > config.memory_warning {
        warnings.push(format!(
            "memory usage high: {:.1}% (> {:.1}%)",
            m.memory_percent, config.memory_warning
        ));
    }
    if m.disk_percent > config.thresholds.high_disk {
        warnings.push(format!(
            "disk usage high: {:.1}% (> {:.1}%)",
            m.disk_percent, config.thresholds.high_disk
        ));
    }
    warnings
}

// ── Query rate ──

/// Queries per minute between two readings of the daily counter.
///
/// `None` when no time has passed or the counter went backwards (daily reset).
pub fn queries_per_minute(previous: u64, current: u64, elapsed: Duration) -> Option<f64> {
    let minutes = elapsed.as_secs_f64() / 60.0;
    if minutes <= 0.0 || current < previous {
        return None;
    }
    Some((current - previous) as f64 / minutes)
}

/// Remembers the last successful query count to derive a rate.
#[derive(Debug, Default)]
struct QueryRate {
    last: Option<(Instant, u64)>,
}

impl QueryRate {
    fn observe(&mut self, queries_today: u64) -> Option<f64> {
        let now = Instant::now();
        let rate = self
            .last
            .and_then(|(at, count)| queries_per_minute(count, queries_today, now - at));
        self.last = Some((now, queries_today));
        rate
    }
}

// ── Guard ──

/// Turns every LED off when dropped, including during a panic.
pub struct LightsOut<'a, B: GlowBoard>(&'a B);

impl<'a, B: GlowBoard> LightsOut<'a, B> {
    pub fn new(board: &'a B) -> Self {
        LightsOut(board)
    }
}

impl<B: GlowBoard> Drop for LightsOut<'_, B> {
    fn drop(&mut self) {
        match self.0.clear() {
            Ok(()) => log::debug!("[board] all LEDs off"),
            Err(e) => log::warn!("[board] could not turn LEDs off: {e}"),
        }
    }
}

// ── Helpers ──

/// Play a sequence, logging (not propagating) a board failure.
fn play_logged(seq: &Sequence, board: &impl GlowBoard, pacer: &impl Pacer, what: &str) {
    if let Err(e) = play(seq, board, pacer) {
        log::error!("[board] {what} failed: {e}");
    }
}

/// Sleep `total` in [`WAIT_SLICE`] steps, returning early once `running`
/// is cleared.
pub fn wait(total: Duration, pacer: &impl Pacer, running: &AtomicBool) {
    let mut left = total;
    while !left.is_zero() && running.load(Ordering::SeqCst) {
        let slice = left.min(WAIT_SLICE);
        pacer.pause(slice);
        left -= slice;
    }
}

/// Play the three displays with the inter-display pause between them.
fn render_snapshot(
    snapshot: &Snapshot,
    config: &Config,
    board: &impl GlowBoard,
    pacer: &impl Pacer,
    running: &AtomicBool,
) {
    let names = ["status display", "health display", "network display"];
    for (i, (seq, name)) in render::displays(snapshot, config)
        .iter()
        .zip(names)
        .enumerate()
    {
        if i > 0 {
            if !running.load(Ordering::SeqCst) {
                return;
            }
            pacer.pause(render::INTER_DISPLAY_PAUSE);
        }
        play_logged(seq, board, pacer, name);
    }
}

// ── Sources ──

struct Sources<S, M> {
    status: S,
    metrics: M,
    rate: QueryRate,
}

impl<S: StatusSource, M: MetricsSource> Sources<S, M> {
    /// Fetch both halves, logging the outcome and any threshold breaches.
    fn poll(&mut self, config: &Config) -> Snapshot {
        let snapshot = Snapshot::from_polls(self.status.fetch(), self.metrics.sample());

        if let Some(ref s) = snapshot.status {
            log::info!("[status] {s}");
            if let Some(rate) = self.rate.observe(s.queries_today) {
                log::debug!("[status] {rate:.1} queries/min");
                if rate > config.thresholds.high_queries_per_minute as f64 {
                    log::warn!(
                        "[status] query rate high: {rate:.1}/min (> {})",
                        config.thresholds.high_queries_per_minute
                    );
                }
            }
        }
        if let Some(ref m) = snapshot.metrics {
            log::info!("[system] {m}");
            for w in threshold_warnings(m, config) {
                log::warn!("[system] {w}");
            }
        }
        snapshot
    }
}

// ── Monitor ──

/// Everything the loop needs, owned in one place.
pub struct Monitor<B, S, M, P> {
    board: B,
    config: Config,
    sources: Sources<S, M>,
    pacer: P,
    state: MonitorState,
}

impl<B, S, M, P> Monitor<B, S, M, P>
where
    B: GlowBoard,
    S: StatusSource,
    M: MetricsSource,
    P: Pacer,
{
    pub fn new(board: B, config: Config, status: S, metrics: M, pacer: P) -> Self {
        Self {
            board,
            config,
            sources: Sources {
                status,
                metrics,
                rate: QueryRate::default(),
            },
            pacer,
            state: MonitorState::Startup,
        }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn status_source(&self) -> &S {
        &self.sources.status
    }

    pub fn metrics_source(&self) -> &M {
        &self.sources.metrics
    }

    /// Run until `running` is cleared. The board is dark afterwards.
    pub fn run(&mut self, running: &AtomicBool) {
        let _lights_out = LightsOut::new(&self.board);

        self.state = MonitorState::Startup;
        play_logged(
            &pattern::startup_sequence(&self.config),
            &self.board,
            &self.pacer,
            "startup sequence",
        );

        let interval = Duration::from_secs(self.config.update_interval);
        while running.load(Ordering::SeqCst) {
            self.state = MonitorState::Polling;
            let snapshot = self.sources.poll(&self.config);
            if !running.load(Ordering::SeqCst) {
                break;
            }
            if snapshot.status.is_none() {
                play_logged(
                    &pattern::error_alert(&self.config),
                    &self.board,
                    &self.pacer,
                    "error alert",
                );
            }

            self.state = MonitorState::Rendering;
            render_snapshot(&snapshot, &self.config, &self.board, &self.pacer, running);

            self.state = MonitorState::Waiting;
            wait(interval, &self.pacer, running);
        }

        self.state = MonitorState::Shutdown;
        log::info!("[monitor] stopping, turning LEDs off");
    }

    /// Poll once and render the result, without startup, alert or wait.
    pub fn run_once(&mut self) -> Snapshot {
        self.state = MonitorState::Polling;
        let snapshot = self.sources.poll(&self.config);
        self.state = MonitorState::Rendering;
        let running = AtomicBool::new(true);
        render_snapshot(&snapshot, &self.config, &self.board, &self.pacer, &running);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardOp;
    use crate::board::mock::RecordingBoard;
    use crate::led::Color;
    use crate::led::mock::RecordingPacer;
    use crate::metrics::MetricsError;
    use crate::metrics::mock::ScriptedMetrics;
    use crate::snapshot::{BlockerState, StatusReport};
    use crate::status::StatusError;
    use crate::status::mock::ScriptedStatus;

    fn status() -> StatusReport {
        StatusReport {
            state: BlockerState::Enabled,
            domains_blocked: 90_000,
            queries_today: 500,
            blocked_today: 0,
            percent_blocked: 45.0,
            clients: 4,
        }
    }

    fn metrics() -> SystemReport {
        SystemReport {
            cpu_percent: 30.0,
            memory_percent: 50.0,
            temperature: 40.0,
            disk_percent: 20.0,
        }
    }

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.features.enable_startup_sequence = false;
        config
    }

    // ── threshold_warnings ──

    #[test]
    fn no_warnings_when_all_normal() {
        assert!(threshold_warnings(&metrics(), &Config::default()).is_empty());
    }

    #[test]
    fn every_threshold_reported() {
        let hot = SystemReport {
            cpu_percent: 95.0,
            memory_percent: 90.0,
            temperature: 72.5,
            disk_percent: 93.0,
        };
        let warnings = threshold_warnings(&hot, &Config::default());
        assert_eq!(warnings.len(), 4);
        assert_eq!(warnings[0], "temperature critical: 72.5°C (> 70.0°C)");
        assert!(warnings[1].starts_with("CPU usage high"));
        assert!(warnings[2].starts_with("memory usage high"));
        assert!(warnings[3].starts_with("disk usage high"));
    }

    #[test]
    fn temperature_warning_below_critical() {
        let warm = SystemReport {
            temperature: 65.0,
            ..metrics()
        };
        assert_eq!(
            threshold_warnings(&warm, &Config::default()),
            vec!["temperature high: 65.0°C (> 60.0°C)".to_string()]
        );
    }

    #[test]
    fn temperature_ignored_when_monitoring_off() {
        let mut config = Config::default();
        config.features.enable_temperature_monitoring = false;
        let hot = SystemReport {
            temperature: 99.0,
            ..metrics()
        };
        assert!(threshold_warnings(&hot, &config).is_empty());
    }

    // ── queries_per_minute ──

    #[test]
    fn rate_over_thirty_seconds() {
        let rate = queries_per_minute(1_000, 1_060, Duration::from_secs(30)).unwrap();
        assert!((rate - 120.0).abs() < 1e-9);
    }

    #[test]
    fn rate_none_after_daily_reset() {
        assert_eq!(queries_per_minute(5_000, 12, Duration::from_secs(10)), None);
    }

    #[test]
    fn rate_none_without_elapsed_time() {
        assert_eq!(queries_per_minute(1, 2, Duration::ZERO), None);
    }

    #[test]
    fn query_rate_needs_two_observations() {
        let mut rate = QueryRate::default();
        assert_eq!(rate.observe(100), None);
        assert!(rate.last.is_some());
    }

    // ── wait ──

    #[test]
    fn wait_is_sliced() {
        let pacer = RecordingPacer::new();
        let running = AtomicBool::new(true);
        wait(Duration::from_millis(600), &pacer, &running);
        assert_eq!(
            *pacer.pauses.borrow(),
            vec![
                Duration::from_millis(250),
                Duration::from_millis(250),
                Duration::from_millis(100)
            ]
        );
    }

    #[test]
    fn wait_returns_immediately_when_stopped() {
        let pacer = RecordingPacer::new();
        let running = AtomicBool::new(false);
        wait(Duration::from_secs(10), &pacer, &running);
        assert!(pacer.pauses.borrow().is_empty());
    }

    // ── LightsOut ──

    #[test]
    fn lights_out_clears_on_drop() {
        let board = RecordingBoard::new();
        board.set_all(60).unwrap();
        {
            let _guard = LightsOut::new(&board);
        }
        assert!(board.is_dark());
        assert_eq!(board.take_ops().last(), Some(&BoardOp::All { intensity: 0 }));
    }

    // ── run_once ──

    #[test]
    fn run_once_renders_all_displays() {
        let mut monitor = Monitor::new(
            RecordingBoard::new(),
            quiet_config(),
            ScriptedStatus::always(Ok(status())),
            ScriptedMetrics::always(Ok(metrics())),
            RecordingPacer::new(),
        );
        let snapshot = monitor.run_once();
        assert_eq!(snapshot.status, Some(status()));
        assert_eq!(monitor.state(), MonitorState::Rendering);
        assert_eq!(
            monitor.board().take_ops(),
            vec![
                BoardOp::Arm { arm: 0, intensity: 0 },
                BoardOp::Color { color: Color::Green, intensity: 90 },
                BoardOp::Color { color: Color::Blue, intensity: 30 },
                BoardOp::Color { color: Color::White, intensity: 50 },
                BoardOp::Arm { arm: 2, intensity: 0 },
                BoardOp::Color { color: Color::Yellow, intensity: 10 },
            ]
        );
    }

    #[test]
    fn run_once_pauses_between_displays() {
        let mut monitor = Monitor::new(
            RecordingBoard::new(),
            quiet_config(),
            ScriptedStatus::always(Ok(status())),
            ScriptedMetrics::always(Ok(metrics())),
            RecordingPacer::new(),
        );
        monitor.run_once();
        let pauses = monitor.pacer.pauses.borrow();
        // health hold, network hold, and two inter-display pauses
        assert_eq!(
            pauses.iter().filter(|&&d| d == render::INTER_DISPLAY_PAUSE).count(),
            2
        );
    }

    #[test]
    fn run_once_survives_failed_polls() {
        let mut monitor = Monitor::new(
            RecordingBoard::new(),
            quiet_config(),
            ScriptedStatus::always(Err(StatusError::Timeout)),
            ScriptedMetrics::always(Err(MetricsError::Unavailable("x".into()))),
            RecordingPacer::new(),
        );
        let snapshot = monitor.run_once();
        assert_eq!(snapshot, Snapshot::default());
        // Only the status error flash: clear + 3 × (on, off).
        assert_eq!(monitor.board().take_ops().len(), 7);
    }

    #[test]
    fn run_once_board_failure_is_not_fatal() {
        let board = RecordingBoard::new();
        board.fail_writes.set(true);
        let mut monitor = Monitor::new(
            board,
            quiet_config(),
            ScriptedStatus::always(Ok(status())),
            ScriptedMetrics::always(Ok(metrics())),
            RecordingPacer::new(),
        );
        let snapshot = monitor.run_once();
        assert!(snapshot.status.is_some());
    }

    // ── run ──

    #[test]
    fn run_stopped_before_start_only_clears() {
        let mut monitor = Monitor::new(
            RecordingBoard::new(),
            quiet_config(),
            ScriptedStatus::always(Ok(status())),
            ScriptedMetrics::always(Ok(metrics())),
            RecordingPacer::new(),
        );
        monitor.run(&AtomicBool::new(false));
        assert_eq!(monitor.state(), MonitorState::Shutdown);
        assert_eq!(monitor.status_source().fetches.get(), 0);
        assert_eq!(
            monitor.board().take_ops(),
            vec![BoardOp::All { intensity: 0 }]
        );
    }

    #[test]
    fn run_plays_startup_before_clearing() {
        let mut monitor = Monitor::new(
            RecordingBoard::new(),
            Config::default(),
            ScriptedStatus::always(Ok(status())),
            ScriptedMetrics::always(Ok(metrics())),
            RecordingPacer::new(),
        );
        monitor.run(&AtomicBool::new(false));
        let ops = monitor.board().take_ops();
        let startup = pattern::startup_sequence(&Config::default()).ops();
        assert_eq!(ops.len(), startup.len() + 1);
        assert_eq!(&ops[..startup.len()], startup.as_slice());
        assert!(monitor.board().is_dark());
    }
}
