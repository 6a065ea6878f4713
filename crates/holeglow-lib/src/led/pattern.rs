//! Whole-board patterns: startup rainbow/sweep and the error alert.

use std::time::Duration;

use crate::board::ARM_COUNT;
use crate::config::Config;

use super::level::{MAX_INTENSITY, scaled};
use super::{Color, Sequence};

/// On-time for each color and arm of the startup pattern.
pub const STARTUP_STEP: Duration = Duration::from_millis(200);

/// On/off cadence of the error alert.
pub const ALERT_STEP: Duration = Duration::from_millis(200);

/// Number of whole-board flashes in the error alert.
pub const ALERT_FLASHES: usize = 5;

/// Color rainbow followed by an arm sweep. Empty when the startup
/// sequence is disabled.
pub fn startup_sequence(config: &Config) -> Sequence {
    let mut seq = Sequence::new();
    if !config.features.enable_startup_sequence {
        return seq;
    }
    let full = scaled(MAX_INTENSITY, config.brightness_scale);

    for color in Color::ALL {
        seq.color(color, full).hold(STARTUP_STEP).color(color, 0);
    }
    for arm in 0..ARM_COUNT {
        seq.arm(arm, full).hold(STARTUP_STEP).arm(arm, 0);
    }
    seq
}

/// Flash every LED [`ALERT_FLASHES`] times. Empty when error alerts are
/// disabled.
pub fn error_alert(config: &Config) -> Sequence {
    let mut seq = Sequence::new();
    if !config.features.enable_error_alerts {
        return seq;
    }
    let full = scaled(MAX_INTENSITY, config.brightness_scale);

    for _ in 0..ALERT_FLASHES {
        seq.all(full).hold(ALERT_STEP).all(0).hold(ALERT_STEP);
    }
    seq
}

/// Level and duration of the pre-check lamp test.
pub const SELF_TEST_LEVEL: u8 = 50;
pub const SELF_TEST_HOLD: Duration = Duration::from_millis(500);

/// Whole board at half brightness, then off.
pub fn self_test() -> Sequence {
    let mut seq = Sequence::new();
    seq.all(SELF_TEST_LEVEL).hold(SELF_TEST_HOLD).all(0);
    seq
}

/// Flash one color `times` times with an equal on/off cadence.
pub fn flash_color(color: Color, intensity: u8, times: usize, cadence: Duration) -> Sequence {
    let mut seq = Sequence::new();
    for _ in 0..times {
        seq.color(color, intensity)
            .hold(cadence)
            .color(color, 0)
            .hold(cadence);
    }
    seq
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardOp;

    #[test]
    fn startup_cycles_colors_then_arms() {
        let seq = startup_sequence(&Config::default());
        let ops = seq.ops();
        assert_eq!(ops.len(), 6 * 2 + 3 * 2);
        assert_eq!(
            ops[0],
            BoardOp::Color {
                color: Color::Red,
                intensity: 100
            }
        );
        assert_eq!(
            ops[1],
            BoardOp::Color {
                color: Color::Red,
                intensity: 0
            }
        );
        assert_eq!(
            ops[11],
            BoardOp::Color {
                color: Color::White,
                intensity: 0
            }
        );
        assert_eq!(
            ops[12],
            BoardOp::Arm {
                arm: 0,
                intensity: 100
            }
        );
        assert_eq!(
            ops[17],
            BoardOp::Arm {
                arm: 2,
                intensity: 0
            }
        );
        assert_eq!(seq.duration(), STARTUP_STEP * 9);
    }

    #[test]
    fn startup_respects_brightness() {
        let config = Config {
            brightness_scale: 0.5,
            ..Config::default()
        };
        let ops = startup_sequence(&config).ops();
        assert_eq!(ops[0].intensity(), 50);
        assert_eq!(ops[12].intensity(), 50);
    }

    #[test]
    fn startup_disabled_is_empty() {
        let mut config = Config::default();
        config.features.enable_startup_sequence = false;
        assert!(startup_sequence(&config).is_empty());
    }

    #[test]
    fn error_alert_flashes_five_times() {
        let seq = error_alert(&Config::default());
        let ops = seq.ops();
        assert_eq!(ops.len(), 10);
        for pair in ops.chunks(2) {
            assert_eq!(pair[0], BoardOp::All { intensity: 100 });
            assert_eq!(pair[1], BoardOp::All { intensity: 0 });
        }
        assert_eq!(seq.duration(), ALERT_STEP * 10);
    }

    #[test]
    fn error_alert_disabled_is_empty() {
        let mut config = Config::default();
        config.features.enable_error_alerts = false;
        assert!(error_alert(&config).is_empty());
    }

    #[test]
    fn self_test_lights_then_clears() {
        let seq = self_test();
        assert_eq!(
            seq.ops(),
            vec![BoardOp::All { intensity: 50 }, BoardOp::All { intensity: 0 }]
        );
        assert_eq!(seq.duration(), SELF_TEST_HOLD);
    }

    #[test]
    fn flash_color_alternates() {
        let seq = flash_color(Color::Orange, 100, 3, Duration::from_millis(300));
        let ops = seq.ops();
        assert_eq!(ops.len(), 6);
        assert!(ops.iter().step_by(2).all(|op| op.intensity() == 100));
        assert!(ops.iter().skip(1).step_by(2).all(|op| op.intensity() == 0));
        assert_eq!(seq.duration(), Duration::from_millis(1800));
    }
}
