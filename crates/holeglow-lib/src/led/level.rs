//! Intensity arithmetic: clamping and brightness scaling.
//!
//! Displays compute a raw level in the 0–100 domain, clamp it to a floor
//! that keeps the LED visible, then apply the global brightness scale.

/// Highest intensity accepted by the board.
pub const MAX_INTENSITY: u8 = 100;

/// Truncate a measurement to an integer level clamped into `[lo, hi]`.
///
/// NaN measurements are treated as 0 before clamping.
pub fn clamp_level(value: f64, lo: u8, hi: u8) -> u8 {
    let v = if value.is_nan() { 0.0 } else { value.trunc() };
    v.clamp(lo as f64, hi as f64) as u8
}

/// Clamp an integer count-derived level into `[lo, hi]`.
pub fn clamp_count(value: u64, lo: u8, hi: u8) -> u8 {
    value.clamp(lo as u64, hi as u64) as u8
}

/// Apply the brightness scale to a level, truncating and clamping into 0–100.
pub fn scaled(level: u8, scale: f64) -> u8 {
    let v = level as f64 * scale;
    if v.is_nan() {
        return 0;
    }
    v.trunc().clamp(0.0, MAX_INTENSITY as f64) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_level_floors_and_caps() {
        assert_eq!(clamp_level(3.0, 10, 100), 10);
        assert_eq!(clamp_level(55.9, 10, 100), 55);
        assert_eq!(clamp_level(250.0, 10, 100), 100);
        assert_eq!(clamp_level(-4.0, 20, 100), 20);
    }

    #[test]
    fn clamp_level_bounds_are_inclusive() {
        assert_eq!(clamp_level(10.0, 10, 100), 10);
        assert_eq!(clamp_level(100.0, 10, 100), 100);
    }

    #[test]
    fn clamp_level_nan_goes_to_floor() {
        assert_eq!(clamp_level(f64::NAN, 10, 100), 10);
    }

    #[test]
    fn clamp_count_caps_large_counts() {
        assert_eq!(clamp_count(5, 10, 100), 10);
        assert_eq!(clamp_count(42, 10, 100), 42);
        assert_eq!(clamp_count(u64::MAX, 10, 100), 100);
    }

    #[test]
    fn scaled_identity_at_one() {
        for level in 0..=100 {
            assert_eq!(scaled(level, 1.0), level);
        }
    }

    #[test]
    fn scaled_truncates() {
        assert_eq!(scaled(90, 0.5), 45);
        assert_eq!(scaled(33, 0.5), 16);
        assert_eq!(scaled(100, 0.333), 33);
    }

    #[test]
    fn scaled_clamps_into_range() {
        assert_eq!(scaled(80, 2.0), 100);
        assert_eq!(scaled(80, -1.0), 0);
        assert_eq!(scaled(80, f64::NAN), 0);
        assert_eq!(scaled(80, f64::INFINITY), 100);
    }
}
