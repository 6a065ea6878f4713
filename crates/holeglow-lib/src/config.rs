//! Application configuration: JSON file deep-merged over built-in defaults.
//!
//! Every key is optional. Each user override is applied on its own: one that
//! fails to parse or validate is dropped with a warning and the rest are kept.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::board::ARM_COUNT;
use crate::led::Color;

/// File name looked up in the working directory and the config directory.
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Pi-hole `api.php` endpoint.
    pub pihole_api_url: String,
    /// API token sent as `auth=`. Empty = no auth parameter.
    pub api_token: String,
    /// Seconds between poll cycles. Must be positive.
    pub update_interval: u64,
    pub temperature_warning: f64,
    pub temperature_critical: f64,
    pub cpu_warning: f64,
    pub memory_warning: f64,
    /// Multiplier applied to every computed intensity.
    pub brightness_scale: f64,
    pub led_mapping: LedMapping,
    pub colors: Colors,
    pub thresholds: Thresholds,
    pub features: Features,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            pihole_api_url: "http://localhost/admin/api.php".into(),
            api_token: String::new(),
            update_interval: 10,
            temperature_warning: 60.0,
            temperature_critical: 70.0,
            cpu_warning: 80.0,
            memory_warning: 85.0,
            brightness_scale: 1.0,
            led_mapping: LedMapping::default(),
            colors: Colors::default(),
            thresholds: Thresholds::default(),
            features: Features::default(),
        }
    }
}

/// Which arm each display is drawn on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedMapping {
    pub pihole_status_arm: u8,
    pub system_health_arm: u8,
    pub network_activity_arm: u8,
}

impl Default for LedMapping {
    fn default() -> Self {
        LedMapping {
            pihole_status_arm: 0,
            system_health_arm: 1,
            network_activity_arm: 2,
        }
    }
}

/// Color assigned to each semantic role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Colors {
    pub pihole_enabled: Color,
    pub pihole_disabled: Color,
    pub pihole_error: Color,
    pub cpu_usage: Color,
    pub memory_usage: Color,
    pub temperature_warning: Color,
    pub temperature_critical: Color,
    pub network_queries: Color,
    pub blocked_queries: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Colors {
            pihole_enabled: Color::Green,
            pihole_disabled: Color::Red,
            pihole_error: Color::Orange,
            cpu_usage: Color::Blue,
            memory_usage: Color::White,
            temperature_warning: Color::Orange,
            temperature_critical: Color::Red,
            network_queries: Color::Yellow,
            blocked_queries: Color::Red,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Root disk usage percentage logged as a warning.
    pub high_disk: f64,
    /// Queries per minute logged as a warning.
    pub high_queries_per_minute: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            high_disk: 90.0,
            high_queries_per_minute: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub enable_system_monitoring: bool,
    pub enable_network_monitoring: bool,
    pub enable_temperature_monitoring: bool,
    pub enable_error_alerts: bool,
    pub enable_startup_sequence: bool,
}

impl Default for Features {
    fn default() -> Self {
        Features {
            enable_system_monitoring: true,
            enable_network_monitoring: true,
            enable_temperature_monitoring: true,
            enable_error_alerts: true,
            enable_startup_sequence: true,
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("holeglow"))
    }

    /// Full path to the config file in the platform config directory.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join(CONFIG_FILE))
    }

    /// Candidate locations, in lookup order.
    pub fn search_paths() -> Vec<PathBuf> {
        std::iter::once(PathBuf::from(CONFIG_FILE))
            .chain(Self::path())
            .collect()
    }

    /// Resolve which file to load: the explicit path if given, otherwise the
    /// first existing search path.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::search_paths().into_iter().find(|p| p.is_file()),
        }
    }

    /// Load config from a path, returning the config and any warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist and
    /// `(defaults, [warning])` if it isn't a JSON object.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents, &path.display().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Self::default(), vec![]),
            Err(e) => (
                Self::default(),
                vec![format!(
                    "cannot read config ({}), using defaults: {e}",
                    path.display()
                )],
            ),
        }
    }

    /// Parse a JSON document and merge it over the defaults.
    pub fn from_json(contents: &str, origin: &str) -> (Self, Vec<String>) {
        let user: Value = match serde_json::from_str(contents) {
            Ok(v) => v,
            Err(e) => {
                let warning = format!("config parse error ({origin}), using defaults: {e}");
                return (Self::default(), vec![warning]);
            }
        };
        let Value::Object(user) = user else {
            let warning = format!("config ({origin}) is not a JSON object, using defaults");
            return (Self::default(), vec![warning]);
        };
        Self::merged(&user)
    }

    /// Apply user overrides one leaf at a time, keeping each only if the
    /// resulting config still parses and validates.
    fn merged(user: &Map<String, Value>) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut config = Self::default();
        let Ok(mut merged) = serde_json::to_value(&config) else {
            return (config, vec!["cannot serialize defaults".into()]);
        };
        let Some(defaults) = merged.as_object().cloned() else {
            return (config, warnings);
        };

        let mut leaves = Vec::new();
        collect_overrides(&defaults, user, &[], &mut leaves, &mut warnings);

        for (path, value) in leaves {
            let mut candidate = merged.clone();
            set_at(&mut candidate, &path, value);
            let parsed = serde_json::from_value::<Config>(candidate.clone())
                .map_err(|e| e.to_string())
                .and_then(|c| c.validate().map(|()| c).map_err(|e| e.to_string()));
            match parsed {
                Ok(c) => {
                    merged = candidate;
                    config = c;
                }
                Err(e) => warnings.push(format!("ignoring {}: {e}", path.join("."))),
            }
        }
        (config, warnings)
    }

    /// Check value ranges that the types alone don't enforce.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.update_interval == 0 {
            return Err(crate::HoleglowError::Config(
                "update_interval must be positive".into(),
            ));
        }
        if !self.brightness_scale.is_finite() || self.brightness_scale < 0.0 {
            return Err(crate::HoleglowError::Config(format!(
                "brightness_scale must be >= 0, got {}",
                self.brightness_scale
            )));
        }
        let m = &self.led_mapping;
        for (name, arm) in [
            ("pihole_status_arm", m.pihole_status_arm),
            ("system_health_arm", m.system_health_arm),
            ("network_activity_arm", m.network_activity_arm),
        ] {
            if arm >= ARM_COUNT {
                return Err(crate::HoleglowError::Config(format!(
                    "{name} must be 0-{}, got {arm}",
                    ARM_COUNT - 1
                )));
            }
        }
        Ok(())
    }
}

/// Flatten user overrides into `(key path, value)` leaves, following the
/// nesting of the defaults. Unknown keys are skipped.
fn collect_overrides(
    defaults: &Map<String, Value>,
    user: &Map<String, Value>,
    path: &[String],
    out: &mut Vec<(Vec<String>, Value)>,
    warnings: &mut Vec<String>,
) {
    for (key, value) in user {
        let mut key_path = path.to_vec();
        key_path.push(key.clone());
        match (defaults.get(key), value) {
            (None, _) => log::debug!("[config] ignoring unknown key {}", key_path.join(".")),
            (Some(Value::Object(d)), Value::Object(u)) => {
                collect_overrides(d, u, &key_path, out, warnings);
            }
            (Some(Value::Object(_)), _) => warnings.push(format!(
                "ignoring {}: expected an object",
                key_path.join(".")
            )),
            (Some(_), v) => out.push((key_path, v.clone())),
        }
    }
}

fn set_at(root: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut node = root;
    for key in parents {
        match node.get_mut(key) {
            Some(next) => node = next,
            None => return,
        }
    }
    if let Some(obj) = node.as_object_mut() {
        obj.insert(last.clone(), value);
    }
}
