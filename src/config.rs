//! Configuration parsing and management for Gestura

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, GesturaError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub osc: OscConfig,
    pub eyes: EyeConfig,
    pub hands: HandConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GesturaError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::ReadFile(format!("{}: {}", path.as_ref().display(), e))
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, GesturaError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from default paths
    pub fn load() -> Result<Self, GesturaError> {
        let mut paths = vec![
            PathBuf::from("gestura.toml"),
            PathBuf::from("config/gestura.toml"),
        ];
        paths.extend(user_config_dir().map(|dir| dir.join("config.toml")));

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Render the configuration back to TOML
    pub fn to_toml(&self) -> Result<String, GesturaError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), GesturaError> {
        if self.source.port == 0 {
            return Err(invalid("source.port", "Port must be greater than 0"));
        }

        if self.osc.target_port == 0 {
            return Err(invalid("osc.target_port", "Port must be greater than 0"));
        }

        if let Some(ref addr) = self.osc.ear_address {
            if !addr.starts_with('/') {
                return Err(invalid("osc.ear_address", "OSC addresses must start with '/'"));
            }
        }

        if !(self.eyes.closed_threshold > 0.0 && self.eyes.closed_threshold < 1.0) {
            return Err(invalid(
                "eyes.closed_threshold",
                "Threshold must be between 0.0 and 1.0 (exclusive)",
            ));
        }

        if self.eyes.dwell_ms == 0 {
            return Err(invalid("eyes.dwell_ms", "Dwell duration must be greater than 0"));
        }

        if !(1..=5).contains(&self.hands.min_folded) {
            return Err(invalid("hands.min_folded", "Must be between 1 and 5"));
        }

        if self.hands.finger_margin < 0.0 || self.hands.thumb_margin < 0.0 {
            return Err(invalid("hands", "Finger margins must not be negative"));
        }

        if self.hands.debounce_frames == 0 {
            return Err(invalid("hands.debounce_frames", "Must be at least 1"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> GesturaError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// Landmark source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Listen address for the landmark UDP socket
    pub listen_address: String,
    /// UDP port the detector helper sends landmark packets to
    pub port: u16,
    /// How reported hand labels map to left/right channels
    pub handedness: HandednessConvention,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1".to_string(),
            port: 12347,
            handedness: HandednessConvention::Mirrored,
        }
    }
}

/// Hand label convention of the detector feeding us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandednessConvention {
    /// Labels refer to a horizontally flipped frame and must be inverted
    #[default]
    Mirrored,
    /// Labels already name the viewer-side channel
    Direct,
}

/// OSC output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    /// Host receiving the control messages
    pub target_host: String,
    /// Port receiving the control messages
    pub target_port: u16,
    /// Address naming scheme
    pub scheme: AddressScheme,
    /// Optional address for the raw eye-aspect-ratio diagnostic channel
    pub ear_address: Option<String>,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            target_host: "127.0.0.1".to_string(),
            target_port: 8999,
            scheme: AddressScheme::Legacy,
            ear_address: None,
        }
    }
}

/// OSC address naming scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressScheme {
    /// `/cap`, `/ochi`, `/mana1`, `/mana1_inchisa`, `/mana2`, `/mana2_inchisa`
    #[default]
    Legacy,
    /// `/head`, `/eyes`, `/manaStanga`, `/manaStangaInchisa`, `/manaDreapta`, `/manaDreaptaInchisa`
    Named,
}

impl std::str::FromStr for AddressScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "named" => Ok(Self::Named),
            other => Err(format!("unknown address scheme '{}'", other)),
        }
    }
}

/// Eye toggle tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeConfig {
    /// EAR below this value counts as closed
    pub closed_threshold: f32,
    /// How long the eyes must stay closed before the toggle flips
    pub dwell_ms: u64,
}

impl EyeConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self {
            closed_threshold: 0.21,
            dwell_ms: 750,
        }
    }
}

/// Hand-closed classification tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandConfig {
    /// Which heuristic decides whether a hand is closed
    pub policy: HandClosedPolicy,
    /// Vertical tolerance for the four long fingers
    pub finger_margin: f32,
    /// Horizontal tolerance for the thumb
    pub thumb_margin: f32,
    /// Folded fingers needed for a closed hand (multi-finger policy)
    pub min_folded: u8,
    /// Consecutive agreeing frames before a hand state change is emitted
    pub debounce_frames: u32,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            policy: HandClosedPolicy::MultiFinger,
            finger_margin: 0.03,
            thumb_margin: 0.05,
            min_folded: 4,
            debounce_frames: 1,
        }
    }
}

/// Hand-closed heuristic selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandClosedPolicy {
    /// Closed when at least `min_folded` of the five fingers are folded
    #[default]
    MultiFinger,
    /// Closed when the thumb tip or the index tip drops below its joint
    TwoFinger,
}

/// Per-user config directory from the environment
fn user_config_dir() -> Option<PathBuf> {
    xdg_config_dir(std::env::var_os("XDG_CONFIG_HOME"), std::env::var_os("HOME"))
}

/// `$XDG_CONFIG_HOME/gestura`, falling back to `~/.config/gestura`
fn xdg_config_dir(xdg_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    let base = xdg_home
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| home.map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("gestura"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.osc.target_port, 8999);
        assert_eq!(config.osc.scheme, AddressScheme::Legacy);
        assert_eq!(config.source.handedness, HandednessConvention::Mirrored);
        assert_eq!(config.hands.policy, HandClosedPolicy::MultiFinger);
        assert_eq!(config.eyes.dwell(), Duration::from_millis(750));
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [source]
            port = 5005
            handedness = "direct"

            [osc]
            scheme = "named"
            ear_address = "/ear"

            [eyes]
            closed_threshold = 0.2
            dwell_ms = 500

            [hands]
            policy = "two_finger"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.source.port, 5005);
        assert_eq!(config.source.handedness, HandednessConvention::Direct);
        assert_eq!(config.osc.scheme, AddressScheme::Named);
        assert_eq!(config.osc.ear_address.as_deref(), Some("/ear"));
        assert_eq!(config.eyes.closed_threshold, 0.2);
        assert_eq!(config.eyes.dwell_ms, 500);
        assert_eq!(config.hands.policy, HandClosedPolicy::TwoFinger);
        // untouched fields keep their defaults
        assert_eq!(config.osc.target_port, 8999);
        assert_eq!(config.hands.min_folded, 4);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = Config::default();
        config.eyes.closed_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.hands.min_folded = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.osc.ear_address = Some("ear".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_user_config_dir() {
        let dir = xdg_config_dir(Some("/xdg".into()), Some("/home/me".into()));
        assert_eq!(dir, Some(PathBuf::from("/xdg/gestura")));

        let dir = xdg_config_dir(Some("".into()), Some("/home/me".into()));
        assert_eq!(dir, Some(PathBuf::from("/home/me/.config/gestura")));

        assert_eq!(xdg_config_dir(None, None), None);
    }

    #[test]
    fn test_toml_roundtrip_keeps_defaults() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        let parsed = Config::from_str(&rendered).unwrap();
        assert_eq!(parsed.osc.target_port, config.osc.target_port);
        assert_eq!(parsed.eyes.dwell_ms, config.eyes.dwell_ms);
    }

    #[test]
    fn test_scheme_from_str() {
        assert_eq!("Named".parse::<AddressScheme>(), Ok(AddressScheme::Named));
        assert!("other".parse::<AddressScheme>().is_err());
    }
}
