//! Device configuration
//!
//! [`DeviceConfig`] is everything the driver needs to know about one
//! physical cutter: where it lives on the network, which dialect and
//! transport it speaks, and the bed geometry. The configuration is
//! read-only during a send.
//!
//! Besides serde persistence (JSON or TOML by file extension), the
//! config exposes the string-keyed settings surface the host
//! application reads and writes: every setting has a stable key, values
//! travel as strings, booleans are spelled yes/no. Unrecognized keys
//! are ignored; an unparsable numeric value rejects the whole update.

use laserkit_communication::TransportKind;
use laserkit_core::{ConfigError, Result};
use laserkit_encoder::Dialect;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

pub const SETTING_HOSTNAME: &str = "Hostname / IP";
pub const SETTING_PORT: &str = "Port";
pub const SETTING_GCODE: &str = "Use GCode (yes/no)";
pub const SETTING_BEDWIDTH: &str = "Laserbed width";
pub const SETTING_BEDHEIGHT: &str = "Laserbed height";
pub const SETTING_FLIPX: &str = "X axis goes right to left (yes/no)";
pub const SETTING_MMPERSTEP: &str = "mm per Step (for SimpleMode)";
pub const SETTING_TFTP: &str = "Use TFTP instead of TCP (yes/no)";
pub const SETTING_RASTER_PADDING: &str = "Additional space per raster line (mm)";

const SETTING_KEYS: &[&str] = &[
    SETTING_HOSTNAME,
    SETTING_PORT,
    SETTING_GCODE,
    SETTING_BEDWIDTH,
    SETTING_BEDHEIGHT,
    SETTING_FLIPX,
    SETTING_MMPERSTEP,
    SETTING_TFTP,
    SETTING_RASTER_PADDING,
];

/// Configuration of one cutter board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Hostname or IP of the controller.
    pub hostname: String,
    /// TCP port (stream strategy) or UDP port (block strategy).
    pub port: u16,
    /// Instruction dialect to emit.
    pub dialect: Dialect,
    /// Delivery strategy.
    pub transport: TransportKind,
    /// Laser bed width in millimeters.
    pub bed_width: f64,
    /// Laser bed height in millimeters.
    pub bed_height: f64,
    /// The bed's X axis runs right to left.
    pub flip_x: bool,
    /// Physical length of one motor step (simple dialect).
    pub mm_per_step: f64,
    /// Acceleration space before and after each 2-level raster line, in
    /// millimeters.
    pub raster_padding: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hostname: "192.168.123.111".to_string(),
            port: 69,
            dialect: Dialect::Simple,
            transport: TransportKind::Tftp,
            bed_width: 250.0,
            bed_height: 280.0,
            flip_x: false,
            mm_per_step: 0.001,
            raster_padding: 5.0,
        }
    }
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

fn is_yes(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("yes")
}

fn parse_setting<T: FromStr>(key: &str, value: &str) -> std::result::Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl DeviceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys of the settings surface, in display order.
    pub fn setting_keys() -> &'static [&'static str] {
        SETTING_KEYS
    }

    /// Current value of one setting, or `None` for unknown keys.
    pub fn setting(&self, key: &str) -> Option<String> {
        match key {
            SETTING_HOSTNAME => Some(self.hostname.clone()),
            SETTING_PORT => Some(self.port.to_string()),
            SETTING_GCODE => Some(yes_no(self.dialect == Dialect::Gcode)),
            SETTING_BEDWIDTH => Some(self.bed_width.to_string()),
            SETTING_BEDHEIGHT => Some(self.bed_height.to_string()),
            SETTING_FLIPX => Some(yes_no(self.flip_x)),
            SETTING_MMPERSTEP => Some(self.mm_per_step.to_string()),
            SETTING_TFTP => Some(yes_no(self.transport == TransportKind::Tftp)),
            SETTING_RASTER_PADDING => Some(self.raster_padding.to_string()),
            _ => None,
        }
    }

    /// Apply one setting. Unknown keys are ignored; numeric keys fail
    /// on unparsable input.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            SETTING_HOSTNAME => self.hostname = value.to_string(),
            SETTING_PORT => self.port = parse_setting(key, value)?,
            SETTING_GCODE => {
                self.dialect = if is_yes(value) {
                    Dialect::Gcode
                } else {
                    Dialect::Simple
                }
            }
            SETTING_BEDWIDTH => self.bed_width = parse_setting(key, value)?,
            SETTING_BEDHEIGHT => self.bed_height = parse_setting(key, value)?,
            SETTING_FLIPX => self.flip_x = is_yes(value),
            SETTING_MMPERSTEP => self.mm_per_step = parse_setting(key, value)?,
            SETTING_TFTP => {
                self.transport = if is_yes(value) {
                    TransportKind::Tftp
                } else {
                    TransportKind::Tcp
                }
            }
            SETTING_RASTER_PADDING => self.raster_padding = parse_setting(key, value)?,
            unknown => {
                tracing::debug!("ignoring unknown setting '{}'", unknown);
            }
        }
        Ok(())
    }

    /// Apply a whole key/value map. The update is staged on a copy and
    /// committed only if every entry parses, so one bad value leaves
    /// the configuration untouched.
    pub fn apply_settings(&mut self, entries: &HashMap<String, String>) -> Result<()> {
        let mut staged = self.clone();
        for (key, value) in entries {
            staged.set_setting(key, value)?;
        }
        staged.validate()?;
        *self = staged;
        Ok(())
    }

    /// Validate field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(ConfigError::Invalid("Hostname must not be empty".to_string()).into());
        }
        if self.bed_width <= 0.0 || self.bed_height <= 0.0 {
            return Err(ConfigError::Invalid("Bed dimensions must be > 0".to_string()).into());
        }
        if self.mm_per_step <= 0.0 {
            return Err(ConfigError::Invalid("Step size must be > 0".to_string()).into());
        }
        if self.raster_padding < 0.0 {
            return Err(ConfigError::Invalid("Raster padding must be >= 0".to_string()).into());
        }
        Ok(())
    }

    /// Load configuration from a `.json` or `.toml` file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| ConfigError::Invalid(format!("Invalid JSON config: {}", e)))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::from_str(&content)
                .map_err(|e| ConfigError::Invalid(format!("Invalid TOML config: {}", e)))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::Invalid(format!("Failed to serialize config: {}", e)))?
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            toml::to_string_pretty(self)
                .map_err(|e| ConfigError::Invalid(format!("Failed to serialize config: {}", e)))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()).into());
        };

        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_board() {
        let config = DeviceConfig::default();
        assert_eq!(config.hostname, "192.168.123.111");
        assert_eq!(config.port, 69);
        assert_eq!(config.dialect, Dialect::Simple);
        assert_eq!(config.transport, TransportKind::Tftp);
        assert_eq!(config.bed_width, 250.0);
        assert_eq!(config.bed_height, 280.0);
        assert!(!config.flip_x);
    }

    #[test]
    fn test_yes_no_settings() {
        let mut config = DeviceConfig::default();
        config.set_setting(SETTING_GCODE, "yes").unwrap();
        assert_eq!(config.dialect, Dialect::Gcode);
        config.set_setting(SETTING_GCODE, "no").unwrap();
        assert_eq!(config.dialect, Dialect::Simple);

        config.set_setting(SETTING_TFTP, "no").unwrap();
        assert_eq!(config.transport, TransportKind::Tcp);
        assert_eq!(config.setting(SETTING_TFTP).unwrap(), "no");
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut config = DeviceConfig::default();
        let before = config.clone();
        config.set_setting("Warp drive", "engaged").unwrap();
        assert_eq!(config, before);
        assert!(config.setting("Warp drive").is_none());
    }

    #[test]
    fn test_every_key_round_trips() {
        let config = DeviceConfig::default();
        let mut other = DeviceConfig::default();
        other.hostname = "10.0.0.5".to_string();
        other.port = 7777;
        other.flip_x = true;
        for key in DeviceConfig::setting_keys() {
            let value = other.setting(key).unwrap();
            let mut restored = config.clone();
            restored.set_setting(key, &value).unwrap();
            assert_eq!(restored.setting(key).unwrap(), value, "key {}", key);
        }
    }

    #[test]
    fn test_bad_numeric_rejects_whole_update() {
        let mut config = DeviceConfig::default();
        let mut entries = HashMap::new();
        entries.insert(SETTING_HOSTNAME.to_string(), "10.1.2.3".to_string());
        entries.insert(SETTING_PORT.to_string(), "not-a-port".to_string());

        assert!(config.apply_settings(&entries).is_err());
        // the valid hostname entry must not have been committed
        assert_eq!(config.hostname, "192.168.123.111");
    }

    #[test]
    fn test_validate_rejects_nonsense() {
        let mut config = DeviceConfig::default();
        config.bed_width = 0.0;
        assert!(config.validate().is_err());

        let mut config = DeviceConfig::default();
        config.mm_per_step = -1.0;
        assert!(config.validate().is_err());
    }
}
