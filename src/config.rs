//! System configuration parameters
//!
//! All tunable parameters for the irrigation controller. Loaded from a TOML
//! file, then overridden by command-line flags. Every section has defaults,
//! so an empty file (or no file at all) yields a runnable configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control::{Polarity, Thresholds};
use crate::error::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemConfig {
    pub serial: SerialConfig,
    pub control: ControlConfig,
    pub journal: JournalConfig,
    pub vision: VisionConfig,
}

/// Device connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0` or `COM3`
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound on one line read (milliseconds)
    pub read_timeout_ms: u64,
    /// Wait after opening while the board finishes its reset (milliseconds)
    pub settle_delay_ms: u64,
}

/// Hysteresis thresholds, in raw ADC units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlConfig {
    /// Open the valve once a reading is beyond this
    pub dry_threshold: u32,
    /// Close the valve once a reading is beyond this
    pub wet_threshold: u32,
    pub polarity: Polarity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JournalConfig {
    pub path: PathBuf,
}

/// Capture and classification collaborators.
///
/// Commands are argv templates. Placeholders: `{output}`, `{width}`,
/// `{height}` for capture; `{image}` for classification. An empty command
/// means the collaborator is not available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisionConfig {
    pub image_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub capture_command: Vec<String>,
    pub classify_command: Vec<String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".into(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
            settle_delay_ms: 2000,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            dry_threshold: 900,
            wet_threshold: 600,
            polarity: Polarity::HighIsDry,
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("datos").join("historial_riego.csv"),
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            image_path: PathBuf::from("imagenes").join("ultima.jpg"),
            width: 224,
            height: 224,
            capture_command: Vec::new(),
            classify_command: Vec::new(),
        }
    }
}

impl SystemConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reject invalid values instead of clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.serial.port.trim().is_empty() {
            return invalid("serial.port must not be empty");
        }
        if self.serial.baud_rate == 0 {
            return invalid("serial.baud_rate must be positive");
        }
        if self.serial.read_timeout_ms == 0 {
            return invalid("serial.read_timeout_ms must be positive");
        }
        if self.journal.path.as_os_str().is_empty() {
            return invalid("journal.path must not be empty");
        }
        if self.vision.width == 0 || self.vision.height == 0 {
            return invalid("vision.width and vision.height must be positive");
        }
        self.thresholds()?;
        Ok(())
    }

    /// Validated threshold pair for the control policy.
    pub fn thresholds(&self) -> Result<Thresholds, ConfigError> {
        Thresholds::new(
            self.control.dry_threshold,
            self.control.wet_threshold,
            self.control.polarity,
        )
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
