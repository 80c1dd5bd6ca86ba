//! DRM configuration
//!
//! Which DRM node to open and which connector type backs each logical
//! display. Read from TOML; every field falls back to a built-in default.
//!
//! ```toml
//! device = "/dev/dri/card0"
//! primary_connector = 16   # DSI
//! external_connector = 11  # HDMI-A
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::kms::connector_type;
use crate::outputs::DisplayDevice;
use crate::Result;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "KMS_HWC_CONFIG";
/// Environment variable overriding the DRM node
pub const DEVICE_ENV: &str = "KMS_HWC_DEVICE";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/kms-hwcomposer.toml";

fn default_device() -> PathBuf {
    PathBuf::from("/dev/dri/card0")
}

fn default_primary_connector() -> u32 {
    connector_type::DSI
}

fn default_external_connector() -> u32 {
    connector_type::HDMIA
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DrmConfig {
    #[serde(default = "default_device")]
    pub device: PathBuf,
    #[serde(default = "default_primary_connector")]
    pub primary_connector: u32,
    #[serde(default = "default_external_connector")]
    pub external_connector: u32,
}

impl Default for DrmConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            primary_connector: default_primary_connector(),
            external_connector: default_external_connector(),
        }
    }
}

impl DrmConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from `path`. A missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config = Self::from_toml(&contents)?;
                info!("Loaded drm config from {:?}", path);
                Ok(config)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No drm config at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Load from `$KMS_HWC_CONFIG` or the default path, then apply the
    /// `$KMS_HWC_DEVICE` override.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = Self::load_from(&path)?;
        if let Some(device) = std::env::var_os(DEVICE_ENV) {
            config.device = PathBuf::from(device);
        }
        Ok(config)
    }

    /// Connector type backing a display, if it is DRM-backed at all
    pub fn connector_type(&self, device: DisplayDevice) -> Option<u32> {
        match device {
            DisplayDevice::Primary => Some(self.primary_connector),
            DisplayDevice::External => Some(self.external_connector),
            DisplayDevice::Virtual => None,
        }
    }

    /// Display a connector of this type is mapped to. Primary wins if both
    /// are configured with the same type.
    pub fn display_for_connector(&self, connector_type: u32) -> Option<DisplayDevice> {
        if connector_type == self.primary_connector {
            Some(DisplayDevice::Primary)
        } else if connector_type == self.external_connector {
            Some(DisplayDevice::External)
        } else {
            None
        }
    }
}
