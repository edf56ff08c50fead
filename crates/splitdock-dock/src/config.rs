#![forbid(unsafe_code)]

//! Registry configuration loaded from TOML or JSON.
//!
//! ```toml
//! # splitdock.toml
//! separator_thickness = 5
//! floating_window_size = { width = 400, height = 400 }
//! screen_size = { width = 2560, height = 1440 }
//! check_sanity = true
//! ```
//!
//! ```rust,ignore
//! let config = DockConfig::from_toml_file("splitdock.toml")?;
//! let registry = DockRegistry::with_config(config)?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use splitdock_layout::{DEFAULT_MIN_SIZE, DEFAULT_SEPARATOR_THICKNESS, Size, SplitterConfig};

/// Tunables for a [`DockRegistry`](crate::DockRegistry) and every layout it
/// creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DockConfig {
    /// Separator thickness in pixels.
    pub separator_thickness: i32,

    /// Minimum size of a frame whose dock widgets don't ask for one.
    pub default_min_size: Size,

    /// Size of a floating window created for a dock widget that was never
    /// docked.
    pub floating_window_size: Size,

    /// Geometry a maximized main window takes.
    pub screen_size: Size,

    /// Run the registry-wide sanity check after every mutation and log what
    /// it finds.
    pub check_sanity: bool,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            separator_thickness: DEFAULT_SEPARATOR_THICKNESS,
            default_min_size: DEFAULT_MIN_SIZE,
            floating_window_size: Size::new(400, 400),
            screen_size: Size::new(1920, 1080),
            check_sanity: cfg!(debug_assertions),
        }
    }
}

impl DockConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, DockConfigError> {
        let config: Self = toml::from_str(s).map_err(DockConfigError::Toml)?;
        config.into_validated()
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, DockConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DockConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, DockConfigError> {
        let config: Self = serde_json::from_str(s).map_err(DockConfigError::Json)?;
        config.into_validated()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DockConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DockConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.separator_thickness < 0 {
            errors.push(format!(
                "separator_thickness must be >= 0, got {}",
                self.separator_thickness
            ));
        }
        for (field, size) in [
            ("default_min_size", self.default_min_size),
            ("floating_window_size", self.floating_window_size),
            ("screen_size", self.screen_size),
        ] {
            if size.width < 0 || size.height < 0 {
                errors.push(format!(
                    "{field} must not be negative, got {}x{}",
                    size.width, size.height
                ));
            }
        }
        if !self.screen_size.covers(self.default_min_size) {
            errors.push("screen_size must fit default_min_size".into());
        }

        errors
    }

    /// The per-layout part of the configuration.
    #[must_use]
    pub fn splitter_config(&self) -> SplitterConfig {
        SplitterConfig {
            separator_thickness: self.separator_thickness,
            default_min_size: self.default_min_size,
        }
    }

    fn into_validated(self) -> Result<Self, DockConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(DockConfigError::Validation(errors))
        }
    }
}

/// Errors that can occur when loading a configuration.
#[derive(Debug)]
pub enum DockConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for DockConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for DockConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
