//! Tracing and motion options with TOML file support.
//!
//! Options serialize to/from TOML; every section is `#[serde(default)]` so
//! a file only needs the values it overrides.

mod motion;
mod tracing;

use std::path::Path;

pub use motion::MotionOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use tracing::{TracingOptions, DEFAULT_POINTS_ON_FIELDLINES, DEFAULT_POINTS_ON_PATH_LINE};

use crate::error::FieldlinesError;

/// Top-level options container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(default)]
pub struct Options {
    /// Source tracing parameters.
    pub tracing: TracingOptions,
    /// Motion and rendering parameters.
    pub motion: MotionOptions,
}

impl Options {
    /// Generate JSON Schema describing the options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Load options from a TOML file. Missing fields use defaults.
    pub fn load(path: &Path) -> Result<Self, FieldlinesError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| FieldlinesError::OptionsParse(e.to_string()))
    }

    /// Save options to a TOML file (pretty-printed).
    pub fn save(&self, path: &Path) -> Result<(), FieldlinesError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FieldlinesError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Copy with out-of-range values replaced by defaults.
    #[must_use]
    pub fn validated(self) -> Self {
        let mut motion = self.motion;
        if !(motion.fade_time.is_finite() && motion.fade_time >= 0.0) {
            log::warn!("fade_time = {} is invalid, using the default", motion.fade_time);
            motion.fade_time = MotionOptions::default().fade_time;
        }
        Self {
            tracing: self.tracing.validated(),
            motion,
        }
    }
}
