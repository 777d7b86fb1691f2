use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::StyleError;

const SETTINGS_VERSION: u32 = 1;
const DEFAULT_MAX_DEPTH: usize = 256;
/// Hard cap on `max_depth`. Larger configured values are clamped to it.
pub const MAX_DEPTH_CEILING: usize = 1024;

/// Precision applied to numeric literals during compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, JsonSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NumberPrecision {
    /// Keep the full `f64` value.
    #[default]
    Double,
    /// Round through `f32` for engines that consume single-precision values.
    Single,
}

impl NumberPrecision {
    #[allow(clippy::cast_possible_truncation)]
    pub fn apply(self, n: f64) -> f64 {
        match self {
            NumberPrecision::Double => n,
            NumberPrecision::Single => f64::from(n as f32),
        }
    }
}

/// Expression compiler configuration, loadable from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[ts(export)]
pub struct CompilerSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Maximum operator nesting accepted before compilation is refused.
    /// Capped at [`MAX_DEPTH_CEILING`].
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub number_precision: NumberPrecision,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            max_depth: DEFAULT_MAX_DEPTH,
            number_precision: NumberPrecision::Double,
        }
    }
}

impl CompilerSettings {
    /// `max_depth` clamped to [`MAX_DEPTH_CEILING`].
    pub fn effective_max_depth(&self) -> usize {
        self.max_depth.min(MAX_DEPTH_CEILING)
    }
}

/// Load settings from a JSON file. Returns None if the file is missing or unreadable.
pub fn load_settings(path: &Path) -> Option<CompilerSettings> {
    if !path.exists() {
        return None;
    }
    let text = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<CompilerSettings>(&text) {
        Ok(mut settings) => {
            if settings.max_depth > MAX_DEPTH_CEILING {
                log::warn!(
                    "max_depth {} in {} exceeds {MAX_DEPTH_CEILING}, clamping",
                    settings.max_depth,
                    path.display()
                );
                settings.max_depth = MAX_DEPTH_CEILING;
            }
            Some(settings)
        }
        Err(e) => {
            log::warn!("Ignoring invalid settings file {}: {e}", path.display());
            None
        }
    }
}

/// Save settings as pretty JSON (atomic write via temp file + rename).
pub fn save_settings(path: &Path, settings: &CompilerSettings) -> Result<(), StyleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// JSON schema describing the settings file.
pub fn settings_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(CompilerSettings)).unwrap_or(serde_json::Value::Null)
}
