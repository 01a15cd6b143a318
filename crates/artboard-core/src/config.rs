//! Engine tunables.

use kurbo::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::{MAX_ZOOM, MIN_ZOOM};
use crate::history::MAX_UNDO_HISTORY;
use crate::snap::DEFAULT_SNAP_THRESHOLD;
use crate::widget::HANDLE_HIT_TOLERANCE;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Interaction tunables. Every field has a default, so partial JSON works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Artboard size in artboard units.
    pub artboard: Size,
    /// Snap distance in artboard units (default: 6).
    pub snap_threshold: f64,
    /// Screen distance before a press becomes a drag (default: 3).
    pub drag_threshold: f64,
    /// Smallest width/height a resize can produce (default: 10).
    pub min_size: f64,
    /// Arrow key nudge (default: 1).
    pub nudge_step: f64,
    /// Shift+arrow key nudge (default: 10).
    pub nudge_step_large: f64,
    /// Offset of a duplicated subtree from its original (default: 20).
    pub duplicate_offset: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Exponential wheel zoom rate per pixel of scroll (default: 0.01).
    pub wheel_zoom_speed: f64,
    /// Resize handle hit radius in screen pixels (default: 8).
    pub handle_hit_tolerance: f64,
    /// Undo depth (default: 50).
    pub max_history: usize,
    /// Screen padding used by fit-to-view (default: 40).
    pub fit_padding: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            artboard: Size::new(1440.0, 900.0),
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            drag_threshold: 3.0,
            min_size: 10.0,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            duplicate_offset: 20.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            wheel_zoom_speed: 0.01,
            handle_hit_tolerance: HANDLE_HIT_TOLERANCE,
            max_history: MAX_UNDO_HISTORY,
            fit_padding: 40.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("artboard.width", self.artboard.width),
            ("artboard.height", self.artboard.height),
            ("min_zoom", self.min_zoom),
            ("max_zoom", self.max_zoom),
            ("min_size", self.min_size),
            ("wheel_zoom_speed", self.wheel_zoom_speed),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }

        let non_negative = [
            ("snap_threshold", self.snap_threshold),
            ("drag_threshold", self.drag_threshold),
            ("nudge_step", self.nudge_step),
            ("nudge_step_large", self.nudge_step_large),
            ("handle_hit_tolerance", self.handle_hit_tolerance),
            ("fit_padding", self.fit_padding),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must not be negative, got {value}"),
                });
            }
        }

        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::Invalid {
                field: "min_zoom",
                reason: format!("{} exceeds max_zoom {}", self.min_zoom, self.max_zoom),
            });
        }
        if self.max_history == 0 {
            return Err(ConfigError::Invalid {
                field: "max_history",
                reason: "must keep at least one entry".to_string(),
            });
        }
        Ok(())
    }
}
