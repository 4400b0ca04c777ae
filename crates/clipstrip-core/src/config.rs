// crates/clipstrip-core/src/config.rs
//
// Editor tunables. Every field has a serde default so a partial (or empty)
// JSON object is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::helpers::time::DEFAULT_MARKER_INTERVAL;
use crate::segments::DEFAULT_SEGMENT_WIDTH;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Width of one thumbnail / grid segment in seconds.
    pub segment_width_secs:   f64,
    /// Thumbnail still size. 160x90 keeps the 16:9 target.
    pub thumbnail_width:      u32,
    pub thumbnail_height:     u32,
    /// Spacing of ruler markers in seconds.
    pub marker_interval_secs: f64,
    /// Volume applied to a freshly created controller.
    pub default_volume:       f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            segment_width_secs:   DEFAULT_SEGMENT_WIDTH,
            thumbnail_width:      160,
            thumbnail_height:     90,
            marker_interval_secs: DEFAULT_MARKER_INTERVAL,
            default_volume:       1.0,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.segment_width_secs.is_finite() && self.segment_width_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "segment_width_secs must be positive, got {}", self.segment_width_secs
            )));
        }
        if !(self.marker_interval_secs.is_finite() && self.marker_interval_secs > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "marker_interval_secs must be positive, got {}", self.marker_interval_secs
            )));
        }
        if self.thumbnail_width == 0 || self.thumbnail_height == 0 {
            return Err(ConfigError::Invalid("thumbnail size must be non-zero".into()));
        }
        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(ConfigError::Invalid(format!(
                "default_volume must be in [0, 1], got {}", self.default_volume
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(EditorConfig::from_json_str("{}").unwrap(), EditorConfig::default());
    }

    #[test]
    fn partial_override() {
        let cfg = EditorConfig::from_json_str(r#"{ "segment_width_secs": 5.0 }"#).unwrap();
        assert_eq!(cfg.segment_width_secs, 5.0);
        assert_eq!(cfg.thumbnail_width, 160);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            EditorConfig::from_json_str(r#"{ "segment_width_secs": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EditorConfig::from_json_str(r#"{ "default_volume": 1.5 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(EditorConfig::from_json_str("not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{ "thumbnail_width": 320, "thumbnail_height": 180 }}"#).unwrap();
        let cfg = EditorConfig::load(f.path()).unwrap();
        assert_eq!((cfg.thumbnail_width, cfg.thumbnail_height), (320, 180));
    }
}
