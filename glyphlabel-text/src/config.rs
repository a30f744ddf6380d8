//! Serializable label configuration.
//!
//! Every field is optional in JSON; missing fields take the label
//! defaults (48px, left aligned, word wrap on, opaque black, 800x600).
//!
//! ```json
//! { "text": "Hello", "x": 20, "y": 40, "max_width": 300,
//!   "alignment": "center", "flags": "WORD_WRAP | INDENTED" }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::label::LabelFlags;
use crate::layout::Alignment;

/// Default rasterization size.
pub const DEFAULT_PIXEL_SIZE: u32 = 48;

/// Everything needed to construct a label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// 0 = unconstrained.
    pub max_width: f32,
    /// 0 = unconstrained.
    pub max_height: f32,
    pub pixel_size: u32,
    pub alignment: Alignment,
    pub flags: LabelFlags,
    /// First-line indent in pixels; the pixel size when absent.
    pub indentation: Option<f32>,
    /// RGBA, 0..1.
    pub color: [f32; 4],
    pub aspect_ratio: f32,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            x: 0.0,
            y: 0.0,
            max_width: 0.0,
            max_height: 0.0,
            pixel_size: DEFAULT_PIXEL_SIZE,
            alignment: Alignment::Left,
            flags: LabelFlags::WORD_WRAP,
            indentation: None,
            color: [0.0, 0.0, 0.0, 1.0],
            aspect_ratio: 1.0,
            window_width: 800,
            window_height: 600,
        }
    }
}

impl LabelConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::debug!("LabelConfig: loaded {}", path.as_ref().display());
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
