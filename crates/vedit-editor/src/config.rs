//! Editor configuration.

use serde::Deserialize;

/// Tunables for an `EditorStore`.
///
/// Missing fields fall back to their defaults when deserialized, so a host
/// can pass a partial JSON object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undo steps kept. Default: **50**. Zero is treated as one.
    pub history_limit: usize,

    /// Zoom increment for `zoom_in` / `zoom_out`. Default: **0.1**.
    pub zoom_step: f32,

    /// Lower zoom clamp. Default: **0.1**.
    pub min_zoom: f32,

    /// Upper zoom clamp. Default: **4.0**.
    pub max_zoom: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: 50,
            zoom_step: 0.1,
            min_zoom: 0.1,
            max_zoom: 4.0,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) config and normalize it.
    ///
    /// # Errors
    /// Returns the `serde_json` error if the input is not a config object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::normalized)
    }

    /// Repair values that would make zooming misbehave. Non-positive or
    /// non-finite zoom values fall back to their defaults, and an inverted
    /// `min_zoom`/`max_zoom` pair is swapped.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        let usable = |v: f32| v.is_finite() && v > 0.0;
        if !usable(self.zoom_step) {
            log::warn!("config: zoomStep {} unusable, using {}", self.zoom_step, defaults.zoom_step);
            self.zoom_step = defaults.zoom_step;
        }
        if !usable(self.min_zoom) {
            self.min_zoom = defaults.min_zoom;
        }
        if !usable(self.max_zoom) {
            self.max_zoom = defaults.max_zoom;
        }
        if self.min_zoom > self.max_zoom {
            log::warn!("config: minZoom {} > maxZoom {}, swapping", self.min_zoom, self.max_zoom);
            std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
        }
        self
    }
}
