use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and threshold knobs for one resolver instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Quiet time after the last keystroke before a lookup is dispatched
    pub debounce_ms: u64,

    /// Minimum trimmed length (in chars) that is worth a network call
    pub min_query_chars: usize,

    /// How long after the last local edit external value pushes are ignored
    pub typing_quiet_ms: u64,

    /// Floating panel geometry
    pub panel: PanelGeometry,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_query_chars: 2,
            typing_quiet_ms: 500,
            panel: PanelGeometry::default(),
        }
    }
}

impl ResolverConfig {
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub const fn typing_quiet_period(&self) -> Duration {
        Duration::from_millis(self.typing_quiet_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_query_chars == 0 {
            return Err("min_query_chars must be > 0".to_string());
        }
        self.panel.validate()
    }
}

/// Pixel constants used to place the result panel under its anchor field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelGeometry {
    /// Panel is never narrower than this (unless the window is)
    pub min_width: f64,

    /// Total horizontal space kept free around the panel
    pub window_margin: f64,

    /// Minimum distance between the panel and either window edge
    pub edge_margin: f64,

    /// Vertical gap between the anchor's bottom edge and the panel
    pub gap: f64,

    /// Height after which the panel scrolls internally
    pub max_height: f64,
}

impl Default for PanelGeometry {
    fn default() -> Self {
        Self {
            min_width: 380.0,
            window_margin: 40.0,
            edge_margin: 20.0,
            gap: 4.0,
            max_height: 320.0,
        }
    }
}

impl PanelGeometry {
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("min_width", self.min_width),
            ("window_margin", self.window_margin),
            ("edge_margin", self.edge_margin),
            ("gap", self.gap),
            ("max_height", self.max_height),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("panel.{name} must be a finite, non-negative number"));
            }
        }
        if self.max_height == 0.0 {
            return Err("panel.max_height must be > 0".to_string());
        }
        Ok(())
    }
}
