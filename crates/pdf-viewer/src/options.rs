use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Zoom every controller starts at
pub const BASE_ZOOM_PERCENT: u32 = 100;

/// Viewer configuration supplied by the host
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewerOptions {
    /// Document to show
    pub src: DocumentSource,

    /// Percentage points added or removed per zoom command
    #[cfg_attr(feature = "serde", serde(default = "default_zoom_step"))]
    pub zoom_step: u32,

    /// Floor for the zoom percentage
    #[cfg_attr(feature = "serde", serde(default = "default_min_zoom"))]
    pub min_zoom: u32,
}

fn default_zoom_step() -> u32 {
    10
}

fn default_min_zoom() -> u32 {
    20
}

impl ViewerOptions {
    pub fn new(src: impl Into<DocumentSource>) -> Self {
        Self {
            src: src.into(),
            zoom_step: default_zoom_step(),
            min_zoom: default_min_zoom(),
        }
    }

    pub fn with_zoom_step(mut self, zoom_step: u32) -> Self {
        self.zoom_step = zoom_step;
        self
    }

    pub fn with_min_zoom(mut self, min_zoom: u32) -> Self {
        self.min_zoom = min_zoom;
        self
    }

    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| ViewerError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ViewerError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.zoom_step == 0 {
            return Err(ViewerError::Config(
                "Zoom step must be greater than zero".to_string(),
            ));
        }

        if self.min_zoom == 0 {
            return Err(ViewerError::Config(
                "Minimum zoom must be at least 1%".to_string(),
            ));
        }

        // The starting zoom has to respect the floor
        if self.min_zoom > BASE_ZOOM_PERCENT {
            return Err(ViewerError::Config(format!(
                "Minimum zoom {}% is above the initial zoom of {}%",
                self.min_zoom, BASE_ZOOM_PERCENT
            )));
        }

        Ok(())
    }
}
