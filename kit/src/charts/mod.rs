//! Figures that can be rendered to PNG files.
//!
//! A [`Figure`] owns everything it needs to draw itself, so persisting one is
//! a single call with a path and [`FigureOptions`].

pub mod correlation;
pub mod fonts;
pub mod regression;

pub use correlation::CorrelationFigure;
pub use fonts::{init_fonts, text_available, FONT_ENV};
pub use regression::RegressionFigure;

use crate::error::{KitError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub trait Figure {
    /// Human-readable title; also the seed of the saved file name.
    fn title(&self) -> &str;

    fn render(&self, path: &Path, options: &FigureOptions) -> Result<()>;
}

/// Output size and resolution of a rendered figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureOptions {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            width_in: 8.0,
            height_in: 6.0,
            dpi: 600,
        }
    }
}

impl FigureOptions {
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |inches: f64| ((inches * self.dpi as f64).round() as u32).max(1);
        (px(self.width_in), px(self.height_in))
    }

    /// Multiplier for sizes given at 100 dpi.
    pub fn scale(&self) -> f64 {
        self.dpi as f64 / 100.0
    }

    pub(crate) fn scaled(&self, size: f64) -> u32 {
        (size * self.scale()).round().max(1.0) as u32
    }
}

pub(crate) fn render_error(path: &Path, error: impl std::fmt::Debug) -> KitError {
    KitError::Render {
        path: path.to_path_buf(),
        message: format!("{:?}", error),
    }
}
