//! Physical page geometry.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Size and margin of an output page, all in one unit (millimetres for the
/// presets).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Page width
    pub width: f64,

    /// Page height
    pub height: f64,

    /// Margin applied on all four sides
    pub margin: f64,
}

impl PageGeometry {
    /// Create a validated geometry.
    ///
    /// Width and height must both exceed twice the margin.
    pub fn new(width: f64, height: f64, margin: f64) -> Result<Self> {
        let geometry = Self {
            width,
            height,
            margin,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// ISO A4 portrait, 20 mm margins.
    pub fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin: 20.0,
        }
    }

    /// US Letter portrait, 20 mm margins.
    pub fn letter() -> Self {
        Self {
            width: 215.9,
            height: 279.4,
            margin: 20.0,
        }
    }

    /// Check the geometry invariants.
    pub fn validate(&self) -> Result<()> {
        let values = [self.width, self.height, self.margin];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::Configuration(
                "page dimensions must be finite".into(),
            ));
        }
        if self.margin < 0.0 {
            return Err(Error::Configuration(format!(
                "margin must not be negative (got {})",
                self.margin
            )));
        }
        if self.width <= 2.0 * self.margin {
            return Err(Error::Configuration(format!(
                "page width {} leaves no room inside margins of {}",
                self.width, self.margin
            )));
        }
        if self.height <= 2.0 * self.margin {
            return Err(Error::Configuration(format!(
                "page height {} leaves no room inside margins of {}",
                self.height, self.margin
            )));
        }
        Ok(())
    }

    /// Width between the side margins.
    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    /// Height between the top and bottom margins.
    pub fn printable_height(&self) -> f64 {
        self.height - 2.0 * self.margin
    }

    /// Check if the page is wider than tall.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}
