//! Raster images and their placement on physical pages.

use serde::{Deserialize, Serialize};

/// A rendered bitmap of one logical page.
///
/// `width` and `height` are in the page geometry's unit; `pixel_data` is
/// opaque to the engine and passed through to the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: f64,
    pub height: f64,
    pub pixel_data: Vec<u8>,
}

impl RasterImage {
    /// Create a raster image.
    pub fn new(width: f64, height: f64, pixel_data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixel_data,
        }
    }

    /// Height after scaling the image to `target_width`.
    ///
    /// A zero-width image keeps its height.
    pub fn height_at(&self, target_width: f64) -> f64 {
        if self.width > 0.0 && self.width.is_finite() {
            self.height * target_width / self.width
        } else {
            self.height
        }
    }
}

/// One vertical slice of a raster image placed on a physical page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedImage {
    pub physical_page_index: usize,
    pub source_image_id: String,

    /// Top of the slice within the source image
    pub source_y_offset: f64,

    pub slice_height: f64,
    pub dest_x: f64,
    pub dest_y: f64,
    pub dest_width: f64,
}

/// A fixed-size output page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalPage {
    /// Position in the export, title page at 0
    pub index: usize,

    /// 0-based logical page this page was cut from
    pub logical_index: usize,

    /// Not the first physical page of its logical page
    pub continued: bool,

    /// Footer text, e.g. `Page 2 of 3 (continued)`
    pub footer: String,

    pub placements: Vec<PlacedImage>,
}

impl PhysicalPage {
    /// Total height of all slices on this page.
    pub fn content_height(&self) -> f64 {
        self.placements.iter().map(|p| p.slice_height).sum()
    }
}
