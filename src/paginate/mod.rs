//! Pagination of rendered logical pages onto fixed-size physical pages.
//!
//! A logical page is rendered as one tall raster image. The engine cuts it
//! into vertical slices no taller than the printable height minus the footer
//! reserve and puts one slice on each physical page.

mod image;
mod text;

pub use image::{PhysicalPage, PlacedImage, RasterImage};
pub use text::{TextLayoutOptions, TextLine, TextPage, TextPaginator, TextStyle};

use crate::error::{Error, Result};
use crate::model::PageGeometry;

/// Heights within this distance of the slice limit count as equal.
const EPSILON: f64 = 1e-9;

/// Pagination options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaginationOptions {
    /// Vertical space kept free at the bottom of each page for the footer
    pub footer_reserve: f64,

    /// Most physical pages one logical page may occupy
    pub max_pages_per_source: usize,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            footer_reserve: 20.0,
            max_pages_per_source: 10_000,
        }
    }
}

impl PaginationOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footer reserve.
    pub fn with_footer_reserve(mut self, reserve: f64) -> Self {
        self.footer_reserve = reserve;
        self
    }

    /// Cap the physical pages produced from one logical page.
    pub fn with_max_pages_per_source(mut self, max: usize) -> Self {
        self.max_pages_per_source = max;
        self
    }
}

/// One logical page's rendered image, ready to be sliced.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceSource {
    pub image_id: String,

    /// Rendered height at the content width
    pub height: f64,

    /// 0-based logical page index
    pub logical_index: usize,

    /// Number of logical pages in the document
    pub logical_count: usize,
}

/// Cuts rendered images into physical pages for one geometry.
#[derive(Debug, Clone)]
pub struct Paginator {
    geometry: PageGeometry,
    options: PaginationOptions,
    limit: f64,
}

impl Paginator {
    /// Create a paginator.
    ///
    /// Fails when the geometry is invalid or leaves no room for content once
    /// the footer reserve is taken out.
    pub fn new(geometry: PageGeometry, options: PaginationOptions) -> Result<Self> {
        geometry.validate()?;
        if !options.footer_reserve.is_finite() || options.footer_reserve < 0.0 {
            return Err(Error::Configuration(format!(
                "footer reserve must be a non-negative number, got {}",
                options.footer_reserve
            )));
        }
        let limit = geometry.printable_height() - options.footer_reserve;
        if limit <= 0.0 {
            return Err(Error::Configuration(format!(
                "no room for content: printable height {} minus footer reserve {}",
                geometry.printable_height(),
                options.footer_reserve
            )));
        }
        Ok(Self {
            geometry,
            options,
            limit,
        })
    }

    /// Paginator for the given geometry with default options.
    pub fn with_geometry(geometry: PageGeometry) -> Result<Self> {
        Self::new(geometry, PaginationOptions::default())
    }

    /// The page geometry.
    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// The pagination options.
    pub fn options(&self) -> &PaginationOptions {
        &self.options
    }

    /// Maximum slice height that fits on one physical page.
    pub fn slice_height_limit(&self) -> f64 {
        self.limit
    }

    /// Number of physical pages an image of `height` occupies.
    ///
    /// Saturates at `usize::MAX` for absurd heights.
    pub fn page_count_for(&self, height: f64) -> usize {
        slice_count(height, self.limit) as usize
    }

    /// Cut one logical page into physical pages numbered from
    /// `first_physical_index`.
    ///
    /// Fails with [`Error::Configuration`] when the image would need more
    /// than `max_pages_per_source` pages.
    pub fn paginate(
        &self,
        source: &SliceSource,
        first_physical_index: usize,
    ) -> Result<Vec<PhysicalPage>> {
        let height = if source.height.is_finite() && source.height > EPSILON {
            source.height
        } else {
            0.0
        };
        let count = slice_count(height, self.limit);
        if count > self.options.max_pages_per_source as f64 {
            return Err(Error::Configuration(format!(
                "page {} is {} tall and would need {} pages (at most {} allowed)",
                source.logical_index + 1,
                height,
                count,
                self.options.max_pages_per_source
            )));
        }

        let count = count as usize;
        let pages = (0..count)
            .map(|i| {
                let offset = i as f64 * self.limit;
                let slice_height = if i + 1 == count {
                    (height - offset).max(0.0)
                } else {
                    self.limit
                };
                let index = first_physical_index + i;
                let placement = PlacedImage {
                    physical_page_index: index,
                    source_image_id: source.image_id.clone(),
                    source_y_offset: offset,
                    slice_height,
                    dest_x: self.geometry.margin,
                    dest_y: self.geometry.margin,
                    dest_width: self.geometry.content_width(),
                };

                let continued = i > 0;
                PhysicalPage {
                    index,
                    logical_index: source.logical_index,
                    continued,
                    footer: footer(source.logical_index, source.logical_count, continued),
                    placements: vec![placement],
                }
            })
            .collect();
        Ok(pages)
    }
}

/// Slices needed for `height`, as a float so huge heights cannot overflow.
///
/// A remainder within [`EPSILON`] of a slice boundary is absorbed into the
/// previous slice; non-positive and non-finite heights take one empty slice.
fn slice_count(height: f64, limit: f64) -> f64 {
    if !height.is_finite() || height <= EPSILON {
        return 1.0;
    }
    ((height - EPSILON) / limit).ceil().max(1.0)
}

/// Footer text for a physical page.
pub fn footer(logical_index: usize, logical_count: usize, continued: bool) -> String {
    let mut text = format!("Page {} of {}", logical_index + 1, logical_count);
    if continued {
        text.push_str(" (continued)");
    }
    text
}
