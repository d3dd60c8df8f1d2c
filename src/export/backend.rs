//! Collaborators the export orchestrator drives.
//!
//! The orchestrator never rasterizes HTML or encodes PDF itself; both are
//! supplied by the host through these traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::PageGeometry;
use crate::paginate::{PhysicalPage, RasterImage, TextPage};

/// Rasterizes an HTML fragment at a fixed width.
#[async_trait]
pub trait VisualRenderer: Send + Sync {
    /// Render `html` laid out at `width` (geometry units) into one tall image.
    async fn render(&self, html: &str, width: f64) -> Result<RasterImage>;
}

/// Factory for PDF writers.
#[async_trait]
pub trait PdfBackend: Send + Sync {
    /// Start a new output document with the given page geometry.
    async fn begin(&self, geometry: &PageGeometry) -> Result<Box<dyn PdfWriter>>;
}

/// Incremental PDF output for one export.
///
/// Calls arrive in document order: the title page, then for each logical page
/// its image followed by the physical pages that show it. Text-only exports
/// send laid-out text pages instead of images.
#[async_trait]
pub trait PdfWriter: Send {
    /// Write the title page (physical page 0).
    async fn add_title_page(&mut self, page: &TitlePage) -> Result<()>;

    /// Register an image that later placements refer to by `id`.
    async fn add_image(&mut self, id: &str, image: &RasterImage) -> Result<()>;

    /// Append one physical page.
    async fn append_page(&mut self, page: &PhysicalPage) -> Result<()>;

    /// Append one physical page of laid-out text.
    async fn append_text_page(&mut self, page: &TextPage) -> Result<()> {
        Err(Error::Write(format!(
            "writer cannot draw text pages (page {})",
            page.index
        )))
    }

    /// Close the document and return its bytes.
    async fn finish(&mut self) -> Result<Vec<u8>>;
}

/// Contents of the export title page.
#[derive(Debug, Clone, PartialEq)]
pub struct TitlePage {
    pub title: String,
    pub generated_at: DateTime<Utc>,

    /// Number of logical pages
    pub page_count: usize,
}

impl TitlePage {
    /// Create a title page.
    pub fn new(title: impl Into<String>, generated_at: DateTime<Utc>, page_count: usize) -> Self {
        Self {
            title: title.into(),
            generated_at,
            page_count,
        }
    }

    /// Display lines, top to bottom.
    pub fn lines(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            format!("Created: {}", self.generated_at.format("%Y-%m-%d")),
            format!("Pages: {}", self.page_count),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_title_page_lines() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 15, 30, 0).unwrap();
        let page = TitlePage::new("Report", at, 4);
        assert_eq!(page.lines(), vec!["Report", "Created: 2024-03-09", "Pages: 4"]);
    }
}
