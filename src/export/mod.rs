//! Export orchestration.
//!
//! An export writes a title page, then renders every logical page to a
//! raster image, paginates it and appends the resulting physical pages to a
//! [`PdfWriter`]. In [`ExportMode::Text`] the pages are laid out as plain
//! text lines instead and no renderer is called. The sequence is strictly
//! ordered and any failure aborts the whole export without output.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use folio::export::{ExportOptions, Exporter, PdfBackend, VisualRenderer};
//! use folio::Document;
//!
//! async fn run(
//!     doc: &Document,
//!     renderer: Arc<dyn VisualRenderer>,
//!     backend: Arc<dyn PdfBackend>,
//! ) -> folio::Result<()> {
//!     let exporter = Exporter::new(renderer, backend, ExportOptions::default())?;
//!     let artifact = exporter.export(doc).await?;
//!     std::fs::write(&artifact.file_name, &artifact.bytes)?;
//!     Ok(())
//! }
//! ```

mod backend;

pub use backend::{PdfBackend, PdfWriter, TitlePage, VisualRenderer};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{Document, Page, PageGeometry};
use crate::paginate::{PaginationOptions, Paginator, SliceSource, TextLayoutOptions, TextPaginator};
use crate::render::{export_container, page_to_html, to_text};

/// How logical pages reach the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// Rasterize each page's HTML and slice the image
    #[default]
    Raster,
    /// Lay out each page's plain text line by line
    Text,
}

/// Options for an export.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Physical page geometry
    pub geometry: PageGeometry,

    /// Pagination options
    pub pagination: PaginationOptions,

    /// Raster or text output
    pub mode: ExportMode,

    /// Line layout for [`ExportMode::Text`]
    pub text_layout: TextLayoutOptions,

    /// Serialize all pages' HTML on the rayon pool before rendering
    pub parallel: bool,

    /// Date shown on the title page (defaults to now)
    pub generated_at: Option<DateTime<Utc>>,
}

impl ExportOptions {
    /// Create export options with defaults (A4).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page geometry.
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Set pagination options.
    pub fn with_pagination(mut self, pagination: PaginationOptions) -> Self {
        self.pagination = pagination;
        self
    }

    /// Choose raster or text output.
    pub fn with_mode(mut self, mode: ExportMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the text line layout.
    pub fn with_text_layout(mut self, layout: TextLayoutOptions) -> Self {
        self.text_layout = layout;
        self
    }

    /// Enable or disable up-front parallel serialization.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fix the title page date.
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }
}

/// Where an export currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    TitlePage,
    /// Rendering logical page `page` (1-indexed) of `total`
    ContentPage { page: usize, total: usize },
    Done,
}

/// Progress callback.
pub type ProgressFn = Arc<dyn Fn(ExportStage) + Send + Sync>;

/// Shared cancellation flag, checked between logical pages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    /// Suggested file name derived from the title
    pub file_name: String,

    /// Bytes returned by the writer
    pub bytes: Vec<u8>,

    /// Physical pages written, title page included
    pub physical_pages: usize,
}

/// Drives one renderer and one PDF backend through exports.
pub struct Exporter {
    renderer: Arc<dyn VisualRenderer>,
    backend: Arc<dyn PdfBackend>,
    options: ExportOptions,
    paginator: Paginator,
    text_paginator: TextPaginator,
    progress: Option<ProgressFn>,
}

impl Exporter {
    /// Create an exporter.
    ///
    /// Fails with [`Error::Configuration`] when the geometry cannot hold any
    /// content, before anything is rendered.
    pub fn new(
        renderer: Arc<dyn VisualRenderer>,
        backend: Arc<dyn PdfBackend>,
        options: ExportOptions,
    ) -> Result<Self> {
        let paginator = Paginator::new(options.geometry, options.pagination)?;
        let text_paginator = TextPaginator::new(options.geometry, options.text_layout)?;
        Ok(Self {
            renderer,
            backend,
            options,
            paginator,
            text_paginator,
            progress: None,
        })
    }

    /// Report stage changes to `progress`.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The export options.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export a document.
    pub async fn export(&self, doc: &Document) -> Result<ExportArtifact> {
        self.export_with_cancel(doc, &CancelFlag::new()).await
    }

    /// Export a document, stopping early if `cancel` is set.
    pub async fn export_with_cancel(
        &self,
        doc: &Document,
        cancel: &CancelFlag,
    ) -> Result<ExportArtifact> {
        let total = doc.page_count();
        log::info!(
            "Exporting {:?} ({} pages, {:?})",
            doc.title,
            total,
            self.options.mode
        );

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut writer = self
            .backend
            .begin(&self.options.geometry)
            .await
            .map_err(write_error)?;

        self.report(ExportStage::TitlePage);
        let generated_at = self.options.generated_at.unwrap_or_else(Utc::now);
        writer
            .add_title_page(&TitlePage::new(doc.title.as_str(), generated_at, total))
            .await
            .map_err(write_error)?;

        let content_pages = match self.options.mode {
            ExportMode::Raster => self.write_raster_pages(doc, writer.as_mut(), cancel).await?,
            ExportMode::Text => self.write_text_pages(doc, writer.as_mut(), cancel).await?,
        };

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let bytes = writer.finish().await.map_err(write_error)?;
        self.report(ExportStage::Done);

        let artifact = ExportArtifact {
            file_name: export_file_name(&doc.title),
            bytes,
            physical_pages: content_pages + 1,
        };
        log::info!(
            "Exported {} ({} physical pages, {} bytes)",
            artifact.file_name,
            artifact.physical_pages,
            artifact.bytes.len()
        );
        Ok(artifact)
    }

    /// Render, slice and append every logical page. Returns the number of
    /// physical pages written.
    async fn write_raster_pages(
        &self,
        doc: &Document,
        writer: &mut dyn PdfWriter,
        cancel: &CancelFlag,
    ) -> Result<usize> {
        let total = doc.page_count();
        let width = self.options.geometry.content_width();

        let mut prepared = if self.options.parallel {
            let html: Vec<String> = doc.pages().par_iter().map(render_page).collect();
            Some(html.into_iter())
        } else {
            None
        };

        let mut next_index = 1;
        for (index, page) in doc.pages().iter().enumerate() {
            self.begin_page(doc, index, cancel)?;

            let html = match prepared.as_mut().and_then(Iterator::next) {
                Some(html) => html,
                None => render_page(page),
            };
            let image = self
                .renderer
                .render(&html, width)
                .await
                .map_err(|e| render_error(index + 1, e))?;

            let image_id = format!("page-{}", index + 1);
            writer
                .add_image(&image_id, &image)
                .await
                .map_err(write_error)?;

            let source = SliceSource {
                image_id,
                height: image.height_at(width),
                logical_index: index,
                logical_count: total,
            };
            let physical_pages = self
                .paginator
                .paginate(&source, next_index)
                .map_err(|e| render_error(index + 1, e))?;
            for physical in physical_pages {
                writer.append_page(&physical).await.map_err(write_error)?;
                next_index += 1;
            }
        }
        Ok(next_index - 1)
    }

    /// Lay out and append every logical page as text. Returns the number of
    /// physical pages written.
    async fn write_text_pages(
        &self,
        doc: &Document,
        writer: &mut dyn PdfWriter,
        cancel: &CancelFlag,
    ) -> Result<usize> {
        let total = doc.page_count();
        let mut next_index = 1;
        for (index, page) in doc.pages().iter().enumerate() {
            self.begin_page(doc, index, cancel)?;

            let text = to_text(&page.content);
            for text_page in self.text_paginator.paginate(&text, index, total, next_index) {
                writer
                    .append_text_page(&text_page)
                    .await
                    .map_err(write_error)?;
                next_index += 1;
            }
        }
        Ok(next_index - 1)
    }

    fn begin_page(&self, doc: &Document, index: usize, cancel: &CancelFlag) -> Result<()> {
        if cancel.is_cancelled() {
            log::info!("Export of {:?} cancelled before page {}", doc.title, index + 1);
            return Err(Error::Cancelled);
        }
        self.report(ExportStage::ContentPage {
            page: index + 1,
            total: doc.page_count(),
        });
        Ok(())
    }

    fn report(&self, stage: ExportStage) {
        if let Some(progress) = &self.progress {
            progress(stage);
        }
    }
}

/// Export a document with default options for `geometry`.
pub async fn export_document(
    doc: &Document,
    geometry: PageGeometry,
    renderer: Arc<dyn VisualRenderer>,
    backend: Arc<dyn PdfBackend>,
) -> Result<ExportArtifact> {
    let options = ExportOptions::new().with_geometry(geometry);
    Exporter::new(renderer, backend, options)?.export(doc).await
}

/// File name for an exported title: every character outside `[a-z0-9]`
/// becomes `_`.
pub fn export_file_name(title: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let re = UNSAFE.get_or_init(|| Regex::new(r"(?i)[^a-z0-9]").expect("valid pattern"));
    format!("{}.pdf", re.replace_all(title, "_").to_lowercase())
}

fn render_page(page: &Page) -> String {
    export_container(&page_to_html(page))
}

fn render_error(page: usize, err: Error) -> Error {
    let message = match err {
        Error::Render { message, .. } => message,
        other => other.to_string(),
    };
    Error::Render { page, message }
}

fn write_error(err: Error) -> Error {
    match err {
        Error::Write(_) => err,
        other => Error::Write(other.to_string()),
    }
}
