//! # folio
//!
//! Rich-text document engine for Rust.
//!
//! Documents are Tiptap-style JSON node trees split into logical pages. This
//! library loads them, serializes them to HTML and plain text, paginates
//! rendered pages onto fixed-size physical pages for PDF export, and
//! debounces edits into autosaves.
//!
//! ## Quick Start
//!
//! ```no_run
//! use folio::{parse_file, render};
//!
//! fn main() -> folio::Result<()> {
//!     let doc = parse_file("document.json")?;
//!
//!     let html = render::document_to_html(&doc, &render::RenderOptions::default());
//!     println!("{}", html);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Serializers**: HTML (inline-styled, escaped) and plain text
//! - **Pagination**: slicing tall page renders onto fixed pages with footers
//! - **Export**: title page plus paginated content through pluggable
//!   renderer and PDF writer traits
//! - **Autosave**: debounced saves against a [`store::DocumentStore`]
//! - **Parallel processing**: uses Rayon to serialize pages up front

pub mod autosave;
pub mod error;
pub mod export;
pub mod input;
pub mod model;
pub mod paginate;
pub mod render;
pub mod store;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use autosave::{AutosaveOptions, AutosaveScheduler, AutosaveState};
pub use error::{Error, Result};
pub use export::{
    export_document, CancelFlag, ExportArtifact, ExportMode, ExportOptions, Exporter, PdfBackend,
    PdfWriter, TitlePage, VisualRenderer,
};
pub use input::{
    parse_bytes_with_options, parse_file_with_options, parse_node_str, parse_str_with_options,
    ErrorMode, ParseOptions,
};
pub use model::{
    Document, DocumentSummary, Mark, Metadata, Node, Page, PageGeometry, TextAlign,
};
pub use paginate::{
    PaginationOptions, Paginator, PhysicalPage, PlacedImage, RasterImage, TextLayoutOptions,
    TextPage, TextPaginator,
};
pub use render::{
    document_to_html, document_to_text, to_html, to_json, to_text, JsonFormat, OutputFormat,
    PageSelection, RenderOptions,
};
pub use store::{DocumentStore, FileStore, MemoryStore};

use std::path::Path;

/// Parse a document from a JSON string.
///
/// Accepts a full document, a legacy single-content record, or a bare node
/// tree. Malformed nodes fall back to defaults.
///
/// # Example
///
/// ```
/// let doc = folio::parse_str(r#"{"type": "doc", "content": []}"#).unwrap();
/// assert_eq!(doc.page_count(), 1);
/// ```
pub fn parse_str(json: &str) -> Result<Document> {
    parse_str_with_options(json, &ParseOptions::default())
}

/// Parse a document from JSON bytes.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    parse_bytes_with_options(data, &ParseOptions::default())
}

/// Parse a document from a JSON file.
///
/// # Example
///
/// ```no_run
/// let doc = folio::parse_file("document.json").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    parse_file_with_options(path, &ParseOptions::default())
}

/// Builder API for loading and rendering in one chain.
///
/// # Example
///
/// ```no_run
/// use folio::Folio;
///
/// let html = Folio::new()
///     .strict()
///     .with_standalone(true)
///     .parse_file("document.json")?
///     .to_html();
/// # Ok::<(), folio::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Folio {
    parse_options: ParseOptions,
    render_options: RenderOptions,
}

impl Folio {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject malformed nodes instead of recovering.
    pub fn strict(mut self) -> Self {
        self.parse_options = self.parse_options.strict();
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.render_options = self.render_options.with_pages(pages);
        self
    }

    /// Emit complete HTML documents.
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.render_options = self.render_options.with_standalone(standalone);
        self
    }

    /// Precede each page's text with a `Page N` line.
    pub fn with_page_headers(mut self, headers: bool) -> Self {
        self.render_options = self.render_options.with_page_headers(headers);
        self
    }

    /// Parse a JSON string.
    pub fn parse_str(self, json: &str) -> Result<FolioResult> {
        let document = parse_str_with_options(json, &self.parse_options)?;
        Ok(self.wrap(document))
    }

    /// Parse JSON bytes.
    pub fn parse_bytes(self, data: &[u8]) -> Result<FolioResult> {
        let document = parse_bytes_with_options(data, &self.parse_options)?;
        Ok(self.wrap(document))
    }

    /// Parse a JSON file.
    pub fn parse_file<P: AsRef<Path>>(self, path: P) -> Result<FolioResult> {
        let document = parse_file_with_options(path, &self.parse_options)?;
        Ok(self.wrap(document))
    }

    fn wrap(self, document: Document) -> FolioResult {
        FolioResult {
            document,
            render_options: self.render_options,
        }
    }
}

/// A loaded document plus the render options chosen on the builder.
#[derive(Debug, Clone)]
pub struct FolioResult {
    /// The parsed document
    pub document: Document,
    render_options: RenderOptions,
}

impl FolioResult {
    /// Convert to HTML.
    pub fn to_html(&self) -> String {
        render::document_to_html(&self.document, &self.render_options)
    }

    /// Render the selected pages as plain text.
    pub fn to_text(&self) -> String {
        render::document_to_text(&self.document, &self.render_options)
    }

    /// Convert to normalized JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
