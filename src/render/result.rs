//! Format dispatch and content statistics.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use super::{document_to_html, document_to_text, to_json, JsonFormat, RenderOptions};
use crate::error::Result;
use crate::model::{Document, Node};

/// Output format for [`render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Text,
    Json,
}

impl OutputFormat {
    /// MIME type of the rendered content.
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Html => "text/html",
            OutputFormat::Text => "text/plain",
            OutputFormat::Json => "application/json",
        }
    }

    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

/// Rendered output tagged with its MIME type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    /// The rendered content
    pub content: String,

    /// MIME type of `content`
    pub mime_type: String,

    /// Counts over the selected pages, zeroed unless requested
    pub stats: ContentStats,
}

impl RenderResult {
    /// Wrap content without statistics.
    pub fn content_only(content: String, format: OutputFormat) -> Self {
        Self {
            content,
            mime_type: format.mime_type().to_string(),
            stats: ContentStats::default(),
        }
    }

    /// Size of the content in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// Counts gathered by walking the selected pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStats {
    pub page_count: u32,
    pub paragraph_count: u32,
    pub heading_count: u32,
    pub table_count: u32,
    pub image_count: u32,
    pub list_item_count: u32,

    /// Whitespace-separated tokens in text nodes
    pub word_count: u32,

    /// Non-whitespace characters in text nodes
    pub char_count: u32,
}

impl ContentStats {
    /// Collect statistics for the selected pages of a document.
    pub fn collect(doc: &Document, options: &RenderOptions) -> Self {
        let mut stats = Self::default();
        for (index, page) in doc.pages().iter().enumerate() {
            if options.page_selection.includes(index + 1) {
                stats.page_count += 1;
                stats.add_tree(&page.content);
            }
        }
        stats
    }

    /// Add the counts of one node tree.
    pub fn add_tree(&mut self, root: &Node) {
        root.walk(&mut |node| match node {
            Node::Paragraph { .. } => self.paragraph_count += 1,
            Node::Heading { .. } => self.heading_count += 1,
            Node::Table { .. } => self.table_count += 1,
            Node::Image { .. } => self.image_count += 1,
            Node::ListItem { .. } => self.list_item_count += 1,
            Node::Text { text, .. } => self.add_text(text),
            _ => {}
        });
    }

    /// Count the words and visible characters of a text run.
    pub fn add_text(&mut self, text: &str) {
        for word in text.split_whitespace() {
            self.word_count += 1;
            self.char_count += word.chars().count() as u32;
        }
    }
}

impl AddAssign<&ContentStats> for ContentStats {
    fn add_assign(&mut self, rhs: &ContentStats) {
        let ContentStats {
            page_count,
            paragraph_count,
            heading_count,
            table_count,
            image_count,
            list_item_count,
            word_count,
            char_count,
        } = *rhs;
        self.page_count += page_count;
        self.paragraph_count += paragraph_count;
        self.heading_count += heading_count;
        self.table_count += table_count;
        self.image_count += image_count;
        self.list_item_count += list_item_count;
        self.word_count += word_count;
        self.char_count += char_count;
    }
}

/// Render a document in the given format.
pub fn render(doc: &Document, format: OutputFormat, options: &RenderOptions) -> Result<RenderResult> {
    let content = match format {
        OutputFormat::Html => document_to_html(doc, options),
        OutputFormat::Text => document_to_text(doc, options),
        OutputFormat::Json => to_json(doc, JsonFormat::Pretty)?,
    };

    let mut result = RenderResult::content_only(content, format);
    if options.collect_stats {
        result.stats = ContentStats::collect(doc, options);
        log::debug!("Rendered {:?}: {:?}", doc.title, result.stats);
    }
    Ok(result)
}
