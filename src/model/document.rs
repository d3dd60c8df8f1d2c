//! Document-level types.

use super::Node;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title given to documents that arrive without one.
pub const DEFAULT_TITLE: &str = "Untitled Document";

/// Free-form document metadata.
pub type Metadata = Map<String, Value>;

/// A multi-page rich-text document.
///
/// A document always holds at least one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDocument")]
pub struct Document {
    /// Store id; empty until the first save
    pub id: String,

    /// Document title
    pub title: String,

    /// Logical pages, in order
    pages: Vec<Page>,

    /// Free-form metadata
    pub metadata: Metadata,

    /// First save time
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last save time
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Create an unsaved document with one empty page.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            pages: vec![Page::new("1", Node::empty_doc())],
            metadata: Metadata::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Create a document from existing pages.
    ///
    /// An empty page list is replaced by a single empty page.
    pub fn with_pages(title: impl Into<String>, pages: Vec<Page>) -> Self {
        let mut doc = Self::new(title);
        if !pages.is_empty() {
            doc.pages = pages;
        }
        doc
    }

    /// Number of logical pages (always at least 1).
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages in order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Get a page by 0-based index.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Get a mutable page by 0-based index.
    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    /// Find a page by id.
    pub fn find_page(&self, id: &str) -> Option<(usize, &Page)> {
        self.pages.iter().enumerate().find(|(_, p)| p.id == id)
    }

    /// Append an empty page and return it.
    pub fn add_page(&mut self) -> &Page {
        let page = Page::new(uuid::Uuid::new_v4().to_string(), Node::empty_doc());
        self.pages.push(page);
        &self.pages[self.pages.len() - 1]
    }

    /// Insert a page at `index` (0-based, may equal `page_count`).
    pub fn insert_page(&mut self, index: usize, page: Page) -> Result<()> {
        if index > self.pages.len() {
            return Err(Error::PageOutOfRange(index, self.pages.len()));
        }
        self.pages.insert(index, page);
        Ok(())
    }

    /// Remove the page at `index`.
    ///
    /// Removing the only page fails with [`Error::LastPage`] and leaves the
    /// document unchanged.
    pub fn delete_page(&mut self, index: usize) -> Result<Page> {
        if index >= self.pages.len() {
            return Err(Error::PageOutOfRange(index, self.pages.len()));
        }
        if self.pages.len() == 1 {
            return Err(Error::LastPage);
        }
        Ok(self.pages.remove(index))
    }

    /// Replace a page's content tree.
    pub fn set_page_content(&mut self, index: usize, content: Node) -> Result<()> {
        let count = self.pages.len();
        let page = self
            .pages
            .get_mut(index)
            .ok_or(Error::PageOutOfRange(index, count))?;
        page.content = Page::normalize_content(content);
        Ok(())
    }

    /// Set the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Check if the document has never been saved.
    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }

    /// Summary row for store listings.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            page_count: self.page_count(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

/// A logical page: one editor page of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page id, unique within the document
    #[serde(default)]
    pub id: String,

    /// Root content node (always a `doc` node)
    #[serde(default = "Node::empty_doc", deserialize_with = "deserialize_page_content")]
    pub content: Node,
}

impl Page {
    /// Create a page; non-root content is wrapped in a root node.
    pub fn new(id: impl Into<String>, content: Node) -> Self {
        Self {
            id: id.into(),
            content: Self::normalize_content(content),
        }
    }

    fn normalize_content(content: Node) -> Node {
        if content.is_document() {
            content
        } else {
            Node::doc(vec![content])
        }
    }

    /// Check if the page has no visible content.
    pub fn is_blank(&self) -> bool {
        self.content.is_blank()
    }
}

fn deserialize_page_content<'de, D>(deserializer: D) -> std::result::Result<Node, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let node = Node::deserialize(deserializer)?;
    Ok(Page::normalize_content(node))
}

/// Listing row returned by stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    #[serde(rename = "pageCount")]
    pub page_count: usize,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Wire shape accepted on input.
///
/// Older records carry a single `content` tree instead of `pages`; those load
/// as a one-page document.
#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    pages: Option<Vec<Page>>,
    #[serde(default)]
    content: Option<Node>,
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(default, rename = "createdAt", alias = "created_at")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "updatedAt", alias = "updated_at")]
    updated_at: Option<DateTime<Utc>>,
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        let pages = match (raw.pages, raw.content) {
            (Some(pages), _) if !pages.is_empty() => pages,
            (_, Some(content)) => vec![Page::new("1", content)],
            _ => Vec::new(),
        };
        let title = raw
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let mut doc = Document::with_pages(title, pages);
        doc.id = raw.id;
        doc.metadata = match raw.metadata {
            Some(Value::Object(map)) => map,
            _ => Metadata::new(),
        };
        doc.created_at = raw.created_at;
        doc.updated_at = raw.updated_at;
        doc
    }
}
