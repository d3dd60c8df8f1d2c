//! Input detection and parsing.
//!
//! Documents arrive as JSON in one of three shapes: a full document with
//! `pages`, an older single-`content` record, or a bare node tree. All three
//! load into a [`Document`].

use std::path::Path;

use log::debug;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::model::{Document, Mark, Node, Page, TextAlign, DEFAULT_TITLE};

/// Options for parsing input.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// How to treat attributes of the wrong shape
    pub error_mode: ErrorMode,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail on malformed nodes instead of falling back to defaults.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }
}

/// Error handling mode for malformed nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fall back to defaults and keep going
    #[default]
    Lenient,
    /// Fail with [`Error::MalformedNode`]
    Strict,
}

/// Shape of a JSON input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// Object with a `pages` array
    Document,
    /// Object with a single `content` tree and no `pages`
    LegacyDocument,
    /// A node tree (object with a `type`)
    Node,
}

impl InputShape {
    /// Detect the shape of a JSON value.
    pub fn detect(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidInput("expected a JSON object".into()))?;

        if obj.get("pages").is_some_and(Value::is_array) {
            return Ok(InputShape::Document);
        }
        if obj.get("content").is_some_and(Value::is_object) {
            return Ok(InputShape::LegacyDocument);
        }
        if obj.get("type").is_some_and(Value::is_string) {
            return Ok(InputShape::Node);
        }
        Err(Error::InvalidInput(
            "object has neither `pages`, `content` nor `type`".into(),
        ))
    }
}

/// Converts JSON values into [`Node`] trees.
#[derive(Debug, Clone, Copy)]
pub struct NodeParser {
    mode: ErrorMode,
}

impl NodeParser {
    /// Create a parser with the given mode.
    pub fn new(mode: ErrorMode) -> Self {
        Self { mode }
    }

    /// Parser that recovers from malformed attributes.
    pub fn lenient() -> Self {
        Self::new(ErrorMode::Lenient)
    }

    /// Parser that rejects malformed attributes.
    pub fn strict() -> Self {
        Self::new(ErrorMode::Strict)
    }

    /// Parse a node tree.
    pub fn parse_value(&self, value: &Value) -> Result<Node> {
        self.parse_at(value, "$")
    }

    fn parse_at(&self, value: &Value, path: &str) -> Result<Node> {
        let Some(obj) = value.as_object() else {
            return self.recover(unknown(""), path, "node is not an object");
        };
        let kind = match obj.get("type") {
            Some(Value::String(kind)) => kind.as_str(),
            _ => return self.recover(unknown(""), path, "node has no string `type`"),
        };

        let attrs = match obj.get("attrs") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(attrs)) => attrs.clone(),
            Some(_) => self.recover(Map::new(), path, "`attrs` is not an object")?,
        };
        let content = self.parse_content(obj, path)?;

        let node = match kind {
            "doc" | "document" => Node::Document { content },
            "paragraph" => Node::Paragraph {
                align: self.align(&attrs, path)?,
                content,
            },
            "heading" => {
                let level = self.number(&attrs, "level", 1, path)?;
                Node::Heading {
                    level: level.clamp(1, 6) as u8,
                    align: self.align(&attrs, path)?,
                    content,
                }
            }
            "text" => Node::Text {
                text: self.text(obj, path)?,
                marks: self.marks(obj, path)?,
            },
            "bulletList" => Node::BulletList { content },
            "orderedList" => Node::OrderedList {
                start: self.number(&attrs, "start", 1, path)?.min(u32::MAX as u64) as u32,
                content,
            },
            "listItem" => Node::ListItem { content },
            "blockquote" => Node::Blockquote { content },
            "table" => Node::Table { content },
            "tableRow" => Node::TableRow { content },
            "tableCell" => Node::TableCell {
                colspan: self.span(&attrs, "colspan", path)?,
                rowspan: self.span(&attrs, "rowspan", path)?,
                content,
            },
            "tableHeader" => Node::TableHeader {
                colspan: self.span(&attrs, "colspan", path)?,
                rowspan: self.span(&attrs, "rowspan", path)?,
                content,
            },
            "image" => Node::Image {
                src: self.string(&attrs, "src", path)?.unwrap_or_default(),
                alt: self.string(&attrs, "alt", path)?,
                title: self.string(&attrs, "title", path)?,
            },
            "hardBreak" => Node::HardBreak,
            other => unknown_with(other, content),
        };
        Ok(node)
    }

    fn parse_content(&self, obj: &Map<String, Value>, path: &str) -> Result<Vec<Node>> {
        match obj.get("content") {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.parse_at(item, &format!("{}.content[{}]", path, i)))
                .collect(),
            Some(_) => self.recover(Vec::new(), path, "`content` is not an array"),
        }
    }

    fn text(&self, obj: &Map<String, Value>, path: &str) -> Result<String> {
        match obj.get("text") {
            None | Some(Value::Null) => Ok(String::new()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => self.recover(String::new(), path, "`text` is not a string"),
        }
    }

    fn marks(&self, obj: &Map<String, Value>, path: &str) -> Result<Vec<Mark>> {
        let items = match obj.get("marks") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => return self.recover(Vec::new(), path, "`marks` is not an array"),
        };

        let mut marks = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let mark_path = format!("{}.marks[{}]", path, i);
            let Some(kind) = item.get("type").and_then(Value::as_str) else {
                self.recover((), &mark_path, "mark has no string `type`")?;
                continue;
            };
            let mark = match kind {
                "bold" => Mark::Bold,
                "italic" => Mark::Italic,
                "underline" => Mark::Underline,
                "link" => {
                    let attrs = match item.get("attrs") {
                        Some(Value::Object(attrs)) => attrs.clone(),
                        None | Some(Value::Null) => Map::new(),
                        Some(_) => {
                            self.recover(Map::new(), &mark_path, "`attrs` is not an object")?
                        }
                    };
                    Mark::Link {
                        href: self.string(&attrs, "href", &mark_path)?,
                        target: self.string(&attrs, "target", &mark_path)?,
                    }
                }
                other => Mark::Unknown(other.to_string()),
            };
            marks.push(mark);
        }
        Ok(marks)
    }

    fn align(&self, attrs: &Map<String, Value>, path: &str) -> Result<Option<TextAlign>> {
        match attrs.get("textAlign") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(TextAlign::parse(s)),
            Some(_) => self.recover(None, path, "`textAlign` is not a string"),
        }
    }

    fn string(&self, attrs: &Map<String, Value>, key: &str, path: &str) -> Result<Option<String>> {
        match attrs.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => self.recover(None, path, &format!("`{}` is not a string", key)),
        }
    }

    fn number(&self, attrs: &Map<String, Value>, key: &str, default: u64, path: &str) -> Result<u64> {
        let Some(value) = attrs.get(key) else {
            return Ok(default);
        };
        if value.is_null() {
            return Ok(default);
        }
        if let Some(n) = value.as_u64() {
            return Ok(n);
        }
        match value.as_f64() {
            Some(f) if f.is_finite() && f >= 0.0 => Ok(f as u64),
            _ => self.recover(
                default,
                path,
                &format!("`{}` is not a non-negative number", key),
            ),
        }
    }

    fn span(&self, attrs: &Map<String, Value>, key: &str, path: &str) -> Result<u32> {
        let n = self.number(attrs, key, 1, path)?;
        Ok(n.clamp(1, u32::MAX as u64) as u32)
    }

    fn recover<T>(&self, fallback: T, path: &str, message: &str) -> Result<T> {
        match self.mode {
            ErrorMode::Strict => Err(Error::MalformedNode(format!("{}: {}", path, message))),
            ErrorMode::Lenient => {
                debug!("Recovered malformed node at {}: {}", path, message);
                Ok(fallback)
            }
        }
    }
}

impl Default for NodeParser {
    fn default() -> Self {
        Self::lenient()
    }
}

fn unknown(kind: &str) -> Node {
    unknown_with(kind, Vec::new())
}

fn unknown_with(kind: &str, content: Vec<Node>) -> Node {
    Node::Unknown {
        kind: kind.to_string(),
        content,
    }
}

/// Parse a document from a JSON value.
pub fn parse_value(value: &Value, options: &ParseOptions) -> Result<Document> {
    let parser = NodeParser::new(options.error_mode);

    match InputShape::detect(value)? {
        InputShape::Node => {
            let node = parser.parse_value(value)?;
            Ok(Document::with_pages(
                DEFAULT_TITLE,
                vec![Page::new("1", node)],
            ))
        }
        InputShape::Document | InputShape::LegacyDocument => {
            if options.error_mode == ErrorMode::Strict {
                validate_trees(value, &parser)?;
            }
            Ok(serde_json::from_value(value.clone())?)
        }
    }
}

/// Run the strict parser over every tree in a document value.
fn validate_trees(value: &Value, parser: &NodeParser) -> Result<()> {
    if let Some(pages) = value.get("pages").and_then(Value::as_array) {
        for (i, page) in pages.iter().enumerate() {
            if let Some(content) = page.get("content") {
                parser.parse_at(content, &format!("$.pages[{}].content", i))?;
            }
        }
    }
    if let Some(content) = value.get("content") {
        parser.parse_at(content, "$.content")?;
    }
    Ok(())
}

/// Parse a document from a JSON string.
pub fn parse_str_with_options(json: &str, options: &ParseOptions) -> Result<Document> {
    let value: Value = serde_json::from_str(json)?;
    parse_value(&value, options)
}

/// Parse a document from JSON bytes.
pub fn parse_bytes_with_options(data: &[u8], options: &ParseOptions) -> Result<Document> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::InvalidInput("input is empty".into()));
    }
    let value: Value = serde_json::from_slice(data)?;
    parse_value(&value, options)
}

/// Parse a document from a JSON file.
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Document> {
    let data = std::fs::read(path)?;
    parse_bytes_with_options(&data, options)
}

/// Parse a single node tree from a JSON string.
pub fn parse_node_str(json: &str, options: &ParseOptions) -> Result<Node> {
    let value: Value = serde_json::from_str(json)?;
    NodeParser::new(options.error_mode).parse_value(&value)
}
