//! Node tree types for rich-text content.
//!
//! The tree mirrors the JSON produced by Tiptap-style editors: every node has
//! a `type`, optional `attrs`, optional `marks` (text only) and optional
//! `content`. Here each kind is a closed variant carrying only the attributes
//! that kind understands; kinds this crate does not know land in
//! [`Node::Unknown`] with their children intact.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A node in the content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Root of a page's content (`"doc"`)
    Document { content: Vec<Node> },

    /// A paragraph
    Paragraph {
        align: Option<TextAlign>,
        content: Vec<Node>,
    },

    /// A heading, level 1-6
    Heading {
        level: u8,
        align: Option<TextAlign>,
        content: Vec<Node>,
    },

    /// A run of text with inline marks
    Text { text: String, marks: Vec<Mark> },

    /// Unordered list
    BulletList { content: Vec<Node> },

    /// Ordered list, numbered from `start`
    OrderedList { start: u32, content: Vec<Node> },

    /// Item of either list kind
    ListItem { content: Vec<Node> },

    /// Block quotation
    Blockquote { content: Vec<Node> },

    /// Table
    Table { content: Vec<Node> },

    /// Table row
    TableRow { content: Vec<Node> },

    /// Body cell
    TableCell {
        colspan: u32,
        rowspan: u32,
        content: Vec<Node>,
    },

    /// Header cell
    TableHeader {
        colspan: u32,
        rowspan: u32,
        content: Vec<Node>,
    },

    /// Inline or block image
    Image {
        src: String,
        alt: Option<String>,
        title: Option<String>,
    },

    /// Forced line break
    HardBreak,

    /// Any node type not listed above
    Unknown { kind: String, content: Vec<Node> },
}

impl Node {
    /// Create an empty root node.
    pub fn empty_doc() -> Self {
        Node::Document {
            content: Vec::new(),
        }
    }

    /// Create a root node with children.
    pub fn doc(content: Vec<Node>) -> Self {
        Node::Document { content }
    }

    /// Create a left-aligned paragraph.
    pub fn paragraph(content: Vec<Node>) -> Self {
        Node::Paragraph {
            align: None,
            content,
        }
    }

    /// Create a heading; the level is clamped to 1-6.
    pub fn heading(level: u8, content: Vec<Node>) -> Self {
        Node::Heading {
            level: level.clamp(1, 6),
            align: None,
            content,
        }
    }

    /// Create an unmarked text node.
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    /// Create a text node with marks, applied first-innermost.
    pub fn marked_text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Node::Text {
            text: text.into(),
            marks,
        }
    }

    /// Create a bullet list.
    pub fn bullet_list(items: Vec<Node>) -> Self {
        Node::BulletList { content: items }
    }

    /// Create an ordered list starting at 1.
    pub fn ordered_list(items: Vec<Node>) -> Self {
        Node::OrderedList {
            start: 1,
            content: items,
        }
    }

    /// Create a list item.
    pub fn list_item(content: Vec<Node>) -> Self {
        Node::ListItem { content }
    }

    /// Create a blockquote.
    pub fn blockquote(content: Vec<Node>) -> Self {
        Node::Blockquote { content }
    }

    /// Create a table.
    pub fn table(rows: Vec<Node>) -> Self {
        Node::Table { content: rows }
    }

    /// Create a table row.
    pub fn table_row(cells: Vec<Node>) -> Self {
        Node::TableRow { content: cells }
    }

    /// Create a single-span body cell.
    pub fn table_cell(content: Vec<Node>) -> Self {
        Node::TableCell {
            colspan: 1,
            rowspan: 1,
            content,
        }
    }

    /// Create a single-span header cell.
    pub fn table_header(content: Vec<Node>) -> Self {
        Node::TableHeader {
            colspan: 1,
            rowspan: 1,
            content,
        }
    }

    /// Create an image.
    pub fn image(src: impl Into<String>) -> Self {
        Node::Image {
            src: src.into(),
            alt: None,
            title: None,
        }
    }

    /// The JSON `type` name of this node.
    pub fn type_name(&self) -> &str {
        match self {
            Node::Document { .. } => "doc",
            Node::Paragraph { .. } => "paragraph",
            Node::Heading { .. } => "heading",
            Node::Text { .. } => "text",
            Node::BulletList { .. } => "bulletList",
            Node::OrderedList { .. } => "orderedList",
            Node::ListItem { .. } => "listItem",
            Node::Blockquote { .. } => "blockquote",
            Node::Table { .. } => "table",
            Node::TableRow { .. } => "tableRow",
            Node::TableCell { .. } => "tableCell",
            Node::TableHeader { .. } => "tableHeader",
            Node::Image { .. } => "image",
            Node::HardBreak => "hardBreak",
            Node::Unknown { kind, .. } => kind,
        }
    }

    /// Child nodes; empty for leaf kinds.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Document { content }
            | Node::Paragraph { content, .. }
            | Node::Heading { content, .. }
            | Node::BulletList { content }
            | Node::OrderedList { content, .. }
            | Node::ListItem { content }
            | Node::Blockquote { content }
            | Node::Table { content }
            | Node::TableRow { content }
            | Node::TableCell { content, .. }
            | Node::TableHeader { content, .. }
            | Node::Unknown { content, .. } => content,
            Node::Text { .. } | Node::Image { .. } | Node::HardBreak => &[],
        }
    }

    /// Mutable access to the children of a container node.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { content }
            | Node::Paragraph { content, .. }
            | Node::Heading { content, .. }
            | Node::BulletList { content }
            | Node::OrderedList { content, .. }
            | Node::ListItem { content }
            | Node::Blockquote { content }
            | Node::Table { content }
            | Node::TableRow { content }
            | Node::TableCell { content, .. }
            | Node::TableHeader { content, .. }
            | Node::Unknown { content, .. } => Some(content),
            Node::Text { .. } | Node::Image { .. } | Node::HardBreak => None,
        }
    }

    /// Check if this kind never has children.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Text { .. } | Node::Image { .. } | Node::HardBreak)
    }

    /// Check if this is the root kind.
    pub fn is_document(&self) -> bool {
        matches!(self, Node::Document { .. })
    }

    /// Check if the tree holds no text, images or breaks.
    pub fn is_blank(&self) -> bool {
        match self {
            Node::Text { text, .. } => text.is_empty(),
            Node::Image { .. } | Node::HardBreak => false,
            _ => self.children().iter().all(Node::is_blank),
        }
    }

    /// Visit this node and all descendants in document order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Node)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Convert to Tiptap-style JSON.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String(self.type_name().to_string()));

        let mut attrs = Map::new();
        match self {
            Node::Paragraph { align, .. } => {
                if let Some(align) = align {
                    attrs.insert("textAlign".into(), align.as_str().into());
                }
            }
            Node::Heading { level, align, .. } => {
                attrs.insert("level".into(), (*level).into());
                if let Some(align) = align {
                    attrs.insert("textAlign".into(), align.as_str().into());
                }
            }
            Node::OrderedList { start, .. } => {
                attrs.insert("start".into(), (*start).into());
            }
            Node::TableCell {
                colspan, rowspan, ..
            }
            | Node::TableHeader {
                colspan, rowspan, ..
            } => {
                attrs.insert("colspan".into(), (*colspan).into());
                attrs.insert("rowspan".into(), (*rowspan).into());
            }
            Node::Image { src, alt, title } => {
                attrs.insert("src".into(), src.clone().into());
                if let Some(alt) = alt {
                    attrs.insert("alt".into(), alt.clone().into());
                }
                if let Some(title) = title {
                    attrs.insert("title".into(), title.clone().into());
                }
            }
            _ => {}
        }
        if !attrs.is_empty() {
            obj.insert("attrs".into(), Value::Object(attrs));
        }

        if let Node::Text { text, marks } = self {
            obj.insert("text".into(), Value::String(text.clone()));
            if !marks.is_empty() {
                obj.insert(
                    "marks".into(),
                    Value::Array(marks.iter().map(Mark::to_value).collect()),
                );
            }
        }

        let children = self.children();
        if !children.is_empty() {
            obj.insert(
                "content".into(),
                Value::Array(children.iter().map(Node::to_value).collect()),
            );
        }

        Value::Object(obj)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::empty_doc()
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        crate::input::NodeParser::lenient()
            .parse_value(&value)
            .map_err(serde::de::Error::custom)
    }
}

/// Inline formatting attached to a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    /// `<strong>`
    Bold,
    /// `<em>`
    Italic,
    /// `<u>`
    Underline,
    /// Hyperlink
    Link {
        href: Option<String>,
        target: Option<String>,
    },
    /// Any other mark type; kept for round trips, not rendered
    Unknown(String),
}

impl Mark {
    /// Create a link mark.
    pub fn link(href: impl Into<String>) -> Self {
        Mark::Link {
            href: Some(href.into()),
            target: None,
        }
    }

    /// The JSON `type` name of this mark.
    pub fn type_name(&self) -> &str {
        match self {
            Mark::Bold => "bold",
            Mark::Italic => "italic",
            Mark::Underline => "underline",
            Mark::Link { .. } => "link",
            Mark::Unknown(name) => name,
        }
    }

    /// Convert to Tiptap-style JSON.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".into(), Value::String(self.type_name().to_string()));
        if let Mark::Link { href, target } = self {
            let mut attrs = Map::new();
            if let Some(href) = href {
                attrs.insert("href".into(), href.clone().into());
            }
            if let Some(target) = target {
                attrs.insert("target".into(), target.clone().into());
            }
            if !attrs.is_empty() {
                obj.insert("attrs".into(), Value::Object(attrs));
            }
        }
        Value::Object(obj)
    }
}

/// Block text alignment (`textAlign` attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    /// Parse an alignment name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }

    /// The CSS keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}
