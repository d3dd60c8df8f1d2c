//! Line-based pagination for text-only exports.
//!
//! Each logical page becomes a `Page N` header followed by its plain text,
//! wrapped to the content width and laid out top to bottom at a fixed line
//! height. A new physical page starts whenever the next line would begin
//! below the bottom margin.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Document, PageGeometry};
use crate::render::to_text;

use super::footer;

/// Options for text layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayoutOptions {
    /// Vertical advance per line
    pub line_height: f64,

    /// Average glyph advance used to turn the content width into a
    /// character budget
    pub char_width: f64,

    /// Distance of the footer baseline from the bottom edge
    pub footer_offset: f64,
}

impl Default for TextLayoutOptions {
    fn default() -> Self {
        Self {
            line_height: 7.0,
            char_width: 2.1,
            footer_offset: 10.0,
        }
    }
}

impl TextLayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_height(mut self, line_height: f64) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_char_width(mut self, char_width: f64) -> Self {
        self.char_width = char_width;
        self
    }
}

/// Role of a laid-out line; decides its font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    Header,
    Body,
    Footer,
}

impl TextStyle {
    /// Font size in points.
    pub fn font_size(&self) -> f64 {
        match self {
            TextStyle::Header => 14.0,
            TextStyle::Body => 12.0,
            TextStyle::Footer => 10.0,
        }
    }
}

/// One line of text at a baseline position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub style: TextStyle,
    /// Centered on `x` rather than starting at it
    pub centered: bool,
}

/// A physical page of laid-out text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPage {
    /// Physical page index (the title page is 0)
    pub index: usize,

    /// 0-based logical page this page belongs to
    pub logical_index: usize,

    /// Whether an earlier physical page holds the start of the logical page
    pub continued: bool,

    pub lines: Vec<TextLine>,
}

impl TextPage {
    /// The footer line, present on the last physical page of each logical
    /// page.
    pub fn footer(&self) -> Option<&TextLine> {
        self.lines.iter().find(|l| l.style == TextStyle::Footer)
    }

    /// Body lines in order.
    pub fn body(&self) -> impl Iterator<Item = &TextLine> {
        self.lines.iter().filter(|l| l.style == TextStyle::Body)
    }
}

/// Lays plain text out on fixed-size pages.
#[derive(Debug, Clone)]
pub struct TextPaginator {
    geometry: PageGeometry,
    options: TextLayoutOptions,
    max_chars: usize,
}

impl TextPaginator {
    /// Create a text paginator.
    pub fn new(geometry: PageGeometry, options: TextLayoutOptions) -> Result<Self> {
        geometry.validate()?;
        for (name, value) in [
            ("line height", options.line_height),
            ("character width", options.char_width),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Configuration(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if !options.footer_offset.is_finite() || options.footer_offset < 0.0 {
            return Err(Error::Configuration(format!(
                "footer offset must not be negative, got {}",
                options.footer_offset
            )));
        }

        let max_chars = ((geometry.content_width() / options.char_width).floor() as usize).max(1);
        Ok(Self {
            geometry,
            options,
            max_chars,
        })
    }

    /// Text paginator for the given geometry with default options.
    pub fn with_geometry(geometry: PageGeometry) -> Result<Self> {
        Self::new(geometry, TextLayoutOptions::default())
    }

    /// Characters that fit on one line.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Lay out one logical page's text, numbering physical pages from
    /// `first_physical_index`.
    pub fn paginate(
        &self,
        text: &str,
        logical_index: usize,
        logical_count: usize,
        first_physical_index: usize,
    ) -> Vec<TextPage> {
        let PageGeometry {
            width,
            height,
            margin,
        } = self.geometry;
        let line_height = self.options.line_height;

        let mut pages = vec![TextPage {
            index: first_physical_index,
            logical_index,
            continued: false,
            lines: Vec::new(),
        }];
        let mut y = margin;

        push_line(
            &mut pages,
            format!("Page {}", logical_index + 1),
            margin,
            y,
            TextStyle::Header,
        );
        y += line_height * 2.0;

        for line in text.split('\n') {
            for wrapped in textwrap::wrap(line, self.max_chars) {
                if y > height - margin {
                    let index = first_physical_index + pages.len();
                    pages.push(TextPage {
                        index,
                        logical_index,
                        continued: true,
                        lines: Vec::new(),
                    });
                    y = margin;
                }
                push_line(&mut pages, wrapped.into_owned(), margin, y, TextStyle::Body);
                y += line_height;
            }
        }

        let last = pages.len() - 1;
        pages[last].lines.push(TextLine {
            text: footer(logical_index, logical_count, false),
            x: width / 2.0,
            y: height - self.options.footer_offset,
            style: TextStyle::Footer,
            centered: true,
        });
        pages
    }

    /// Lay out every page of a document after a title page at index 0.
    pub fn layout_document(&self, doc: &Document) -> Vec<TextPage> {
        let count = doc.page_count();
        let mut pages = Vec::new();
        for (index, page) in doc.pages().iter().enumerate() {
            let first = pages.len() + 1;
            pages.extend(self.paginate(&to_text(&page.content), index, count, first));
        }
        pages
    }
}

fn push_line(pages: &mut [TextPage], text: String, x: f64, y: f64, style: TextStyle) {
    if let Some(page) = pages.last_mut() {
        page.lines.push(TextLine {
            text,
            x,
            y,
            style,
            centered: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    fn a4() -> TextPaginator {
        TextPaginator::with_geometry(PageGeometry::a4()).unwrap()
    }

    #[test]
    fn test_short_text_one_page() {
        let pages = a4().paginate("Hello\n\n", 0, 1, 1);
        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert_eq!(page.index, 1);
        assert_eq!(page.lines[0].text, "Page 1");
        assert_eq!(page.lines[0].y, 20.0);

        let body: Vec<(&str, f64)> = page.body().map(|l| (l.text.as_str(), l.y)).collect();
        assert_eq!(body, vec![("Hello", 34.0), ("", 41.0), ("", 48.0)]);

        let footer = page.footer().unwrap();
        assert_eq!(footer.text, "Page 1 of 1");
        assert_eq!((footer.x, footer.y), (105.0, 287.0));
        assert!(footer.centered);
    }

    #[test]
    fn test_long_line_wraps_to_width() {
        let paginator = a4();
        assert_eq!(paginator.max_chars(), 80);
        let line = "word ".repeat(40);
        let pages = paginator.paginate(&line, 0, 1, 1);
        let body: Vec<&TextLine> = pages[0].body().collect();
        assert_eq!(body.len(), 3);
        assert!(body.iter().all(|l| l.text.chars().count() <= 80));
    }

    #[test]
    fn test_breaks_below_bottom_margin() {
        // 100 tall, margin 10: header at 10, body from 24 while y <= 90
        let geometry = PageGeometry::new(100.0, 100.0, 10.0).unwrap();
        let paginator = TextPaginator::with_geometry(geometry).unwrap();
        let text = vec!["x"; 20].join("\n");

        let pages = paginator.paginate(&text, 1, 3, 5);
        let first: Vec<f64> = pages[0].body().map(|l| l.y).collect();
        assert_eq!(first, vec![24.0, 31.0, 38.0, 45.0, 52.0, 59.0, 66.0, 73.0, 80.0, 87.0]);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].index, 6);
        assert!(pages[1].continued);
        assert_eq!(pages[1].body().next().unwrap().y, 10.0);
        assert_eq!(pages[1].body().count(), 10);

        assert!(pages[0].footer().is_none());
        assert_eq!(pages[1].footer().unwrap().text, "Page 2 of 3");
    }

    #[test]
    fn test_layout_document_numbers_after_title() {
        let mut doc = Document::new("Two");
        doc.set_page_content(0, Node::paragraph(vec![Node::text("one")]))
            .unwrap();
        doc.add_page();

        let pages = a4().layout_document(&doc);
        let indices: Vec<usize> = pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(pages[1].lines[0].text, "Page 2");
        assert_eq!(pages[1].footer().unwrap().text, "Page 2 of 2");
    }

    #[test]
    fn test_rejects_bad_options() {
        let zero = TextLayoutOptions::new().with_line_height(0.0);
        assert!(matches!(
            TextPaginator::new(PageGeometry::a4(), zero),
            Err(Error::Configuration(_))
        ));
        let nan = TextLayoutOptions::new().with_char_width(f64::NAN);
        assert!(TextPaginator::new(PageGeometry::a4(), nan).is_err());
    }
}
