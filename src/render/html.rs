//! HTML rendering for node trees.
//!
//! Tables carry their border and padding styles inline: the output is often
//! rasterized in an isolated context where no application stylesheet exists.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::model::{Document, Mark, Node, Page, TextAlign};

use super::RenderOptions;

const TABLE_OPEN: &str = r#"<table border="1" style="border-collapse: collapse; width: 100%;">"#;
const CELL_STYLE: &str = "padding: 8px; border: 1px solid #ddd;";
const HEADER_STYLE: &str = "padding: 8px; border: 1px solid #ddd; background-color: #f5f5f5;";
const IMAGE_STYLE: &str = "max-width: 100%; height: auto;";

/// Body styling used for export rasterization and standalone output.
pub const CONTAINER_STYLE: &str =
    "font-family: Arial, sans-serif; font-size: 12px; line-height: 1.5; background-color: white; padding: 20px;";

/// Convert a node tree to HTML.
///
/// Never fails: unknown node types contribute their children only.
pub fn to_html(node: &Node) -> String {
    let mut output = String::new();
    write_node(&mut output, node);
    output
}

/// Convert one page's content to an HTML fragment.
pub fn page_to_html(page: &Page) -> String {
    to_html(&page.content)
}

/// Wrap a fragment in the styled container used for rasterization.
pub fn export_container(fragment: &str) -> String {
    format!(r#"<div style="{}">{}</div>"#, CONTAINER_STYLE, fragment)
}

/// Convert the selected pages of a document to HTML.
pub fn document_to_html(doc: &Document, options: &RenderOptions) -> String {
    let mut body = String::new();
    for (index, page) in doc.pages().iter().enumerate() {
        let number = index + 1;
        if !options.page_selection.includes(number) {
            continue;
        }
        let _ = write!(body, r#"<section class="page" data-page="{}">"#, number);
        write_node(&mut body, &page.content);
        body.push_str("</section>");
    }

    if options.standalone {
        standalone(&doc.title, &body)
    } else {
        body
    }
}

fn standalone(title: &str, body: &str) -> String {
    let mut html = String::with_capacity(body.len() + 256);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", encode_text(title));
    html.push_str("</head>\n<body>\n");
    html.push_str(&export_container(body));
    html.push_str("\n</body>\n</html>\n");
    html
}

fn write_node(output: &mut String, node: &Node) {
    match node {
        Node::Document { content } | Node::Unknown { content, .. } => {
            write_children(output, content);
        }
        Node::Paragraph { align, content } => {
            output.push_str("<p");
            write_align(output, *align);
            output.push('>');
            write_children(output, content);
            output.push_str("</p>");
        }
        Node::Heading {
            level,
            align,
            content,
        } => {
            let level = (*level).clamp(1, 6);
            let _ = write!(output, "<h{}", level);
            write_align(output, *align);
            output.push('>');
            write_children(output, content);
            let _ = write!(output, "</h{}>", level);
        }
        Node::Text { text, marks } => output.push_str(&render_text(text, marks)),
        Node::BulletList { content } => wrap(output, "ul", content),
        Node::OrderedList { start, content } => {
            if *start == 1 {
                output.push_str("<ol>");
            } else {
                let _ = write!(output, r#"<ol start="{}">"#, start);
            }
            write_children(output, content);
            output.push_str("</ol>");
        }
        Node::ListItem { content } => wrap(output, "li", content),
        Node::Blockquote { content } => wrap(output, "blockquote", content),
        Node::Table { content } => {
            output.push_str(TABLE_OPEN);
            write_children(output, content);
            output.push_str("</table>");
        }
        Node::TableRow { content } => wrap(output, "tr", content),
        Node::TableCell {
            colspan,
            rowspan,
            content,
        } => write_cell(output, "td", CELL_STYLE, *colspan, *rowspan, content),
        Node::TableHeader {
            colspan,
            rowspan,
            content,
        } => write_cell(output, "th", HEADER_STYLE, *colspan, *rowspan, content),
        Node::Image { src, alt, title } => {
            let _ = write!(output, r#"<img src="{}""#, encode_double_quoted_attribute(src));
            if let Some(alt) = alt {
                let _ = write!(output, r#" alt="{}""#, encode_double_quoted_attribute(alt));
            }
            if let Some(title) = title {
                let _ = write!(output, r#" title="{}""#, encode_double_quoted_attribute(title));
            }
            let _ = write!(output, r#" style="{}" />"#, IMAGE_STYLE);
        }
        Node::HardBreak => output.push_str("<br>"),
    }
}

fn write_children(output: &mut String, children: &[Node]) {
    for child in children {
        write_node(output, child);
    }
}

fn wrap(output: &mut String, tag: &str, children: &[Node]) {
    let _ = write!(output, "<{}>", tag);
    write_children(output, children);
    let _ = write!(output, "</{}>", tag);
}

fn write_align(output: &mut String, align: Option<TextAlign>) {
    match align {
        None | Some(TextAlign::Left) => {}
        Some(align) => {
            let _ = write!(output, r#" style="text-align: {}""#, align.as_str());
        }
    }
}

fn write_cell(
    output: &mut String,
    tag: &str,
    style: &str,
    colspan: u32,
    rowspan: u32,
    children: &[Node],
) {
    let _ = write!(output, r#"<{} style="{}""#, tag, style);
    if colspan > 1 {
        let _ = write!(output, r#" colspan="{}""#, colspan);
    }
    if rowspan > 1 {
        let _ = write!(output, r#" rowspan="{}""#, rowspan);
    }
    output.push('>');
    write_children(output, children);
    let _ = write!(output, "</{}>", tag);
}

/// Escape the text, then wrap it in each mark in order: the first mark ends
/// up innermost.
fn render_text(text: &str, marks: &[Mark]) -> String {
    let mut html = encode_text(text).into_owned();
    for mark in marks {
        html = match mark {
            Mark::Bold => format!("<strong>{}</strong>", html),
            Mark::Italic => format!("<em>{}</em>", html),
            Mark::Underline => format!("<u>{}</u>", html),
            Mark::Link { href, target } => {
                let href = href.as_deref().filter(|h| !h.is_empty()).unwrap_or("#");
                match target {
                    Some(target) => format!(
                        r#"<a href="{}" target="{}">{}</a>"#,
                        encode_double_quoted_attribute(href),
                        encode_double_quoted_attribute(target),
                        html
                    ),
                    None => format!(
                        r#"<a href="{}">{}</a>"#,
                        encode_double_quoted_attribute(href),
                        html
                    ),
                }
            }
            Mark::Unknown(_) => html,
        };
    }
    html
}
