//! Plain text rendering for node trees.

use crate::model::{Document, Node};

use super::RenderOptions;

const BULLET: &str = "• ";

/// Convert a node tree to plain text.
///
/// Marks have no plain-text form and are dropped. Never fails.
pub fn to_text(node: &Node) -> String {
    let mut output = String::new();
    write_node(&mut output, node);
    output
}

/// Convert the selected pages of a document to plain text.
pub fn document_to_text(doc: &Document, options: &RenderOptions) -> String {
    let mut output = String::new();
    for (index, page) in doc.pages().iter().enumerate() {
        let number = index + 1;
        if !options.page_selection.includes(number) {
            continue;
        }
        if options.page_headers {
            output.push_str(&format!("Page {}\n\n", number));
        }
        write_node(&mut output, &page.content);
    }
    output
}

fn write_node(output: &mut String, node: &Node) {
    match node {
        Node::Document { content }
        | Node::Unknown { content, .. }
        | Node::Table { content } => write_children(output, content),
        Node::Paragraph { content, .. } | Node::Heading { content, .. } => {
            write_children(output, content);
            output.push_str("\n\n");
        }
        Node::Text { text, .. } => output.push_str(text),
        Node::BulletList { content } => {
            for item in content {
                output.push_str(BULLET);
                write_node(output, item);
            }
        }
        Node::OrderedList { start, content } => {
            for (offset, item) in content.iter().enumerate() {
                output.push_str(&format!("{}. ", *start as usize + offset));
                write_node(output, item);
            }
        }
        Node::ListItem { content } => {
            write_children(output, content);
            output.push('\n');
        }
        Node::Blockquote { content } => {
            output.push('"');
            write_children(output, content);
            output.push_str("\"\n\n");
        }
        Node::TableRow { content } => {
            let cells: Vec<String> = content.iter().map(to_text).collect();
            output.push_str(&cells.join("\t"));
            output.push('\n');
        }
        Node::TableCell { content, .. } | Node::TableHeader { content, .. } => {
            let start = output.len();
            write_children(output, content);
            if output.len() == start {
                output.push('\t');
            }
        }
        Node::Image { src, .. } => {
            output.push_str(&format!("[Image: {}]\n\n", src));
        }
        Node::HardBreak => output.push('\n'),
    }
}

fn write_children(output: &mut String, children: &[Node]) {
    for child in children {
        write_node(output, child);
    }
}
