//! Serializers that turn node trees and documents into output formats.

mod html;
mod json;
mod options;
mod result;
mod text;

pub use html::{document_to_html, export_container, page_to_html, to_html, CONTAINER_STYLE};
pub use json::{to_json, to_json_value, JsonFormat};
pub use options::{PageSelection, RenderOptions};
pub use result::{render, ContentStats, OutputFormat, RenderResult};
pub use text::{document_to_text, to_text};
