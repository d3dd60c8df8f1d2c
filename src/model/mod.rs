//! Document model types.
//!
//! This module defines the content tree handed to the serializers and the
//! document/page containers around it. The model is data only; rendering
//! lives in [`crate::render`] and pagination in [`crate::paginate`].

mod document;
mod geometry;
mod node;

pub use document::{Document, DocumentSummary, Metadata, Page, DEFAULT_TITLE};
pub use geometry::PageGeometry;
pub use node::{Mark, Node, TextAlign};
