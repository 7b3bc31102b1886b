//! Document model types.
//!
//! Two representations live here: the layered document (one text buffer
//! annotated by named entity layers) and the hierarchical source document
//! (pages of typed, positioned content items).

mod document;
mod entity;
mod geometry;
mod page;
mod paragraph;
mod resource;
pub(crate) mod source;
mod table;

pub(crate) use document::char_slice;
pub use document::{layers, Document, PageInfo};
pub use entity::{Entity, Metadata};
pub use geometry::{BoundingBox, Span};
pub use page::{ContentItem, SourcePage};
pub use paragraph::{Sentence, TextCategory, TextItem, Word};
pub use resource::{FigureItem, KeyValueItem};
pub use source::{RawLine, SourceDocument};
pub use table::{TableCell, TableItem};
