//! Data model shared by every pipeline stage.
//!
//! Primitives and pages come out of the reader, clusters out of the
//! geometry clusterer, and the flow document out of the builder. Each stage
//! hands its result forward by value; nothing here is mutated after it has
//! been handed on.

mod cluster;
mod document;
mod fidelity;
mod geometry;
mod page;
mod paragraph;
mod primitive;
mod resource;
mod style;
mod table;

pub use cluster::{
    ClusterTree, Line, ParagraphCluster, RegionKind, Ruling, RulingGrid, TableRegion, Word,
};
pub use document::{
    DocumentNode, FlowDocument, ImageNode, Metadata, NodeOrigin, Placement, PlacementMode,
};
pub use fidelity::{FidelityEntry, FidelityNote, FidelityReason, FidelityReport};
pub use geometry::{Matrix, Point, Rect};
pub use page::Page;
pub use paragraph::{Paragraph, ParagraphStyle, TextRun};
pub use primitive::{
    ColorSpaceKind, FontDescriptor, FontRef, GlyphRun, ImagePrimitive, PathSegment, PathStyle,
    Primitive,
};
pub use resource::{ImageData, ImageEncoding};
pub use style::{half_points, Alignment, Color, StyleRecord};
pub use table::{GridCell, Table, TableGrid};
