//! Layout reconstruction: pages of primitives → a flow document.
//!
//! Per page, the [`GeometryClusterer`] groups glyphs into words, lines and
//! paragraphs and proposes table regions, the [`TableExtractor`] turns those
//! regions into grids, and the [`StyleResolver`] gives every glyph run a
//! style. The [`FlowBuilder`] then orders the blocks of all pages into a
//! single [`FlowDocument`](crate::model::FlowDocument).

mod builder;
mod clusterer;
mod config;
mod gutter;
mod pipeline;
mod rulings;
mod style;
mod table_extractor;
pub mod text;

#[cfg(test)]
pub(crate) mod fixtures;

pub use builder::{column_boundaries, reading_order, FlowBuilder, FontStatistics};
pub use clusterer::GeometryClusterer;
pub use config::{LayoutConfig, TableDetectionMode, TableDetectorConfig};
pub use gutter::{GutterDetector, GutterRegion};
pub use pipeline::{structure_pages, CancellationToken, PageBlock, PageLayout, PageStructurer};
pub use rulings::{find_ruled_regions, RuledRegion};
pub use style::{paragraph_alignment, resolve_font, FontFace, StyleResolver};
pub use table_extractor::{ExtractedTable, TableExtractor};
