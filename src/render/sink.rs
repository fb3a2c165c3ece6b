//! The document-writing seam.
//!
//! The adapter drives a [`DocumentSink`] with one call per flow node. The
//! DOCX writer implements it for real output; [`RecordingSink`] keeps the
//! call sequence for inspection.

use crate::error::Result;
use crate::model::{Paragraph, Placement, Table};

use super::images::EncodedImage;

/// Receiver of a serialized flow document.
///
/// Calls arrive in reading order. `finish` is called exactly once, after the
/// last node, and returns the package bytes.
pub trait DocumentSink {
    /// The following nodes come from `page`. `page_break` asks for a hard
    /// break before them.
    fn begin_page(&mut self, page: u32, page_break: bool) -> Result<()>;

    fn paragraph(&mut self, paragraph: &Paragraph) -> Result<()>;

    fn table(&mut self, table: &Table) -> Result<()>;

    /// An image already re-encoded for embedding.
    fn image(&mut self, image: &EncodedImage, placement: &Placement) -> Result<()>;

    fn finish(&mut self) -> Result<Vec<u8>>;
}

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    BeginPage { page: u32, page_break: bool },
    Paragraph(Paragraph),
    Table(Table),
    Image {
        width: u32,
        height: u32,
        placement: Placement,
    },
    Finish,
}

/// Sink that records every call; `finish` returns no bytes.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain text of the recorded paragraphs, in call order.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Paragraph(p) => Some(p.plain_text()),
                _ => None,
            })
            .collect()
    }

    pub fn page_breaks(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SinkEvent::BeginPage { page_break: true, .. }))
            .count()
    }
}

impl DocumentSink for RecordingSink {
    fn begin_page(&mut self, page: u32, page_break: bool) -> Result<()> {
        self.events.push(SinkEvent::BeginPage { page, page_break });
        Ok(())
    }

    fn paragraph(&mut self, paragraph: &Paragraph) -> Result<()> {
        self.events.push(SinkEvent::Paragraph(paragraph.clone()));
        Ok(())
    }

    fn table(&mut self, table: &Table) -> Result<()> {
        self.events.push(SinkEvent::Table(table.clone()));
        Ok(())
    }

    fn image(&mut self, image: &EncodedImage, placement: &Placement) -> Result<()> {
        self.events.push(SinkEvent::Image {
            width: image.width,
            height: image.height,
            placement: *placement,
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<u8>> {
        self.events.push(SinkEvent::Finish);
        Ok(Vec::new())
    }
}
