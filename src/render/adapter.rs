//! Serialization adapter: flow document → sink calls + fidelity report.

use crate::error::Result;
use crate::model::{DocumentNode, FidelityReason, FidelityReport, FlowDocument};

use super::images::{encode_image, ImageQuality};
use super::sink::DocumentSink;

/// Walks a [`FlowDocument`] into a [`DocumentSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializationAdapter {
    pub image_quality: ImageQuality,
    /// Emit a hard break between nodes of different source pages
    pub page_breaks: bool,
}

impl Default for SerializationAdapter {
    fn default() -> Self {
        Self {
            image_quality: ImageQuality::default(),
            page_breaks: true,
        }
    }
}

impl SerializationAdapter {
    pub fn new(image_quality: ImageQuality, page_breaks: bool) -> Self {
        Self {
            image_quality,
            page_breaks,
        }
    }

    /// Serialize `doc` into `sink` and return the package bytes with the
    /// fidelity report.
    ///
    /// Fidelity losses never fail the call. Images that cannot be encoded
    /// are skipped with a note; any error raised by the sink itself is
    /// returned as is.
    pub fn serialize<S: DocumentSink + ?Sized>(
        &self,
        doc: &FlowDocument,
        sink: &mut S,
    ) -> Result<(Vec<u8>, FidelityReport)> {
        let mut report = FidelityReport {
            entries: doc.notes.clone(),
        };

        let mut current_page = None;
        for (index, node) in doc.nodes.iter().enumerate() {
            let page = doc.origins.get(index).map(|o| o.page).unwrap_or(0);
            if current_page != Some(page) {
                sink.begin_page(page, self.page_breaks && current_page.is_some())?;
                current_page = Some(page);
            }

            match node {
                DocumentNode::Paragraph(paragraph) => sink.paragraph(paragraph)?,
                DocumentNode::Table(table) => sink.table(table)?,
                DocumentNode::Image(image) => match encode_image(&image.data, self.image_quality) {
                    Ok(encoded) => {
                        if let Some(from) = encoded.downscaled_from {
                            report.push(
                                Some(index),
                                page,
                                FidelityReason::ImageDownscaled {
                                    from,
                                    to: (encoded.width, encoded.height),
                                },
                            );
                        }
                        sink.image(&encoded, &image.placement)?;
                    }
                    Err(detail) => {
                        log::warn!("page {}: image {} dropped: {}", page, image.name, detail);
                        report.push(Some(index), page, FidelityReason::ImageDropped { detail });
                    }
                },
            }
        }

        let bytes = sink.finish()?;
        report.sort();
        Ok((bytes, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ImageData, ImageNode, NodeOrigin, Paragraph, Placement, Rect, StyleRecord,
    };
    use crate::render::sink::{RecordingSink, SinkEvent};

    fn doc_with(nodes: Vec<(DocumentNode, u32)>) -> FlowDocument {
        let mut doc = FlowDocument::default();
        for (node, page) in nodes {
            doc.nodes.push(node);
            doc.origins.push(NodeOrigin {
                page,
                bbox: Rect::new(72.0, 72.0, 200.0, 90.0),
            });
        }
        doc
    }

    fn para(text: &str) -> DocumentNode {
        DocumentNode::Paragraph(Paragraph::with_text(text, StyleRecord::default_body()))
    }

    fn image(data: ImageData) -> DocumentNode {
        DocumentNode::Image(ImageNode {
            name: "Im0".into(),
            data,
            placement: Placement::inline_at(Rect::new(0.0, 0.0, 50.0, 50.0)),
        })
    }

    #[test]
    fn test_page_breaks_between_pages() {
        let doc = doc_with(vec![(para("one"), 1), (para("two"), 1), (para("three"), 3)]);
        let mut sink = RecordingSink::new();
        let (bytes, report) = SerializationAdapter::default()
            .serialize(&doc, &mut sink)
            .unwrap();

        assert!(bytes.is_empty());
        assert!(report.is_empty());
        assert_eq!(sink.paragraph_texts(), vec!["one", "two", "three"]);
        assert_eq!(sink.page_breaks(), 1);
        assert_eq!(sink.events.last(), Some(&SinkEvent::Finish));
    }

    #[test]
    fn test_page_breaks_can_be_disabled() {
        let doc = doc_with(vec![(para("one"), 1), (para("two"), 2)]);
        let mut sink = RecordingSink::new();
        SerializationAdapter::new(ImageQuality::Medium, false)
            .serialize(&doc, &mut sink)
            .unwrap();
        assert_eq!(sink.page_breaks(), 0);
    }

    #[test]
    fn test_unencodable_image_is_dropped_with_note() {
        let doc = doc_with(vec![
            (para("caption"), 1),
            (image(ImageData::opaque(10, 10, "JPXDecode")), 1),
            (image(ImageData::raw(1, 1, 1, vec![0])), 1),
        ]);
        let mut sink = RecordingSink::new();
        let (_, report) = SerializationAdapter::default()
            .serialize(&doc, &mut sink)
            .unwrap();

        let images = sink
            .events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Image { .. }))
            .count();
        assert_eq!(images, 1);
        assert_eq!(report.len(), 1);
        assert_eq!(report.entries[0].node, Some(1));
        assert!(matches!(
            report.entries[0].reason,
            FidelityReason::ImageDropped { .. }
        ));
    }

    #[test]
    fn test_downscale_is_reported() {
        let doc = doc_with(vec![(image(ImageData::raw(900, 10, 1, vec![0; 9000])), 1)]);
        let mut sink = RecordingSink::new();
        let (_, report) = SerializationAdapter::new(ImageQuality::Low, true)
            .serialize(&doc, &mut sink)
            .unwrap();
        match &report.entries[0].reason {
            FidelityReason::ImageDownscaled { from, to } => {
                assert_eq!(*from, (900, 10));
                assert_eq!(to.0, 800);
            }
            other => panic!("unexpected reason {:?}", other),
        }
    }

    #[test]
    fn test_builder_notes_carried_and_sorted() {
        let mut doc = doc_with(vec![(para("a"), 1), (para("b"), 1)]);
        doc.notes.push(crate::model::FidelityEntry {
            node: None,
            page: 1,
            reason: FidelityReason::UnsupportedPrimitive {
                kind: "shading".into(),
            },
        });
        doc.notes.push(crate::model::FidelityEntry {
            node: Some(1),
            page: 1,
            reason: FidelityReason::UnknownFont {
                resource: "F3".into(),
            },
        });
        let (_, report) = SerializationAdapter::default()
            .serialize(&doc, &mut RecordingSink::new())
            .unwrap();
        assert_eq!(
            report.entries.iter().map(|e| e.node).collect::<Vec<_>>(),
            vec![Some(1), None]
        );
    }
}
