//! Serialization of flow documents.

mod adapter;
mod docx;
mod images;
mod json;
pub mod sink;

pub use adapter::SerializationAdapter;
pub use docx::DocxSink;
pub use images::{encode_image, EncodedImage, ImageQuality};
pub use json::{flow_to_json, report_to_json, JsonFormat};
pub use sink::{DocumentSink, RecordingSink, SinkEvent};
