//! JSON dumps of the flow document and the fidelity report.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{FidelityReport, FlowDocument};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

fn to_string<T: Serialize>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::WriteFailure(format!("JSON serialization error: {}", e)))
}

/// Dump a flow document. Image payload bytes are left out.
pub fn flow_to_json(doc: &FlowDocument, format: JsonFormat) -> Result<String> {
    to_string(doc, format)
}

pub fn report_to_json(report: &FidelityReport, format: JsonFormat) -> Result<String> {
    to_string(report, format)
}
