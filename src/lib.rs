//! Docweaver - fill typed placeholder labels in document templates
//!
//! A template is a document whose text contains label tokens such as
//! `{{text:customer}}` or `{{table:figures}}`. Docweaver scans the template,
//! resolves content-free labels (`{{date:}}`, `{{time:}}`) on the spot and
//! fills every other label from caller data.
//!
//! # Example
//!
//! ```rust
//! use docweaver::fill;
//!
//! let template = r#"{"body": [{"paragraph": {"runs": [{"text": "Dear {{text:name}},"}]}}]}"#;
//! let filled = fill(template, r#"{"name": "Ada"}"#).unwrap();
//! assert!(filled.contains("Dear Ada,"));
//! ```

pub mod config;
pub mod data;
pub mod dispatch;
pub mod document;
pub mod engine;
pub mod error;
pub mod label;
pub mod magic;
pub mod processor;
pub mod renderer;
pub mod statics;
pub mod template;

pub use config::{ConfigError, EngineConfig};
pub use data::{DataError, DataLoader, DataMap, JsonDataLoader, MemoryDataLoader};
pub use dispatch::{dispatch, DispatchReport, PointDiagnostic};
pub use document::{Document, DocumentError, DocumentFormat};
pub use engine::TemplateEngine;
pub use error::{CheckCode, CheckError};
pub use label::{ApplyError, LabelKind, LabelOptions, LabelRegistry};
pub use magic::MagicData;
pub use processor::{DocumentProcessor, GenerationReport, ProcessError};
pub use renderer::{render_html, HtmlConfig};
pub use statics::{Clock, FixedClock, LocalClock, StaticContext, StaticValues};
pub use template::{scan, InsertionPoint, InsertionPoints, ScanOutput, TemplateCatalog};

use thiserror::Error;

/// Errors that can occur in the one-call fill pipeline
#[derive(Debug, Error)]
pub enum FillError {
    /// Template is not a valid document
    #[error("invalid template: {0}")]
    Template(serde_json::Error),

    /// Data is not a JSON object
    #[error("invalid data: {0}")]
    Data(serde_json::Error),

    /// Template failed its check
    #[error("template check failed: {0}")]
    Check(#[from] CheckError),

    /// Filled document could not be encoded
    #[error("failed to encode document: {0}")]
    Encode(serde_json::Error),
}

/// Fill a JSON template with JSON data using the default labels
///
/// Returns the filled document as JSON. Points without data keep their
/// tokens; see [`TemplateEngine::fill`] for the full dispatch report.
pub fn fill(template: &str, data: &str) -> Result<String, FillError> {
    let document = Document::from_json(template).map_err(FillError::Template)?;
    let data: DataMap = serde_json::from_str(data).map_err(FillError::Data)?;
    let (document, _) = TemplateEngine::default().fill(document, &data)?;
    document.to_json().map_err(FillError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"{
        "body": [
            {"paragraph": {"runs": [{"text": "Hello {{text:name}}"}]}},
            {"paragraph": {"runs": [{"text": "{{ordered-list:steps}}"}]}}
        ]
    }"#;

    #[test]
    fn test_fill_simple_template() {
        let json = fill(TEMPLATE, r#"{"name": "Ada", "steps": ["one", "two"]}"#).unwrap();
        let document = Document::from_json(&json).unwrap();
        assert_eq!(document.text(), "Hello Ada\n1. one\n2. two");
    }

    #[test]
    fn test_fill_keeps_unmatched_tokens() {
        let json = fill(TEMPLATE, "{}").unwrap();
        assert!(json.contains("{{text:name}}"));
    }

    #[test]
    fn test_fill_errors() {
        assert!(matches!(fill("not json", "{}"), Err(FillError::Template(_))));
        assert!(matches!(fill(TEMPLATE, "[1]"), Err(FillError::Data(_))));

        let bad = r#"{"body": [{"paragraph": {"runs": [{"text": "{{text:}}"}]}}]}"#;
        assert!(matches!(fill(bad, "{}"), Err(FillError::Check(_))));
    }
}
