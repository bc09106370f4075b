//! Label types and the document mutations they perform
//!
//! A label is a typed placeholder behaviour. The set of labels is closed:
//! every label is one [`LabelKind`] variant, and each variant knows
//!
//! - whether it needs caller data (`has_content`),
//! - which value shapes it accepts (`check_data_type`),
//! - which static value it contributes to a run (`register_static_value`),
//! - how it rewrites the document at an insertion point (`apply`).
//!
//! Values are JSON values; see the individual label modules for the accepted
//! shapes.

mod dimensions;
mod image;
mod link;
mod list;
mod registry;
mod table;
mod text;

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::document::{Document, Paragraph, Run};
use crate::statics::{StaticContext, StaticValues};
use crate::template::InsertionPoint;

pub use image::{fit_to_area, ImageValue};
pub use dimensions::{image_dimensions, ImageError};
pub use registry::{LabelRegistry, RegistryError};

/// Default glyph prefixed to unordered list items
pub const DEFAULT_BULLET: &str = "\u{2022}";

/// Default style given to generated tables
pub const DEFAULT_TABLE_STYLE: &str = "Table Grid";

/// The closed set of label types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Text,
    Date,
    Time,
    OrderedList,
    UnorderedList,
    Image,
    Link,
    Table,
}

impl LabelKind {
    /// Every label kind, in registration order
    pub const ALL: [LabelKind; 8] = [
        LabelKind::Text,
        LabelKind::Date,
        LabelKind::Time,
        LabelKind::OrderedList,
        LabelKind::UnorderedList,
        LabelKind::Image,
        LabelKind::Link,
        LabelKind::Table,
    ];

    /// The type name used in label tokens, e.g. `text` in `{{text:title}}`
    pub fn type_name(self) -> &'static str {
        match self {
            LabelKind::Text => "text",
            LabelKind::Date => "date",
            LabelKind::Time => "time",
            LabelKind::OrderedList => "ordered-list",
            LabelKind::UnorderedList => "unordered-list",
            LabelKind::Image => "image",
            LabelKind::Link => "link",
            LabelKind::Table => "table",
        }
    }

    /// Look up a kind by its type name (case-sensitive)
    pub fn from_type_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.type_name() == name)
    }

    /// Whether resolving this label needs caller-supplied data
    pub fn has_content(self) -> bool {
        !matches!(self, LabelKind::Date | LabelKind::Time)
    }

    /// Structural check of a caller-supplied value
    pub fn check_data_type(self, value: &Value) -> bool {
        match self {
            LabelKind::Text => text::parse_text(value).is_some(),
            LabelKind::Date | LabelKind::Time => true,
            LabelKind::OrderedList | LabelKind::UnorderedList => list::parse_items(value).is_some(),
            LabelKind::Image => ImageValue::parse(value).is_some(),
            LabelKind::Link => link::parse_link(value).is_some(),
            LabelKind::Table => table::parse_rows(value).is_some(),
        }
    }

    /// Human-readable description of the accepted value shape
    pub fn expected_shape(self) -> &'static str {
        match self {
            LabelKind::Text => "a string",
            LabelKind::Date | LabelKind::Time => "no value",
            LabelKind::OrderedList | LabelKind::UnorderedList => "an array of strings",
            LabelKind::Image => "[description or null, image path]",
            LabelKind::Link => "[display text, url]",
            LabelKind::Table => "a non-empty rectangular array of non-empty string rows",
        }
    }

    /// Contribute this label's static value for the current run
    ///
    /// Content labels contribute nothing.
    pub fn register_static_value(self, context: &StaticContext, values: &mut StaticValues) {
        let value = match self {
            LabelKind::Date => context.date(),
            LabelKind::Time => context.time(),
            _ => return,
        };
        match value {
            Some(value) => values.insert(self.type_name(), value),
            None => log::warn!(
                "invalid format for '{}' label, no static value registered",
                self.type_name()
            ),
        }
    }

    /// Rewrite the document at `point`
    ///
    /// Content labels require `value` to be present and of the accepted
    /// shape; content-free labels read their value from `statics`.
    pub fn apply(
        self,
        point: &InsertionPoint,
        value: Option<&Value>,
        document: &mut Document,
        statics: &StaticValues,
        options: &LabelOptions,
    ) -> Result<(), ApplyError> {
        if !self.has_content() {
            let resolved = statics
                .get(self.type_name())
                .ok_or_else(|| ApplyError::StaticValueMissing {
                    label_type: self.type_name().to_string(),
                })?;
            // a repeated static token in one run was already replaced
            return text::replace_token(point, document, resolved).map(|_| ());
        }

        let value = value.ok_or_else(|| ApplyError::MissingValue {
            token: point.token.clone(),
        })?;
        let shape_error = || ApplyError::DataShape {
            token: point.token.clone(),
            expected: self.expected_shape(),
        };

        match self {
            LabelKind::Text => {
                let text = text::parse_text(value).ok_or_else(shape_error)?;
                text::fill_token(point, document, text)
            }
            LabelKind::OrderedList => {
                let items = list::parse_items(value).ok_or_else(shape_error)?;
                list::insert_items(point, document, &items, list::Marker::Ordered)
            }
            LabelKind::UnorderedList => {
                let items = list::parse_items(value).ok_or_else(shape_error)?;
                list::insert_items(point, document, &items, list::Marker::Bullet(&options.bullet))
            }
            LabelKind::Image => {
                let image = ImageValue::parse(value).ok_or_else(shape_error)?;
                image::insert_image(point, document, &image)
            }
            LabelKind::Link => {
                let (text, url) = link::parse_link(value).ok_or_else(shape_error)?;
                link::replace_run(point, document, text, url)
            }
            LabelKind::Table => {
                let rows = table::parse_rows(value).ok_or_else(shape_error)?;
                table::insert_table(point, document, &rows, options.table_style.as_deref())
            }
            LabelKind::Date | LabelKind::Time => Ok(()),
        }
    }
}

impl fmt::Display for LabelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Formatting choices for label output
#[derive(Debug, Clone, PartialEq)]
pub struct LabelOptions {
    /// Glyph prefixed (with one space) to unordered list items
    pub bullet: String,
    /// Style name given to generated tables
    pub table_style: Option<String>,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            bullet: DEFAULT_BULLET.to_string(),
            table_style: Some(DEFAULT_TABLE_STYLE.to_string()),
        }
    }
}

/// Per-point failures while applying a label
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("paragraph holding '{token}' is no longer in the document")]
    ParagraphMissing { token: String },

    #[error("run {index} holding '{token}' is no longer in its paragraph")]
    RunMissing { token: String, index: usize },

    #[error("'{token}' is no longer in its run")]
    TokenMissing { token: String },

    #[error("no static value registered for label type '{label_type}'")]
    StaticValueMissing { label_type: String },

    #[error("no value supplied for '{token}'")]
    MissingValue { token: String },

    #[error("value for '{token}' is not {expected}")]
    DataShape {
        token: String,
        expected: &'static str,
    },

    #[error("usable page area {width} x {height} cannot hold the picture for '{token}'")]
    PageTooSmall { token: String, width: f64, height: f64 },

    #[error("image {} for '{token}': {source}", path.display())]
    Image {
        token: String,
        path: PathBuf,
        source: ImageError,
    },
}

/// Name of a JSON value's kind, for diagnostics
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The paragraph holding an insertion point
fn placeholder_paragraph<'d>(
    point: &InsertionPoint,
    document: &'d Document,
) -> Result<&'d Paragraph, ApplyError> {
    document
        .paragraph(point.paragraph)
        .ok_or_else(|| ApplyError::ParagraphMissing {
            token: point.token.clone(),
        })
}

/// The run holding an insertion point
fn placeholder_run<'d>(
    point: &InsertionPoint,
    document: &'d mut Document,
) -> Result<&'d mut Run, ApplyError> {
    let paragraph =
        document
            .paragraph_mut(point.paragraph)
            .ok_or_else(|| ApplyError::ParagraphMissing {
                token: point.token.clone(),
            })?;
    paragraph
        .run_mut(point.run_index)
        .ok_or_else(|| ApplyError::RunMissing {
            token: point.token.clone(),
            index: point.run_index,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Paragraph;
    use serde_json::json;

    fn point_in(document: &mut Document, text: &str, name: &str, kind: LabelKind) -> InsertionPoint {
        let id = document.push_paragraph(Paragraph::from_text(text));
        InsertionPoint::new(kind, name, id, 0, text)
    }

    #[test]
    fn test_type_names_round_trip() {
        for kind in LabelKind::ALL {
            assert_eq!(LabelKind::from_type_name(kind.type_name()), Some(kind));
        }
        assert_eq!(LabelKind::from_type_name("Text"), None);
        assert_eq!(LabelKind::from_type_name("bogus"), None);
    }

    #[test]
    fn test_content_classification() {
        let content: Vec<_> = LabelKind::ALL
            .into_iter()
            .filter(|k| k.has_content())
            .map(LabelKind::type_name)
            .collect();
        assert_eq!(
            content,
            vec!["text", "ordered-list", "unordered-list", "image", "link", "table"]
        );
    }

    #[test]
    fn test_check_text() {
        assert!(LabelKind::Text.check_data_type(&json!("Hello")));
        assert!(!LabelKind::Text.check_data_type(&json!(5)));
        assert!(!LabelKind::Text.check_data_type(&json!(["a"])));
    }

    #[test]
    fn test_static_labels_accept_anything() {
        assert!(LabelKind::Date.check_data_type(&json!(null)));
        assert!(LabelKind::Time.check_data_type(&json!({"x": 1})));
    }

    #[test]
    fn test_check_table() {
        assert!(LabelKind::Table.check_data_type(&json!([["A", "B"], ["1", "2"], ["3", "4"]])));
        assert!(!LabelKind::Table.check_data_type(&json!([[]])));
        assert!(!LabelKind::Table.check_data_type(&json!([])));
    }

    #[test]
    fn test_check_image() {
        assert!(LabelKind::Image.check_data_type(&json!(["caption", "/path/img.png"])));
        assert!(LabelKind::Image.check_data_type(&json!([null, "/path/img.png"])));
        assert!(!LabelKind::Image.check_data_type(&json!([5, "/path/img.png"])));
    }

    #[test]
    fn test_apply_text_in_run() {
        let mut doc = Document::default();
        let point = point_in(&mut doc, "Prefix {{text:a}} Suffix", "a", LabelKind::Text);
        LabelKind::Text
            .apply(&point, Some(&json!("Hello")), &mut doc, &StaticValues::new(), &LabelOptions::default())
            .expect("Should apply");
        assert_eq!(doc.text(), "Prefix Hello Suffix");
    }

    #[test]
    fn test_apply_static_reads_table() {
        let mut doc = Document::default();
        let point = point_in(&mut doc, "On {{date:}}", "", LabelKind::Date);
        let mut statics = StaticValues::new();
        statics.insert("date", "2024-05-01");
        LabelKind::Date
            .apply(&point, None, &mut doc, &statics, &LabelOptions::default())
            .expect("Should apply");
        assert_eq!(doc.text(), "On 2024-05-01");
    }

    #[test]
    fn test_apply_static_without_value_fails() {
        let mut doc = Document::default();
        let point = point_in(&mut doc, "{{time:}}", "", LabelKind::Time);
        let result = LabelKind::Time.apply(&point, None, &mut doc, &StaticValues::new(), &LabelOptions::default());
        assert!(matches!(result, Err(ApplyError::StaticValueMissing { .. })));
        assert_eq!(doc.text(), "{{time:}}");
    }

    #[test]
    fn test_apply_wrong_shape_leaves_document() {
        let mut doc = Document::default();
        let point = point_in(&mut doc, "{{table:t}}", "t", LabelKind::Table);
        let result = LabelKind::Table.apply(
            &point,
            Some(&json!("not a table")),
            &mut doc,
            &StaticValues::new(),
            &LabelOptions::default(),
        );
        assert!(matches!(result, Err(ApplyError::DataShape { .. })));
        assert_eq!(doc.text(), "{{table:t}}");
    }

    #[test]
    fn test_apply_content_without_value() {
        let mut doc = Document::default();
        let point = point_in(&mut doc, "{{text:a}}", "a", LabelKind::Text);
        let result = LabelKind::Text.apply(&point, None, &mut doc, &StaticValues::new(), &LabelOptions::default());
        assert!(matches!(result, Err(ApplyError::MissingValue { .. })));
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(value_kind(&json!(null)), "null");
        assert_eq!(value_kind(&json!(1.5)), "number");
        assert_eq!(value_kind(&json!(["x"])), "array");
        assert_eq!(value_kind(&json!({})), "object");
    }
}
