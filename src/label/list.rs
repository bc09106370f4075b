//! Ordered and unordered list labels
//!
//! A list label turns its placeholder paragraph into one paragraph per item.
//! Every item paragraph copies the placeholder's paragraph formatting and the
//! formatting of the run holding the token; the placeholder paragraph is then
//! removed.

use serde_json::Value;

use crate::document::{Document, Paragraph};
use crate::template::InsertionPoint;

use super::{placeholder_paragraph, ApplyError};

/// How list items are prefixed
#[derive(Debug, Clone, Copy)]
pub(super) enum Marker<'a> {
    /// `1. `, `2. `, ...
    Ordered,
    /// The glyph followed by one space
    Bullet(&'a str),
}

impl Marker<'_> {
    fn prefix(&self, index: usize) -> String {
        match self {
            Marker::Ordered => format!("{}. ", index + 1),
            Marker::Bullet(glyph) => format!("{} ", glyph),
        }
    }
}

/// Accepts an array whose elements are all strings
pub(super) fn parse_items(value: &Value) -> Option<Vec<&str>> {
    value.as_array()?.iter().map(Value::as_str).collect()
}

pub(super) fn insert_items(
    point: &InsertionPoint,
    document: &mut Document,
    items: &[&str],
    marker: Marker<'_>,
) -> Result<(), ApplyError> {
    let source = placeholder_paragraph(point, document)?.clone();
    let from_run = source.run(point.run_index);

    for (index, item) in items.iter().enumerate() {
        let text = format!("{}{}", marker.prefix(index), item);
        let paragraph = Paragraph::styled_like(&source, from_run, text);
        document.insert_before(point.paragraph, paragraph);
    }
    document.remove(point.paragraph);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Alignment, Run, RunStyle};
    use crate::label::LabelKind;
    use serde_json::json;

    fn template() -> (Document, InsertionPoint) {
        let mut doc = Document::default();
        doc.push_paragraph(Paragraph::from_text("Steps:"));
        let mut placeholder = Paragraph::from_runs(vec![Run::new("{{ordered-list:steps}}").with_style(
            RunStyle {
                italic: Some(true),
                ..RunStyle::default()
            },
        )]);
        placeholder.style.alignment = Some(Alignment::Justify);
        let id = doc.push_paragraph(placeholder);
        doc.push_paragraph(Paragraph::from_text("Done."));
        let point = InsertionPoint::new(LabelKind::OrderedList, "steps", id, 0, "{{ordered-list:steps}}");
        (doc, point)
    }

    #[test]
    fn test_parse_items() {
        assert_eq!(parse_items(&json!(["a", "b"])), Some(vec!["a", "b"]));
        assert_eq!(parse_items(&json!([])), Some(vec![]));
        assert_eq!(parse_items(&json!(["a", 1])), None);
        assert_eq!(parse_items(&json!("a")), None);
    }

    #[test]
    fn test_ordered_items_replace_placeholder() {
        let (mut doc, point) = template();
        insert_items(&point, &mut doc, &["Open", "Edit", "Save"], Marker::Ordered).unwrap();

        pretty_assertions::assert_eq!(doc.text(), "Steps:\n1. Open\n2. Edit\n3. Save\nDone.");
        assert!(doc.paragraph(point.paragraph).is_none());
        let first = doc.paragraphs().nth(1).unwrap();
        assert_eq!(first.style.alignment, Some(Alignment::Justify));
        assert_eq!(first.runs[0].style.italic, Some(true));
    }

    #[test]
    fn test_bullet_items() {
        let (mut doc, point) = template();
        insert_items(&point, &mut doc, &["x", "y"], Marker::Bullet("-")).unwrap();
        assert_eq!(doc.text(), "Steps:\n- x\n- y\nDone.");
    }

    #[test]
    fn test_empty_list_removes_placeholder() {
        let (mut doc, point) = template();
        insert_items(&point, &mut doc, &[], Marker::Ordered).unwrap();
        assert_eq!(doc.text(), "Steps:\nDone.");
    }

    #[test]
    fn test_second_application_fails() {
        let (mut doc, point) = template();
        insert_items(&point, &mut doc, &["a"], Marker::Ordered).unwrap();
        let again = insert_items(&point, &mut doc, &["a"], Marker::Ordered);
        assert!(matches!(again, Err(ApplyError::ParagraphMissing { .. })));
        assert_eq!(doc.text(), "Steps:\n1. a\nDone.");
    }
}
