//! Table label

use serde_json::Value;

use crate::document::{Document, Table};
use crate::template::InsertionPoint;

use super::{placeholder_paragraph, ApplyError};

/// Accepts a non-empty array of equally long, non-empty arrays of strings
pub(super) fn parse_rows(value: &Value) -> Option<Vec<Vec<&str>>> {
    let rows = value
        .as_array()?
        .iter()
        .map(|row| row.as_array()?.iter().map(Value::as_str).collect::<Option<Vec<_>>>())
        .collect::<Option<Vec<_>>>()?;

    let width = rows.first()?.len();
    if width == 0 || rows.iter().any(|row| row.len() != width) {
        return None;
    }
    Some(rows)
}

/// Build the table: first row and first column bold
fn build_table(rows: &[Vec<&str>], style: Option<&str>) -> Table {
    let columns = rows.first().map(Vec::len).unwrap_or(0);
    let mut table = Table::new(rows.len(), columns).with_style(style.map(str::to_string));
    for (r, row) in rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            if let Some(cell) = table.cell_mut(r, c) {
                cell.set_text(*text);
                if r == 0 || c == 0 {
                    cell.set_bold(true);
                }
            }
        }
    }
    table
}

/// Insert the table after the placeholder paragraph, then remove the
/// placeholder
pub(super) fn insert_table(
    point: &InsertionPoint,
    document: &mut Document,
    rows: &[Vec<&str>],
    style: Option<&str>,
) -> Result<(), ApplyError> {
    placeholder_paragraph(point, document)?;
    document.insert_after(point.paragraph, build_table(rows, style));
    document.remove(point.paragraph);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Paragraph};
    use crate::label::LabelKind;
    use serde_json::json;

    #[test]
    fn test_parse_rows() {
        let value = json!([["A", "B"], ["1", "2"], ["3", "4"]]);
        let rows = parse_rows(&value).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], vec!["3", "4"]);
    }

    #[test]
    fn test_parse_rows_rejects() {
        assert!(parse_rows(&json!([])).is_none());
        assert!(parse_rows(&json!([[]])).is_none());
        assert!(parse_rows(&json!([["A", "B"], ["1"]])).is_none());
        assert!(parse_rows(&json!([["A", 2]])).is_none());
        assert!(parse_rows(&json!(["A", "B"])).is_none());
    }

    #[test]
    fn test_header_row_and_column_bold() {
        let table = build_table(&[vec!["", "Q1", "Q2"], vec!["North", "10", "12"]], Some("Table Grid"));
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.style.as_deref(), Some("Table Grid"));
        assert!(table.cell(0, 1).unwrap().is_bold());
        assert!(table.cell(1, 0).unwrap().is_bold());
        assert!(!table.cell(1, 1).unwrap().is_bold());
        assert_eq!(table.cell(1, 2).unwrap().text(), "12");
    }

    #[test]
    fn test_table_replaces_placeholder() {
        let mut doc = Document::default();
        doc.push_paragraph(Paragraph::from_text("Before"));
        let id = doc.push_paragraph(Paragraph::from_text("{{table:sales}}"));
        doc.push_paragraph(Paragraph::from_text("After"));
        let point = InsertionPoint::new(LabelKind::Table, "sales", id, 0, "{{table:sales}}");

        insert_table(&point, &mut doc, &[vec!["A", "B"], vec!["1", "2"]], None).unwrap();

        assert_eq!(doc.len(), 3);
        assert!(matches!(doc.blocks()[1], Block::Table(_)));
        assert_eq!(doc.text(), "Before\nA\tB\n1\t2\nAfter");
    }
}
