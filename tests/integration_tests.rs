//! Integration tests for template scanning and dispatch

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use docweaver::document::{Alignment, Block, Paragraph, Run};
use docweaver::template::is_static_point;
use docweaver::{
    scan, CheckCode, DataMap, Document, FixedClock, LabelKind, LabelRegistry, TemplateEngine,
};

fn template(lines: &[&str]) -> Document {
    let mut doc = Document::default();
    for line in lines {
        doc.push_paragraph(Paragraph::from_text(*line));
    }
    doc
}

fn engine() -> TemplateEngine {
    let now = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(17, 45, 9)
        .unwrap();
    TemplateEngine::default().with_clock(FixedClock(now))
}

fn data(value: Value) -> DataMap {
    value.as_object().cloned().expect("Should be an object")
}

#[test]
fn test_point_count_matches_distinct_content_names() {
    let doc = template(&[
        "{{text:title}} by {{text:author}}",
        "{{date:}} {{time:}}",
        "{{ordered-list:steps}}",
        "{{unordered-list:notes}}",
        "{{image:figure}}",
        "{{link:home}}",
        "{{table:results}}",
    ]);
    let output = scan(doc, &LabelRegistry::with_defaults(), |p, _| is_static_point(p))
        .expect("Should scan");
    assert_eq!(output.points.len(), 7);
    assert_eq!(
        output.points.iter().map(|p| p.kind).collect::<Vec<_>>(),
        vec![
            LabelKind::Text,
            LabelKind::Text,
            LabelKind::OrderedList,
            LabelKind::UnorderedList,
            LabelKind::Image,
            LabelKind::Link,
            LabelKind::Table,
        ]
    );
}

#[test]
fn test_unknown_types_never_fail() {
    let engine = engine();
    let output = engine
        .check(template(&["{{bogus:x}}", "{{bogus:x}}", "{{bogus:}}"]))
        .expect("Should scan");
    assert!(output.points.is_empty());
}

#[test]
fn test_fatal_check_codes() {
    let engine = engine();
    let code = |lines: &[&str]| engine.check(template(lines)).unwrap_err().code();
    assert_eq!(code(&["{{text:a}}", "{{table:a}}"]), CheckCode::NameRepeat);
    assert_eq!(code(&["{{text:}}"]), CheckCode::NameEmpty);
    assert_eq!(code(&["{{text}}"]), CheckCode::LabelFormatError);
    assert_eq!(code(&["{{a:b:c}}"]), CheckCode::LabelFormatError);
}

#[test]
fn test_same_date_for_every_date_label() {
    let engine = engine();
    let (document, _) = engine
        .fill(template(&["{{date:}}", "Signed {{date:}} at {{time:}}"]), &DataMap::new())
        .expect("Should fill");
    assert_eq!(document.text(), "2024-05-01\nSigned 2024-05-01 at 17:45:09");
}

#[test]
fn test_dispatch_leaves_unmatched_tokens() {
    let engine = engine();
    let (document, report) = engine
        .fill(template(&["{{text:a}}", "{{text:b}}", "{{text:c}}"]), &data(json!({"a": "X"})))
        .expect("Should fill");
    assert_eq!(report.applied, vec!["a"]);
    assert_eq!(report.unmatched_names(), vec!["b", "c"]);
    assert_eq!(document.text(), "X\n{{text:b}}\n{{text:c}}");
}

#[test]
fn test_text_label_keeps_surrounding_text() {
    let engine = engine();
    let (document, _) = engine
        .fill(template(&["Prefix {{text:a}} Suffix"]), &data(json!({"a": "Hello"})))
        .expect("Should fill");
    assert_eq!(document.text(), "Prefix Hello Suffix");
}

#[test]
fn test_link_replaces_only_its_run() {
    let mut doc = Document::default();
    doc.push_paragraph(Paragraph::from_runs(vec![
        Run::new("Visit "),
        Run::new("{{link:site}}"),
        Run::new(" today"),
    ]));
    let (document, report) = engine()
        .fill(doc, &data(json!({"site": ["our site", "https://example.com"]})))
        .expect("Should fill");

    assert!(report.is_complete());
    let paragraph = document.paragraphs().next().unwrap();
    assert_eq!(paragraph.runs.len(), 3);
    assert_eq!(paragraph.runs[1].text, "our site");
    assert_eq!(paragraph.runs[1].hyperlink.as_deref(), Some("https://example.com"));
    assert_eq!(paragraph.runs[1].style.underline, Some(true));
    assert_eq!(document.text(), "Visit our site today");
}

#[test]
fn test_lists_replace_placeholder_paragraph() {
    let mut doc = template(&["Before"]);
    doc.push_paragraph(Paragraph::from_text("{{ordered-list:steps}}").with_alignment(Alignment::Right));
    doc.push_paragraph(Paragraph::from_text("{{unordered-list:notes}}"));

    let (document, _) = engine()
        .fill(doc, &data(json!({"steps": ["mix", "bake"], "notes": ["hot"]})))
        .expect("Should fill");

    assert_eq!(document.text(), "Before\n1. mix\n2. bake\n\u{2022} hot");
    let aligned: Vec<_> = document
        .paragraphs()
        .map(|p| p.style.alignment)
        .collect();
    assert_eq!(
        aligned,
        vec![None, Some(Alignment::Right), Some(Alignment::Right), None]
    );
}

#[test]
fn test_table_label_inserts_table() {
    let doc = template(&["Results:", "{{table:results}}", "End"]);
    let (document, report) = engine()
        .fill(
            doc,
            &data(json!({"results": [["Name", "Score"], ["Ada", "10"], ["Bob", "7"]]})),
        )
        .expect("Should fill");

    assert!(report.is_complete());
    assert_eq!(document.len(), 3);
    let Block::Table(table) = &document.blocks()[1] else {
        panic!("Should be a table");
    };
    assert_eq!((table.row_count(), table.column_count()), (3, 2));
    assert_eq!(table.style.as_deref(), Some("Table Grid"));
    assert!(table.cell(0, 1).unwrap().is_bold());
    assert!(table.cell(2, 0).unwrap().is_bold());
    assert!(!table.cell(2, 1).unwrap().is_bold());
    assert_eq!(table.cell(1, 1).unwrap().text(), "10");
}

#[test]
fn test_rejected_values_do_not_block_others() {
    let (document, report) = engine()
        .fill(
            template(&["{{table:t}}", "{{image:i}}", "{{text:ok}}"]),
            &data(json!({"t": [[]], "i": [5, "/path/img.png"], "ok": "fine"})),
        )
        .expect("Should fill");
    assert_eq!(report.rejected_names(), vec!["t", "i"]);
    assert!(report.unmatched.is_empty());
    assert_eq!(document.text(), "{{table:t}}\n{{image:i}}\nfine");
}

#[test]
fn test_second_dispatch_is_not_idempotent() {
    let engine = engine();
    let statics = engine.begin_run();
    let output = engine
        .scan(template(&["{{text:a}}", "{{table:t}}"]), &statics)
        .expect("Should scan");
    let values = data(json!({"a": "X", "t": [["h"]]}));
    let mut document = output.document;

    let first = engine.dispatch(&output.points, &values, &mut document, &statics);
    assert!(first.is_complete());

    let second = engine.dispatch(&output.points, &values, &mut document, &statics);
    assert!(second.applied.is_empty());
    assert_eq!(second.failed_names(), vec!["a", "t"]);
    assert!(!second.is_complete());
    assert_eq!(document.len(), 2);
}
