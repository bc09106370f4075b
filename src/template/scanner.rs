//! Template scanner
//!
//! Walks a document's top-level paragraphs run by run, extracting label
//! tokens in order. Each recognized token becomes an [`InsertionPoint`]; the
//! caller's callback decides whether the point is resolved on the spot
//! (content-free labels) or deferred to dispatch.
//!
//! Matches are found on the run text as it was when the run was reached.
//! The callback may rewrite that run before the next token is handled, so
//! statics are always resolved in token order.

use crate::document::Document;
use crate::error::{CheckError, Span};
use crate::label::LabelRegistry;

use super::grammar::{find_tokens, LabelToken};
use super::point::{InsertionPoint, InsertionPoints};

/// A successfully scanned template
#[derive(Debug, Clone)]
pub struct ScanOutput {
    /// Content points awaiting data, in template order
    pub points: InsertionPoints,
    /// The template, with content-free labels already resolved if the
    /// callback resolved them
    pub document: Document,
}

impl ScanOutput {
    /// Check report: the point count, optionally followed by each point
    pub fn summary(&self, show_detail: bool) -> String {
        let mut out = format!("template check passed, {} insertion points", self.points.len());
        if show_detail {
            for (i, point) in self.points.iter().enumerate() {
                out.push_str(&format!("\n  {}. {}: {}", i + 1, point.name, point.token));
            }
        }
        out
    }
}

/// Callback for template checks that leave statics unresolved
///
/// Claims content-free points without touching the document.
pub fn is_static_point(point: &InsertionPoint) -> bool {
    !point.kind.has_content()
}

/// Scan a template for label tokens
///
/// `on_static` is called for every token of a registered type and returns
/// true if it fully handled the point. Unhandled points must have a unique
/// non-empty name. Tokens of unregistered types are skipped.
pub fn scan<F>(
    mut document: Document,
    registry: &LabelRegistry,
    mut on_static: F,
) -> Result<ScanOutput, CheckError>
where
    F: FnMut(&InsertionPoint, &mut Document) -> bool,
{
    let mut points = InsertionPoints::new();

    for paragraph_id in document.paragraph_ids() {
        let run_count = document
            .paragraph(paragraph_id)
            .map_or(0, |paragraph| paragraph.runs.len());

        for run_index in 0..run_count {
            let Some(run_text) = document
                .paragraph(paragraph_id)
                .and_then(|paragraph| paragraph.run(run_index))
                .map(|run| run.text.clone())
            else {
                continue;
            };

            for token in find_tokens(&run_text) {
                let Some((label_type, name)) = token.split() else {
                    return Err(CheckError::LabelFormat {
                        token: token.text.to_string(),
                        run_text: run_text.clone(),
                        span: token.span.clone(),
                    });
                };
                let Some(kind) = registry.get(label_type) else {
                    log::debug!("skipping '{}', label type '{}' is not registered", token.text, label_type);
                    continue;
                };

                let point = InsertionPoint::new(kind, name, paragraph_id, run_index, run_text.clone());
                if on_static(&point, &mut document) {
                    log::debug!("resolved '{}' during scan", point.token);
                    continue;
                }

                if name.is_empty() {
                    let (run_text, span) = located(&point, &token, &document);
                    return Err(CheckError::NameEmpty {
                        token: point.token,
                        run_text,
                        span,
                    });
                }
                if let Err(point) = points.insert(point) {
                    let (run_text, span) = located(&point, &token, &document);
                    return Err(CheckError::NameRepeat {
                        name: point.name,
                        token: point.token,
                        run_text,
                        span,
                    });
                }
            }
        }
    }

    Ok(ScanOutput { points, document })
}

/// The run's current text and the token's position in it
fn located(point: &InsertionPoint, token: &LabelToken<'_>, document: &Document) -> (String, Span) {
    let run_text = point.current_run_text(document);
    let span = run_text
        .find(token.text)
        .map(|start| start..start + token.text.len())
        .unwrap_or_else(|| token.span.clone());
    (run_text, span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Paragraph, Run, Table};
    use crate::error::CheckCode;
    use crate::label::LabelKind;
    use crate::template::LABEL_GRAMMAR;
    use pretty_assertions::assert_eq;

    fn document(paragraphs: &[&str]) -> Document {
        let mut doc = Document::default();
        for text in paragraphs {
            doc.push_paragraph(Paragraph::from_text(*text));
        }
        doc
    }

    fn check(doc: Document) -> Result<ScanOutput, CheckError> {
        scan(doc, &LabelRegistry::with_defaults(), |p, _| is_static_point(p))
    }

    #[test]
    fn test_collects_content_points_in_order() {
        let doc = document(&[
            "Dear {{text:name}},",
            "{{ordered-list:steps}}",
            "See {{link:site}} on {{date:}}",
            "{{table:figures}}",
        ]);
        let output = check(doc).expect("Should scan");
        assert_eq!(output.points.names(), vec!["name", "steps", "site", "figures"]);
        assert_eq!(output.points.get("site").unwrap().kind, LabelKind::Link);
        assert_eq!(output.points.get("site").unwrap().run_text, "See {{link:site}} on {{date:}}");
    }

    #[test]
    fn test_unregistered_type_is_skipped() {
        let output = check(document(&["{{bogus:x}} and {{text:y}}"])).expect("Should scan");
        assert_eq!(output.points.names(), vec!["y"]);
        assert!(!output.points.contains("x"));
    }

    #[test]
    fn test_disabled_type_is_skipped() {
        let registry = LabelRegistry::with_defaults().without("link");
        let output = scan(document(&["{{link:a}}"]), &registry, |p, _| is_static_point(p))
            .expect("Should scan");
        assert!(output.points.is_empty());
    }

    #[test]
    fn test_type_match_is_case_sensitive() {
        let output = check(document(&["{{Text:a}}"])).expect("Should scan");
        assert!(output.points.is_empty());
    }

    #[test]
    fn test_repeat_name_fails_across_types() {
        let err = check(document(&["{{text:a}}", "again {{link:a}}"])).unwrap_err();
        assert_eq!(err.code(), CheckCode::NameRepeat);
        assert_eq!(err.token(), "{{link:a}}");
        assert_eq!(err.run_text(), "again {{link:a}}");
        assert_eq!(err.span(), &(6..16));
    }

    #[test]
    fn test_repeat_name_in_same_run() {
        let err = check(document(&["{{text:a}}{{text:a}}"])).unwrap_err();
        assert_eq!(err.code(), CheckCode::NameRepeat);
    }

    #[test]
    fn test_empty_name_fails() {
        let err = check(document(&["{{text:}}"])).unwrap_err();
        assert_eq!(err.code(), CheckCode::NameEmpty);
        assert_eq!(err.token(), "{{text:}}");
    }

    #[test]
    fn test_static_labels_may_have_empty_names() {
        let output = check(document(&["{{date:}} {{time:}}"])).expect("Should scan");
        assert!(output.points.is_empty());
    }

    #[test]
    fn test_format_error_fails_even_for_unknown_types() {
        let err = check(document(&["ok", "bad {{whatever}} here"])).unwrap_err();
        assert_eq!(err.code(), CheckCode::LabelFormatError);
        assert_eq!(err.token(), "{{whatever}}");
        assert_eq!(err.span(), &(4..16));
        assert!(err.to_string().contains(LABEL_GRAMMAR));
    }

    #[test]
    fn test_two_colons_is_format_error() {
        let err = check(document(&["{{text:a:b}}"])).unwrap_err();
        assert_eq!(err.code(), CheckCode::LabelFormatError);
    }

    #[test]
    fn test_callback_sees_tokens_in_order_and_can_rewrite() {
        let mut doc = Document::default();
        doc.push_paragraph(Paragraph::from_runs(vec![
            Run::new("{{date:}}"),
            Run::new("-{{time:}}-{{text:x}}"),
        ]));
        let mut seen = Vec::new();
        let output = scan(doc, &LabelRegistry::with_defaults(), |point, document| {
            seen.push(point.token.clone());
            if point.kind.has_content() {
                return false;
            }
            let run = document
                .paragraph_mut(point.paragraph)
                .and_then(|p| p.run_mut(point.run_index))
                .unwrap();
            run.text = run.text.replace(&point.token, "S");
            true
        })
        .expect("Should scan");

        assert_eq!(seen, vec!["{{date:}}", "{{time:}}", "{{text:x}}"]);
        assert_eq!(output.document.text(), "S-S-{{text:x}}");
        assert_eq!(output.points.get("x").unwrap().run_index, 1);
    }

    #[test]
    fn test_table_cells_are_not_scanned() {
        let mut doc = document(&["{{text:a}}"]);
        let mut table = Table::new(1, 1);
        table.cell_mut(0, 0).unwrap().set_text("{{text:b}}");
        doc.push(table);
        let output = check(doc).expect("Should scan");
        assert_eq!(output.points.names(), vec!["a"]);
    }

    #[test]
    fn test_summary() {
        let output = check(document(&["{{text:title}}", "{{image:logo}}"])).expect("Should scan");
        assert_eq!(output.summary(false), "template check passed, 2 insertion points");
        insta::assert_snapshot!(output.summary(true), @r"
        template check passed, 2 insertion points
          1. title: {{text:title}}
          2. logo: {{image:logo}}
        ");
    }
}
