//! Hyperlink label

use serde_json::Value;

use crate::document::{Document, Run};
use crate::template::InsertionPoint;

use super::{placeholder_run, ApplyError};

/// Accepts `[display text, url]`
pub(super) fn parse_link(value: &Value) -> Option<(&str, &str)> {
    match value.as_array()?.as_slice() {
        [text, url] => Some((text.as_str()?, url.as_str()?)),
        _ => None,
    }
}

/// Replace the whole run holding the token with a hyperlink run
///
/// Only the run at the point's index is touched; the other runs of the
/// paragraph survive unchanged.
pub(super) fn replace_run(
    point: &InsertionPoint,
    document: &mut Document,
    text: &str,
    url: &str,
) -> Result<(), ApplyError> {
    let run = placeholder_run(point, document)?;
    *run = Run::hyperlink(text, url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FontColor, Paragraph, ThemeColor};
    use crate::label::LabelKind;
    use serde_json::json;

    #[test]
    fn test_parse_link() {
        assert_eq!(
            parse_link(&json!(["Docs", "https://example.com"])),
            Some(("Docs", "https://example.com"))
        );
        assert_eq!(parse_link(&json!(["Docs"])), None);
        assert_eq!(parse_link(&json!(["Docs", null])), None);
        assert_eq!(parse_link(&json!(["a", "b", "c"])), None);
    }

    #[test]
    fn test_replace_only_target_run() {
        let mut doc = Document::default();
        let id = doc.push_paragraph(Paragraph::from_runs(vec![
            Run::new("See "),
            Run::new("{{link:site}} now"),
            Run::new(" please"),
        ]));
        let point = InsertionPoint::new(LabelKind::Link, "site", id, 1, "{{link:site}} now");
        replace_run(&point, &mut doc, "our site", "https://example.com").unwrap();

        let paragraph = doc.paragraph(id).unwrap();
        assert_eq!(paragraph.runs.len(), 3);
        assert_eq!(paragraph.text(), "See our site please");
        let link = &paragraph.runs[1];
        assert_eq!(link.hyperlink.as_deref(), Some("https://example.com"));
        assert_eq!(link.style.underline, Some(true));
        assert_eq!(link.style.color, Some(FontColor::Theme(ThemeColor::Hyperlink)));
        assert!(paragraph.runs[0].hyperlink.is_none());
    }
}
