//! Label token grammar

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Span;

/// The expected shape of a label token
pub const LABEL_GRAMMAR: &str = "{{label_type:label_name}}";

lazy_static! {
    /// A token ends at the nearest following `}}`
    static ref LABEL_TOKEN_RE: Regex =
        Regex::new(r"\{\{(.*?)\}\}").expect("label token pattern should be valid");
}

/// One `{{...}}` occurrence in a run's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelToken<'a> {
    /// The literal token including braces
    pub text: &'a str,
    /// The text between the braces
    pub inner: &'a str,
    /// Byte range of `text` in the run
    pub span: Span,
}

impl<'a> LabelToken<'a> {
    /// Split into (type, name) on the single ':'
    ///
    /// Returns None unless the inner text holds exactly one ':'.
    pub fn split(&self) -> Option<(&'a str, &'a str)> {
        let mut parts = self.inner.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(label_type), Some(name), None) => Some((label_type, name)),
            _ => None,
        }
    }
}

/// All non-overlapping tokens in `text`, left to right
pub fn find_tokens(text: &str) -> Vec<LabelToken<'_>> {
    LABEL_TOKEN_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let inner = caps.get(1)?;
            Some(LabelToken {
                text: whole.as_str(),
                inner: inner.as_str(),
                span: whole.range(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inners(text: &str) -> Vec<&str> {
        find_tokens(text).into_iter().map(|t| t.inner).collect()
    }

    #[test]
    fn test_find_multiple_tokens() {
        let tokens = find_tokens("Dear {{text:name}}, on {{date:}} we");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "{{text:name}}");
        assert_eq!(tokens[0].span, 5..18);
        assert_eq!(tokens[1].inner, "date:");
    }

    #[test]
    fn test_nearest_closing_braces() {
        assert_eq!(inners("{{a:b}}}}"), vec!["a:b"]);
        assert_eq!(inners("{{a:b}c}}"), vec!["a:b}c"]);
        assert_eq!(inners("{{{a:b}}"), vec!["{a:b"]);
    }

    #[test]
    fn test_unclosed_token_ignored() {
        assert!(find_tokens("{{text:name").is_empty());
        assert!(find_tokens("no labels here").is_empty());
    }

    #[test]
    fn test_tokens_do_not_span_lines() {
        assert!(find_tokens("{{text:\nname}}").is_empty());
    }

    #[test]
    fn test_empty_token() {
        assert_eq!(inners("{{}}"), vec![""]);
    }

    #[test]
    fn test_split() {
        let split = |text: &'static str| find_tokens(text)[0].split();
        assert_eq!(split("{{text:a}}"), Some(("text", "a")));
        assert_eq!(split("{{date:}}"), Some(("date", "")));
        assert_eq!(split("{{text}}"), None);
        assert_eq!(split("{{text:a:b}}"), None);
        assert_eq!(split("{{:}}"), Some(("", "")));
    }
}
