//! In-run token replacement, shared by `text`, `date` and `time`

use serde_json::Value;

use crate::document::Document;
use crate::template::InsertionPoint;

use super::{placeholder_run, ApplyError};

/// Accepts a JSON string
pub(super) fn parse_text(value: &Value) -> Option<&str> {
    value.as_str()
}

/// Replace the literal token inside its run, keeping the surrounding text
///
/// Every occurrence of the token in the run is replaced. Returns false, and
/// leaves the run as is, when the run no longer contains the token.
pub(super) fn replace_token(
    point: &InsertionPoint,
    document: &mut Document,
    replacement: &str,
) -> Result<bool, ApplyError> {
    let run = placeholder_run(point, document)?;
    if !run.text.contains(&point.token) {
        return Ok(false);
    }
    run.text = run.text.replace(&point.token, replacement);
    Ok(true)
}

/// Replace the token of a content label, which must still be in its run
pub(super) fn fill_token(
    point: &InsertionPoint,
    document: &mut Document,
    replacement: &str,
) -> Result<(), ApplyError> {
    if replace_token(point, document, replacement)? {
        Ok(())
    } else {
        Err(ApplyError::TokenMissing {
            token: point.token.clone(),
        })
    }
}
