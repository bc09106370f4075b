//! Insertion dispatcher
//!
//! Matches caller data to insertion points by name and applies each label.
//! Every point ends in exactly one outcome:
//!
//! - **applied**: the label rewrote the document
//! - **unmatched**: no data entry carries the point's name
//! - **rejected**: the value has the wrong shape for the label
//! - **failed**: the label could not rewrite the document
//!
//! Only applied points change the document. Data keys naming no point are
//! ignored.

use std::fmt;

use crate::data::DataMap;
use crate::document::Document;
use crate::label::{value_kind, ApplyError, LabelOptions};
use crate::statics::StaticValues;
use crate::template::{InsertionPoint, InsertionPoints};

/// What an operator needs to locate a point in the template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointDiagnostic {
    pub name: String,
    pub label_type: &'static str,
    pub token: String,
    /// Run text before dispatch touched the point
    pub run_text: String,
}

impl PointDiagnostic {
    fn new(point: &InsertionPoint, document: &Document) -> Self {
        Self {
            name: point.name.clone(),
            label_type: point.label_type(),
            token: point.token.clone(),
            run_text: point.current_run_text(document),
        }
    }
}

impl fmt::Display for PointDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' ({}) label '{}' in run '{}'",
            self.name, self.label_type, self.token, self.run_text
        )
    }
}

/// A value whose shape the label does not accept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub point: PointDiagnostic,
    pub expected: &'static str,
    /// Kind of the supplied JSON value
    pub actual: &'static str,
}

/// A label that could not be applied
#[derive(Debug)]
pub struct Failure {
    pub point: PointDiagnostic,
    pub error: ApplyError,
}

/// Outcome of one dispatch pass
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Names of the applied points, in template order
    pub applied: Vec<String>,
    pub unmatched: Vec<PointDiagnostic>,
    pub rejected: Vec<Rejection>,
    pub failed: Vec<Failure>,
}

impl DispatchReport {
    /// Whether every point was applied
    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty() && self.rejected.is_empty() && self.failed.is_empty()
    }

    pub fn unmatched_names(&self) -> Vec<&str> {
        self.unmatched.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn rejected_names(&self) -> Vec<&str> {
        self.rejected.iter().map(|r| r.point.name.as_str()).collect()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.point.name.as_str()).collect()
    }

    /// Operator-facing listing of every point that was not applied
    pub fn describe(&self) -> String {
        let mut lines = vec![format!(
            "{} applied, {} unmatched, {} rejected, {} failed",
            self.applied.len(),
            self.unmatched.len(),
            self.rejected.len(),
            self.failed.len()
        )];
        if !self.unmatched.is_empty() {
            lines.push("no data for:".to_string());
            for (i, point) in self.unmatched.iter().enumerate() {
                lines.push(format!("  ({}) {}", i + 1, point));
            }
        }
        if !self.rejected.is_empty() {
            lines.push("wrong value shape for:".to_string());
            for (i, rejection) in self.rejected.iter().enumerate() {
                lines.push(format!(
                    "  ({}) {}: expected {}, got {}",
                    i + 1,
                    rejection.point,
                    rejection.expected,
                    rejection.actual
                ));
            }
        }
        if !self.failed.is_empty() {
            lines.push("could not apply:".to_string());
            for (i, failure) in self.failed.iter().enumerate() {
                lines.push(format!("  ({}) {}: {}", i + 1, failure.point, failure.error));
            }
        }
        lines.join("\n")
    }
}

/// Apply caller data to every insertion point
///
/// Points are visited in template order. The document is mutated in place;
/// dispatching the same points twice is not supported, since applied labels
/// consume their tokens.
pub fn dispatch(
    points: &InsertionPoints,
    data: &DataMap,
    document: &mut Document,
    statics: &StaticValues,
    options: &LabelOptions,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for point in points {
        let Some(value) = data.get(&point.name) else {
            let diagnostic = PointDiagnostic::new(point, document);
            log::warn!("no data for {}", diagnostic);
            report.unmatched.push(diagnostic);
            continue;
        };

        if !point.kind.check_data_type(value) {
            let rejection = Rejection {
                point: PointDiagnostic::new(point, document),
                expected: point.kind.expected_shape(),
                actual: value_kind(value),
            };
            log::warn!(
                "value for {} is a {}, expected {}",
                rejection.point,
                rejection.actual,
                rejection.expected
            );
            report.rejected.push(rejection);
            continue;
        }

        let diagnostic = PointDiagnostic::new(point, document);
        match point.kind.apply(point, Some(value), document, statics, options) {
            Ok(()) => {
                log::debug!("applied '{}'", point.token);
                report.applied.push(point.name.clone());
            }
            Err(error) => {
                log::warn!("failed to apply {}: {}", diagnostic, error);
                report.failed.push(Failure {
                    point: diagnostic,
                    error,
                });
            }
        }
    }

    report
}
