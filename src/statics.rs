//! Per-run static values for content-free labels
//!
//! Labels such as `date` and `time` need no caller data: each generation run
//! asks every registered label to contribute its value to a fresh
//! [`StaticValues`] table, computed from a single clock reading.

use std::collections::HashMap;
use std::fmt::Write;

use chrono::{Local, NaiveDateTime};

use crate::label::LabelRegistry;

/// Default `date` label format
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Default `time` label format
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Source of the current wall-clock time
pub trait Clock: std::fmt::Debug + Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The local system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Inputs available to labels when they register static values
#[derive(Debug, Clone)]
pub struct StaticContext {
    /// The instant this run started
    pub now: NaiveDateTime,
    pub date_format: String,
    pub time_format: String,
}

impl StaticContext {
    /// Create a context with the default date and time formats
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }

    /// Set the date format (strftime syntax)
    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Set the time format (strftime syntax)
    pub fn with_time_format(mut self, format: impl Into<String>) -> Self {
        self.time_format = format.into();
        self
    }

    /// Formatted date, or None if the format string is invalid
    pub fn date(&self) -> Option<String> {
        format_instant(&self.now, &self.date_format)
    }

    /// Formatted time, or None if the format string is invalid
    pub fn time(&self) -> Option<String> {
        format_instant(&self.now, &self.time_format)
    }
}

fn format_instant(now: &NaiveDateTime, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", now.format(format)).ok()?;
    Some(out)
}

/// Label type name -> resolved static value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticValues {
    values: HashMap<String, String>,
}

impl StaticValues {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh table by asking every registered label for its value
    pub fn collect(registry: &LabelRegistry, context: &StaticContext) -> Self {
        let mut values = Self::new();
        for kind in registry.kinds() {
            kind.register_static_value(context, &mut values);
        }
        values
    }

    /// Set the value for a label type, replacing any previous value
    pub fn insert(&mut self, label_type: impl Into<String>, value: impl Into<String>) {
        self.values.insert(label_type.into(), value.into());
    }

    pub fn get(&self, label_type: &str) -> Option<&str> {
        self.values.get(label_type).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn instant() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 3, 7)
            .unwrap()
    }

    #[test]
    fn test_collect_defaults() {
        let values = StaticValues::collect(&LabelRegistry::with_defaults(), &StaticContext::new(instant()));
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("date"), Some("2024-05-01"));
        assert_eq!(values.get("time"), Some("09:03:07"));
        assert_eq!(values.get("text"), None);
    }

    #[test]
    fn test_custom_formats() {
        let context = StaticContext::new(instant())
            .with_date_format("%d/%m/%Y")
            .with_time_format("%H:%M");
        let values = StaticValues::collect(&LabelRegistry::with_defaults(), &context);
        assert_eq!(values.get("date"), Some("01/05/2024"));
        assert_eq!(values.get("time"), Some("09:03"));
    }

    #[test]
    fn test_invalid_format_is_not_registered() {
        let context = StaticContext::new(instant()).with_date_format("%Q");
        let values = StaticValues::collect(&LabelRegistry::with_defaults(), &context);
        assert_eq!(values.get("date"), None);
        assert_eq!(values.get("time"), Some("09:03:07"));
    }

    #[test]
    fn test_registry_without_static_labels() {
        let registry = LabelRegistry::with_defaults().without("date").without("time");
        let values = StaticValues::collect(&registry, &StaticContext::new(instant()));
        assert!(values.is_empty());
    }

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(instant()).now(), instant());
    }
}
