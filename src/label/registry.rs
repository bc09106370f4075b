//! Registry of the label types a template engine recognizes

use std::collections::HashMap;

use thiserror::Error;

use super::LabelKind;

/// Errors that can occur while building a registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Label type registered twice
    #[error("duplicate label type: {label_type}")]
    Duplicate { label_type: String },
}

/// Mapping from label type name to its label kind
///
/// Built once at startup and shared read-only by every generation run.
#[derive(Debug, Clone, Default)]
pub struct LabelRegistry {
    labels: HashMap<String, LabelKind>,
    /// Registration order, for stable listings
    order: Vec<LabelKind>,
}

impl LabelRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in label
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in LabelKind::ALL {
            registry.labels.insert(kind.type_name().to_string(), kind);
            registry.order.push(kind);
        }
        registry
    }

    /// Register a label kind
    pub fn register(&mut self, kind: LabelKind) -> Result<(), RegistryError> {
        let name = kind.type_name().to_string();
        if self.labels.contains_key(&name) {
            return Err(RegistryError::Duplicate { label_type: name });
        }
        self.labels.insert(name, kind);
        self.order.push(kind);
        Ok(())
    }

    /// Drop a label type; unknown names are ignored
    pub fn without(mut self, label_type: &str) -> Self {
        if let Some(kind) = self.labels.remove(label_type) {
            self.order.retain(|k| *k != kind);
        }
        self
    }

    /// Get the kind registered under a type name
    pub fn get(&self, label_type: &str) -> Option<LabelKind> {
        self.labels.get(label_type).copied()
    }

    pub fn contains(&self, label_type: &str) -> bool {
        self.labels.contains_key(label_type)
    }

    /// Registered kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = LabelKind> + '_ {
        self.order.iter().copied()
    }

    /// Type names of labels that need caller data
    pub fn content_types(&self) -> Vec<&'static str> {
        self.kinds()
            .filter(|k| k.has_content())
            .map(LabelKind::type_name)
            .collect()
    }

    /// Type names of labels resolved from static values
    pub fn static_types(&self) -> Vec<&'static str> {
        self.kinds()
            .filter(|k| !k.has_content())
            .map(LabelKind::type_name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Summary of the registered label types
    pub fn describe(&self) -> String {
        let all: Vec<_> = self.kinds().map(LabelKind::type_name).collect();
        format!(
            "registered label types: {}\nstatic types: {}\ncontent types: {}",
            all.join(", "),
            self.static_types().join(", "),
            self.content_types().join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = LabelRegistry::with_defaults();
        assert_eq!(registry.len(), 8);
        assert_eq!(registry.get("table"), Some(LabelKind::Table));
        assert_eq!(registry.get("ordered-list"), Some(LabelKind::OrderedList));
        assert!(!registry.contains("bogus"));
        assert_eq!(registry.static_types(), vec!["date", "time"]);
    }

    #[test]
    fn test_duplicate_error() {
        let mut registry = LabelRegistry::new();
        registry.register(LabelKind::Text).expect("First register should succeed");
        let result = registry.register(LabelKind::Text);
        assert_eq!(
            result,
            Err(RegistryError::Duplicate {
                label_type: "text".to_string()
            })
        );
    }

    #[test]
    fn test_without() {
        let registry = LabelRegistry::with_defaults().without("link").without("nothing");
        assert_eq!(registry.len(), 7);
        assert!(!registry.contains("link"));
        assert!(registry.kinds().all(|k| k != LabelKind::Link));
    }

    #[test]
    fn test_describe() {
        let mut registry = LabelRegistry::new();
        registry.register(LabelKind::Date).unwrap();
        registry.register(LabelKind::Text).unwrap();
        insta::assert_snapshot!(registry.describe(), @r"
        registered label types: date, text
        static types: date
        content types: text
        ");
    }
}
