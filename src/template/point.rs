//! Insertion points found in a template

use std::collections::HashMap;

use crate::document::{BlockId, Document};
use crate::label::LabelKind;

/// One occurrence of a label token in a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPoint {
    /// Unique name within the template; empty only for content-free labels
    pub name: String,
    pub kind: LabelKind,
    /// The literal `{{type:name}}` token
    pub token: String,
    /// Paragraph holding the token
    pub paragraph: BlockId,
    /// Index of the run holding the token within its paragraph
    pub run_index: usize,
    /// Run text when the token was found
    pub run_text: String,
}

impl InsertionPoint {
    pub fn new(
        kind: LabelKind,
        name: impl Into<String>,
        paragraph: BlockId,
        run_index: usize,
        run_text: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            token: format!("{{{{{}:{}}}}}", kind.type_name(), name),
            name,
            kind,
            paragraph,
            run_index,
            run_text: run_text.into(),
        }
    }

    pub fn label_type(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Current text of the run holding the token, falling back to the text
    /// seen at scan time when the run is gone
    pub fn current_run_text(&self, document: &Document) -> String {
        document
            .paragraph(self.paragraph)
            .and_then(|p| p.run(self.run_index))
            .map(|r| r.text.clone())
            .unwrap_or_else(|| self.run_text.clone())
    }
}

/// Insertion points of one template, in template order, indexed by name
#[derive(Debug, Clone, Default)]
pub struct InsertionPoints {
    points: Vec<InsertionPoint>,
    index: HashMap<String, usize>,
}

impl InsertionPoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point; a point whose name is already present is handed back
    pub fn insert(&mut self, point: InsertionPoint) -> Result<(), InsertionPoint> {
        if self.index.contains_key(&point.name) {
            return Err(point);
        }
        self.index.insert(point.name.clone(), self.points.len());
        self.points.push(point);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&InsertionPoint> {
        self.index.get(name).map(|&i| &self.points[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InsertionPoint> {
        self.points.iter()
    }

    /// Point names in template order
    pub fn names(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a InsertionPoints {
    type Item = &'a InsertionPoint;
    type IntoIter = std::slice::Iter<'a, InsertionPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
