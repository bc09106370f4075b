//! Reserved data keys that steer generation
//!
//! `__doc_name__` names the output document and `__tem_name__` selects the
//! catalog template. Both must be present before a document is generated.

use std::path::Path;

use serde_json::Value;

use crate::data::DataMap;
use crate::document::{DocumentFormat, DOCUMENT_EXTENSION};

/// Key naming the generated document
pub const DOC_NAME_KEY: &str = "__doc_name__";

/// Key naming the catalog template to fill
pub const TEMPLATE_NAME_KEY: &str = "__tem_name__";

/// Every reserved key
pub const MAGIC_KEYS: [&str; 2] = [DOC_NAME_KEY, TEMPLATE_NAME_KEY];

/// Read access to the reserved keys of one data set
#[derive(Debug, Clone, Copy)]
pub struct MagicData<'a> {
    data: &'a DataMap,
}

impl<'a> MagicData<'a> {
    pub fn new(data: &'a DataMap) -> Self {
        Self { data }
    }

    /// Output file name; `.docx` is appended unless the name already ends in
    /// a document extension
    pub fn doc_name(&self) -> Option<String> {
        let name = self.data.get(DOC_NAME_KEY)?.as_str()?;
        if DocumentFormat::from_path(Path::new(name)).is_some() {
            Some(name.to_string())
        } else {
            Some(format!("{}.{}", name, DOCUMENT_EXTENSION))
        }
    }

    pub fn template_name(&self) -> Option<&'a str> {
        self.data.get(TEMPLATE_NAME_KEY)?.as_str()
    }

    /// Reserved keys absent from the data set
    pub fn missing(&self) -> Vec<&'static str> {
        MAGIC_KEYS
            .into_iter()
            .filter(|key| !self.data.contains_key(*key))
            .collect()
    }
}

/// Whether every reserved key is present
pub fn check_all(data: &DataMap) -> bool {
    MagicData::new(data).missing().is_empty()
}

/// Set the output document name; an existing name is kept unless `overwrite`
pub fn set_doc_name(data: &mut DataMap, name: &str, overwrite: bool) {
    set(data, DOC_NAME_KEY, name, overwrite);
}

/// Set the template name; an existing name is kept unless `overwrite`
pub fn set_template_name(data: &mut DataMap, name: &str, overwrite: bool) {
    set(data, TEMPLATE_NAME_KEY, name, overwrite);
}

fn set(data: &mut DataMap, key: &str, value: &str, overwrite: bool) {
    if overwrite || !data.contains_key(key) {
        data.insert(key.to_string(), Value::String(value.to_string()));
    }
}
