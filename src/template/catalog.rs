//! Catalog of named templates
//!
//! Maps template names to template files. A template's name is its file
//! stem; only files that pass a template check are admitted.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::TemplatesConfig;
use crate::document::{Document, DocumentError, DocumentFormat};
use crate::error::CheckError;
use crate::label::LabelRegistry;

use super::scanner::{is_static_point, scan};

/// Errors that can occur while managing the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{} is not a template file (expected a {} file)", path.display(), DocumentFormat::describe_all())]
    NotTemplate { path: PathBuf },

    #[error("a template named '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("no template named '{name}'")]
    UnknownTemplate { name: String },

    #[error("{} already exists", path.display())]
    TargetExists { path: PathBuf },

    #[error("template {} failed its check: {source}", path.display())]
    Invalid { path: PathBuf, source: CheckError },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse template index {}: {source}", path.display())]
    Index {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl CatalogError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Registered templates, by name
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: BTreeMap<String, PathBuf>,
    registry: LabelRegistry,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::new(LabelRegistry::with_defaults())
    }
}

impl TemplateCatalog {
    /// Create an empty catalog checking templates against `registry`
    pub fn new(registry: LabelRegistry) -> Self {
        Self {
            templates: BTreeMap::new(),
            registry,
        }
    }

    /// Register a template file and return its name
    ///
    /// A file that is already registered keeps its existing name.
    pub fn add(&mut self, path: &Path) -> Result<String, CatalogError> {
        if !is_template_file(path) {
            return Err(CatalogError::NotTemplate {
                path: path.to_path_buf(),
            });
        }
        if let Some(name) = self.name_by_path(path) {
            return Ok(name.to_string());
        }

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| CatalogError::NotTemplate {
                path: path.to_path_buf(),
            })?;
        if self.templates.contains_key(&name) {
            return Err(CatalogError::DuplicateName { name });
        }

        self.validate(path)?;
        let absolute = fs::canonicalize(path).map_err(|e| CatalogError::io(path, e))?;
        log::info!("registered template '{}' at {}", name, absolute.display());
        self.templates.insert(name.clone(), absolute);
        Ok(name)
    }

    /// Copy a template file into `dir`, then register the copy
    pub fn add_with_copy(&mut self, path: &Path, dir: &Path) -> Result<String, CatalogError> {
        if !is_template_file(path) {
            return Err(CatalogError::NotTemplate {
                path: path.to_path_buf(),
            });
        }
        fs::create_dir_all(dir).map_err(|e| CatalogError::io(dir, e))?;
        let file_name = path.file_name().ok_or_else(|| CatalogError::NotTemplate {
            path: path.to_path_buf(),
        })?;
        let target = dir.join(file_name);
        if !same_file(path, &target) {
            fs::copy(path, &target).map_err(|e| CatalogError::io(&target, e))?;
        }
        self.add(&target)
    }

    /// Check a template without resolving anything
    fn validate(&self, path: &Path) -> Result<(), CatalogError> {
        let document = Document::open(path)?;
        scan(document, &self.registry, |point, _| is_static_point(point))
            .map(|_| ())
            .map_err(|source| CatalogError::Invalid {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn path(&self, name: &str) -> Option<&Path> {
        self.templates.get(name).map(PathBuf::as_path)
    }

    /// Name of the template registered for the file at `path`, if any
    pub fn name_by_path(&self, path: &Path) -> Option<&str> {
        self.templates
            .iter()
            .find(|(_, registered)| same_file(registered, path))
            .map(|(name, _)| name.as_str())
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Rename a template by copying its file to `<new_name>.<extension>`
    /// alongside it
    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<(), CatalogError> {
        if self.templates.contains_key(new_name) {
            return Err(CatalogError::DuplicateName {
                name: new_name.to_string(),
            });
        }
        let old_path = self
            .templates
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownTemplate {
                name: name.to_string(),
            })?;
        let extension = old_path.extension().map(|e| e.to_string_lossy().into_owned()).unwrap_or_default();
        let new_path = old_path.with_file_name(format!("{}.{}", new_name, extension));
        if new_path.exists() {
            return Err(CatalogError::TargetExists { path: new_path });
        }
        fs::copy(&old_path, &new_path).map_err(|e| CatalogError::io(&new_path, e))?;

        self.templates.remove(name);
        self.templates.insert(new_name.to_string(), new_path);
        Ok(())
    }

    /// Forget a template; the file stays on disk
    pub fn remove(&mut self, name: &str) -> Option<PathBuf> {
        self.templates.remove(name)
    }

    /// Register every template listed in an index file
    ///
    /// A missing index is empty. Entries that fail to register are logged
    /// and skipped. Returns the number of entries registered.
    pub fn load_index(&mut self, path: &Path) -> Result<usize, CatalogError> {
        if !path.exists() {
            return Ok(0);
        }
        let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let index: BTreeMap<String, PathBuf> =
            serde_json::from_str(&content).map_err(|source| CatalogError::Index {
                path: path.to_path_buf(),
                source,
            })?;

        let mut added = 0;
        for (name, template) in index {
            match self.add(&template) {
                Ok(_) => added += 1,
                Err(e) => log::warn!("skipping indexed template '{}': {}", name, e),
            }
        }
        Ok(added)
    }

    /// Write the catalog as a JSON object of name to path
    pub fn save_index(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(&self.templates).map_err(|source| {
            CatalogError::Index {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, content).map_err(|e| CatalogError::io(path, e))
    }

    /// Register every valid template file directly inside `dir`
    ///
    /// A missing directory is empty. Files that fail to register are logged
    /// and skipped. Returns the number of files registered.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, CatalogError> {
        if !dir.is_dir() {
            return Ok(0);
        }
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| CatalogError::io(dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut added = 0;
        for file in files {
            match self.add(&file) {
                Ok(_) => added += 1,
                Err(e) => log::debug!("skipping {}: {}", file.display(), e),
            }
        }
        Ok(added)
    }

    /// Load the configured index, then the configured directory
    pub fn load_default(&mut self, config: &TemplatesConfig) -> Result<usize, CatalogError> {
        let from_index = self.load_index(&config.index)?;
        let from_dir = self.load_dir(&config.directory)?;
        Ok(from_index + from_dir)
    }

    /// Listing of the registered templates
    pub fn describe(&self) -> String {
        let mut out = String::from("templates:");
        if self.templates.is_empty() {
            out.push_str(" none");
        }
        for (i, (name, path)) in self.templates.iter().enumerate() {
            out.push_str(&format!("\n  {}. {}: {}", i + 1, name, path.display()));
        }
        out
    }
}

fn is_template_file(path: &Path) -> bool {
    DocumentFormat::from_path(path).is_some() && path.is_file()
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
