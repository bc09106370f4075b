//! Document generation pipeline
//!
//! For each data set: check the reserved keys, open the selected catalog
//! template, scan it with fresh static values, dispatch the data, then save
//! the result (and optionally an HTML preview) into the output directory.
//! A template that fails its check produces no output file.

use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::config::EngineConfig;
use crate::data::{DataError, DataLoader, DataMap};
use crate::dispatch::DispatchReport;
use crate::document::{Document, DocumentError};
use crate::engine::TemplateEngine;
use crate::error::CheckError;
use crate::magic::{self, MagicData};
use crate::renderer::{render_html, HtmlConfig};
use crate::template::{CatalogError, ScanOutput, TemplateCatalog};

/// Errors that stop a single document from being generated
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("data is missing reserved keys: {}", .keys.join(", "))]
    MissingMagic { keys: Vec<&'static str> },

    #[error("reserved key '{key}' must be a string")]
    InvalidMagic { key: &'static str },

    #[error("document name '{name}' must be a plain file name")]
    InvalidDocName { name: String },

    #[error("no template named '{name}' in the catalog")]
    UnknownTemplate { name: String },

    #[error("template '{template}' failed its check: {source}")]
    Check { template: String, source: CheckError },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("failed to write preview {}: {source}", path.display())]
    Preview {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What one generation produced
#[derive(Debug)]
pub struct GenerationReport {
    pub template: String,
    pub output: PathBuf,
    pub preview: Option<PathBuf>,
    /// Number of content insertion points in the template
    pub points: usize,
    pub dispatch: DispatchReport,
}

/// Generates documents from catalog templates
#[derive(Debug)]
pub struct DocumentProcessor {
    engine: TemplateEngine,
    catalog: TemplateCatalog,
    html: Option<HtmlConfig>,
}

impl DocumentProcessor {
    pub fn new(engine: TemplateEngine, catalog: TemplateCatalog) -> Self {
        Self {
            engine,
            catalog,
            html: None,
        }
    }

    /// Build the engine and load the configured catalog
    pub fn from_config(config: &EngineConfig) -> Result<Self, ProcessError> {
        let engine = TemplateEngine::from_config(config);
        let mut catalog = TemplateCatalog::new(engine.registry().clone());
        let loaded = catalog.load_default(&config.templates)?;
        log::debug!("loaded {} templates", loaded);

        let processor = Self::new(engine, catalog);
        Ok(if config.output.html_preview {
            processor.with_html_preview(HtmlConfig::default())
        } else {
            processor
        })
    }

    /// Also write an HTML rendering next to every generated document
    pub fn with_html_preview(mut self, config: HtmlConfig) -> Self {
        self.html = Some(config);
        self
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut TemplateCatalog {
        &mut self.catalog
    }

    /// Generate one document into `save_dir`, overwriting an existing file
    ///
    /// `data` must carry the template name and document name keys.
    pub fn create_document(&self, save_dir: &Path, data: &DataMap) -> Result<GenerationReport, ProcessError> {
        let magic = MagicData::new(data);
        let missing = magic.missing();
        if !missing.is_empty() {
            return Err(ProcessError::MissingMagic { keys: missing });
        }
        let template = magic.template_name().ok_or(ProcessError::InvalidMagic {
            key: magic::TEMPLATE_NAME_KEY,
        })?;
        let doc_name = magic.doc_name().ok_or(ProcessError::InvalidMagic {
            key: magic::DOC_NAME_KEY,
        })?;
        if !is_plain_file_name(&doc_name) {
            return Err(ProcessError::InvalidDocName { name: doc_name });
        }

        let statics = self.engine.begin_run();
        let path = self
            .catalog
            .path(template)
            .ok_or_else(|| ProcessError::UnknownTemplate {
                name: template.to_string(),
            })?;
        let document = Document::open(path)?;

        let scanned = self
            .engine
            .scan(document, &statics)
            .map_err(|source| ProcessError::Check {
                template: template.to_string(),
                source,
            })?;
        log::info!("{}", scanned.summary(true));
        let ScanOutput { points, mut document } = scanned;
        let dispatch = self.engine.dispatch(&points, data, &mut document, &statics);
        if !dispatch.is_complete() {
            log::info!("{}", dispatch.describe());
        }

        let output = save_dir.join(&doc_name);
        document.save(&output)?;
        log::info!("saved {}", output.display());

        let preview = match &self.html {
            Some(config) => {
                let path = output.with_extension("html");
                fs::write(&path, render_html(&document, config)).map_err(|source| {
                    ProcessError::Preview {
                        path: path.clone(),
                        source,
                    }
                })?;
                Some(path)
            }
            None => None,
        };

        Ok(GenerationReport {
            template: template.to_string(),
            output,
            preview,
            points: points.len(),
            dispatch,
        })
    }

    /// Generate one document, optionally from a template outside the catalog
    /// and under an explicit document name
    ///
    /// A given template path is registered first and overrides the data's
    /// template name; a given document name overrides the data's.
    pub fn create_document_with(
        &mut self,
        save_dir: &Path,
        data: &DataMap,
        template_path: Option<&Path>,
        doc_name: Option<&str>,
    ) -> Result<GenerationReport, ProcessError> {
        let mut data = data.clone();
        if let Some(path) = template_path {
            let name = self.catalog.add(path)?;
            magic::set_template_name(&mut data, &name, true);
        }
        if let Some(name) = doc_name {
            magic::set_doc_name(&mut data, name, true);
        }
        self.create_document(save_dir, &data)
    }

    /// Generate a document for every data set the loader yields
    ///
    /// Per-document failures are collected; a loader failure stops the run.
    pub fn create_all(
        &self,
        loader: &mut dyn DataLoader,
        save_dir: &Path,
    ) -> Result<Vec<Result<GenerationReport, ProcessError>>, ProcessError> {
        let mut results = Vec::new();
        while let Some(data) = loader.load_data()? {
            let result = self.create_document(save_dir, &data);
            if let Err(e) = &result {
                log::warn!("document {} not generated: {}", results.len() + 1, e);
            }
            results.push(result);
        }
        Ok(results)
    }
}

/// A single normal path component: no separators, no `..`, not absolute
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
