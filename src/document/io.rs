//! Loading and saving documents
//!
//! The on-disk format follows the file extension: `.docx` files are Word
//! packages, `.json` files the serialized block model.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::docx::DocxError;
use super::model::Document;

/// File extension given to generated documents when their name has none
pub const DOCUMENT_EXTENSION: &str = "docx";

/// On-disk document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Docx,
    Json,
}

impl DocumentFormat {
    pub const ALL: [DocumentFormat; 2] = [DocumentFormat::Docx, DocumentFormat::Json];

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Docx => "docx",
            DocumentFormat::Json => "json",
        }
    }

    /// Format selected by the file extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == extension)
    }

    /// Every accepted extension, for messages: ".docx or .json"
    pub fn describe_all() -> String {
        Self::ALL
            .iter()
            .map(|f| format!(".{}", f.extension()))
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

/// Errors that can occur when reading or writing documents
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{} is not a document (expected a {} file)", path.display(), DocumentFormat::describe_all())]
    UnsupportedFormat { path: PathBuf },

    #[error("failed to read document {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write document {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid document {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Word document {}: {source}", path.display())]
    Docx { path: PathBuf, source: DocxError },

    #[error("failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
}

fn format_of(path: &Path) -> Result<DocumentFormat, DocumentError> {
    DocumentFormat::from_path(path).ok_or_else(|| DocumentError::UnsupportedFormat {
        path: path.to_path_buf(),
    })
}

impl Document {
    /// Open a .docx or .json document
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let format = format_of(path)?;
        let bytes = std::fs::read(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        match format {
            DocumentFormat::Docx => Self::from_docx(&bytes).map_err(|source| DocumentError::Docx {
                path: path.to_path_buf(),
                source,
            }),
            DocumentFormat::Json => serde_json::from_slice(&bytes).map_err(|source| DocumentError::Parse {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Parse a document from a JSON string
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Serialize the document as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save the document in the format its extension names, creating parent
    /// directories and overwriting any existing file
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let content = match format_of(path)? {
            DocumentFormat::Docx => self.to_docx().map_err(|source| DocumentError::Docx {
                path: path.to_path_buf(),
                source,
            })?,
            DocumentFormat::Json => self.to_json()?.into_bytes(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DocumentError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| DocumentError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
