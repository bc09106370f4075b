//! Document model for templates and generated documents
//!
//! A document is an ordered list of blocks (paragraphs and tables). Paragraphs
//! are made of runs, each run an atomic piece of text with its own formatting.
//! Label handlers mutate this model in place; the model is read from and
//! written to Word packages or JSON.

mod docx;
mod io;
mod model;

pub use docx::DocxError;
pub use io::{DocumentError, DocumentFormat, DOCUMENT_EXTENSION};
pub use model::{
    Alignment, Block, BlockId, Document, FontColor, PageSetup, Paragraph, ParagraphStyle, Picture,
    Run, RunStyle, Table, TableCell, TableRow, ThemeColor,
};
