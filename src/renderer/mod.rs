//! HTML renderer for previewing finished documents
//!
//! This module takes a Document and produces an HTML string with
//! prefixed CSS classes for styling.

pub mod config;
pub mod html;

pub use config::HtmlConfig;
pub use html::render_html;
