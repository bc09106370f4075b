//! Template analysis
//!
//! Templates are documents whose run text contains label tokens of the form
//! `{{label_type:label_name}}`. Scanning a template finds every token,
//! resolves the content-free ones in place, and collects the rest as named
//! insertion points awaiting caller data.
//!
//! # Example
//!
//! ```text
//! Report generated on {{date:}} for {{text:customer}}
//! {{table:figures}}
//! ```

mod catalog;
mod grammar;
mod point;
mod scanner;

pub use catalog::{CatalogError, TemplateCatalog};
pub use grammar::{find_tokens, LabelToken, LABEL_GRAMMAR};
pub use point::{InsertionPoint, InsertionPoints};
pub use scanner::{is_static_point, scan, ScanOutput};
