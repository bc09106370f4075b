//! Configuration for the HTML preview

/// Configuration options for HTML output
#[derive(Debug, Clone)]
pub struct HtmlConfig {
    /// Whether to emit a complete page with doctype, head and styles
    pub standalone: bool,

    /// Whether to format output with newlines and indentation
    pub pretty_print: bool,

    /// Draw the document as a sheet of the page's size with its margins;
    /// otherwise only the usable width is kept
    pub page_frame: bool,

    /// Inline pictures as data URIs; otherwise reference the image files
    pub embed_pictures: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            standalone: true,
            pretty_print: true,
            page_frame: false,
            embed_pictures: true,
        }
    }
}

impl HtmlConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether output is a standalone page
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    /// Set whether to pretty-print output
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Set whether to draw the page sheet and margins
    pub fn with_page_frame(mut self, page_frame: bool) -> Self {
        self.page_frame = page_frame;
        self
    }

    /// Set whether pictures are inlined
    pub fn with_embedded_pictures(mut self, embed: bool) -> Self {
        self.embed_pictures = embed;
        self
    }
}
