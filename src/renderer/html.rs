//! HTML generation from documents

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::document::{Alignment, Block, Document, FontColor, Paragraph, Picture, Run, Table};

use super::HtmlConfig;

/// Prefix of every CSS class the preview uses
const CLASS_PREFIX: &str = "dw-";

/// Build HTML elements incrementally
pub struct HtmlBuilder {
    config: HtmlConfig,
    styles: Vec<String>,
    elements: Vec<String>,
    indent: usize,
}

impl HtmlBuilder {
    /// Create a new HTML builder
    pub fn new(config: HtmlConfig) -> Self {
        Self {
            config,
            styles: vec![],
            elements: vec![],
            indent: 1,
        }
    }

    fn indent_str(&self) -> String {
        if self.config.pretty_print {
            "  ".repeat(self.indent)
        } else {
            String::new()
        }
    }

    fn newline(&self) -> &str {
        if self.config.pretty_print {
            "\n"
        } else {
            ""
        }
    }

    fn push_line(&mut self, line: String) {
        self.elements.push(format!("{}{}", self.indent_str(), line));
    }

    /// Add page-level CSS: the usable page width, or the whole sheet with
    /// its margins when the page frame is on
    pub fn add_page_styles(&mut self, document: &Document) {
        let prefix = CLASS_PREFIX;
        let page = &document.page;
        if self.config.page_frame {
            self.styles.push("body { background: #e0e0e0; }".to_string());
            self.styles.push(format!(
                concat!(
                    ".{p}document {{ box-sizing: border-box; width: {}pt; min-height: {}pt; ",
                    "padding: {}pt {}pt {}pt {}pt; margin: 12pt auto; background: #ffffff; font-family: sans-serif; }}"
                ),
                page.width,
                page.height,
                page.margin_top,
                page.margin_right,
                page.margin_bottom,
                page.margin_left,
                p = prefix
            ));
        } else {
            self.styles.push(format!(
                ".{p}document {{ max-width: {}pt; margin: auto; font-family: sans-serif; }}",
                page.usable_width(),
                p = prefix
            ));
        }
        self.styles
            .push(format!(".{p}table {{ border-collapse: collapse; }}", p = prefix));
        self.styles.push(format!(
            ".{p}table td {{ border: 1px solid #999999; padding: 2pt 4pt; }}",
            p = prefix
        ));
        self.styles
            .push(format!(".{p}hyperlink {{ color: #0563c1; }}", p = prefix));
    }

    /// Add a paragraph element
    pub fn add_paragraph(&mut self, paragraph: &Paragraph) {
        let style = match paragraph.style.alignment {
            Some(Alignment::Center) => r#" style="text-align: center""#,
            Some(Alignment::Right) => r#" style="text-align: right""#,
            Some(Alignment::Justify) => r#" style="text-align: justify""#,
            Some(Alignment::Left) | None => "",
        };
        let content: String = paragraph.runs.iter().map(|run| self.run_html(run)).collect();
        self.push_line(format!(
            r#"<p class="{}paragraph"{}>{}</p>"#,
            CLASS_PREFIX,
            style,
            content
        ));
    }

    /// Add a table element
    pub fn add_table(&mut self, table: &Table) {
        self.push_line(format!(r#"<table class="{}table">"#, CLASS_PREFIX));
        self.indent += 1;
        for row in &table.rows {
            self.push_line("<tr>".to_string());
            self.indent += 1;
            for cell in &row.cells {
                let content: String = cell.runs.iter().map(|run| self.run_html(run)).collect();
                self.push_line(format!("<td>{}</td>", content));
            }
            self.indent = self.indent.saturating_sub(1);
            self.push_line("</tr>".to_string());
        }
        self.indent = self.indent.saturating_sub(1);
        self.push_line("</table>".to_string());
    }

    fn run_html(&self, run: &Run) -> String {
        if let Some(picture) = &run.picture {
            return picture_html(picture, self.config.embed_pictures);
        }

        let mut html = escape_html(&run.text);
        let style = &run.style;
        if style.underline == Some(true) {
            html = format!("<u>{}</u>", html);
        }
        if style.strike == Some(true) {
            html = format!("<s>{}</s>", html);
        }
        if style.italic == Some(true) {
            html = format!("<em>{}</em>", html);
        }
        if style.bold == Some(true) {
            html = format!("<strong>{}</strong>", html);
        }

        let mut css = vec![];
        if let Some(FontColor::Rgb(hex)) = &style.color {
            css.push(format!("color: #{}", escape_html(hex)));
        }
        if let Some(size) = style.size {
            css.push(format!("font-size: {}pt", size));
        }
        if !css.is_empty() {
            html = format!(r#"<span style="{}">{}</span>"#, css.join("; "), html);
        }

        if let Some(url) = &run.hyperlink {
            html = format!(
                r#"<a class="{}hyperlink" href="{}">{}</a>"#,
                CLASS_PREFIX,
                escape_html(url),
                html
            );
        }
        html
    }

    /// Build the final HTML string
    pub fn build(self) -> String {
        let nl = self.newline();
        let prefix = CLASS_PREFIX;
        let mut html = String::new();

        if self.config.standalone {
            html.push_str("<!DOCTYPE html>");
            html.push_str(nl);
            html.push_str("<html>");
            html.push_str(nl);
            html.push_str("<head>");
            html.push_str(nl);
            html.push_str(r#"<meta charset="utf-8">"#);
            html.push_str(nl);
            if !self.styles.is_empty() {
                html.push_str("<style>");
                html.push_str(nl);
                for style in &self.styles {
                    html.push_str(style);
                    html.push_str(nl);
                }
                html.push_str("</style>");
                html.push_str(nl);
            }
            html.push_str("</head>");
            html.push_str(nl);
            html.push_str("<body>");
            html.push_str(nl);
        }

        html.push_str(&format!(r#"<div class="{}document">"#, prefix));
        html.push_str(nl);
        for element in &self.elements {
            html.push_str(element);
            html.push_str(nl);
        }
        html.push_str("</div>");

        if self.config.standalone {
            html.push_str(nl);
            html.push_str("</body>");
            html.push_str(nl);
            html.push_str("</html>");
        }

        html
    }
}

/// Render a document to an HTML string
pub fn render_html(document: &Document, config: &HtmlConfig) -> String {
    let mut builder = HtmlBuilder::new(config.clone());
    if config.standalone {
        builder.add_page_styles(document);
    }
    for block in document.blocks() {
        match block {
            Block::Paragraph(paragraph) => builder.add_paragraph(paragraph),
            Block::Table(table) => builder.add_table(table),
        }
    }
    builder.build()
}

/// Picture as an inline data URI when `embed` is set, falling back to a file
/// reference when the file cannot be read
fn picture_html(picture: &Picture, embed: bool) -> String {
    let size = format!("width: {}pt; height: {}pt", picture.width, picture.height);
    let reference = || escape_html(&picture.path.to_string_lossy());
    let src = if embed {
        match std::fs::read(&picture.path) {
            Ok(bytes) => format!("data:{};base64,{}", mime_type(picture), STANDARD.encode(bytes)),
            Err(e) => {
                log::warn!("embedding {} failed: {}", picture.path.display(), e);
                reference()
            }
        }
    } else {
        reference()
    };
    format!(r#"<img src="{}" style="{}" alt="">"#, src, size)
}

fn mime_type(picture: &Picture) -> &'static str {
    let extension = picture
        .path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Escape special HTML characters
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RunStyle;

    fn fragment() -> HtmlConfig {
        HtmlConfig::new().with_standalone(false)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b"), "a &lt; b");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("\"it's\""), "&quot;it&#39;s&quot;");
    }

    #[test]
    fn test_render_paragraphs_and_table() {
        let mut doc = Document::default();
        doc.push_paragraph(
            Paragraph::from_runs(vec![
                Run::new("Hello "),
                Run::new("world").with_style(RunStyle {
                    bold: Some(true),
                    ..RunStyle::default()
                }),
            ])
            .with_alignment(Alignment::Center),
        );
        let mut table = Table::new(1, 2);
        table.cell_mut(0, 0).unwrap().set_text("A");
        table.cell_mut(0, 0).unwrap().set_bold(true);
        table.cell_mut(0, 1).unwrap().set_text("B & C");
        doc.push(table);

        insta::assert_snapshot!(render_html(&doc, &fragment()), @r#"
        <div class="dw-document">
          <p class="dw-paragraph" style="text-align: center">Hello <strong>world</strong></p>
          <table class="dw-table">
            <tr>
              <td><strong>A</strong></td>
              <td>B &amp; C</td>
            </tr>
          </table>
        </div>
        "#);
    }

    #[test]
    fn test_render_hyperlink() {
        let mut doc = Document::default();
        doc.push_paragraph(Paragraph::from_runs(vec![
            Run::new("See "),
            Run::hyperlink("home", "https://example.com/?a=1&b=2"),
        ]));
        let html = render_html(&doc, &fragment().with_pretty_print(false));
        assert_eq!(
            html,
            r#"<div class="dw-document"><p class="dw-paragraph">See <a class="dw-hyperlink" href="https://example.com/?a=1&amp;b=2"><u>home</u></a></p></div>"#
        );
    }

    #[test]
    fn test_render_colored_run() {
        let mut doc = Document::default();
        doc.push_paragraph(Paragraph::from_runs(vec![Run::new("red").with_style(RunStyle {
            italic: Some(true),
            size: Some(14.0),
            color: Some(FontColor::Rgb("FF0000".to_string())),
            ..RunStyle::default()
        })]));
        let html = render_html(&doc, &fragment());
        assert!(html.contains(r#"<span style="color: #FF0000; font-size: 14pt"><em>red</em></span>"#));
    }

    #[test]
    fn test_picture_embedded_as_data_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.gif");
        std::fs::write(&path, b"GIF89a\x01\x00\x01\x00").unwrap();

        let mut doc = Document::default();
        doc.push_paragraph(Paragraph::from_runs(vec![Run::picture(Picture {
            path: path.clone(),
            width: 468.0,
            height: 234.5,
        })]));
        let html = render_html(&doc, &fragment());
        let expected = format!(
            r#"<img src="data:image/gif;base64,{}" style="width: 468pt; height: 234.5pt" alt="">"#,
            STANDARD.encode(b"GIF89a\x01\x00\x01\x00")
        );
        assert!(html.contains(&expected));
    }

    #[test]
    fn test_missing_picture_falls_back_to_path() {
        let mut doc = Document::default();
        doc.push_paragraph(Paragraph::from_runs(vec![Run::picture(Picture {
            path: "missing/logo.png".into(),
            width: 10.0,
            height: 10.0,
        })]));
        let html = render_html(&doc, &fragment());
        assert!(html.contains(r#"<img src="missing/logo.png""#));
    }

    #[test]
    fn test_pictures_referenced_when_not_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dot.gif");
        std::fs::write(&path, b"GIF89a\x01\x00\x01\x00").unwrap();

        let mut doc = Document::default();
        doc.push_paragraph(Paragraph::from_runs(vec![Run::picture(Picture {
            path: path.clone(),
            width: 10.0,
            height: 10.0,
        })]));
        let html = render_html(&doc, &fragment().with_embedded_pictures(false));
        assert!(html.contains(&format!(r#"<img src="{}""#, path.display())));
        assert!(!html.contains("base64"));
    }

    #[test]
    fn test_page_frame_uses_sheet_and_margins() {
        let mut doc = Document::default();
        doc.page.margin_left = 36.0;
        doc.push_paragraph(Paragraph::from_text("x"));
        let html = render_html(&doc, &HtmlConfig::default().with_page_frame(true));
        assert!(html.contains("width: 612pt; min-height: 792pt; padding: 72pt 72pt 72pt 36pt;"));
        assert!(!html.contains("max-width"));
    }

    #[test]
    fn test_standalone_page() {
        let mut doc = Document::default();
        doc.push_paragraph(Paragraph::from_text("x"));
        let html = render_html(&doc, &HtmlConfig::default());
        assert!(html.starts_with("<!DOCTYPE html>\n<html>"));
        assert!(html.contains(".dw-document { max-width: 468pt;"));
        assert!(html.ends_with("</body>\n</html>"));
    }
}
