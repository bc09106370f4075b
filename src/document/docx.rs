//! Word (.docx) packages
//!
//! Reading maps `word/document.xml` onto the block model: top-level
//! paragraphs and tables, runs with their character formatting, hyperlinks,
//! tabs and breaks, and the page size and margins of the last section.
//! Drawings, text boxes and nested tables are not modeled; text of a nested
//! table is folded into the enclosing cell. Style definitions are carried
//! over unchanged so a generated document keeps its template's styles.
//!
//! Lengths are converted between twentieths of a point (twips) and points.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;

use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::model::{
    Alignment, Block, Document, FontColor, PageSetup, Paragraph, ParagraphStyle, Picture, Run,
    RunStyle, Table, TableCell, TableRow, ThemeColor,
};

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const STYLES_PART: &str = "word/styles.xml";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// English Metric Units per point
const EMU_PER_POINT: f64 = 12700.0;

/// Elements whose whole subtree is ignored when reading
const SKIPPED: [&[u8]; 4] = [b"drawing", b"pict", b"object", b"AlternateContent"];

/// Errors that can occur while reading or writing a Word package
#[derive(Debug, Error)]
pub enum DocxError {
    #[error("invalid package: {0}")]
    Zip(#[from] ZipError),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("package has no {0} part")]
    MissingPart(&'static str),

    #[error("failed to embed picture {}: {source}", path.display())]
    Picture {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Document {
    /// Read a document from the bytes of a .docx package
    pub fn from_docx(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let body = read_part(&mut archive, DOCUMENT_PART)?.ok_or(DocxError::MissingPart(DOCUMENT_PART))?;
        let links = match read_part(&mut archive, DOCUMENT_RELS_PART)? {
            Some(rels) => parse_relationships(&rels)?,
            None => HashMap::new(),
        };
        let styles = read_part(&mut archive, STYLES_PART)?;
        let style_names = match &styles {
            Some(xml) => parse_style_names(xml)?,
            None => HashMap::new(),
        };

        let mut reader = BodyReader::new(&links, &style_names);
        reader.read(&body)?;

        let mut document = Document::new(reader.page);
        for block in reader.blocks {
            document.push(block);
        }
        document.styles_xml = styles;
        Ok(document)
    }

    /// Encode the document as a .docx package
    pub fn to_docx(&self) -> Result<Vec<u8>, DocxError> {
        PackageWriter::new(self).write()
    }
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Option<String>, DocxError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

fn attr(element: &BytesStart, name: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.local_name().as_ref() == name {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Relationship id to target
fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, DocxError> {
    let mut targets = HashMap::new();
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&e, b"Id")?, attr(&e, b"Target")?) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

/// Style id to display name
fn parse_style_names(xml: &str) -> Result<HashMap<String, String>, DocxError> {
    let mut names = HashMap::new();
    let mut current: Option<String> = None;
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"style" => current = attr(&e, b"styleId")?,
                b"name" => {
                    if let (Some(id), Some(name)) = (current.take(), attr(&e, b"val")?) {
                        names.insert(id, name);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(names)
}

/// `w:b`, `w:keepNext` and friends: present means on unless val says off
fn on_off(val: Option<String>) -> bool {
    !matches!(val.as_deref(), Some("0" | "false" | "off" | "none"))
}

fn from_twips(val: Option<String>) -> Option<f64> {
    val?.parse::<f64>().ok().map(|twips| twips / 20.0)
}

fn to_twips(points: f64) -> i64 {
    (points * 20.0).round() as i64
}

/// Streaming reader over the body of `word/document.xml`
struct BodyReader<'a> {
    links: &'a HashMap<String, String>,
    style_names: &'a HashMap<String, String>,
    page: PageSetup,
    blocks: Vec<Block>,
    paragraph: Option<Paragraph>,
    run: Option<Run>,
    link: Option<String>,
    table: Option<Table>,
    row: Option<TableRow>,
    cell: Option<TableCell>,
    table_depth: usize,
    skip_depth: usize,
    in_paragraph_props: bool,
    in_run_props: bool,
    in_text: bool,
}

impl<'a> BodyReader<'a> {
    fn new(links: &'a HashMap<String, String>, style_names: &'a HashMap<String, String>) -> Self {
        Self {
            links,
            style_names,
            page: PageSetup::default(),
            blocks: Vec::new(),
            paragraph: None,
            run: None,
            link: None,
            table: None,
            row: None,
            cell: None,
            table_depth: 0,
            skip_depth: 0,
            in_paragraph_props: false,
            in_run_props: false,
            in_text: false,
        }
    }

    fn read(&mut self, xml: &str) -> Result<(), DocxError> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event()? {
                Event::Start(e) => self.start(&e)?,
                Event::Empty(e) => {
                    self.start(&e)?;
                    self.end(e.local_name().as_ref());
                }
                Event::End(e) => self.end(e.local_name().as_ref()),
                Event::Text(t) => {
                    if self.in_text && self.skip_depth == 0 {
                        let text = t.unescape()?;
                        if let Some(run) = self.run.as_mut() {
                            run.text.push_str(&text);
                        }
                    }
                }
                Event::Eof => return Ok(()),
                _ => {}
            }
        }
    }

    fn style_name(&self, id: Option<String>) -> Option<String> {
        id.map(|id| self.style_names.get(&id).cloned().unwrap_or(id))
    }

    /// Formatting of the top-level paragraph being read, outside its mark's run properties
    fn paragraph_style(&mut self) -> Option<&mut ParagraphStyle> {
        if !self.in_paragraph_props || self.in_run_props || self.table_depth > 0 {
            return None;
        }
        self.paragraph.as_mut().map(|p| &mut p.style)
    }

    fn run_style(&mut self) -> Option<&mut RunStyle> {
        if !self.in_run_props {
            return None;
        }
        self.run.as_mut().map(|r| &mut r.style)
    }

    fn push_text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }

    fn start(&mut self, e: &BytesStart) -> Result<(), quick_xml::Error> {
        let name = e.local_name();
        let name = name.as_ref();
        if SKIPPED.contains(&name) {
            self.skip_depth += 1;
            return Ok(());
        }
        if self.skip_depth > 0 {
            return Ok(());
        }

        match name {
            b"p" => {
                if self.table_depth == 0 {
                    self.paragraph = Some(Paragraph::new());
                } else if let Some(cell) = self.cell.as_mut() {
                    // paragraphs of one cell are kept apart by line breaks
                    if !cell.runs.is_empty() {
                        cell.runs.push(Run::new("\n"));
                    }
                }
            }
            b"pPr" => self.in_paragraph_props = true,
            b"rPr" => self.in_run_props = true,
            b"pStyle" => {
                let name = self.style_name(attr(e, b"val")?);
                if let Some(style) = self.paragraph_style() {
                    style.name = name;
                }
            }
            b"jc" => {
                let alignment = match attr(e, b"val")?.as_deref() {
                    Some("left" | "start") => Some(Alignment::Left),
                    Some("center") => Some(Alignment::Center),
                    Some("right" | "end") => Some(Alignment::Right),
                    Some("both" | "distribute") => Some(Alignment::Justify),
                    _ => None,
                };
                if let Some(style) = self.paragraph_style() {
                    style.alignment = alignment;
                }
            }
            b"ind" => {
                let left = from_twips(attr(e, b"left")?.or(attr(e, b"start")?));
                let right = from_twips(attr(e, b"right")?.or(attr(e, b"end")?));
                let first_line = match from_twips(attr(e, b"hanging")?) {
                    Some(hanging) => Some(-hanging),
                    None => from_twips(attr(e, b"firstLine")?),
                };
                if let Some(style) = self.paragraph_style() {
                    style.left_indent = left;
                    style.right_indent = right;
                    style.first_line_indent = first_line;
                }
            }
            b"spacing" => {
                let before = from_twips(attr(e, b"before")?);
                let after = from_twips(attr(e, b"after")?);
                let line = match attr(e, b"lineRule")?.as_deref() {
                    None | Some("auto") => attr(e, b"line")?
                        .and_then(|line| line.parse::<f64>().ok())
                        .map(|line| line / 240.0),
                    Some(_) => None,
                };
                if let Some(style) = self.paragraph_style() {
                    style.space_before = before;
                    style.space_after = after;
                    style.line_spacing = line;
                }
            }
            b"keepLines" | b"keepNext" | b"pageBreakBefore" => {
                let on = Some(on_off(attr(e, b"val")?));
                if let Some(style) = self.paragraph_style() {
                    match name {
                        b"keepLines" => style.keep_together = on,
                        b"keepNext" => style.keep_with_next = on,
                        _ => style.page_break_before = on,
                    }
                }
            }
            b"r" => {
                self.run = Some(Run {
                    hyperlink: self.link.clone(),
                    ..Run::default()
                });
            }
            b"rStyle" => {
                let name = self.style_name(attr(e, b"val")?);
                if let Some(style) = self.run_style() {
                    style.name = name;
                }
            }
            b"b" | b"i" | b"strike" => {
                let on = Some(on_off(attr(e, b"val")?));
                if let Some(style) = self.run_style() {
                    match name {
                        b"b" => style.bold = on,
                        b"i" => style.italic = on,
                        _ => style.strike = on,
                    }
                }
            }
            b"u" => {
                let on = Some(on_off(attr(e, b"val")?));
                if let Some(style) = self.run_style() {
                    style.underline = on;
                }
            }
            b"rFonts" => {
                let font = attr(e, b"ascii")?.or(attr(e, b"hAnsi")?);
                if let Some(style) = self.run_style() {
                    style.font = font;
                }
            }
            b"sz" => {
                let size = attr(e, b"val")?
                    .and_then(|v| v.parse::<f64>().ok())
                    .map(|half_points| half_points / 2.0);
                if let Some(style) = self.run_style() {
                    style.size = size;
                }
            }
            b"color" => {
                let color = match attr(e, b"themeColor")?.as_deref() {
                    Some("hyperlink" | "followedHyperlink") => Some(FontColor::Theme(ThemeColor::Hyperlink)),
                    Some(theme) if theme.starts_with("accent") => Some(FontColor::Theme(ThemeColor::Accent)),
                    Some(theme) if theme.starts_with("text") || theme.starts_with("dark") => {
                        Some(FontColor::Theme(ThemeColor::Text))
                    }
                    _ => attr(e, b"val")?.filter(|v| v != "auto").map(FontColor::Rgb),
                };
                if let Some(style) = self.run_style() {
                    style.color = color;
                }
            }
            b"t" => self.in_text = self.run.is_some(),
            b"tab" if !self.in_paragraph_props => self.push_text("\t"),
            b"br" | b"cr" => self.push_text("\n"),
            b"hyperlink" => {
                self.link = match attr(e, b"id")? {
                    Some(id) => self.links.get(&id).cloned(),
                    None => attr(e, b"anchor")?.map(|anchor| format!("#{}", anchor)),
                };
            }
            b"tbl" => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table = Some(Table::default());
                }
            }
            b"tblStyle" if self.table_depth == 1 => {
                let name = self.style_name(attr(e, b"val")?);
                if let Some(table) = self.table.as_mut() {
                    table.style = name;
                }
            }
            b"tr" if self.table_depth == 1 => self.row = Some(TableRow::default()),
            b"tc" if self.table_depth == 1 => self.cell = Some(TableCell::default()),
            b"pgSz" => {
                if let Some(width) = from_twips(attr(e, b"w")?) {
                    self.page.width = width;
                }
                if let Some(height) = from_twips(attr(e, b"h")?) {
                    self.page.height = height;
                }
            }
            b"pgMar" => {
                let page = &mut self.page;
                for (key, field) in [
                    (b"top".as_slice(), &mut page.margin_top),
                    (b"bottom".as_slice(), &mut page.margin_bottom),
                    (b"left".as_slice(), &mut page.margin_left),
                    (b"right".as_slice(), &mut page.margin_right),
                ] {
                    if let Some(value) = from_twips(attr(e, key)?) {
                        *field = value;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            if SKIPPED.contains(&name) {
                self.skip_depth -= 1;
            }
            return;
        }

        match name {
            b"t" => self.in_text = false,
            b"pPr" => self.in_paragraph_props = false,
            b"rPr" => self.in_run_props = false,
            b"hyperlink" => self.link = None,
            b"r" => {
                if let Some(run) = self.run.take() {
                    if self.table_depth > 0 {
                        if let Some(cell) = self.cell.as_mut() {
                            cell.runs.push(run);
                        }
                    } else if let Some(paragraph) = self.paragraph.as_mut() {
                        paragraph.runs.push(run);
                    }
                }
            }
            b"p" if self.table_depth == 0 => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.blocks.push(paragraph.into());
                }
            }
            b"tc" if self.table_depth == 1 => {
                if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
                    row.cells.push(cell);
                }
            }
            b"tr" if self.table_depth == 1 => {
                if let (Some(row), Some(table)) = (self.row.take(), self.table.as_mut()) {
                    table.rows.push(row);
                }
            }
            b"tbl" => {
                if self.table_depth == 1 {
                    if let Some(table) = self.table.take() {
                        self.blocks.push(table.into());
                    }
                }
                self.table_depth = self.table_depth.saturating_sub(1);
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum StyleKind {
    Paragraph,
    Character,
    Table,
}

impl StyleKind {
    fn as_str(self) -> &'static str {
        match self {
            StyleKind::Paragraph => "paragraph",
            StyleKind::Character => "character",
            StyleKind::Table => "table",
        }
    }
}

const TABLE_GRID_ID: &str = "TableGrid";

const TABLE_GRID_STYLE: &str = concat!(
    r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders>"#,
    r#"<w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"<w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"<w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"<w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"<w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"<w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"</w:tblBorders></w:tblPr></w:style>"#,
);

/// Builds the parts of a .docx package from a document
struct PackageWriter<'d> {
    document: &'d Document,
    /// Style display name to id, from the carried style definitions
    style_ids: HashMap<String, String>,
    /// Styles referenced by the body that the carried definitions lack
    missing_styles: BTreeMap<String, (StyleKind, String)>,
    /// (id, type, target, external)
    relationships: Vec<(String, &'static str, String, bool)>,
    media: Vec<(String, Vec<u8>)>,
}

impl<'d> PackageWriter<'d> {
    fn new(document: &'d Document) -> Self {
        let style_ids = document
            .styles_xml
            .as_deref()
            .and_then(|xml| parse_style_names(xml).ok())
            .unwrap_or_default()
            .into_iter()
            .map(|(id, name)| (name, id))
            .collect();
        Self {
            document,
            style_ids,
            missing_styles: BTreeMap::new(),
            relationships: vec![("rId1".to_string(), REL_STYLES, "styles.xml".to_string(), false)],
            media: Vec::new(),
        }
    }

    fn relationship(&mut self, kind: &'static str, target: String, external: bool) -> String {
        let id = format!("rId{}", self.relationships.len() + 1);
        self.relationships.push((id.clone(), kind, target, external));
        id
    }

    /// Id for a style name, recording it when no carried definition exists
    fn style_id(&mut self, kind: StyleKind, name: &str) -> String {
        if let Some(id) = self.style_ids.get(name) {
            return id.clone();
        }
        let id: String = name.split_whitespace().collect();
        self.missing_styles
            .entry(id.clone())
            .or_insert_with(|| (kind, name.to_string()));
        id
    }

    fn write(mut self) -> Result<Vec<u8>, DocxError> {
        let mut body = String::new();
        for block in self.document.blocks() {
            match block {
                Block::Paragraph(paragraph) => self.write_paragraph(&mut body, paragraph)?,
                Block::Table(table) => self.write_table(&mut body, table)?,
            }
        }
        self.write_section(&mut body);

        let document_xml = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="{}" xmlns:r="{}" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                "<w:body>{}</w:body></w:document>"
            ),
            NS_MAIN, NS_REL, body
        );

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let parts = [
            ("[Content_Types].xml".to_string(), self.content_types().into_bytes()),
            ("_rels/.rels".to_string(), package_relationships().into_bytes()),
            (DOCUMENT_PART.to_string(), document_xml.into_bytes()),
            (DOCUMENT_RELS_PART.to_string(), self.document_relationships().into_bytes()),
            (STYLES_PART.to_string(), self.styles().into_bytes()),
        ];
        for (name, content) in parts.iter().chain(self.media.iter()) {
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            zip.start_file(name.as_str(), options)?;
            zip.write_all(content)?;
        }
        Ok(zip.finish()?.into_inner())
    }

    fn write_paragraph(&mut self, out: &mut String, paragraph: &Paragraph) -> Result<(), DocxError> {
        out.push_str("<w:p>");
        let properties = self.paragraph_properties(&paragraph.style);
        out.push_str(&properties);
        for run in &paragraph.runs {
            self.write_run(out, run)?;
        }
        out.push_str("</w:p>");
        Ok(())
    }

    fn paragraph_properties(&mut self, style: &ParagraphStyle) -> String {
        let mut xml = String::new();
        if let Some(name) = &style.name {
            let id = self.style_id(StyleKind::Paragraph, name);
            xml.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, escape(&id)));
        }
        for (element, value) in [
            ("keepNext", style.keep_with_next),
            ("keepLines", style.keep_together),
            ("pageBreakBefore", style.page_break_before),
        ] {
            match value {
                Some(true) => xml.push_str(&format!("<w:{}/>", element)),
                Some(false) => xml.push_str(&format!(r#"<w:{} w:val="0"/>"#, element)),
                None => {}
            }
        }

        let mut spacing = String::new();
        if let Some(before) = style.space_before {
            spacing.push_str(&format!(r#" w:before="{}""#, to_twips(before)));
        }
        if let Some(after) = style.space_after {
            spacing.push_str(&format!(r#" w:after="{}""#, to_twips(after)));
        }
        if let Some(line) = style.line_spacing {
            spacing.push_str(&format!(r#" w:line="{}" w:lineRule="auto""#, (line * 240.0).round() as i64));
        }
        if !spacing.is_empty() {
            xml.push_str(&format!("<w:spacing{}/>", spacing));
        }

        let mut indent = String::new();
        if let Some(left) = style.left_indent {
            indent.push_str(&format!(r#" w:left="{}""#, to_twips(left)));
        }
        if let Some(right) = style.right_indent {
            indent.push_str(&format!(r#" w:right="{}""#, to_twips(right)));
        }
        match style.first_line_indent {
            Some(first) if first < 0.0 => indent.push_str(&format!(r#" w:hanging="{}""#, to_twips(-first))),
            Some(first) => indent.push_str(&format!(r#" w:firstLine="{}""#, to_twips(first))),
            None => {}
        }
        if !indent.is_empty() {
            xml.push_str(&format!("<w:ind{}/>", indent));
        }

        if let Some(alignment) = style.alignment {
            let value = match alignment {
                Alignment::Left => "left",
                Alignment::Center => "center",
                Alignment::Right => "right",
                Alignment::Justify => "both",
            };
            xml.push_str(&format!(r#"<w:jc w:val="{}"/>"#, value));
        }

        if xml.is_empty() {
            xml
        } else {
            format!("<w:pPr>{}</w:pPr>", xml)
        }
    }

    fn write_run(&mut self, out: &mut String, run: &Run) -> Result<(), DocxError> {
        let link = match &run.hyperlink {
            Some(url) => match url.strip_prefix('#') {
                Some(anchor) => Some(format!(r#"<w:hyperlink w:anchor="{}">"#, escape(anchor))),
                None => {
                    let id = self.relationship(REL_HYPERLINK, url.clone(), true);
                    Some(format!(r#"<w:hyperlink r:id="{}">"#, id))
                }
            },
            None => None,
        };
        if let Some(open) = &link {
            out.push_str(open);
        }

        out.push_str("<w:r>");
        let properties = self.run_properties(&run.style);
        out.push_str(&properties);
        if let Some(picture) = &run.picture {
            let drawing = self.picture(picture)?;
            out.push_str(&drawing);
        }
        write_text(out, &run.text);
        out.push_str("</w:r>");

        if link.is_some() {
            out.push_str("</w:hyperlink>");
        }
        Ok(())
    }

    fn run_properties(&mut self, style: &RunStyle) -> String {
        let mut xml = String::new();
        if let Some(name) = &style.name {
            let id = self.style_id(StyleKind::Character, name);
            xml.push_str(&format!(r#"<w:rStyle w:val="{}"/>"#, escape(&id)));
        }
        if let Some(font) = &style.font {
            let font = escape(font);
            xml.push_str(&format!(r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}"/>"#, font));
        }
        for (element, value) in [("b", style.bold), ("i", style.italic), ("strike", style.strike)] {
            match value {
                Some(true) => xml.push_str(&format!("<w:{}/>", element)),
                Some(false) => xml.push_str(&format!(r#"<w:{} w:val="0"/>"#, element)),
                None => {}
            }
        }
        match &style.color {
            Some(FontColor::Rgb(hex)) => xml.push_str(&format!(r#"<w:color w:val="{}"/>"#, escape(hex))),
            Some(FontColor::Theme(theme)) => {
                let (value, slot) = match theme {
                    ThemeColor::Text => ("000000", "text1"),
                    ThemeColor::Accent => ("4472C4", "accent1"),
                    ThemeColor::Hyperlink => ("0563C1", "hyperlink"),
                };
                xml.push_str(&format!(r#"<w:color w:val="{}" w:themeColor="{}"/>"#, value, slot));
            }
            None => {}
        }
        if let Some(size) = style.size {
            xml.push_str(&format!(r#"<w:sz w:val="{}"/>"#, (size * 2.0).round() as i64));
        }
        match style.underline {
            Some(true) => xml.push_str(r#"<w:u w:val="single"/>"#),
            Some(false) => xml.push_str(r#"<w:u w:val="none"/>"#),
            None => {}
        }

        if xml.is_empty() {
            xml
        } else {
            format!("<w:rPr>{}</w:rPr>", xml)
        }
    }

    fn picture(&mut self, picture: &Picture) -> Result<String, DocxError> {
        let bytes = std::fs::read(&picture.path).map_err(|source| DocxError::Picture {
            path: picture.path.clone(),
            source,
        })?;
        let number = self.media.len() + 1;
        let extension = media_extension(picture);
        let target = format!("media/image{}.{}", number, extension);
        self.media.push((format!("word/{}", target), bytes));
        let id = self.relationship(REL_IMAGE, target, false);

        let cx = (picture.width * EMU_PER_POINT).round() as i64;
        let cy = (picture.height * EMU_PER_POINT).round() as i64;
        Ok(format!(
            concat!(
                r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{n}" name="Picture {n}"/>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{n}" name="image{n}.{ext}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing>"#
            ),
            cx = cx,
            cy = cy,
            n = number,
            ext = extension,
            id = id
        ))
    }

    fn write_table(&mut self, out: &mut String, table: &Table) -> Result<(), DocxError> {
        let columns = table.column_count().max(1);
        let column_width = to_twips(self.document.page.usable_width().max(0.0)) / columns as i64;

        out.push_str("<w:tbl><w:tblPr>");
        if let Some(name) = &table.style {
            let id = self.style_id(StyleKind::Table, name);
            out.push_str(&format!(r#"<w:tblStyle w:val="{}"/>"#, escape(&id)));
        }
        out.push_str(r#"<w:tblW w:w="0" w:type="auto"/></w:tblPr><w:tblGrid>"#);
        for _ in 0..columns {
            out.push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, column_width));
        }
        out.push_str("</w:tblGrid>");

        for row in &table.rows {
            out.push_str("<w:tr>");
            for cell in &row.cells {
                out.push_str(&format!(
                    r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/></w:tcPr><w:p>"#,
                    column_width
                ));
                for run in &cell.runs {
                    self.write_run(out, run)?;
                }
                out.push_str("</w:p></w:tc>");
            }
            out.push_str("</w:tr>");
        }
        out.push_str("</w:tbl>");
        Ok(())
    }

    fn write_section(&self, out: &mut String) {
        let page = &self.document.page;
        out.push_str(&format!(
            concat!(
                r#"<w:sectPr><w:pgSz w:w="{}" w:h="{}"/>"#,
                r#"<w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="720" w:footer="720" w:gutter="0"/>"#,
                "</w:sectPr>"
            ),
            to_twips(page.width),
            to_twips(page.height),
            to_twips(page.margin_top),
            to_twips(page.margin_right),
            to_twips(page.margin_bottom),
            to_twips(page.margin_left),
        ));
    }

    fn content_types(&self) -> String {
        let extensions: BTreeSet<&str> = self
            .media
            .iter()
            .filter_map(|(name, _)| name.rsplit_once('.').map(|(_, ext)| ext))
            .collect();
        let mut xml = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#
        ));
        for extension in extensions {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                extension,
                media_content_type(extension)
            ));
        }
        xml.push_str(concat!(
            r#"<Override PartName="/word/document.xml" "#,
            r#"ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"<Override PartName="/word/styles.xml" "#,
            r#"ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
            "</Types>"
        ));
        xml
    }

    fn document_relationships(&self) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">"#,
            NS_PACKAGE_REL
        );
        for (id, kind, target, external) in &self.relationships {
            let mode = if *external { r#" TargetMode="External""# } else { "" };
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                id,
                kind,
                escape(target),
                mode
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    /// The carried style definitions, or a minimal set, plus a definition for
    /// every referenced style they lack
    fn styles(&self) -> String {
        let mut definitions = String::new();
        for (id, (kind, name)) in &self.missing_styles {
            if id == TABLE_GRID_ID {
                definitions.push_str(TABLE_GRID_STYLE);
            } else {
                definitions.push_str(&format!(
                    r#"<w:style w:type="{}" w:customStyle="1" w:styleId="{}"><w:name w:val="{}"/></w:style>"#,
                    kind.as_str(),
                    escape(id),
                    escape(name)
                ));
            }
        }

        if let Some(carried) = &self.document.styles_xml {
            if let Some(close) = carried.rfind("</w:styles>") {
                return format!("{}{}{}", &carried[..close], definitions, &carried[close..]);
            }
            log::warn!("carried style definitions are malformed, writing defaults");
        }
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{}">"#,
                r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>"#,
                "{}</w:styles>"
            ),
            NS_MAIN, definitions
        )
    }
}

fn package_relationships() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">"#,
            r#"<Relationship Id="rId1" Type="{}" Target="word/document.xml"/></Relationships>"#
        ),
        NS_PACKAGE_REL, REL_OFFICE_DOCUMENT
    )
}

/// Run text as `w:t` pieces separated by tab and break elements
fn write_text(out: &mut String, text: &str) {
    let mut piece = String::new();
    let flush = |out: &mut String, piece: &mut String| {
        if !piece.is_empty() {
            out.push_str(&format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape(piece.as_str())));
            piece.clear();
        }
    };
    for c in text.chars() {
        match c {
            '\t' => {
                flush(out, &mut piece);
                out.push_str("<w:tab/>");
            }
            '\n' => {
                flush(out, &mut piece);
                out.push_str("<w:br/>");
            }
            c => piece.push(c),
        }
    }
    flush(out, &mut piece);
}

fn media_extension(picture: &Picture) -> String {
    picture
        .path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e != "xml" && e != "rels")
        .unwrap_or_else(|| "png".to_string())
}

fn media_content_type(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
