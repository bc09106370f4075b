//! Paragraph, run and table types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Stable identity of a block inside one document
///
/// Ids are assigned when a block enters a document and are never reused, so
/// they stay valid while other blocks are inserted or removed around them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u64);

/// Horizontal paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

/// Colors defined by the document theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeColor {
    Text,
    Accent,
    Hyperlink,
}

/// Font color, either a concrete hex value or a theme slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontColor {
    /// Hex color without the leading '#', e.g. "1F4E79"
    Rgb(String),
    Theme(ThemeColor),
}

/// Paragraph-level formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphStyle {
    /// Named paragraph style, e.g. "Heading 1"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_indent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_indent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_line_indent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_before: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_after: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_together: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_with_next: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_break_before: Option<bool>,
}

impl ParagraphStyle {
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// Character-level formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStyle {
    /// Named character style
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strike: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    /// Font size in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<FontColor>,
}

impl RunStyle {
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// Style used for hyperlink runs: underlined, theme hyperlink color
    pub fn hyperlink() -> Self {
        Self {
            underline: Some(true),
            color: Some(FontColor::Theme(ThemeColor::Hyperlink)),
            ..Self::default()
        }
    }
}

/// An embedded picture, sized in points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    pub path: PathBuf,
    pub width: f64,
    pub height: f64,
}

/// An atomic piece of text with one set of formatting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "RunStyle::is_plain")]
    pub style: RunStyle,
    /// Target URL when the run is a hyperlink
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<Picture>,
}

impl Run {
    /// Create a plain text run
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Set the run style
    pub fn with_style(mut self, style: RunStyle) -> Self {
        self.style = style;
        self
    }

    /// Create a hyperlink run with hyperlink styling
    pub fn hyperlink(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::hyperlink(),
            hyperlink: Some(url.into()),
            picture: None,
        }
    }

    /// Create a run holding only a picture
    pub fn picture(picture: Picture) -> Self {
        Self {
            picture: Some(picture),
            ..Self::default()
        }
    }

    /// Create a text run carrying the formatting of `source`
    pub fn styled_like(source: &Run, text: impl Into<String>) -> Self {
        Self::new(text).with_style(source.style.clone())
    }
}

/// A paragraph: formatting plus an ordered list of runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(skip)]
    id: BlockId,
    #[serde(default, skip_serializing_if = "ParagraphStyle::is_plain")]
    pub style: ParagraphStyle,
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl PartialEq for Paragraph {
    fn eq(&self, other: &Self) -> bool {
        self.style == other.style && self.runs == other.runs
    }
}

impl Paragraph {
    /// Create an empty paragraph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph with a single plain run
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_runs(vec![Run::new(text)])
    }

    /// Create a paragraph from runs
    pub fn from_runs(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// Set the alignment
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.style.alignment = Some(alignment);
        self
    }

    /// Create a paragraph with the formatting of `source`
    ///
    /// Paragraph formatting is copied from `source`; the single new run takes
    /// its character formatting from `from_run`, or from the first run of
    /// `source` when not given.
    pub fn styled_like(source: &Paragraph, from_run: Option<&Run>, text: impl Into<String>) -> Self {
        let run = match from_run.or_else(|| source.runs.first()) {
            Some(reference) => Run::styled_like(reference, text),
            None => Run::new(text),
        };
        Self {
            id: BlockId::default(),
            style: source.style.clone(),
            runs: vec![run],
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Concatenated text of all runs
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Overwrite the paragraph text
    ///
    /// The first run keeps its formatting and receives the whole text; all
    /// other runs are dropped.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let style = self
            .runs
            .iter()
            .find(|r| r.picture.is_none())
            .map(|r| r.style.clone())
            .unwrap_or_default();
        self.runs = vec![Run::new(text).with_style(style)];
    }

    pub fn run(&self, index: usize) -> Option<&Run> {
        self.runs.get(index)
    }

    pub fn run_mut(&mut self, index: usize) -> Option<&mut Run> {
        self.runs.get_mut(index)
    }
}

/// A table cell holding formatted runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl TableCell {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Replace the cell content with a single run
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.runs = vec![Run::new(text)];
    }

    /// Set bold on every run of the cell
    pub fn set_bold(&mut self, bold: bool) {
        for run in &mut self.runs {
            run.style.bold = Some(bold);
        }
    }

    pub fn is_bold(&self) -> bool {
        !self.runs.is_empty() && self.runs.iter().all(|r| r.style.bold == Some(true))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

/// A grid of cells
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    #[serde(skip)]
    id: BlockId,
    /// Named table style, e.g. "Table Grid"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.style == other.style && self.rows == other.rows
    }
}

impl Table {
    /// Create a table of empty cells
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            id: BlockId::default(),
            style: None,
            rows: (0..rows)
                .map(|_| TableRow {
                    cells: vec![TableCell::default(); columns],
                })
                .collect(),
        }
    }

    /// Set the table style
    pub fn with_style(mut self, style: Option<String>) -> Self {
        self.style = style;
        self
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column count, taken from the first row
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.cells.len()).unwrap_or(0)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&TableCell> {
        self.rows.get(row).and_then(|r| r.cells.get(column))
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row).and_then(|r| r.cells.get_mut(column))
    }
}

/// A top-level block of the document body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

impl Block {
    pub fn id(&self) -> BlockId {
        match self {
            Block::Paragraph(p) => p.id,
            Block::Table(t) => t.id,
        }
    }

    fn set_id(&mut self, id: BlockId) {
        match self {
            Block::Paragraph(p) => p.id = id,
            Block::Table(t) => t.id = id,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        }
    }
}

impl From<Paragraph> for Block {
    fn from(paragraph: Paragraph) -> Self {
        Block::Paragraph(paragraph)
    }
}

impl From<Table> for Block {
    fn from(table: Table) -> Self {
        Block::Table(table)
    }
}

/// Page size and margins in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSetup {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
}

impl Default for PageSetup {
    /// US Letter with one inch margins
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin_top: 72.0,
            margin_bottom: 72.0,
            margin_left: 72.0,
            margin_right: 72.0,
        }
    }
}

impl PageSetup {
    /// Page width minus left and right margins
    pub fn usable_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    /// Page height minus top and bottom margins
    pub fn usable_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom
    }
}

/// An editable document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawDocument")]
pub struct Document {
    pub page: PageSetup,
    body: Vec<Block>,
    #[serde(skip)]
    next_id: u64,
    /// Word style definitions carried over from a .docx template
    #[serde(skip)]
    pub(super) styles_xml: Option<String>,
}

/// On-disk shape of a document; block ids are assigned on conversion
#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    page: PageSetup,
    #[serde(default)]
    body: Vec<Block>,
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        let mut document = Document::new(raw.page);
        for block in raw.body {
            document.push(block);
        }
        document
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.page == other.page && self.body == other.body
    }
}

impl Document {
    /// Create an empty document with the given page setup
    pub fn new(page: PageSetup) -> Self {
        Self {
            page,
            body: Vec::new(),
            next_id: 0,
            styles_xml: None,
        }
    }

    fn allocate(&mut self, mut block: Block) -> Block {
        self.next_id += 1;
        block.set_id(BlockId(self.next_id));
        block
    }

    /// Append a block, returning its id
    pub fn push(&mut self, block: impl Into<Block>) -> BlockId {
        let block = self.allocate(block.into());
        let id = block.id();
        self.body.push(block);
        id
    }

    /// Append a paragraph, returning its id
    pub fn push_paragraph(&mut self, paragraph: Paragraph) -> BlockId {
        self.push(paragraph)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Top-level paragraphs in document order
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(Block::as_paragraph)
    }

    /// Top-level tables in document order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(Block::as_table)
    }

    /// Ids of the top-level paragraphs, in document order
    pub fn paragraph_ids(&self) -> Vec<BlockId> {
        self.paragraphs().map(Paragraph::id).collect()
    }

    /// Index of a block in the body
    pub fn position(&self, id: BlockId) -> Option<usize> {
        self.body.iter().position(|b| b.id() == id)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.body.iter().find(|b| b.id() == id)
    }

    pub fn paragraph(&self, id: BlockId) -> Option<&Paragraph> {
        self.block(id).and_then(Block::as_paragraph)
    }

    pub fn paragraph_mut(&mut self, id: BlockId) -> Option<&mut Paragraph> {
        self.body
            .iter_mut()
            .find(|b| b.id() == id)
            .and_then(Block::as_paragraph_mut)
    }

    /// Insert a block immediately before `anchor`
    ///
    /// Returns the new block's id, or None if `anchor` is not in the document.
    pub fn insert_before(&mut self, anchor: BlockId, block: impl Into<Block>) -> Option<BlockId> {
        let index = self.position(anchor)?;
        let block = self.allocate(block.into());
        let id = block.id();
        self.body.insert(index, block);
        Some(id)
    }

    /// Insert a block immediately after `anchor`
    ///
    /// Returns the new block's id, or None if `anchor` is not in the document.
    pub fn insert_after(&mut self, anchor: BlockId, block: impl Into<Block>) -> Option<BlockId> {
        let index = self.position(anchor)?;
        let block = self.allocate(block.into());
        let id = block.id();
        self.body.insert(index + 1, block);
        Some(id)
    }

    /// Remove a block, returning it
    pub fn remove(&mut self, id: BlockId) -> Option<Block> {
        let index = self.position(id)?;
        Some(self.body.remove(index))
    }

    /// Plain text of the whole document
    ///
    /// Paragraphs are separated by newlines; table cells by tabs.
    pub fn text(&self) -> String {
        let mut lines = Vec::new();
        for block in &self.body {
            match block {
                Block::Paragraph(p) => lines.push(p.text()),
                Block::Table(t) => {
                    for row in &t.rows {
                        lines.push(
                            row.cells
                                .iter()
                                .map(TableCell::text)
                                .collect::<Vec<_>>()
                                .join("\t"),
                        );
                    }
                }
            }
        }
        lines.join("\n")
    }
}
