//! Markdown export to plain text, DOCX and PDF.
//!
//! DOCX and PDF share one pass over the pulldown-cmark events that flattens
//! the document into [`Block`]s of styled [`Span`]s.

use std::fs;
use std::io::Cursor;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::error::CommandError;

const PDF_TITLE: &str = "ZNOTE Export";
const PDF_MARGINS: i32 = 36;
const CODE_FONT: &str = "Courier New";
const BULLET: &str = "• ";

/// Font directories searched in order, with the family's file prefix.
const PDF_FONTS: [(&str, &str); 3] = [
    ("/System/Library/Fonts/Supplemental/", "Arial"),
    ("/usr/share/fonts/truetype/liberation/", "LiberationSans"),
    ("/usr/share/fonts/truetype/dejavu/", "DejaVuSans"),
];

fn parser(markdown: &str) -> Parser<'_> {
    Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub code: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub marks: Marks,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Heading(HeadingLevel),
    Paragraph,
    /// List item with its rendered marker (`• ` or `3. `).
    Item(String),
    Code,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub quoted: bool,
    pub spans: Vec<Span>,
}

impl Block {
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    current: Option<Block>,
    marks: Marks,
    quote_depth: usize,
    // `Some(n)` for an ordered list whose next item is `n`.
    lists: Vec<Option<u64>>,
}

impl BlockBuilder {
    fn open(&mut self, kind: BlockKind) {
        self.flush();
        self.current = Some(Block {
            kind,
            quoted: self.quote_depth > 0,
            spans: Vec::new(),
        });
    }

    fn flush(&mut self) {
        if let Some(mut block) = self.current.take() {
            if block.kind == BlockKind::Code {
                if let Some(last) = block.spans.last_mut() {
                    let trimmed = last.text.trim_end_matches('\n').len();
                    last.text.truncate(trimmed);
                }
            }
            if !block.spans.is_empty() || matches!(block.kind, BlockKind::Item(_)) {
                self.blocks.push(block);
            }
        }
    }

    fn push(&mut self, text: &str, marks: Marks) {
        if self.current.is_none() {
            self.open(BlockKind::Paragraph);
        }
        if let Some(block) = self.current.as_mut() {
            block.spans.push(Span {
                text: text.to_string(),
                marks,
            });
        }
    }

    fn next_marker(&mut self) -> String {
        match self.lists.last_mut() {
            Some(Some(next)) => {
                let marker = format!("{next}. ");
                *next += 1;
                marker
            }
            _ => BULLET.to_string(),
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => self.open(BlockKind::Heading(level)),
            Event::Start(Tag::Paragraph) => {
                // Loose list items wrap their text in a paragraph.
                let in_item = matches!(
                    self.current.as_ref().map(|block| &block.kind),
                    Some(BlockKind::Item(_))
                );
                if !in_item {
                    self.open(BlockKind::Paragraph);
                }
            }
            Event::Start(Tag::CodeBlock(_)) => self.open(BlockKind::Code),
            Event::Start(Tag::List(start)) => {
                self.flush();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.flush();
                self.lists.pop();
            }
            Event::Start(Tag::Item) => {
                let marker = self.next_marker();
                self.open(BlockKind::Item(marker));
            }
            Event::Start(Tag::BlockQuote(_)) => {
                self.flush();
                self.quote_depth += 1;
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            Event::End(TagEnd::Heading(_) | TagEnd::CodeBlock | TagEnd::Item) => self.flush(),
            Event::End(TagEnd::Paragraph) => {
                if matches!(
                    self.current.as_ref().map(|block| &block.kind),
                    Some(BlockKind::Paragraph)
                ) {
                    self.flush();
                }
            }
            Event::Start(Tag::Strong) => self.marks.bold = true,
            Event::End(TagEnd::Strong) => self.marks.bold = false,
            Event::Start(Tag::Emphasis) => self.marks.italic = true,
            Event::End(TagEnd::Emphasis) => self.marks.italic = false,
            Event::Start(Tag::Strikethrough) => self.marks.strike = true,
            Event::End(TagEnd::Strikethrough) => self.marks.strike = false,
            Event::Text(text) => self.push(&text, self.marks),
            Event::Code(code) => {
                let marks = Marks {
                    code: true,
                    ..self.marks
                };
                self.push(&code, marks);
            }
            Event::SoftBreak => self.push(" ", self.marks),
            Event::HardBreak => self.push("\n", self.marks),
            Event::End(TagEnd::TableCell) => self.push("\t", Marks::default()),
            Event::End(TagEnd::TableHead | TagEnd::TableRow) => self.flush(),
            _ => {}
        }
    }
}

pub fn blocks(markdown: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    for event in parser(markdown) {
        builder.event(event);
    }
    builder.flush();
    builder.blocks
}

/// Strips markup: paragraphs and headings end in a blank line, list items
/// take one line each.
pub fn render_plain(markdown: &str) -> String {
    let mut text = String::new();
    for event in parser(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_)) => text.push_str("\n\n"),
            Event::End(TagEnd::Item | TagEnd::TableHead | TagEnd::TableRow) => text.push('\n'),
            Event::End(TagEnd::TableCell) => text.push('\t'),
            _ => {}
        }
    }
    text.trim().to_string()
}

fn heading_points(level: HeadingLevel, sizes: [usize; 4]) -> usize {
    match level {
        HeadingLevel::H1 => sizes[0],
        HeadingLevel::H2 => sizes[1],
        HeadingLevel::H3 => sizes[2],
        _ => sizes[3],
    }
}

fn docx_paragraph(block: &Block) -> docx_rs::Paragraph {
    use docx_rs::{BreakType, Paragraph, Run, RunFonts};

    let mut paragraph = Paragraph::new();
    if let BlockKind::Item(marker) = &block.kind {
        paragraph = paragraph.add_run(Run::new().add_text(marker.as_str()));
    }
    for span in &block.spans {
        for (idx, line) in span.text.split('\n').enumerate() {
            let mut run = Run::new();
            if idx > 0 {
                run = run.add_break(BreakType::TextWrapping);
            }
            run = run.add_text(line);
            if let BlockKind::Heading(level) = block.kind {
                // docx sizes are in half-points.
                run = run.bold().size(heading_points(level, [32, 26, 22, 18]) * 2);
            }
            if span.marks.bold {
                run = run.bold();
            }
            if span.marks.italic || block.quoted {
                run = run.italic();
            }
            if span.marks.strike {
                run = run.strike();
            }
            if span.marks.code || block.kind == BlockKind::Code {
                run = run.fonts(RunFonts::new().ascii(CODE_FONT));
            }
            paragraph = paragraph.add_run(run);
        }
    }
    paragraph
}

pub fn render_docx(markdown: &str) -> Result<Vec<u8>, CommandError> {
    let docx = blocks(markdown)
        .iter()
        .fold(docx_rs::Docx::new(), |docx, block| {
            docx.add_paragraph(docx_paragraph(block))
        });

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|err| CommandError::Docx(err.to_string()))?;
    Ok(buf.into_inner())
}

fn pdf_fonts() -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, CommandError> {
    let mut last_err = None;
    for (dir, name) in PDF_FONTS {
        match genpdf::fonts::from_files(dir, name, None) {
            Ok(family) => {
                tracing::debug!(dir, name, "using pdf font");
                return Ok(family);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(CommandError::FontMissing(last_err.unwrap_or_else(|| {
        genpdf::error::Error::new("no font directories", genpdf::error::ErrorKind::InvalidFont)
    })))
}

pub fn render_pdf(markdown: &str, path: &str) -> Result<(), CommandError> {
    use genpdf::elements::{Break, Paragraph};
    use genpdf::style::Style;
    use genpdf::Element as _;

    let mut doc = genpdf::Document::new(pdf_fonts()?);
    doc.set_title(PDF_TITLE);
    doc.set_minimal_conformance();
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(PDF_MARGINS);
    doc.set_page_decorator(decorator);

    for block in blocks(markdown) {
        let text = match &block.kind {
            BlockKind::Item(marker) => format!("{marker}{}", block.text()),
            _ => block.text(),
        };
        let mut style = Style::new();
        if block.quoted {
            style = style.italic();
        }
        match block.kind {
            BlockKind::Heading(level) => {
                let size = heading_points(level, [20, 16, 14, 12]) as u8;
                doc.push(Paragraph::new(text).styled(style.bold().with_font_size(size)));
                doc.push(Break::new(0.5));
            }
            BlockKind::Item(_) => {
                for line in text.split('\n') {
                    doc.push(Paragraph::new(line).styled(style));
                }
            }
            BlockKind::Paragraph | BlockKind::Code => {
                for line in text.split('\n') {
                    doc.push(Paragraph::new(line).styled(style));
                }
                doc.push(Break::new(0.3));
            }
        }
    }

    doc.render_to_file(path).map_err(CommandError::Pdf)
}

fn write_export(format: &'static str, path: &str, bytes: impl AsRef<[u8]>) -> Result<(), CommandError> {
    fs::write(path, bytes).map_err(|source| CommandError::ExportWrite { format, source })?;
    tracing::info!(path, format, "exported document");
    Ok(())
}

#[tauri::command(async)]
pub fn export_txt(markdown: String, path: String) -> Result<(), CommandError> {
    write_export("txt", &path, render_plain(&markdown))
}

#[tauri::command(async)]
pub fn export_docx(markdown: String, path: String) -> Result<(), CommandError> {
    write_export("docx", &path, render_docx(&markdown)?)
}

#[tauri::command(async)]
pub fn export_pdf(markdown: String, path: String) -> Result<(), CommandError> {
    render_pdf(&markdown, &path)?;
    tracing::info!(%path, format = "pdf", "exported document");
    Ok(())
}
