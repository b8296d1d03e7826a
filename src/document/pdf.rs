//! Plain-text PDF 1.4 writer.
//!
//! Produces A4 pages using the built-in Helvetica faces, so no fonts are
//! embedded. Markdown markers are stripped, long lines are wrapped and
//! characters outside printable ASCII are replaced with `?`.

use std::fmt::Write as _;

use super::DocumentRenderer;
use crate::AppError;

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN_LEFT: u32 = 50;
const TITLE_Y: u32 = 792;
const BODY_TOP: u32 = 762;
const BODY_BOTTOM: u32 = 60;
const LEADING: u32 = 16;
const TITLE_SIZE: u32 = 16;
const HEADING_SIZE: u32 = 13;
const BODY_SIZE: u32 = 11;
const WRAP_COLUMNS: usize = 90;

/// A laid-out line: font resource, size and escaped text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    bold: bool,
    size: u32,
    text: String,
}

/// [`DocumentRenderer`] producing dependency-free PDF bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    /// Create a renderer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PdfRenderer {
    fn to_pdf(&self, title: &str, markdown: &str) -> crate::Result<Vec<u8>> {
        let pages = paginate(&layout(markdown));
        write_document(title, &pages).map_err(|err| AppError::Render(err.to_string()))
    }
}

/// Escape a string for use inside a PDF literal `( ... )`.
///
/// Characters the `WinAnsiEncoding` fonts can draw are written as octal
/// escapes; anything else becomes `?`.
fn escape_pdf_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            ' '..='~' => out.push(ch),
            '\t' => out.push(' '),
            _ => match win_ansi_byte(ch) {
                Some(byte) => {
                    let _ = write!(out, "\\{byte:03o}");
                }
                None => out.push('?'),
            },
        }
    }
    out
}

/// `WinAnsiEncoding` code for a non-ASCII character, if it has one.
fn win_ansi_byte(ch: char) -> Option<u8> {
    if let Ok(byte) = u8::try_from(u32::from(ch)) {
        // Latin-1 supplement maps one to one.
        return (byte >= 0xA0).then_some(byte);
    }
    let byte = match ch {
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{2122}' => 0x99,
        _ => return None,
    };
    Some(byte)
}

fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word_len > columns {
            lines.push(std::mem::take(&mut current));
        }
        if word_len > columns {
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(columns) {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current = chunk.iter().collect();
            }
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn layout(markdown: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    for raw in markdown.lines() {
        let stripped = raw.trim_end().replace("**", "");
        if stripped.trim().is_empty() {
            lines.push(Line {
                bold: false,
                size: BODY_SIZE,
                text: String::new(),
            });
            continue;
        }
        let (bold, size, text) = match stripped.trim_start_matches('#') {
            rest if rest.len() < stripped.len() => (true, HEADING_SIZE, rest.trim().to_owned()),
            _ => (false, BODY_SIZE, stripped.clone()),
        };
        for piece in wrap(&text, WRAP_COLUMNS) {
            lines.push(Line {
                bold,
                size,
                text: escape_pdf_text(&piece),
            });
        }
    }
    lines
}

fn paginate(lines: &[Line]) -> Vec<Vec<Line>> {
    let per_page = ((BODY_TOP - BODY_BOTTOM) / LEADING) as usize;
    let mut pages: Vec<Vec<Line>> = lines.chunks(per_page).map(<[Line]>::to_vec).collect();
    if pages.is_empty() {
        pages.push(Vec::new());
    }
    pages
}

fn page_content(title: &str, lines: &[Line]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "BT")?;
    writeln!(out, "/F2 {TITLE_SIZE} Tf")?;
    writeln!(out, "1 0 0 1 {MARGIN_LEFT} {TITLE_Y} Tm")?;
    writeln!(out, "({}) Tj", escape_pdf_text(title))?;
    let mut y = BODY_TOP;
    for line in lines {
        if !line.text.is_empty() {
            let font = if line.bold { "F2" } else { "F1" };
            writeln!(out, "/{font} {} Tf", line.size)?;
            writeln!(out, "1 0 0 1 {MARGIN_LEFT} {y} Tm")?;
            writeln!(out, "({}) Tj", line.text)?;
        }
        y -= LEADING;
    }
    writeln!(out, "ET")?;
    Ok(out)
}

/// Serialize the objects, cross-reference table and trailer.
///
/// Object layout: 1 catalog, 2 page tree, 3 regular font, 4 bold font,
/// then a (page, content) pair per page.
fn write_document(title: &str, pages: &[Vec<Line>]) -> Result<Vec<u8>, std::fmt::Error> {
    let mut objects: Vec<String> = Vec::with_capacity(4 + pages.len() * 2);

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", 5 + i * 2))
        .collect();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_owned());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages.len()
    ));
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_owned(),
    );
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_owned(),
    );

    for (i, lines) in pages.iter().enumerate() {
        let content_id = 6 + i * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        let stream = page_content(title, lines)?;
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}endstream",
            stream.len()
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        write!(out, "{} 0 obj\n{body}\nendobj\n", i + 1)?;
    }

    let xref_start = out.len();
    writeln!(out, "xref")?;
    writeln!(out, "0 {}", objects.len() + 1)?;
    out.push_str("0000000000 65535 f \n");
    for offset in offsets {
        write!(out, "{offset:010} 00000 n \n")?;
    }
    writeln!(out, "trailer")?;
    writeln!(out, "<< /Size {} /Root 1 0 R >>", objects.len() + 1)?;
    writeln!(out, "startxref")?;
    writeln!(out, "{xref_start}")?;
    out.push_str("%%EOF\n");

    Ok(out.into_bytes())
}
