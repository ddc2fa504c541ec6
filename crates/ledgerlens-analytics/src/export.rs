//! Report rendering for downloads.
//!
//! Reports are rendered either as plain text or as a single-page PDF using
//! the built-in Helvetica font, and written into the export directory.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::Result;

/// MIME type of text exports.
pub const TEXT_MEDIA_TYPE: &str = "text/plain; charset=utf-8";

/// MIME type of PDF exports.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

const PAGE_WIDTH: u32 = 612;
const PAGE_HEIGHT: u32 = 792;
const MARGIN: u32 = 50;
const TITLE_SIZE: u32 = 16;
const BODY_SIZE: u32 = 10;
const LEADING: u32 = 14;
const WRAP_COLUMNS: usize = 95;

/// Title line shared by both export formats.
#[must_use]
pub fn title(date: &str) -> String {
    format!("LedgerLens Daily Report ({date})")
}

/// Timestamp used in export file names, e.g. `20251006_142501`.
#[must_use]
pub fn file_stamp(at: &DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Render the plain-text report.
#[must_use]
pub fn render_text(date: &str, summary: &str, report: &str) -> String {
    format!(
        "{}\n\nSummary: {summary}\n\n{}\n",
        title(date),
        report.trim()
    )
}

/// Render the report as a single-page PDF.
///
/// Lines that do not fit on the page are dropped and replaced by an
/// ellipsis line.
#[must_use]
pub fn render_pdf(date: &str, summary: &str, report: &str) -> Vec<u8> {
    let mut lines = wrap(&format!("Summary: {summary}"));
    lines.push(String::new());
    for paragraph in report.trim().lines() {
        lines.extend(wrap(paragraph));
    }

    let capacity = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize - 2;
    if lines.len() > capacity {
        lines.truncate(capacity - 1);
        lines.push("...".to_string());
    }

    let mut content = String::new();
    let _ = writeln!(content, "BT");
    let _ = writeln!(content, "/F1 {TITLE_SIZE} Tf");
    let _ = writeln!(content, "{MARGIN} {} Td", PAGE_HEIGHT - MARGIN);
    let _ = writeln!(content, "({}) Tj", escape(&title(date)));
    let _ = writeln!(content, "/F1 {BODY_SIZE} Tf");
    let _ = writeln!(content, "{LEADING} TL");
    let _ = writeln!(content, "T*");
    for line in &lines {
        let _ = writeln!(content, "T* ({}) Tj", escape(line));
    }
    let _ = writeln!(content, "ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{content}endstream",
            content.len()
        ),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{body}\nendobj\n", i + 1);
    }

    let xref = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = writeln!(out, "{offset:010} 00000 n ");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        objects.len() + 1
    );

    out.into_bytes()
}

/// Escape a line for a PDF literal string. Non-ASCII becomes `?`.
fn escape(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            '\t' => out.push(' '),
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap at `WRAP_COLUMNS` characters.
fn wrap(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > WRAP_COLUMNS
        {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    lines.push(current);
    lines
}

/// Write an export file into `dir`, creating the directory if needed.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub async fn write_export(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote export");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn text_layout() {
        let text = render_text("2025-10-06", "Income=1.00, Expenses=0.00, Net=1.00", "  body \n");
        assert_eq!(
            text,
            "LedgerLens Daily Report (2025-10-06)\n\n\
             Summary: Income=1.00, Expenses=0.00, Net=1.00\n\nbody\n"
        );
    }

    #[test]
    fn stamp_format() {
        let at = Utc.with_ymd_and_hms(2025, 10, 6, 14, 25, 1).unwrap();
        assert_eq!(file_stamp(&at), "20251006_142501");
    }

    #[test]
    fn pdf_structure() {
        let pdf = render_pdf("2025-10-06", "Income=1.00", "Outlook (steady)\n\u{2022} keep going");
        let text = String::from_utf8(pdf).unwrap();

        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("(Outlook \\(steady\\)) Tj"));
        assert!(text.contains("(? keep going) Tj"));

        // startxref must point at the xref table
        let tail = text.rsplit("startxref\n").next().unwrap();
        let offset: usize = tail.lines().next().unwrap().parse().unwrap();
        assert!(text[offset..].starts_with("xref\n0 6\n"));

        // every object offset must point at its header
        let table = &text[offset..];
        for (i, entry) in table.lines().skip(3).take(5).enumerate() {
            let at: usize = entry[..10].parse().unwrap();
            assert!(text[at..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn pdf_truncates_long_reports() {
        let report = (0..200).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let text = String::from_utf8(render_pdf("2025-10-06", "s", &report)).unwrap();
        assert!(text.contains("(...) Tj"));
        assert!(!text.contains("(line 199) Tj"));
    }

    #[test]
    fn wrapping() {
        let long = "word ".repeat(40);
        let lines = wrap(&long);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= WRAP_COLUMNS));
        assert_eq!(wrap(""), vec![String::new()]);
    }

    #[tokio::test]
    async fn export_is_written() {
        let dir = TempDir::new().unwrap();
        let exports = dir.path().join("exports");
        let path = write_export(&exports, "report.txt", b"hello").await.unwrap();
        assert_eq!(path, exports.join("report.txt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }
}
