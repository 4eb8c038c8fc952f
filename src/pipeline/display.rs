//! Display sinks: show each page image next to its summary for a human.
//!
//! * [`ConsoleSink`] — prints the page number, image path and details, and
//!   summary to any `Write` (stdout by default).
//! * [`MarkdownReportSink`] — collects `![page n](page_n.png)` + summary
//!   sections and writes them as one Markdown file on [`DisplaySink::finish`].

use crate::error::PdfRagError;
use crate::output::PageSummary;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Receives page summaries as the summary pass produces them.
pub trait DisplaySink: Send {
    fn show(&mut self, page: &PageSummary) -> Result<(), PdfRagError>;

    /// Flush anything buffered. Called once after the last page.
    fn finish(&mut self) -> Result<(), PdfRagError> {
        Ok(())
    }
}

/// Plain-text sink.
pub struct ConsoleSink<W: Write + Send> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> DisplaySink for ConsoleSink<W> {
    fn show(&mut self, page: &PageSummary) -> Result<(), PdfRagError> {
        let write_err = |e: std::io::Error| PdfRagError::Internal(format!("console write: {e}"));
        writeln!(self.out, "Page {} ({})", page.page_num, page.image_path.display())
            .map_err(write_err)?;
        writeln!(self.out, "Summary: {}", page.display_text()).map_err(write_err)?;
        writeln!(self.out).map_err(write_err)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), PdfRagError> {
        self.out
            .flush()
            .map_err(|e| PdfRagError::Internal(format!("console flush: {e}")))
    }
}

/// Markdown report with one image + caption section per page.
pub struct MarkdownReportSink {
    path: PathBuf,
    body: String,
}

impl MarkdownReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            body: String::from("# Page summaries\n"),
        }
    }

    /// Report text accumulated so far.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Link images relative to the report when they share a directory.
    fn image_link(&self, image: &Path) -> String {
        let report_dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        match (image.parent(), image.file_name()) {
            (Some(dir), Some(name)) if dir == report_dir => name.to_string_lossy().into_owned(),
            _ => image.display().to_string(),
        }
    }
}

impl DisplaySink for MarkdownReportSink {
    fn show(&mut self, page: &PageSummary) -> Result<(), PdfRagError> {
        let link = self.image_link(&page.image_path);
        self.body.push_str(&format!(
            "\n## Page {n}\n\n![page {n}]({link})\n\n{summary}\n",
            n = page.page_num,
            summary = page.display_text(),
        ));
        Ok(())
    }

    /// Write to a temp file, then rename over the destination.
    fn finish(&mut self) -> Result<(), PdfRagError> {
        let write_err = |source| PdfRagError::OutputWriteFailed {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = self.path.with_extension("md.tmp");
        std::fs::write(&tmp, &self.body).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PageOutcome;

    fn page(n: usize, dir: &Path, outcome: PageOutcome) -> PageSummary {
        PageSummary {
            page_num: n,
            image_path: dir.join(format!("page_{n}.png")),
            ocr_text: None,
            outcome,
        }
    }

    #[test]
    fn console_prints_summary_and_skip() {
        let mut buf = Vec::new();
        {
            let mut sink = ConsoleSink::new(&mut buf);
            let dir = Path::new("imgs");
            sink.show(&page(1, dir, PageOutcome::Summarized("About attention.".into())))
                .unwrap();
            sink.show(&page(2, dir, PageOutcome::NoTextExtracted)).unwrap();
            sink.finish().unwrap();
        }

        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Page 1"));
        assert!(out.contains("Summary: About attention."));
        assert!(out.contains("No text extracted from this page."));
    }

    #[test]
    fn markdown_report_links_images_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("summaries.md");
        let mut sink = MarkdownReportSink::new(&report);

        sink.show(&page(1, dir.path(), PageOutcome::Summarized("Intro.".into())))
            .unwrap();
        assert!(sink.body().contains("![page 1](page_1.png)"));
        sink.finish().unwrap();

        let written = std::fs::read_to_string(&report).unwrap();
        assert!(written.starts_with("# Page summaries"));
        assert!(written.contains("## Page 1"));
        assert!(written.contains("Intro."));
        assert!(!report.with_extension("md.tmp").exists());
    }
}
