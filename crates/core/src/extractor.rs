use crate::error::{IngestError, Result};
use lopdf::Document;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    PlainText,
    Markdown,
    Pdf,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "txt" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

pub trait TextExtractor {
    fn extract(&self, path: &Path) -> Result<String>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl TextExtractor for LopdfExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let document =
            Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;

            if !text.trim().is_empty() {
                pages.push(text);
            }
        }

        if pages.is_empty() {
            return Err(IngestError::PdfParse(format!(
                "pdf had no readable page text: {}",
                path.display()
            )));
        }

        // A blank line between pages keeps them in separate blocks.
        Ok(pages.join("\n\n"))
    }
}

#[derive(Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }
}

pub fn extract_text(path: &Path) -> Result<String> {
    match SourceFormat::from_path(path) {
        Some(SourceFormat::PlainText | SourceFormat::Markdown) => {
            PlainTextExtractor.extract(path)
        }
        Some(SourceFormat::Pdf) => LopdfExtractor.extract(path),
        None => Err(IngestError::UnsupportedFormat(path.display().to_string())),
    }
}
