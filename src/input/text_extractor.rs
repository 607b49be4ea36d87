//! Text extraction from various file formats

use crate::error::{Result, ResumeTailorError};
use anyhow::Context;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;
use tokio::fs;

pub trait TextExtractor: Sync {
    fn extract_bytes(&self, bytes: &[u8]) -> Result<String>;

    fn extract(&self, path: &Path) -> impl std::future::Future<Output = Result<String>> + Send {
        async move {
            let bytes = fs::read(path).await?;
            self.extract_bytes(&bytes)
        }
    }
}

pub struct PdfExtractor;

impl PdfExtractor {
    /// Text of each page in page order; pages without text are empty strings
    pub fn pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
            ResumeTailorError::PdfExtraction(format!("Failed to extract text from PDF: {}", e))
        })
    }
}

impl TextExtractor for PdfExtractor {
    fn extract_bytes(&self, bytes: &[u8]) -> Result<String> {
        // Scanned pages come back empty and still take their slot in the join
        Ok(self.pages(bytes)?.join("\n"))
    }
}

/// Plain text and Markdown are passed through as-is; invalid UTF-8 is replaced, never rejected.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_bytes(&self, bytes: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract_bytes(&self, bytes: &[u8]) -> Result<String> {
        let xml = read_document_xml(bytes)
            .map_err(|e| ResumeTailorError::DocxExtraction(format!("{:#}", e)))?;
        let paragraphs = docx_paragraphs(&xml)
            .map_err(|e| ResumeTailorError::DocxExtraction(format!("{:#}", e)))?;
        Ok(paragraphs.join("\n"))
    }
}

fn read_document_xml(bytes: &[u8]) -> anyhow::Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).context("not a DOCX (zip) archive")?;
    let mut entry = archive
        .by_name("word/document.xml")
        .context("archive has no word/document.xml")?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .context("word/document.xml is not valid UTF-8")?;
    Ok(xml)
}

/// Paragraph texts in document order. Runs are concatenated inside a paragraph.
fn docx_paragraphs(xml: &str) -> anyhow::Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    // Text boxes nest paragraphs inside paragraphs
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;
    // Tabs and breaks only count inside runs; `w:pPr` holds tab-stop definitions
    let mut run_depth = 0usize;

    loop {
        match reader.read_event().context("malformed word/document.xml")? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => open.push(String::new()),
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                _ if run_depth == 0 => {}
                b"w:tab" => {
                    if let Some(current) = open.last_mut() {
                        current.push('\t');
                    }
                }
                b"w:br" | b"w:cr" => {
                    if let Some(current) = open.last_mut() {
                        current.push('\n');
                    }
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().context("bad entity in run text")?;
                if let Some(current) = open.last_mut() {
                    current.push_str(&text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:p" => {
                    if let Some(done) = open.pop() {
                        paragraphs.push(done);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
