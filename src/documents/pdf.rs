use super::{DocumentError, DocumentParser};
use crate::utils::error_chain;
use lopdf::Document;

/// PDF text extraction backed by lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for PdfParser {
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, DocumentError> {
        let doc = Document::load_mem(bytes).map_err(|e| DocumentError::Malformed(error_chain(&e)))?;

        // get_pages is keyed by 1-based page number, so iteration is page order.
        let pages = doc.get_pages();
        let mut texts = Vec::with_capacity(pages.len());
        for &number in pages.keys() {
            let text = doc.extract_text(&[number]).map_err(|e| DocumentError::Page {
                page: number,
                detail: error_chain(&e),
            })?;
            texts.push(text);
        }
        Ok(texts)
    }
}
