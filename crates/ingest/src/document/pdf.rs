use super::{ExtractionError, PageContent};

/// Extract text locally from PDF bytes (no layout analysis).
///
/// pdf-extract returns the whole document as one string; form feeds
/// (`\x0C`) mark page boundaries when present. A scanned/image-only PDF
/// yields no pages rather than an error.
pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageContent>, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let pages = if text.contains('\x0C') {
        text.split('\x0C')
            .enumerate()
            .filter(|(_, page_text)| !page_text.trim().is_empty())
            .map(|(i, page_text)| PageContent {
                page_number: i + 1,
                text: page_text.trim().to_string(),
            })
            .collect()
    } else {
        vec![PageContent {
            page_number: 1,
            text: text.trim().to_string(),
        }]
    };

    Ok(pages)
}
