//! Per-page text extraction for PDF documents.
//!
//! The rest of the pipeline needs page-addressed text: chunks carry the page
//! they came from so answers can cite it and highlights can land on it. This
//! module turns raw PDF bytes into one string per page, 0-indexed.

/// Extraction error. No panic on malformed input; callers surface the error
/// and the session build fails cleanly.
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts plain text from a PDF, one entry per page in page order.
///
/// Pages with no extractable text come back as empty strings; callers skip
/// them rather than chunking nothing.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_pages(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn empty_input_returns_error() {
        assert!(extract_pages(b"").is_err());
    }
}
