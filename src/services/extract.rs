//! Raw-bytes to text extraction.

use async_trait::async_trait;
use tracing::info;

use super::TextExtractor;
use crate::types::PipelineError;

/// Extracts text from PDF bytes, concatenating pages in order.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        let bytes = bytes.to_vec();
        // Parsing is CPU-bound; keep it off the async workers.
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|err| PipelineError::Extraction(err.to_string()))?
            .map_err(|err| PipelineError::Extraction(err.to_string()))?;
        info!(chars = text.len(), "extracted text from pdf");
        Ok(text)
    }
}

/// Treats the input bytes as UTF-8 text. Used for pre-extracted documents,
/// tests, and the demo binary.
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|err| PipelineError::Extraction(format!("input is not valid UTF-8: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_text_passthrough() {
        let extractor = PlainTextExtractor::new();
        let text = extractor.extract("hello corpus".as_bytes()).await.unwrap();
        assert_eq!(text, "hello corpus");
    }

    #[tokio::test]
    async fn invalid_utf8_is_an_extraction_error() {
        let extractor = PlainTextExtractor::new();
        assert!(matches!(
            extractor.extract(&[0xff, 0xfe, 0x00]).await,
            Err(PipelineError::Extraction(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_pdf_is_an_extraction_error() {
        let extractor = PdfTextExtractor::new();
        assert!(matches!(
            extractor.extract(b"definitely not a pdf").await,
            Err(PipelineError::Extraction(_))
        ));
    }
}
