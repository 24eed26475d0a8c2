//! Text extraction collaborators.
//!
//! Extraction is a seam: paged formats (PDF) are injected behind
//! [`TextExtractor`], while [`PlainTextExtractor`] handles text and
//! markdown files directly. HTML bytes are converted with html2text.

use std::path::Path;

use crate::errors::{IndexError, IndexResult};

/// One page of extracted text. Page numbers are zero-based.
#[derive(Debug, Clone)]
pub struct Page {
    pub text: String,
    pub number: u32,
}

/// Extracts plain text pages from a document file.
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> IndexResult<Vec<Page>>;
}

/// Extractor for plain-text formats (`.txt`, `.md`).
///
/// Form feeds (`\x0c`) act as page breaks; most files come back as a
/// single page 0.
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

#[async_trait::async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> IndexResult<Vec<Page>> {
        let ext = path.extension().and_then(|v| v.to_str()).unwrap_or("");
        if !matches!(ext, "txt" | "md" | "markdown" | "text") {
            return Err(IndexError::UnsupportedFormat(path.to_path_buf()));
        }

        let raw = tokio::fs::read_to_string(path).await?;
        let pages = raw
            .split('\u{c}')
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(number, text)| Page {
                text: text.to_string(),
                number: number as u32,
            })
            .collect();
        Ok(pages)
    }
}

/// Convert raw HTML bytes into readable plain text.
pub fn extract_html(raw: &[u8]) -> String {
    html2text::from_read(raw, 80)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_text_is_one_page() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("note.txt");
        tokio::fs::write(&path, "line one\nline two").await.unwrap();

        let pages = PlainTextExtractor.extract(&path).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 0);
        assert!(pages[0].text.contains("line two"));
    }

    #[tokio::test]
    async fn form_feed_splits_pages() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("paged.txt");
        tokio::fs::write(&path, "first page\u{c}second page")
            .await
            .unwrap();

        let pages = PlainTextExtractor.extract(&path).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].number, 1);
    }

    #[tokio::test]
    async fn unknown_extension_is_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.pdf");
        tokio::fs::write(&path, "%PDF-1.4").await.unwrap();

        let err = PlainTextExtractor.extract(&path).await;
        assert!(matches!(err, Err(IndexError::UnsupportedFormat(_))));
    }

    #[test]
    fn html_is_converted_to_text() {
        let text = extract_html(b"<html><body><h1>Title</h1><p>Body text.</p></body></html>");
        assert!(text.contains("Title"));
        assert!(text.contains("Body text."));
        assert!(!text.contains("<p>"));
    }
}
