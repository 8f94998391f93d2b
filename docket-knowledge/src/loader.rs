//! Document loading: plain text, markdown, and PDF.

use std::path::Path;

use crate::errors::{IndexError, IndexResult};

const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Whether the index knows how to extract text from this file.
pub fn is_supported(path: &Path) -> bool {
    match extension(path) {
        Some(ext) => ext == "pdf" || TEXT_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Read a document's text content.
///
/// Unsupported extensions return [`IndexError::UnsupportedFile`], which
/// callers treat as a skip-with-warning rather than a failure.
pub async fn load_document(path: &Path) -> IndexResult<String> {
    let ext = extension(path).ok_or_else(|| IndexError::UnsupportedFile(path.to_path_buf()))?;

    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(tokio::fs::read_to_string(path).await?);
    }

    if ext == "pdf" {
        return extract_pdf(path).await;
    }

    Err(IndexError::UnsupportedFile(path.to_path_buf()))
}

/// PDF extraction is CPU-bound; run it off the async executor.
async fn extract_pdf(path: &Path) -> IndexResult<String> {
    let owned = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text(&owned).map_err(|e| IndexError::Pdf {
            path: owned.clone(),
            message: e.to_string(),
        })
    })
    .await
    .map_err(|e| IndexError::Pdf {
        path: path.to_path_buf(),
        message: format!("extraction task failed: {e}"),
    })??;

    Ok(text)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn supported_extensions() {
        assert!(is_supported(&PathBuf::from("contract.txt")));
        assert!(is_supported(&PathBuf::from("notes.md")));
        assert!(is_supported(&PathBuf::from("FILING.PDF")));
        assert!(!is_supported(&PathBuf::from("photo.jpg")));
        assert!(!is_supported(&PathBuf::from("no_extension")));
    }

    #[tokio::test]
    async fn loads_plain_text() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("doc.txt");
        tokio::fs::write(&path, "termination clause").await.unwrap();

        let text = load_document(&path).await.unwrap();
        assert_eq!(text, "termination clause");
    }

    #[tokio::test]
    async fn unsupported_extension_is_a_typed_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("audio.wav");
        tokio::fs::write(&path, b"RIFF").await.unwrap();

        let result = load_document(&path).await;
        assert!(matches!(result, Err(IndexError::UnsupportedFile(_))));
    }
}
