//! Résumé attachment: type gate and base64 transport encoding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// The only accepted content type.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Please upload a PDF file")]
    NoFileSelected,

    #[error("Only PDF files are allowed")]
    WrongFileType { content_type: String },

    #[error("File is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("Failed to encode file: {0}")]
    Encoding(#[from] tokio::task::JoinError),
}

/// A file picked by the user, as received from the upload.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn from_bytes(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// Encoded file ready to travel inside a JSON body as `pdfData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

#[derive(Debug, Clone)]
pub struct AttachmentEncoder {
    max_bytes: usize,
}

impl AttachmentEncoder {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    /// Selection-time gate: presence and content type. Runs before any
    /// encoding so the UI can show the error immediately.
    pub fn check(file: Option<&SelectedFile>) -> Result<&SelectedFile, AttachmentError> {
        let file = file.ok_or(AttachmentError::NoFileSelected)?;
        if file.content_type != PDF_CONTENT_TYPE {
            return Err(AttachmentError::WrongFileType {
                content_type: file.content_type.clone(),
            });
        }
        Ok(file)
    }

    /// Base64-encodes the whole file on the blocking pool. Encoding the same
    /// file twice yields identical attachments.
    pub async fn encode(&self, file: Option<SelectedFile>) -> Result<Attachment, AttachmentError> {
        Self::check(file.as_ref())?;
        let Some(SelectedFile {
            file_name,
            content_type,
            data: bytes,
        }) = file
        else {
            return Err(AttachmentError::NoFileSelected);
        };

        if bytes.len() > self.max_bytes {
            return Err(AttachmentError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        let size = bytes.len();
        let data = tokio::task::spawn_blocking(move || STANDARD.encode(&bytes)).await?;
        debug!("Encoded attachment '{file_name}' ({size} bytes)");

        Ok(Attachment {
            file_name,
            content_type,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF\n";

    fn encoder() -> AttachmentEncoder {
        AttachmentEncoder::new(1024)
    }

    #[tokio::test]
    async fn test_encodes_in_memory_pdf() {
        let file = SelectedFile::from_bytes("cv.pdf", PDF_CONTENT_TYPE, PDF_BYTES);
        let attachment = encoder().encode(Some(file)).await.unwrap();
        assert_eq!(attachment.file_name, "cv.pdf");
        assert_eq!(attachment.content_type, PDF_CONTENT_TYPE);
        assert_eq!(STANDARD.decode(&attachment.data).unwrap(), PDF_BYTES);
    }

    #[tokio::test]
    async fn test_encoding_twice_is_identical() {
        let file = SelectedFile::from_bytes("cv.pdf", PDF_CONTENT_TYPE, PDF_BYTES);
        let first = encoder().encode(Some(file.clone())).await.unwrap();
        let second = encoder().encode(Some(file)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_file_is_rejected() {
        let err = encoder().encode(None).await.unwrap_err();
        assert!(matches!(err, AttachmentError::NoFileSelected));
        assert_eq!(err.to_string(), "Please upload a PDF file");
    }

    #[tokio::test]
    async fn test_non_pdf_never_produces_attachment() {
        for content_type in ["image/png", "application/msword", "text/plain", "APPLICATION/PDF", ""] {
            let file = SelectedFile::from_bytes("cv.pdf", content_type, PDF_BYTES);
            let err = encoder().encode(Some(file)).await.unwrap_err();
            assert!(matches!(err, AttachmentError::WrongFileType { .. }), "{content_type}");
            assert_eq!(err.to_string(), "Only PDF files are allowed");
        }
    }

    #[test]
    fn test_check_gates_on_presence_and_type() {
        let file = SelectedFile::from_bytes("cv.pdf", PDF_CONTENT_TYPE, Bytes::new());
        assert!(AttachmentEncoder::check(Some(&file)).is_ok());
        let file = SelectedFile::from_bytes("cv.doc", "application/msword", PDF_BYTES);
        assert!(AttachmentEncoder::check(Some(&file)).is_err());
        assert!(AttachmentEncoder::check(None).is_err());
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected() {
        let file = SelectedFile::from_bytes("big.pdf", PDF_CONTENT_TYPE, vec![0u8; 2048]);
        let err = encoder().encode(Some(file)).await.unwrap_err();
        assert!(matches!(err, AttachmentError::TooLarge { size: 2048, limit: 1024 }));
    }
}
