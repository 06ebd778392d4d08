//! Document encoding and validation.
//!
//! Converts a selected file into the normalized in-memory representation
//! sent to the model: name, canonical MIME type, size, and base64 payload.

use crate::error::{PeriksaError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::path::Path;
use tracing::debug;

/// Maximum accepted document size (20 MiB).
pub const MAX_DOCUMENT_BYTES: u64 = 20 * 1024 * 1024;

/// Canonical MIME type for CSV documents.
///
/// Platforms report CSV inconsistently (`application/csv`,
/// `application/vnd.ms-excel`, `text/plain`); all variants collapse to this.
pub const CSV_MIME: &str = "text/csv";

/// Declared types accepted as-is.
const ACCEPTED_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
];

/// Declared types treated as CSV equivalents.
const CSV_EQUIVALENT_TYPES: &[&str] = &[
    "text/csv",
    "application/csv",
    "application/vnd.ms-excel",
    "text/plain",
];

/// One uploaded document, immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Original file name.
    pub name: String,
    /// Canonical MIME type.
    pub mime_type: String,
    /// Base64-encoded file content.
    pub data: String,
    /// Size of the raw content in bytes.
    pub size: u64,
}

impl Document {
    /// Encode raw bytes into a validated Document.
    ///
    /// Validates the declared type (falling back to the `.csv` extension
    /// rule) and the size ceiling before encoding.
    pub fn encode(name: &str, declared_type: &str, bytes: &[u8]) -> Result<Document> {
        let mime_type = canonical_type(name, declared_type)?;

        let size = bytes.len() as u64;
        if size > MAX_DOCUMENT_BYTES {
            return Err(PeriksaError::FileTooLarge {
                size,
                max: MAX_DOCUMENT_BYTES,
            });
        }

        debug!("Encoded document {} ({}, {} bytes)", name, mime_type, size);

        Ok(Document {
            name: name.to_string(),
            mime_type,
            data: BASE64.encode(bytes),
            size,
        })
    }

    /// Build a Document from an already base64-encoded payload.
    ///
    /// Strips any `data:...;base64,` prefix so callers may hand over a full
    /// data URL.
    pub fn from_base64(name: &str, declared_type: &str, payload: &str, size: u64) -> Result<Document> {
        let mime_type = canonical_type(name, declared_type)?;

        if size > MAX_DOCUMENT_BYTES {
            return Err(PeriksaError::FileTooLarge {
                size,
                max: MAX_DOCUMENT_BYTES,
            });
        }

        let data = match payload.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => payload,
        };

        Ok(Document {
            name: name.to_string(),
            mime_type,
            data: data.to_string(),
            size,
        })
    }

    /// Decode the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(&self.data)
            .map_err(|e| PeriksaError::Read(format!("invalid base64 payload: {e}")))
    }
}

/// Read and encode a document from disk.
///
/// The size ceiling is checked against file metadata before any content is
/// read; a failed read produces no partial Document.
pub async fn encode_file(path: &Path) -> Result<Document> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PeriksaError::InvalidInput(format!("not a file path: {}", path.display())))?
        .to_string();

    let declared_type = type_from_extension(path);

    // Validate policy before touching file content.
    let mime_type = canonical_type(&name, declared_type)?;

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| PeriksaError::Read(format!("{}: {e}", path.display())))?;

    if metadata.len() > MAX_DOCUMENT_BYTES {
        return Err(PeriksaError::FileTooLarge {
            size: metadata.len(),
            max: MAX_DOCUMENT_BYTES,
        });
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PeriksaError::Read(format!("{}: {e}", path.display())))?;

    debug!(
        "Encoded document {} ({}, {} bytes)",
        name,
        mime_type,
        bytes.len()
    );

    Ok(Document {
        name,
        mime_type,
        data: BASE64.encode(&bytes),
        size: bytes.len() as u64,
    })
}

/// Resolve the canonical MIME type for a document, or reject it.
fn canonical_type(name: &str, declared_type: &str) -> Result<String> {
    if ACCEPTED_TYPES.contains(&declared_type) {
        return Ok(declared_type.to_string());
    }

    if CSV_EQUIVALENT_TYPES.contains(&declared_type) || has_csv_extension(name) {
        return Ok(CSV_MIME.to_string());
    }

    Err(PeriksaError::UnsupportedFormat(if declared_type.is_empty() {
        name.to_string()
    } else {
        declared_type.to_string()
    }))
}

fn has_csv_extension(name: &str) -> bool {
    name.to_lowercase().ends_with(".csv")
}

/// Guess a declared type from the file extension.
fn type_from_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("csv") => CSV_MIME,
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn accepted_types_roundtrip() {
        let cases = [
            ("laporan.pdf", "application/pdf"),
            ("bukti.jpg", "image/jpeg"),
            ("bukti.png", "image/png"),
            ("bukti.webp", "image/webp"),
            ("bukti.heic", "image/heic"),
            ("aging.csv", "text/csv"),
        ];

        for (name, declared) in cases {
            let bytes = b"saldo piutang 123";
            let doc = Document::encode(name, declared, bytes).unwrap();
            assert_eq!(doc.mime_type, declared);
            assert_eq!(doc.size, bytes.len() as u64);
            assert_eq!(doc.decode().unwrap(), bytes);
        }
    }

    #[test]
    fn csv_variants_collapse_to_canonical_type() {
        for declared in ["application/csv", "application/vnd.ms-excel", "text/plain"] {
            let doc = Document::encode("export.csv", declared, b"a,b\n1,2\n").unwrap();
            assert_eq!(doc.mime_type, CSV_MIME);
        }
    }

    #[test]
    fn csv_extension_rescues_unknown_declared_type() {
        let doc = Document::encode("Aging Schedule.CSV", "application/octet-stream", b"a,b").unwrap();
        assert_eq!(doc.mime_type, CSV_MIME);
    }

    #[test]
    fn unknown_type_without_csv_extension_is_rejected() {
        let err = Document::encode("report.docx", "application/msword", b"x").unwrap_err();
        assert!(matches!(err, PeriksaError::UnsupportedFormat(_)));
    }

    #[test]
    fn oversized_document_is_rejected_without_a_document() {
        let bytes = vec![0u8; (MAX_DOCUMENT_BYTES + 1) as usize];
        let err = Document::encode("big.pdf", "application/pdf", &bytes).unwrap_err();
        assert!(matches!(err, PeriksaError::FileTooLarge { .. }));
    }

    #[test]
    fn size_at_ceiling_is_accepted() {
        // Keep the fixture small by testing the boundary logic directly.
        let doc = Document::from_base64("x.pdf", "application/pdf", "aGFsbw==", MAX_DOCUMENT_BYTES);
        assert!(doc.is_ok());
        let err =
            Document::from_base64("x.pdf", "application/pdf", "aGFsbw==", MAX_DOCUMENT_BYTES + 1);
        assert!(matches!(
            err.unwrap_err(),
            PeriksaError::FileTooLarge { .. }
        ));
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        let doc = Document::from_base64(
            "bukti.png",
            "image/png",
            "data:image/png;base64,aGFsbw==",
            5,
        )
        .unwrap();
        assert_eq!(doc.data, "aGFsbw==");
        assert_eq!(doc.decode().unwrap(), b"halo");
    }

    #[tokio::test]
    async fn encode_file_reads_and_roundtrips() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"pelanggan,saldo\nPT Maju,1500000\n").unwrap();

        let doc = encode_file(file.path()).await.unwrap();
        assert_eq!(doc.mime_type, CSV_MIME);
        assert_eq!(doc.decode().unwrap(), b"pelanggan,saldo\nPT Maju,1500000\n");
    }

    #[tokio::test]
    async fn encode_file_missing_file_is_a_read_error() {
        let err = encode_file(Path::new("/nonexistent/piutang.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, PeriksaError::Read(_)));
    }

    #[tokio::test]
    async fn encode_file_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        let err = encode_file(file.path()).await.unwrap_err();
        assert!(matches!(err, PeriksaError::UnsupportedFormat(_)));
    }
}
