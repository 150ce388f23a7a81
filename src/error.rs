//! Error types for the edgequake-pdf2img library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2ImgError`] — **Fatal**: the batch cannot proceed (missing source
//!   directory, unwritable output root, pdfium not available). Returned as
//!   `Err(Pdf2ImgError)` from [`crate::run`] and friends. In the default
//!   fail-fast mode *every* per-document failure is also surfaced this way.
//!
//! * [`DocumentError`] — **Non-fatal**: a single document failed while
//!   `keep_going` is enabled. Stored inside [`crate::output::DocumentResult`]
//!   so the rest of the batch still runs and callers can report every failure
//!   at the end.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2img library.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// The source directory does not exist.
    #[error("Source directory not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    /// The source path exists but is a file, not a directory.
    #[error("Source path is not a directory: '{path}'")]
    SourceNotADirectory { path: PathBuf },

    /// Listing the source directory failed.
    #[error("Failed to list directory '{path}': {source}")]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A candidate PDF could not be opened for reading.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file carries a `.pdf` name but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not open the document.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// The document is encrypted with a user password.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for '{path}' page {page}: {detail}")]
    RasterisationFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output root or a per-document folder.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not encode or write a page image.
    #[error("Failed to write page image '{path}': {detail}")]
    PageWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Pass --pdfium-lib /path/to/libpdfium.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
  • Place the platform library next to the pdf2img executable.\n\
Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2ImgError {
    /// Whether `keep_going` may record this error and move on to the next
    /// document. Errors about the batch as a whole are never recoverable.
    pub fn is_document_scoped(&self) -> bool {
        matches!(
            self,
            Pdf2ImgError::ReadFailed { .. }
                | Pdf2ImgError::NotAPdf { .. }
                | Pdf2ImgError::CorruptPdf { .. }
                | Pdf2ImgError::PasswordRequired { .. }
                | Pdf2ImgError::RasterisationFailed { .. }
                | Pdf2ImgError::PageWriteFailed { .. }
                | Pdf2ImgError::CreateDirFailed { .. }
        )
    }
}

/// A non-fatal error for a single document.
///
/// Only produced when [`crate::config::BatchConfig::keep_going`] is set.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The file could not be read, or is not a PDF at all.
    #[error("{name}: invalid input: {detail}")]
    InvalidInput { name: String, detail: String },

    /// pdfium could not open or rasterise the document.
    #[error("{name}: rasterisation failed: {detail}")]
    RenderFailed { name: String, detail: String },

    /// The document rendered but its pages could not be written.
    #[error("{name}: writing pages failed: {detail}")]
    WriteFailed { name: String, detail: String },
}

impl DocumentError {
    /// Classify a fatal error as the document-level failure it stands for.
    pub fn from_fatal(name: &str, err: &Pdf2ImgError) -> Self {
        let detail = err.to_string();
        match err {
            Pdf2ImgError::ReadFailed { .. } | Pdf2ImgError::NotAPdf { .. } => {
                DocumentError::InvalidInput {
                    name: name.to_string(),
                    detail,
                }
            }
            Pdf2ImgError::PageWriteFailed { .. } | Pdf2ImgError::CreateDirFailed { .. } => {
                DocumentError::WriteFailed {
                    name: name.to_string(),
                    detail,
                }
            }
            _ => DocumentError::RenderFailed {
                name: name.to_string(),
                detail,
            },
        }
    }
}
