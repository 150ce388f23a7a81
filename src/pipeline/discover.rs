//! Source discovery: create the output root and list PDF candidates.
//!
//! Only the top level of the source directory is scanned. A candidate is a
//! regular file (symlinks followed) whose name ends in `.pdf`, compared
//! case-insensitively. Candidates come back sorted by file name so progress
//! output and the fail-fast stopping point are reproducible across platforms.

use crate::error::Pdf2ImgError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A PDF found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfCandidate {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name as listed, e.g. `Report.PDF`.
    pub file_name: String,
    /// File name without its final extension, e.g. `Report`.
    pub base_name: String,
}

/// Create the output root (and any missing parents). No-op if it exists.
pub async fn ensure_output_root(output_root: &Path) -> Result<(), Pdf2ImgError> {
    tokio::fs::create_dir_all(output_root)
        .await
        .map_err(|e| Pdf2ImgError::CreateDirFailed {
            path: output_root.to_path_buf(),
            source: e,
        })
}

/// Whether `file_name` names a PDF (`.pdf`, any case).
pub fn is_pdf_name(file_name: &str) -> bool {
    file_name.to_lowercase().ends_with(".pdf")
}

/// Strip the final extension: `a.b.pdf` → `a.b`.
///
/// Leading dots never start an extension, so `.pdf`, `..pdf` and `...pdf`
/// keep their full name and can never resolve to `.` or `..` once joined
/// onto the output root.
pub fn base_name_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) if file_name[..dot].chars().any(|c| c != '.') => file_name[..dot].to_string(),
        _ => file_name.to_string(),
    }
}

/// List every PDF candidate directly inside `source_dir`.
pub async fn list_pdf_candidates(source_dir: &Path) -> Result<Vec<PdfCandidate>, Pdf2ImgError> {
    let meta = tokio::fs::metadata(source_dir).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Pdf2ImgError::SourceNotFound {
                path: source_dir.to_path_buf(),
            }
        } else {
            Pdf2ImgError::ReadDirFailed {
                path: source_dir.to_path_buf(),
                source: e,
            }
        }
    })?;
    if !meta.is_dir() {
        return Err(Pdf2ImgError::SourceNotADirectory {
            path: source_dir.to_path_buf(),
        });
    }

    let read_dir_err = |e: std::io::Error| Pdf2ImgError::ReadDirFailed {
        path: source_dir.to_path_buf(),
        source: e,
    };

    let mut entries = tokio::fs::read_dir(source_dir).await.map_err(read_dir_err)?;
    let mut candidates = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_dir_err)? {
        let path = entry.path();
        let file_name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                warn!("Skipping non-UTF-8 file name: {:?}", raw);
                continue;
            }
        };

        if !is_pdf_name(&file_name) {
            continue;
        }

        // fs::metadata follows symlinks; DirEntry::metadata does not.
        match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => {}
            Ok(_) => {
                debug!("Skipping non-file entry: {}", path.display());
                continue;
            }
            Err(e) => {
                warn!("Skipping unreadable entry {}: {}", path.display(), e);
                continue;
            }
        }

        let base_name = base_name_of(&file_name);
        candidates.push(PdfCandidate {
            path,
            file_name,
            base_name,
        });
    }

    candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    debug!(
        "Found {} PDF candidates in {}",
        candidates.len(),
        source_dir.display()
    );
    Ok(candidates)
}

/// How far into the file the `%PDF` header may start. pdfium tolerates a
/// BOM or other junk ahead of it.
pub const PDF_HEADER_WINDOW: u64 = 1024;

/// Verify the `%PDF` header appears within the first [`PDF_HEADER_WINDOW`]
/// bytes of the file.
pub fn check_pdf_magic(path: &Path) -> Result<(), Pdf2ImgError> {
    let read_err = |e: std::io::Error| Pdf2ImgError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let f = std::fs::File::open(path).map_err(read_err)?;
    let mut head = Vec::with_capacity(PDF_HEADER_WINDOW as usize);
    f.take(PDF_HEADER_WINDOW)
        .read_to_end(&mut head)
        .map_err(read_err)?;

    if head.windows(4).any(|w| w == b"%PDF") {
        return Ok(());
    }

    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(Pdf2ImgError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}
