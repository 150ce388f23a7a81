//! Result types returned by a batch run.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of converting one PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// Path of the source PDF.
    pub source: PathBuf,
    /// File name without its final extension; names the output folder.
    pub base_name: String,
    /// `output_root/base_name`.
    pub output_dir: PathBuf,
    /// Pages returned by the rasteriser. Zero when the document failed.
    pub page_count: usize,
    /// Written JPEGs, in page order.
    pub pages: Vec<PathBuf>,
    /// Set only for documents that failed under `keep_going`.
    pub error: Option<DocumentError>,
    pub duration_ms: u64,
}

impl DocumentResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Totals for the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// PDF candidates found in the source directory.
    pub total_documents: usize,
    pub converted_documents: usize,
    pub failed_documents: usize,
    pub total_pages: usize,
    pub total_duration_ms: u64,
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// Per-document results in processing order.
    pub documents: Vec<DocumentResult>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// Documents that failed under `keep_going`.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentResult> {
        self.documents.iter().filter(|d| !d.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, pages: usize, error: Option<DocumentError>) -> DocumentResult {
        DocumentResult {
            source: PathBuf::from(format!("in/{name}.pdf")),
            base_name: name.to_string(),
            output_dir: PathBuf::from(format!("out/{name}")),
            page_count: pages,
            pages: (1..=pages)
                .map(|i| PathBuf::from(format!("out/{name}/{name}_page_{i}.jpg")))
                .collect(),
            error,
            duration_ms: 5,
        }
    }

    #[test]
    fn failures_filters_errors_only() {
        let output = BatchOutput {
            documents: vec![
                doc("report", 3, None),
                doc(
                    "broken",
                    0,
                    Some(DocumentError::RenderFailed {
                        name: "broken".into(),
                        detail: "xref".into(),
                    }),
                ),
            ],
            stats: BatchStats::default(),
        };
        let failed: Vec<_> = output.failures().map(|d| d.base_name.as_str()).collect();
        assert_eq!(failed, vec!["broken"]);
    }

    #[test]
    fn serialises_to_json() {
        let output = BatchOutput {
            documents: vec![doc("report", 2, None)],
            stats: BatchStats {
                total_documents: 1,
                converted_documents: 1,
                failed_documents: 0,
                total_pages: 2,
                total_duration_ms: 10,
            },
        };
        let json = serde_json::to_value(&output).expect("serialise");
        assert_eq!(json["stats"]["total_pages"], 2);
        assert_eq!(json["documents"][0]["base_name"], "report");
        assert!(json["documents"][0]["error"].is_null());
    }
}
