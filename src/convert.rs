//! Batch conversion entry points.
//!
//! [`run`] walks the source directory once and converts each PDF with
//! [`convert_one`], strictly one document at a time: a document's pages are
//! all rasterised and written before the next document is opened. Each page
//! is encoded as soon as it is rendered.

use crate::config::BatchConfig;
use crate::error::{DocumentError, Pdf2ImgError};
use crate::output::{BatchOutput, BatchStats, DocumentResult};
use crate::pipeline::discover::{self, PdfCandidate};
use crate::pipeline::encode;
use crate::pipeline::render::{self, PdfiumRasterizer, Rasterizer};
use std::collections::HashSet;
use std::path::{Component, Path};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert every PDF directly inside `config.source_dir`.
///
/// # Returns
/// `Ok(BatchOutput)` once every candidate has been attempted. An empty
/// source directory yields an empty `documents` list.
///
/// # Errors
/// Without `keep_going`, the first failure of any kind aborts the batch and
/// is returned; documents after it are left unprocessed and pages already
/// written stay on disk. With `keep_going`, only batch-level failures
/// (output root, source listing, pdfium binding) are returned.
pub async fn run(config: &BatchConfig) -> Result<BatchOutput, Pdf2ImgError> {
    let total_start = Instant::now();
    info!(
        "Starting batch: {} → {}",
        config.source_dir.display(),
        config.output_dir.display()
    );

    // ── Step 1: Output root ──────────────────────────────────────────────
    discover::ensure_output_root(&config.output_dir).await?;

    // ── Step 2: Discover candidates ──────────────────────────────────────
    let candidates = discover::list_pdf_candidates(&config.source_dir).await?;
    let total = candidates.len();
    info!("Found {} PDF files", total);
    warn_on_shared_base_names(&candidates);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    // ── Step 3: Convert sequentially ─────────────────────────────────────
    let rasterizer = resolve_rasterizer(config);
    let mut documents = Vec::with_capacity(total);

    for (i, candidate) in candidates.iter().enumerate() {
        let index = i + 1;
        let doc_start = Instant::now();
        info!("Converting: {}", candidate.path.display());

        if let Some(ref cb) = config.progress_callback {
            cb.on_document_start(index, total, &candidate.base_name);
        }

        let result = convert_with(
            Arc::clone(&rasterizer),
            &candidate.path,
            &candidate.base_name,
            &config.output_dir,
            config,
        )
        .await;

        match result {
            Ok(doc) => {
                info!(
                    "{} conversion completed: {} pages",
                    candidate.base_name, doc.page_count
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_complete(index, total, &candidate.base_name, doc.page_count);
                }
                documents.push(doc);
            }
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_error(index, total, &candidate.base_name, e.to_string());
                }
                if !(config.keep_going && e.is_document_scoped()) {
                    return Err(e);
                }
                warn!("Skipping {}: {}", candidate.file_name, e);
                documents.push(failed_result(
                    candidate,
                    &config.output_dir,
                    &e,
                    doc_start.elapsed().as_millis() as u64,
                ));
            }
        }
    }

    // ── Step 4: Stats ────────────────────────────────────────────────────
    let converted = documents.iter().filter(|d| d.is_success()).count();
    let stats = BatchStats {
        total_documents: total,
        converted_documents: converted,
        failed_documents: total - converted,
        total_pages: documents.iter().map(|d| d.page_count).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "All PDF conversions completed: {}/{} documents, {} pages, {}ms",
        converted, total, stats.total_pages, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, converted);
    }

    Ok(BatchOutput { documents, stats })
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally, so it must not be called
/// from inside an existing runtime.
pub fn run_sync(config: &BatchConfig) -> Result<BatchOutput, Pdf2ImgError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2ImgError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(config))
}

/// Convert a single PDF into `output_root/pdf_name/`.
///
/// Creates the per-document folder if missing, rasterises every page at
/// `config.dpi` and writes `{pdf_name}_page_{n}.jpg` for `n` in
/// `1..=page_count`, overwriting same-named files.
pub async fn convert_one(
    pdf_path: &Path,
    pdf_name: &str,
    output_root: &Path,
    config: &BatchConfig,
) -> Result<DocumentResult, Pdf2ImgError> {
    convert_with(
        resolve_rasterizer(config),
        pdf_path,
        pdf_name,
        output_root,
        config,
    )
    .await
}

/// List the PDFs a run over `source_dir` would convert, without converting.
pub async fn inspect_dir(source_dir: impl AsRef<Path>) -> Result<Vec<PdfCandidate>, Pdf2ImgError> {
    discover::list_pdf_candidates(source_dir.as_ref()).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn convert_with(
    rasterizer: Arc<dyn Rasterizer>,
    pdf_path: &Path,
    pdf_name: &str,
    output_root: &Path,
    config: &BatchConfig,
) -> Result<DocumentResult, Pdf2ImgError> {
    let start = Instant::now();

    // `..`, `.` or a separator would put pages outside their own subfolder.
    let mut components = Path::new(pdf_name).components();
    if !matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) {
        return Err(Pdf2ImgError::InvalidConfig(format!(
            "'{pdf_name}' cannot be used as an output folder name"
        )));
    }

    let pdf_output_folder = output_root.join(pdf_name);
    tokio::fs::create_dir_all(&pdf_output_folder)
        .await
        .map_err(|e| Pdf2ImgError::CreateDirFailed {
            path: pdf_output_folder.clone(),
            source: e,
        })?;

    discover::check_pdf_magic(pdf_path)?;

    let render_start = Instant::now();
    let writer = encode::PageWriter::new(&pdf_output_folder, pdf_name, config.jpeg_quality);
    let pages = render::render_document(rasterizer, pdf_path, config.dpi, writer).await?;
    let page_count = pages.len();
    debug!(
        "Rendered and wrote {} pages of {} in {}ms",
        page_count,
        pdf_path.display(),
        render_start.elapsed().as_millis()
    );

    Ok(DocumentResult {
        source: pdf_path.to_path_buf(),
        base_name: pdf_name.to_string(),
        output_dir: pdf_output_folder,
        page_count,
        pages,
        error: None,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// The configured rasteriser, or pdfium at the configured library path.
fn resolve_rasterizer(config: &BatchConfig) -> Arc<dyn Rasterizer> {
    if let Some(ref rasterizer) = config.rasterizer {
        return Arc::clone(rasterizer);
    }
    match config.pdfium_library {
        Some(ref path) => Arc::new(PdfiumRasterizer::with_library(path)),
        None => Arc::new(PdfiumRasterizer::new()),
    }
}

fn failed_result(
    candidate: &PdfCandidate,
    output_root: &Path,
    err: &Pdf2ImgError,
    duration_ms: u64,
) -> DocumentResult {
    DocumentResult {
        source: candidate.path.clone(),
        base_name: candidate.base_name.clone(),
        output_dir: output_root.join(&candidate.base_name),
        page_count: 0,
        pages: Vec::new(),
        error: Some(DocumentError::from_fatal(&candidate.base_name, err)),
        duration_ms,
    }
}

/// `a.pdf` and `a.PDF` both write into `a/`; the later one wins.
fn warn_on_shared_base_names(candidates: &[PdfCandidate]) {
    let mut seen = HashSet::new();
    for c in candidates {
        if !seen.insert(c.base_name.as_str()) {
            warn!(
                "{} shares output folder '{}' with an earlier file; its pages will overwrite",
                c.file_name, c.base_name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use tempfile::TempDir;

    /// Returns `pages` grey pages for every document.
    struct FixedPages(usize);

    impl Rasterizer for FixedPages {
        fn rasterize(&self, _: &Path, _: u32) -> Result<Vec<DynamicImage>, Pdf2ImgError> {
            Ok((0..self.0)
                .map(|_| DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([128, 128, 128]))))
                .collect())
        }
    }

    fn config_for(tmp: &TempDir, pages: usize) -> BatchConfig {
        BatchConfig::builder(tmp.path().join("in"), tmp.path().join("out"))
            .rasterizer(Arc::new(FixedPages(pages)))
            .build()
            .unwrap()
    }

    #[test]
    fn convert_one_writes_every_page() {
        let tmp = TempDir::new().unwrap();
        let config = config_for(&tmp, 2);
        std::fs::create_dir_all(&config.source_dir).unwrap();
        let pdf = config.source_dir.join("memo.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();

        let doc = tokio_test::block_on(convert_one(&pdf, "memo", &config.output_dir, &config))
            .expect("convert_one should succeed");

        assert_eq!(doc.page_count, 2);
        assert_eq!(doc.output_dir, config.output_dir.join("memo"));
        assert!(doc.output_dir.join("memo_page_1.jpg").is_file());
        assert!(doc.output_dir.join("memo_page_2.jpg").is_file());
        assert!(!doc.output_dir.join("memo_page_3.jpg").exists());
    }

    #[test]
    fn convert_one_rejects_non_pdf_bytes() {
        let tmp = TempDir::new().unwrap();
        let config = config_for(&tmp, 1);
        std::fs::create_dir_all(&config.source_dir).unwrap();
        let fake = config.source_dir.join("fake.pdf");
        std::fs::write(&fake, b"hello").unwrap();

        let err = tokio_test::block_on(convert_one(&fake, "fake", &config.output_dir, &config))
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::NotAPdf { .. }));
    }

    #[test]
    fn convert_one_refuses_names_that_leave_the_output_root() {
        let tmp = TempDir::new().unwrap();
        let config = config_for(&tmp, 1);
        std::fs::create_dir_all(&config.source_dir).unwrap();
        let pdf = config.source_dir.join("x.pdf");
        std::fs::write(&pdf, b"%PDF-1.4\n").unwrap();

        for name in ["..", ".", "", "a/b", "../up"] {
            let err = tokio_test::block_on(convert_one(&pdf, name, &config.output_dir, &config))
                .unwrap_err();
            assert!(matches!(err, Pdf2ImgError::InvalidConfig(_)), "{name:?}: {err}");
        }
        assert!(!tmp.path().join("x_page_1.jpg").exists());
        assert!(!tmp.path().join("up").exists());
    }

    #[test]
    fn run_sync_on_empty_directory() {
        let tmp = TempDir::new().unwrap();
        let config = config_for(&tmp, 1);
        std::fs::create_dir_all(&config.source_dir).unwrap();

        let output = run_sync(&config).expect("empty batch succeeds");
        assert!(output.documents.is_empty());
        assert_eq!(output.stats.total_documents, 0);
        assert_eq!(output.stats.total_pages, 0);
        assert!(config.output_dir.is_dir());
        assert_eq!(std::fs::read_dir(&config.output_dir).unwrap().count(), 0);
    }

    #[test]
    fn resolve_prefers_injected_rasterizer() {
        let tmp = TempDir::new().unwrap();
        let config = config_for(&tmp, 4);
        let r = resolve_rasterizer(&config);
        assert_eq!(r.rasterize(Path::new("x.pdf"), 300).unwrap().len(), 4);
    }
}
