//! # edgequake-pdf2img
//!
//! Batch-convert a folder of PDF documents into per-page JPEG images.
//!
//! Every `*.pdf` directly inside the source folder gets its own subfolder
//! under the output root, holding one JPEG per page:
//!
//! ```text
//! output/
//! └── report/
//!     ├── report_page_1.jpg
//!     ├── report_page_2.jpg
//!     └── report_page_3.jpg
//! ```
//!
//! ## Pipeline Overview
//!
//! ```text
//! source dir
//!  │
//!  ├─ 1. Discover  create output root, list *.pdf (case-insensitive, sorted)
//!  ├─ 2. Render    rasterise every page via pdfium at `dpi` (default 300)
//!  └─ 3. Encode    RGB8 → JPEG, written as {base}_page_{n}.jpg
//! ```
//!
//! Documents are processed one after another. By default the first failure
//! aborts the batch; set [`BatchConfigBuilder::keep_going`] to record failed
//! documents and carry on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2img::{run, BatchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder("/data/pdfs", "/data/images")
//!         .dpi(300)
//!         .build()?;
//!     let output = run(&config).await?;
//!     eprintln!(
//!         "{} documents, {} pages",
//!         output.stats.converted_documents, output.stats.total_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2img = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BatchConfig, BatchConfigBuilder, DEFAULT_DPI, DEFAULT_JPEG_QUALITY};
pub use convert::{convert_one, inspect_dir, run, run_sync};
pub use error::{DocumentError, Pdf2ImgError};
pub use output::{BatchOutput, BatchStats, DocumentResult};
pub use pipeline::discover::{ensure_output_root, list_pdf_candidates, PdfCandidate};
pub use pipeline::encode::page_file_name;
pub use pipeline::render::{PdfiumRasterizer, Rasterizer};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
