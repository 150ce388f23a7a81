//! Configuration types for batch PDF-to-JPEG conversion.
//!
//! All batch behaviour is controlled through [`BatchConfig`], built via
//! [`BatchConfigBuilder`]. The two directories are required up front; every
//! other knob has a documented default.

use crate::error::Pdf2ImgError;
use crate::pipeline::render::Rasterizer;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default rendering resolution.
pub const DEFAULT_DPI: u32 = 300;

/// Default JPEG quality, matching the usual encoder default.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Accepted DPI range.
pub const DPI_RANGE: std::ops::RangeInclusive<u32> = 72..=600;

/// Configuration for a batch conversion run.
///
/// # Example
/// ```rust
/// use edgequake_pdf2img::BatchConfig;
///
/// let config = BatchConfig::builder("/data/pdfs", "/data/images")
///     .dpi(200)
///     .keep_going(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Folder scanned (non-recursively) for `*.pdf` files.
    pub source_dir: PathBuf,

    /// Output root; one subfolder per document is created beneath it.
    pub output_dir: PathBuf,

    /// Rendering DPI. Range: 72–600. Default: 300.
    ///
    /// pdfium renders at `dpi / 72` pixels per PDF point, so an A4 page at
    /// 300 DPI becomes roughly 2480 × 3508 px.
    pub dpi: u32,

    /// JPEG quality (1–100). Default: 75.
    pub jpeg_quality: u8,

    /// Record per-document failures and continue instead of aborting. Default: false.
    ///
    /// With the default fail-fast behaviour the first bad PDF stops the batch
    /// and later documents are left unprocessed.
    pub keep_going: bool,

    /// Explicit path to the pdfium shared library.
    ///
    /// If None, [`crate::pipeline::render::bind_pdfium`] searches
    /// `PDFIUM_LIB_PATH`, the executable's directory, the working directory
    /// and the system library path.
    pub pdfium_library: Option<PathBuf>,

    /// Pre-constructed rasteriser. Takes precedence over `pdfium_library`.
    pub rasterizer: Option<Arc<dyn Rasterizer>>,

    /// Receives per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("source_dir", &self.source_dir)
            .field("output_dir", &self.output_dir)
            .field("dpi", &self.dpi)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("keep_going", &self.keep_going)
            .field("pdfium_library", &self.pdfium_library)
            .field("rasterizer", &self.rasterizer.as_ref().map(|_| "<dyn Rasterizer>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Config with all defaults for the given directories.
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            dpi: DEFAULT_DPI,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            keep_going: false,
            pdfium_library: None,
            rasterizer: None,
            progress_callback: None,
        }
    }

    /// Create a new builder for `BatchConfig`.
    pub fn builder(
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::new(source_dir, output_dir),
        }
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    pub fn keep_going(mut self, v: bool) -> Self {
        self.config.keep_going = v;
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, Pdf2ImgError> {
        let c = &self.config;
        if !DPI_RANGE.contains(&c.dpi) {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "DPI must be {}–{}, got {}",
                DPI_RANGE.start(),
                DPI_RANGE.end(),
                c.dpi
            )));
        }
        if !(1..=100).contains(&c.jpeg_quality) {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.source_dir.as_os_str().is_empty() || c.output_dir.as_os_str().is_empty() {
            return Err(Pdf2ImgError::InvalidConfig(
                "Source and output directories must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
