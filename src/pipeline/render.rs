//! PDF rasterisation: render every page of a document to `DynamicImage`.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! [`render_document`] moves the work onto Tokio's blocking pool and awaits
//! it, so the batch stays strictly sequential while the async workers stay
//! free.
//!
//! ## One page in memory
//!
//! [`render_document`] hands each page to a [`PageWriter`] as soon as pdfium
//! has rendered it, so a 300 DPI document never holds more than one bitmap.
//!
//! ## Scale from DPI
//!
//! PDF geometry is expressed in points (1/72 inch). Rendering with a scale
//! factor of `dpi / 72` yields exactly `dpi` pixels per inch of page.

use crate::error::Pdf2ImgError;
use crate::pipeline::encode::PageWriter;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable naming an existing pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Turns a PDF on disk into one raster image per page, in page order.
///
/// Implementations must be `Send + Sync`: the pipeline hands them to a
/// blocking worker thread.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>, Pdf2ImgError>;

    /// Render pages in order, passing each to `on_page` before the next one
    /// is rendered. An error from `on_page` stops rendering.
    ///
    /// The default renders the whole document with [`Rasterizer::rasterize`]
    /// first; override it when pages can be produced one at a time.
    fn render_each(
        &self,
        pdf_path: &Path,
        dpi: u32,
        on_page: &mut dyn FnMut(DynamicImage) -> Result<(), Pdf2ImgError>,
    ) -> Result<(), Pdf2ImgError> {
        for image in self.rasterize(pdf_path, dpi)? {
            on_page(image)?;
        }
        Ok(())
    }
}

/// The default [`Rasterizer`], backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_path: Option<PathBuf>,
}

impl PdfiumRasterizer {
    /// Search the default locations for pdfium (see [`bind_pdfium`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to the pdfium library at `path` rather than searching.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>, Pdf2ImgError> {
        let mut images = Vec::new();
        self.render_each(pdf_path, dpi, &mut |image| {
            images.push(image);
            Ok(())
        })?;
        Ok(images)
    }

    fn render_each(
        &self,
        pdf_path: &Path,
        dpi: u32,
        on_page: &mut dyn FnMut(DynamicImage) -> Result<(), Pdf2ImgError>,
    ) -> Result<(), Pdf2ImgError> {
        let pdfium = bind_pdfium(self.library_path.as_deref())?;

        let document = pdfium.load_pdf_from_file(pdf_path, None).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                Pdf2ImgError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                Pdf2ImgError::CorruptPdf {
                    path: pdf_path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale_for_dpi(dpi));

        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                Pdf2ImgError::RasterisationFailed {
                    path: pdf_path.to_path_buf(),
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            on_page(image)?;
        }

        Ok(())
    }
}

/// Pixels per PDF point for the given DPI.
pub fn scale_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / 72.0
}

/// Bind to a pdfium shared library.
///
/// Resolution order, first success wins:
///
/// 1. `explicit` — the configured library path
/// 2. `PDFIUM_LIB_PATH`
/// 3. the platform library next to the running executable
/// 4. the platform library in the working directory
/// 5. the system library search path
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, Pdf2ImgError> {
    if let Some(path) = explicit {
        return bind_pdfium_from_path(path);
    }

    if let Ok(env_path) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        if !env_path.is_empty() {
            return bind_pdfium_from_path(Path::new(&env_path));
        }
    }

    let mut attempts = Vec::new();
    for candidate in local_library_candidates() {
        match Pdfium::bind_to_library(&candidate) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", candidate.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => attempts.push(format!("{}: {}", candidate.display(), e)),
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| {
            attempts.push(format!("system library: {}", e));
            Pdf2ImgError::PdfiumBindingFailed(attempts.join("; "))
        })
}

/// Bind to the pdfium library at exactly `path`.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, Pdf2ImgError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| Pdf2ImgError::PdfiumBindingFailed(format!("{}: {}", path.display(), e)))
}

/// Platform library paths beside the executable and in the working directory.
fn local_library_candidates() -> Vec<PathBuf> {
    let lib_name = Pdfium::pdfium_platform_library_name();
    let mut candidates = Vec::new();

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
    {
        candidates.push(exe_dir.join(&lib_name));
    }
    if let Ok(cwd) = std::env::current_dir() {
        let p = cwd.join(&lib_name);
        if !candidates.contains(&p) {
            candidates.push(p);
        }
    }

    candidates.retain(|p| p.exists());
    candidates
}

/// Rasterise `pdf_path` on the blocking pool, writing each page through
/// `writer` as it is rendered.
///
/// Returns the written paths in page order. Pages written before a failure
/// stay on disk.
pub async fn render_document(
    rasterizer: Arc<dyn Rasterizer>,
    pdf_path: &Path,
    dpi: u32,
    mut writer: PageWriter,
) -> Result<Vec<PathBuf>, Pdf2ImgError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<Vec<PathBuf>, Pdf2ImgError> {
        rasterizer.render_each(&path, dpi, &mut |image| writer.write_next(&image))?;
        Ok(writer.into_pages())
    })
    .await
    .map_err(|e| Pdf2ImgError::Internal(format!("Render task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct SolidPages(usize);

    impl Rasterizer for SolidPages {
        fn rasterize(&self, _pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>, Pdf2ImgError> {
            let side = dpi / 10;
            Ok((0..self.0)
                .map(|_| {
                    DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                        side,
                        side,
                        Rgba([255, 255, 255, 255]),
                    ))
                })
                .collect())
        }
    }

    #[test]
    fn scale_matches_points_per_inch() {
        assert_eq!(scale_for_dpi(72), 1.0);
        assert!((scale_for_dpi(300) - 4.1666665).abs() < 1e-5);
    }

    #[test]
    fn explicit_missing_library_fails_to_bind() {
        let err = bind_pdfium(Some(Path::new("/definitely/not/libpdfium.so")))
            .err()
            .expect("binding a missing file must fail");
        assert!(matches!(err, Pdf2ImgError::PdfiumBindingFailed(_)));
        assert!(err.to_string().contains("/definitely/not/libpdfium.so"));
    }

    #[tokio::test]
    async fn render_document_writes_every_page() {
        let dir = TempDir::new().unwrap();
        let writer = PageWriter::new(dir.path(), "x", 75);
        let pages = render_document(Arc::new(SolidPages(3)), Path::new("x.pdf"), 300, writer)
            .await
            .unwrap();
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2], dir.path().join("x_page_3.jpg"));
        assert_eq!(image::open(&pages[0]).unwrap().width(), 30);
    }

    #[tokio::test]
    async fn write_failure_stops_rendering() {
        struct Counting(AtomicUsize);
        impl Rasterizer for Counting {
            fn rasterize(&self, _: &Path, _: u32) -> Result<Vec<DynamicImage>, Pdf2ImgError> {
                unreachable!("render_each is overridden")
            }
            fn render_each(
                &self,
                _: &Path,
                _: u32,
                on_page: &mut dyn FnMut(DynamicImage) -> Result<(), Pdf2ImgError>,
            ) -> Result<(), Pdf2ImgError> {
                for _ in 0..5 {
                    self.0.fetch_add(1, Ordering::SeqCst);
                    on_page(DynamicImage::ImageRgba8(RgbaImage::new(2, 2)))?;
                }
                Ok(())
            }
        }

        let dir = TempDir::new().unwrap();
        let writer = PageWriter::new(dir.path().join("absent"), "x", 75);
        let rasterizer = Arc::new(Counting(AtomicUsize::new(0)));
        let err = render_document(
            Arc::clone(&rasterizer) as Arc<dyn Rasterizer>,
            Path::new("x.pdf"),
            72,
            writer,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Pdf2ImgError::PageWriteFailed { .. }));
        assert_eq!(rasterizer.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_rasterizer_becomes_internal_error() {
        struct Panics;
        impl Rasterizer for Panics {
            fn rasterize(&self, _: &Path, _: u32) -> Result<Vec<DynamicImage>, Pdf2ImgError> {
                panic!("boom")
            }
        }

        let dir = TempDir::new().unwrap();
        let writer = PageWriter::new(dir.path(), "x", 75);
        let err = render_document(Arc::new(Panics), Path::new("x.pdf"), 300, writer)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::Internal(_)));
    }
}
