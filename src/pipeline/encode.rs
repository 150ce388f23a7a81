//! Image encoding: `DynamicImage` → JPEG file on disk.
//!
//! pdfium hands back RGBA bitmaps; JPEG has no alpha channel, so every page
//! is flattened to RGB8 before encoding. Each page is written to a `.tmp`
//! sibling and renamed into place, so a reader never sees a truncated JPEG
//! under the final name and reruns simply replace the previous file.

use crate::error::Pdf2ImgError;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of page `page_num` (1-based): `{base_name}_page_{page_num}.jpg`.
pub fn page_file_name(base_name: &str, page_num: usize) -> String {
    format!("{base_name}_page_{page_num}.jpg")
}

/// Encode `img` as JPEG at `quality` and write it to `path`, replacing any
/// existing file.
pub fn write_page(img: &DynamicImage, path: &Path, quality: u8) -> Result<(), Pdf2ImgError> {
    let write_err = |detail: String| Pdf2ImgError::PageWriteFailed {
        path: path.to_path_buf(),
        detail,
    };

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let result = (|| -> Result<(), Pdf2ImgError> {
        let file = File::create(&tmp_path).map_err(|e| write_err(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))
            .map_err(|e| write_err(e.to_string()))?;
        writer.flush().map_err(|e| write_err(e.to_string()))?;
        std::fs::rename(&tmp_path, path).map_err(|e| write_err(e.to_string()))
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

/// Writes one document's pages into `dir`, numbering them from 1 in the
/// order they arrive.
#[derive(Debug)]
pub struct PageWriter {
    dir: PathBuf,
    base_name: String,
    quality: u8,
    written: Vec<PathBuf>,
}

impl PageWriter {
    pub fn new(dir: impl Into<PathBuf>, base_name: impl Into<String>, quality: u8) -> Self {
        Self {
            dir: dir.into(),
            base_name: base_name.into(),
            quality,
            written: Vec::new(),
        }
    }

    /// Encode `img` as the next page.
    pub fn write_next(&mut self, img: &DynamicImage) -> Result<(), Pdf2ImgError> {
        let page_num = self.written.len() + 1;
        let path = self.dir.join(page_file_name(&self.base_name, page_num));
        write_page(img, &path, self.quality)?;
        debug!("Wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }

    /// The written paths; element `i` holds page `i + 1`.
    pub fn into_pages(self) -> Vec<PathBuf> {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn red_page(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn page_names_are_one_based() {
        assert_eq!(page_file_name("report", 1), "report_page_1.jpg");
        assert_eq!(page_file_name("report", 12), "report_page_12.jpg");
        assert_eq!(page_file_name("v1.2", 3), "v1.2_page_3.jpg");
    }

    #[test]
    fn writes_decodable_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a_page_1.jpg");
        write_page(&red_page(16, 8), &path, 90).expect("write should succeed");

        let decoded = image::open(&path).expect("valid JPEG");
        assert_eq!(decoded.dimensions(), (16, 8));
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG SOI marker");
        assert!(!dir.path().join("a_page_1.jpg.tmp").exists());
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a_page_1.jpg");
        std::fs::write(&path, b"stale").unwrap();
        write_page(&red_page(4, 4), &path, 75).unwrap();
        let decoded = image::open(&path).expect("stale bytes replaced by JPEG");
        assert_eq!(decoded.dimensions(), (4, 4));
    }

    #[test]
    fn page_writer_numbers_in_arrival_order() {
        let dir = TempDir::new().unwrap();
        let mut writer = PageWriter::new(dir.path(), "doc", 75);
        for side in 2..=4 {
            writer.write_next(&red_page(side, side)).unwrap();
        }
        let written = writer.into_pages();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["doc_page_1.jpg", "doc_page_2.jpg", "doc_page_3.jpg"]);
        assert_eq!(image::open(&written[2]).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn missing_directory_is_a_write_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent/a_page_1.jpg");
        let err = write_page(&red_page(2, 2), &path, 75).unwrap_err();
        assert!(matches!(err, Pdf2ImgError::PageWriteFailed { .. }));
    }
}
