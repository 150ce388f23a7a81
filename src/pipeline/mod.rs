//! Pipeline stages for batch PDF-to-JPEG conversion.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the rendering backend can be swapped without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! discover ──▶ render ──▶ encode
//! (list PDFs)  (pdfium)   (JPEG files)
//! ```
//!
//! 1. [`discover`] — create the output root and list `*.pdf` candidates
//! 2. [`render`]   — rasterise every page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`]   — encode each page as JPEG and write it under its
//!    deterministic name, one page at a time as `render` produces them

pub mod discover;
pub mod encode;
pub mod render;
