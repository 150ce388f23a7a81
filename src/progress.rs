//! Progress-callback trait for per-document batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive events
//! as the batch walks the source directory. The CLI uses it to drive its
//! progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2img::{BatchConfig, BatchProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for PageCounter {
//!     fn on_document_complete(&self, _index: usize, _total: usize, name: &str, page_count: usize) {
//!         self.pages.fetch_add(page_count, Ordering::SeqCst);
//!         eprintln!("{name}: {page_count} pages");
//!     }
//! }
//!
//! let config = BatchConfig::builder("in", "out")
//!     .progress_callback(Arc::new(PageCounter { pages: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch runner as it processes each document.
///
/// All methods have default no-op implementations. `index` is 1-based.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the source directory has been listed.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document is rasterised.
    fn on_document_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called after every page of a document has been written.
    fn on_document_complete(&self, index: usize, total: usize, name: &str, page_count: usize) {
        let _ = (index, total, name, page_count);
    }

    /// Called when a document fails.
    ///
    /// In fail-fast mode this is the last event before the run returns `Err`.
    fn on_document_error(&self, index: usize, total: usize, name: &str, error: String) {
        let _ = (index, total, name, error);
    }

    /// Called once after all documents have been attempted.
    ///
    /// Not called when a fail-fast run aborts.
    fn on_batch_complete(&self, total_documents: usize, converted: usize) {
        let _ = (total_documents, converted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
