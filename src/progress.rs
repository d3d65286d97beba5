//! Progress-callback trait for per-page recognition events.
//!
//! Inject an [`Arc<dyn RecognitionProgressCallback>`] via
//! [`crate::config::RecognizeConfigBuilder::progress_callback`] to receive
//! real-time events as the pipeline slices and recognizes each page.
//!
//! Callbacks are the least-invasive integration point: callers can forward
//! events to a terminal progress bar, a log, or a job record without the
//! library knowing anything about how the host application communicates.

use std::sync::Arc;

/// Called by the recognition pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: a batch
/// driver may run documents on independent worker threads sharing one
/// callback.
pub trait RecognitionProgressCallback: Send + Sync {
    /// Called once after the document is opened, before any page is sliced.
    fn on_document_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page's first tile is rendered.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a tile's engine call returns (successfully or not).
    ///
    /// `chars` is the character count of the tile's filtered text;
    /// 0 for empty and failed tiles.
    fn on_tile_complete(&self, page_num: usize, tile_num: usize, chars: usize) {
        let _ = (page_num, tile_num, chars);
    }

    /// Called when a page has been fully processed.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, chars: usize) {
        let _ = (page_num, total_pages, chars);
    }

    /// Called once after all pages have been attempted.
    ///
    /// `failed_tiles` is the number of tiles that contributed empty text
    /// because their engine call failed.
    fn on_document_complete(&self, total_pages: usize, failed_tiles: usize) {
        let _ = (total_pages, failed_tiles);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RecognitionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in
/// [`crate::config::RecognizeConfig`].
pub type ProgressCallback = Arc<dyn RecognitionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        pages: AtomicUsize,
        tiles: AtomicUsize,
        chars: AtomicUsize,
    }

    impl RecognitionProgressCallback for TrackingCallback {
        fn on_tile_complete(&self, _page: usize, _tile: usize, chars: usize) {
            self.tiles.fetch_add(1, Ordering::SeqCst);
            self.chars.fetch_add(chars, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page: usize, _total: usize, _chars: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_document_start(3);
        cb.on_page_start(1, 3);
        cb.on_tile_complete(1, 1, 42);
        cb.on_page_complete(1, 3, 42);
        cb.on_document_complete(3, 0);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            pages: AtomicUsize::new(0),
            tiles: AtomicUsize::new(0),
            chars: AtomicUsize::new(0),
        };

        tracker.on_document_start(2);
        tracker.on_page_start(1, 2);
        tracker.on_tile_complete(1, 1, 100);
        tracker.on_tile_complete(1, 2, 50);
        tracker.on_page_complete(1, 2, 150);
        tracker.on_page_start(2, 2);
        tracker.on_tile_complete(2, 1, 0);
        tracker.on_page_complete(2, 2, 0);
        tracker.on_document_complete(2, 1);

        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.tiles.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.chars.load(Ordering::SeqCst), 150);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn RecognitionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_document_start(10);
        cb.on_page_complete(1, 10, 512);
    }
}
