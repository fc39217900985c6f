//! Routes captured input to the search service and tracks session state

use super::state::{SessionState, View};
use crate::capture::{capture_text, ImageCapture, ImageFile};
use crate::error::CaptureError;
use crate::notify::{Notice, Notifier};
use crate::search::{SearchQuery, SearchResponse, SearchService, SearchType};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Top-level search controller.
///
/// Overlapping searches are neither cancelled nor queued: each one writes
/// its response when it resolves, so the last to resolve is what stays on
/// screen, regardless of submission order.
pub struct SearchOrchestrator {
    service: Arc<dyn SearchService>,
    notifier: Arc<dyn Notifier>,
    images: ImageCapture,
    state: watch::Sender<SessionState>,
    in_flight: AtomicUsize,
}

impl SearchOrchestrator {
    pub fn new(service: Arc<dyn SearchService>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            service,
            notifier,
            images: ImageCapture::default(),
            state,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Use a custom image validator
    pub fn with_image_capture(mut self, images: ImageCapture) -> Self {
        self.images = images;
        self
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> View {
        self.state.borrow().view()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Search for typed text
    pub async fn search_text(&self, input: &str) -> Result<Arc<SearchResponse>, CaptureError> {
        self.submit(capture_text(input).map(SearchQuery::Text)).await
    }

    /// Validate an image and search with it.
    ///
    /// An accepted image's preview is published on the state before the
    /// search starts.
    pub async fn search_image(&self, file: ImageFile) -> Result<Arc<SearchResponse>, CaptureError> {
        let captured = self.images.capture(file).map(|image| {
            debug!("Image preview ready ({} bytes)", image.preview.len());
            let preview: Arc<str> = image.preview.into();
            self.state.send_modify(|s| s.image_preview = Some(preview));
            SearchQuery::Image(image.file)
        });
        self.submit(captured).await
    }

    /// Read an image file from disk and search with it
    pub async fn search_image_path(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<Arc<SearchResponse>, CaptureError> {
        match self.images.open(path).await {
            Ok(file) => self.search_image(file).await,
            Err(e) => self.submit(Err(e)).await,
        }
    }

    /// Run a search for a capture result.
    ///
    /// A capture error is reported to the notifier and returned; state is
    /// left untouched and no search is made.
    pub async fn submit(
        &self,
        captured: Result<SearchQuery, CaptureError>,
    ) -> Result<Arc<SearchResponse>, CaptureError> {
        match captured {
            Ok(query) => Ok(self.dispatch(query).await),
            Err(e) => {
                info!("Capture rejected: {}", e);
                self.notifier.notify(Notice::error(e.to_string()));
                Err(e)
            }
        }
    }

    async fn dispatch(&self, query: SearchQuery) -> Arc<SearchResponse> {
        let search_type = query.search_type();
        if search_type != SearchType::Image {
            self.state.send_if_modified(|s| s.image_preview.take().is_some());
        }
        let search = InFlight::begin(self);

        let response = Arc::new(self.service.search(&query).await);
        search.complete(response.clone());

        match search_type {
            SearchType::Voice => self
                .notifier
                .notify(Notice::success("Voice search processed successfully")),
            SearchType::Image => self
                .notifier
                .notify(Notice::success("Image search processed successfully")),
            SearchType::Text => {}
        }

        response
    }
}

/// Tracks one outstanding search.
///
/// `is_searching` stays set while any search is outstanding. A search
/// dropped before completing still gives up its slot.
struct InFlight<'a> {
    orchestrator: &'a SearchOrchestrator,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn begin(orchestrator: &'a SearchOrchestrator) -> Self {
        orchestrator.in_flight.fetch_add(1, Ordering::SeqCst);
        orchestrator.state.send_modify(|s| s.is_searching = true);
        Self {
            orchestrator,
            done: false,
        }
    }

    fn finish(&mut self, response: Option<Arc<SearchResponse>>) {
        if self.done {
            return;
        }
        self.done = true;

        let remaining = self.orchestrator.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        self.orchestrator.state.send_modify(|s| {
            if let Some(response) = response {
                s.last_response = Some(response);
                s.has_searched_once = true;
            }
            s.is_searching = remaining > 0;
        });
    }

    fn complete(mut self, response: Arc<SearchResponse>) {
        self.finish(Some(response));
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.finish(None);
    }
}
