//! Observable session state

use crate::search::SearchResponse;
use std::sync::Arc;

/// Where the session is in the search lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing searched yet
    Idle,
    /// A search is in flight; an earlier response may still be shown
    Searching,
    /// A response is on screen
    Displayed,
}

/// State owned by the orchestrator and published to subscribers
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub last_response: Option<Arc<SearchResponse>>,
    pub is_searching: bool,
    /// Set by the first completed search and never cleared
    pub has_searched_once: bool,
    /// `data:` URL of the last accepted image, cleared by other searches
    pub image_preview: Option<Arc<str>>,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        if self.is_searching {
            Phase::Searching
        } else if self.last_response.is_some() {
            Phase::Displayed
        } else {
            Phase::Idle
        }
    }

    /// Which collaborator should be on screen
    pub fn view(&self) -> View {
        if self.has_searched_once {
            View::Results {
                response: self.last_response.clone(),
                loading: self.is_searching,
            }
        } else {
            View::Gallery {
                loading: self.is_searching,
            }
        }
    }
}

/// What a front end should render
#[derive(Debug, Clone)]
pub enum View {
    /// Browse examples; shown only before the first search completes
    Gallery { loading: bool },
    /// Results of the most recent completed search
    Results {
        response: Option<Arc<SearchResponse>>,
        loading: bool,
    },
}
