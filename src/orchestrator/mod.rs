//! Search orchestration
//!
//! Owns the session state (last response, in-flight flag, whether anything
//! has been searched yet) and moves it between idle, searching and
//! displayed as captured input is routed to the search service.

mod controller;
mod state;

pub use controller::SearchOrchestrator;
pub use state::{Phase, SessionState, View};
