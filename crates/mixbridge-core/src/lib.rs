//! mixbridge-core - Feedback aggregation and state management for the
//! mixbridge DAW control bridge.
//!
//! The workstation's OSC control surface is asynchronous,
//! connectionless, and untyped: commands are one-way datagrams, and
//! queries answer with an unordered burst of feedback with no
//! request/response correlation. This crate turns that into
//! synchronous, typed request/response operations:
//!
//! - **Classify** - wire address + arguments → tagged feedback variant
//! - **State** - the lock-protected store the listener folds feedback into
//! - **Listener** - background socket owner, the store's sole writer
//! - **Discovery** - emit a query, wait for quiescence, return a snapshot
//! - **Convert** - engineering units ⇄ the surface's normalized 0..1 range
//! - **Params** - cached parameter-name → positional-id mapping
//! - **Selection** - selected strip/plugin state machine
//! - **Surface** - the outbound command vocabulary
//!
//! # Architecture
//!
//! One listener thread owns the inbound socket and is the only writer
//! to the [`FeedbackStore`]; discovery and API callers read, and wait
//! on the store's condvar until a quiescence heuristic (or an explicit
//! end-of-list sentinel) says the feedback burst is done enough to
//! answer.

pub mod classify;
pub mod config;
pub mod convert;
pub mod discovery;
pub mod error;
pub mod listener;
pub mod model;
pub mod osc;
pub mod params;
pub mod selection;
pub mod state;
pub mod surface;

// Re-export main types for convenience
pub use classify::{classify, Classified, SelectionEvent};
pub use config::{Config, DiscoverySettings, HttpSettings, OscSettings};
pub use convert::{ParamKind, RealValue};
pub use discovery::DiscoveryOrchestrator;
pub use error::{Error, Result};
pub use listener::{FeedbackEvent, FeedbackListener};
pub use model::{
    PluginInfo, PluginKind, PluginParameter, Ssid, StripInfo, StripKind, StripSummary,
};
pub use osc::OscClient;
pub use params::ParamMapper;
pub use selection::{SelectionMode, SelectionState, SelectionTracker};
pub use state::FeedbackStore;
pub use surface::SurfaceClient;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_smoke() {
        let store = FeedbackStore::new();
        assert!(!store.has_strips());
        let tracker = SelectionTracker::new();
        assert!(!tracker.snapshot().is_valid());
        assert!(SurfaceClient::noop().is_noop());
    }
}
