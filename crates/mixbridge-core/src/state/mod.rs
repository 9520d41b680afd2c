//! Aggregated feedback state.

mod store;

pub use store::FeedbackStore;
