//! State module for tracking crawl progress
//!
//! This module provides the small state machines the coordinator walks
//! through while harvesting a forum section.
//!
//! # Components
//!
//! - `PageState`: Tracks one listing page (pending, posts listed, done)
//! - `PostOutcome`: What happened to a single listed post

mod page_state;
mod post_outcome;

// Re-export main types
pub use page_state::PageState;
pub use post_outcome::PostOutcome;
