//! The paginated transaction feed.
//!
//! This module contains everything related to feeding transactions to a
//! screen one page at a time:
//! - [FeedFilters], the key identifying one feed
//! - [PageFetcher], the seam to the backend's paginated listing call
//! - [FeedCoordinator], which serializes "load more" requests and
//!   accumulates the fetched pages

mod coordinator;
mod filters;

pub use coordinator::{FeedCoordinator, FeedStatus, LoadOutcome, Page, PageFetcher};
pub use filters::FeedFilters;
