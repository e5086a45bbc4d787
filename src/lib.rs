//! Pocketbook is the client core for a personal budgeting app.
//!
//! This library owns the parts of the client with a real design contract:
//! the paginated transaction feed with single-flight "load more" fetching
//! ([feed]), drift-free monetary arithmetic ([money]), the transaction and
//! budget models mirrored from the remote store ([transaction], [budget]),
//! and a thin HTTP client for the budget service ([api]). Screens, theming
//! and navigation live in the app layer and consume this crate.

#![warn(missing_docs)]

pub mod api;
pub mod budget;
pub mod config;
pub mod feed;
pub mod money;
pub mod transaction;

/// The errors that may occur in the client core.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request to the budget service could not be completed.
    ///
    /// This covers transport-level failures such as connection refusals and
    /// timeouts. The feed cursor is left unchanged when a page fetch fails
    /// this way, so retrying re-requests the same page.
    #[error("the request to the budget service failed: {0}")]
    FetchFailed(String),

    /// The budget service answered with `success = false` in its response
    /// envelope, or with an HTTP error status.
    ///
    /// The message is the service's own description of the problem and is
    /// suitable for showing to the user.
    #[error("the budget service rejected the request: {0}")]
    Api(String),

    /// The response body could not be decoded, or the envelope was missing
    /// its `data` field on a successful response.
    #[error("could not decode the response from the budget service: {0}")]
    InvalidResponse(String),

    /// The requested resource was not found.
    ///
    /// Callers should check that the ID is correct and that the resource
    /// still exists, for example a budget that was deleted on another
    /// device.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the lock on the feed state.
    #[error("could not acquire the feed state lock")]
    StateLock,

    /// A month outside the range 1-12 was used to build feed filters or a
    /// budget.
    #[error("{0} is not a valid month, expected a value from 1 to 12")]
    InvalidMonth(u8),
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        if value.status() == Some(reqwest::StatusCode::NOT_FOUND) {
            Error::NotFound
        } else if value.is_decode() {
            Error::InvalidResponse(value.to_string())
        } else {
            Error::FetchFailed(value.to_string())
        }
    }
}
