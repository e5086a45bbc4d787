//! Serde models for the budget service's REST envelope.

use serde::{Deserialize, Serialize};

use crate::{Error, transaction::Transaction};

/// The envelope every budget service response is wrapped in.
///
/// The client consumes the envelope uninterpreted: `data` is handed to the
/// caller when `success` is true, and `message` becomes [Error::Api] when
/// it is false.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Whether the service considered the request successful.
    pub success: bool,
    /// The service's description of the outcome.
    #[serde(default)]
    pub message: String,
    /// The payload, present when `success` is true.
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload from the envelope.
    ///
    /// # Errors
    /// Returns [Error::Api] with the service's message when it reported
    /// failure, or [Error::InvalidResponse] when a successful envelope is
    /// missing its payload.
    pub fn into_data(self) -> Result<T, Error> {
        if !self.success {
            return Err(Error::Api(self.message));
        }

        self.data.ok_or_else(|| {
            Error::InvalidResponse("the response envelope is missing its data field".to_string())
        })
    }
}

/// One page of the paginated transaction listing.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    /// The transactions on this page, in feed order.
    pub items: Vec<Transaction>,
    /// Whether the service has more pages after this one.
    pub has_next_page: bool,
}

/// The fields of a budget the client can create or update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetDraft {
    /// The category the budget covers.
    pub category: String,
    /// The spending limit for the month.
    pub limit: f64,
    /// The month the budget applies to (1-12).
    pub month: u8,
    /// The year the budget applies to.
    pub year: i32,
}
