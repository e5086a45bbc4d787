//! The HTTP client for the budget service.
//!
//! Every response from the service arrives wrapped in the envelope
//! `{ success, message, data }`; this module decodes the envelope and maps
//! it onto the crate's [Error](crate::Error) taxonomy.

mod client;
mod models;

pub use client::ApiClient;
pub use models::{ApiEnvelope, BudgetDraft, TransactionPage};
