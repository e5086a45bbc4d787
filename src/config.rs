//! Configuration for the budget service client.

use std::time::Duration;

/// The configuration for connecting to the budget service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The base URL of the budget service API.
    pub base_url: String,
    /// The number of transactions to fetch per feed page.
    pub page_size: u64,
    /// How long to wait for the service before giving up on a request.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            page_size: 10,
            timeout: Duration::from_secs(30),
        }
    }
}
