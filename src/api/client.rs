//! The request plumbing for the budget service API.

use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Error,
    api::models::{ApiEnvelope, BudgetDraft, TransactionPage},
    budget::{Budget, BudgetId},
    config::ClientConfig,
    feed::{FeedFilters, Page, PageFetcher},
};

/// A client for the budget service's REST API.
///
/// The client is cheap to clone and safe to share; it owns a connection
/// pool internally.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: HttpClient,
    base_url: String,
}

impl ApiClient {
    /// Create a client from the given configuration.
    ///
    /// # Errors
    /// Returns [Error::FetchFailed] if the underlying HTTP client cannot
    /// be constructed, e.g. when no TLS backend is available.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let http_client = HttpClient::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client for `base_url` with default settings.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch one page of the transaction listing matching `filters`.
    ///
    /// Page numbering starts at 1. The search filter is only sent when it
    /// is non-empty.
    ///
    /// # Errors
    /// Returns [Error::FetchFailed] on transport failures, [Error::Api]
    /// when the service rejects the request, or [Error::InvalidResponse]
    /// when the body cannot be decoded.
    pub async fn list_transactions(
        &self,
        page: u64,
        limit: u64,
        filters: &FeedFilters,
    ) -> Result<TransactionPage, Error> {
        let mut query = vec![
            ("page", page.to_string()),
            ("limit", limit.to_string()),
            ("month", filters.month.to_string()),
            ("year", filters.year.to_string()),
        ];

        if !filters.search.is_empty() {
            query.push(("search", filters.search.clone()));
        }

        self.get_json("/transactions", &query).await
    }

    /// List the budgets for the given month.
    ///
    /// # Errors
    /// Returns the same errors as [ApiClient::list_transactions].
    pub async fn list_budgets(&self, month: u8, year: i32) -> Result<Vec<Budget>, Error> {
        let query = [("month", month.to_string()), ("year", year.to_string())];

        self.get_json("/budgets", &query).await
    }

    /// Create a new budget on the service.
    ///
    /// # Errors
    /// Returns the same errors as [ApiClient::list_transactions].
    pub async fn create_budget(&self, draft: &BudgetDraft) -> Result<Budget, Error> {
        self.send_json(self.http_client.post(self.url("/budgets")), draft)
            .await
    }

    /// Replace the fields of an existing budget.
    ///
    /// # Errors
    /// Returns [Error::NotFound] when no budget has the given ID,
    /// otherwise the same errors as [ApiClient::list_transactions].
    pub async fn update_budget(&self, id: BudgetId, draft: &BudgetDraft) -> Result<Budget, Error> {
        let request = self.http_client.put(self.url(&format!("/budgets/{id}")));

        self.send_json(request, draft).await
    }

    /// Delete a budget.
    ///
    /// Transactions referencing the budget are left alone; the service
    /// detaches them.
    ///
    /// # Errors
    /// Returns [Error::NotFound] when no budget has the given ID,
    /// otherwise the same errors as [ApiClient::list_transactions].
    pub async fn delete_budget(&self, id: BudgetId) -> Result<(), Error> {
        let response = self
            .http_client
            .delete(self.url(&format!("/budgets/{id}")))
            .send()
            .await?;
        let response = check_status(response).await?;

        // Delete responses carry no payload, only the envelope itself.
        let envelope: ApiEnvelope<serde_json::Value> = response.json().await?;

        if !envelope.success {
            return Err(Error::Api(envelope.message));
        }

        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http_client
            .get(self.url(path))
            .query(query)
            .send()
            .await?;

        decode(response).await
    }

    async fn send_json<T, B>(&self, request: RequestBuilder, body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let response = request.json(body).send().await?;

        decode(response).await
    }
}

#[async_trait]
impl PageFetcher for ApiClient {
    async fn fetch_page(
        &self,
        page: u64,
        limit: u64,
        filters: &FeedFilters,
    ) -> Result<Page, Error> {
        let transaction_page = self.list_transactions(page, limit, filters).await?;

        Ok(Page {
            items: transaction_page.items,
            has_next_page: transaction_page.has_next_page,
        })
    }
}

/// Decode a response body through the service envelope.
async fn decode<T>(response: Response) -> Result<T, Error>
where
    T: DeserializeOwned,
{
    let response = check_status(response).await?;
    let envelope: ApiEnvelope<T> = response.json().await?;

    envelope.into_data()
}

/// Map HTTP error statuses onto the crate error taxonomy.
///
/// The service repeats its error description inside the envelope body even
/// for non-2xx statuses, so that message is preferred over the bare status
/// code when it can be extracted.
async fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body).unwrap_or_else(|| format!("HTTP {status}"));
        tracing::warn!(%status, "budget service rejected a request: {message}");

        return Err(Error::Api(message));
    }

    Ok(response)
}

/// Pull the `message` field out of an error body, if there is one.
fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(|message| message.to_string())
}

#[cfg(test)]
mod tests {
    use super::{ApiClient, extract_message};

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::with_base_url("http://localhost:8000/api/v1/");

        assert_eq!(client.url("/budgets"), "http://localhost:8000/api/v1/budgets");
    }

    #[test]
    fn extract_message_reads_the_envelope_message() {
        let got = extract_message(r#"{"success": false, "message": "limit must be positive"}"#);

        assert_eq!(got, Some("limit must be positive".to_string()));
    }

    #[test]
    fn extract_message_tolerates_non_json_bodies() {
        assert_eq!(extract_message("<html>bad gateway</html>"), None);
        assert_eq!(extract_message(r#"{"error": "no message field"}"#), None);
    }
}
