//! Row persistence for form submissions.
//!
//! The managed database exposes a PostgREST style API: one `POST` per row to
//! `{url}/rest/v1/{table}`. A successful insert is the source of truth for a
//! submission; notification happens afterwards and may fail independently.

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::config::DatabaseConfig;
use crate::services::{check_status, UpstreamError};

/// Inserts one row into a named table.
pub trait RowStore: Send + Sync {
    fn insert<'a>(&'a self, table: &'a str, row: Value) -> BoxFuture<'a, Result<(), UpstreamError>>;
}

/// REST client for the managed database.
#[derive(Clone)]
pub struct RestRowStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestRowStore {
    /// `None` when no database URL is configured.
    pub fn from_config(config: &DatabaseConfig, client: reqwest::Client) -> Option<Self> {
        let base_url = config.url.as_ref()?.trim_end_matches('/').to_string();
        Some(Self {
            client,
            base_url,
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

impl RowStore for RestRowStore {
    fn insert<'a>(&'a self, table: &'a str, row: Value) -> BoxFuture<'a, Result<(), UpstreamError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.table_url(table))
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key)
                .header("Prefer", "return=minimal")
                .json(&row)
                .send()
                .await?;
            check_status(response).await?;
            tracing::debug!(table = %table, "Row inserted");
            Ok(())
        })
    }
}

/// Fallback store that only logs rows. Used when no database is configured.
#[derive(Debug, Default, Clone)]
pub struct LogRowStore;

impl RowStore for LogRowStore {
    fn insert<'a>(&'a self, table: &'a str, row: Value) -> BoxFuture<'a, Result<(), UpstreamError>> {
        Box::pin(async move {
            tracing::info!(table = %table, row = %row, "Submission received (no database configured)");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_url() {
        let config = DatabaseConfig::default();
        assert!(RestRowStore::from_config(&config, reqwest::Client::new()).is_none());
    }

    #[test]
    fn test_table_url_trims_slash() {
        let config = DatabaseConfig {
            url: Some("https://db.example.co/".to_string()),
            ..DatabaseConfig::default()
        };
        let store = RestRowStore::from_config(&config, reqwest::Client::new()).unwrap();
        assert_eq!(
            store.table_url("general_enquiries"),
            "https://db.example.co/rest/v1/general_enquiries"
        );
    }

    #[tokio::test]
    async fn test_log_store_accepts_rows() {
        let result = LogRowStore
            .insert("customer_feedback", serde_json::json!({ "name": "Asha" }))
            .await;
        assert!(result.is_ok());
    }
}
