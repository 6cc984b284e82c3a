//! Reqwest-backed Elasticsearch adapter.
//!
//! Owns transport details only: the document `PUT`, status mapping and the
//! client timeout. The document body is the transaction's own serialized
//! form.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, instrument};

use emoney_core::{ServiceError, Transaction};

use super::{SearchIndex, TRANSACTIONS_INDEX};

#[derive(Debug, Clone)]
pub struct ElasticsearchIndex {
    client: Client,
    base_url: Url,
    index: String,
}

impl ElasticsearchIndex {
    /// # Errors
    ///
    /// Returns an error when `base_url` does not parse or the reqwest client
    /// cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ServiceError::infrastructure("elasticsearch url", e))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::infrastructure("elasticsearch client", e))?;
        Ok(Self {
            client,
            base_url,
            index: TRANSACTIONS_INDEX.to_string(),
        })
    }

    fn document_url(&self, id: &str) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ServiceError::infrastructure("elasticsearch url", "base url cannot carry a path")
            })?
            .pop_if_empty()
            .extend([self.index.as_str(), "_doc", id]);
        Ok(url)
    }
}

#[async_trait]
impl SearchIndex for ElasticsearchIndex {
    #[instrument(skip(self, tx), fields(transaction_id = %tx.id), err)]
    async fn index_transaction(&self, tx: &Transaction) -> Result<(), ServiceError> {
        let url = self.document_url(&tx.id.to_string())?;
        let response = self
            .client
            .put(url)
            .json(tx)
            .send()
            .await
            .map_err(|e| ServiceError::infrastructure("elasticsearch index", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::infrastructure(
                "elasticsearch index",
                format!("status {status}: {body}"),
            ));
        }
        debug!(%status, "transaction indexed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_url_joins_index_and_id() {
        let index = ElasticsearchIndex::new("http://localhost:9200/", Duration::from_secs(1)).unwrap();
        let url = index.document_url("abc").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9200/transactions/_doc/abc");

        let prefixed = ElasticsearchIndex::new("http://search:9200/es", Duration::from_secs(1)).unwrap();
        assert_eq!(
            prefixed.document_url("abc").unwrap().as_str(),
            "http://search:9200/es/transactions/_doc/abc"
        );
    }

    #[test]
    fn unparsable_base_url_is_rejected() {
        assert!(ElasticsearchIndex::new("not a url", Duration::from_secs(1)).is_err());
    }
}
