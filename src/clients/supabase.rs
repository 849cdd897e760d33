use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::config::StoreConfig;
use crate::constants::tables;
use crate::models::{AccountRecord, ApplicationRecord, OpportunityRecord, University};
use crate::store::{RemoteStore, StoreError};

/// Build an HTTP client with a request timeout for store calls. The
/// client is reused across all requests to enable connection pooling.
fn build_http_client(timeout_seconds: u64) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Oppboard/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))
}

/// REST client for a Supabase-style row store: PostgREST row access
/// under `/rest/v1` and blob storage under `/storage/v1`.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: Url,
    anon_key: String,
    bucket: String,
}

impl SupabaseClient {
    pub fn new(config: &StoreConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.url)
            .map_err(|e| anyhow::anyhow!("Invalid store URL '{}': {e}", config.url))?;

        Ok(Self {
            client: build_http_client(config.request_timeout_seconds.into())?,
            base_url,
            anon_key: config.anon_key.clone(),
            bucket: config.attachment_bucket.clone(),
        })
    }

    fn rest_url(&self, table: &str, filters: &[(&str, &str)]) -> String {
        let mut url = format!("{}rest/v1/{}?select=*", self.base_url, table);

        for (column, value) in filters {
            url.push_str(&format!("&{column}=eq.{}", urlencoding::encode(value)));
        }

        url
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", &self.anon_key))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Service {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, &str)],
    ) -> Result<Vec<T>, StoreError> {
        let url = self.rest_url(table, filters);
        debug!("Store select: {url}");

        let response = self.authorized(self.client.get(&url)).send().await?;
        Self::decode(response).await
    }

    /// Inserts one row and returns the stored representation.
    async fn insert_returning<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        record: &T,
    ) -> Result<T, StoreError> {
        let url = format!("{}rest/v1/{}", self.base_url, table);
        debug!("Store insert: {url}");

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(&[record])
            .send()
            .await?;

        let mut rows: Vec<T> = Self::decode(response).await?;

        if rows.is_empty() {
            return Err(StoreError::Service {
                status: 500,
                message: format!("Insert into '{table}' returned no rows"),
            });
        }

        Ok(rows.remove(0))
    }

    async fn insert<T: Serialize + Sync>(&self, table: &str, record: &T) -> Result<(), StoreError> {
        let url = format!("{}rest/v1/{}", self.base_url, table);
        debug!("Store insert: {url}");

        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=minimal")
            .json(&[record])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Service {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl RemoteStore for SupabaseClient {
    async fn list_opportunities(&self) -> Result<Vec<OpportunityRecord>, StoreError> {
        self.select(tables::OPPORTUNITIES, &[]).await
    }

    async fn get_opportunity(&self, id: &str) -> Result<Option<OpportunityRecord>, StoreError> {
        let mut rows: Vec<OpportunityRecord> =
            self.select(tables::OPPORTUNITIES, &[("id", id)]).await?;

        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    async fn list_featured_opportunities(&self) -> Result<Vec<OpportunityRecord>, StoreError> {
        self.select(tables::OPPORTUNITIES, &[("featured", "true")])
            .await
    }

    async fn insert_opportunity(
        &self,
        record: &OpportunityRecord,
    ) -> Result<OpportunityRecord, StoreError> {
        self.insert_returning(tables::OPPORTUNITIES, record).await
    }

    async fn find_accounts_by_email(&self, email: &str) -> Result<Vec<AccountRecord>, StoreError> {
        self.select(tables::ACCOUNTS, &[("email", email)]).await
    }

    async fn get_account(&self, id: &str) -> Result<Option<AccountRecord>, StoreError> {
        let mut rows: Vec<AccountRecord> = self.select(tables::ACCOUNTS, &[("id", id)]).await?;

        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    async fn insert_account(&self, record: &AccountRecord) -> Result<AccountRecord, StoreError> {
        self.insert_returning(tables::ACCOUNTS, record).await
    }

    async fn insert_application(&self, record: &ApplicationRecord) -> Result<(), StoreError> {
        self.insert(tables::APPLICATIONS, record).await
    }

    async fn list_universities(&self) -> Result<Vec<University>, StoreError> {
        self.select(tables::UNIVERSITY_DOMAINS, &[]).await
    }

    async fn upload_attachment(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        let url = format!("{}storage/v1/object/{}/{}", self.base_url, self.bucket, path);
        debug!("Blob upload: {url}");

        let response = self
            .authorized(self.client.post(&url))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Service {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
