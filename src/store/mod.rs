//! Black-box interface to the hosted row store and its blob bucket.
//!
//! The session model only ever talks to the remote service through this
//! trait; the production implementation is [`crate::clients::SupabaseClient`],
//! tests substitute an in-memory fake.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AccountRecord, ApplicationRecord, OpportunityRecord, University};

/// Failures of a remote call, carried upward as a single error channel
/// with a human-readable message. Not-found is NOT an error; lookups
/// signal it with `Ok(None)` or an empty list.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Store rejected the request ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Failed to decode store response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// The entire opportunity table; search filters it client-side.
    async fn list_opportunities(&self) -> Result<Vec<OpportunityRecord>, StoreError>;

    async fn get_opportunity(&self, id: &str) -> Result<Option<OpportunityRecord>, StoreError>;

    async fn list_featured_opportunities(&self) -> Result<Vec<OpportunityRecord>, StoreError>;

    async fn insert_opportunity(
        &self,
        record: &OpportunityRecord,
    ) -> Result<OpportunityRecord, StoreError>;

    async fn find_accounts_by_email(&self, email: &str) -> Result<Vec<AccountRecord>, StoreError>;

    async fn get_account(&self, id: &str) -> Result<Option<AccountRecord>, StoreError>;

    async fn insert_account(&self, record: &AccountRecord) -> Result<AccountRecord, StoreError>;

    async fn insert_application(&self, record: &ApplicationRecord) -> Result<(), StoreError>;

    async fn list_universities(&self) -> Result<Vec<University>, StoreError>;

    /// Uploads an attachment to the blob bucket under a generated path.
    async fn upload_attachment(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError>;
}
