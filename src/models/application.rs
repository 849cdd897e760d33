use serde::{Deserialize, Serialize};

/// A stored application row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub application_id: String,
    pub user_id: String,
    pub opportunity_id: String,
    /// RFC 3339 UTC submission time.
    pub application_date: String,
}

/// An uploaded CV attachment.
#[derive(Debug, Clone)]
pub struct CvFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Submission payload: who is applying, to what, with an optional CV.
#[derive(Debug, Clone)]
pub struct ApplicationForm {
    pub user_id: String,
    pub opportunity_id: String,
    pub cv: Option<CvFile>,
}
