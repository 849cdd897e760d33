use serde::{Deserialize, Serialize};
use std::fmt;

/// Account classification, derived from the id prefix and never stored
/// independently: an id starting with `s-` is a student, everything
/// else is a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Student,
    Company,
}

impl AccountType {
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        if id.starts_with("s-") {
            Self::Student
        } else {
            Self::Company
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Company => write!(f, "company"),
        }
    }
}

/// A stored account row. `password_hash` holds a salted argon2id hash;
/// it never leaves the store layer in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: String,
    pub email: String,
    pub account_type: String,
    #[serde(default)]
    pub name_and_surname: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    pub university_name: Option<String>,
    pub university_location: Option<String>,
}

/// Session shape of the signed-in user.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub account_type: AccountType,
    pub name: String,
}

impl User {
    #[must_use]
    pub fn from_record(record: &AccountRecord) -> Self {
        Self {
            id: record.id.clone(),
            account_type: AccountType::from_id(&record.id),
            name: record.name_and_surname.clone(),
        }
    }
}

/// Signup form.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name_and_surname: String,
    pub password: String,
}

/// Classification result for a signup email, before the password hash
/// and name are attached.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub account_type: AccountType,
    pub university_name: Option<String>,
    pub university_location: Option<String>,
}

/// A university reference row: rows of {name, country, list-of-domains}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct University {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub domains: Vec<String>,
}

/// The portion of an email after the first `@`, or `None` when the
/// address has no `@` at all.
#[must_use]
pub fn normalized_domain(email: &str) -> Option<&str> {
    email.split_once('@').map(|(_, domain)| domain)
}

/// The last two dot-delimited labels of a domain (`mail.example.edu`
/// -> `example.edu`). Used for the company-domain check only.
#[must_use]
pub fn registrable_domain(domain: &str) -> String {
    let labels: Vec<&str> = domain.split('.').collect();
    let start = labels.len().saturating_sub(2);
    labels[start..].join(".")
}

/// Every dot-delimited suffix of a domain, longest first:
/// `sub.example.edu` -> [`sub.example.edu`, `example.edu`, `edu`].
#[must_use]
pub fn domain_suffixes(domain: &str) -> Vec<String> {
    let labels: Vec<&str> = domain.split('.').collect();
    (0..labels.len()).map(|i| labels[i..].join(".")).collect()
}
