//! The session and search model: one context object owning the current
//! user, the current opportunity, the in-memory search results, and the
//! university domain cache, mediating every call to the remote store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tokio::sync::RwLock;
use tokio::task;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{Config, SecurityConfig};
use crate::models::{
    AccountRecord, AccountType, ApplicationForm, ApplicationRecord, NewAccount, NewOpportunity,
    Opportunity, OpportunityRecord, OpportunitySummary, University, User, UserInfo,
    domain_suffixes, normalized_domain, registrable_domain,
};
use crate::store::RemoteStore;

/// Up to four optional predicates, each a case-insensitive substring
/// match. An absent predicate is vacuously true.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub location: Option<String>,
    /// Matches the title or any tag.
    pub title_or_keyword: Option<String>,
    pub field_of_study: Option<String>,
    pub opportunity_type: Option<String>,
}

impl SearchQuery {
    #[must_use]
    pub fn matches(&self, record: &OpportunityRecord) -> bool {
        let contains = |field: Option<&str>, needle: &Option<String>| {
            needle.as_ref().is_none_or(|n| {
                field
                    .unwrap_or("")
                    .to_lowercase()
                    .contains(&n.to_lowercase())
            })
        };

        let keyword_matches = self.title_or_keyword.as_ref().is_none_or(|needle| {
            let needle = needle.to_lowercase();
            record
                .title
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(&needle)
                || record
                    .tags
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle))
        });

        contains(record.location.as_deref(), &self.location)
            && keyword_matches
            && contains(record.field_of_study.as_deref(), &self.field_of_study)
            && contains(record.opportunity_type.as_deref(), &self.opportunity_type)
    }
}

#[derive(Debug, Default)]
struct SearchState {
    query: SearchQuery,
    results: Vec<OpportunitySummary>,
    page: usize,
}

/// Result of a search invocation. A fetch that resolves after a newer
/// search has started is discarded instead of overwriting it.
#[derive(Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    Updated(usize),
    Superseded,
}

pub struct Session {
    store: Arc<dyn RemoteStore>,
    security: SecurityConfig,
    company_domain: String,
    results_per_page: usize,
    user: RwLock<Option<User>>,
    opportunity: RwLock<Option<Opportunity>>,
    search: RwLock<SearchState>,
    universities: RwLock<Vec<University>>,
    search_generation: AtomicU64,
}

impl Session {
    #[must_use]
    pub fn new(store: Arc<dyn RemoteStore>, config: &Config) -> Self {
        Self {
            store,
            security: config.security.clone(),
            company_domain: config.accounts.company_domain.clone(),
            results_per_page: config.search.results_per_page,
            user: RwLock::new(None),
            opportunity: RwLock::new(None),
            search: RwLock::new(SearchState::default()),
            universities: RwLock::new(Vec::new()),
            search_generation: AtomicU64::new(0),
        }
    }

    /// Loads one opportunity by id, normalizes it, and makes it the
    /// currently viewed one. `Ok(None)` when no such row exists.
    pub async fn load_opportunity(&self, id: &str) -> Result<Option<Opportunity>> {
        let record = self
            .store
            .get_opportunity(id)
            .await
            .inspect_err(|e| error!("Failed to load opportunity {id}: {e}"))
            .context("Failed to load opportunity")?;

        let Some(record) = record else {
            return Ok(None);
        };

        let opportunity = Opportunity::from_record(record);
        *self.opportunity.write().await = Some(opportunity.clone());
        Ok(Some(opportunity))
    }

    /// Fetches the full opportunity set and filters it with a single
    /// linear scan; result order follows the backing fetch. Resets the
    /// page to 1. If a newer search started while this one was waiting
    /// on the store, its results are discarded.
    pub async fn load_search_results(&self, query: SearchQuery) -> Result<SearchOutcome> {
        let generation = self.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();

        let records = self
            .store
            .list_opportunities()
            .await
            .inspect_err(|e| error!("Search fetch failed: {e}"))
            .context("Failed to fetch opportunities")?;

        let results: Vec<OpportunitySummary> = records
            .iter()
            .filter(|record| query.matches(record))
            .map(|record| OpportunitySummary::from_record(record, now))
            .collect();

        let mut search = self.search.write().await;

        if self.search_generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding superseded search results");
            return Ok(SearchOutcome::Superseded);
        }

        let count = results.len();
        search.query = query;
        search.results = results;
        search.page = 1;

        debug!("Search matched {count} opportunities");
        Ok(SearchOutcome::Updated(count))
    }

    /// Sets the current page and returns its slice of the in-memory
    /// result list. A page past the end yields an empty slice, never an
    /// error; no bounds validation is done against the total.
    pub async fn search_results_page(&self, page: usize) -> Vec<OpportunitySummary> {
        let mut search = self.search.write().await;
        search.page = page;

        let start = page.saturating_sub(1) * self.results_per_page;
        let end = (page * self.results_per_page).min(search.results.len());

        if start >= search.results.len() {
            return Vec::new();
        }

        search.results[start..end].to_vec()
    }

    pub async fn current_page(&self) -> usize {
        self.search.read().await.page
    }

    pub async fn result_count(&self) -> usize {
        self.search.read().await.results.len()
    }

    /// Featured opportunities, normalized for display.
    pub async fn fetch_featured(&self) -> Result<Vec<Opportunity>> {
        let records = self
            .store
            .list_featured_opportunities()
            .await
            .inspect_err(|e| error!("Failed to fetch featured opportunities: {e}"))
            .context("Failed to fetch featured opportunities")?;

        if records.is_empty() {
            warn!("No featured opportunities in the store");
        }

        Ok(records
            .into_iter()
            .map(Opportunity::from_record)
            .collect())
    }

    /// The entire opportunity table, normalized for display.
    pub async fn fetch_all_opportunities(&self) -> Result<Vec<Opportunity>> {
        let records = self
            .store
            .list_opportunities()
            .await
            .inspect_err(|e| error!("Failed to fetch opportunities: {e}"))
            .context("Failed to fetch opportunities")?;

        Ok(records
            .into_iter()
            .map(Opportunity::from_record)
            .collect())
    }

    /// Publishes a new opportunity and makes the stored row the
    /// currently viewed one.
    pub async fn upload_opportunity(&self, new: NewOpportunity) -> Result<Opportunity> {
        let record = new.into_record(crate::constants::fallback::COMPANY);

        let stored = self
            .store
            .insert_opportunity(&record)
            .await
            .inspect_err(|e| error!("Failed to upload opportunity: {e}"))
            .context("Failed to upload opportunity")?;

        let opportunity = Opportunity::from_record(stored);
        info!("Opportunity uploaded: {}", opportunity.id);

        *self.opportunity.write().await = Some(opportunity.clone());
        Ok(opportunity)
    }

    /// Populates the university cache. Must run before email validation
    /// can recognize academic domains in a sign-up flow.
    pub async fn preload_university_domains(&self) -> Result<()> {
        let universities = self
            .store
            .list_universities()
            .await
            .inspect_err(|e| error!("Failed to preload university domains: {e}"))
            .context("Failed to preload university domains")?;

        info!("Preloaded {} university rows", universities.len());
        *self.universities.write().await = universities;
        Ok(())
    }

    pub async fn universities_cached(&self) -> bool {
        !self.universities.read().await.is_empty()
    }

    /// Tests every dot-delimited suffix of the email's domain against
    /// the cached university domains and the company domain. With an
    /// unpopulated cache only the company domain validates.
    pub async fn validate_email(&self, email: &str) -> bool {
        let Some(domain) = normalized_domain(email) else {
            debug!("Invalid email format: missing @");
            return false;
        };

        let universities = self.universities.read().await;

        domain_suffixes(domain).iter().any(|suffix| {
            *suffix == self.company_domain
                || universities
                    .iter()
                    .any(|university| university.domains.contains(suffix))
        })
    }

    /// Classifies a signup email. The company domain classifies as
    /// company with no university lookup; everything else is a student,
    /// with university name and country attached when a cached (or
    /// freshly fetched) university owns a suffix of the domain.
    pub async fn generate_user_info(&self, email: &str) -> Result<UserInfo> {
        let domain = normalized_domain(email)
            .with_context(|| format!("Email '{email}' has no domain part"))?;

        let is_company = registrable_domain(domain) == self.company_domain;
        let prefix = if is_company { "c-" } else { "s-" };

        let mut info = UserInfo {
            id: format!("{prefix}{}", Uuid::new_v4()),
            email: email.to_string(),
            account_type: if is_company {
                AccountType::Company
            } else {
                AccountType::Student
            },
            university_name: None,
            university_location: None,
        };

        if is_company {
            return Ok(info);
        }

        let universities = {
            let cached = self.universities.read().await;
            if cached.is_empty() {
                drop(cached);
                self.store
                    .list_universities()
                    .await
                    .inspect_err(|e| error!("University lookup failed: {e}"))
                    .context("Failed to look up universities")?
            } else {
                cached.clone()
            }
        };

        if let Some(university) = universities
            .iter()
            .find(|u| u.domains.iter().any(|d| domain.ends_with(d.as_str())))
        {
            info.university_name = Some(university.name.clone());
            info.university_location = Some(university.country.clone());
        }

        Ok(info)
    }

    /// Creates an account: classify the email, hash the password, store
    /// the row, and sign the new user in.
    pub async fn upload_account(&self, new: NewAccount) -> Result<User> {
        let info = self.generate_user_info(&new.email).await?;

        let password_hash = {
            let security = self.security.clone();
            let password = new.password;
            task::spawn_blocking(move || hash_password(&password, &security))
                .await
                .context("Password hashing task panicked")??
        };

        let record = AccountRecord {
            id: info.id,
            email: info.email,
            account_type: info.account_type.to_string(),
            name_and_surname: new.name_and_surname,
            password_hash,
            university_name: info.university_name,
            university_location: info.university_location,
        };

        let stored = self
            .store
            .insert_account(&record)
            .await
            .inspect_err(|e| error!("Failed to upload account: {e}"))
            .context("Failed to upload account")?;

        let user = User::from_record(&stored);
        info!("Account created: {} ({})", user.id, user.account_type);

        *self.user.write().await = Some(user.clone());
        Ok(user)
    }

    /// Verifies credentials against the account table. The first
    /// account whose stored hash matches signs in and becomes the
    /// session user; no match is `Ok(None)`, not an error.
    pub async fn verify_login(&self, email: &str, password: &str) -> Result<Option<User>> {
        let accounts = self
            .store
            .find_accounts_by_email(email)
            .await
            .inspect_err(|e| error!("Login lookup failed: {e}"))
            .context("Failed to verify login")?;

        for account in accounts {
            let hash = account.password_hash.clone();
            let candidate = password.to_string();

            // Argon2 verification is CPU-bound; keep it off the runtime.
            let verified = task::spawn_blocking(move || verify_password(&candidate, &hash))
                .await
                .context("Password verification task panicked")?;

            if verified {
                let user = User::from_record(&account);
                info!("User {} logged in", user.id);
                *self.user.write().await = Some(user.clone());
                return Ok(Some(user));
            }
        }

        Ok(None)
    }

    /// Refreshes the session user from the account table. `Ok(None)`
    /// when nobody is signed in or the row is gone.
    pub async fn get_user_details(&self) -> Result<Option<User>> {
        let id = match self.user.read().await.as_ref() {
            Some(user) => user.id.clone(),
            None => return Ok(None),
        };

        let account = self
            .store
            .get_account(&id)
            .await
            .inspect_err(|e| error!("Failed to fetch user details: {e}"))
            .context("Failed to fetch user details")?;

        let Some(account) = account else {
            return Ok(None);
        };

        let user = User::from_record(&account);
        *self.user.write().await = Some(user.clone());
        Ok(Some(user))
    }

    /// Resets the session to an empty user.
    pub async fn initialize(&self) {
        self.clear_user().await;
    }

    pub async fn logout(&self) {
        self.clear_user().await;
        info!("User logged out");
    }

    async fn clear_user(&self) {
        *self.user.write().await = None;
        debug!("User state cleared");
    }

    pub async fn is_logged_in(&self, required: Option<AccountType>) -> bool {
        match self.user.read().await.as_ref() {
            Some(user) => required.is_none_or(|t| user.account_type == t),
            None => false,
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn current_opportunity(&self) -> Option<Opportunity> {
        self.opportunity.read().await.clone()
    }

    /// Submits an application and uploads the attached CV, when there
    /// is one, under a generated blob path.
    pub async fn submit_application(&self, form: ApplicationForm) -> Result<String> {
        let record = ApplicationRecord {
            application_id: Uuid::new_v4().to_string(),
            user_id: form.user_id,
            opportunity_id: form.opportunity_id,
            application_date: Utc::now().to_rfc3339(),
        };

        self.store
            .insert_application(&record)
            .await
            .inspect_err(|e| error!("Failed to submit application: {e}"))
            .context("Failed to submit application")?;

        if let Some(cv) = form.cv {
            let path = format!("{}-{}", Uuid::new_v4(), cv.file_name);

            self.store
                .upload_attachment(&path, &cv.content_type, cv.bytes)
                .await
                .inspect_err(|e| error!("Failed to upload CV: {e}"))
                .context("Failed to upload CV")?;

            debug!("CV stored at {path}");
        }

        info!("Application {} submitted", record.application_id);
        Ok(record.application_id)
    }
}

/// Salted argon2id hash with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored hash. A malformed stored hash
/// verifies false rather than failing the login flow.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        warn!("Stored password hash is malformed");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
