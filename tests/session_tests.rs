//! Integration tests for the session model against an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use oppboard::config::Config;
use oppboard::models::{
    AccountRecord, AccountType, ApplicationForm, ApplicationRecord, CvFile, NewAccount,
    OpportunityRecord, University,
};
use oppboard::session::{SearchOutcome, SearchQuery, Session};
use oppboard::store::{RemoteStore, StoreError};

#[derive(Default)]
struct FakeStore {
    opportunities: Mutex<Vec<OpportunityRecord>>,
    accounts: Mutex<Vec<AccountRecord>>,
    applications: Mutex<Vec<ApplicationRecord>>,
    universities: Vec<University>,
    uploads: Mutex<Vec<(String, String, usize)>>,
    /// Per-call delays for `list_opportunities`, popped front-first.
    list_delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn list_opportunities(&self) -> Result<Vec<OpportunityRecord>, StoreError> {
        let delay = {
            let mut delays = self.list_delays.lock().await;
            if delays.is_empty() {
                None
            } else {
                Some(delays.remove(0))
            }
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(self.opportunities.lock().await.clone())
    }

    async fn get_opportunity(&self, id: &str) -> Result<Option<OpportunityRecord>, StoreError> {
        Ok(self
            .opportunities
            .lock()
            .await
            .iter()
            .find(|o| o.id.as_deref() == Some(id))
            .cloned())
    }

    async fn list_featured_opportunities(&self) -> Result<Vec<OpportunityRecord>, StoreError> {
        Ok(self
            .opportunities
            .lock()
            .await
            .iter()
            .filter(|o| o.featured)
            .cloned()
            .collect())
    }

    async fn insert_opportunity(
        &self,
        record: &OpportunityRecord,
    ) -> Result<OpportunityRecord, StoreError> {
        self.opportunities.lock().await.push(record.clone());
        Ok(record.clone())
    }

    async fn find_accounts_by_email(&self, email: &str) -> Result<Vec<AccountRecord>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .await
            .iter()
            .filter(|a| a.email == email)
            .cloned()
            .collect())
    }

    async fn get_account(&self, id: &str) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self
            .accounts
            .lock()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn insert_account(&self, record: &AccountRecord) -> Result<AccountRecord, StoreError> {
        self.accounts.lock().await.push(record.clone());
        Ok(record.clone())
    }

    async fn insert_application(&self, record: &ApplicationRecord) -> Result<(), StoreError> {
        self.applications.lock().await.push(record.clone());
        Ok(())
    }

    async fn list_universities(&self) -> Result<Vec<University>, StoreError> {
        Ok(self.universities.clone())
    }

    async fn upload_attachment(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StoreError> {
        self.uploads
            .lock()
            .await
            .push((path.to_string(), content_type.to_string(), bytes.len()));
        Ok(())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.search.results_per_page = 10;
    // Cheap argon2 params so account tests stay fast.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

fn opportunity(id: &str, title: &str, location: &str, kind: &str) -> OpportunityRecord {
    OpportunityRecord {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        location: Some(location.to_string()),
        opportunity_type: Some(kind.to_string()),
        field_of_study: Some("Computer Science".to_string()),
        ..Default::default()
    }
}

fn session_with(store: FakeStore) -> Session {
    Session::new(Arc::new(store), &test_config())
}

#[tokio::test]
async fn empty_query_returns_every_record() {
    let mut store = FakeStore::default();
    *store.opportunities.get_mut() = vec![
        opportunity("1", "A", "Berlin", "Internship"),
        opportunity("2", "B", "Zagreb", "Thesis"),
        OpportunityRecord::default(),
    ];

    let session = session_with(store);
    let outcome = session
        .load_search_results(SearchQuery::default())
        .await
        .unwrap();

    assert_eq!(outcome, SearchOutcome::Updated(3));
    assert_eq!(session.result_count().await, 3);
    assert_eq!(session.current_page().await, 1);
}

#[tokio::test]
async fn predicates_combine_with_and() {
    let mut store = FakeStore::default();
    *store.opportunities.get_mut() = vec![
        opportunity("1", "Backend Intern", "Berlin", "Internship"),
        opportunity("2", "Backend Intern", "Zagreb", "Internship"),
        opportunity("3", "Thesis Project", "Berlin", "Thesis"),
    ];

    let session = session_with(store);
    let outcome = session
        .load_search_results(SearchQuery {
            location: Some("berlin".to_string()),
            opportunity_type: Some("intern".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(outcome, SearchOutcome::Updated(1));
    let page = session.search_results_page(1).await;
    assert_eq!(page[0].id, "1");
}

#[tokio::test]
async fn keyword_matches_tags_as_well_as_titles() {
    let mut store = FakeStore::default();
    let mut tagged = opportunity("1", "Backend Intern", "Berlin", "Internship");
    tagged.tags = Some(vec!["Rust".to_string(), "Tokio".to_string()]);
    *store.opportunities.get_mut() = vec![
        tagged,
        opportunity("2", "Rust Engineer", "Zagreb", "Internship"),
        opportunity("3", "Go Engineer", "Zagreb", "Internship"),
    ];

    let session = session_with(store);
    let outcome = session
        .load_search_results(SearchQuery {
            title_or_keyword: Some("rust".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(outcome, SearchOutcome::Updated(2));
}

#[tokio::test]
async fn pagination_slices_and_never_errors() {
    let mut store = FakeStore::default();
    *store.opportunities.get_mut() = (0..25)
        .map(|i| opportunity(&format!("{i}"), &format!("Job {i}"), "X", "Internship"))
        .collect();

    let session = session_with(store);
    session
        .load_search_results(SearchQuery::default())
        .await
        .unwrap();

    assert_eq!(session.search_results_page(1).await.len(), 10);
    assert_eq!(session.search_results_page(3).await.len(), 5);
    assert_eq!(session.current_page().await, 3);

    // Pages past the end are empty slices, not errors.
    assert!(session.search_results_page(4).await.is_empty());
    assert!(session.search_results_page(100).await.is_empty());
}

#[tokio::test]
async fn search_preserves_fetch_order_and_resets_page() {
    let mut store = FakeStore::default();
    *store.opportunities.get_mut() = vec![
        opportunity("b", "B", "X", "Internship"),
        opportunity("a", "A", "X", "Internship"),
        opportunity("c", "C", "X", "Internship"),
    ];

    let session = session_with(store);
    session
        .load_search_results(SearchQuery::default())
        .await
        .unwrap();
    session.search_results_page(2).await;

    session
        .load_search_results(SearchQuery::default())
        .await
        .unwrap();
    assert_eq!(session.current_page().await, 1);

    let ids: Vec<String> = session
        .search_results_page(1)
        .await
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
}

#[tokio::test]
async fn stale_search_results_are_discarded() {
    let mut store = FakeStore::default();
    *store.opportunities.get_mut() = vec![opportunity("1", "A", "X", "Internship")];
    // First fetch resolves late, second immediately.
    *store.list_delays.get_mut() = vec![Duration::from_millis(50), Duration::ZERO];

    let session = session_with(store);

    let slow = session.load_search_results(SearchQuery {
        location: Some("nowhere".to_string()),
        ..Default::default()
    });
    let fast = session.load_search_results(SearchQuery::default());

    let (slow_outcome, fast_outcome) = tokio::join!(slow, fast);

    assert_eq!(slow_outcome.unwrap(), SearchOutcome::Superseded);
    assert_eq!(fast_outcome.unwrap(), SearchOutcome::Updated(1));

    // The winning (newer) search owns the committed results.
    assert_eq!(session.result_count().await, 1);
}

#[tokio::test]
async fn load_opportunity_normalizes_sparse_rows() {
    let mut store = FakeStore::default();
    *store.opportunities.get_mut() = vec![OpportunityRecord {
        id: Some("sparse".to_string()),
        ..Default::default()
    }];

    let session = session_with(store);
    let opportunity = session.load_opportunity("sparse").await.unwrap().unwrap();

    assert_eq!(opportunity.title, "Untitled Opportunity");
    assert_eq!(opportunity.deadline, "No deadline provided");
    assert!(opportunity.tags.is_empty());

    assert!(session.load_opportunity("missing").await.unwrap().is_none());
    assert_eq!(session.current_opportunity().await.unwrap().id, "sparse");
}

#[tokio::test]
async fn featured_fetch_returns_only_flagged_rows() {
    let mut store = FakeStore::default();
    let mut featured = opportunity("1", "Featured Job", "X", "Internship");
    featured.featured = true;
    *store.opportunities.get_mut() = vec![featured, opportunity("2", "Plain Job", "X", "Thesis")];

    let session = session_with(store);
    let results = session.fetch_featured().await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Featured Job");
}

#[tokio::test]
async fn email_validation_needs_populated_cache() {
    let store = FakeStore {
        universities: vec![University {
            name: "Example University".to_string(),
            country: "Croatia".to_string(),
            domains: vec!["example.edu".to_string()],
        }],
        ..Default::default()
    };
    let session = session_with(store);

    // Unpopulated cache: only the company domain validates.
    assert!(!session.validate_email("a@sub.example.edu").await);
    assert!(session.validate_email("a@company.com").await);
    assert!(!session.universities_cached().await);

    session.preload_university_domains().await.unwrap();
    assert!(session.universities_cached().await);

    // Every dot-delimited suffix is tested against the cache.
    assert!(session.validate_email("a@sub.example.edu").await);
    assert!(session.validate_email("a@example.edu").await);
    assert!(!session.validate_email("a@other.edu").await);
    assert!(!session.validate_email("no-at-sign").await);
}

#[tokio::test]
async fn signup_classifies_company_and_student_emails() {
    let store = FakeStore {
        universities: vec![University {
            name: "Example University".to_string(),
            country: "Croatia".to_string(),
            domains: vec!["example.edu".to_string()],
        }],
        ..Default::default()
    };
    let session = session_with(store);

    let company = session.generate_user_info("boss@company.com").await.unwrap();
    assert!(company.id.starts_with("c-"));
    assert_eq!(company.account_type, AccountType::Company);
    assert!(company.university_name.is_none());

    let student = session
        .generate_user_info("a@mail.example.edu")
        .await
        .unwrap();
    assert!(student.id.starts_with("s-"));
    assert_eq!(student.account_type, AccountType::Student);
    assert_eq!(student.university_name.as_deref(), Some("Example University"));
    assert_eq!(student.university_location.as_deref(), Some("Croatia"));

    // Unknown domains still classify as students, just without a university.
    let unknown = session.generate_user_info("a@unknown.org").await.unwrap();
    assert!(unknown.id.starts_with("s-"));
    assert!(unknown.university_name.is_none());
}

#[tokio::test]
async fn login_round_trip_updates_session_user() {
    let session = session_with(FakeStore::default());

    let created = session
        .upload_account(NewAccount {
            email: "boss@company.com".to_string(),
            name_and_surname: "Boss Person".to_string(),
            password: "hunter2".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(created.account_type, AccountType::Company);
    assert!(session.is_logged_in(Some(AccountType::Company)).await);

    session.logout().await;
    assert!(!session.is_logged_in(None).await);

    // Wrong password: a null result, not an error.
    let rejected = session
        .verify_login("boss@company.com", "wrong")
        .await
        .unwrap();
    assert!(rejected.is_none());
    assert!(!session.is_logged_in(None).await);

    let user = session
        .verify_login("boss@company.com", "hunter2")
        .await
        .unwrap()
        .expect("valid credentials should match");
    assert_eq!(user.id, created.id);
    assert!(session.is_logged_in(Some(AccountType::Company)).await);
    assert!(!session.is_logged_in(Some(AccountType::Student)).await);

    let refreshed = session.get_user_details().await.unwrap().unwrap();
    assert_eq!(refreshed.name, "Boss Person");
}

#[tokio::test]
async fn login_with_unknown_email_is_none() {
    let session = session_with(FakeStore::default());
    let result = session.verify_login("ghost@company.com", "pw").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn application_submission_inserts_row_and_uploads_cv() {
    let store = Arc::new(FakeStore::default());
    let session = Session::new(store.clone(), &test_config());

    let application_id = session
        .submit_application(ApplicationForm {
            user_id: "s-1".to_string(),
            opportunity_id: "op-1".to_string(),
            cv: Some(CvFile {
                file_name: "cv.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: vec![1, 2, 3],
            }),
        })
        .await
        .unwrap();

    let applications = store.applications.lock().await;
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0].application_id, application_id);
    assert_eq!(applications[0].user_id, "s-1");
    assert_eq!(applications[0].opportunity_id, "op-1");
    assert!(
        chrono::DateTime::parse_from_rfc3339(&applications[0].application_date).is_ok(),
        "submission time must be RFC 3339"
    );

    let uploads = store.uploads.lock().await;
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].0.ends_with("-cv.pdf"));
    assert_eq!(uploads[0].1, "application/pdf");
    assert_eq!(uploads[0].2, 3);
}

#[tokio::test]
async fn application_without_cv_skips_upload() {
    let store = Arc::new(FakeStore::default());
    let session = Session::new(store.clone(), &test_config());

    session
        .submit_application(ApplicationForm {
            user_id: "s-1".to_string(),
            opportunity_id: "op-1".to_string(),
            cv: None,
        })
        .await
        .unwrap();

    assert_eq!(store.applications.lock().await.len(), 1);
    assert!(store.uploads.lock().await.is_empty());
}

#[tokio::test]
async fn upload_opportunity_splits_list_fields() {
    let store = Arc::new(FakeStore::default());
    let session = Session::new(store.clone(), &test_config());

    let new = oppboard::models::NewOpportunity {
        title: "QA Intern".to_string(),
        tags: "a, b".to_string(),
        qualifications_and_requirements: "x; y".to_string(),
        ..Default::default()
    };

    let opportunity = session.upload_opportunity(new).await.unwrap();
    assert_eq!(opportunity.tags, vec!["a", "b"]);
    assert_eq!(opportunity.qualifications, vec!["x", "y"]);

    // The stored row carries the split lists too.
    let rows = store.opportunities.lock().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].tags.as_deref(),
        Some(&["a".to_string(), "b".to_string()][..])
    );

    // Publishing makes the stored row the currently viewed opportunity.
    assert_eq!(
        session.current_opportunity().await.unwrap().id,
        opportunity.id
    );
}
