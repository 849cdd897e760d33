pub mod account;
pub mod application;
pub mod opportunity;

pub use account::{
    AccountRecord, AccountType, NewAccount, University, User, UserInfo, domain_suffixes,
    normalized_domain, registrable_domain,
};
pub use application::{ApplicationForm, ApplicationRecord, CvFile};
pub use opportunity::{
    NewOpportunity, Opportunity, OpportunityRecord, OpportunitySummary, remaining_days,
};
