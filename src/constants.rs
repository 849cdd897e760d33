pub const DEFAULT_RESULTS_PER_PAGE: usize = 10;

pub const DEFAULT_COMPANY_DOMAIN: &str = "company.com";

pub mod tables {

    pub const OPPORTUNITIES: &str = "opportunities";

    pub const ACCOUNTS: &str = "accounts";

    pub const APPLICATIONS: &str = "applications";

    pub const UNIVERSITY_DOMAINS: &str = "world_universities_and_domains";
}

/// Placeholder values substituted for fields missing from stored rows.
/// Normalization must never fail, whatever the row looks like.
pub mod fallback {

    pub const TYPE: &str = "Unknown Type";

    pub const FIELD_OF_STUDY: &str = "General";

    pub const TITLE: &str = "Untitled Opportunity";

    pub const COMPANY: &str = "Company Name";

    pub const LOCATION: &str = "Not specified";

    pub const DESCRIPTION: &str = "Description not available";

    pub const ENGAGEMENT_TYPE: &str = "Unknown Engagement Type";

    pub const WORK_ARRANGEMENT: &str = "Unknown Work Arrangement";

    pub const DEADLINE: &str = "No deadline provided";

    pub const EMPLOYEE_INFO: &str = "Employee information not available";

    pub const CONTACT_PERSON: &str = "Not specified";

    pub const CONTACT_EMAIL: &str = "Not provided";
}
