use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::fallback;

/// A stored opportunity row. Every column is optional so a partially
/// filled row still deserializes; normalization supplies the fallbacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub opportunity_type: Option<String>,
    pub field_of_study: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub qualifications_and_requirements: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub experience_required: Option<Vec<String>>,
    pub engagement_type: Option<String>,
    pub work_arrangement: Option<String>,
    pub ending_date: Option<String>,
    pub benefits: Option<Vec<String>>,
    pub employee_info: Option<String>,
    pub contact_person: Option<String>,
    pub contact_person_email: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Display shape of an opportunity after normalization.
#[derive(Debug, Clone, Serialize)]
pub struct Opportunity {
    pub id: String,
    pub opportunity_type: String,
    pub field_of_study: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub qualifications: Vec<String>,
    pub tags: Vec<String>,
    pub experience: Vec<String>,
    pub engagement_type: String,
    pub work_arrangement: String,
    pub deadline: String,
    pub benefits: Vec<String>,
    pub employee_info: String,
    pub contact_person: String,
    pub contact_person_email: String,
}

impl Opportunity {
    /// Normalizes a stored row into the display shape. Every missing
    /// field gets a deterministic placeholder; this never fails.
    #[must_use]
    pub fn from_record(record: OpportunityRecord) -> Self {
        Self::from_record_at(record, Utc::now())
    }

    #[must_use]
    pub fn from_record_at(record: OpportunityRecord, now: DateTime<Utc>) -> Self {
        let or_placeholder = |value: Option<String>, placeholder: &str| {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| placeholder.to_string())
        };

        Self {
            id: record
                .id
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            opportunity_type: or_placeholder(record.opportunity_type, fallback::TYPE),
            field_of_study: or_placeholder(record.field_of_study, fallback::FIELD_OF_STUDY),
            title: or_placeholder(record.title, fallback::TITLE),
            company: or_placeholder(record.company, fallback::COMPANY),
            location: or_placeholder(record.location, fallback::LOCATION),
            description: or_placeholder(record.description, fallback::DESCRIPTION),
            qualifications: record.qualifications_and_requirements.unwrap_or_default(),
            tags: record.tags.unwrap_or_default(),
            experience: record.experience_required.unwrap_or_default(),
            engagement_type: or_placeholder(record.engagement_type, fallback::ENGAGEMENT_TYPE),
            work_arrangement: or_placeholder(record.work_arrangement, fallback::WORK_ARRANGEMENT),
            deadline: record
                .ending_date
                .as_deref()
                .and_then(|d| remaining_days(d, now))
                .unwrap_or_else(|| fallback::DEADLINE.to_string()),
            benefits: record.benefits.unwrap_or_default(),
            employee_info: or_placeholder(record.employee_info, fallback::EMPLOYEE_INFO),
            contact_person: or_placeholder(record.contact_person, fallback::CONTACT_PERSON),
            contact_person_email: or_placeholder(
                record.contact_person_email,
                fallback::CONTACT_EMAIL,
            ),
        }
    }
}

/// Search projection of an opportunity row.
#[derive(Debug, Clone, Serialize)]
pub struct OpportunitySummary {
    pub id: String,
    pub opportunity_type: String,
    pub location: String,
    pub title: String,
    pub experience: Vec<String>,
    pub deadline: String,
}

impl OpportunitySummary {
    #[must_use]
    pub fn from_record(record: &OpportunityRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.clone().unwrap_or_default(),
            opportunity_type: record.opportunity_type.clone().unwrap_or_default(),
            location: record.location.clone().unwrap_or_default(),
            title: record.title.clone().unwrap_or_default(),
            experience: record.experience_required.clone().unwrap_or_default(),
            deadline: record
                .ending_date
                .as_deref()
                .and_then(|d| remaining_days(d, now))
                .unwrap_or_else(|| fallback::DEADLINE.to_string()),
        }
    }
}

/// Publish form for a new opportunity. List fields arrive as single
/// strings: tags and experience are comma-separated, qualifications and
/// benefits semicolon-separated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewOpportunity {
    pub opportunity_type: String,
    pub field_of_study: String,
    pub title: String,
    pub location: String,
    pub description: String,
    pub qualifications_and_requirements: String,
    pub tags: String,
    pub experience_required: String,
    pub engagement_type: String,
    pub work_arrangement: String,
    pub ending_date: String,
    pub benefits: String,
    pub contact_person: String,
    pub contact_person_email: String,
}

impl NewOpportunity {
    /// Builds the stored row, splitting the delimited list fields and
    /// assigning a fresh id.
    #[must_use]
    pub fn into_record(self, company: &str) -> OpportunityRecord {
        OpportunityRecord {
            id: Some(uuid::Uuid::new_v4().to_string()),
            opportunity_type: Some(self.opportunity_type),
            field_of_study: Some(self.field_of_study),
            title: Some(self.title),
            company: Some(company.to_string()),
            location: Some(self.location),
            description: Some(self.description),
            qualifications_and_requirements: Some(split_list(
                &self.qualifications_and_requirements,
                ';',
            )),
            tags: Some(split_list(&self.tags, ',')),
            experience_required: Some(split_list(&self.experience_required, ',')),
            engagement_type: Some(self.engagement_type),
            work_arrangement: Some(self.work_arrangement),
            ending_date: Some(self.ending_date),
            benefits: Some(split_list(&self.benefits, ';')),
            employee_info: None,
            contact_person: Some(self.contact_person),
            contact_person_email: Some(self.contact_person_email),
            featured: false,
        }
    }
}

fn split_list(input: &str, separator: char) -> Vec<String> {
    if input.is_empty() {
        return Vec::new();
    }

    input
        .split(separator)
        .map(|item| item.trim().to_string())
        .collect()
}

/// Day-granularity countdown to an ending date, with ceiling rounding.
/// `"<n> Days Left"` while the deadline has not passed, `"Deadline Passed"`
/// after, `None` when the date is missing or unparseable.
#[must_use]
pub fn remaining_days(ending_date: &str, now: DateTime<Utc>) -> Option<String> {
    let target = parse_ending_date(ending_date)?;
    let seconds = (target - now).num_seconds();

    #[allow(clippy::cast_precision_loss)]
    let days = (seconds as f64 / 86_400.0).ceil() as i64;

    if days >= 0 {
        Some(format!("{days} Days Left"))
    } else {
        Some("Deadline Passed".to_string())
    }
}

fn parse_ending_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    // Bare dates are stored as well; treat them as midnight UTC.
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}
