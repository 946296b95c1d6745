use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::user_dto::CreatorSummary;
use crate::models::{
    job::{Job, JobChanges, JobLevel, JobType, NewJob},
    user::User,
};
use crate::store::{JobFilter, JobSort, Page};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub company: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub responsibilities: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[validate(length(min = 1))]
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<Decimal>,
    #[serde(default)]
    pub is_urgent: bool,
    pub deadline: DateTime<Utc>,
    pub level: JobLevel,
    #[validate(length(min = 1))]
    pub category: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl CreateJobPayload {
    pub fn into_new_job(self, creator_id: Uuid) -> NewJob {
        NewJob {
            creator_id,
            title: self.title,
            company: self.company,
            description: self.description,
            responsibilities: self.responsibilities,
            requirements: self.requirements,
            location: self.location,
            job_type: self.job_type,
            salary: self.salary,
            is_urgent: self.is_urgent,
            deadline: self.deadline,
            level: self.level,
            category: self.category,
            skills: self.skills,
        }
    }
}

/// Unknown fields such as `status` or `payment_status` are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateJobPayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub company: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub responsibilities: Option<String>,
    pub requirements: Option<Vec<String>>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub salary: Option<Decimal>,
    pub is_urgent: Option<bool>,
    pub deadline: Option<DateTime<Utc>>,
    pub level: Option<JobLevel>,
    #[validate(length(min = 1))]
    pub category: Option<String>,
    pub skills: Option<Vec<String>>,
}

impl From<UpdateJobPayload> for JobChanges {
    fn from(p: UpdateJobPayload) -> Self {
        Self {
            title: p.title,
            company: p.company,
            description: p.description,
            responsibilities: p.responsibilities,
            requirements: p.requirements,
            location: p.location,
            job_type: p.job_type,
            salary: p.salary,
            is_urgent: p.is_urgent,
            deadline: p.deadline,
            level: p.level,
            category: p.category,
            skills: p.skills,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSortQuery {
    #[default]
    Latest,
    Oldest,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub location: Option<String>,
    #[serde(alias = "jobType")]
    pub job_type: Option<JobType>,
    pub level: Option<JobLevel>,
    #[serde(alias = "isUrgent")]
    pub is_urgent: Option<bool>,
    #[serde(alias = "sortBy")]
    pub sort: Option<JobSortQuery>,
}

impl JobListQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }

    /// Public listing filter; the caller fixes the status.
    pub fn filter(&self) -> JobFilter {
        JobFilter {
            location: self.location.clone().filter(|l| !l.trim().is_empty()),
            job_type: self.job_type,
            level: self.level,
            urgent_only: self.is_urgent.unwrap_or(false),
            sort: match self.sort.unwrap_or_default() {
                JobSortQuery::Latest => JobSort::Latest,
                JobSortQuery::Oldest => JobSort::Oldest,
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSearchQuery {
    #[serde(alias = "query")]
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl JobSearchQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: Job,
    /// `None` only when the creator's account no longer exists.
    pub creator: Option<CreatorSummary>,
}

impl JobView {
    pub fn new(job: Job, creator: Option<&User>) -> Self {
        Self {
            job,
            creator: creator.map(CreatorSummary::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_accepts_camel_case_names() {
        let query: JobListQuery =
            serde_json::from_str(r#"{"jobType":"remote","sortBy":"oldest","isUrgent":true}"#)
                .unwrap();
        let filter = query.filter();
        assert_eq!(filter.job_type, Some(JobType::Remote));
        assert_eq!(filter.sort, JobSort::Oldest);
        assert!(filter.urgent_only);

        let search: JobSearchQuery = serde_json::from_str(r#"{"query":"rust"}"#).unwrap();
        assert_eq!(search.q.as_deref(), Some("rust"));
    }
}
