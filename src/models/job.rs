use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Published,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Published => "published",
            JobStatus::Closed => "closed",
        }
    }

    /// Status only moves forward; `draft -> draft` is an edit.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Draft, JobStatus::Draft)
                | (JobStatus::Draft, JobStatus::Published)
                | (JobStatus::Published, JobStatus::Closed)
        )
    }
}

impl FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(JobStatus::Draft),
            "published" => Ok(JobStatus::Published),
            "closed" => Ok(JobStatus::Closed),
            other => Err(Error::Invalid(format!("Unknown job status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(Error::Invalid(format!("Unknown payment status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Remote,
    Onsite,
    Hybrid,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Remote => "remote",
            JobType::Onsite => "onsite",
            JobType::Hybrid => "hybrid",
        }
    }
}

impl FromStr for JobType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remote" => Ok(JobType::Remote),
            "onsite" => Ok(JobType::Onsite),
            "hybrid" => Ok(JobType::Hybrid),
            other => Err(Error::Invalid(format!("Unknown job type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobLevel {
    Entry,
    Junior,
    Mid,
    Senior,
    Lead,
}

impl JobLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobLevel::Entry => "entry",
            JobLevel::Junior => "junior",
            JobLevel::Mid => "mid",
            JobLevel::Senior => "senior",
            JobLevel::Lead => "lead",
        }
    }
}

impl FromStr for JobLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entry" => Ok(JobLevel::Entry),
            "junior" => Ok(JobLevel::Junior),
            "mid" => Ok(JobLevel::Mid),
            "senior" => Ok(JobLevel::Senior),
            "lead" => Ok(JobLevel::Lead),
            other => Err(Error::Invalid(format!("Unknown job level: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub responsibilities: String,
    pub requirements: Vec<String>,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<Decimal>,
    pub is_urgent: bool,
    pub deadline: DateTime<Utc>,
    pub level: JobLevel,
    pub category: String,
    pub skills: Vec<String>,
    pub status: JobStatus,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<Uuid>,
    pub applicants_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_owned_by(&self, actor_id: Uuid) -> bool {
        self.creator_id == actor_id
    }

    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.deadline < now
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

/// Insert command for a job. New jobs always start as unpaid drafts.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub creator_id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub responsibilities: String,
    pub requirements: Vec<String>,
    pub location: String,
    pub job_type: JobType,
    pub salary: Option<Decimal>,
    pub is_urgent: bool,
    pub deadline: DateTime<Utc>,
    pub level: JobLevel,
    pub category: String,
    pub skills: Vec<String>,
}

/// Descriptive fields an owner may edit while the job is a draft.
#[derive(Debug, Clone, Default)]
pub struct JobChanges {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub responsibilities: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub salary: Option<Decimal>,
    pub is_urgent: Option<bool>,
    pub deadline: Option<DateTime<Utc>>,
    pub level: Option<JobLevel>,
    pub category: Option<String>,
    pub skills: Option<Vec<String>>,
}

impl JobChanges {
    pub fn apply_to(self, job: &mut Job) {
        if let Some(v) = self.title {
            job.title = v;
        }
        if let Some(v) = self.company {
            job.company = v;
        }
        if let Some(v) = self.description {
            job.description = v;
        }
        if let Some(v) = self.responsibilities {
            job.responsibilities = v;
        }
        if let Some(v) = self.requirements {
            job.requirements = v;
        }
        if let Some(v) = self.location {
            job.location = v;
        }
        if let Some(v) = self.job_type {
            job.job_type = v;
        }
        if let Some(v) = self.salary {
            job.salary = Some(v);
        }
        if let Some(v) = self.is_urgent {
            job.is_urgent = v;
        }
        if let Some(v) = self.deadline {
            job.deadline = v;
        }
        if let Some(v) = self.level {
            job.level = v;
        }
        if let Some(v) = self.category {
            job.category = v;
        }
        if let Some(v) = self.skills {
            job.skills = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_never_moves_backwards() {
        assert!(JobStatus::Draft.can_transition_to(JobStatus::Published));
        assert!(JobStatus::Draft.can_transition_to(JobStatus::Draft));
        assert!(JobStatus::Published.can_transition_to(JobStatus::Closed));
        assert!(!JobStatus::Published.can_transition_to(JobStatus::Draft));
        assert!(!JobStatus::Closed.can_transition_to(JobStatus::Published));
        assert!(!JobStatus::Closed.can_transition_to(JobStatus::Draft));
    }

    #[test]
    fn enums_parse_their_wire_names() {
        assert_eq!("hybrid".parse::<JobType>().unwrap(), JobType::Hybrid);
        assert_eq!("lead".parse::<JobLevel>().unwrap(), JobLevel::Lead);
        assert_eq!("paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert!("archived".parse::<JobStatus>().is_err());
    }
}
