use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dto::{job_dto::JobView, user_dto::ApplicantSummary};
use crate::models::application::{Application, ApplicationStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplyPayload {
    #[validate(length(min = 1, message = "Resume is required"))]
    pub resume: String,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateApplicationStatusPayload {
    pub status: ApplicationStatus,
}

/// An application with the parties a reader needs to recognise it.
/// Creators get the applicant; applicants get the job and its creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant: Option<ApplicantSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<JobView>,
}
