use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::{Profile, User};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfilePayload {
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    pub location: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[validate(url)]
    pub profile_picture: Option<String>,
}

impl From<UpdateProfilePayload> for Profile {
    fn from(p: UpdateProfilePayload) -> Self {
        Self {
            full_name: p.full_name,
            location: p.location,
            bio: p.bio,
            skills: p.skills,
            profile_picture: p.profile_picture,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddCertificationPayload {
    #[validate(length(min = 1))]
    pub title: String,
    pub provider: Option<String>,
    pub issue_date: Option<DateTime<Utc>>,
    pub cert_id: Option<String>,
    #[validate(url)]
    pub verification_link: Option<String>,
}

/// What a job's creator sees about someone who applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub profile: Profile,
}

impl From<&User> for ApplicantSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            profile: user.profile.clone(),
        }
    }
}

/// Public face of a job's creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorSummary {
    pub id: Uuid,
    pub username: String,
    pub location: Option<String>,
}

impl From<&User> for CreatorSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            location: user.profile.location.clone(),
        }
    }
}
