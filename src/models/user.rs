use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "jobSeeker")]
    JobSeeker,
    #[serde(rename = "employer")]
    Employer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::JobSeeker => "jobSeeker",
            Role::Employer => "employer",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jobSeeker" => Ok(Role::JobSeeker),
            "employer" => Ok(Role::Employer),
            other => Err(Error::Invalid(format!("Unknown role: {}", other))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub full_name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub id: Uuid,
    pub title: String,
    pub provider: Option<String>,
    pub issue_date: Option<DateTime<Utc>>,
    pub cert_id: Option<String>,
    pub verification_link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub wallet_address: String,
    pub role: Role,
    pub profile: Profile,
    pub saved_jobs: Vec<Uuid>,
    pub certifications: Vec<Certification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert command for a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub wallet_address: String,
    pub role: Role,
}

/// The authenticated caller, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
    pub username: String,
    pub wallet_address: String,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            username: user.username.clone(),
            wallet_address: user.wallet_address.clone(),
        }
    }
}
