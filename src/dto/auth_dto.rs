use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{Role, User};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1))]
    pub wallet_address: String,
    pub role: Role,
}

impl RegisterPayload {
    /// Trims identity fields and lowercases the email so validation sees what
    /// will be stored.
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            wallet_address: self.wallet_address.trim().to_string(),
            ..self
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}
