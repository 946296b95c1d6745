use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::auth_dto::{AuthResponse, LoginPayload, RegisterPayload};
use crate::error::{Error, Result};
use crate::models::user::{Actor, NewUser, User};
use crate::store::Store;
use crate::utils::{crypto::CredentialHasher, token::TokenIssuer};

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
        }
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<AuthResponse> {
        let payload = payload.normalized();
        payload.validate()?;
        let password_hash = self.hasher.hash(&payload.password)?;
        let (user, wallet) = self
            .store
            .create_user_with_wallet(NewUser {
                username: payload.username,
                email: payload.email,
                password_hash,
                wallet_address: payload.wallet_address,
                role: payload.role,
            })
            .await?;

        tracing::info!(
            user_id = %user.id,
            wallet_id = %wallet.id,
            role = user.role.as_str(),
            "user registered"
        );
        let token = self.tokens.issue(&user)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<AuthResponse> {
        let email = payload.email.trim().to_lowercase();
        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        if !self.hasher.verify(&payload.password, &user.password_hash)? {
            return Err(Error::Unauthorized("Invalid credentials".to_string()));
        }

        tracing::info!(user_id = %user.id, "user logged in");
        let token = self.tokens.issue(&user)?;
        Ok(AuthResponse { token, user })
    }

    pub async fn me(&self, actor: &Actor) -> Result<User> {
        self.store
            .find_user(actor.id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Resolves a bearer token to the caller. The user must still exist.
    pub async fn authenticate(&self, token: &str) -> Result<Actor> {
        let claims = self.tokens.verify(token)?;
        let user = self.find_active(claims.sub).await?;
        Ok(Actor::from(&user))
    }

    async fn find_active(&self, id: Uuid) -> Result<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or_else(|| Error::Unauthorized("User no longer exists".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::store::MemoryStore;
    use crate::utils::crypto::MockCredentialHasher;

    fn payload() -> RegisterPayload {
        RegisterPayload {
            username: "erin".to_string(),
            email: "Erin@Example.com".to_string(),
            password: "s3cret!".to_string(),
            wallet_address: "0xerin".to_string(),
            role: Role::JobSeeker,
        }
    }

    fn service(hasher: MockCredentialHasher) -> AuthService {
        AuthService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(hasher),
            TokenIssuer::new("test-secret", 7),
        )
    }

    #[tokio::test]
    async fn register_stores_only_the_hash() {
        let mut hasher = MockCredentialHasher::new();
        hasher
            .expect_hash()
            .withf(|plain| plain == "s3cret!")
            .times(1)
            .returning(|_| Ok("hashed".to_string()));
        let auth = service(hasher);

        let session = auth.register(payload()).await.unwrap();
        assert_eq!(session.user.password_hash, "hashed");
        assert_eq!(session.user.email, "erin@example.com");
        let actor = auth.authenticate(&session.token).await.unwrap();
        assert_eq!(actor.id, session.user.id);
        assert_eq!(actor.role, Role::JobSeeker);
    }

    #[tokio::test]
    async fn blank_wallet_address_fails_validation_after_trimming() {
        let auth = service(MockCredentialHasher::new());
        let mut blank = payload();
        blank.wallet_address = "   ".to_string();

        let err = auth.register(blank).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::Invalid);
    }

    #[tokio::test]
    async fn login_distinguishes_unknown_email_from_bad_password() {
        let mut hasher = MockCredentialHasher::new();
        hasher.expect_hash().returning(|_| Ok("hashed".to_string()));
        hasher
            .expect_verify()
            .returning(|plain, _| Ok(plain == "s3cret!"));
        let auth = service(hasher);
        auth.register(payload()).await.unwrap();

        let unknown = auth
            .login(LoginPayload {
                email: "nobody@example.com".to_string(),
                password: "s3cret!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(unknown, Error::NotFound(_)));

        let wrong = auth
            .login(LoginPayload {
                email: "erin@example.com".to_string(),
                password: "guess".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong, Error::Unauthorized(_)));

        let ok = auth
            .login(LoginPayload {
                email: "erin@example.com".to_string(),
                password: "s3cret!".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ok.user.username, "erin");
    }

    #[tokio::test]
    async fn token_for_a_vanished_user_is_rejected() {
        let auth = service(MockCredentialHasher::new());
        let now = chrono::Utc::now();
        let ghost = User {
            id: Uuid::new_v4(),
            username: "ghost".to_string(),
            email: "ghost@example.com".to_string(),
            password_hash: String::new(),
            wallet_address: "0xghost".to_string(),
            role: Role::Employer,
            profile: Default::default(),
            saved_jobs: vec![],
            certifications: vec![],
            created_at: now,
            updated_at: now,
        };
        let token = TokenIssuer::new("test-secret", 7).issue(&ghost).unwrap();
        let err = auth.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }
}
