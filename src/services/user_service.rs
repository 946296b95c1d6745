use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::dto::user_dto::{AddCertificationPayload, UpdateProfilePayload};
use crate::error::{Error, Result};
use crate::models::user::{Actor, Certification, User};
use crate::store::Store;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn profile(&self, actor: &Actor) -> Result<User> {
        self.store
            .find_user(actor.id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(&self, actor: &Actor, payload: UpdateProfilePayload) -> Result<User> {
        let user = self.store.update_profile(actor.id, payload.into()).await?;
        tracing::info!(user_id = %actor.id, "profile updated");
        Ok(user)
    }

    pub async fn add_certification(
        &self,
        actor: &Actor,
        payload: AddCertificationPayload,
    ) -> Result<Vec<Certification>> {
        let cert = Certification {
            id: Uuid::new_v4(),
            title: payload.title,
            provider: payload.provider,
            issue_date: payload.issue_date,
            cert_id: payload.cert_id,
            verification_link: payload.verification_link,
        };
        self.store.add_certification(actor.id, cert).await
    }

    pub async fn remove_certification(
        &self,
        actor: &Actor,
        cert_id: Uuid,
    ) -> Result<Vec<Certification>> {
        self.store.remove_certification(actor.id, cert_id).await
    }
}

/// Loads each distinct user once. Ids without an account are left out.
pub(crate) async fn users_by_id(
    store: &dyn Store,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, User>> {
    let mut users = HashMap::new();
    for id in ids {
        if users.contains_key(&id) {
            continue;
        }
        if let Some(user) = store.find_user(id).await? {
            users.insert(id, user);
        }
    }
    Ok(users)
}
