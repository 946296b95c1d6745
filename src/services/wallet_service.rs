use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::{
    user::Actor,
    wallet::{Wallet, WalletTransaction},
};
use crate::store::{Page, Paged, Store};

#[derive(Clone)]
pub struct WalletService {
    store: Arc<dyn Store>,
}

impl WalletService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get(&self, actor: &Actor) -> Result<Wallet> {
        self.store
            .find_wallet_by_owner(actor.id)
            .await?
            .ok_or_else(wallet_not_found)
    }

    pub async fn transactions(&self, actor: &Actor, page: Page) -> Result<Paged<WalletTransaction>> {
        self.store
            .list_wallet_transactions(actor.id, page)
            .await?
            .ok_or_else(wallet_not_found)
    }

    pub async fn connect(&self, actor: &Actor, address: &str) -> Result<Wallet> {
        let address = address.trim();
        if address.is_empty() {
            return Err(Error::Invalid("Wallet address is required".to_string()));
        }
        let wallet = self.store.connect_wallet(actor.id, address).await?;
        tracing::info!(user_id = %actor.id, wallet_id = %wallet.id, "wallet connected");
        Ok(wallet)
    }
}

fn wallet_not_found() -> Error {
    Error::NotFound("Wallet not found".to_string())
}
