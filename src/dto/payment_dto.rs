use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    entity_ref::EntityRef,
    payment::{Payment, PaymentType, SettlementStatus},
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PayForJobPayload {
    pub amount: Decimal,
    #[validate(length(min = 1, message = "Transaction id is required"))]
    pub transaction_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConnectWalletPayload {
    #[validate(length(min = 1))]
    pub address: String,
}

/// A payment with the title of the entity it paid for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentHistoryEntry {
    pub id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub target: EntityRef,
    pub target_title: Option<String>,
    pub transaction_id: String,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
}

impl PaymentHistoryEntry {
    pub fn new(payment: Payment, target_title: Option<String>) -> Self {
        Self {
            id: payment.id,
            amount: payment.amount,
            currency: payment.currency,
            payment_type: payment.payment_type,
            target: payment.target,
            target_title,
            transaction_id: payment.transaction_id,
            status: payment.status,
            created_at: payment.created_at,
        }
    }
}
