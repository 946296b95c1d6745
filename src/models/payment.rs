use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::models::entity_ref::EntityRef;

pub const DEFAULT_CURRENCY: &str = "ETH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    JobPosting,
    PremiumListing,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::JobPosting => "job_posting",
            PaymentType::PremiumListing => "premium_listing",
        }
    }
}

impl FromStr for PaymentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_posting" => Ok(PaymentType::JobPosting),
            "premium_listing" => Ok(PaymentType::PremiumListing),
            other => Err(Error::Invalid(format!("Unknown payment type: {}", other))),
        }
    }
}

/// Settlement state shared by payment records and wallet transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStatus {
    Pending,
    Completed,
    Failed,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Completed => "completed",
            SettlementStatus::Failed => "failed",
        }
    }
}

impl FromStr for SettlementStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SettlementStatus::Pending),
            "completed" => Ok(SettlementStatus::Completed),
            "failed" => Ok(SettlementStatus::Failed),
            other => Err(Error::Invalid(format!("Unknown settlement status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub payer_id: Uuid,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub target: EntityRef,
    pub transaction_id: String,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
}

/// Everything the ledger needs to settle a job posting fee in one unit of work.
#[derive(Debug, Clone)]
pub struct JobPaymentSettlement {
    pub payer_id: Uuid,
    pub job_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_id: String,
}
