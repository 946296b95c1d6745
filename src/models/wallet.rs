use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::models::payment::SettlementStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Payment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Payment => "payment",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "payment" => Ok(TransactionType::Payment),
            other => Err(Error::Invalid(format!("Unknown transaction type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Signed: debits are negative.
    pub amount: Decimal,
    pub transaction_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: SettlementStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub address: String,
    pub balance: Decimal,
    pub transactions: Vec<WalletTransaction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Sum of completed transaction amounts. Pending and failed entries never count.
    pub fn committed_balance(&self) -> Decimal {
        self.transactions
            .iter()
            .filter(|tx| tx.status == SettlementStatus::Completed)
            .map(|tx| tx.amount)
            .sum()
    }

    pub fn is_reconciled(&self) -> bool {
        self.balance == self.committed_balance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(amount: Decimal, status: SettlementStatus) -> WalletTransaction {
        WalletTransaction {
            id: Uuid::new_v4(),
            transaction_type: TransactionType::Payment,
            amount,
            transaction_id: None,
            timestamp: Utc::now(),
            status,
        }
    }

    #[test]
    fn only_completed_entries_count_towards_balance() {
        let wallet = Wallet {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            address: "0xabc".into(),
            balance: Decimal::new(-75, 2),
            transactions: vec![
                tx(Decimal::new(-5, 1), SettlementStatus::Completed),
                tx(Decimal::new(-25, 2), SettlementStatus::Completed),
                tx(Decimal::from(-9), SettlementStatus::Failed),
                tx(Decimal::from(-3), SettlementStatus::Pending),
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(wallet.committed_balance(), Decimal::new(-75, 2));
        assert!(wallet.is_reconciled());
    }
}
