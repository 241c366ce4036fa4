use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

use super::Currency;
use crate::utils::time::to_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Payment,
    Earning,
    Refund,
    Fee,
    #[serde(other)]
    Other,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Transaction {
    pub id: String,
    pub amount: f64, // signed: credits positive, debits negative
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub created_at: DateTime,
}

/// Owned by the payment service; only ever read here.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WalletSnapshot {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub balance: f64,
    pub pending_balance: f64,
    pub currency: Currency,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub created_at: String,
}

impl TransactionResponse {
    pub fn converted(tx: &Transaction, amount: f64) -> Self {
        TransactionResponse {
            id: tx.id.clone(),
            amount,
            kind: tx.kind,
            created_at: to_rfc3339(tx.created_at),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub currency: Currency,
    pub balance: f64,
    pub pending_balance: f64,
    pub credits: f64,
    pub debits: f64,
    pub recent_transactions: Vec<TransactionResponse>,
}
