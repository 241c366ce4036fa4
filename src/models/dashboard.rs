use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use std::str::FromStr;

use super::{ChartSet, Currency, MetricSummary, ReviewResponse, Role, WalletSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Pending,
    Given,
    Received,
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Section::Pending),
            "given" => Ok(Section::Given),
            "received" => Ok(Section::Received),
            other => Err(format!(
                "Unknown section '{}'. Use pending, given or received",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Obligation {
    NeedsFirstReview,
    NeedsReturnReview,
}

/// One line in a review section, joined with the project it belongs to.
#[derive(Debug, Serialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRow {
    pub project_id: String,
    pub project_title: String,
    pub category: Option<String>,
    pub counterparty_id: String,
    pub counterparty_name: String,
    pub amount: f64,
    pub currency: Option<Currency>,
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obligation: Option<Obligation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewResponse>,
}

impl ReviewRow {
    pub fn matches(&self, needle: &str) -> bool {
        self.project_title.to_lowercase().contains(needle)
            || self.counterparty_name.to_lowercase().contains(needle)
            || self
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionCounts {
    pub pending: usize,
    pub needs_first_review: usize,
    pub needs_return_review: usize,
    pub given: usize,
    pub received: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Projects,
    Reviews,
    Wallet,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Projects => "projects",
            SourceKind::Reviews => "reviews",
            SourceKind::Wallet => "wallet",
        }
    }
}

/// Read-only data handed to presentation code.
#[derive(Debug, Serialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub user_id: String,
    pub role: Role,
    pub section: Section,
    pub search_term: Option<String>,
    pub metrics: MetricSummary,
    pub charts: ChartSet,
    pub paged_reviews: Vec<ReviewRow>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: usize,
    pub total_pages: u32,
    pub counts: SectionCounts,
    pub wallet: Option<WalletSummary>,
    pub degraded_sources: Vec<SourceKind>,
}

#[derive(Debug, Serialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// Set when a newer request for the same user replaced this one.
    pub superseded: bool,
    pub view: ViewModel,
}
