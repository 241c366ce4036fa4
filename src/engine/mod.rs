//! Review & earnings reconciliation.
//!
//! Data flows one way: store → currency normalization → ledger and
//! aggregation → view-model. Everything below `Engine` is a pure function of
//! its inputs except the session and submission registries.

pub mod aggregator;
pub mod currency;
pub mod facade;
pub mod ledger;
pub mod session;
pub mod submission;

#[cfg(test)]
pub(crate) mod testing;

use chrono::Utc;
use log::warn;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::models::{
    AnalyticsSnapshot, CreateReviewDto, Currency, DashboardResponse, Review, Role, Section,
    TimeRange, WalletSummary,
};
use crate::services::ExchangeRateService;
use crate::store::DashboardStore;

use facade::{Reconciled, SourceBundle, ViewQuery};
use ledger::ReviewLedger;
use session::{Commit, SessionRegistry};
use submission::{SubmissionState, SubmissionTracker};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub currency: Currency,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub session_capacity: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            currency: Currency::Usd,
            default_page_size: 10,
            max_page_size: 100,
            session_capacity: session::DEFAULT_CAPACITY,
        }
    }
}

impl EngineSettings {
    pub fn from_config() -> Self {
        EngineSettings {
            currency: Config::display_currency(),
            default_page_size: Config::default_page_size(),
            max_page_size: Config::max_page_size(),
            session_capacity: Config::session_capacity(),
        }
    }
}

/// Shared state behind every route.
pub struct Engine {
    store: Arc<dyn DashboardStore>,
    rates: Arc<ExchangeRateService>,
    sessions: SessionRegistry,
    submissions: SubmissionTracker,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(
        store: Arc<dyn DashboardStore>,
        rates: Arc<ExchangeRateService>,
        settings: EngineSettings,
    ) -> Self {
        Engine {
            store,
            rates,
            sessions: SessionRegistry::with_capacity(settings.session_capacity),
            submissions: SubmissionTracker::with_capacity(settings.session_capacity),
            settings,
        }
    }

    pub fn rates(&self) -> &ExchangeRateService {
        &self.rates
    }

    pub fn query(
        &self,
        time_range: TimeRange,
        search_term: Option<&str>,
        page: Option<u32>,
        page_size: Option<u32>,
        section: Section,
    ) -> ViewQuery {
        ViewQuery::new(
            time_range,
            search_term,
            page,
            page_size,
            section,
            self.settings.default_page_size,
            self.settings.max_page_size,
        )
    }

    /// Fan-out fetch plus reconciliation. Fails only when every source failed.
    async fn gather(&self, user_id: ObjectId, role: Role, time_range: TimeRange) -> Result<Reconciled> {
        let bundle = SourceBundle::fetch(self.store.as_ref(), user_id, role).await;
        if bundle.all_failed() {
            return Err(EngineError::upstream(format!(
                "every data source failed for {} {}",
                role, user_id
            )));
        }

        let rates = self.rates.table().await;
        Ok(facade::reconcile(
            &user_id,
            role,
            &bundle,
            &rates,
            self.settings.currency,
            time_range,
            Utc::now(),
        ))
    }

    pub async fn analytics(
        &self,
        user_id: ObjectId,
        role: Role,
        time_range: TimeRange,
    ) -> Result<AnalyticsSnapshot> {
        Ok(self.gather(user_id, role, time_range).await?.snapshot)
    }

    /// Review sections need the review source; projects may be missing.
    pub async fn ledger(&self, user_id: ObjectId, role: Role) -> Result<ReviewLedger> {
        let (projects, reviews) = tokio::join!(
            self.store.projects_for(user_id, role),
            self.store.reviews_for(user_id),
        );
        let reviews = reviews?;
        let projects = projects.unwrap_or_else(|e| {
            warn!("projects source failed for {} {}: {}", role, user_id, e);
            Vec::new()
        });
        Ok(ReviewLedger::build(&user_id, role, &projects, &reviews))
    }

    pub async fn view_model(
        &self,
        user_id: ObjectId,
        role: Role,
        query: ViewQuery,
    ) -> Result<DashboardResponse> {
        let ticket = self.sessions.begin(user_id, role, query);
        let reconciled = self.gather(user_id, role, ticket.query.time_range).await?;
        let view = facade::build_view_model(&user_id, role, &reconciled, &ticket.query);

        Ok(match self.sessions.commit(&ticket, view.clone()) {
            Commit::Applied(applied) => DashboardResponse {
                superseded: false,
                view: applied.as_ref().clone(),
            },
            Commit::Superseded { latest } => DashboardResponse {
                superseded: true,
                view: latest.map(|v| v.as_ref().clone()).unwrap_or(view),
            },
        })
    }

    pub async fn wallet(
        &self,
        user_id: ObjectId,
        time_range: TimeRange,
    ) -> Result<WalletSummary> {
        let wallet = self
            .store
            .wallet_for(user_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Wallet not found"))?;
        let rates = self.rates.table().await;
        Ok(aggregator::wallet_summary(
            &wallet,
            &rates,
            self.settings.currency,
            time_range,
            Utc::now(),
        ))
    }

    pub async fn submit_review(&self, dto: &CreateReviewDto) -> Result<Review> {
        submission::submit_review(self.store.as_ref(), &self.submissions, dto).await
    }

    pub fn submission_state(&self, reviewer_id: ObjectId, project_id: ObjectId) -> SubmissionState {
        self.submissions.state(reviewer_id, project_id)
    }
}
