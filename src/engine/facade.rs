use chrono::{DateTime, Utc};
use log::warn;
use mongodb::bson::oid::ObjectId;

use crate::engine::aggregator::{self, AggregateInput};
use crate::engine::currency::RateTable;
use crate::engine::ledger::ReviewLedger;
use crate::error::Result;
use crate::models::{
    AnalyticsSnapshot, Currency, Project, Review, ReviewRow, Role, Section, SourceKind,
    TimeRange, ViewModel, WalletSnapshot, WalletSummary,
};
use crate::store::DashboardStore;
use crate::utils::validation::normalize_search;

/// Parameters of one dashboard request, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub time_range: TimeRange,
    pub search_term: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub section: Section,
}

impl ViewQuery {
    pub fn new(
        time_range: TimeRange,
        search_term: Option<&str>,
        page: Option<u32>,
        page_size: Option<u32>,
        section: Section,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Self {
        ViewQuery {
            time_range,
            search_term: search_term
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .filter(|&size| size > 0)
                .unwrap_or(default_page_size)
                .clamp(1, max_page_size.max(1)),
            section,
        }
    }

    /// Switching section always starts again from the first page.
    pub fn with_section(mut self, section: Section) -> Self {
        if self.section != section {
            self.page = 1;
        }
        self.section = section;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: usize,
    pub total_pages: u32,
}

/// 1-indexed pagination; out-of-range pages clamp to the last page.
pub fn paginate<T: Clone>(items: &[T], page: u32, page_size: u32) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size as usize) as u32;
    let page = page.clamp(1, total_pages.max(1));
    let start = (page as usize - 1) * page_size as usize;

    Page {
        items: items
            .iter()
            .skip(start)
            .take(page_size as usize)
            .cloned()
            .collect(),
        page,
        page_size,
        total_items,
        total_pages,
    }
}

/// Case-insensitive match on title, category and counterparty name.
pub fn filter_rows(rows: Vec<ReviewRow>, search_term: Option<&str>) -> Vec<ReviewRow> {
    match normalize_search(search_term) {
        Some(needle) => rows.into_iter().filter(|row| row.matches(&needle)).collect(),
        None => rows,
    }
}

/// Results of the concurrent fetch, one `Result` per source.
pub struct SourceBundle {
    pub projects: Result<Vec<Project>>,
    pub reviews: Result<Vec<Review>>,
    pub wallet: Result<Option<WalletSnapshot>>,
}

impl SourceBundle {
    /// Queries every source at once. A failing branch never cancels the others.
    pub async fn fetch(store: &dyn DashboardStore, user_id: ObjectId, role: Role) -> Self {
        let (projects, reviews, wallet) = tokio::join!(
            store.projects_for(user_id, role),
            store.reviews_for(user_id),
            store.wallet_for(user_id),
        );

        let bundle = SourceBundle {
            projects,
            reviews,
            wallet,
        };
        for (source, error) in bundle.failures() {
            warn!(
                "{} source failed for {} {}: {}",
                source.as_str(),
                role,
                user_id,
                error
            );
        }
        bundle
    }

    fn failures(&self) -> Vec<(SourceKind, String)> {
        let mut failures = Vec::new();
        if let Err(e) = &self.projects {
            failures.push((SourceKind::Projects, e.to_string()));
        }
        if let Err(e) = &self.reviews {
            failures.push((SourceKind::Reviews, e.to_string()));
        }
        if let Err(e) = &self.wallet {
            failures.push((SourceKind::Wallet, e.to_string()));
        }
        failures
    }

    pub fn degraded(&self) -> Vec<SourceKind> {
        self.failures().into_iter().map(|(source, _)| source).collect()
    }

    pub fn all_failed(&self) -> bool {
        self.projects.is_err() && self.reviews.is_err() && self.wallet.is_err()
    }
}

/// Everything derived from one fetch, before section/search/pagination.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub ledger: ReviewLedger,
    pub snapshot: AnalyticsSnapshot,
    pub wallet: Option<WalletSummary>,
    pub degraded: Vec<SourceKind>,
}

pub fn reconcile(
    user_id: &ObjectId,
    role: Role,
    bundle: &SourceBundle,
    rates: &RateTable,
    currency: Currency,
    time_range: TimeRange,
    now: DateTime<Utc>,
) -> Reconciled {
    let projects = bundle.projects.as_deref().ok();
    let ledger = match &bundle.reviews {
        Ok(reviews) => ReviewLedger::build(user_id, role, projects.unwrap_or_default(), reviews),
        Err(_) => ReviewLedger::default(),
    };
    let ratings = ledger.received_ratings();

    let mut snapshot = aggregator::aggregate(&AggregateInput {
        user_id,
        role,
        projects,
        received_ratings: bundle.reviews.is_ok().then_some(ratings.as_slice()),
        rates,
        currency,
        time_range,
        now,
    });
    snapshot.pending_review_projects = ledger.reviewable();

    let wallet = match &bundle.wallet {
        Ok(Some(wallet)) => Some(aggregator::wallet_summary(
            wallet, rates, currency, time_range, now,
        )),
        _ => None,
    };

    Reconciled {
        ledger,
        snapshot,
        wallet,
        degraded: bundle.degraded(),
    }
}

pub fn build_view_model(
    user_id: &ObjectId,
    role: Role,
    reconciled: &Reconciled,
    query: &ViewQuery,
) -> ViewModel {
    let rows = filter_rows(
        reconciled.ledger.section(query.section),
        query.search_term.as_deref(),
    );
    let page = paginate(&rows, query.page, query.page_size);

    ViewModel {
        user_id: user_id.to_hex(),
        role,
        section: query.section,
        search_term: query.search_term.clone(),
        metrics: reconciled.snapshot.metrics.clone(),
        charts: reconciled.snapshot.charts.clone(),
        paged_reviews: page.items,
        page: page.page,
        page_size: page.page_size,
        total_items: page.total_items,
        total_pages: page.total_pages,
        counts: reconciled.ledger.counts(),
        wallet: reconciled.wallet.clone(),
        degraded_sources: reconciled.degraded.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{completed_project, review};
    use crate::error::EngineError;
    use crate::models::{Obligation, ReviewDirection};
    use chrono::TimeZone;

    fn row(title: &str, category: Option<&str>, counterparty: &str) -> ReviewRow {
        ReviewRow {
            project_id: ObjectId::new().to_hex(),
            project_title: title.to_string(),
            category: category.map(str::to_string),
            counterparty_id: ObjectId::new().to_hex(),
            counterparty_name: counterparty.to_string(),
            amount: 0.0,
            currency: None,
            completed_at: None,
            obligation: Some(Obligation::NeedsFirstReview),
            review: None,
        }
    }

    #[test]
    fn pagination_clamps_and_counts_pages() {
        let items: Vec<u32> = (1..=23).collect();

        let first = paginate(&items, 1, 10);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);

        let beyond = paginate(&items, 9, 10);
        assert_eq!(beyond.page, 3);
        assert_eq!(beyond.items, vec![21, 22, 23]);

        let zero = paginate(&items, 0, 10);
        assert_eq!(zero.page, 1);

        let empty = paginate::<u32>(&[], 4, 10);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.items.is_empty());

        for size in 1..=7 {
            for page in 0..=30 {
                let p = paginate(&items, page, size);
                assert!(p.items.len() <= size as usize);
                assert!(p.page >= 1 && p.page <= p.total_pages.max(1));
            }
        }
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let rows = vec![
            row("Logo Design", Some("Branding"), "Asha"),
            row("Mobile app", Some("Engineering"), "Ravi"),
            row("Blog posts", None, "Meera Logistics"),
        ];

        assert_eq!(filter_rows(rows.clone(), Some("LOGO")).len(), 1);
        assert_eq!(filter_rows(rows.clone(), Some("engineer")).len(), 1);
        assert_eq!(filter_rows(rows.clone(), Some("log")).len(), 2);
        assert_eq!(filter_rows(rows.clone(), Some("  ")).len(), 3);
        assert!(filter_rows(rows, Some("nothing")).is_empty());
    }

    #[test]
    fn query_normalization_and_section_reset() {
        let query = ViewQuery::new(TimeRange::Year, Some("  "), Some(0), Some(500), Section::Given, 10, 100);
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 100);
        assert_eq!(query.search_term, None);

        let query = ViewQuery::new(TimeRange::Year, None, Some(4), None, Section::Given, 10, 100);
        assert_eq!(query.page_size, 10);
        assert_eq!(query.clone().with_section(Section::Given).page, 4);
        assert_eq!(query.with_section(Section::Received).page, 1);
    }

    #[test]
    fn analytics_failure_keeps_reviews() {
        let me = ObjectId::new();
        let other = ObjectId::new();
        let project = completed_project(other, me, "Illustration", 300.0, 2026, 9);
        let reviews = vec![
            review(project.id.unwrap(), other, me, ReviewDirection::ClientToFreelancer, 5),
            review(ObjectId::new(), me, other, ReviewDirection::FreelancerToClient, 4),
        ];
        let bundle = SourceBundle {
            projects: Err(EngineError::upstream("projects down")),
            reviews: Ok(reviews),
            wallet: Ok(None),
        };
        let now = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let rates = RateTable::fallback(83.0, now);

        let reconciled = reconcile(&me, Role::Freelancer, &bundle, &rates, Currency::Usd, TimeRange::Year, now);

        assert_eq!(reconciled.ledger.given.len(), 1);
        assert_eq!(reconciled.ledger.received.len(), 1);
        assert_eq!(reconciled.snapshot.metrics.total_earnings, Some(0.0));
        assert_eq!(reconciled.snapshot.metrics.average_rating, 5.0);
        assert_eq!(reconciled.degraded, vec![SourceKind::Projects]);
        assert!(!bundle.all_failed());

        let query = ViewQuery::new(TimeRange::Year, None, None, None, Section::Received, 10, 100);
        let view = build_view_model(&me, Role::Freelancer, &reconciled, &query);
        assert_eq!(view.paged_reviews.len(), 1);
        assert_eq!(view.total_pages, 1);
    }
}
