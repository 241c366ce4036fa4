use chrono::{DateTime, Utc};
use log::warn;
use mongodb::bson::oid::ObjectId;
use std::collections::{HashMap, HashSet};

use crate::engine::currency::RateTable;
use crate::models::{
    AnalyticsSnapshot, ChartSet, Currency, MetricSummary, MonthlyPoint, PerformanceMetrics,
    Project, ProjectStatus, RatingBucket, Role, StatusCount, TimeRange, Transaction,
    TransactionResponse, WalletSnapshot, WalletSummary, first_of_month,
};
use crate::utils::time::{month_index, to_utc};

const RECENT_TRANSACTIONS: usize = 5;

/// Everything one aggregation needs. `None` means the source failed and its
/// fields fall back to zeros.
pub struct AggregateInput<'a> {
    pub user_id: &'a ObjectId,
    pub role: Role,
    pub projects: Option<&'a [Project]>,
    pub received_ratings: Option<&'a [i32]>,
    pub rates: &'a RateTable,
    pub currency: Currency,
    pub time_range: TimeRange,
    pub now: DateTime<Utc>,
}

pub fn aggregate(input: &AggregateInput<'_>) -> AnalyticsSnapshot {
    let projects = input.projects.unwrap_or_default();
    let ratings = input.received_ratings.unwrap_or_default();
    let mine: Vec<&Project> = projects
        .iter()
        .filter(|p| p.role_of(input.user_id) == Some(input.role))
        .collect();

    let monthly = monthly_series(&mine, input);
    let total = round2(monthly.iter().map(|p| p.amount).sum());
    let completed_projects = monthly.iter().map(|p| p.projects).sum();
    let valid: Vec<i32> = valid_ratings(ratings);

    let mut metrics = MetricSummary {
        role: Some(input.role),
        currency: Some(input.currency),
        completed_projects,
        average_rating: average_rating(&valid),
        total_reviews: valid.len() as u32,
        performance: performance(&mine, input.role),
        ..MetricSummary::default()
    };
    match input.role {
        Role::Freelancer => {
            metrics.total_earnings = Some(total);
            metrics.active_clients = Some(active_clients(&mine));
        }
        Role::Client => {
            metrics.total_spent = Some(total);
            metrics.active_projects = Some(
                mine.iter()
                    .filter(|p| p.status == ProjectStatus::Active)
                    .count() as u32,
            );
        }
    }

    AnalyticsSnapshot {
        metrics,
        charts: ChartSet {
            time_range: input.time_range,
            monthly,
            rating_distribution: rating_distribution(&valid),
            status_breakdown: status_breakdown(&mine),
        },
        pending_review_projects: Vec::new(),
    }
}

/// Fixed-length series over the window, oldest bucket first.
///
/// Calendar months for month/quarter/year. A week is one bucket covering
/// exactly the last seven days, labelled by the window rather than a month.
fn monthly_series(projects: &[&Project], input: &AggregateInput<'_>) -> Vec<MonthlyPoint> {
    let window_start = input.time_range.window_start(input.now);
    let last = month_index(input.now);
    let first = last - (input.time_range.buckets() as i32 - 1);

    let mut series: Vec<MonthlyPoint> = match input.time_range {
        TimeRange::Week => vec![MonthlyPoint {
            month: window_start.format("%Y-%m-%d").to_string(),
            label: "Last 7 days".to_string(),
            amount: 0.0,
            projects: 0,
        }],
        _ => (first..=last)
            .map(|index| {
                let start = first_of_month(index);
                MonthlyPoint {
                    month: start.format("%Y-%m").to_string(),
                    label: start.format("%b").to_string(),
                    amount: 0.0,
                    projects: 0,
                }
            })
            .collect(),
    };

    for project in projects.iter().filter(|p| p.is_completed()) {
        let settled = to_utc(project.settled_at());
        if settled < window_start || settled > input.now {
            continue;
        }
        let slot = match input.time_range {
            TimeRange::Week => 0,
            _ => month_index(settled) - first,
        };
        let Some(point) = usize::try_from(slot).ok().and_then(|i| series.get_mut(i)) else {
            continue;
        };
        let amount = input
            .rates
            .convert(project.amount(), project.currency, input.currency);
        point.amount += amount.max(0.0);
        point.projects += 1;
    }

    for point in series.iter_mut() {
        point.amount = round2(point.amount);
    }
    series
}

fn valid_ratings(ratings: &[i32]) -> Vec<i32> {
    ratings
        .iter()
        .copied()
        .filter(|r| {
            let ok = (1..=5).contains(r);
            if !ok {
                warn!("Skipping out-of-range rating {}", r);
            }
            ok
        })
        .collect()
}

/// Mean rating rounded to one decimal; `0.0` when there are none.
pub fn average_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let mean = ratings.iter().map(|&r| r as f64).sum::<f64>() / ratings.len() as f64;
    round1(mean).clamp(0.0, 5.0)
}

/// Five buckets, one per star count, always present.
pub fn rating_distribution(ratings: &[i32]) -> Vec<RatingBucket> {
    let total = ratings.len();
    (1..=5)
        .map(|stars| {
            let count = ratings.iter().filter(|&&r| r == stars).count();
            RatingBucket {
                stars,
                count: count as u32,
                percentage: percent(count, total),
            }
        })
        .collect()
}

pub fn status_breakdown(projects: &[&Project]) -> Vec<StatusCount> {
    ProjectStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: projects.iter().filter(|p| p.status == status).count() as u32,
        })
        .collect()
}

fn active_clients(projects: &[&Project]) -> u32 {
    projects
        .iter()
        .filter(|p| p.status == ProjectStatus::Active)
        .map(|p| p.client.id)
        .collect::<HashSet<_>>()
        .len() as u32
}

pub fn performance(projects: &[&Project], role: Role) -> PerformanceMetrics {
    let completed: Vec<&&Project> = projects.iter().filter(|p| p.is_completed()).collect();

    let with_deadline: Vec<_> = completed
        .iter()
        .filter_map(|p| p.deadline.map(|deadline| (p.settled_at(), deadline)))
        .collect();
    let on_time = with_deadline
        .iter()
        .filter(|(settled, deadline)| settled <= deadline)
        .count();
    let on_time_delivery_rate =
        (!with_deadline.is_empty()).then(|| percent(on_time, with_deadline.len()));

    let mut per_counterparty: HashMap<ObjectId, usize> = HashMap::new();
    for project in projects {
        *per_counterparty
            .entry(project.party(role.counterpart()).id)
            .or_default() += 1;
    }
    let repeat = per_counterparty.values().filter(|&&n| n > 1).count();

    PerformanceMetrics {
        on_time_delivery_rate,
        completion_rate: percent(completed.len(), projects.len()),
        repeat_counterparty_rate: percent(repeat, per_counterparty.len()),
    }
}

/// Wallet figures in the display currency, credits and debits limited to the window.
pub fn wallet_summary(
    wallet: &WalletSnapshot,
    rates: &RateTable,
    currency: Currency,
    time_range: TimeRange,
    now: DateTime<Utc>,
) -> WalletSummary {
    let convert = |amount: f64| round2(rates.convert(amount, wallet.currency, currency));
    let window_start = time_range.window_start(now);
    let in_window = |tx: &&Transaction| {
        let at = to_utc(tx.created_at);
        at >= window_start && at <= now
    };

    let credits = wallet
        .transactions
        .iter()
        .filter(in_window)
        .filter(|tx| tx.amount > 0.0)
        .map(|tx| tx.amount)
        .sum::<f64>();
    let debits = wallet
        .transactions
        .iter()
        .filter(in_window)
        .filter(|tx| tx.amount < 0.0)
        .map(|tx| -tx.amount)
        .sum::<f64>();

    let mut recent: Vec<&Transaction> = wallet.transactions.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    WalletSummary {
        currency,
        balance: convert(wallet.balance),
        pending_balance: convert(wallet.pending_balance),
        credits: convert(credits),
        debits: convert(debits),
        recent_transactions: recent
            .into_iter()
            .take(RECENT_TRANSACTIONS)
            .map(|tx| TransactionResponse::converted(tx, convert(tx.amount)))
            .collect(),
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round1(part as f64 * 100.0 / whole as f64)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{at, completed_project};
    use crate::models::{Currency, TransactionType};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 20, 8, 0, 0).unwrap()
    }

    fn input<'a>(
        user: &'a ObjectId,
        role: Role,
        projects: Option<&'a [Project]>,
        ratings: Option<&'a [i32]>,
        rates: &'a RateTable,
        time_range: TimeRange,
    ) -> AggregateInput<'a> {
        AggregateInput {
            user_id: user,
            role,
            projects,
            received_ratings: ratings,
            rates,
            currency: Currency::Usd,
            time_range,
            now: now(),
        }
    }

    #[test]
    fn series_length_follows_time_range() {
        let user = ObjectId::new();
        let rates = RateTable::fallback(83.0, now());
        for (range, expected) in [
            (TimeRange::Week, 1),
            (TimeRange::Month, 1),
            (TimeRange::Quarter, 3),
            (TimeRange::Year, 12),
        ] {
            let snapshot = aggregate(&input(&user, Role::Freelancer, Some(&[]), None, &rates, range));
            assert_eq!(snapshot.charts.monthly.len(), expected);
            assert!(snapshot.charts.monthly.iter().all(|p| p.amount == 0.0));
        }
    }

    #[test]
    fn earnings_land_in_their_month_and_convert() {
        let me = ObjectId::new();
        let rates = RateTable::fallback(80.0, now());
        let mut inr = completed_project(ObjectId::new(), me, "Translation", 8000.0, 2026, 9);
        inr.currency = Currency::Inr;
        let projects = vec![
            completed_project(ObjectId::new(), me, "Logo", 150.0, 2026, 10),
            inr,
            completed_project(ObjectId::new(), me, "Too old", 999.0, 2025, 1),
            completed_project(me, ObjectId::new(), "Hired someone", 500.0, 2026, 10),
        ];

        let snapshot = aggregate(&input(
            &me,
            Role::Freelancer,
            Some(&projects),
            None,
            &rates,
            TimeRange::Quarter,
        ));

        let monthly = &snapshot.charts.monthly;
        assert_eq!(monthly.iter().map(|p| p.month.as_str()).collect::<Vec<_>>(), ["2026-08", "2026-09", "2026-10"]);
        assert_eq!(monthly[0].amount, 0.0);
        assert_eq!(monthly[1].amount, 100.0);
        assert_eq!(monthly[2].amount, 150.0);
        assert_eq!(snapshot.metrics.total_earnings, Some(250.0));
        assert_eq!(snapshot.metrics.total_spent, None);
        assert_eq!(snapshot.metrics.completed_projects, 2);
    }

    #[test]
    fn week_bucket_spans_month_boundary() {
        let me = ObjectId::new();
        let rates = RateTable::fallback(83.0, now());
        let mut late_september = completed_project(ObjectId::new(), me, "Retainer", 120.0, 2026, 9);
        late_september.completed_at = Some(at(2026, 9, 28));
        let stale = completed_project(ObjectId::new(), me, "Stale", 70.0, 2026, 9);
        let projects = vec![late_september, stale];

        let mut week = input(&me, Role::Freelancer, Some(&projects), None, &rates, TimeRange::Week);
        week.now = Utc.with_ymd_and_hms(2026, 10, 2, 9, 0, 0).unwrap();
        let snapshot = aggregate(&week);

        let monthly = &snapshot.charts.monthly;
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].month, "2026-09-25");
        assert_eq!(monthly[0].label, "Last 7 days");
        assert_eq!(monthly[0].amount, 120.0);
        assert_eq!(monthly[0].projects, 1);
        assert_eq!(snapshot.metrics.total_earnings, Some(120.0));
    }

    #[test]
    fn average_rating_is_bounded_and_zero_when_empty() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[5, 4, 4]), 4.3);
        assert_eq!(average_rating(&[1]), 1.0);

        let user = ObjectId::new();
        let rates = RateTable::fallback(83.0, now());
        let ratings = [5, 0, 9, 3];
        let snapshot = aggregate(&input(&user, Role::Client, None, Some(&ratings), &rates, TimeRange::Year));
        assert_eq!(snapshot.metrics.average_rating, 4.0);
        assert_eq!(snapshot.metrics.total_reviews, 2);
    }

    #[test]
    fn rating_distribution_always_has_five_buckets() {
        let empty = rating_distribution(&[]);
        assert_eq!(empty.len(), 5);
        assert!(empty.iter().all(|b| b.count == 0 && b.percentage == 0.0));

        let buckets = rating_distribution(&[5, 5, 4, 1]);
        assert_eq!(buckets.iter().map(|b| b.stars).collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
        assert_eq!(buckets[4].count, 2);
        assert_eq!(buckets[4].percentage, 50.0);
        assert_eq!(buckets[0].percentage, 25.0);
    }

    #[test]
    fn failed_sources_default_independently() {
        let user = ObjectId::new();
        let rates = RateTable::fallback(83.0, now());
        let ratings = [4, 5];
        let snapshot = aggregate(&input(&user, Role::Freelancer, None, Some(&ratings), &rates, TimeRange::Year));

        assert_eq!(snapshot.metrics.total_earnings, Some(0.0));
        assert_eq!(snapshot.metrics.active_clients, Some(0));
        assert_eq!(snapshot.charts.monthly.len(), 12);
        assert_eq!(snapshot.charts.status_breakdown.len(), 3);
        assert_eq!(snapshot.metrics.average_rating, 4.5);
    }

    #[test]
    fn client_metrics_count_active_projects() {
        let me = ObjectId::new();
        let rates = RateTable::fallback(83.0, now());
        let mut active = completed_project(me, ObjectId::new(), "Ongoing", 40.0, 2026, 10);
        active.status = ProjectStatus::Active;
        active.completed_at = None;
        let projects = vec![active, completed_project(me, ObjectId::new(), "Done", 60.0, 2026, 10)];

        let snapshot = aggregate(&input(&me, Role::Client, Some(&projects), None, &rates, TimeRange::Month));

        assert_eq!(snapshot.metrics.active_projects, Some(1));
        assert_eq!(snapshot.metrics.total_spent, Some(60.0));
        assert_eq!(snapshot.metrics.performance.completion_rate, 50.0);
    }

    #[test]
    fn on_time_rate_uses_deadlines_only() {
        let me = ObjectId::new();
        let other = ObjectId::new();
        let mut late = completed_project(other, me, "Late", 10.0, 2026, 5);
        late.deadline = Some(at(2026, 5, 10));
        let mut early = completed_project(other, me, "Early", 10.0, 2026, 5);
        early.deadline = Some(at(2026, 5, 30));
        let no_deadline = completed_project(ObjectId::new(), me, "Open", 10.0, 2026, 5);
        let projects = [late, early, no_deadline];
        let refs: Vec<&Project> = projects.iter().collect();

        let metrics = performance(&refs, Role::Freelancer);
        assert_eq!(metrics.on_time_delivery_rate, Some(50.0));
        assert_eq!(metrics.repeat_counterparty_rate, 50.0);
        assert_eq!(performance(&refs[2..], Role::Freelancer).on_time_delivery_rate, None);
    }

    #[test]
    fn wallet_summary_converts_and_windows() {
        let rates = RateTable::fallback(80.0, now());
        let tx = |id: &str, amount: f64, month: u32| Transaction {
            id: id.to_string(),
            amount,
            kind: TransactionType::Earning,
            created_at: at(2026, month, 5),
        };
        let wallet = WalletSnapshot {
            id: None,
            user_id: ObjectId::new(),
            balance: 8000.0,
            pending_balance: 1600.0,
            currency: Currency::Inr,
            transactions: vec![tx("a", 800.0, 10), tx("b", -400.0, 10), tx("c", 8000.0, 1)],
        };

        let summary = wallet_summary(&wallet, &rates, Currency::Usd, TimeRange::Month, now());

        assert_eq!(summary.balance, 100.0);
        assert_eq!(summary.pending_balance, 20.0);
        assert_eq!(summary.credits, 10.0);
        assert_eq!(summary.debits, 5.0);
        assert_eq!(summary.recent_transactions.len(), 3);
        assert_eq!(summary.recent_transactions[2].id, "c");
    }
}
