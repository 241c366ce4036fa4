use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use std::str::FromStr;

use super::{Currency, ProjectStatus, ReviewRow, Role};
use crate::utils::time::month_index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Week,
    Month,
    Quarter,
    #[default]
    Year,
}

impl TimeRange {
    /// Number of monthly buckets the earnings series carries.
    pub fn buckets(self) -> usize {
        match self {
            TimeRange::Week | TimeRange::Month => 1,
            TimeRange::Quarter => 3,
            TimeRange::Year => 12,
        }
    }

    /// Start of the reporting window that ends at `now`.
    pub fn window_start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeRange::Week => now - Duration::days(7),
            _ => first_of_month(month_index(now) - (self.buckets() as i32 - 1)),
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(TimeRange::Week),
            "month" => Ok(TimeRange::Month),
            "quarter" => Ok(TimeRange::Quarter),
            "year" => Ok(TimeRange::Year),
            other => Err(format!(
                "Unknown time range '{}'. Use week, month, quarter or year",
                other
            )),
        }
    }
}

pub fn first_of_month(index: i32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

#[derive(Debug, Serialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    pub month: String, // "2026-10", or the window start "2026-09-25" for a week
    pub label: String, // "Oct" or "Last 7 days"
    pub amount: f64,
    pub projects: u32,
}

#[derive(Debug, Serialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingBucket {
    pub stars: i32,
    pub count: u32,
    pub percentage: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: ProjectStatus,
    pub count: u32,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Share of deadline-bearing completed projects delivered on time, in percent.
    /// Absent when no completed project carried a deadline.
    pub on_time_delivery_rate: Option<f64>,
    pub completion_rate: f64,
    pub repeat_counterparty_rate: f64,
}

/// Headline numbers. Only the role-appropriate variant of each paired field is set.
#[derive(Debug, Serialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub role: Option<Role>,
    pub currency: Option<Currency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_earnings: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_spent: Option<f64>,
    pub completed_projects: u32,
    pub average_rating: f64,
    pub total_reviews: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_clients: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_projects: Option<u32>,
    pub performance: PerformanceMetrics,
}

impl MetricSummary {
    pub fn total(&self) -> f64 {
        self.total_earnings.or(self.total_spent).unwrap_or(0.0)
    }
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartSet {
    pub time_range: TimeRange,
    pub monthly: Vec<MonthlyPoint>,
    pub rating_distribution: Vec<RatingBucket>,
    pub status_breakdown: Vec<StatusCount>,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    #[serde(flatten)]
    pub metrics: MetricSummary,
    #[serde(flatten)]
    pub charts: ChartSet,
    pub pending_review_projects: Vec<ReviewRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_start_on_month_boundaries() {
        let now = Utc.with_ymd_and_hms(2026, 2, 14, 9, 30, 0).unwrap();
        assert_eq!(
            TimeRange::Month.window_start(now),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            TimeRange::Quarter.window_start(now),
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            TimeRange::Year.window_start(now),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            TimeRange::Week.window_start(now),
            Utc.with_ymd_and_hms(2026, 2, 7, 9, 30, 0).unwrap()
        );
    }

    #[test]
    fn parses_time_ranges() {
        assert_eq!("Quarter".parse::<TimeRange>(), Ok(TimeRange::Quarter));
        assert!("decade".parse::<TimeRange>().is_err());
        assert_eq!(TimeRange::default(), TimeRange::Year);
    }
}
