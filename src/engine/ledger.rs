use indexmap::IndexMap;
use log::warn;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;

use crate::models::{
    Obligation, Project, Review, ReviewDirection, ReviewResponse, ReviewRow, Role, Section,
    SectionCounts,
};
use crate::utils::time::to_rfc3339;

/// Who has reviewed whom, from one user's point of view in one role.
///
/// Every completed project the user takes part in lands in exactly one of
/// `given ∪ received` or the two reviewable lists. A counterparty review on a
/// project still awaiting the user's return review is held back from
/// `received` but its rating still counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewLedger {
    pub given: Vec<ReviewRow>,
    pub received: Vec<ReviewRow>,
    pub needs_first_review: Vec<ReviewRow>,
    pub needs_return_review: Vec<ReviewRow>,
    ratings: Vec<i32>,
}

impl ReviewLedger {
    pub fn build(user_id: &ObjectId, role: Role, projects: &[Project], reviews: &[Review]) -> Self {
        let projects: Vec<&Project> = projects
            .iter()
            .filter(|p| p.role_of(user_id) == Some(role))
            .collect();
        let by_id: HashMap<ObjectId, &Project> = projects
            .iter()
            .copied()
            .filter_map(|p| p.id.map(|id| (id, p)))
            .collect();

        let authored = role.authored_direction();
        let incoming = role.counterpart().authored_direction();

        // One review per (project, direction); keep the earliest.
        let mut unique: IndexMap<(ObjectId, ReviewDirection), &Review> = IndexMap::new();
        let mut sorted: Vec<&Review> = reviews
            .iter()
            .filter(|r| {
                (r.direction == authored && &r.reviewer_id == user_id)
                    || (r.direction == incoming && &r.reviewee_id == user_id)
            })
            .collect();
        sorted.sort_by_key(|r| r.created_at);
        for review in sorted {
            let key = (review.project_id, review.direction);
            if unique.contains_key(&key) {
                warn!(
                    "Duplicate {} review on project {}; keeping the earliest",
                    review.direction.as_str(),
                    review.project_id
                );
                continue;
            }
            unique.insert(key, review);
        }

        let mut ledger = ReviewLedger::default();

        for project in projects.iter().filter(|p| p.is_completed()) {
            let Some(project_id) = project.id else {
                continue;
            };
            if unique.contains_key(&(project_id, authored)) {
                continue;
            }

            let obligation = if unique.contains_key(&(project_id, incoming)) {
                Obligation::NeedsReturnReview
            } else {
                Obligation::NeedsFirstReview
            };
            let row = project_row(project, role.counterpart(), obligation);
            match obligation {
                Obligation::NeedsReturnReview => ledger.needs_return_review.push(row),
                Obligation::NeedsFirstReview => ledger.needs_first_review.push(row),
            }
        }

        for review in unique.values() {
            let project = by_id.get(&review.project_id).copied();
            if review.direction == authored {
                ledger.given.push(review_row(review, project, review.reviewee_id));
                continue;
            }

            ledger.ratings.push(review.rating);
            let awaiting_return = project.is_some_and(Project::is_completed)
                && !unique.contains_key(&(review.project_id, authored));
            if !awaiting_return {
                ledger.received.push(review_row(review, project, review.reviewer_id));
            }
        }

        ledger.given.sort_by(|a, b| newest_review_first(a, b));
        ledger.received.sort_by(|a, b| newest_review_first(a, b));
        ledger
            .needs_first_review
            .sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        ledger
            .needs_return_review
            .sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        ledger
    }

    /// Projects still awaiting the user's review, return reviews first.
    pub fn reviewable(&self) -> Vec<ReviewRow> {
        self.needs_return_review
            .iter()
            .chain(self.needs_first_review.iter())
            .cloned()
            .collect()
    }

    pub fn section(&self, section: Section) -> Vec<ReviewRow> {
        match section {
            Section::Pending => self.reviewable(),
            Section::Given => self.given.clone(),
            Section::Received => self.received.clone(),
        }
    }

    pub fn counts(&self) -> SectionCounts {
        SectionCounts {
            pending: self.needs_first_review.len() + self.needs_return_review.len(),
            needs_first_review: self.needs_first_review.len(),
            needs_return_review: self.needs_return_review.len(),
            given: self.given.len(),
            received: self.received.len(),
        }
    }

    /// Every rating the user has received in this role, including reviews
    /// held back while a return review is pending.
    pub fn received_ratings(&self) -> Vec<i32> {
        self.ratings.clone()
    }
}

fn newest_review_first(a: &ReviewRow, b: &ReviewRow) -> std::cmp::Ordering {
    let created = |row: &ReviewRow| row.review.as_ref().map(|r| r.created_at.clone());
    created(b).cmp(&created(a))
}

fn review_row(review: &Review, project: Option<&Project>, counterparty: ObjectId) -> ReviewRow {
    let counterparty_name = project
        .map(|p| {
            if p.client.id == counterparty {
                p.client.name.clone()
            } else {
                p.freelancer.name.clone()
            }
        })
        .unwrap_or_else(|| "Unknown user".to_string());

    ReviewRow {
        project_id: review.project_id.to_hex(),
        project_title: project
            .map(|p| p.title.clone())
            .unwrap_or_else(|| "Unknown project".to_string()),
        category: project.and_then(|p| p.category.clone()),
        counterparty_id: counterparty.to_hex(),
        counterparty_name,
        amount: project.map(Project::amount).unwrap_or(0.0),
        currency: project.map(|p| p.currency),
        completed_at: project.and_then(|p| p.completed_at).map(to_rfc3339),
        obligation: None,
        review: Some(ReviewResponse::from(review)),
    }
}

fn project_row(
    project: &Project,
    counterparty_role: Role,
    obligation: Obligation,
) -> ReviewRow {
    let counterparty = project.party(counterparty_role);
    ReviewRow {
        project_id: project.id.map(|id| id.to_hex()).unwrap_or_default(),
        project_title: project.title.clone(),
        category: project.category.clone(),
        counterparty_id: counterparty.id.to_hex(),
        counterparty_name: counterparty.name.clone(),
        amount: project.amount(),
        currency: Some(project.currency),
        completed_at: project.completed_at.map(to_rfc3339),
        obligation: Some(obligation),
        review: None,
    }
}
