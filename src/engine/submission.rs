use log::info;
use mongodb::bson::{oid::ObjectId, DateTime};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::Serialize;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use validator::Validate;

use crate::engine::session::DEFAULT_CAPACITY;
use crate::error::{EngineError, Result};
use crate::models::{CreateReviewDto, Review, ReviewDirection, ReviewResponse};
use crate::store::DashboardStore;
use crate::utils::validation::{parse_object_id, required_object_id, validate_rating};

/// Lifecycle of one reviewer's submission for one project.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Success { review: ReviewResponse },
    Failed { reason: String },
}

type SubmissionKey = (ObjectId, ObjectId); // (reviewer, project)

/// Guards against double submits: a key in `Submitting` or `Success`
/// refuses a new attempt. Only the most recent `capacity` keys are kept;
/// an evicted `Success` still ends in `Conflict` through the store.
pub struct SubmissionTracker {
    states: Mutex<LruCache<SubmissionKey, SubmissionState>>,
}

impl Default for SubmissionTracker {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        SubmissionTracker {
            states: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn state(&self, reviewer_id: ObjectId, project_id: ObjectId) -> SubmissionState {
        self.states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .peek(&(reviewer_id, project_id))
            .cloned()
            .unwrap_or(SubmissionState::Idle)
    }

    fn begin(&self, key: SubmissionKey) -> Result<()> {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        let refusal = match states.peek(&key) {
            Some(SubmissionState::Submitting) => {
                Some("A review for this project is already being submitted")
            }
            Some(SubmissionState::Success { .. }) => Some("You have already reviewed this project"),
            _ => None,
        };
        if let Some(reason) = refusal {
            return Err(EngineError::conflict(reason));
        }
        states.put(key, SubmissionState::Submitting);
        Ok(())
    }

    fn finish(&self, key: SubmissionKey, outcome: &Result<Review>) {
        let state = match outcome {
            Ok(review) => SubmissionState::Success {
                review: ReviewResponse::from(review),
            },
            Err(e) => SubmissionState::Failed {
                reason: e.to_string(),
            },
        };
        self.states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .put(key, state);
    }
}

/// A submission that passed local checks; nothing has touched the store yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub project_id: ObjectId,
    pub reviewer_id: ObjectId,
    pub rating: i32,
    pub comment: Option<String>,
    pub reviewee_id: Option<ObjectId>,
    pub freelancer_id: Option<ObjectId>,
    pub client_id: Option<ObjectId>,
    pub direction: Option<ReviewDirection>,
}

fn optional_id(value: &Option<String>, field: &str) -> Result<Option<ObjectId>> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_object_id(v, field))
        .transpose()
}

pub fn validate_draft(dto: &CreateReviewDto) -> Result<ReviewDraft> {
    let rating = validate_rating(dto.rating.as_ref())?;
    dto.validate()
        .map_err(|_| EngineError::validation("Comment must be at most 2000 characters"))?;

    let direction = match dto.kind.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(kind) => Some(
            ReviewDirection::parse(kind)
                .ok_or_else(|| EngineError::validation(format!("Unknown review type '{}'", kind)))?,
        ),
        None => None,
    };

    Ok(ReviewDraft {
        project_id: required_object_id(dto.project_id.as_deref(), "projectId")?,
        reviewer_id: required_object_id(dto.reviewer_id.as_deref(), "reviewerId")?,
        rating,
        comment: dto
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        reviewee_id: optional_id(&dto.reviewee_id, "reviewee ID")?,
        freelancer_id: optional_id(&dto.freelancer_id, "freelancer ID")?,
        client_id: optional_id(&dto.client_id, "client ID")?,
        direction,
    })
}

/// Validates locally, then records the review or fails without writing.
pub async fn submit_review(
    store: &dyn DashboardStore,
    tracker: &SubmissionTracker,
    dto: &CreateReviewDto,
) -> Result<Review> {
    let draft = validate_draft(dto)?;
    let key = (draft.reviewer_id, draft.project_id);

    tracker.begin(key)?;
    let outcome = record(store, &draft).await;
    tracker.finish(key, &outcome);

    match &outcome {
        Ok(review) => info!(
            "Review {} recorded on project {}",
            review.direction.as_str(),
            review.project_id
        ),
        Err(e) => info!("Review on project {} rejected: {}", draft.project_id, e),
    }
    outcome
}

async fn record(store: &dyn DashboardStore, draft: &ReviewDraft) -> Result<Review> {
    let project = store
        .project(draft.project_id)
        .await?
        .ok_or_else(|| EngineError::not_found("Project not found"))?;

    let role = project
        .role_of(&draft.reviewer_id)
        .ok_or_else(|| EngineError::not_found("Reviewer is not a party to this project"))?;

    if !project.is_completed() {
        return Err(EngineError::validation("Only completed projects can be reviewed"));
    }

    let direction = role.authored_direction();
    let reviewee = project.party(role.counterpart()).id;

    if draft.direction.is_some_and(|d| d != direction) {
        return Err(EngineError::validation(format!(
            "Review type does not match reviewer role ({})",
            direction.as_str()
        )));
    }
    let mismatched = draft.reviewee_id.is_some_and(|id| id != reviewee)
        || draft.freelancer_id.is_some_and(|id| id != project.freelancer.id)
        || draft.client_id.is_some_and(|id| id != project.client.id);
    if mismatched {
        return Err(EngineError::validation("Reviewee does not match the project counterparty"));
    }

    if store.find_review(draft.project_id, direction).await?.is_some() {
        return Err(EngineError::conflict("You have already reviewed this project"));
    }

    store
        .insert_review(Review {
            id: None,
            project_id: draft.project_id,
            reviewer_id: draft.reviewer_id,
            reviewee_id: reviewee,
            direction,
            rating: draft.rating,
            comment: draft.comment.clone(),
            created_at: DateTime::now(),
        })
        .await
}
