use mongodb::bson::oid::ObjectId;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::DashboardStore;
use crate::error::{EngineError, Result};
use crate::models::{Project, Review, ReviewDirection, Role, SourceKind, WalletSnapshot};

/// In-process store with per-source failure injection.
#[derive(Default)]
pub struct MemoryStore {
    projects: RwLock<Vec<Project>>,
    reviews: RwLock<Vec<Review>>,
    wallets: RwLock<Vec<WalletSnapshot>>,
    failing: Mutex<HashSet<SourceKind>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(self, projects: Vec<Project>) -> Self {
        MemoryStore {
            projects: RwLock::new(projects),
            ..self
        }
    }

    pub fn with_reviews(self, reviews: Vec<Review>) -> Self {
        MemoryStore {
            reviews: RwLock::new(reviews),
            ..self
        }
    }

    pub fn with_wallets(self, wallets: Vec<WalletSnapshot>) -> Self {
        MemoryStore {
            wallets: RwLock::new(wallets),
            ..self
        }
    }

    /// Makes every read of `source` fail until `recover` is called.
    pub fn fail(&self, source: SourceKind) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(source);
    }

    pub fn recover(&self, source: SourceKind) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&source);
    }

    /// Number of store calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn review_count(&self) -> usize {
        self.reviews.read().await.len()
    }

    fn enter(&self, source: SourceKind) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        if failing.contains(&source) {
            return Err(EngineError::upstream(format!("{} source is down", source.as_str())));
        }
        Ok(())
    }
}

#[rocket::async_trait]
impl DashboardStore for MemoryStore {
    async fn projects_for(&self, user_id: ObjectId, role: Role) -> Result<Vec<Project>> {
        self.enter(SourceKind::Projects)?;
        Ok(self
            .projects
            .read()
            .await
            .iter()
            .filter(|p| p.party(role).id == user_id)
            .cloned()
            .collect())
    }

    async fn reviews_for(&self, user_id: ObjectId) -> Result<Vec<Review>> {
        self.enter(SourceKind::Reviews)?;
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| r.reviewer_id == user_id || r.reviewee_id == user_id)
            .cloned()
            .collect())
    }

    async fn wallet_for(&self, user_id: ObjectId) -> Result<Option<WalletSnapshot>> {
        self.enter(SourceKind::Wallet)?;
        Ok(self
            .wallets
            .read()
            .await
            .iter()
            .find(|w| w.user_id == user_id)
            .cloned())
    }

    async fn project(&self, project_id: ObjectId) -> Result<Option<Project>> {
        self.enter(SourceKind::Projects)?;
        Ok(self
            .projects
            .read()
            .await
            .iter()
            .find(|p| p.id == Some(project_id))
            .cloned())
    }

    async fn find_review(
        &self,
        project_id: ObjectId,
        direction: ReviewDirection,
    ) -> Result<Option<Review>> {
        self.enter(SourceKind::Reviews)?;
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .find(|r| r.project_id == project_id && r.direction == direction)
            .cloned())
    }

    async fn insert_review(&self, mut review: Review) -> Result<Review> {
        self.enter(SourceKind::Reviews)?;
        let mut reviews = self.reviews.write().await;
        if reviews
            .iter()
            .any(|r| r.project_id == review.project_id && r.direction == review.direction)
        {
            return Err(EngineError::conflict("A review for this project already exists"));
        }
        review.id.get_or_insert_with(ObjectId::new);
        reviews.push(review.clone());
        Ok(review)
    }
}
