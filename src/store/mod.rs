pub mod memory;
pub mod mongo;

use mongodb::bson::oid::ObjectId;

use crate::error::Result;
use crate::models::{Project, Review, ReviewDirection, Role, WalletSnapshot};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Read/write access to the marketplace data the engine reconciles.
///
/// Reads fail with `UpstreamUnavailable`; `insert_review` reports a duplicate
/// `(project, direction)` as `Conflict` and never writes partially.
#[rocket::async_trait]
pub trait DashboardStore: Send + Sync {
    async fn projects_for(&self, user_id: ObjectId, role: Role) -> Result<Vec<Project>>;

    /// Reviews written by or about the user.
    async fn reviews_for(&self, user_id: ObjectId) -> Result<Vec<Review>>;

    async fn wallet_for(&self, user_id: ObjectId) -> Result<Option<WalletSnapshot>>;

    async fn project(&self, project_id: ObjectId) -> Result<Option<Project>>;

    async fn find_review(
        &self,
        project_id: ObjectId,
        direction: ReviewDirection,
    ) -> Result<Option<Review>>;

    async fn insert_review(&self, review: Review) -> Result<Review>;
}
