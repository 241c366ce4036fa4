use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::error::{ErrorKind, WriteError, WriteFailure};
use mongodb::options::FindOptions;
use mongodb::{Collection, Database};
use rocket::futures::TryStreamExt;

use super::DashboardStore;
use crate::error::{EngineError, Result};
use crate::models::{Project, Review, ReviewDirection, Role, WalletSnapshot};

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    db: Option<Database>,
}

impl MongoStore {
    pub fn new(db: Option<Database>) -> Self {
        MongoStore { db }
    }

    fn db(&self) -> Result<&Database> {
        self.db
            .as_ref()
            .ok_or_else(|| EngineError::upstream("Database not connected"))
    }

    fn projects(&self) -> Result<Collection<Project>> {
        Ok(self.db()?.collection::<Project>("projects"))
    }

    fn reviews(&self) -> Result<Collection<Review>> {
        Ok(self.db()?.collection::<Review>("reviews"))
    }

    fn wallets(&self) -> Result<Collection<WalletSnapshot>> {
        Ok(self.db()?.collection::<WalletSnapshot>("wallets"))
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code: DUPLICATE_KEY, .. }))
    )
}

#[rocket::async_trait]
impl DashboardStore for MongoStore {
    async fn projects_for(&self, user_id: ObjectId, role: Role) -> Result<Vec<Project>> {
        let mut filter = Document::new();
        filter.insert(format!("{}.id", role.as_str()), user_id);

        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let projects: Vec<Project> = self
            .projects()?
            .find(filter, find_options)
            .await?
            .try_collect()
            .await?;
        Ok(projects)
    }

    async fn reviews_for(&self, user_id: ObjectId) -> Result<Vec<Review>> {
        let filter = doc! {
            "$or": [
                { "reviewer_id": user_id },
                { "reviewee_id": user_id },
            ]
        };

        let reviews: Vec<Review> = self
            .reviews()?
            .find(filter, None)
            .await?
            .try_collect()
            .await?;
        Ok(reviews)
    }

    async fn wallet_for(&self, user_id: ObjectId) -> Result<Option<WalletSnapshot>> {
        Ok(self
            .wallets()?
            .find_one(doc! { "user_id": user_id }, None)
            .await?)
    }

    async fn project(&self, project_id: ObjectId) -> Result<Option<Project>> {
        Ok(self
            .projects()?
            .find_one(doc! { "_id": project_id }, None)
            .await?)
    }

    async fn find_review(
        &self,
        project_id: ObjectId,
        direction: ReviewDirection,
    ) -> Result<Option<Review>> {
        Ok(self
            .reviews()?
            .find_one(
                doc! { "project_id": project_id, "direction": direction.as_str() },
                None,
            )
            .await?)
    }

    async fn insert_review(&self, mut review: Review) -> Result<Review> {
        let result = self
            .reviews()?
            .insert_one(&review, None)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    EngineError::conflict("A review for this project already exists")
                } else {
                    EngineError::upstream(format!("Failed to create review: {}", e))
                }
            })?;

        review.id = result.inserted_id.as_object_id();
        Ok(review)
    }
}
