use log::{error, info};
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};
use mongodb::bson::doc;

use crate::models::Review;

pub async fn connect() -> Result<Database, mongodb::error::Error> {
    let uri = crate::config::Config::mongodb_uri();
    let client = Client::with_uri_str(&uri).await?;

    // Test connection
    client
        .database("admin")
        .run_command(doc! {"ping": 1}, None)
        .await?;

    let database = client.database(&crate::config::Config::mongodb_database());
    ensure_indexes(&database).await?;
    Ok(database)
}

/// One review per (project, direction), also under concurrent inserts.
async fn ensure_indexes(database: &Database) -> Result<(), mongodb::error::Error> {
    let unique_review = IndexModel::builder()
        .keys(doc! { "project_id": 1, "direction": 1 })
        .options(
            IndexOptions::builder()
                .unique(true)
                .name("project_direction_unique".to_string())
                .build(),
        )
        .build();

    database
        .collection::<Review>("reviews")
        .create_index(unique_review, None)
        .await?;
    Ok(())
}

/// Connects, or returns `None` so the service can start degraded.
pub async fn init() -> Option<Database> {
    match connect().await {
        Ok(database) => {
            info!("✓ MongoDB connected successfully");
            Some(database)
        }
        Err(e) => {
            error!("✗ Failed to connect to MongoDB: {}", e);
            None
        }
    }
}
