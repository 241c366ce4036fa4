//! Fixtures shared by the engine's unit tests.

use chrono::{TimeZone, Utc};
use mongodb::bson::{oid::ObjectId, DateTime};

use crate::models::{Currency, PartyRef, Project, ProjectStatus, Review, ReviewDirection};
use crate::utils::time::from_utc;

pub fn at(year: i32, month: u32, day: u32) -> DateTime {
    from_utc(Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap())
}

pub fn completed_project(
    client: ObjectId,
    freelancer: ObjectId,
    title: &str,
    amount: f64,
    year: i32,
    month: u32,
) -> Project {
    Project {
        id: Some(ObjectId::new()),
        title: title.to_string(),
        description: None,
        category: Some("Design".to_string()),
        client: PartyRef { id: client, name: "Client".to_string() },
        freelancer: PartyRef { id: freelancer, name: "Freelancer".to_string() },
        budget: amount,
        total_earnings: None,
        currency: Currency::Usd,
        status: ProjectStatus::Completed,
        deadline: None,
        completed_at: Some(at(year, month, 15)),
        created_at: at(year, month, 1),
    }
}

pub fn review(
    project_id: ObjectId,
    reviewer: ObjectId,
    reviewee: ObjectId,
    direction: ReviewDirection,
    rating: i32,
) -> Review {
    Review {
        id: Some(ObjectId::new()),
        project_id,
        reviewer_id: reviewer,
        reviewee_id: reviewee,
        direction,
        rating,
        comment: None,
        created_at: DateTime::now(),
    }
}
