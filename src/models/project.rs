use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

use super::{Currency, PartyRef, Role};
use crate::utils::time::to_rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Completed,
    Pending,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [
        ProjectStatus::Active,
        ProjectStatus::Completed,
        ProjectStatus::Pending,
    ];
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Project {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>, // department-equivalent, e.g. "Design"
    pub client: PartyRef,
    pub freelancer: PartyRef,
    pub budget: f64,
    pub total_earnings: Option<f64>,
    pub currency: Currency,
    pub status: ProjectStatus,
    pub deadline: Option<DateTime>,
    pub completed_at: Option<DateTime>,
    pub created_at: DateTime,
}

impl Project {
    /// Settled amount when known, otherwise the agreed budget.
    pub fn amount(&self) -> f64 {
        self.total_earnings.unwrap_or(self.budget)
    }

    pub fn is_completed(&self) -> bool {
        self.status == ProjectStatus::Completed
    }

    pub fn party(&self, role: Role) -> &PartyRef {
        match role {
            Role::Client => &self.client,
            Role::Freelancer => &self.freelancer,
        }
    }

    /// Role the user plays on this project, if any.
    pub fn role_of(&self, user_id: &ObjectId) -> Option<Role> {
        if &self.client.id == user_id {
            Some(Role::Client)
        } else if &self.freelancer.id == user_id {
            Some(Role::Freelancer)
        } else {
            None
        }
    }

    /// Completion date, falling back to creation for legacy rows without one.
    pub fn settled_at(&self) -> DateTime {
        self.completed_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Serialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub client_id: String,
    pub client_name: String,
    pub freelancer_id: String,
    pub freelancer_name: String,
    pub amount: f64,
    pub currency: Currency,
    pub status: ProjectStatus,
    pub completed_at: Option<String>,
    pub created_at: String,
}

impl From<&Project> for ProjectResponse {
    fn from(project: &Project) -> Self {
        ProjectResponse {
            id: project.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: project.title.clone(),
            description: project.description.clone(),
            category: project.category.clone(),
            client_id: project.client.id.to_hex(),
            client_name: project.client.name.clone(),
            freelancer_id: project.freelancer.id.to_hex(),
            freelancer_name: project.freelancer.name.clone(),
            amount: project.amount(),
            currency: project.currency,
            status: project.status,
            completed_at: project.completed_at.map(to_rfc3339),
            created_at: to_rfc3339(project.created_at),
        }
    }
}
