use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;
use std::fmt;
use std::str::FromStr;

use super::ReviewDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Freelancer,
}

impl Role {
    pub fn counterpart(self) -> Role {
        match self {
            Role::Client => Role::Freelancer,
            Role::Freelancer => Role::Client,
        }
    }

    /// Direction of a review written by someone acting in this role.
    pub fn authored_direction(self) -> ReviewDirection {
        match self {
            Role::Client => ReviewDirection::ClientToFreelancer,
            Role::Freelancer => ReviewDirection::FreelancerToClient,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Freelancer => "freelancer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "freelancer" => Ok(Role::Freelancer),
            other => Err(format!("Unknown role '{}'. Use 'client' or 'freelancer'", other)),
        }
    }
}

/// A party to a project, denormalized onto the project document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PartyRef {
    pub id: ObjectId,
    pub name: String,
}
