use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::booking::blank_to_none;
use crate::{CoreError, CoreResult};

pub const DEFAULT_TITLE: &str = "Untitled trip";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTripPlan {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub trip_plan: Value,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripPlanDraft {
    pub title: Option<String>,
    pub trip_plan: Option<Value>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct NewTripPlan {
    pub user_id: String,
    pub title: String,
    pub trip_plan: Value,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl TripPlanDraft {
    pub fn validate(self, user_id: &str, now: DateTime<Utc>) -> CoreResult<NewTripPlan> {
        let trip_plan = match self.trip_plan {
            None | Some(Value::Null) => return Err(CoreError::validation("'trip_plan' is required")),
            Some(plan) => plan,
        };

        Ok(NewTripPlan {
            user_id: user_id.to_string(),
            title: blank_to_none(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            trip_plan,
            metadata: self.metadata.filter(|m| !m.is_null()),
            created_at: now,
        })
    }
}
