use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use voyage_core::events::EventSink;
use voyage_core::models::{SavedTripPlan, TripPlanDraft};
use voyage_core::repository::{TripPlanRepository, UserRepository};
use voyage_core::{CoreError, CoreResult};
use voyage_shared::models::events::{DomainEvent, TripPlanSavedEvent};

/// Saved itineraries, one collection document per plan.
pub struct TripPlanStore {
    users: Arc<dyn UserRepository>,
    plans: Arc<dyn TripPlanRepository>,
    events: Arc<dyn EventSink>,
}

impl TripPlanStore {
    pub fn new(
        users: Arc<dyn UserRepository>,
        plans: Arc<dyn TripPlanRepository>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self { users, plans, events }
    }

    pub async fn save_trip_plan(&self, user_id: &str, draft: TripPlanDraft) -> CoreResult<SavedTripPlan> {
        let new_plan = draft.validate(user_id, Utc::now())?;
        if self.users.get_user(user_id).await?.is_none() {
            return Err(CoreError::validation(format!("Unknown user '{}'", user_id)));
        }

        let plan = self.plans.create_plan(&new_plan).await?;
        info!(plan_id = %plan.id, user_id = %user_id, "Saved trip plan '{}'", plan.title);

        self.events
            .publish(DomainEvent::TripPlanSaved(TripPlanSavedEvent {
                plan_id: plan.id.clone(),
                user_id: plan.user_id.clone(),
                title: plan.title.clone(),
                timestamp: plan.created_at.timestamp(),
            }))
            .await;

        Ok(plan)
    }

    /// Every plan owned by `user_id`, newest first.
    pub async fn list_my_saved_plans(&self, user_id: &str) -> CoreResult<Vec<SavedTripPlan>> {
        self.plans.list_plans(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{repositories, seed_user, RecordingSink};
    use serde_json::json;
    use voyage_core::models::DEFAULT_TITLE;
    use voyage_store::JsonFieldMode;

    async fn store(mode: JsonFieldMode) -> (TripPlanStore, Arc<RecordingSink>) {
        let repos = repositories(mode);
        seed_user(&repos, "user_01").await;
        seed_user(&repos, "user_02").await;
        let sink = Arc::new(RecordingSink::default());
        (TripPlanStore::new(repos.clone(), repos, sink.clone()), sink)
    }

    fn goa_plan() -> serde_json::Value {
        json!({
            "destination": "Goa",
            "days": [
                {"day": 1, "activities": ["Baga beach", "Fort Aguada"]},
                {"day": 2, "activities": ["Dudhsagar falls"]}
            ],
            "budget": {"amount": 30000, "currency": "INR"}
        })
    }

    #[tokio::test]
    async fn test_plans_round_trip_in_both_modes() {
        for mode in [JsonFieldMode::Serialized, JsonFieldMode::Native] {
            let (store, _) = store(mode).await;
            let draft = TripPlanDraft {
                title: Some("Goa long weekend".to_string()),
                trip_plan: Some(goa_plan()),
                metadata: Some(json!({"source": "chat"})),
            };
            store.save_trip_plan("user_01", draft).await.unwrap();

            let plans = store.list_my_saved_plans("user_01").await.unwrap();
            assert_eq!(plans.len(), 1);
            assert_eq!(plans[0].title, "Goa long weekend");
            assert_eq!(plans[0].trip_plan, goa_plan());
            assert_eq!(plans[0].metadata, Some(json!({"source": "chat"})));
        }
    }

    #[tokio::test]
    async fn test_plans_are_scoped_to_owner_and_newest_first() {
        let (store, sink) = store(JsonFieldMode::default()).await;
        for title in ["first", "second"] {
            let draft = TripPlanDraft {
                title: Some(title.to_string()),
                trip_plan: Some(goa_plan()),
                metadata: None,
            };
            store.save_trip_plan("user_01", draft).await.unwrap();
        }
        let untitled = TripPlanDraft {
            trip_plan: Some(json!({"destination": "Manali"})),
            ..Default::default()
        };
        store.save_trip_plan("user_02", untitled).await.unwrap();

        let titles: Vec<String> = store
            .list_my_saved_plans("user_01")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);

        let theirs = store.list_my_saved_plans("user_02").await.unwrap();
        assert_eq!(theirs[0].title, DEFAULT_TITLE);
        assert_eq!(sink.events.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_plan_is_rejected() {
        let (store, sink) = store(JsonFieldMode::default()).await;
        let err = store
            .save_trip_plan("user_01", TripPlanDraft::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(sink.events.lock().unwrap().is_empty());
        assert!(store.list_my_saved_plans("user_01").await.unwrap().is_empty());
    }
}
