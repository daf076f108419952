use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use voyage_core::identity::AuthUser;
use voyage_core::models::{SavedTripPlan, TripPlanDraft};

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/save-trip-plan", post(save_trip_plan))
        .route("/api/my-saved-plans", get(my_saved_plans))
}

#[derive(Debug, Serialize)]
struct SavedPlanResponse {
    plan_id: String,
}

async fn save_trip_plan(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(draft): ApiJson<TripPlanDraft>,
) -> Result<(StatusCode, Json<SavedPlanResponse>), AppError> {
    let plan = state.trip_plans.save_trip_plan(&user.id, draft).await?;
    Ok((StatusCode::CREATED, Json(SavedPlanResponse { plan_id: plan.id })))
}

#[derive(Debug, Serialize)]
struct PlansResponse {
    plans: Vec<SavedTripPlan>,
}

async fn my_saved_plans(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PlansResponse>, AppError> {
    let plans = state.trip_plans.list_my_saved_plans(&user.id).await?;
    Ok(Json(PlansResponse { plans }))
}
