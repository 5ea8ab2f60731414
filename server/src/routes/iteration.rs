//! Iteration endpoints — branch binding.

use axum::extract::State;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::response::Envelope;
use crate::services::iteration_service::{self, CreateIterationInput, CreatedIteration};

use super::{required, required_str, RouterState};

pub fn router() -> Router<RouterState> {
    Router::new().route("/createIteration", post(create_iteration))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIterationRequest {
    app_id: Option<i64>,
    iteration_name: Option<String>,
    branch: Option<String>,
    version: Option<String>,
}

async fn create_iteration(
    State(state): State<RouterState>,
    Json(req): Json<CreateIterationRequest>,
) -> ApiResult<Json<Envelope<CreatedIteration>>> {
    let input = CreateIterationInput {
        app_id: required(req.app_id)?,
        iteration_name: required_str(req.iteration_name)?,
        branch: required_str(req.branch)?,
        version: required_str(req.version)?,
    };

    let mut conn = state.pool.get().await?;
    let created = iteration_service::create_iteration(&mut conn, input).await?;
    Ok(Json(Envelope::ok(created)))
}
