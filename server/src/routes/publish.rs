//! Publish endpoints — admission, listing, detail, log.

use axum::extract::State;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::response::Envelope;
use crate::services::publish_service::{
    self, Admission, PublishDetail, PublishFilters, PublishPage,
};

use super::{first, required, required_str, RouterState};

pub fn router() -> Router<RouterState> {
    Router::new()
        .route("/createPublish", post(create_publish))
        .route("/getAppPublishList", post(get_app_publish_list))
        .route("/getAppPublishDetail", post(get_app_publish_detail))
        .route("/getAppPublishLog", post(get_app_publish_log))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePublishRequest {
    branch: Option<String>,
    user_id: Option<i64>,
    repository: Option<String>,
    commit: Option<String>,
    publish_env: Option<String>,
}

async fn create_publish(
    State(state): State<RouterState>,
    Json(req): Json<CreatePublishRequest>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    let branch = required_str(req.branch)?;
    let user_id = required(req.user_id)?;
    let repository = required_str(req.repository)?;
    let commit = required_str(req.commit)?;
    let publish_env = required_str(req.publish_env)?;

    let mut conn = state.pool.get().await?;
    let admission = publish_service::admit_publish(
        &mut conn,
        &branch,
        user_id,
        &repository,
        &commit,
        &publish_env,
    )
    .await?;

    Ok(Json(match admission {
        Admission::Proceed { publish_id } => Envelope::ok(json!({ "publishId": publish_id })),
        // Business failure, not transport failure: the publish row exists but
        // cannot proceed until reviewed.
        Admission::ReviewRequired { .. } => {
            Envelope::rejected_with(json!({ "text": publish_service::REVIEW_REQUIRED_TEXT }))
        }
        Admission::Rejected { message } => Envelope::fail(message),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishListRequest {
    app_id: Option<i64>,
    iteration_id: Option<i64>,
    publish_env: Option<Vec<String>>,
    publish_status: Option<Vec<String>>,
    publisher_id: Option<Vec<i64>>,
    page: Option<usize>,
    page_size: Option<usize>,
}

async fn get_app_publish_list(
    State(state): State<RouterState>,
    Json(req): Json<PublishListRequest>,
) -> ApiResult<Json<Envelope<PublishPage>>> {
    let app_id = required(req.app_id)?;
    let publish_env = required(req.publish_env)?;
    let publish_status = required(req.publish_status)?;
    let page = required(req.page)?;
    let page_size = required(req.page_size)?;

    let filters = PublishFilters {
        app_id,
        iteration_id: req.iteration_id,
        publisher_id: first(req.publisher_id),
        status: first(Some(publish_status)),
        environment: first(Some(publish_env)),
    };

    let mut conn = state.pool.get().await?;
    let result = publish_service::list_publishes(&mut conn, filters, page, page_size).await?;
    Ok(Json(Envelope::ok(result)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishIdRequest {
    publish_id: Option<i64>,
}

async fn get_app_publish_detail(
    State(state): State<RouterState>,
    Json(req): Json<PublishIdRequest>,
) -> ApiResult<Json<Envelope<PublishDetail>>> {
    let publish_id = required(req.publish_id)?;

    let mut conn = state.pool.get().await?;
    let detail = publish_service::get_publish_detail(&mut conn, publish_id).await?;
    Ok(Json(Envelope::ok(detail)))
}

async fn get_app_publish_log(
    State(state): State<RouterState>,
    Json(req): Json<PublishIdRequest>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    let publish_id = required(req.publish_id)?;

    let mut conn = state.pool.get().await?;
    let log = publish_service::get_publish_log(&mut conn, publish_id).await?;
    Ok(Json(Envelope::ok(json!({ "log": log }))))
}
