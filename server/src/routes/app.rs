//! Application endpoints — listing, creation, membership, branches.

use axum::extract::State;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiResult;
use crate::response::{ok_empty, Envelope};
use crate::services::app_service::{
    self, AddMemberInput, AppBasicInfo, AppCountPage, AppListQuery, AppPage, CreateAppInput,
    CreatedApp, EditBasicInfoInput,
};

use super::{first, required, required_str, RouterState};

pub fn router() -> Router<RouterState> {
    Router::new()
        .route("/getAppList", post(get_app_list))
        .route("/getAppListByCount", post(get_app_list_by_count))
        .route("/getMyAppList", post(get_my_app_list))
        .route("/getAppBranches", post(get_app_branches))
        .route("/createApp", post(create_app))
        .route("/getAppBasicInfo", post(get_app_basic_info))
        .route("/editBasicInfo", post(edit_basic_info))
        .route("/addAppMember", post(add_app_member))
        .route("/getAppMemberRole", post(get_app_member_role))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppListRequest {
    user_id: Option<i64>,
    app_name: Option<String>,
    publish_type: Option<Vec<String>>,
    page: Option<usize>,
    page_size: Option<usize>,
}

async fn get_app_list(
    State(state): State<RouterState>,
    Json(req): Json<AppListRequest>,
) -> ApiResult<Json<Envelope<AppPage>>> {
    let publish_type = required(req.publish_type)?;
    let page = required(req.page)?;
    let page_size = required(req.page_size)?;

    let mut conn = state.pool.get().await?;
    let result = app_service::get_app_list(
        &mut conn,
        AppListQuery {
            user_id: req.user_id,
            app_name: req.app_name,
            publish_type: first(Some(publish_type)),
            page,
            page_size,
        },
    )
    .await?;
    Ok(Json(Envelope::ok(result)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppListByCountRequest {
    user_id: Option<i64>,
    publish_type: Option<Vec<String>>,
    count: Option<usize>,
    loaded_count: Option<usize>,
}

async fn get_app_list_by_count(
    State(state): State<RouterState>,
    Json(req): Json<AppListByCountRequest>,
) -> ApiResult<Json<Envelope<AppCountPage>>> {
    let user_id = required(req.user_id)?;
    let publish_type = required(req.publish_type)?;
    let count = required(req.count)?;
    let loaded_count = required(req.loaded_count)?;

    let mut conn = state.pool.get().await?;
    let result = app_service::get_app_list_by_count(
        &mut conn,
        user_id,
        first(Some(publish_type)),
        count,
        loaded_count,
    )
    .await?;
    Ok(Json(Envelope::ok(result)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserIdRequest {
    user_id: Option<i64>,
}

async fn get_my_app_list(
    State(state): State<RouterState>,
    Json(req): Json<UserIdRequest>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    let user_id = required(req.user_id)?;

    let mut conn = state.pool.get().await?;
    let list = app_service::get_my_app_list(&mut conn, user_id).await?;
    Ok(Json(Envelope::ok(json!({ "list": list }))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppIdRequest {
    app_id: Option<i64>,
}

async fn get_app_branches(
    State(state): State<RouterState>,
    Json(req): Json<AppIdRequest>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    let app_id = required(req.app_id)?;

    let mut conn = state.pool.get().await?;
    let list = app_service::get_app_branches(&mut conn, &state.config, app_id).await?;
    Ok(Json(Envelope::ok(json!({ "list": list }))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAppRequest {
    user_id: Option<i64>,
    app_name: Option<String>,
    repository: Option<String>,
    description: Option<String>,
    product_type_id: Option<String>,
    publish_type_id: Option<String>,
}

async fn create_app(
    State(state): State<RouterState>,
    Json(req): Json<CreateAppRequest>,
) -> ApiResult<Json<Envelope<CreatedApp>>> {
    let input = CreateAppInput {
        user_id: required(req.user_id)?,
        app_name: required_str(req.app_name)?,
        repository: required_str(req.repository)?,
        description: required_str(req.description)?,
        product_type: required_str(req.product_type_id)?,
        publish_type: required_str(req.publish_type_id)?,
    };

    let mut conn = state.pool.get().await?;
    let created = app_service::create_app(&mut conn, &state.config, input).await?;
    Ok(Json(Envelope::ok(created)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserAppRequest {
    user_id: Option<i64>,
    app_id: Option<i64>,
}

async fn get_app_basic_info(
    State(state): State<RouterState>,
    Json(req): Json<UserAppRequest>,
) -> ApiResult<Json<Envelope<AppBasicInfo>>> {
    let user_id = required(req.user_id)?;
    let app_id = required(req.app_id)?;

    let mut conn = state.pool.get().await?;
    let info = app_service::get_app_basic_info(&mut conn, user_id, app_id).await?;
    Ok(Json(Envelope::ok(info)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditBasicInfoRequest {
    app_id: Option<i64>,
    user_id: Option<i64>,
    description: Option<String>,
    product: Option<String>,
}

async fn edit_basic_info(
    State(state): State<RouterState>,
    Json(req): Json<EditBasicInfoRequest>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    let input = EditBasicInfoInput {
        app_id: required(req.app_id)?,
        user_id: required(req.user_id)?,
        description: required_str(req.description)?,
        product_type: required_str(req.product)?,
    };

    let mut conn = state.pool.get().await?;
    app_service::edit_basic_info(&mut conn, input).await?;
    Ok(Json(ok_empty()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddMemberRequest {
    app_id: Option<i64>,
    user_name: Option<String>,
    use_time: Option<i64>,
    role: Option<String>,
}

async fn add_app_member(
    State(state): State<RouterState>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    let input = AddMemberInput {
        app_id: required(req.app_id)?,
        user_name: required_str(req.user_name)?,
        use_time_ms: required(req.use_time)?,
        role: required_str(req.role)?,
    };

    let mut conn = state.pool.get().await?;
    app_service::add_app_member(&mut conn, input).await?;
    Ok(Json(ok_empty()))
}

async fn get_app_member_role(
    State(state): State<RouterState>,
    Json(req): Json<UserAppRequest>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    let user_id = required(req.user_id)?;
    let app_id = required(req.app_id)?;

    let mut conn = state.pool.get().await?;
    let role = app_service::get_app_member_role(&mut conn, user_id, app_id).await?;
    Ok(Json(Envelope::ok(json!({ "memberRole": role }))))
}
