//! Application CRUD and membership.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::app::{App, NewApp};
use crate::models::member::{Member, NewMember};
use crate::models::user::User;
use crate::pagination;
use crate::registry::{self, ROLE_CREATOR};
use crate::schema::{apps, iterations, members, users};
use crate::services::scm_service::{self, Branch};

pub const MSG_NAME_OR_REPO_TAKEN: &str = "application name or repository already in use";
pub const MSG_REPO_MISSING: &str = "application repository does not exist";
pub const MSG_UNKNOWN_PUBLISH_TYPE: &str = "unknown publish type";
pub const MSG_UNKNOWN_PRODUCT_TYPE: &str = "unknown product type";
pub const MSG_UNKNOWN_ROLE: &str = "unknown member role";

/// Creator memberships never expire in practice.
const CREATOR_MEMBERSHIP_DAYS: i64 = 36_500;

/// The network port derives from the row id.
fn assigned_port(app_id: i64) -> i64 {
    app_id + 9000
}

#[derive(Debug)]
pub struct CreateAppInput {
    pub user_id: i64,
    pub app_name: String,
    pub repository: String,
    pub description: String,
    pub product_type: String,
    pub publish_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedApp {
    pub app_id: i64,
    pub app_name: String,
}

/// Create an application, assign its port, and record the creator as the
/// first member.
pub async fn create_app(
    conn: &mut AsyncPgConnection,
    config: &AppConfig,
    input: CreateAppInput,
) -> Result<CreatedApp, ApiError> {
    let taken: i64 = apps::table
        .filter(
            apps::app_name
                .eq(&input.app_name)
                .or(apps::repository.eq(&input.repository)),
        )
        .count()
        .get_result(conn)
        .await?;
    if taken > 0 {
        return Err(ApiError::Rejected(MSG_NAME_OR_REPO_TAKEN));
    }

    let publish_type = registry::publish_type(&input.publish_type)
        .ok_or(ApiError::Rejected(MSG_UNKNOWN_PUBLISH_TYPE))?;
    registry::product_type(&input.product_type)
        .ok_or(ApiError::Rejected(MSG_UNKNOWN_PRODUCT_TYPE))?;

    let creator: User = users::table
        .find(input.user_id)
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("user"))?;

    if scm_service::get_repository(config, &input.repository)
        .await?
        .is_none()
    {
        return Err(ApiError::Rejected(MSG_REPO_MISSING));
    }

    let app: App = diesel::insert_into(apps::table)
        .values(&NewApp {
            app_name: input.app_name,
            description: input.description,
            app_logo: publish_type.logo.to_string(),
            repository: input.repository,
            version: String::new(),
            daily_address: String::new(),
            online_address: String::new(),
            page_prefix: "/webapp/publish".to_string(),
            publish_type: input.publish_type,
            product_type: input.product_type,
            progressing_iteration_count: 0,
            creator_id: creator.id,
        })
        .get_result(conn)
        .await?;

    diesel::update(apps::table.find(app.id))
        .set(apps::port.eq(assigned_port(app.id)))
        .execute(conn)
        .await?;

    let now = Utc::now();
    diesel::insert_into(members::table)
        .values(&NewMember {
            app_id: app.id,
            user_id: creator.id,
            role: ROLE_CREATOR.to_string(),
            join_time: now,
            expired_time: now + Duration::days(CREATOR_MEMBERSHIP_DAYS),
        })
        .execute(conn)
        .await?;

    crate::metrics::app_created();
    tracing::info!(app_id = app.id, app_name = %app.app_name, "application created");

    Ok(CreatedApp {
        app_id: app.id,
        app_name: app.app_name,
    })
}

// ── Listing ──

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPage {
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
    pub total: usize,
    pub list: Vec<App>,
}

/// Created plus joined applications for a user, newest first, deduplicated.
async fn apps_for_user(conn: &mut AsyncPgConnection, user_id: i64) -> Result<Vec<App>, ApiError> {
    users::table
        .find(user_id)
        .first::<User>(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("user"))?;

    let joined_ids: Vec<i64> = members::table
        .filter(members::user_id.eq(user_id))
        .select(members::app_id)
        .load(conn)
        .await?;

    let mut result: Vec<App> = apps::table
        .filter(
            apps::creator_id
                .eq(user_id)
                .or(apps::id.eq_any(joined_ids)),
        )
        .order(apps::create_time.desc())
        .load(conn)
        .await?;

    let mut seen = HashSet::new();
    result.retain(|app| seen.insert(app.id));
    Ok(result)
}

/// In-memory equality filters applied to a per-user application set.
fn filter_apps(apps: Vec<App>, app_name: Option<&str>, publish_type: Option<&str>) -> Vec<App> {
    apps.into_iter()
        .filter(|app| {
            if let Some(name) = app_name {
                if app.app_name != name {
                    return false;
                }
            }
            if let Some(pt) = publish_type {
                if app.publish_type != pt {
                    return false;
                }
            }
            true
        })
        .collect()
}

#[derive(Debug)]
pub struct AppListQuery {
    pub user_id: Option<i64>,
    pub app_name: Option<String>,
    pub publish_type: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

pub async fn get_app_list(
    conn: &mut AsyncPgConnection,
    query: AppListQuery,
) -> Result<AppPage, ApiError> {
    if let Some(pt) = query.publish_type.as_deref() {
        if registry::publish_type(pt).is_none() {
            return Err(ApiError::Rejected(MSG_UNKNOWN_PUBLISH_TYPE));
        }
    }

    let matched: Vec<App> = match query.user_id {
        Some(user_id) => {
            let set = apps_for_user(conn, user_id).await?;
            filter_apps(
                set,
                query.app_name.as_deref(),
                query.publish_type.as_deref(),
            )
        }
        None => {
            let mut q = apps::table.into_boxed();
            if let Some(name) = query.app_name {
                q = q.filter(apps::app_name.eq(name));
            }
            if let Some(pt) = query.publish_type {
                q = q.filter(apps::publish_type.eq(pt));
            }
            q.order(apps::create_time.desc()).load(conn).await?
        }
    };

    let window = pagination::window(matched.len(), query.page, query.page_size)?;
    let list = pagination::apply(matched, window);

    Ok(AppPage {
        page: query.page,
        page_size: query.page_size,
        has_more: window.has_more,
        total: window.total,
        list,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppCountPage {
    pub has_more: bool,
    pub total: usize,
    pub list: Vec<App>,
}

/// Cursor-style listing: the client reports how many items it has loaded.
pub async fn get_app_list_by_count(
    conn: &mut AsyncPgConnection,
    user_id: i64,
    publish_type: Option<String>,
    count: usize,
    loaded_count: usize,
) -> Result<AppCountPage, ApiError> {
    let set = apps_for_user(conn, user_id).await?;
    let matched = filter_apps(set, None, publish_type.as_deref());

    let window = pagination::offset_window(matched.len(), loaded_count, count)?;
    let list = pagination::apply(matched, window);

    Ok(AppCountPage {
        has_more: window.has_more,
        total: window.total,
        list,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppOption {
    pub app_id: i64,
    pub app_name: String,
}

/// Id/name projection of the user's applications, for select widgets.
pub async fn get_my_app_list(
    conn: &mut AsyncPgConnection,
    user_id: i64,
) -> Result<Vec<AppOption>, ApiError> {
    let set = apps_for_user(conn, user_id).await?;
    Ok(set
        .into_iter()
        .map(|app| AppOption {
            app_id: app.id,
            app_name: app.app_name,
        })
        .collect())
}

// ── Basic info / membership ──

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppBasicInfo {
    #[serde(flatten)]
    pub app: App,
    pub is_join: bool,
    pub join_time: i64,
    pub member_role: String,
}

async fn membership(
    conn: &mut AsyncPgConnection,
    app_id: i64,
    user_id: i64,
) -> Result<Option<Member>, ApiError> {
    let member = members::table
        .filter(members::app_id.eq(app_id))
        .filter(members::user_id.eq(user_id))
        .first(conn)
        .await
        .optional()?;
    Ok(member)
}

pub async fn get_app_basic_info(
    conn: &mut AsyncPgConnection,
    user_id: i64,
    app_id: i64,
) -> Result<AppBasicInfo, ApiError> {
    let app: App = apps::table
        .find(app_id)
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("application"))?;

    let member = membership(conn, app_id, user_id).await?;

    Ok(AppBasicInfo {
        app,
        is_join: member.is_some(),
        join_time: member
            .as_ref()
            .map(|m| m.join_time.timestamp_millis())
            .unwrap_or(0),
        member_role: member.map(|m| m.role).unwrap_or_else(|| "0".to_string()),
    })
}

/// The user's role code within an application; `"0"` when not a member.
pub async fn get_app_member_role(
    conn: &mut AsyncPgConnection,
    user_id: i64,
    app_id: i64,
) -> Result<String, ApiError> {
    apps::table
        .find(app_id)
        .first::<App>(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("application"))?;

    let member = membership(conn, app_id, user_id).await?;
    Ok(member.map(|m| m.role).unwrap_or_else(|| "0".to_string()))
}

#[derive(Debug)]
pub struct AddMemberInput {
    pub app_id: i64,
    pub user_name: String,
    pub use_time_ms: i64,
    pub role: String,
}

pub async fn add_app_member(
    conn: &mut AsyncPgConnection,
    input: AddMemberInput,
) -> Result<(), ApiError> {
    apps::table
        .find(input.app_id)
        .first::<App>(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("application"))?;

    registry::member_role_label(&input.role).ok_or(ApiError::Rejected(MSG_UNKNOWN_ROLE))?;

    let user: User = users::table
        .filter(users::user_name.eq(&input.user_name))
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("user"))?;

    let now = Utc::now();
    diesel::insert_into(members::table)
        .values(&NewMember {
            app_id: input.app_id,
            user_id: user.id,
            role: input.role,
            join_time: now,
            expired_time: now + Duration::milliseconds(input.use_time_ms),
        })
        .execute(conn)
        .await?;

    Ok(())
}

#[derive(Debug)]
pub struct EditBasicInfoInput {
    pub app_id: i64,
    pub user_id: i64,
    pub description: String,
    pub product_type: String,
}

/// Which of the editable fields actually differ from the stored row.
fn basic_info_changes(app: &App, description: &str, product_type: &str) -> (bool, bool) {
    (app.description != description, app.product_type != product_type)
}

/// Update an application's description and product type.
pub async fn edit_basic_info(
    conn: &mut AsyncPgConnection,
    input: EditBasicInfoInput,
) -> Result<(), ApiError> {
    let product = registry::product_type(&input.product_type)
        .ok_or(ApiError::Rejected(MSG_UNKNOWN_PRODUCT_TYPE))?;

    let app: App = apps::table
        .find(input.app_id)
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("application"))?;

    let (description_changed, product_changed) =
        basic_info_changes(&app, &input.description, &input.product_type);

    if description_changed {
        tracing::info!(
            app_id = app.id,
            user_id = input.user_id,
            "application description updated"
        );
    }
    if product_changed {
        tracing::info!(
            app_id = app.id,
            user_id = input.user_id,
            product = product.label,
            "application product type updated"
        );
    }

    diesel::update(apps::table.find(app.id))
        .set((
            apps::description.eq(input.description),
            apps::product_type.eq(input.product_type),
        ))
        .execute(conn)
        .await?;

    Ok(())
}

// ── Branches ──

/// Branches of the application's repository not yet bound to an iteration.
pub async fn get_app_branches(
    conn: &mut AsyncPgConnection,
    config: &AppConfig,
    app_id: i64,
) -> Result<Vec<Branch>, ApiError> {
    let app: App = apps::table
        .find(app_id)
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("application"))?;

    let branches = scm_service::list_branches(config, &app.repository).await?;

    let bound: HashSet<String> = iterations::table
        .filter(iterations::app_id.eq(app.id))
        .select(iterations::version)
        .load::<String>(conn)
        .await?
        .into_iter()
        .collect();

    Ok(scm_service::filter_unbound(branches, &bound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn app(id: i64, name: &str, publish_type: &str) -> App {
        App {
            id,
            app_name: name.into(),
            description: String::new(),
            app_logo: String::new(),
            repository: format!("web/{name}"),
            version: String::new(),
            daily_address: String::new(),
            online_address: String::new(),
            page_prefix: "/webapp/publish".into(),
            port: None,
            publish_type: publish_type.into(),
            product_type: "1001".into(),
            progressing_iteration_count: 0,
            creator_id: 1,
            create_time: Utc.timestamp_millis_opt(0).unwrap(),
        }
    }

    #[test]
    fn name_filter_is_exact_match() {
        let set = vec![app(1, "storefront", "2001"), app(2, "store", "2001")];
        let out = filter_apps(set, Some("store"), None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 2);
    }

    #[test]
    fn publish_type_filter_applies_when_present() {
        let set = vec![app(1, "a", "2001"), app(2, "b", "2002"), app(3, "c", "2001")];
        let out = filter_apps(set, None, Some("2001"));
        let ids: Vec<i64> = out.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn absent_filters_keep_everything() {
        let set = vec![app(1, "a", "2001"), app(2, "b", "2002")];
        assert_eq!(filter_apps(set, None, None).len(), 2);
    }

    #[test]
    fn assigned_port_offsets_the_row_id() {
        assert_eq!(assigned_port(1), 9001);
        assert_eq!(assigned_port(250), 9250);
        // Well past u16 ports, but never truncated on the way to the row.
        assert_eq!(assigned_port(3_000_000_000), 3_000_009_000);
    }

    #[test]
    fn basic_info_change_detection_compares_both_fields() {
        let mut stored = app(1, "storefront", "2001");
        stored.description = "sells things".into();
        stored.product_type = "1001".into();

        assert_eq!(basic_info_changes(&stored, "sells things", "1001"), (false, false));
        assert_eq!(basic_info_changes(&stored, "sells more things", "1001"), (true, false));
        assert_eq!(basic_info_changes(&stored, "sells things", "1002"), (false, true));
    }
}
