//! Iteration binding — one branch + version per iteration.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

use crate::error::ApiError;
use crate::models::app::App;
use crate::models::iteration::{Iteration, NewIteration};
use crate::schema::{apps, iterations};

pub const MSG_BRANCH_BOUND: &str = "branch is already bound to an iteration";

#[derive(Debug)]
pub struct CreateIterationInput {
    pub app_id: i64,
    pub iteration_name: String,
    pub branch: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedIteration {
    pub iteration_id: i64,
    pub iteration_name: String,
    pub branch: String,
    pub version: String,
}

/// Bind a branch to a new iteration and bump the application's in-progress
/// iteration count.
pub async fn create_iteration(
    conn: &mut AsyncPgConnection,
    input: CreateIterationInput,
) -> Result<CreatedIteration, ApiError> {
    let app: App = apps::table
        .find(input.app_id)
        .first(conn)
        .await
        .optional()?
        .ok_or(ApiError::NotFound("application"))?;

    let bound: i64 = iterations::table
        .filter(iterations::app_id.eq(app.id))
        .filter(iterations::branch.eq(&input.branch))
        .count()
        .get_result(conn)
        .await?;
    if bound > 0 {
        return Err(ApiError::Rejected(MSG_BRANCH_BOUND));
    }

    let iteration: Iteration = diesel::insert_into(iterations::table)
        .values(&NewIteration {
            app_id: app.id,
            iteration_name: input.iteration_name,
            branch: input.branch,
            version: input.version,
        })
        .get_result(conn)
        .await?;

    diesel::update(apps::table.find(app.id))
        .set(apps::progressing_iteration_count.eq(apps::progressing_iteration_count + 1))
        .execute(conn)
        .await?;

    crate::metrics::iteration_created();
    tracing::info!(
        iteration_id = iteration.id,
        app_id = app.id,
        branch = %iteration.branch,
        "iteration created"
    );

    Ok(CreatedIteration {
        iteration_id: iteration.id,
        iteration_name: iteration.iteration_name,
        branch: iteration.branch,
        version: iteration.version,
    })
}
