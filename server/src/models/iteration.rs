//! iteration — a development cycle bound to one branch and version.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::iterations;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = iterations)]
#[serde(rename_all = "camelCase")]
pub struct Iteration {
    pub id: i64,
    pub app_id: i64,
    pub iteration_name: String,
    pub branch: String,
    pub version: String,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = iterations)]
pub struct NewIteration {
    pub app_id: i64,
    pub iteration_name: String,
    pub branch: String,
    pub version: String,
}
