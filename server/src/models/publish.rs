//! publish — a request to move (branch, commit) into an environment.
//!
//! Rows are created once per accepted admission decision and never deleted.
//! The status column is written once at creation; later transitions belong
//! to the deployment executor.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::publishes;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = publishes)]
#[serde(rename_all = "camelCase")]
pub struct Publish {
    pub id: i64,
    pub app_id: i64,
    pub iteration_id: i64,
    pub publisher_id: i64,
    pub commit: String,
    pub environment: String,
    pub status: String,
    pub log_id: i64,
    pub review_id: Option<i64>,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = publishes)]
pub struct NewPublish {
    pub app_id: i64,
    pub iteration_id: i64,
    pub publisher_id: i64,
    pub commit: String,
    pub environment: String,
    pub status: String,
    pub log_id: i64,
    pub review_id: Option<i64>,
}
