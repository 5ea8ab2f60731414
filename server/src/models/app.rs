//! app — a deployable project bound to a source-control repository.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::apps;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = apps)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub id: i64,
    pub app_name: String,
    pub description: String,
    pub app_logo: String,
    pub repository: String,
    pub version: String,
    pub daily_address: String,
    pub online_address: String,
    pub page_prefix: String,
    pub port: Option<i64>,
    pub publish_type: String,
    pub product_type: String,
    pub progressing_iteration_count: i32,
    pub creator_id: i64,
    pub create_time: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = apps)]
pub struct NewApp {
    pub app_name: String,
    pub description: String,
    pub app_logo: String,
    pub repository: String,
    pub version: String,
    pub daily_address: String,
    pub online_address: String,
    pub page_prefix: String,
    pub publish_type: String,
    pub product_type: String,
    pub progressing_iteration_count: i32,
    pub creator_id: i64,
}
