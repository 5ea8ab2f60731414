//! member — application membership join entity.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::members;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = members)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub app_id: i64,
    pub user_id: i64,
    pub role: String,
    pub join_time: DateTime<Utc>,
    pub expired_time: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = members)]
pub struct NewMember {
    pub app_id: i64,
    pub user_id: i64,
    pub role: String,
    pub join_time: DateTime<Utc>,
    pub expired_time: DateTime<Utc>,
}
