//! review — code-review state for an online publish. Created by the review
//! workflow; read-only from the admission engine's perspective.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::reviews;

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = reviews)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub review_status: String,
    pub fail_reason: Option<String>,
}
