use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FormResponse {
    pub id: Uuid,
    pub form_id: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub site: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FormResponseItem {
    pub id: i32,
    pub response_id: Uuid,
    pub field_id: i32,
    pub value: Option<String>,
    pub option_id: Option<i32>,
}

/// Listing row: a response plus its answer count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub site: Option<String>,
    pub item_count: i64,
}

/// A submission validated against its form, ready to be written
#[derive(Debug, Clone)]
pub struct NewResponse {
    pub id: Uuid,
    pub form_id: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub site: Option<String>,
    pub items: Vec<NewResponseItem>,
}

#[derive(Debug, Clone)]
pub struct NewResponseItem {
    pub field_id: i32,
    pub value: Option<String>,
    pub option_id: Option<i32>,
}
