use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateFormRequest {
    pub name: String,
    pub category_id: i32,
    pub sections: Vec<CreateSectionRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSectionRequest {
    pub name: String,
    pub fields: Vec<CreateFieldRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateFieldRequest {
    pub name: String,
    pub description: Option<String>,
    pub form_field_type_id: i32,
    pub form_field_options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDetails {
    pub id: i32,
    pub name: String,
    pub category_id: i32,
    pub category_name: String,
    pub sections: Vec<SectionDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDetails {
    pub id: i32,
    pub name: String,
    pub fields: Vec<FieldDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDetails {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub form_field_type_id: i32,
    pub form_field_type_name: String,
    pub options: Vec<OptionDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDetails {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateResponseRequest {
    #[serde(alias = "obra")]
    pub site: Option<String>,
    pub answers: Vec<AnswerRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnswerRequest {
    pub form_field_id: i32,
    #[serde(alias = "vaule")]
    pub value: Option<String>,
    pub form_field_option_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetails {
    pub id: Uuid,
    pub form_id: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub site: Option<String>,
    pub answers: Vec<AnswerDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetails {
    pub id: i32,
    pub form_field_id: i32,
    pub value: Option<String>,
    pub form_field_option_id: Option<i32>,
}
