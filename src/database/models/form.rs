use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FormCategory {
    pub id: i32,
    pub name: String,
}

/// Category with the number of forms filed under it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
    pub forms_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FieldType {
    pub id: i32,
    pub name: String,
}

/// Form row joined with its category name
#[derive(Debug, Clone, FromRow)]
pub struct Form {
    pub id: i32,
    pub name: String,
    pub category_id: i32,
    pub category_name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct FormSection {
    pub id: i32,
    pub form_id: i32,
    pub name: String,
}

/// Field row joined with its type name
#[derive(Debug, Clone, FromRow)]
pub struct FormField {
    pub id: i32,
    pub section_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub field_type_id: i32,
    pub field_type_name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct FormFieldOption {
    pub id: i32,
    pub field_id: i32,
    pub name: String,
}

/// Listing row for the form catalog
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub sections: i64,
}

/// Every row of a form tree, flat and in no particular order
#[derive(Debug, Clone)]
pub struct FormRows {
    pub form: Form,
    pub sections: Vec<FormSection>,
    pub fields: Vec<FormField>,
    pub options: Vec<FormFieldOption>,
}

/// A validated form tree ready to be inserted in one transaction
#[derive(Debug, Clone)]
pub struct NewForm {
    pub name: String,
    pub category_id: i32,
    pub sections: Vec<NewSection>,
}

#[derive(Debug, Clone)]
pub struct NewSection {
    pub name: String,
    pub fields: Vec<NewField>,
}

#[derive(Debug, Clone)]
pub struct NewField {
    pub name: String,
    pub description: Option<String>,
    pub field_type_id: i32,
    pub options: Vec<String>,
}

/// Filters for the paged form listing
#[derive(Debug, Clone, Default)]
pub struct FormFilter {
    pub search: Option<String>,
    pub category_id: Option<i32>,
}
