use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    CategorySummary, FieldType, FormCategory, FormFilter, FormResponse, FormResponseItem, FormRows, FormSummary,
    NewForm, NewResponse, NewUser, ResponseSummary, Role, UpdateOutcome, User, UserUpdate,
};

pub type DbResult<T> = Result<T, DatabaseError>;

/// Categories, field types and form trees
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn category_exists(&self, id: i32) -> DbResult<bool>;

    /// Case-insensitive name check
    async fn category_name_taken(&self, name: &str) -> DbResult<bool>;

    async fn insert_category(&self, name: &str) -> DbResult<FormCategory>;

    async fn list_categories(&self) -> DbResult<Vec<CategorySummary>>;

    async fn list_field_types(&self) -> DbResult<Vec<FieldType>>;

    /// Subset of `ids` that exist as field types
    async fn existing_field_type_ids(&self, ids: &[i32]) -> DbResult<Vec<i32>>;

    /// Insert the whole tree atomically and return the new form id
    async fn insert_form(&self, form: &NewForm) -> DbResult<i32>;

    async fn load_form(&self, id: i32) -> DbResult<Option<FormRows>>;

    /// Total matching count plus one page ordered by name
    async fn list_forms(&self, filter: &FormFilter, offset: i64, limit: i64) -> DbResult<(i64, Vec<FormSummary>)>;
}

/// Submitted responses; rows are never updated once written
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Insert the response row and all of its items atomically
    async fn insert_response(&self, response: &NewResponse) -> DbResult<()>;

    async fn load_response(&self, id: Uuid) -> DbResult<Option<(FormResponse, Vec<FormResponseItem>)>>;

    /// Total count plus one page, newest first
    async fn list_responses(&self, form_id: i32, offset: i64, limit: i64) -> DbResult<(i64, Vec<ResponseSummary>)>;
}

/// Users, roles and role membership. Role names match case-insensitively.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> DbResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>>;

    async fn insert_user(&self, user: &NewUser) -> DbResult<User>;

    /// Apply profile and role changes in one transaction. When the update
    /// removes `protected_role` from its last holder nothing is written and
    /// `UpdateOutcome::LastHolder` is returned.
    async fn apply_user_update(&self, id: Uuid, update: &UserUpdate) -> DbResult<UpdateOutcome>;

    /// Substring search over email, names and izaro code; ordered by email
    async fn search_users(&self, search: Option<&str>, offset: i64, limit: i64) -> DbResult<(i64, Vec<User>)>;

    async fn list_roles(&self) -> DbResult<Vec<Role>>;

    async fn find_role(&self, name: &str) -> DbResult<Option<Role>>;

    async fn insert_role(&self, name: &str) -> DbResult<Role>;

    async fn roles_of(&self, user_id: Uuid) -> DbResult<Vec<String>>;

    async fn add_roles(&self, user_id: Uuid, roles: &[String]) -> DbResult<()>;
}
