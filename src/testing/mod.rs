//! In-memory store used by service unit tests

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    normalize_key, CategorySummary, FieldType, Form, FormCategory, FormField, FormFieldOption, FormFilter,
    FormResponse, FormResponseItem, FormRows, FormSection, FormSummary, NewForm, NewResponse, NewUser,
    ResponseSummary, Role, UpdateOutcome, User, UserUpdate,
};
use crate::database::repository::{CatalogStore, DbResult, DirectoryStore, ResponseStore};

#[derive(Default)]
struct State {
    next_id: i32,
    categories: Vec<FormCategory>,
    field_types: Vec<FieldType>,
    forms: Vec<(i32, String, i32)>,
    sections: Vec<FormSection>,
    fields: Vec<(i32, i32, String, Option<String>, i32)>,
    options: Vec<FormFieldOption>,
    responses: Vec<FormResponse>,
    items: Vec<FormResponseItem>,
    users: Vec<User>,
    roles: Vec<Role>,
    user_roles: Vec<(Uuid, Uuid)>,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn role_by_name(&self, name: &str) -> Option<&Role> {
        let key = normalize_key(name);
        self.roles.iter().find(|r| normalize_key(&r.name) == key)
    }
}

/// Store keeping every table in vectors behind one lock
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    interleave: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Yields to the scheduler before every directory call, so callers
    /// joined on one task run their reads before either one writes.
    pub fn interleaved() -> Self {
        Self {
            interleave: true,
            ..Self::default()
        }
    }

    async fn pause(&self) {
        if self.interleave {
            tokio::task::yield_now().await;
        }
    }

    /// Store preloaded with the seeded field types
    pub async fn with_field_types() -> Self {
        let store = Self::new();
        for name in ["Text", "TextArea", "Number", "Date", "Select", "MultiSelect", "Checkbox", "Radio"] {
            let mut state = store.state.write().await;
            let id = state.next_id();
            state.field_types.push(FieldType {
                id,
                name: name.to_string(),
            });
        }
        store
    }

    pub async fn field_type_id(&self, name: &str) -> i32 {
        let state = self.state.read().await;
        state
            .field_types
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
            .unwrap_or_else(|| panic!("field type {} not seeded", name))
    }

    pub async fn form_count(&self) -> usize {
        self.state.read().await.forms.len()
    }

    pub async fn section_count(&self) -> usize {
        self.state.read().await.sections.len()
    }

    pub async fn response_count(&self) -> usize {
        self.state.read().await.responses.len()
    }

    pub async fn response_items(&self) -> Vec<FormResponseItem> {
        self.state.read().await.items.clone()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn category_exists(&self, id: i32) -> DbResult<bool> {
        Ok(self.state.read().await.categories.iter().any(|c| c.id == id))
    }

    async fn category_name_taken(&self, name: &str) -> DbResult<bool> {
        let state = self.state.read().await;
        Ok(state.categories.iter().any(|c| c.name.to_lowercase() == name.to_lowercase()))
    }

    async fn insert_category(&self, name: &str) -> DbResult<FormCategory> {
        let mut state = self.state.write().await;
        if state.categories.iter().any(|c| c.name.to_lowercase() == name.to_lowercase()) {
            return Err(DatabaseError::Conflict(format!("Category '{}' already exists", name)));
        }
        let category = FormCategory {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> DbResult<Vec<CategorySummary>> {
        let state = self.state.read().await;
        let mut rows: Vec<CategorySummary> = state
            .categories
            .iter()
            .map(|c| CategorySummary {
                id: c.id,
                name: c.name.clone(),
                forms_count: state.forms.iter().filter(|f| f.2 == c.id).count() as i64,
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn list_field_types(&self) -> DbResult<Vec<FieldType>> {
        Ok(self.state.read().await.field_types.clone())
    }

    async fn existing_field_type_ids(&self, ids: &[i32]) -> DbResult<Vec<i32>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| state.field_types.iter().any(|t| t.id == *id))
            .collect())
    }

    async fn insert_form(&self, form: &NewForm) -> DbResult<i32> {
        let mut state = self.state.write().await;
        let form_id = state.next_id();
        state.forms.push((form_id, form.name.clone(), form.category_id));
        for section in &form.sections {
            let section_id = state.next_id();
            state.sections.push(FormSection {
                id: section_id,
                form_id,
                name: section.name.clone(),
            });
            for field in &section.fields {
                let field_id = state.next_id();
                state.fields.push((
                    field_id,
                    section_id,
                    field.name.clone(),
                    field.description.clone(),
                    field.field_type_id,
                ));
                for option in &field.options {
                    let id = state.next_id();
                    state.options.push(FormFieldOption {
                        id,
                        field_id,
                        name: option.clone(),
                    });
                }
            }
        }
        Ok(form_id)
    }

    async fn load_form(&self, id: i32) -> DbResult<Option<FormRows>> {
        let state = self.state.read().await;
        let Some((form_id, name, category_id)) = state.forms.iter().find(|f| f.0 == id).cloned() else {
            return Ok(None);
        };
        let category_name = state
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();

        let sections: Vec<FormSection> = state.sections.iter().filter(|s| s.form_id == form_id).cloned().collect();
        let fields: Vec<FormField> = state
            .fields
            .iter()
            .filter(|f| sections.iter().any(|s| s.id == f.1))
            .map(|(id, section_id, name, description, field_type_id)| FormField {
                id: *id,
                section_id: *section_id,
                name: name.clone(),
                description: description.clone(),
                field_type_id: *field_type_id,
                field_type_name: state
                    .field_types
                    .iter()
                    .find(|t| t.id == *field_type_id)
                    .map(|t| t.name.clone())
                    .unwrap_or_default(),
            })
            .collect();
        let options = state
            .options
            .iter()
            .filter(|o| fields.iter().any(|f| f.id == o.field_id))
            .cloned()
            .collect();

        Ok(Some(FormRows {
            form: Form {
                id: form_id,
                name,
                category_id,
                category_name,
            },
            sections,
            fields,
            options,
        }))
    }

    async fn list_forms(&self, filter: &FormFilter, offset: i64, limit: i64) -> DbResult<(i64, Vec<FormSummary>)> {
        let state = self.state.read().await;
        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut matching: Vec<FormSummary> = state
            .forms
            .iter()
            .filter(|(_, name, category_id)| {
                search.as_ref().map_or(true, |s| name.to_lowercase().contains(s))
                    && filter.category_id.map_or(true, |c| c == *category_id)
            })
            .map(|(id, name, category_id)| FormSummary {
                id: *id,
                name: name.clone(),
                category: state
                    .categories
                    .iter()
                    .find(|c| c.id == *category_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                sections: state.sections.iter().filter(|s| s.form_id == *id).count() as i64,
            })
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let total = matching.len() as i64;
        let page = matching.into_iter().skip(offset as usize).take(limit as usize).collect();
        Ok((total, page))
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn insert_response(&self, response: &NewResponse) -> DbResult<()> {
        let mut state = self.state.write().await;
        state.responses.push(FormResponse {
            id: response.id,
            form_id: response.form_id,
            created_by: response.created_by,
            created_at: response.created_at,
            site: response.site.clone(),
        });
        for item in &response.items {
            let id = state.next_id();
            state.items.push(FormResponseItem {
                id,
                response_id: response.id,
                field_id: item.field_id,
                value: item.value.clone(),
                option_id: item.option_id,
            });
        }
        Ok(())
    }

    async fn load_response(&self, id: Uuid) -> DbResult<Option<(FormResponse, Vec<FormResponseItem>)>> {
        let state = self.state.read().await;
        Ok(state.responses.iter().find(|r| r.id == id).map(|r| {
            let items = state.items.iter().filter(|i| i.response_id == id).cloned().collect();
            (r.clone(), items)
        }))
    }

    async fn list_responses(&self, form_id: i32, offset: i64, limit: i64) -> DbResult<(i64, Vec<ResponseSummary>)> {
        let state = self.state.read().await;
        let mut matching: Vec<ResponseSummary> = state
            .responses
            .iter()
            .filter(|r| r.form_id == form_id)
            .map(|r| ResponseSummary {
                id: r.id,
                created_by: r.created_by,
                created_at: r.created_at,
                site: r.site.clone(),
                item_count: state.items.iter().filter(|i| i.response_id == r.id).count() as i64,
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as i64;
        let page = matching.into_iter().skip(offset as usize).take(limit as usize).collect();
        Ok((total, page))
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> DbResult<Option<User>> {
        self.pause().await;
        Ok(self.state.read().await.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let key = normalize_key(email);
        Ok(self.state.read().await.users.iter().find(|u| u.normalized_email == key).cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> DbResult<User> {
        let mut state = self.state.write().await;
        let key = normalize_key(&user.email);
        if state.users.iter().any(|u| u.normalized_email == key) {
            return Err(DatabaseError::Conflict(format!("Email '{}' is already registered", user.email)));
        }
        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            normalized_email: key,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            izaro_code: user.izaro_code.clone(),
            password_hash: user.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(row.clone());
        Ok(row)
    }

    async fn apply_user_update(&self, id: Uuid, update: &UserUpdate) -> DbResult<UpdateOutcome> {
        self.pause().await;
        let mut state = self.state.write().await;
        if !state.users.iter().any(|u| u.id == id) {
            return Err(DatabaseError::NotFound(format!("User {} not found", id)));
        }

        if let Some(role_id) = update.removed_protected_role().and_then(|r| state.role_by_name(r)).map(|r| r.id) {
            let holds = state.user_roles.contains(&(id, role_id));
            let others = state.user_roles.iter().filter(|(u, r)| *r == role_id && *u != id).count();
            if holds && others == 0 {
                return Ok(UpdateOutcome::LastHolder);
            }
        }

        if let Some(profile) = &update.profile {
            let key = normalize_key(&profile.email);
            if state.users.iter().any(|u| u.normalized_email == key && u.id != id) {
                return Err(DatabaseError::Conflict(format!("Email '{}' is already registered", profile.email)));
            }
        }

        let add: Vec<Uuid> = update.add_roles.iter().filter_map(|r| state.role_by_name(r).map(|r| r.id)).collect();
        let remove: Vec<Uuid> = update.remove_roles.iter().filter_map(|r| state.role_by_name(r).map(|r| r.id)).collect();
        for role_id in add {
            if !state.user_roles.contains(&(id, role_id)) {
                state.user_roles.push((id, role_id));
            }
        }
        state.user_roles.retain(|(u, r)| !(*u == id && remove.contains(r)));

        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))?;
        if let Some(profile) = &update.profile {
            user.email = profile.email.clone();
            user.normalized_email = normalize_key(&profile.email);
            user.first_name = profile.first_name.clone();
            user.last_name = profile.last_name.clone();
            user.izaro_code = profile.izaro_code.clone();
            user.updated_at = Utc::now();
        }
        Ok(UpdateOutcome::Applied(user.clone()))
    }

    async fn search_users(&self, search: Option<&str>, offset: i64, limit: i64) -> DbResult<(i64, Vec<User>)> {
        let state = self.state.read().await;
        let term = search.map(|s| s.to_lowercase());
        let mut matching: Vec<User> = state
            .users
            .iter()
            .filter(|u| {
                term.as_ref().map_or(true, |t| {
                    [&u.email, &u.first_name, &u.last_name, &u.izaro_code]
                        .iter()
                        .any(|v| v.to_lowercase().contains(t))
                })
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.email.cmp(&b.email));
        let total = matching.len() as i64;
        let page = matching.into_iter().skip(offset as usize).take(limit as usize).collect();
        Ok((total, page))
    }

    async fn list_roles(&self) -> DbResult<Vec<Role>> {
        let mut roles = self.state.read().await.roles.clone();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn find_role(&self, name: &str) -> DbResult<Option<Role>> {
        Ok(self.state.read().await.role_by_name(name).cloned())
    }

    async fn insert_role(&self, name: &str) -> DbResult<Role> {
        let mut state = self.state.write().await;
        if state.role_by_name(name).is_some() {
            return Err(DatabaseError::Conflict(format!("Role '{}' already exists", name)));
        }
        let role = Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn roles_of(&self, user_id: Uuid) -> DbResult<Vec<String>> {
        self.pause().await;
        let state = self.state.read().await;
        let mut names: Vec<String> = state
            .user_roles
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, r)| state.roles.iter().find(|role| role.id == *r))
            .map(|r| r.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn add_roles(&self, user_id: Uuid, roles: &[String]) -> DbResult<()> {
        let mut state = self.state.write().await;
        let ids: Vec<Uuid> = roles.iter().filter_map(|r| state.role_by_name(r).map(|r| r.id)).collect();
        for role_id in ids {
            if !state.user_roles.contains(&(user_id, role_id)) {
                state.user_roles.push((user_id, role_id));
            }
        }
        Ok(())
    }
}
