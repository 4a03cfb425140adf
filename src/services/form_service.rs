use serde_json::{json, Map, Value};
use tracing::info;

use crate::api::form::{CreateFormRequest, FieldDetails, FormDetails, FormListQuery, OptionDetails, SectionDetails};
use crate::database::models::{CategorySummary, FieldType, FormFilter, FormRows, FormSummary, NewField, NewForm, NewSection};
use crate::database::repository::CatalogStore;
use crate::services::error::{ServiceError, ServiceResult};
use crate::types::{PagedResult, Paging};

/// Category, field type and form tree operations
pub struct FormService<S> {
    store: S,
}

impl<S: CatalogStore> FormService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate the whole request, then write the tree in one transaction.
    /// Nothing is written when any check fails.
    pub async fn create_form(&self, request: CreateFormRequest) -> ServiceResult<FormDetails> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("Form name is required"));
        }
        if request.sections.is_empty() {
            return Err(ServiceError::validation("A form needs at least one section"));
        }
        if request.sections.iter().all(|s| s.fields.is_empty()) {
            return Err(ServiceError::validation("A form needs at least one field"));
        }

        let mut type_ids: Vec<i32> = Vec::new();
        for field in request.sections.iter().flat_map(|s| &s.fields) {
            if !type_ids.contains(&field.form_field_type_id) {
                type_ids.push(field.form_field_type_id);
            }
        }

        let category_ok = self.store.category_exists(request.category_id).await?;
        let existing = self.store.existing_field_type_ids(&type_ids).await?;
        let missing_types: Vec<i32> = type_ids.into_iter().filter(|id| !existing.contains(id)).collect();

        if !category_ok || !missing_types.is_empty() {
            let mut details = Map::new();
            if !category_ok {
                details.insert("missingCategoryId".to_string(), json!(request.category_id));
            }
            if !missing_types.is_empty() {
                details.insert("missingTypeIds".to_string(), json!(missing_types));
            }
            return Err(ServiceError::validation_with(
                "Unknown category or field type ids",
                Value::Object(details),
            ));
        }

        let new_form = NewForm {
            name: name.to_string(),
            category_id: request.category_id,
            sections: request
                .sections
                .into_iter()
                .map(|section| NewSection {
                    name: section.name.trim().to_string(),
                    fields: section
                        .fields
                        .into_iter()
                        .map(|field| NewField {
                            name: field.name.trim().to_string(),
                            description: field
                                .description
                                .map(|d| d.trim().to_string())
                                .filter(|d| !d.is_empty()),
                            field_type_id: field.form_field_type_id,
                            options: field
                                .form_field_options
                                .unwrap_or_default()
                                .into_iter()
                                .map(|o| o.trim().to_string())
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        };

        let form_id = self.store.insert_form(&new_form).await?;
        info!("Created form {} '{}' in category {}", form_id, new_form.name, new_form.category_id);

        self.get_form(form_id).await
    }

    pub async fn get_form(&self, id: i32) -> ServiceResult<FormDetails> {
        self.store
            .load_form(id)
            .await?
            .map(assemble_form)
            .ok_or_else(|| ServiceError::NotFound(format!("Form {} not found", id)))
    }

    pub async fn list_forms(&self, query: FormListQuery) -> ServiceResult<PagedResult<FormSummary>> {
        let paging = Paging::from_query(query.page, query.page_size);
        let filter = FormFilter {
            search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            category_id: query.category_id,
        };
        let (total, items) = self.store.list_forms(&filter, paging.offset(), paging.limit()).await?;
        Ok(PagedResult::new(paging, total, items))
    }

    pub async fn list_categories(&self) -> ServiceResult<Vec<CategorySummary>> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn create_category(&self, name: &str) -> ServiceResult<CategorySummary> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("Category name is required"));
        }
        if self.store.category_name_taken(name).await? {
            return Err(ServiceError::Conflict(format!("A category named '{}' already exists", name)));
        }

        let category = self.store.insert_category(name).await?;
        info!("Created form category {} '{}'", category.id, category.name);
        Ok(CategorySummary {
            id: category.id,
            name: category.name,
            forms_count: 0,
        })
    }

    pub async fn list_field_types(&self) -> ServiceResult<Vec<FieldType>> {
        Ok(self.store.list_field_types().await?)
    }
}

/// Nest flat rows into the read tree, every level ordered by id
pub fn assemble_form(rows: FormRows) -> FormDetails {
    let FormRows {
        form,
        mut sections,
        mut fields,
        mut options,
    } = rows;
    sections.sort_by_key(|s| s.id);
    fields.sort_by_key(|f| f.id);
    options.sort_by_key(|o| o.id);

    let sections = sections
        .into_iter()
        .map(|section| SectionDetails {
            id: section.id,
            name: section.name,
            fields: fields
                .iter()
                .filter(|f| f.section_id == section.id)
                .map(|field| FieldDetails {
                    id: field.id,
                    name: field.name.clone(),
                    description: field.description.clone(),
                    form_field_type_id: field.field_type_id,
                    form_field_type_name: field.field_type_name.clone(),
                    options: options
                        .iter()
                        .filter(|o| o.field_id == field.id)
                        .map(|o| OptionDetails {
                            id: o.id,
                            name: o.name.clone(),
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();

    FormDetails {
        id: form.id,
        name: form.name,
        category_id: form.category_id,
        category_name: form.category_name,
        sections,
    }
}
