use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::api::form::{AnswerDetails, CreateResponseRequest, PageQuery, ResponseDetails};
use crate::database::models::{FormResponse, FormResponseItem, NewResponse, NewResponseItem, ResponseSummary};
use crate::database::repository::{CatalogStore, ResponseStore};
use crate::services::error::{ServiceError, ServiceResult};
use crate::types::{PagedResult, Paging};

/// Records submissions against a form and reads them back
pub struct ResponseService<S> {
    store: S,
}

impl<S: CatalogStore + ResponseStore> ResponseService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn submit(
        &self,
        form_id: i32,
        submitter: Uuid,
        request: CreateResponseRequest,
    ) -> ServiceResult<ResponseDetails> {
        let rows = self
            .store
            .load_form(form_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Form {} not found", form_id)))?;

        if request.answers.is_empty() {
            return Err(ServiceError::validation("At least one answer is required"));
        }

        let mut foreign_fields: Vec<i32> = Vec::new();
        for answer in &request.answers {
            let owned = rows.fields.iter().any(|f| f.id == answer.form_field_id);
            if !owned && !foreign_fields.contains(&answer.form_field_id) {
                foreign_fields.push(answer.form_field_id);
            }
        }
        if !foreign_fields.is_empty() {
            return Err(ServiceError::validation_with(
                "Some fields do not belong to this form",
                json!({ "invalidFieldIds": foreign_fields }),
            ));
        }

        let mut foreign_options: Vec<i32> = Vec::new();
        for answer in &request.answers {
            if let Some(option_id) = answer.form_field_option_id {
                let matches = rows
                    .options
                    .iter()
                    .any(|o| o.id == option_id && o.field_id == answer.form_field_id);
                if !matches && !foreign_options.contains(&option_id) {
                    foreign_options.push(option_id);
                }
            }
        }
        if !foreign_options.is_empty() {
            return Err(ServiceError::validation_with(
                "Some selected options do not belong to their field",
                json!({ "invalidOptionIds": foreign_options }),
            ));
        }

        let response = NewResponse {
            id: Uuid::new_v4(),
            form_id,
            created_by: submitter,
            created_at: Utc::now(),
            site: request.site.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            items: request
                .answers
                .into_iter()
                .map(|a| NewResponseItem {
                    field_id: a.form_field_id,
                    value: a.value,
                    option_id: a.form_field_option_id,
                })
                .collect(),
        };

        self.store.insert_response(&response).await?;
        info!(
            "Recorded response {} for form {} by {} ({} answers)",
            response.id,
            form_id,
            submitter,
            response.items.len()
        );

        let (saved, items) = self
            .store
            .load_response(response.id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Response {} not found", response.id)))?;
        Ok(to_details(saved, items))
    }

    /// Only the submitter or an admin may read a response
    pub async fn get(&self, response_id: Uuid, reader: Uuid, reader_is_admin: bool) -> ServiceResult<ResponseDetails> {
        let (response, items) = self
            .store
            .load_response(response_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Response {} not found", response_id)))?;

        if response.created_by != reader && !reader_is_admin {
            return Err(ServiceError::Forbidden("You may only read your own responses".to_string()));
        }
        Ok(to_details(response, items))
    }

    pub async fn list_for_form(&self, form_id: i32, query: PageQuery) -> ServiceResult<PagedResult<ResponseSummary>> {
        if self.store.load_form(form_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("Form {} not found", form_id)));
        }
        let paging = Paging::from_query(query.page, query.page_size);
        let (total, items) = self.store.list_responses(form_id, paging.offset(), paging.limit()).await?;
        Ok(PagedResult::new(paging, total, items))
    }
}

fn to_details(response: FormResponse, items: Vec<FormResponseItem>) -> ResponseDetails {
    ResponseDetails {
        id: response.id,
        form_id: response.form_id,
        created_by: response.created_by,
        created_at: response.created_at,
        site: response.site,
        answers: items
            .into_iter()
            .map(|item| AnswerDetails {
                id: item.id,
                form_field_id: item.field_id,
                value: item.value,
                form_field_option_id: item.option_id,
            })
            .collect(),
    }
}
