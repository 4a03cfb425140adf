use async_trait::async_trait;
use futures::FutureExt;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::warn;
use uuid::Uuid;

use super::PgStore;
use crate::database::models::{FormResponse, FormResponseItem, NewResponse, ResponseSummary};
use crate::database::repository::{DbResult, ResponseStore};
use crate::database::retry::{self, UnitError};

#[async_trait]
impl ResponseStore for PgStore {
    async fn insert_response(&self, response: &NewResponse) -> DbResult<()> {
        let pool = &self.pool;
        retry::execute(&self.retry, "insert_response", || insert_response_rows(pool, response).boxed()).await?;
        Ok(())
    }

    async fn load_response(&self, id: Uuid) -> DbResult<Option<(FormResponse, Vec<FormResponseItem>)>> {
        let response = sqlx::query_as::<_, FormResponse>(
            "SELECT id, form_id, created_by, created_at, site FROM form.responses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(response) = response else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, FormResponseItem>(
            r#"
            SELECT id, response_id, field_id, value, option_id
            FROM form.response_items
            WHERE response_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some((response, items)))
    }

    async fn list_responses(&self, form_id: i32, offset: i64, limit: i64) -> DbResult<(i64, Vec<ResponseSummary>)> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM form.responses WHERE form_id = $1")
            .bind(form_id)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, ResponseSummary>(
            r#"
            SELECT r.id, r.created_by, r.created_at, r.site, COUNT(i.id) AS item_count
            FROM form.responses r
            LEFT JOIN form.response_items i ON i.response_id = r.id
            WHERE r.form_id = $1
            GROUP BY r.id
            ORDER BY r.created_at DESC, r.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(form_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((total.0, items))
    }
}

async fn insert_response_rows(pool: &PgPool, response: &NewResponse) -> Result<(), UnitError> {
    let mut tx = pool.begin().await?;
    match write_response(&mut tx, response).await {
        Ok(()) => tx.commit().await.map_err(UnitError::Commit),
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback of response {} failed, ignoring: {}", response.id, rollback_err);
            }
            Err(err.into())
        }
    }
}

async fn write_response(tx: &mut Transaction<'_, Postgres>, response: &NewResponse) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO form.responses (id, form_id, created_by, created_at, site) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(response.id)
    .bind(response.form_id)
    .bind(response.created_by)
    .bind(response.created_at)
    .bind(&response.site)
    .execute(&mut **tx)
    .await?;

    for item in &response.items {
        sqlx::query(
            "INSERT INTO form.response_items (response_id, field_id, value, option_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(response.id)
        .bind(item.field_id)
        .bind(&item.value)
        .bind(item.option_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}
