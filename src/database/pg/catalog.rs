use async_trait::async_trait;
use futures::FutureExt;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use super::{conflict_on_unique, contains_pattern, PgStore};
use crate::database::models::{
    CategorySummary, FieldType, Form, FormCategory, FormField, FormFieldOption, FormFilter, FormRows, FormSection,
    FormSummary, NewForm,
};
use crate::database::repository::{CatalogStore, DbResult};
use crate::database::retry::{self, UnitError};

#[async_trait]
impl CatalogStore for PgStore {
    async fn category_exists(&self, id: i32) -> DbResult<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM form.categories WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    async fn category_name_taken(&self, name: &str) -> DbResult<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM form.categories WHERE lower(name) = lower($1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    async fn insert_category(&self, name: &str) -> DbResult<FormCategory> {
        sqlx::query_as::<_, FormCategory>("INSERT INTO form.categories (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, format!("Category '{}' already exists", name)))
    }

    async fn list_categories(&self) -> DbResult<Vec<CategorySummary>> {
        let rows = sqlx::query_as::<_, CategorySummary>(
            r#"
            SELECT c.id, c.name, COUNT(f.id) AS forms_count
            FROM form.categories c
            LEFT JOIN form.forms f ON f.category_id = c.id
            GROUP BY c.id, c.name
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_field_types(&self) -> DbResult<Vec<FieldType>> {
        let rows = sqlx::query_as::<_, FieldType>("SELECT id, name FROM form.field_types ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn existing_field_type_ids(&self, ids: &[i32]) -> DbResult<Vec<i32>> {
        let rows: Vec<(i32,)> = sqlx::query_as("SELECT id FROM form.field_types WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn insert_form(&self, form: &NewForm) -> DbResult<i32> {
        let pool = &self.pool;
        let id = retry::execute(&self.retry, "insert_form", || insert_form_tree(pool, form).boxed()).await?;
        Ok(id)
    }

    async fn load_form(&self, id: i32) -> DbResult<Option<FormRows>> {
        let form = sqlx::query_as::<_, Form>(
            r#"
            SELECT f.id, f.name, f.category_id, c.name AS category_name
            FROM form.forms f
            JOIN form.categories c ON c.id = f.category_id
            WHERE f.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(form) = form else {
            return Ok(None);
        };

        let sections = sqlx::query_as::<_, FormSection>(
            "SELECT id, form_id, name FROM form.sections WHERE form_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let fields = sqlx::query_as::<_, FormField>(
            r#"
            SELECT fl.id, fl.section_id, fl.name, fl.description, fl.field_type_id, t.name AS field_type_name
            FROM form.fields fl
            JOIN form.sections s ON s.id = fl.section_id
            JOIN form.field_types t ON t.id = fl.field_type_id
            WHERE s.form_id = $1
            ORDER BY fl.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let options = sqlx::query_as::<_, FormFieldOption>(
            r#"
            SELECT o.id, o.field_id, o.name
            FROM form.field_options o
            JOIN form.fields fl ON fl.id = o.field_id
            JOIN form.sections s ON s.id = fl.section_id
            WHERE s.form_id = $1
            ORDER BY o.id
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(FormRows {
            form,
            sections,
            fields,
            options,
        }))
    }

    async fn list_forms(&self, filter: &FormFilter, offset: i64, limit: i64) -> DbResult<(i64, Vec<FormSummary>)> {
        let pattern = filter.search.as_deref().map(contains_pattern);

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM form.forms f
            WHERE ($1::text IS NULL OR f.name ILIKE $1)
              AND ($2::int IS NULL OR f.category_id = $2)
            "#,
        )
        .bind(&pattern)
        .bind(filter.category_id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, FormSummary>(
            r#"
            SELECT f.id, f.name, c.name AS category,
                   (SELECT COUNT(*) FROM form.sections s WHERE s.form_id = f.id) AS sections
            FROM form.forms f
            JOIN form.categories c ON c.id = f.category_id
            WHERE ($1::text IS NULL OR f.name ILIKE $1)
              AND ($2::int IS NULL OR f.category_id = $2)
            ORDER BY f.name, f.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&pattern)
        .bind(filter.category_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((total.0, items))
    }
}

/// One attempt: a fresh transaction holding every row of the tree
async fn insert_form_tree(pool: &PgPool, form: &NewForm) -> Result<i32, UnitError> {
    let mut tx = pool.begin().await?;
    match write_form_tree(&mut tx, form).await {
        Ok(id) => {
            tx.commit().await.map_err(UnitError::Commit)?;
            Ok(id)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Rollback of form insert failed, ignoring: {}", rollback_err);
            }
            Err(err.into())
        }
    }
}

async fn write_form_tree(tx: &mut Transaction<'_, Postgres>, form: &NewForm) -> Result<i32, sqlx::Error> {
    let (form_id,): (i32,) = sqlx::query_as("INSERT INTO form.forms (name, category_id) VALUES ($1, $2) RETURNING id")
        .bind(&form.name)
        .bind(form.category_id)
        .fetch_one(&mut **tx)
        .await?;

    for section in &form.sections {
        let (section_id,): (i32,) =
            sqlx::query_as("INSERT INTO form.sections (form_id, name) VALUES ($1, $2) RETURNING id")
                .bind(form_id)
                .bind(&section.name)
                .fetch_one(&mut **tx)
                .await?;

        for field in &section.fields {
            let (field_id,): (i32,) = sqlx::query_as(
                r#"
                INSERT INTO form.fields (section_id, name, description, field_type_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(section_id)
            .bind(&field.name)
            .bind(&field.description)
            .bind(field.field_type_id)
            .fetch_one(&mut **tx)
            .await?;

            for option in &field.options {
                sqlx::query("INSERT INTO form.field_options (field_id, name) VALUES ($1, $2)")
                    .bind(field_id)
                    .bind(option)
                    .execute(&mut **tx)
                    .await?;
            }
        }
    }

    debug!("Wrote form {} with {} sections", form_id, form.sections.len());
    Ok(form_id)
}
