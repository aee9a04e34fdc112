use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    api::error,
    modules::document::{
        model::{Body, Filter, PageWindow, Sort, SortField, SortOrder},
        repository::DocumentStore,
        schema::DocumentEntity,
    },
};

const COLUMNS: &str = "id, collection, body, created_at, updated_at";

fn order_by(sort: Option<Sort>) -> &'static str {
    match sort {
        Some(Sort { field: SortField::CreatedAt, order: SortOrder::Asc }) => {
            "ORDER BY created_at ASC, id ASC"
        }
        Some(Sort { field: SortField::CreatedAt, order: SortOrder::Desc }) => {
            "ORDER BY created_at DESC, id DESC"
        }
        Some(Sort { field: SortField::UpdatedAt, order: SortOrder::Asc }) => {
            "ORDER BY updated_at ASC, id ASC"
        }
        Some(Sort { field: SortField::UpdatedAt, order: SortOrder::Desc }) => {
            "ORDER BY updated_at DESC, id DESC"
        }
        None => "ORDER BY id ASC",
    }
}

#[derive(Clone)]
pub struct DocumentStorePg {
    pool: sqlx::PgPool,
}

impl DocumentStorePg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DocumentStore for DocumentStorePg {
    async fn find_by_id(
        &self,
        collection: &str,
        id: &Uuid,
    ) -> Result<Option<DocumentEntity>, error::SystemError> {
        let document = sqlx::query_as::<_, DocumentEntity>(&format!(
            "SELECT {COLUMNS} FROM documents WHERE collection = $1 AND id = $2"
        ))
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(document)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<DocumentEntity>, error::SystemError> {
        let document = sqlx::query_as::<_, DocumentEntity>(&format!(
            "SELECT {COLUMNS} FROM documents WHERE collection = $1 AND body @> $2 \
             ORDER BY id LIMIT 1"
        ))
        .bind(collection)
        .bind(Json(filter))
        .fetch_optional(&self.pool)
        .await?;
        Ok(document)
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<Sort>,
    ) -> Result<Vec<DocumentEntity>, error::SystemError> {
        let documents = sqlx::query_as::<_, DocumentEntity>(&format!(
            "SELECT {COLUMNS} FROM documents WHERE collection = $1 AND body @> $2 {}",
            order_by(sort)
        ))
        .bind(collection)
        .bind(Json(filter))
        .fetch_all(&self.pool)
        .await?;
        Ok(documents)
    }

    async fn find_page(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Sort,
        window: PageWindow,
    ) -> Result<Vec<DocumentEntity>, error::SystemError> {
        let limit = i64::try_from(window.limit)
            .map_err(|_| error::SystemError::bad_request("Page limit out of range"))?;
        let skip = i64::try_from(window.skip)
            .map_err(|_| error::SystemError::bad_request("Page offset out of range"))?;

        let documents = sqlx::query_as::<_, DocumentEntity>(&format!(
            "SELECT {COLUMNS} FROM documents WHERE collection = $1 AND body @> $2 {} \
             LIMIT $3 OFFSET $4",
            order_by(Some(sort))
        ))
        .bind(collection)
        .bind(Json(filter))
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(documents)
    }

    async fn insert_one(
        &self,
        collection: &str,
        body: &Body,
    ) -> Result<DocumentEntity, error::SystemError> {
        let now = chrono::Utc::now();
        let document = sqlx::query_as::<_, DocumentEntity>(&format!(
            "INSERT INTO documents (id, collection, body, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) RETURNING {COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(collection)
        .bind(Json(body))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(document)
    }

    async fn insert_many(
        &self,
        collection: &str,
        bodies: &[Body],
    ) -> Result<Vec<DocumentEntity>, error::SystemError> {
        let now = chrono::Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut documents = Vec::with_capacity(bodies.len());

        for body in bodies {
            let document = sqlx::query_as::<_, DocumentEntity>(&format!(
                "INSERT INTO documents (id, collection, body, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $4) RETURNING {COLUMNS}"
            ))
            .bind(Uuid::now_v7())
            .bind(collection)
            .bind(Json(body))
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            documents.push(document);
        }

        tx.commit().await?;
        Ok(documents)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &Uuid,
        guard: &Filter,
        body: &Body,
    ) -> Result<Option<DocumentEntity>, error::SystemError> {
        // updated_at must move forward even when two writes share a clock tick
        let document = sqlx::query_as::<_, DocumentEntity>(&format!(
            r#"
            UPDATE documents
            SET body = $4,
                updated_at = GREATEST($5, updated_at + INTERVAL '1 microsecond')
            WHERE collection = $1 AND id = $2 AND body @> $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(collection)
        .bind(id)
        .bind(Json(guard))
        .bind(Json(body))
        .bind(chrono::Utc::now())
        .fetch_optional(&self.pool)
        .await?;
        Ok(document)
    }

    async fn delete_by_id(
        &self,
        collection: &str,
        id: &Uuid,
        guard: &Filter,
    ) -> Result<bool, error::SystemError> {
        let rows = sqlx::query(
            "DELETE FROM documents WHERE collection = $1 AND id = $2 AND body @> $3",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(guard))
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }
}
