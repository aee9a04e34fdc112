use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::document::{
        model::{Body, Filter, PageWindow, Sort, SortField, SortOrder},
        repository::DocumentStore,
        schema::DocumentEntity,
    },
};

/// In-process store with the same semantics as the Postgres one.
#[derive(Default)]
pub struct DocumentStoreMemory {
    documents: Mutex<Vec<DocumentEntity>>,
    failing: AtomicBool,
    failing_deletes: AtomicBool,
    racing_deletes: AtomicBool,
}

fn matches(document: &DocumentEntity, collection: &str, filter: &Filter) -> bool {
    document.collection == collection
        && filter.iter().all(|(key, value)| document.body.0.get(key) == Some(value))
}

fn sort_key(document: &DocumentEntity, field: SortField) -> (DateTime<Utc>, Uuid) {
    match field {
        SortField::CreatedAt => (document.created_at, document.id),
        SortField::UpdatedAt => (document.updated_at, document.id),
    }
}

fn sorted(mut documents: Vec<DocumentEntity>, sort: Option<Sort>) -> Vec<DocumentEntity> {
    match sort {
        Some(Sort { field, order }) => documents.sort_by(|a, b| {
            let ordering = sort_key(a, field).cmp(&sort_key(b, field));
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        }),
        None => documents.sort_by_key(|d| d.id),
    }
    documents
}

impl DocumentStoreMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail with a database error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes only `delete_by_id` fail.
    pub fn set_failing_deletes(&self, failing: bool) {
        self.failing_deletes.store(failing, Ordering::SeqCst);
    }

    /// `delete_by_id` finds its target already gone, as when a concurrent
    /// request deleted it after it was read.
    pub fn set_racing_deletes(&self, racing: bool) {
        self.racing_deletes.store(racing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), error::SystemError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(error::SystemError::DatabaseError("store unavailable".into()));
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DocumentEntity>> {
        self.documents.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn count(&self, collection: &str) -> usize {
        self.lock().iter().filter(|d| d.collection == collection).count()
    }

    /// Inserts a document with explicit timestamps.
    pub fn seed(&self, collection: &str, body: Body, at: DateTime<Utc>) -> DocumentEntity {
        let document = DocumentEntity {
            id: Uuid::now_v7(),
            collection: collection.to_string(),
            body: sqlx::types::Json(body),
            created_at: at,
            updated_at: at,
        };
        self.lock().push(document.clone());
        document
    }

    fn new_document(collection: &str, body: &Body, now: DateTime<Utc>) -> DocumentEntity {
        DocumentEntity {
            id: Uuid::now_v7(),
            collection: collection.to_string(),
            body: sqlx::types::Json(body.clone()),
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for DocumentStoreMemory {
    async fn find_by_id(
        &self,
        collection: &str,
        id: &Uuid,
    ) -> Result<Option<DocumentEntity>, error::SystemError> {
        self.check()?;
        Ok(self.lock().iter().find(|d| d.collection == collection && d.id == *id).cloned())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<DocumentEntity>, error::SystemError> {
        self.check()?;
        let found: Vec<_> =
            self.lock().iter().filter(|d| matches(d, collection, filter)).cloned().collect();
        Ok(sorted(found, None).into_iter().next())
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<Sort>,
    ) -> Result<Vec<DocumentEntity>, error::SystemError> {
        self.check()?;
        let found: Vec<_> =
            self.lock().iter().filter(|d| matches(d, collection, filter)).cloned().collect();
        Ok(sorted(found, sort))
    }

    async fn find_page(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Sort,
        window: PageWindow,
    ) -> Result<Vec<DocumentEntity>, error::SystemError> {
        let all = self.find_many(collection, filter, Some(sort)).await?;
        let skip = usize::try_from(window.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
        Ok(all.into_iter().skip(skip).take(limit).collect())
    }

    async fn insert_one(
        &self,
        collection: &str,
        body: &Body,
    ) -> Result<DocumentEntity, error::SystemError> {
        self.check()?;
        let document = Self::new_document(collection, body, Utc::now());
        self.lock().push(document.clone());
        Ok(document)
    }

    async fn insert_many(
        &self,
        collection: &str,
        bodies: &[Body],
    ) -> Result<Vec<DocumentEntity>, error::SystemError> {
        self.check()?;
        let now = Utc::now();
        let documents: Vec<_> =
            bodies.iter().map(|body| Self::new_document(collection, body, now)).collect();
        self.lock().extend(documents.iter().cloned());
        Ok(documents)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &Uuid,
        guard: &Filter,
        body: &Body,
    ) -> Result<Option<DocumentEntity>, error::SystemError> {
        self.check()?;
        let mut documents = self.lock();
        let Some(document) =
            documents.iter_mut().find(|d| d.id == *id && matches(d, collection, guard))
        else {
            return Ok(None);
        };

        let floor = document.updated_at + chrono::Duration::microseconds(1);
        document.body = sqlx::types::Json(body.clone());
        document.updated_at = Utc::now().max(floor);
        Ok(Some(document.clone()))
    }

    async fn delete_by_id(
        &self,
        collection: &str,
        id: &Uuid,
        guard: &Filter,
    ) -> Result<bool, error::SystemError> {
        self.check()?;
        if self.failing_deletes.load(Ordering::SeqCst) {
            return Err(error::SystemError::DatabaseError("delete failed".into()));
        }
        let mut documents = self.lock();
        if self.racing_deletes.load(Ordering::SeqCst) {
            documents.retain(|d| d.id != *id);
        }
        let before = documents.len();
        documents.retain(|d| !(d.id == *id && matches(d, collection, guard)));
        Ok(documents.len() < before)
    }
}
