use uuid::Uuid;

use crate::{
    api::error,
    modules::document::{
        model::{Body, Filter, PageWindow, Sort},
        schema::DocumentEntity,
    },
};

/// Generic id/filter based access to a document collection.
///
/// Filters match documents whose body contains every key/value pair of the
/// filter. `guard` filters on update and delete make the write conditional:
/// nothing happens unless the stored document matches.
#[async_trait::async_trait]
pub trait DocumentStore {
    async fn find_by_id(
        &self,
        collection: &str,
        id: &Uuid,
    ) -> Result<Option<DocumentEntity>, error::SystemError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<DocumentEntity>, error::SystemError>;

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<Sort>,
    ) -> Result<Vec<DocumentEntity>, error::SystemError>;

    async fn find_page(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Sort,
        window: PageWindow,
    ) -> Result<Vec<DocumentEntity>, error::SystemError>;

    async fn insert_one(
        &self,
        collection: &str,
        body: &Body,
    ) -> Result<DocumentEntity, error::SystemError>;

    /// Inserts every body or none of them.
    async fn insert_many(
        &self,
        collection: &str,
        bodies: &[Body],
    ) -> Result<Vec<DocumentEntity>, error::SystemError>;

    /// Replaces the body and bumps `updated_at`. `None` when no document
    /// with that id matches `guard`.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &Uuid,
        guard: &Filter,
        body: &Body,
    ) -> Result<Option<DocumentEntity>, error::SystemError>;

    async fn delete_by_id(
        &self,
        collection: &str,
        id: &Uuid,
        guard: &Filter,
    ) -> Result<bool, error::SystemError>;
}
