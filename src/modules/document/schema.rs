use serde_json::{Map, Value};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Row of the `documents` table. Server-managed fields live in columns,
/// everything the client sent lives in `body`.
#[derive(Debug, Clone, FromRow)]
pub struct DocumentEntity {
    pub id: Uuid,
    pub collection: String,
    pub body: sqlx::types::Json<Map<String, Value>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl DocumentEntity {
    /// Flattens the row into one JSON object: `body` plus `id`,
    /// `createdAt` and `updatedAt`.
    pub fn into_value(self) -> Value {
        let mut object = self.body.0;
        object.insert("id".into(), Value::String(self.id.to_string()));
        object.insert("createdAt".into(), Value::String(self.created_at.to_rfc3339()));
        object.insert("updatedAt".into(), Value::String(self.updated_at.to_rfc3339()));
        Value::Object(object)
    }
}
