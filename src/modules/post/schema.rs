use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{api::error, modules::document::schema::DocumentEntity};

/// A post as clients see it. Fields other than the ones named here are
/// carried through untouched in `content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostEntity {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub public: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl TryFrom<DocumentEntity> for PostEntity {
    type Error = error::SystemError;

    fn try_from(document: DocumentEntity) -> Result<Self, Self::Error> {
        Ok(serde_json::from_value(document.into_value())?)
    }
}
