use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::{
    constants::DEFAULT_PAGE_LIMIT,
    modules::{
        document::model::{Body, SortOrder},
        post::schema::PostEntity,
    },
};

/// Keys the store manages itself; client values for them are dropped.
const RESERVED_KEYS: [&str; 4] = ["id", "_id", "createdAt", "updatedAt"];

#[derive(Deserialize, Validate)]
pub struct PageQuery {
    #[serde(rename = "_limit")]
    #[validate(range(min = 1, message = "_limit must be at least 1"))]
    pub limit: Option<u64>,
    #[serde(rename = "_order")]
    pub order: Option<String>,
}

impl PageQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }

    pub fn order(&self) -> SortOrder {
        match self.order.as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum DraftError {
    Missing,
    InvalidPublic,
}

impl DraftError {
    pub fn message(&self) -> &'static str {
        match self {
            DraftError::Missing => "Missing post body",
            DraftError::InvalidPublic => "Field 'public' must be a boolean",
        }
    }
}

/// Owner named by a request body, if any.
pub fn owner_of(value: &Value) -> Option<&str> {
    value.get("username").and_then(Value::as_str)
}

/// Turns a request body into a storable document body.
pub fn into_draft(value: Value) -> Result<Body, DraftError> {
    let Value::Object(mut body) = value else {
        return Err(DraftError::Missing);
    };
    if body.is_empty() {
        return Err(DraftError::Missing);
    }

    for key in RESERVED_KEYS {
        body.remove(key);
    }

    if body.get("public").is_some_and(|public| !public.is_boolean()) {
        return Err(DraftError::InvalidPublic);
    }

    Ok(body)
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CreatedPosts {
    One(PostEntity),
    Many(Vec<PostEntity>),
}
