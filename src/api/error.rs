use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::borrow::Cow;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Unauthorized: {0}")]
    Unauthorized(Cow<'static, str>),
    #[error("Forbidden: {0}")]
    Forbidden(Cow<'static, str>),
    #[error("Ownership Mismatch: {0}")]
    OwnershipMismatch(Cow<'static, str>),
    #[error("Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Creation Failure: {0}")]
    CreationFailure(Cow<'static, str>),
    #[error("Update Failure: {0}")]
    UpdateFailure(Cow<'static, str>),
    #[error("Deletion Failure: {0}")]
    DeletionFailure(Cow<'static, str>),
    #[error("File Save Failure: {0}")]
    FileSaveFailure(Cow<'static, str>),
    #[error("File Serve Failure: {0}")]
    FileServeFailure(Cow<'static, str>),
    #[error("Internal Server Error")]
    InternalServer,
}

#[derive(serde::Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub kind: &'static str,
    pub message: Cow<'static, str>,
}

impl Error {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn ownership_mismatch(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::OwnershipMismatch(msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn creation_failure(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::CreationFailure(msg.into())
    }

    pub fn update_failure(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::UpdateFailure(msg.into())
    }

    pub fn deletion_failure(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::DeletionFailure(msg.into())
    }

    pub fn file_save_failure(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::FileSaveFailure(msg.into())
    }

    pub fn file_serve_failure(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::FileServeFailure(msg.into())
    }

    /// Stable name of the error kind, sent to clients in the error body.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "BadRequest",
            Error::Unauthorized(_) => "Unauthorized",
            Error::Forbidden(_) => "Forbidden",
            Error::OwnershipMismatch(_) => "OwnershipMismatch",
            Error::NotFound(_) => "NotFound",
            Error::CreationFailure(_) => "CreationFailure",
            Error::UpdateFailure(_) => "UpdateFailure",
            Error::DeletionFailure(_) => "DeletionFailure",
            Error::FileSaveFailure(_) => "FileSaveFailure",
            Error::FileServeFailure(_) => "FileServeFailure",
            Error::InternalServer => "InternalServer",
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match *self {
            Error::BadRequest(_)
            | Error::CreationFailure(_)
            | Error::UpdateFailure(_)
            | Error::DeletionFailure(_)
            | Error::FileSaveFailure(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) | Error::OwnershipMismatch(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) | Error::FileServeFailure(_) => StatusCode::NOT_FOUND,
            Error::InternalServer => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Error::BadRequest(msg)
            | Error::Unauthorized(msg)
            | Error::Forbidden(msg)
            | Error::OwnershipMismatch(msg)
            | Error::NotFound(msg)
            | Error::CreationFailure(msg)
            | Error::UpdateFailure(msg)
            | Error::DeletionFailure(msg)
            | Error::FileSaveFailure(msg)
            | Error::FileServeFailure(msg) => msg.clone(),
            Error::InternalServer => "Internal Server Error".into(),
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            kind: self.kind(),
            message,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    // jwt errors
    #[error("JWT Error")]
    JwtError(#[from] jsonwebtoken::errors::Error),
    // sqlx errors
    #[error("Database Error : {0}")]
    DatabaseError(Cow<'static, str>),
    #[error("Migration Error")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
    // serde errors
    #[error("JSON Serialization/Deserialization Error")]
    JsonError(#[from] serde_json::Error),
    // storage errors
    #[error("Storage Error: {0}")]
    StorageError(#[from] opendal::Error),
    #[error("IO Error")]
    IoError(#[from] std::io::Error),
    // Custom Errors
    #[error("Bad Request: {0}")]
    BadRequest(Cow<'static, str>),
    #[error("Database Not Found: {0}")]
    NotFound(Cow<'static, str>),
    #[error("Internal System Error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl From<sqlx::Error> for SystemError {
    fn from(err: sqlx::Error) -> Self {
        log::error!("{:?}", err);
        if let sqlx::Error::Database(db_err) = &err {
            return match db_err.code().as_deref() {
                Some("42P01") => SystemError::NotFound("Resource not found".into()),
                _ => SystemError::DatabaseError(db_err.message().to_string().into()),
            };
        }
        SystemError::InternalError(Box::new(err))
    }
}

impl SystemError {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Logs the underlying cause and replaces it with the caller's generic
    /// failure, so distinct root causes surface as one kind.
    pub fn collapse(self, fallback: Error) -> Error {
        log::error!("{} ({:?})", fallback, self);
        fallback
    }
}
