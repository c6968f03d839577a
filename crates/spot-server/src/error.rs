use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use spot_registry::{ErrorKind, RegistryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("resource {0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("action {0:?} not supported")]
    UnknownAction(String),

    #[error("store error: {0}")]
    Store(#[from] spot_store::StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Registry(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Store | ErrorKind::Generation => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) | Self::UnknownAction(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        Self::BadRequest(format!("failed to unmarshal JSON object: {e}"))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let reason = status.canonical_reason().unwrap_or("Error");
        // server-side failures are logged in full and answered generically
        let body = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            reason.to_string()
        } else {
            format!("{reason}: {self}")
        };
        (status, body).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
