use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unauthorized")]
    Auth,

    #[error("{0}")]
    Validation(String),

    #[error("agent not configured: {0}")]
    NotConfigured(String),

    #[error("process supervisor error: {0}")]
    Supervisor(String),

    #[error("skill install failed: {0}")]
    SkillInstall(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            Error::Auth => (StatusCode::UNAUTHORIZED, self.to_string()),
            Error::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::NotConfigured(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Error::Supervisor(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            Error::SkillInstall(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            Error::Json(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            Error::Toml(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
