use thiserror::Error;
use tonic::transport::Error as GrpcTransportError;
use tonic::{Code, Status};

#[derive(Debug, Error)]
pub enum BlogClientError {
    // HTTP ошибки
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    // gRPC ошибки
    #[error("gRPC error: {0}")]
    GrpcError(Status),

    #[error("gRPC transport error: {0}")]
    GrpcTransportError(#[from] GrpcTransportError),

    // Ошибки URI
    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),

    // Бизнес-логика ошибки
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not logged in")]
    MissingSession,

    // Транспортные ошибки
    #[error("Transport error: {0}")]
    TransportError(String),

    // Ошибки сериализации/десериализации
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BlogClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogClientError::NotFound(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            BlogClientError::Unauthorized(_) | BlogClientError::MissingSession
        )
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, BlogClientError::Forbidden(_))
    }
}

/// Server-side rejections keep their message; everything else stays a raw status.
impl From<Status> for BlogClientError {
    fn from(status: Status) -> Self {
        let message = status.message().to_string();
        match status.code() {
            Code::InvalidArgument => Self::InvalidRequest(message),
            Code::NotFound => Self::NotFound(message),
            Code::PermissionDenied => Self::Forbidden(message),
            Code::Unauthenticated => Self::Unauthorized(message),
            _ => Self::GrpcError(status),
        }
    }
}
