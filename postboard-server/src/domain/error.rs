use thiserror::Error;

/// Coarse classification every boundary adapter switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    NotAuthorized,
    Unauthenticated,
    Internal,
}

/// Action named in ownership rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    Modify,
    Delete,
}

impl std::fmt::Display for PostAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Modify => f.write_str("modify"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid limit")]
    InvalidLimit,

    #[error("Invalid page")]
    InvalidPage,

    #[error("Invalid authorId")]
    InvalidAuthorId,

    #[error("Title is required")]
    InvalidTitle,

    #[error("Content is required")]
    InvalidContent,

    #[error("Invalid published flag")]
    InvalidPublishedFlag,

    #[error("Invalid post id")]
    InvalidId,

    #[error("Invalid user id")]
    InvalidUserId,

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Password must be at least {0} characters")]
    InvalidPassword(usize),

    #[error("Invalid name")]
    InvalidName,

    #[error("Invalid request body")]
    InvalidRequestBody,

    #[error("No fields to update")]
    NoFieldsToUpdate,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Author not found")]
    AuthorNotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Not authorized to {0} this post")]
    NotAuthorized(PostAction),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLimit
            | Self::InvalidPage
            | Self::InvalidAuthorId
            | Self::InvalidTitle
            | Self::InvalidContent
            | Self::InvalidPublishedFlag
            | Self::InvalidId
            | Self::InvalidUserId
            | Self::InvalidEmail
            | Self::InvalidPassword(_)
            | Self::InvalidName
            | Self::InvalidRequestBody
            | Self::NoFieldsToUpdate
            | Self::EmailAlreadyRegistered => ErrorKind::InvalidInput,
            Self::AuthorNotFound | Self::PostNotFound => ErrorKind::NotFound,
            Self::NotAuthorized(_) => ErrorKind::NotAuthorized,
            Self::InvalidCredentials | Self::Unauthenticated(_) => ErrorKind::Unauthenticated,
            Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn unauthenticated() -> Self {
        Self::Unauthenticated("Authentication required".to_string())
    }

    /// Message safe to hand to a client. Internal failures are redacted.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}
