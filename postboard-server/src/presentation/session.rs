//! Request extractors for the acting user.
//!
//! Handlers receive the caller's identity as an explicit argument. The token
//! is read from the `Authorization: Bearer` header and verified through the
//! [`AuthService`] registered as app data.

use crate::application::AuthService;
use crate::domain::{DomainError, ErrorKind, UserId};
use actix_web::dev::Payload;
use actix_web::http::header::Header;
use actix_web::{web, FromRequest, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use std::future::{ready, Ready};
use std::sync::Arc;

/// Caller with a valid session. Rejects the request with 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

/// Caller identity when a valid session is present.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<UserId>);

fn session_user(req: &HttpRequest) -> Result<Option<UserId>, DomainError> {
    let Ok(header) = Authorization::<Bearer>::parse(req) else {
        return Ok(None);
    };

    let auth_service = req
        .app_data::<web::Data<Arc<AuthService>>>()
        .ok_or_else(|| DomainError::Internal("AuthService not configured".to_string()))?;

    auth_service
        .verify_token(header.as_ref().token())
        .map(Some)
}

impl FromRequest for AuthUser {
    type Error = DomainError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(match session_user(req) {
            Ok(Some(user_id)) => Ok(AuthUser(user_id)),
            Ok(None) => Err(DomainError::unauthenticated()),
            Err(err) if err.kind() == ErrorKind::Internal => Err(err),
            Err(_) => Err(DomainError::unauthenticated()),
        })
    }
}

impl FromRequest for MaybeUser {
    type Error = DomainError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(match session_user(req) {
            Ok(user) => Ok(MaybeUser(user)),
            Err(err) if err.kind() == ErrorKind::Internal => Err(err),
            // an expired or forged token reads as anonymous
            Err(_) => Ok(MaybeUser(None)),
        })
    }
}
