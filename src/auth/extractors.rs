use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::token::Claims;
use crate::error::AppError;

/// Extracts the authenticated identity's id from request extensions.
///
/// Intended for routes wrapped by `AuthMiddleware`, which verifies the bearer token and
/// inserts its `Claims`. If no claims are present the request is answered with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUserId(pub Uuid);

impl FromRequest for AuthenticatedUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = req
            .extensions()
            .get::<Claims>()
            .map(|claims| AuthenticatedUserId(claims.sub))
            .ok_or_else(|| AppError::Unauthorized("Missing authenticated identity".into()));
        ready(user_id.map_err(Into::into))
    }
}
