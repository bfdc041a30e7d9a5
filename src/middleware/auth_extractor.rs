// src/middleware/auth_extractor.rs
use actix_web::error::ErrorUnauthorized;
use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use log::debug;
use uuid::Uuid;

use crate::dtos::auth_dtos::SessionCookie;
use crate::services::auth_services::AuthService;

pub const SESSION_COOKIE: &str = "sb-session";
pub const VERIFIER_COOKIE: &str = "sb-code-verifier";

/// The authenticated caller. Extracting this fails with 401 unless the
/// request carries a valid access token; use `Option<AuthenticatedUser>`
/// where anonymous access is allowed.
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Access token from the `Authorization: Bearer` header, falling back to
/// the session cookie set by the OAuth callback.
pub fn access_token(req: &HttpRequest) -> Option<String> {
    if let Some(header) = req.headers().get("Authorization") {
        if let Ok(value) = header.to_str() {
            if let Some(token) = value.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    let cookie = req.cookie(SESSION_COOKIE)?;
    let session: SessionCookie = serde_json::from_str(cookie.value()).ok()?;
    Some(session.access_token)
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<AuthenticatedUser, Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let svc = match req.app_data::<web::Data<AuthService>>() {
            Some(svc) => svc,
            None => return ready(Err(ErrorUnauthorized("auth service unavailable"))),
        };

        let token = match access_token(req) {
            Some(token) => token,
            None => return ready(Err(ErrorUnauthorized("missing access token"))),
        };

        match svc.user_id_from_token(&token) {
            Ok(user_id) => ready(Ok(AuthenticatedUser { user_id })),
            Err(e) => {
                debug!("token rejected: {}", e);
                ready(Err(ErrorUnauthorized("invalid token")))
            }
        }
    }
}
