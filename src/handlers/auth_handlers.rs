// src/handlers/auth_handlers.rs
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use log::{error, info, warn};
use regex::Regex;
use urlencoding::encode;

use crate::dtos::auth_dtos::{CallbackQuery, LoginQuery, SessionCookie};
use crate::middleware::auth_extractor::{access_token, SESSION_COOKIE, VERIFIER_COOKIE};
use crate::services::auth_services::{new_code_verifier, AuthService};

const VERIFIER_TTL_SECONDS: i64 = 600;

fn origin(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

/// Return paths must stay on this site: a single leading slash, no
/// protocol-relative `//host` or backslash escapes.
fn sanitize_next(next: Option<&str>) -> String {
    let re = Regex::new(r"^/$|^/[^/\\][^\\]*$").unwrap();
    match next {
        Some(n) if re.is_match(n) => n.to_string(),
        _ => "/".to_string(),
    }
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .finish()
}

/// Kick off the provider flow: stash a PKCE verifier in a short-lived cookie
/// and send the browser to GoTrue's authorize endpoint, which bounces it
/// back to `/auth/callback`.
#[get("/login")]
pub async fn oauth_login(
    req: HttpRequest,
    svc: web::Data<AuthService>,
    query: web::Query<LoginQuery>,
) -> HttpResponse {
    let provider = query.provider.as_deref().unwrap_or("google");
    let next = sanitize_next(query.next.as_deref());
    let verifier = new_code_verifier();

    let redirect_to = format!("{}/auth/callback?next={}", origin(&req), encode(&next));
    let authorize = svc.authorize_url(provider, &redirect_to, &verifier);

    let verifier_cookie = Cookie::build(VERIFIER_COOKIE, verifier)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(VERIFIER_TTL_SECONDS))
        .finish();

    HttpResponse::Found()
        .cookie(verifier_cookie)
        .insert_header((header::LOCATION, authorize))
        .finish()
}

/// Exchange the provider's code for a session. Every failure path lands the
/// browser back on the application root without a session.
#[get("/callback")]
pub async fn oauth_callback(
    req: HttpRequest,
    svc: web::Data<AuthService>,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    let origin = origin(&req);
    let next = sanitize_next(query.next.as_deref());

    let fallback = |origin: &str| {
        HttpResponse::Found()
            .cookie(removal_cookie(VERIFIER_COOKIE))
            .insert_header((header::LOCATION, format!("{}/", origin)))
            .finish()
    };

    let code = match query.code.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => {
            warn!("callback without code");
            return fallback(&origin);
        }
    };

    let verifier = match req.cookie(VERIFIER_COOKIE) {
        Some(cookie) => cookie.value().to_string(),
        None => {
            warn!("callback without verifier cookie");
            return fallback(&origin);
        }
    };

    match svc.exchange_code(code, &verifier).await {
        Ok((session, user_id)) => {
            let payload = match serde_json::to_string(&SessionCookie::from_session(&session)) {
                Ok(p) => p,
                Err(e) => {
                    error!("session cookie serialization failed: {}", e);
                    return fallback(&origin);
                }
            };

            info!("session established for {}", user_id);
            HttpResponse::Found()
                .cookie(session_cookie(payload))
                .cookie(removal_cookie(VERIFIER_COOKIE))
                .insert_header((header::LOCATION, format!("{}{}", origin, next)))
                .finish()
        }
        Err(e) => {
            error!("code exchange failed: {}", e);
            fallback(&origin)
        }
    }
}

/// Drop the session. GoTrue revocation is best-effort; the cookie is cleared
/// regardless so the browser forgets the tokens.
#[post("/logout")]
pub async fn logout(req: HttpRequest, svc: web::Data<AuthService>) -> HttpResponse {
    if let Some(token) = access_token(&req) {
        if let Err(e) = svc.sign_out(&token).await {
            warn!("sign-out failed: {}", e);
        }
    }

    HttpResponse::SeeOther()
        .cookie(removal_cookie(SESSION_COOKIE))
        .insert_header((header::LOCATION, format!("{}/", origin(&req))))
        .finish()
}
