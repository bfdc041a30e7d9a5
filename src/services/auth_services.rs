// src/services/auth_services.rs
use base64::Engine;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use urlencoding::encode;
use uuid::Uuid;

use crate::config::SupabaseConfig;
use crate::dtos::auth_dtos::SessionOut;
use crate::models::profile::JwtClaims;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("supabase error: {0}")]
    Supabase(String),
    #[error("invalid token")]
    InvalidToken,
    #[error("parse uuid error")]
    UuidError(#[from] uuid::Error),
}

/// GoTrue pass-through: the server never mints its own identities, it only
/// exchanges OAuth codes for Supabase sessions and checks the tokens that
/// come back on later requests.
#[derive(Clone)]
pub struct AuthService {
    client: reqwest::Client,
    supabase_url: String,
    anon_key: String,
    jwt_secret: Option<String>,
}

impl AuthService {
    pub fn new(cfg: &SupabaseConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            supabase_url: cfg.url.clone(),
            anon_key: cfg.anon_key.clone(),
            jwt_secret: cfg.jwt_secret.clone(),
        }
    }

    /// Provider sign-in URL the browser is redirected to. PKCE with the
    /// `plain` method; the verifier doubles as the challenge.
    pub fn authorize_url(&self, provider: &str, redirect_to: &str, verifier: &str) -> String {
        format!(
            "{}/auth/v1/authorize?provider={}&redirect_to={}&code_challenge={}&code_challenge_method=plain",
            self.supabase_url.trim_end_matches('/'),
            encode(provider),
            encode(redirect_to),
            encode(verifier),
        )
    }

    /// Swap the callback `code` for a session.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
    ) -> Result<(SessionOut, Uuid), AuthError> {
        #[derive(Serialize)]
        struct Body<'a> {
            auth_code: &'a str,
            code_verifier: &'a str,
        }

        #[derive(Deserialize)]
        struct TokenResp {
            access_token: String,
            refresh_token: Option<String>,
            expires_in: Option<i64>,
            token_type: Option<String>,
            user: Option<UserInfo>,
        }

        #[derive(Deserialize)]
        struct UserInfo {
            id: String,
        }

        let url = format!(
            "{}/auth/v1/token?grant_type=pkce",
            self.supabase_url.trim_end_matches('/')
        );

        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&Body {
                auth_code: code,
                code_verifier: verifier,
            })
            .send()
            .await?;

        let status = resp.status();
        let txt = resp.text().await.unwrap_or_default();

        if status != StatusCode::OK {
            return Err(AuthError::Supabase(format!(
                "code exchange failed: {} {}",
                status, txt
            )));
        }

        let tr: TokenResp = serde_json::from_str(&txt)
            .map_err(|e| AuthError::Supabase(format!("invalid json in token response: {}", e)))?;

        let user_id = match tr.user {
            Some(user) => Uuid::parse_str(&user.id)?,
            None => return Err(AuthError::Supabase("no user info in token response".into())),
        };

        let session = SessionOut {
            access_token: tr.access_token,
            refresh_token: tr.refresh_token,
            expires_in: tr.expires_in,
            token_type: tr.token_type,
        };

        Ok((session, user_id))
    }

    /// Revoke the session behind `access_token`. Callers treat failure as a
    /// warning; the cookie is cleared either way.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = format!(
            "{}/auth/v1/logout",
            self.supabase_url.trim_end_matches('/')
        );

        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            return Err(AuthError::Supabase(format!(
                "logout failed: {} {}",
                status, txt
            )));
        }
        Ok(())
    }

    /// Claims from an access token. With a configured secret the signature
    /// and expiry are verified; without one the payload is parsed as-is and
    /// only the expiry is checked.
    pub fn verify_claims(&self, token: &str) -> Result<JwtClaims, AuthError> {
        match self.jwt_secret {
            Some(ref secret) => {
                let validation = Validation::new(Algorithm::HS256);
                let data = decode::<JwtClaims>(
                    token,
                    &DecodingKey::from_secret(secret.as_bytes()),
                    &validation,
                )
                .map_err(|_| AuthError::InvalidToken)?;
                Ok(data.claims)
            }
            None => {
                let claims = unverified_claims(token)?;
                if let Some(exp) = claims.exp {
                    if exp < chrono::Utc::now().timestamp() {
                        return Err(AuthError::InvalidToken);
                    }
                }
                Ok(claims)
            }
        }
    }

    pub fn user_id_from_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = self.verify_claims(token)?;
        Ok(Uuid::parse_str(&claims.sub)?)
    }
}

/// Decode the JWT payload without checking the signature. JWT payloads are
/// base64url without padding.
fn unverified_claims(token: &str) -> Result<JwtClaims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::InvalidToken);
    }

    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| AuthError::InvalidToken)?;
    let payload = String::from_utf8(decoded).map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_str(&payload).map_err(|_| AuthError::InvalidToken)
}

/// Random PKCE verifier. Two v4 UUIDs give 32 bytes of entropy, encoded the
/// same way GoTrue expects the challenge back.
pub fn new_code_verifier() -> String {
    let mut bytes = Vec::with_capacity(32);
    bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    bytes.extend_from_slice(Uuid::new_v4().as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
