use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

use crate::api::v1::extractors::AuthCtx;
use crate::services::auth::policy::RoleSet;

/// Lifetime of the logout token handed back by `/auth/logout`.
const LOGOUT_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("invalid 'nameid' claim (expected integer user id)")]
    InvalidSubject,
}

/// Access token claims.
///
/// Claim names are the short JWT names (`nameid`, `unique_name`, `role`) the
/// frontends already decode, so existing sessions stay readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(rename = "nameid")]
    pub user_id: String,
    #[serde(rename = "unique_name")]
    pub username: String,
    #[serde(
        rename = "NombreCompleto",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub full_name: Option<String>,
    // A single role is a bare string, several roles an array.
    #[serde(rename = "role", default, deserialize_with = "one_or_many")]
    pub roles: Vec<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

#[derive(Debug, Serialize)]
struct LogoutClaims {
    logout: &'static str,
    exp: i64,
    iat: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(role) => vec![role],
        OneOrMany::Many(roles) => roles,
    })
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 token issuer + verifier.
///
/// - Verification checks signature and `exp` (with leeway). Issuer/audience are not used.
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: ChronoDuration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .field("leeway", &self.validation.leeway)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl_hours: i64, leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway_seconds;
        validation.validate_aud = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl: ChronoDuration::hours(ttl_hours),
        }
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        Ok(jsonwebtoken::encode(&header, claims, &self.encoding_key)?)
    }

    /// Issue an access token carrying the caller's identity and roles.
    pub fn issue_access_token(&self, identity: &AuthCtx) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = AccessClaims {
            user_id: identity.user_id.to_string(),
            username: identity.username.clone(),
            full_name: identity.full_name.clone(),
            roles: identity.roles.to_vec(),
            exp: expires_at.timestamp(),
            iat: Some(now.timestamp()),
        };

        Ok(IssuedToken {
            token: self.sign(&claims)?,
            expires_at,
        })
    }

    /// Issue a token that only carries `logout: "true"`.
    ///
    /// There is no server-side session list: the client swaps its stored token for
    /// this one and the revocation gate rejects it on every route.
    pub fn issue_logout_token(&self) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = LogoutClaims {
            logout: "true",
            exp: (now + ChronoDuration::days(LOGOUT_TOKEN_TTL_DAYS)).timestamp(),
            iat: now.timestamp(),
        };
        self.sign(&claims)
    }

    /// Verify signature + expiry and convert the claims into an `AuthCtx`.
    pub fn verify(&self, token: &str) -> Result<AuthCtx, TokenError> {
        let data =
            jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        let user_id = claims
            .user_id
            .trim()
            .parse::<i32>()
            .map_err(|_| TokenError::InvalidSubject)?;

        Ok(AuthCtx {
            user_id,
            username: claims.username,
            full_name: claims.full_name,
            roles: RoleSet::new(claims.roles),
        })
    }
}
