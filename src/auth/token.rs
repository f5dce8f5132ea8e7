//! Signed, expiring identity tokens.
//!
//! Access and refresh tokens are separate kinds: each kind signs with its own
//! secret and carries its own lifetime, so one can never stand in for the
//! other. The `typ` claim is checked on top of the signature as a second
//! guard.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;

/// Token kind. Determines the signing secret and lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Signing configuration, one secret and TTL per token kind.
///
/// Fields default individually so a partial `[auth]` table layers over the
/// built-in values instead of failing to deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    /// Access token lifetime in seconds.
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_ttl_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_secret: String::new(),
            refresh_secret: String::new(),
            access_ttl_secs: 60 * 60,
            refresh_ttl_secs: 60 * 60 * 24 * 14,
        }
    }
}

/// JWT claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,
    /// Token kind, rejected when it does not match the parse expectation.
    pub typ: TokenKind,
    pub iat: i64,
    pub exp: i64,
    /// Authority names snapshotted at issuance.
    #[serde(default)]
    pub authorities: Vec<String>,
}

/// Encodes and decodes identity tokens.
#[derive(Clone)]
pub struct TokenProvider {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenProvider {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    fn encoding_key(&self, kind: TokenKind) -> &EncodingKey {
        match kind {
            TokenKind::Access => &self.access_encoding,
            TokenKind::Refresh => &self.refresh_encoding,
        }
    }

    fn decoding_key(&self, kind: TokenKind) -> &DecodingKey {
        match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        }
    }

    fn ttl_secs(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_ttl_secs,
            TokenKind::Refresh => self.refresh_ttl_secs,
        }
    }

    /// Issue a signed token for `subject` with the given authority snapshot.
    pub fn issue(
        &self,
        subject: &str,
        kind: TokenKind,
        authorities: Vec<String>,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            typ: kind,
            iat: now,
            exp: now + self.ttl_secs(kind),
            authorities,
        };

        encode(&Header::default(), &claims, self.encoding_key(kind))
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Parse and verify a token, expecting it to be of `kind`.
    ///
    /// Expiry reports as `TokenExpired`; signature, shape, and kind failures
    /// all collapse into `InvalidToken`.
    pub fn parse(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, self.decoding_key(kind), &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        if data.claims.typ != kind {
            return Err(AuthError::InvalidToken(format!(
                "expected {} token, got {}",
                kind, data.claims.typ
            )));
        }

        Ok(data.claims)
    }
}
