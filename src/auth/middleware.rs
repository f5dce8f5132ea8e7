//! Authentication gate.
//!
//! Runs once per request, before routing. A bearer access token is resolved
//! to a full principal and attached to the request's extensions; requests
//! without an Authorization header pass through anonymous, and authorization
//! is decided per-handler by the extractors below.

use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::error::AuthError;
use super::token::{TokenKind, TokenProvider};
use crate::user::{UserRepository, UserStatus};

/// Extract a bearer token from an Authorization header value.
fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = parts.next().ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    if parts.next().is_some() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// State consumed by the gate.
#[derive(Clone)]
pub struct AuthGate {
    tokens: TokenProvider,
    users: UserRepository,
}

impl AuthGate {
    pub fn new(tokens: TokenProvider, users: UserRepository) -> Self {
        Self { tokens, users }
    }

    /// Parse an access token and resolve its subject to a live principal.
    async fn resolve(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let claims = self.tokens.parse(token, TokenKind::Access)?;

        let user = self
            .users
            .get_by_username(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::InvalidToken("unknown subject".to_string()))?;

        if user.status == UserStatus::Inactive {
            return Err(AuthError::AccessDenied("account is disabled".to_string()));
        }

        // Authorities come from the store, not the token snapshot, so role
        // changes take effect on the next request.
        let authorities = self.users.authorities(user.audit.id).await?;

        Ok(CurrentUser {
            id: user.audit.id,
            username: user.username,
            authorities,
        })
    }
}

/// Authenticated principal attached to a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub authorities: Vec<String>,
}

impl CurrentUser {
    pub fn has_authority(&self, name: &str) -> bool {
        self.authorities.iter().any(|a| a == name)
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Require an admin or manager authority.
///
/// Use as an extractor in handlers restricted to staff.
#[derive(Debug, Clone)]
pub struct RequireStaff(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)?;

        if !user.has_authority("admin") && !user.has_authority("manager") {
            return Err(AuthError::InsufficientAuthority(
                "admin or manager authority required".to_string(),
            ));
        }

        Ok(RequireStaff(user))
    }
}

/// Single-pass, non-retrying gate: bearer header present means the token must
/// parse and resolve; absent means the request proceeds anonymous.
pub async fn auth_gate(
    State(gate): State<AuthGate>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if let Some(header) = auth_header {
        let token = bearer_token_from_header(header)?;
        let user = gate.resolve(token).await?;
        debug!(username = %user.username, "authenticated request");
        req.extensions_mut().insert(user);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_from_header_valid() {
        assert_eq!(
            bearer_token_from_header("Bearer abc.def.ghi").unwrap(),
            "abc.def.ghi"
        );
        assert_eq!(
            bearer_token_from_header("bearer   token123").unwrap(),
            "token123"
        );
    }

    #[test]
    fn test_bearer_token_from_header_invalid() {
        let cases = [
            "",
            "Bearer",
            "Bearer ",
            "Token something",
            "Bearer token extra",
            "bear token",
        ];

        for case in cases {
            assert!(
                bearer_token_from_header(case).is_err(),
                "{case} should fail"
            );
        }
    }

    #[test]
    fn test_has_authority() {
        let user = CurrentUser {
            id: 1,
            username: "testuser1".to_string(),
            authorities: vec!["user".to_string(), "manager".to_string()],
        };
        assert!(user.has_authority("manager"));
        assert!(!user.has_authority("admin"));
    }
}
