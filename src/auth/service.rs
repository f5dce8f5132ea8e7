//! Token issuance and refresh.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::error::AuthError;
use super::token::{TokenKind, TokenProvider};
use crate::user::{UserRepository, UserStatus};

/// Login request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

/// Issued token pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and refreshes token pairs for principals.
#[derive(Clone)]
pub struct AuthService {
    tokens: TokenProvider,
    users: UserRepository,
}

impl AuthService {
    pub fn new(tokens: TokenProvider, users: UserRepository) -> Self {
        Self { tokens, users }
    }

    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    /// Verify credentials and issue both token kinds.
    ///
    /// The authority list is snapshotted at issuance; it is not re-resolved
    /// until refresh. Unknown user, wrong password, and disabled account all
    /// fail identically with no side effect.
    #[instrument(skip(self, password), fields(username = %username))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenResponse, AuthError> {
        let user = self
            .users
            .get_by_username(username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or_else(|| AuthError::AccessDenied("bad credentials".to_string()))?;

        if user.status == UserStatus::Inactive {
            warn!(username, "login attempt on disabled account");
            return Err(AuthError::AccessDenied("account is disabled".to_string()));
        }

        let verified = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        if !verified {
            return Err(AuthError::AccessDenied("bad credentials".to_string()));
        }

        let authorities = self
            .users
            .authorities(user.audit.id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let access_token =
            self.tokens
                .issue(&user.username, TokenKind::Access, authorities.clone())?;
        let refresh_token = self
            .tokens
            .issue(&user.username, TokenKind::Refresh, authorities)?;

        info!(username, "issued token pair");

        Ok(TokenResponse {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The principal is re-resolved by username so authority changes since
    /// the original login are captured; the refresh token itself is echoed
    /// back unchanged.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::BlankToken);
        }

        let claims = self
            .tokens
            .parse(refresh_token, TokenKind::Refresh)
            .map_err(|e| AuthError::Forbidden(e.to_string()))?;

        let user = self
            .users
            .get_by_username(&claims.sub)
            .await
            .map_err(|e| AuthError::Forbidden(e.to_string()))?
            .ok_or_else(|| AuthError::Forbidden("unknown principal".to_string()))?;

        if user.status == UserStatus::Inactive {
            return Err(AuthError::Forbidden("account is disabled".to_string()));
        }

        let authorities = self
            .users
            .authorities(user.audit.id)
            .await
            .map_err(|e| AuthError::Forbidden(e.to_string()))?;

        let access_token = self
            .tokens
            .issue(&user.username, TokenKind::Access, authorities)?;

        info!(username = %user.username, "refreshed access token");

        Ok(TokenResponse {
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }
}
