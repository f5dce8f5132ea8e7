//! Authentication module.
//!
//! Token codec, issuance/refresh, and the per-request authentication gate.

mod error;
mod middleware;
mod service;
mod token;

pub use error::AuthError;
pub use middleware::{auth_gate, AuthGate, CurrentUser, RequireStaff};
pub use service::{AuthService, SignInRequest, TokenResponse};
pub use token::{Claims, TokenConfig, TokenKind, TokenProvider};
