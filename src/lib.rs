//! userhub: a user management service with token-based authentication.
//!
//! Modules:
//! - [`auth`]: token codec, issuance, refresh, and the authentication gate
//! - [`user`]: user domain model, repository, and service
//! - [`api`]: HTTP surface (envelope, errors, handlers, routes)
//! - [`db`]: SQLite pool and migrations
//! - [`config`]: layered application configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod user;

use api::AppState;
use auth::{AuthGate, AuthService, TokenProvider};
use config::AppConfig;
use user::{UserRepository, UserService};

/// Wire the full application state from a config and an open database.
pub fn build_state(config: &AppConfig, database: &db::Database) -> AppState {
    let repo = UserRepository::new(database.pool().clone());
    let tokens = TokenProvider::new(&config.auth);

    AppState {
        users: UserService::new(repo.clone()),
        auth: AuthService::new(tokens.clone(), repo.clone()),
        gate: AuthGate::new(tokens, repo),
    }
}
