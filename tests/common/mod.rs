//! Test utilities and common setup.

use axum::Router;
use userhub::api;
use userhub::build_state;
use userhub::config::AppConfig;
use userhub::db::Database;

/// Config with fixed signing secrets for tests.
fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.access_secret = "access-secret-for-integration-tests".to_string();
    config.auth.refresh_secret = "refresh-secret-for-integration-tests".to_string();
    config
}

/// Create a test application backed by an in-memory database.
///
/// The database handle is returned alongside the router so tests can seed
/// state the API does not expose (role grants, status flips).
pub async fn test_app() -> (Router, Database) {
    let db = Database::in_memory().await.unwrap();
    let state = build_state(&test_config(), &db);
    (api::create_router(state), db)
}

/// Grant a role to a user directly in the database.
pub async fn grant_role(db: &Database, username: &str, role: &str) {
    sqlx::query(
        "INSERT INTO tbl_user_has_role (user_id, role_id)
         SELECT u.id, r.id FROM tbl_user u, tbl_role r
         WHERE u.username = ?1 AND r.name = ?2",
    )
    .bind(username)
    .bind(role)
    .execute(db.pool())
    .await
    .unwrap();
}
