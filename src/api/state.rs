//! Application state shared across handlers.

use axum::extract::FromRef;

use crate::auth::{AuthGate, AuthService};
use crate::user::UserService;

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub auth: AuthService,
    pub gate: AuthGate,
}

impl FromRef<AppState> for AuthGate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}
