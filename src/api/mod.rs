//! HTTP API: envelope, errors, handlers, and routing.

pub mod envelope;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use envelope::ApiResponse;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
