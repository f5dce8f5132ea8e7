//! API request handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{AuthError, CurrentUser, RequireStaff, SignInRequest, TokenResponse};
use crate::user::{
    UserCreationRequest, UserPageResponse, UserPasswordRequest, UserResponse, UserUpdateRequest,
};

use super::envelope::ApiResponse;
use super::error::ApiResult;
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Refresh token exchange request.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Exchange credentials for a token pair.
pub async fn get_access_token(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<ApiResponse<TokenResponse>, AuthError> {
    let tokens = state.auth.authenticate(&req.username, &req.password).await?;
    Ok(ApiResponse::success(StatusCode::OK, "token", tokens))
}

/// Exchange a refresh token for a fresh access token.
pub async fn get_refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<ApiResponse<TokenResponse>, AuthError> {
    let tokens = state.auth.refresh(&req.refresh_token).await?;
    Ok(ApiResponse::success(StatusCode::OK, "refresh token", tokens))
}

/// User listing query parameters.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub keyword: Option<String>,
    pub sort: Option<String>,
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub size: i64,
}

fn default_page_size() -> i64 {
    20
}

/// List users. Staff only.
pub async fn list_users(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<ApiResponse<UserPageResponse>> {
    info!(requested_by = %user.username, "get user list");
    let page = state
        .users
        .find_all(
            query.keyword.as_deref(),
            query.sort.as_deref(),
            query.page,
            query.size,
        )
        .await?;
    Ok(ApiResponse::success(StatusCode::OK, "user list", page))
}

/// Fetch one user by id. Any authenticated principal.
pub async fn get_user(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<ApiResponse<UserResponse>> {
    let user = state.users.find_by_id(id).await?;
    Ok(ApiResponse::success(StatusCode::OK, "user", user))
}

/// Register a new user. Open endpoint.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<UserCreationRequest>,
) -> ApiResult<ApiResponse<i64>> {
    let id = state.users.create(&req).await?;
    Ok(ApiResponse::success(
        StatusCode::CREATED,
        "user created",
        id,
    ))
}

/// Update an existing user's profile and addresses.
pub async fn update_user(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<UserUpdateRequest>,
) -> ApiResult<ApiResponse<()>> {
    state.users.update(&req).await?;
    Ok(ApiResponse::success_empty(
        StatusCode::ACCEPTED,
        "user updated",
    ))
}

/// Change a user's password.
pub async fn change_password(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<UserPasswordRequest>,
) -> ApiResult<StatusCode> {
    state.users.change_password(&req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Soft-delete a user.
pub async fn delete_user(
    _user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
