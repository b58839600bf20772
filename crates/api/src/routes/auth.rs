//! Signup, login, profile, and address-book endpoints.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::AddressId;
use domain::storage::UserStore;
use domain::{CommerceStore, NewAddress, Principal, Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;
use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The public user shape embedded in auth responses.
#[derive(Serialize)]
pub struct UserSummary {
    pub id: common::UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    pub token: Uuid,
    pub user: UserSummary,
}

async fn issue_session<S: CommerceStore>(state: &AppState<S>, user: &User) -> Result<Uuid, ApiError> {
    let token = Uuid::new_v4();
    state.store.create_session(token, user.id).await?;
    Ok(token)
}

/// POST /auth/signup — register a new customer account.
#[tracing::instrument(skip(state, req), fields(email))]
pub async fn signup<S: CommerceStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    if req.password.len() < 6 {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters.".to_string(),
        ));
    }

    let user = User::new(req.name, req.email, hash_password(&req.password))?;
    tracing::Span::current().record("email", user.email.as_str());

    state.store.insert_user(&user).await?;
    let token = issue_session(&state, &user).await?;

    tracing::info!(user_id = %user.id, "account created");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "Account created successfully.",
            token,
            user: UserSummary::from(&user),
        }),
    ))
}

/// POST /auth/login — exchange credentials for a session token.
#[tracing::instrument(skip(state, req))]
pub async fn login<S: CommerceStore>(
    State(state): State<AppState<S>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();
    let user = state.store.find_user_by_email(&email).await?;

    // One failure message for both bad email and bad password.
    let user = match user {
        Some(user) if verify_password(&req.password, &user.password_hash) => user,
        _ => {
            return Err(ApiError::Unauthorized(
                "Invalid email or password.".to_string(),
            ));
        }
    };

    let token = issue_session(&state, &user).await?;

    tracing::info!(user_id = %user.id, "logged in");
    Ok(Json(AuthResponse {
        success: true,
        message: "Logged in successfully.",
        token,
        user: UserSummary::from(&user),
    }))
}

/// GET /auth/me — the authenticated user's profile with address book.
#[tracing::instrument(skip(state))]
pub async fn me<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user = state
        .store
        .get_user(principal.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    Ok(Json(serde_json::json!({ "success": true, "user": user })))
}

/// POST /auth/addresses — add a shipping address.
#[tracing::instrument(skip(state, req))]
pub async fn add_address<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Json(req): Json<NewAddress>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let mut user = state
        .store
        .get_user(principal.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    user.add_address(req);
    state.store.save_user(&user).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "addresses": user.addresses })),
    ))
}

/// PUT /auth/addresses/{id}/default — mark one address as the default.
#[tracing::instrument(skip(state))]
pub async fn set_default_address<S: CommerceStore>(
    State(state): State<AppState<S>>,
    principal: Principal,
    Path(address_id): Path<AddressId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut user = state
        .store
        .get_user(principal.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    user.set_default_address(address_id)?;
    state.store.save_user(&user).await?;

    Ok(Json(
        serde_json::json!({ "success": true, "addresses": user.addresses }),
    ))
}
