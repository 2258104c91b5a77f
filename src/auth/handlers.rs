use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, SignupRequest, SignupResponse, TokenResponse},
        extractors::{AppJson, CurrentAccount},
    },
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/google", post(federated_auth))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<Json<SignupResponse>, AuthError> {
    let account = state
        .auth
        .signup(&payload.email, &payload.display_name, &payload.password)
        .await?;

    Ok(Json(SignupResponse {
        message: "Account created successfully".into(),
        user: account.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let (access_token, account) = state.auth.login(&payload.email, &payload.password).await?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
        user: account.into(),
    }))
}

#[instrument(skip_all)]
pub async fn get_me(CurrentAccount(account): CurrentAccount) -> Json<PublicUser> {
    Json(account.into())
}

#[instrument(skip(state))]
pub async fn federated_auth(State(state): State<AppState>) -> Result<Json<PublicUser>, AuthError> {
    let account = state.auth.federated_auth().await?;
    Ok(Json(account.into()))
}
