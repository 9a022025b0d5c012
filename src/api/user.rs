use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use utoipa::ToSchema;

use crate::{
    api::{AppState, USER_ID_KEY, current_user},
    error::AppError,
    user::{self, UserInfo},
};

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[utoipa::path(post, path = "/create_user", context_path = "/api/user",
    request_body = CreateUserRequest, responses((status = 200)))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<&'static str, AppError> {
    user::create_user(&state.database, req.name, req.email, req.password).await?;
    Ok("User created successfully")
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(post, path = "/login", context_path = "/api/user",
    request_body = LoginRequest, responses((status = 200)))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<&'static str, AppError> {
    let id = user::login(&state.database, req.email, req.password).await?;
    session.insert(USER_ID_KEY, id).await?;
    Ok("Login successful")
}

#[utoipa::path(post, path = "/logout", context_path = "/api/user",
    responses((status = 200)))]
pub async fn logout(session: Session) -> Result<&'static str, AppError> {
    session.flush().await?;
    Ok("Logout successful")
}

#[utoipa::path(get, path = "/user_info", context_path = "/api/user",
    responses((status = 200, body = UserInfo)))]
pub async fn user_info(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<UserInfo>, AppError> {
    let user_id = current_user(&session).await?;
    let info = user::get_user_info(&state.database, user_id).await?;
    Ok(Json(info))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create_user", post(create_user))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/user_info", get(user_info))
}
