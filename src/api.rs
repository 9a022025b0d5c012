pub mod course;
pub mod user;

use axum::Router;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::error::AppError;

pub const USER_ID_KEY: &str = "user_id";

#[derive(Clone)]
pub struct AppState {
    pub database: SqlitePool,
}

/// Resolve the logged-in user from the session. Owner-scoped operations take
/// the returned id explicitly rather than reading ambient auth state.
pub async fn current_user(session: &Session) -> Result<i64, AppError> {
    session
        .get::<i64>(USER_ID_KEY)
        .await?
        .ok_or_else(|| AppError::Unauthorized("login required".to_string()))
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/api/user", user::router())
        .nest("/api/course", course::router())
}
