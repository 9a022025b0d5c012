use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use utoipa::ToSchema;

use crate::{
    api::{AppState, current_user},
    course::{self, CourseDetail, CourseRequest, CourseSummary},
    error::AppError,
    generator::LlmGateway,
    progress::{self, Progress},
};

#[utoipa::path(post, path = "/create", context_path = "/api/course",
    request_body = CourseRequest,
    responses((status = 200, description = "Generated course and its new id")))]
pub async fn create_course(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CourseRequest>,
) -> Result<Json<Value>, AppError> {
    let user_id = current_user(&session).await?;
    let gateway = LlmGateway::shared()?;
    let (id, generated) =
        course::create_course(&state.database, gateway, user_id, request).await?;
    Ok(Json(json!({
        "success": true,
        "courseId": id,
        "course": generated,
    })))
}

#[utoipa::path(get, path = "/list", context_path = "/api/course",
    responses((status = 200, body = [CourseSummary])))]
pub async fn list_courses(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<CourseSummary>>, AppError> {
    let user_id = current_user(&session).await?;
    let summaries = course::list_courses(&state.database, user_id).await?;
    Ok(Json(summaries))
}

#[utoipa::path(get, path = "/{id}", context_path = "/api/course",
    params(("id" = i64, Path, description = "course id")),
    responses((status = 200, body = CourseDetail), (status = 404)))]
pub async fn get_course(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Json<CourseDetail>, AppError> {
    let user_id = current_user(&session).await?;
    let record = course::get_course(&state.database, user_id, id).await?;
    let document = record.document()?;
    Ok(Json(CourseDetail {
        id: record.id,
        title: record.title,
        description: record.description,
        proficiency_level: record.proficiency_level,
        created_at: record.created_at,
        updated_at: record.updated_at,
        course: document,
    }))
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteChapterRequest {
    pub chapter_index: i64,
}

#[utoipa::path(post, path = "/{id}/complete_chapter", context_path = "/api/course",
    params(("id" = i64, Path, description = "course id")),
    request_body = CompleteChapterRequest,
    responses((status = 200), (status = 404)))]
pub async fn complete_chapter(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(req): Json<CompleteChapterRequest>,
) -> Result<&'static str, AppError> {
    let user_id = current_user(&session).await?;
    let record = course::get_course(&state.database, user_id, id).await?;
    let chapters = record.document()?.chapters.len() as i64;
    if req.chapter_index < 0 || req.chapter_index >= chapters {
        return Err(AppError::Validation(format!(
            "chapterIndex {} is out of range for {} chapters",
            req.chapter_index, chapters
        )));
    }
    progress::mark_complete(&state.database, user_id, id, req.chapter_index).await?;
    Ok("Chapter marked complete")
}

#[utoipa::path(get, path = "/{id}/progress", context_path = "/api/course",
    params(("id" = i64, Path, description = "course id")),
    responses((status = 200, body = Progress), (status = 404)))]
pub async fn get_progress(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Json<Progress>, AppError> {
    let user_id = current_user(&session).await?;
    let record = course::get_course(&state.database, user_id, id).await?;
    let chapters = record.document()?.chapters.len();
    let progress = progress::get_progress(&state.database, user_id, id, chapters).await?;
    Ok(Json(progress))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_course))
        .route("/list", get(list_courses))
        .route("/{id}", get(get_course))
        .route("/{id}/complete_chapter", post(complete_chapter))
        .route("/{id}/progress", get(get_progress))
}
