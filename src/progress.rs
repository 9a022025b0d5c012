use serde::Serialize;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub completed_chapter_indices: Vec<i64>,
    pub percent: u8,
}

/// Record that a user finished a chapter. Upsert keyed by
/// (user_id, course_id, chapter_index); repeating the call changes nothing
/// observable. Completion is terminal, there is no unmark operation.
pub async fn mark_complete(
    database: &SqlitePool,
    user_id: i64,
    course_id: i64,
    chapter_index: i64,
) -> Result<(), AppError> {
    let now = OffsetDateTime::now_utc();
    sqlx::query(
        "INSERT INTO course_progress (user_id, course_id, chapter_index, completed, updated_at) \
         VALUES (?, ?, ?, 1, ?) \
         ON CONFLICT (user_id, course_id, chapter_index) \
         DO UPDATE SET completed = 1, updated_at = excluded.updated_at",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(chapter_index)
    .bind(now)
    .execute(database)
    .await?;
    Ok(())
}

/// Completion percentage over `chapter_count` chapters. Indices outside
/// [0, chapter_count) are ignored; an empty course is 0% by definition.
pub fn completion_percent(completed: &[i64], chapter_count: usize) -> u8 {
    if chapter_count == 0 {
        return 0;
    }
    let done = completed
        .iter()
        .filter(|&&i| i >= 0 && (i as usize) < chapter_count)
        .count();
    ((done as f64 / chapter_count as f64) * 100.0).round() as u8
}

pub async fn get_progress(
    database: &SqlitePool,
    user_id: i64,
    course_id: i64,
    chapter_count: usize,
) -> Result<Progress, AppError> {
    let completed: Vec<i64> = sqlx::query_scalar(
        "SELECT chapter_index FROM course_progress \
         WHERE user_id = ? AND course_id = ? AND completed = 1 \
         ORDER BY chapter_index",
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_all(database)
    .await?;
    let percent = completion_percent(&completed, chapter_count);
    Ok(Progress {
        completed_chapter_indices: completed,
        percent,
    })
}
