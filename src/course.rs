use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    generator::GenerateCourse,
    progress::completion_percent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
}

impl Proficiency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Proficiency::Beginner => "beginner",
            Proficiency::Intermediate => "intermediate",
            Proficiency::Advanced => "advanced",
        }
    }
}

/// Parameters of one generation request, as collected by the course wizard.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub topic: String,
    #[serde(default)]
    pub description: String,
    pub proficiency: Proficiency,
    pub depth: u8,
    pub chapters_count: u8,
    pub include_assessments: bool,
}

impl CourseRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.topic.trim().is_empty() {
            return Err("topic must not be empty".to_string());
        }
        if self.depth > 100 {
            return Err("depth must be between 0 and 100".to_string());
        }
        if !(3..=12).contains(&self.chapters_count) {
            return Err("chaptersCount must be between 3 and 12".to_string());
        }
        Ok(())
    }
}

/// The structured document extracted from the model reply. Field names are
/// the ones the prompt asks the model to produce. Everything except the
/// chapters sequence is optional; absent sub-fields default to empty and the
/// chapter order is the addressing key for progress tracking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCourse {
    #[serde(default)]
    pub course_title: Option<String>,
    #[serde(default)]
    pub course_description: Option<String>,
    #[serde(default)]
    pub proficiency_level: Option<String>,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub assessment: Vec<AssessmentQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Video,
    Article,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

impl GeneratedCourse {
    /// Shape checks applied once at ingestion. A document that parses but has
    /// no chapters, or an answer key pointing outside its options, is
    /// rejected here rather than rendered partially downstream.
    pub fn validate(&self) -> Result<(), String> {
        if self.chapters.is_empty() {
            return Err("course document has no chapters".to_string());
        }
        for (ci, chapter) in self.chapters.iter().enumerate() {
            for (qi, question) in chapter.assessment.iter().enumerate() {
                if question.correct_answer >= question.options.len() {
                    return Err(format!(
                        "chapter {ci}, question {qi}: correctAnswer {} is not a valid index into {} options",
                        question.correct_answer,
                        question.options.len()
                    ));
                }
            }
        }
        Ok(())
    }
}

/// One persisted course, exclusively owned by `user_id`. Created once at
/// generation time and never mutated; regeneration creates a new record.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CourseRecord {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub proficiency_level: String,
    pub course_data: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl CourseRecord {
    pub fn document(&self) -> Result<GeneratedCourse, AppError> {
        serde_json::from_str(&self.course_data).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("stored course {} is unreadable: {e}", self.id))
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub proficiency_level: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub course: GeneratedCourse,
}

/// Dashboard row: the record's metadata plus derived progress figures.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub proficiency_level: String,
    pub chapters: usize,
    pub completed_chapters: usize,
    pub percent: u8,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Generate a course and persist it under `user_id`. The write only happens
/// after generation succeeds, so a gateway failure never leaves a partial
/// record behind. Title and description fall back to the request's when the
/// document omits them.
pub async fn create_course<G: GenerateCourse>(
    database: &SqlitePool,
    gateway: &G,
    user_id: i64,
    request: CourseRequest,
) -> Result<(i64, GeneratedCourse), AppError> {
    request.validate().map_err(AppError::Validation)?;
    let course = gateway.generate(&request).await?;
    let title = course
        .course_title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| request.topic.clone());
    let description = course
        .course_description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| request.description.clone());
    let payload = serde_json::to_string(&course).map_err(|e| AppError::Internal(e.into()))?;
    let now = OffsetDateTime::now_utc();
    let id = sqlx::query(
        "INSERT INTO course (user_id, title, description, proficiency_level, course_data, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&title)
    .bind(&description)
    .bind(request.proficiency.as_str())
    .bind(&payload)
    .bind(now)
    .bind(now)
    .execute(database)
    .await?
    .last_insert_rowid();
    info!(course_id = id, user_id, topic = %request.topic, "course persisted");
    Ok((id, course))
}

/// Fetch one course, scoped to its owner. A course that exists but belongs
/// to someone else is indistinguishable from an absent one.
pub async fn get_course(
    database: &SqlitePool,
    user_id: i64,
    course_id: i64,
) -> Result<CourseRecord, AppError> {
    sqlx::query_as::<_, CourseRecord>(
        "SELECT id, user_id, title, description, proficiency_level, course_data, created_at, updated_at \
         FROM course WHERE id = ? AND user_id = ?",
    )
    .bind(course_id)
    .bind(user_id)
    .fetch_optional(database)
    .await?
    .ok_or(AppError::NotFound)
}

pub async fn list_courses(
    database: &SqlitePool,
    user_id: i64,
) -> Result<Vec<CourseSummary>, AppError> {
    let records = sqlx::query_as::<_, CourseRecord>(
        "SELECT id, user_id, title, description, proficiency_level, course_data, created_at, updated_at \
         FROM course WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(database)
    .await?;

    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT course_id, chapter_index FROM course_progress WHERE user_id = ? AND completed = 1",
    )
    .bind(user_id)
    .fetch_all(database)
    .await?;
    let mut completed: HashMap<i64, Vec<i64>> = HashMap::new();
    for (course_id, chapter_index) in rows {
        completed.entry(course_id).or_default().push(chapter_index);
    }

    let mut summaries = Vec::with_capacity(records.len());
    for record in records {
        let chapters = record.document()?.chapters.len();
        let indices = completed.remove(&record.id).unwrap_or_default();
        let done = indices
            .iter()
            .filter(|&&i| i >= 0 && (i as usize) < chapters)
            .count();
        summaries.push(CourseSummary {
            id: record.id,
            title: record.title,
            description: record.description,
            proficiency_level: record.proficiency_level,
            chapters,
            completed_chapters: done,
            percent: completion_percent(&indices, chapters),
            created_at: record.created_at,
            updated_at: record.updated_at,
        });
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::GenerateError, store::memory_pool, user::create_user};

    fn sample_request() -> CourseRequest {
        CourseRequest {
            topic: "Linear Algebra".to_string(),
            description: String::new(),
            proficiency: Proficiency::Beginner,
            depth: 50,
            chapters_count: 4,
            include_assessments: true,
        }
    }

    fn sample_document(title: Option<&str>, chapters: usize) -> GeneratedCourse {
        GeneratedCourse {
            course_title: title.map(|t| t.to_string()),
            course_description: None,
            proficiency_level: Some("beginner".to_string()),
            chapters: (0..chapters)
                .map(|i| Chapter {
                    title: format!("Chapter {}", i + 1),
                    objectives: vec!["understand the basics".to_string()],
                    content: "content".to_string(),
                    summary: "summary".to_string(),
                    resources: vec![],
                    assessment: vec![],
                })
                .collect(),
        }
    }

    struct FixedGateway(GeneratedCourse);
    impl GenerateCourse for FixedGateway {
        fn generate(
            &self,
            _request: &CourseRequest,
        ) -> impl Future<Output = Result<GeneratedCourse, GenerateError>> + Send {
            let course = self.0.clone();
            async move { Ok(course) }
        }
    }

    struct FailingGateway;
    impl GenerateCourse for FailingGateway {
        fn generate(
            &self,
            _request: &CourseRequest,
        ) -> impl Future<Output = Result<GeneratedCourse, GenerateError>> + Send {
            async move {
                Err(GenerateError::Upstream {
                    detail: "HTTP 500".to_string(),
                })
            }
        }
    }

    async fn test_user(database: &sqlx::SqlitePool) -> i64 {
        create_user(
            database,
            "u1".to_string(),
            "u1@example.com".to_string(),
            "password".to_string(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_course_persists_document() {
        let database = memory_pool().await.unwrap();
        let user_id = test_user(&database).await;
        let gateway = FixedGateway(sample_document(Some("Vectors and Matrices"), 4));

        let (id, course) = create_course(&database, &gateway, user_id, sample_request())
            .await
            .unwrap();
        assert!(id > 0);
        assert_eq!(course.chapters.len(), 4);

        let record = get_course(&database, user_id, id).await.unwrap();
        assert_eq!(record.title, "Vectors and Matrices");
        assert_eq!(record.proficiency_level, "beginner");
        assert_eq!(record.document().unwrap().chapters.len(), 4);
    }

    #[tokio::test]
    async fn title_falls_back_to_topic() {
        let database = memory_pool().await.unwrap();
        let user_id = test_user(&database).await;
        let gateway = FixedGateway(sample_document(None, 4));

        let (id, _) = create_course(&database, &gateway, user_id, sample_request())
            .await
            .unwrap();
        let record = get_course(&database, user_id, id).await.unwrap();
        assert_eq!(record.title, "Linear Algebra");
    }

    #[tokio::test]
    async fn description_falls_back_to_request() {
        let database = memory_pool().await.unwrap();
        let user_id = test_user(&database).await;
        let mut request = sample_request();
        request.description = "focus on eigenvalues".to_string();

        // document omits its description, the request's fills in
        let gateway = FixedGateway(sample_document(Some("t"), 4));
        let (id, _) = create_course(&database, &gateway, user_id, request.clone())
            .await
            .unwrap();
        let record = get_course(&database, user_id, id).await.unwrap();
        assert_eq!(record.description, "focus on eigenvalues");

        // a document-provided description wins over the request's
        let mut document = sample_document(Some("t"), 4);
        document.course_description = Some("From vectors to eigenvalues".to_string());
        let gateway = FixedGateway(document);
        let (id, _) = create_course(&database, &gateway, user_id, request)
            .await
            .unwrap();
        let record = get_course(&database, user_id, id).await.unwrap();
        assert_eq!(record.description, "From vectors to eigenvalues");
    }

    #[tokio::test]
    async fn failed_generation_writes_nothing() {
        let database = memory_pool().await.unwrap();
        let user_id = test_user(&database).await;

        let result = create_course(&database, &FailingGateway, user_id, sample_request()).await;
        assert!(matches!(
            result,
            Err(AppError::Generation(GenerateError::Upstream { .. }))
        ));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM course")
            .fetch_one(&database)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_generation() {
        let database = memory_pool().await.unwrap();
        let user_id = test_user(&database).await;
        let mut request = sample_request();
        request.topic = "   ".to_string();

        let result = create_course(&database, &FailingGateway, user_id, request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn courses_are_owner_scoped() {
        let database = memory_pool().await.unwrap();
        let owner = test_user(&database).await;
        let other = create_user(
            &database,
            "u2".to_string(),
            "u2@example.com".to_string(),
            "password".to_string(),
        )
        .await
        .unwrap();
        let gateway = FixedGateway(sample_document(Some("Owned"), 3));
        let (id, _) = create_course(&database, &gateway, owner, sample_request())
            .await
            .unwrap();

        assert!(matches!(
            get_course(&database, other, id).await,
            Err(AppError::NotFound)
        ));
        assert!(list_courses(&database, other).await.unwrap().is_empty());
    }

    #[test]
    fn request_bounds() {
        let mut request = sample_request();
        assert!(request.validate().is_ok());
        request.chapters_count = 2;
        assert!(request.validate().is_err());
        request.chapters_count = 13;
        assert!(request.validate().is_err());
        request.chapters_count = 12;
        assert!(request.validate().is_ok());
        request.depth = 101;
        assert!(request.validate().is_err());
        request.depth = 100;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn document_shape_checks() {
        let mut course = sample_document(Some("t"), 2);
        assert!(course.validate().is_ok());

        course.chapters[1].assessment.push(AssessmentQuestion {
            question: "q".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            correct_answer: 2,
            explanation: String::new(),
        });
        assert!(course.validate().is_err());

        course.chapters.clear();
        assert!(course.validate().is_err());
    }
}
