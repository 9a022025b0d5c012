use std::sync::LazyLock;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{ChatCompletionRequestMessage, CreateChatCompletionRequestArgs},
};
use regex::Regex;
use tracing::info;

use crate::{
    config::LlmConfig,
    course::{CourseRequest, GeneratedCourse},
    error::GenerateError,
};

const SYSTEM_PROMPT: &str = "You are an expert educational content creator. \
Create a comprehensive, well-structured course on the requested topic.";

const MAX_TOKENS: u32 = 4000;
const TEMPERATURE: f32 = 0.7;

/// Something that can turn a [`CourseRequest`] into a [`GeneratedCourse`].
/// The real implementation calls the text-generation API; tests substitute
/// fixed or failing gateways.
pub trait GenerateCourse {
    fn generate(
        &self,
        request: &CourseRequest,
    ) -> impl Future<Output = Result<GeneratedCourse, GenerateError>> + Send;
}

/// Stateless gateway to the text-generation endpoint. One outbound call per
/// `generate`, no retry, no streaming. Repeated calls with identical input
/// may yield different documents; the upstream model is stochastic.
pub struct LlmGateway {
    client: Client<OpenAIConfig>,
    model: String,
}

static SHARED_GATEWAY: LazyLock<Option<LlmGateway>> =
    LazyLock::new(|| LlmGateway::from_env().ok());

impl LlmGateway {
    pub fn from_env() -> Result<Self, GenerateError> {
        let config = LlmConfig::from_env()?;
        Ok(Self {
            client: config.client(),
            model: config.model,
        })
    }

    /// The process-wide gateway, so the underlying HTTP client is built once
    /// and reused across requests. A missing credential is reported per call;
    /// it never takes the process down.
    pub fn shared() -> Result<&'static LlmGateway, GenerateError> {
        SHARED_GATEWAY
            .as_ref()
            .ok_or(GenerateError::MissingCredential)
    }

    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: config.client(),
            model: config.model.clone(),
        }
    }
}

impl GenerateCourse for LlmGateway {
    fn generate(
        &self,
        request: &CourseRequest,
    ) -> impl Future<Output = Result<GeneratedCourse, GenerateError>> + Send {
        async move {
            let chat_request = CreateChatCompletionRequestArgs::default()
                .model(self.model.as_str())
                .messages(vec![
                    ChatCompletionRequestMessage::System(SYSTEM_PROMPT.into()),
                    ChatCompletionRequestMessage::User(build_user_prompt(request).into()),
                ])
                .max_tokens(MAX_TOKENS)
                .temperature(TEMPERATURE)
                .build()
                .map_err(GenerateError::from)?;
            info!(topic = %request.topic, model = %self.model, "sending course generation request");
            let response = self
                .client
                .chat()
                .create(chat_request)
                .await
                .map_err(GenerateError::from)?;
            info!(topic = %request.topic, "received model reply");
            let content = response
                .choices
                .first()
                .and_then(|choice| choice.message.content.clone())
                .ok_or_else(|| GenerateError::Parse {
                    reason: "model reply contained no message content".to_string(),
                    raw: serde_json::to_string(&response).unwrap_or_default(),
                })?;
            extract_course_document(&content)
        }
    }
}

/// The instruction sent as the user message. It spells out the exact JSON
/// shape expected back so that extraction can stay a plain parse.
pub fn build_user_prompt(request: &CourseRequest) -> String {
    let focus = if request.description.trim().is_empty() {
        String::new()
    } else {
        format!(" Additional focus areas: {}", request.description)
    };
    let assessment_item = if request.include_assessments {
        "\n5. Assessment questions with answers to test understanding"
    } else {
        ""
    };
    format!(
        r#"Create a detailed course on "{topic}".{focus}

Course Parameters:
- Proficiency Level: {proficiency} (beginner, intermediate, or advanced)
- Learning Depth: {depth}% (higher percentage means more comprehensive coverage)
- Number of Chapters: {chapters}
- Include Assessments: {assessments}

For each chapter, provide:
1. A clear title and learning objectives
2. Detailed content with examples and explanations
3. Summary of key points
4. 2-3 external resources including relevant YouTube videos and articles/websites{assessment_item}

Format the response as a JSON object with the following structure:
{{
  "courseTitle": "string",
  "courseDescription": "string",
  "proficiencyLevel": "string",
  "chapters": [
    {{
      "title": "string",
      "objectives": ["string"],
      "content": "string",
      "summary": "string",
      "resources": [
        {{
          "type": "video|article",
          "title": "string",
          "url": "string",
          "description": "string"
        }}
      ],
      "assessment": [
        {{
          "question": "string",
          "options": ["string"],
          "correctAnswer": "number",
          "explanation": "string"
        }}
      ]
    }}
  ]
}}"#,
        topic = request.topic,
        focus = focus,
        proficiency = request.proficiency.as_str(),
        depth = request.depth,
        chapters = request.chapters_count,
        assessments = if request.include_assessments { "Yes" } else { "No" },
    )
}

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").unwrap());

/// Locate the course document in a free-text model reply.
///
/// Precedence: the first fenced code block if the reply contains one,
/// otherwise the whole text. A reply that yields no well-formed document
/// fails with [`GenerateError::Parse`] carrying the raw text; a partial or
/// default course is never substituted.
pub fn extract_course_document(reply: &str) -> Result<GeneratedCourse, GenerateError> {
    let candidate = match CODE_FENCE.captures(reply) {
        Some(captures) => captures[1].to_string(),
        None => reply.trim().to_string(),
    };
    let course: GeneratedCourse = serde_json::from_str(&candidate).map_err(|e| {
        GenerateError::Parse {
            reason: e.to_string(),
            raw: reply.to_string(),
        }
    })?;
    course.validate().map_err(|reason| GenerateError::Parse {
        reason,
        raw: reply.to_string(),
    })?;
    Ok(course)
}
