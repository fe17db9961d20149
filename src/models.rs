use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub title: String,
    pub curriculum: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCreate {
    pub title: String,
    #[serde(default = "default_curriculum")]
    pub curriculum: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_curriculum() -> String {
    "CBSE".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageCreate {
    pub content: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub role: Role,
    pub content: String,
    pub metadata: Option<MessageMetadata>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetadata {
    pub has_notes: bool,
    pub notes: Option<Vec<String>>,
    pub has_questions: bool,
    pub questions: Option<Vec<Question>>,
    pub follow_up_actions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub chat_id: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: String,
    pub extracted_text: String,
    pub questions: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    Short,
    TrueFalse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub question: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub answer: String,
}

/// Structured reply parsed from one model invocation. The flag/list pairs
/// mirror the wire contract; the parser tolerates a model that sets a flag
/// without the matching list (or the reverse).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiResponse {
    pub content: String,
    #[serde(default)]
    pub has_notes: bool,
    #[serde(default)]
    pub notes: Option<Vec<String>>,
    #[serde(default)]
    pub has_questions: bool,
    #[serde(default)]
    pub questions: Option<Vec<Question>>,
    #[serde(default)]
    pub follow_up_actions: Option<Vec<String>>,
}

impl AiResponse {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            has_notes: false,
            notes: None,
            has_questions: false,
            questions: None,
            follow_up_actions: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageResponse {
    pub user_message: Message,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_message: Option<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub files: Vec<Document>,
}
