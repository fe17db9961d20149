use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

use crate::context::ConversationContext;
use crate::llm::LanguageModel;
use crate::models::{AiResponse, Chat, Message, MessageMetadata, Role};
use crate::store::ChatStore;
use crate::text::split_lines;

const UNAVAILABLE_MESSAGE: &str =
    "I'm here to help! Please tell me what topic you'd like to study or what questions you have.";
const FALLBACK_MESSAGE: &str =
    "I'm here to help with your studies! What would you like to learn about?";
const CONTEXT_ONLY_FALLBACK: &str = "Sorry, I do not have information on that.";

/// Outcome of one model invocation. The degraded branch is a first-class
/// value, not an error: the pipeline always yields a usable reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapedReply {
    Structured(AiResponse),
    Degraded(AiResponse),
}

impl ShapedReply {
    pub fn into_response(self) -> AiResponse {
        match self {
            ShapedReply::Structured(response) | ShapedReply::Degraded(response) => response,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ShapedReply::Degraded(_))
    }
}

#[derive(Clone)]
pub struct ChatService {
    store: Arc<dyn ChatStore>,
    llm: Arc<dyn LanguageModel>,
}

impl ChatService {
    pub fn new(store: Arc<dyn ChatStore>, llm: Arc<dyn LanguageModel>) -> Self {
        Self { store, llm }
    }

    /// Produces and persists the assistant reply to one user message.
    /// `prior_messages` are the turns already stored for the chat, before
    /// the new user message was appended.
    pub async fn respond(
        &self,
        chat: &Chat,
        user_message: &str,
        prior_messages: &[Message],
    ) -> Result<Message> {
        let mut documents = self.store.list_documents(&chat.id).await?;
        // list_documents is newest-first; the prompt reads in upload order.
        documents.reverse();

        let context = ConversationContext::build(prior_messages, &documents);
        let reply = self
            .shape_reply(user_message, &chat.curriculum, &chat.language, &context)
            .await;

        if reply.is_degraded() {
            tracing::warn!(chat_id = %chat.id, "model reply degraded to default response");
        }

        let response = reply.into_response();
        let metadata = MessageMetadata {
            has_notes: response.has_notes,
            notes: response.notes.clone(),
            has_questions: response.has_questions,
            questions: response.questions.clone(),
            follow_up_actions: response.follow_up_actions.clone(),
        };

        let message = Message {
            id: Uuid::new_v4().to_string(),
            chat_id: chat.id.clone(),
            role: Role::Assistant,
            content: split_lines(&response.content),
            metadata: Some(metadata),
            created_at: Utc::now(),
        };

        self.store.insert_message(message.clone()).await?;
        Ok(message)
    }

    /// Invokes the model and parses its output. Never fails: an unavailable
    /// capability or malformed output degrades to a fixed default.
    pub async fn shape_reply(
        &self,
        user_message: &str,
        curriculum: &str,
        language: &str,
        context: &ConversationContext,
    ) -> ShapedReply {
        let prompt = build_prompt(user_message, curriculum, language, context);

        let raw = match self.llm.generate(&prompt).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("model invocation failed: {err:#}");
                return ShapedReply::Degraded(AiResponse::plain(UNAVAILABLE_MESSAGE));
            }
        };

        match parse_model_reply(&raw) {
            Ok(response) => ShapedReply::Structured(response),
            Err(err) => {
                tracing::warn!("model output did not parse: {err:#}");
                ShapedReply::Degraded(AiResponse::plain(FALLBACK_MESSAGE))
            }
        }
    }
}

fn build_system_prompt(curriculum: &str, language: &str, file_context: &str) -> String {
    let file_line = if file_context.is_empty() {
        String::new()
    } else {
        format!("File context available: {file_context}")
    };

    format!(
        r#"You are Find AI, an intelligent educational chatbot and teaching assistant.

Rules:
1. Always explain concepts in simple, clear language suitable for students.
2. Align answers with {curriculum} curriculum.
3. Generate notes in bullet points when asked.
4. Support {language} language responses.
5. Be polite, encouraging, and motivating.
6. If unclear, ask for clarification.
7. Give examples when possible.
8. Support quiz/test generation for teachers.
9. If asked for "bookback exercises" or "chapter questions", extract EXACT questions from file content.

{file_line}

Respond with JSON in this format:
{{
  "content": "Your main response text",
  "has_notes": true/false,
  "notes": ["bullet point 1", "bullet point 2"] (if has_notes is true),
  "has_questions": true/false,
  "questions": [
    {{
      "type": "mcq|short|true_false",
      "question": "Question text",
      "options": ["option1", "option2", "option3", "option4"] (for mcq only),
      "answer": "correct answer"
    }}
  ] (if has_questions is true),
  "follow_up_actions": ["Generate practice quiz", "Download notes"] (optional)
}}"#
    )
}

fn build_prompt(
    user_message: &str,
    curriculum: &str,
    language: &str,
    context: &ConversationContext,
) -> String {
    let system_prompt = build_system_prompt(curriculum, language, &context.document_context);

    let history = context
        .history
        .iter()
        .map(|(role, content)| format!("{role}: {content}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt =
        format!("{system_prompt}\n\nConversation history:\n{history}\n\nUser: {user_message}");

    if !context.document_context.is_empty() {
        prompt.push_str(&format!(
            "\n\nPlease answer ONLY based on the above file content. \
             If not found, respond with '{CONTEXT_ONLY_FALLBACK}'"
        ));
    }

    prompt
}

fn parse_model_reply(raw: &str) -> Result<AiResponse> {
    let text = strip_code_fences(raw);
    let response = serde_json::from_str::<AiResponse>(&text)?;
    Ok(response)
}

/// Removes the markdown code fence some models wrap JSON output in.
fn strip_code_fences(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    if text.starts_with("```") {
        let re = Regex::new(r"(?s)^```[a-zA-Z]*\n(.*)\n```$")
            .unwrap_or_else(|_| Regex::new("^$").unwrap());
        if let Some(caps) = re.captures(&text) {
            if let Some(body) = caps.get(1) {
                text = body.as_str().trim().to_string();
            }
        } else {
            text = text.replace("```", "").trim().to_string();
        }
    }
    text
}
