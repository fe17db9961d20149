use crate::models::{Document, Message};

/// Fixed number of prior turns carried into the prompt. A hard cap, not
/// adaptive: it trades model context size against conversation continuity.
pub const HISTORY_WINDOW: usize = 6;

/// Prompt-ready view of one chat: the bounded recent-message window plus
/// every uploaded document's text and extracted questions.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    pub history: Vec<(String, String)>,
    pub document_context: String,
}

impl ConversationContext {
    /// `messages` must be the turns preceding the new user message, in
    /// chronological order; `documents` in upload order.
    pub fn build(messages: &[Message], documents: &[Document]) -> Self {
        Self {
            history: recent_history(messages),
            document_context: document_context(documents),
        }
    }
}

fn recent_history(messages: &[Message]) -> Vec<(String, String)> {
    let start = messages.len().saturating_sub(HISTORY_WINDOW);
    messages[start..]
        .iter()
        .map(|message| (message.role.as_str().to_string(), message.content.clone()))
        .collect()
}

fn document_context(documents: &[Document]) -> String {
    let mut context = String::new();
    for document in documents {
        context.push_str(&document.original_name);
        context.push_str(":\n");
        context.push_str(&document.extracted_text);
        context.push('\n');

        if !document.questions.is_empty() {
            context.push_str("Questions from this book:\n");
            for question in &document.questions {
                context.push_str(question);
                context.push('\n');
            }
        }
    }
    context
}
