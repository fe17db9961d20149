use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::chat::ChatService;
use crate::config::AppConfig;
use crate::ingest::{Ingestor, UploadedFile};
use crate::models::{
    Chat, ChatCreate, Document, Message, MessageCreate, Role, SendMessageResponse, UploadResponse,
};
use crate::store::ChatStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChatStore>,
    pub chat: ChatService,
    pub ingestor: Ingestor,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chats", get(list_chats).post(create_chat))
        .route("/chats/:chat_id", get(get_chat).delete(delete_chat))
        .route(
            "/chats/:chat_id/messages",
            get(list_messages).post(send_message),
        )
        .route("/chats/:chat_id/upload", post(upload_documents))
        .route("/chats/:chat_id/files", get(list_documents))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: AppConfig, state: AppState) -> Result<()> {
    let app = router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn list_chats(State(state): State<AppState>) -> Result<Json<Vec<Chat>>, ApiError> {
    let chats = state.store.list_chats().await?;
    Ok(Json(chats))
}

async fn create_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatCreate>,
) -> Result<Json<Chat>, ApiError> {
    let now = Utc::now();
    let chat = Chat {
        id: Uuid::new_v4().to_string(),
        title: request.title,
        curriculum: request.curriculum,
        language: request.language,
        created_at: now,
        updated_at: now,
    };

    state.store.insert_chat(chat.clone()).await?;
    Ok(Json(chat))
}

async fn get_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<Json<Chat>, ApiError> {
    match state.store.get_chat(&chat_id).await? {
        Some(chat) => Ok(Json(chat)),
        None => Err(ApiError::not_found("Chat not found".to_string())),
    }
}

async fn delete_chat(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_chat(&chat_id).await? {
        return Err(ApiError::not_found("Chat not found".to_string()));
    }

    // Independent deletions; no cross-entity atomicity is promised.
    state.store.delete_chat_messages(&chat_id).await?;
    state.store.delete_chat_documents(&chat_id).await?;

    Ok(Json(
        serde_json::json!({ "message": "Chat deleted successfully" }),
    ))
}

async fn list_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let messages = state.store.list_messages(&chat_id).await?;
    Ok(Json(messages))
}

async fn send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(request): Json<MessageCreate>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    let Some(chat) = state.store.get_chat(&chat_id).await? else {
        return Err(ApiError::not_found("Chat not found".to_string()));
    };

    let prior_messages = state.store.list_messages(&chat_id).await?;

    let user_message = Message {
        id: Uuid::new_v4().to_string(),
        chat_id: chat_id.clone(),
        role: request.role,
        content: request.content.clone(),
        metadata: None,
        created_at: Utc::now(),
    };
    state.store.insert_message(user_message.clone()).await?;

    if request.role != Role::User {
        return Ok(Json(SendMessageResponse {
            user_message,
            ai_message: None,
        }));
    }

    let ai_message = state
        .chat
        .respond(&chat, &request.content, &prior_messages)
        .await?;
    state.store.touch_chat(&chat_id, Utc::now()).await?;

    Ok(Json(SendMessageResponse {
        user_message,
        ai_message: Some(ai_message),
    }))
}

async fn upload_documents(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    if state.store.get_chat(&chat_id).await?.is_none() {
        return Err(ApiError::not_found("Chat not found".to_string()));
    }

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field.bytes().await?.to_vec();

        files.push(UploadedFile {
            filename,
            mime_type,
            bytes,
        });
    }

    let documents = state.ingestor.ingest_batch(&chat_id, files).await?;

    Ok(Json(UploadResponse {
        message: "Files uploaded successfully".to_string(),
        files: documents,
    }))
}

async fn list_documents(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let documents = state.store.list_documents(&chat_id).await?;
    Ok(Json(documents))
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: value.to_string(),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(value: axum::extract::multipart::MultipartError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: value.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
