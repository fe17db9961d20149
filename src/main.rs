use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use findai::chat::ChatService;
use findai::ingest::Ingestor;
use findai::llm::GeminiClient;
use findai::server::{run_server, AppState};
use findai::store::{ChatStore, MemoryStore};
use findai::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn ChatStore> = Arc::new(MemoryStore::new());
    let llm = Arc::new(GeminiClient::new(
        config.gemini_base_url.clone(),
        config.api_key.clone(),
        config.answer_model.clone(),
    ));

    let chat = ChatService::new(store.clone(), llm);
    let ingestor = Ingestor::new(store.clone());

    tracing::info!("starting Find AI educational chatbot");
    tracing::info!("using in-memory storage; data is lost on restart");
    tracing::info!("answer model: {}", config.answer_model);

    let state = AppState {
        store,
        chat,
        ingestor,
    };

    run_server(config, state).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
