pub mod chat;
pub mod config;
pub mod context;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod server;
pub mod store;
pub mod text;

pub use config::AppConfig;
pub use server::run_server;
