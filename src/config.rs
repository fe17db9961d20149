use std::env;

use anyhow::Result;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub gemini_base_url: String,
    pub api_key: String,
    pub answer_model: String,
}

impl AppConfig {
    /// Reads configuration from the environment. A missing model credential
    /// is fatal; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GOOGLE_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            anyhow::bail!("GOOGLE_API_KEY environment variable is required");
        }

        Ok(Self {
            bind_addr: env::var("FIND_AI_BIND").unwrap_or_else(|_| "127.0.0.1:5002".to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string()),
            api_key,
            answer_model: env::var("ANSWER_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
        })
    }
}
