mod client;
mod types;

pub use client::{GeminiClient, ModelClient};
pub use types::*;

use crate::{Error, Result, config::LlmConfig};
use std::sync::Arc;
use tracing::info;

pub fn create_model_client(config: LlmConfig) -> Result<Arc<dyn ModelClient>> {
    match config.provider.as_str() {
        "gemini" => {
            info!("Using Gemini model client ({})", config.model);
            Ok(Arc::new(GeminiClient::new(config)?))
        }
        other => Err(Error::config(format!("Unsupported model provider: {other}"))),
    }
}
