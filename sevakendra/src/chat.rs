use std::sync::Arc;
use tracing::{error, info};

use crate::error::{ConsultError, Result};
use crate::llm::{ModelSettings, OpenRouterGenerator, TextGenerator};

pub const CHAT_PREAMBLE: &str = "You are a friendly health assistant for a community health centre. \
Answer general health questions in plain language and advise seeing a doctor for anything urgent.";

/// General health chatbot relaying one message at a time.
#[derive(Clone)]
pub struct Chatbot {
    generator: Arc<dyn TextGenerator>,
}

impl Chatbot {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn openrouter(api_key: &str, model: &str) -> Self {
        let settings = ModelSettings::new(model, CHAT_PREAMBLE);
        Self::new(Arc::new(OpenRouterGenerator::new(api_key, settings)))
    }

    pub async fn reply(&self, message: &str) -> Result<String> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ConsultError::Validation(
                "Message cannot be empty".to_string(),
            ));
        }

        info!(chars = message.len(), "Chat message received");
        self.generator.generate(message).await.map_err(|e| {
            error!(error = %e, "Chat model call failed");
            ConsultError::Llm(e.to_string())
        })
    }
}
