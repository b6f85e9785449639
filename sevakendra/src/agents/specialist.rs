use std::sync::Arc;
use tracing::{error, info, warn};

use crate::llm::{ModelSettings, OpenRouterGenerator, TextGenerator};
use crate::models::{SpecialistResult, SpecialistRole};
use crate::prompts;

/// Runs one role's prompt against the model.
///
/// A failed call is not an error for the caller: it is logged and reported as
/// a [`SpecialistResult`] without text. There are no retries.
#[derive(Clone)]
pub struct SpecialistInvoker {
    role: SpecialistRole,
    generator: Arc<dyn TextGenerator>,
}

impl SpecialistInvoker {
    pub fn new(role: SpecialistRole, generator: Arc<dyn TextGenerator>) -> Self {
        Self { role, generator }
    }

    pub fn openrouter(role: SpecialistRole, api_key: &str, model: &str, temperature: f64) -> Self {
        let settings =
            ModelSettings::new(model, prompts::preamble(role)).with_temperature(temperature);
        Self::new(role, Arc::new(OpenRouterGenerator::new(api_key, settings)))
    }

    pub fn role(&self) -> SpecialistRole {
        self.role
    }

    pub async fn invoke(&self, report: &str) -> SpecialistResult {
        info!(role = %self.role, "Specialist is running");

        let prompt = prompts::specialist_prompt(self.role, report);
        match self.generator.generate(&prompt).await {
            Ok(text) if text.trim().is_empty() => {
                warn!(role = %self.role, "Specialist returned an empty response");
                SpecialistResult::failed(self.role)
            }
            Ok(text) => {
                info!(role = %self.role, chars = text.len(), "Specialist finished");
                SpecialistResult::answered(self.role, text)
            }
            Err(e) => {
                error!(role = %self.role, error = %e, "Specialist call failed");
                SpecialistResult::failed(self.role)
            }
        }
    }
}
