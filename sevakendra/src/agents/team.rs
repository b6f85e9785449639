use std::sync::Arc;
use tracing::{error, info, warn};

use crate::llm::{ModelSettings, OpenRouterGenerator, TextGenerator};
use crate::models::{PanelFindings, SynthesisResult};
use crate::prompts;

/// Combines the specialist panel into one opinion. Always yields some text.
#[derive(Clone)]
pub struct SynthesisInvoker {
    generator: Arc<dyn TextGenerator>,
}

impl SynthesisInvoker {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn openrouter(api_key: &str, model: &str, temperature: f64) -> Self {
        let settings =
            ModelSettings::new(model, prompts::TEAM_PREAMBLE).with_temperature(temperature);
        Self::new(Arc::new(OpenRouterGenerator::new(api_key, settings)))
    }

    pub async fn invoke(&self, findings: &PanelFindings) -> SynthesisResult {
        info!(
            answered = findings.present_count(),
            "Multidisciplinary team is generating the final diagnosis"
        );

        let prompt = prompts::team_prompt(findings);
        match self.generator.generate(&prompt).await {
            Ok(text) if text.trim().is_empty() => {
                warn!("Team model returned an empty response");
                SynthesisResult::not_generated()
            }
            Ok(text) => {
                info!(chars = text.len(), "Final diagnosis generated");
                SynthesisResult::new(text)
            }
            Err(e) => {
                error!(error = %e, "Failed to generate final diagnosis");
                SynthesisResult::not_generated()
            }
        }
    }
}
