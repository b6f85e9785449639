use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use uuid::Uuid;

use crate::agents::{FanOutCoordinator, SpecialistInvoker, SynthesisInvoker};
use crate::config::AppConfig;
use crate::models::{PanelFindings, Report, SpecialistRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    FanOutPending,
    FanOutComplete,
    Synthesizing,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::FanOutPending => "fan_out_pending",
            PipelineStage::FanOutComplete => "fan_out_complete",
            PipelineStage::Synthesizing => "synthesizing",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub findings: PanelFindings,
    /// Titled diagnosis text, identical to what was written to the artifact.
    pub diagnosis: String,
}

/// Specialist panel, then team synthesis, then the result artifact.
///
/// A run is not resumable: if it is interrupted the report has to be submitted
/// again.
#[derive(Clone)]
pub struct ConsultationPipeline {
    specialists: Vec<SpecialistInvoker>,
    team: SynthesisInvoker,
    coordinator: FanOutCoordinator,
    result_path: PathBuf,
}

impl ConsultationPipeline {
    pub fn new(
        specialists: Vec<SpecialistInvoker>,
        team: SynthesisInvoker,
        coordinator: FanOutCoordinator,
        result_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            specialists,
            team,
            coordinator,
            result_path: result_path.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let specialists = SpecialistRole::ALL
            .into_iter()
            .map(|role| {
                SpecialistInvoker::openrouter(
                    role,
                    &config.openrouter_api_key,
                    &config.specialist_model,
                    config.specialist_temperature,
                )
            })
            .collect();

        let team = SynthesisInvoker::openrouter(
            &config.openrouter_api_key,
            &config.specialist_model,
            config.specialist_temperature,
        );

        Self::new(
            specialists,
            team,
            FanOutCoordinator::new(config.fanout_workers),
            config.result_path.clone(),
        )
    }

    pub fn result_path(&self) -> &Path {
        &self.result_path
    }

    pub async fn run(&self, report: &Report) -> PipelineOutcome {
        log_stage(PipelineStage::Idle);

        log_stage(PipelineStage::FanOutPending);
        let findings = self.coordinator.run(&self.specialists, report).await;
        log_stage(PipelineStage::FanOutComplete);

        if findings.present_count() == 0 {
            // Kept permissive: the team still runs on three placeholders.
            error!("No specialist produced a diagnosis, synthesizing from placeholders");
        }

        log_stage(PipelineStage::Synthesizing);
        let synthesis = self.team.invoke(&findings).await;
        let diagnosis = synthesis.format_titled();

        if let Err(e) = write_artifact(&self.result_path, &diagnosis).await {
            error!(
                path = %self.result_path.display(),
                error = %e,
                "Failed to persist final diagnosis"
            );
        }

        log_stage(PipelineStage::Done);
        PipelineOutcome {
            findings,
            diagnosis,
        }
    }
}

fn log_stage(stage: PipelineStage) {
    info!(stage = %stage, "Consultation pipeline stage");
}

/// Replaces the artifact in one step: the diagnosis goes to a uniquely named
/// sibling first and is renamed over the target, so concurrent runs and
/// readers only ever see a complete file.
async fn write_artifact(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let staging = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    if let Err(e) = tokio::fs::write(&staging, contents).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e);
    }
    if let Err(e) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e);
    }
    Ok(())
}

/// The most recently persisted diagnosis, if any run has completed.
pub async fn latest_diagnosis(path: &Path) -> std::io::Result<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
