pub mod agents;
pub mod chat;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod service;

pub use config::AppConfig;
pub use error::{ConsultError, Result};
pub use pipeline::{ConsultationPipeline, PipelineOutcome, PipelineStage};
pub use service::{AppState, build_router, create_app};
pub use models::*;
