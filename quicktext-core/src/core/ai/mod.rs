//! Local AI drafting through an external inference executable.

mod llama;
pub mod output;

use std::ops::RangeInclusive;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use llama::{build_arguments, build_prompt, LlamaCppService, NO_DISPLAY_PROMPT_FLAG};
pub use output::{clean_output, OUTPUT_MARKER};

pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.1..=1.5;
pub const MAX_TOKENS_RANGE: RangeInclusive<i64> = 64..=1024;

/// What the user asked the model to write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiGenerationRequest {
    pub prompt: String,
    pub category: String,
    pub keywords: String,
    /// Text to revise rather than write from scratch; may be empty.
    pub existing_text: String,
}

/// How to run the model. Only these values are persisted (as [`crate::AppSettings`]).
#[derive(Debug, Clone, PartialEq)]
pub struct AiRuntimeSettings {
    pub executable_path: PathBuf,
    pub model_path: PathBuf,
    pub temperature: f64,
    pub max_tokens: i64,
}

impl AiRuntimeSettings {
    pub fn clamped_temperature(&self) -> f64 {
        crate::core::settings::clamp_temperature(self.temperature)
    }

    pub fn clamped_max_tokens(&self) -> i64 {
        crate::core::settings::clamp_max_tokens(self.max_tokens)
    }
}

#[derive(Debug, Error)]
pub enum AiError {
    #[error("the AI executable was not found: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("the model file was not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("failed to launch the local AI process: {0}")]
    Launch(#[source] std::io::Error),

    /// The process exited unsuccessfully; carries its error text.
    #[error("{0}")]
    ProcessFailed(String),

    #[error("local AI returned no text")]
    EmptyOutput,

    #[error("generation was cancelled")]
    Cancelled,
}

/// Produces ready-to-paste text from a prompt.
#[async_trait]
pub trait LocalAiService: Send + Sync {
    async fn generate(
        &self,
        settings: &AiRuntimeSettings,
        request: &AiGenerationRequest,
        cancel: CancellationToken,
    ) -> Result<String, AiError>;
}
