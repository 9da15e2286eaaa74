//! [`LocalAiService`] backed by a llama.cpp-style command line executable.

use std::fmt::Write as _;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::output::{clean_output, OUTPUT_MARKER};
use super::{AiError, AiGenerationRequest, AiRuntimeSettings, LocalAiService};

/// Flag that stops the executable from echoing the prompt. Older builds reject it.
pub const NO_DISPLAY_PROMPT_FLAG: &str = "--no-display-prompt";

/// Runs a local llama.cpp CLI once per generation.
#[derive(Debug, Default, Clone)]
pub struct LlamaCppService;

impl LlamaCppService {
    pub fn new() -> Self {
        Self
    }
}

struct ProcessOutcome {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl ProcessOutcome {
    fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[async_trait]
impl LocalAiService for LlamaCppService {
    async fn generate(
        &self,
        settings: &AiRuntimeSettings,
        request: &AiGenerationRequest,
        cancel: CancellationToken,
    ) -> Result<String, AiError> {
        if !settings.executable_path.is_file() {
            return Err(AiError::ExecutableNotFound(settings.executable_path.clone()));
        }
        if !settings.model_path.is_file() {
            return Err(AiError::ModelNotFound(settings.model_path.clone()));
        }

        let prompt = build_prompt(request);
        let mut attempt = run_process(
            &settings.executable_path,
            &build_arguments(settings, &prompt, true),
            &cancel,
        )
        .await?;

        if !attempt.succeeded() && mentions_unknown_option(&attempt.stderr, NO_DISPLAY_PROMPT_FLAG) {
            log::info!("AI executable rejected {NO_DISPLAY_PROMPT_FLAG}; retrying without it");
            attempt = run_process(
                &settings.executable_path,
                &build_arguments(settings, &prompt, false),
                &cancel,
            )
            .await?;
        }

        if !attempt.succeeded() {
            let message = attempt.stderr.trim();
            log::warn!("AI process exited with {:?}", attempt.exit_code);
            return Err(AiError::ProcessFailed(if message.is_empty() {
                "Local AI process failed.".to_string()
            } else {
                message.to_string()
            }));
        }

        let cleaned = clean_output(&attempt.stdout);
        if cleaned.is_empty() {
            return Err(AiError::EmptyOutput);
        }
        Ok(cleaned)
    }
}

/// Builds the single prompt string passed with `-p`.
pub fn build_prompt(request: &AiGenerationRequest) -> String {
    let mut prompt = String::new();
    prompt.push_str("You generate ready-to-paste quicktexts.\n");
    prompt.push_str("Return only the final quicktext with no markdown and no explanation.\n");
    prompt.push('\n');
    let _ = writeln!(prompt, "Request: {}", request.prompt.trim());

    if !request.category.trim().is_empty() {
        let _ = writeln!(prompt, "Category hint: {}", request.category.trim());
    }
    if !request.keywords.trim().is_empty() {
        let _ = writeln!(prompt, "Keywords hint: {}", request.keywords.trim());
    }
    if !request.existing_text.trim().is_empty() {
        prompt.push_str("Existing text to improve:\n");
        let _ = writeln!(prompt, "{}", request.existing_text.trim());
    }

    prompt.push('\n');
    let _ = writeln!(prompt, "{OUTPUT_MARKER}");
    prompt
}

/// Command line for one attempt. Numeric values are clamped; the temperature
/// always uses one decimal place and a `.` separator.
pub fn build_arguments(
    settings: &AiRuntimeSettings,
    prompt: &str,
    include_no_display_prompt: bool,
) -> Vec<String> {
    let mut args = vec![
        "-m".to_string(),
        settings.model_path.to_string_lossy().into_owned(),
        "-n".to_string(),
        settings.clamped_max_tokens().to_string(),
        "--temp".to_string(),
        format!("{:.1}", settings.clamped_temperature()),
    ];
    if include_no_display_prompt {
        args.push(NO_DISPLAY_PROMPT_FLAG.to_string());
    }
    args.push("-p".to_string());
    args.push(prompt.to_string());
    args
}

/// True when `stderr` names `option` and says it is unknown (case-insensitive).
fn mentions_unknown_option(stderr: &str, option: &str) -> bool {
    if stderr.trim().is_empty() {
        return false;
    }
    let lower = stderr.to_lowercase();
    lower.contains(&option.to_lowercase()) && lower.contains("unknown")
}

/// Runs the executable to completion, draining stdout and stderr while waiting.
///
/// Cancelling drops the child, which kills it.
async fn run_process(
    executable: &Path,
    args: &[String],
    cancel: &CancellationToken,
) -> Result<ProcessOutcome, AiError> {
    let child = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(AiError::Launch)?;

    log::debug!("launched AI process {} (pid {:?})", executable.display(), child.id());

    let output = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            log::info!("AI generation cancelled");
            return Err(AiError::Cancelled);
        }
        result = child.wait_with_output() => result.map_err(AiError::Launch)?,
    };

    Ok(ProcessOutcome {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
