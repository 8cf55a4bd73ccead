//! One-shot prompt execution: drives a provider run and prints its progress.

use std::io::{self, Write};

use agent_provider::{RunEvent, RunMessage, RunProvider, RunRequest};
use agent_sandbox::Dispatcher;
use thiserror::Error;

use crate::tools::{execute_tool_call, tool_definitions};

const RUN_ID: u64 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("provider could not start the run: {0}")]
    Provider(String),

    #[error("{0}")]
    Failed(String),

    #[error("provider ended the run without a terminal event")]
    Incomplete,

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Totals gathered over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
    pub tool_calls: usize,
    pub final_text: Option<String>,
}

/// Sends `prompt` to `provider`, executing tool calls against `dispatcher`.
///
/// Model text and `Calling function: name(args)` lines are always written to
/// `out`. With `verbose`, the prompt, per-turn token counts and each tool
/// result are written too.
pub fn run_prompt(
    provider: &dyn RunProvider,
    dispatcher: &Dispatcher,
    prompt: &str,
    instructions: &str,
    verbose: bool,
    out: &mut dyn Write,
) -> Result<RunSummary, RunError> {
    if verbose {
        writeln!(out, "User prompt: {prompt}")?;
    }

    let profile = provider.profile();
    tracing::info!(
        provider = %profile.provider_id,
        model = %profile.model_id,
        root = %dispatcher.working_directory().path().display(),
        "starting run"
    );

    let request = RunRequest {
        run_id: RUN_ID,
        messages: vec![RunMessage::UserText {
            text: prompt.to_string(),
        }],
        instructions: instructions.to_string(),
        tools: tool_definitions(),
    };

    let mut summary = RunSummary::default();
    let mut terminal: Option<Result<(), String>> = None;
    let mut write_error: Option<io::Error> = None;

    let mut execute_tool = |call| execute_tool_call(dispatcher, call);
    let mut emit = |event: RunEvent| {
        if event.run_id() != RUN_ID || terminal.is_some() {
            tracing::debug!(?event, "ignoring event outside the active run");
            return;
        }

        let written = render_event(&event, verbose, &mut summary, out);
        if let Err(error) = written {
            write_error.get_or_insert(error);
        }

        match event {
            RunEvent::Finished { .. } => terminal = Some(Ok(())),
            RunEvent::Failed { error, .. } => terminal = Some(Err(error)),
            _ => {}
        }
    };

    provider
        .run(request, &mut execute_tool, &mut emit)
        .map_err(RunError::Provider)?;

    if let Some(error) = write_error {
        return Err(RunError::Output(error));
    }

    match terminal {
        Some(Ok(())) => {
            tracing::info!(
                tool_calls = summary.tool_calls,
                prompt_tokens = summary.prompt_tokens,
                response_tokens = summary.response_tokens,
                "run finished"
            );
            Ok(summary)
        }
        Some(Err(error)) => Err(RunError::Failed(error)),
        None => Err(RunError::Incomplete),
    }
}

fn render_event(
    event: &RunEvent,
    verbose: bool,
    summary: &mut RunSummary,
    out: &mut dyn Write,
) -> io::Result<()> {
    match event {
        RunEvent::Text { text, .. } => {
            summary.final_text = Some(text.clone());
            writeln!(out, "{text}")
        }
        RunEvent::ToolCallStarted { call, .. } => {
            summary.tool_calls += 1;
            writeln!(out, "Calling function: {}({})", call.tool_name, call.arguments)
        }
        RunEvent::ToolCallFinished { result, .. } if verbose => {
            writeln!(out, "-> {}", result.content_text())
        }
        RunEvent::Usage {
            prompt_tokens,
            response_tokens,
            ..
        } => {
            summary.prompt_tokens += prompt_tokens;
            summary.response_tokens += response_tokens;
            if verbose {
                writeln!(out, "Prompt tokens: {prompt_tokens}")?;
                writeln!(out, "Response tokens: {response_tokens}")?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
