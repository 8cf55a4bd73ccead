use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use agent_sandbox::{init_logging, Dispatcher, SandboxConfig};
use anyhow::{anyhow, Context};
use clap::Parser;
use coding_agent::config::AgentConfig;
use coding_agent::providers;
use coding_agent::runner::run_prompt;

/// Ask the coding agent to work inside a sandboxed directory.
#[derive(Debug, Parser)]
#[command(name = "coding_agent", version)]
struct Cli {
    /// Prompt for the agent; multiple words are joined with spaces.
    #[arg(required = true, value_name = "PROMPT")]
    prompt: Vec<String>,

    /// Print the prompt, token usage and every tool result.
    #[arg(long)]
    verbose: bool,

    /// Directory the agent is confined to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    working_dir: PathBuf,
}

fn main() -> ExitCode {
    // Usage errors exit 1 like every other failure; --help and --version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return if error.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            return Err(error).context("failed to load .env file");
        }
    }

    let prompt = cli.prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err(anyhow!("Please provide a non-empty prompt"));
    }

    let config = AgentConfig::from_env().context("invalid agent configuration")?;
    let dispatcher = Dispatcher::new(&cli.working_dir, SandboxConfig::from_env())
        .with_context(|| format!("cannot use working directory {}", cli.working_dir.display()))?;
    let provider = providers::provider_from_config(&config).map_err(|error| anyhow!(error))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_prompt(
        provider.as_ref(),
        &dispatcher,
        &prompt,
        &config.system_instructions,
        cli.verbose,
        &mut out,
    )?;

    Ok(())
}
