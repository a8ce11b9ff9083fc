mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{actions::ActionsSubcommand, Overrides, Workspace};
use deskhand_core::{BackendKind, RelayKind};
use std::path::PathBuf;

const USAGE_HINT: &str =
    "Please provide a command to execute e.g. deskhand 'Open the calculator app'";

#[derive(Parser)]
#[command(
    name = "deskhand",
    about = "Run a natural-language command by driving the browser and editor through OS scripting",
    version,
    propagate_version = true,
    disable_help_subcommand = true
)]
struct Cli {
    /// Config file (default: deskhand.yaml in the nearest directory that has one)
    #[arg(long, global = true, env = "DESKHAND_CONFIG")]
    config: Option<PathBuf>,

    /// Credential file (default: .env next to the config)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Reasoning backend
    #[arg(long, global = true, value_parser = parse_backend)]
    backend: Option<BackendKind>,

    /// Model name override
    #[arg(long, global = true)]
    model: Option<String>,

    /// Where the final answer goes
    #[arg(long, global = true, value_parser = parse_relay)]
    relay: Option<RelayKind>,

    /// Maximum agent steps before giving up
    #[arg(long, global = true)]
    max_steps: Option<u32>,

    /// Log agent steps and action calls to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,

    /// The command to carry out, e.g. "Open gmail and read the first email"
    prompt: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or invoke actions without an agent
    Actions {
        #[command(subcommand)]
        subcommand: ActionsSubcommand,
    },

    /// Run as an MCP stdio server exposing the actions (used by the claude backend)
    Mcp,
}

fn parse_backend(s: &str) -> Result<BackendKind, String> {
    BackendKind::parse(s).ok_or_else(|| format!("unknown backend '{s}' (openai, claude-cli)"))
}

fn parse_relay(s: &str) -> Result<RelayKind, String> {
    RelayKind::parse(s).ok_or_else(|| format!("unknown relay '{s}' (speech, print, silent)"))
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose || matches!(cli.command, Some(Commands::Mcp)) {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let prompt = cli.prompt.join(" ");
    if cli.command.is_none() && prompt.trim().is_empty() {
        eprintln!("{USAGE_HINT}");
        std::process::exit(1);
    }

    let overrides = Overrides {
        backend: cli.backend,
        model: cli.model,
        relay: cli.relay,
        max_steps: cli.max_steps,
    };

    let result = Workspace::load(cli.config.as_deref(), cli.env_file.as_deref(), &overrides)
        .and_then(|ws| match cli.command {
            Some(Commands::Actions { subcommand }) => cmd::actions::run(&ws, subcommand),
            Some(Commands::Mcp) => cmd::mcp::run(&ws),
            None => cmd::run::run(&ws, &prompt),
        });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
