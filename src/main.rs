// Copyright 2026 Quill Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use quill::cli;

#[derive(Parser)]
#[command(
    name = "quill",
    about = "Quill — a conversational SQL assistant with per-table query memory",
    version,
    after_help = "Run 'quill <command> --help' for details on each command.\nRun 'quill' with no command to enter interactive mode."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single input line non-interactively
    Exec {
        /// A directive, `ask:` prompt, raw SELECT, or /meta-command
        line: String,
    },
    /// Show the active context and remembered query spec
    Memory,
    /// Show column usage, most-used first
    Analytics,
    /// Show recent interactions, newest first
    Log {
        /// How many interactions to show
        #[arg(long, short = 'n', default_value = "5")]
        count: usize,
    },
    /// Clear all remembered state
    Reset,
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var("QUILL_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("QUILL_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("QUILL_VERBOSE", "1");
    }

    let default_level = if cli.verbose { "quill=debug" } else { "quill=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        // No subcommand → launch interactive REPL
        None => {
            let controller = cli::connect_controller().await?;
            cli::repl::run(controller).await
        }

        Some(Commands::Exec { line }) => cli::exec_cmd::run(&line).await,
        Some(Commands::Memory) => cli::memory_cmd::run(),
        Some(Commands::Analytics) => cli::analytics_cmd::run(),
        Some(Commands::Log { count }) => cli::log_cmd::run(count),
        Some(Commands::Reset) => cli::reset_cmd::run(),
        Some(Commands::Doctor) => cli::doctor::run().await,
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "quill", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli::output::is_quiet() && !cli::output::is_json() {
            eprintln!("  Error: {e:#}");
        }
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}
