// Copyright 2026 Surfacer Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use surfacer::cli;

#[derive(Parser)]
#[command(
    name = "surfacer",
    about = "Surfacer — survey a web app's pages and report on structure and design drift",
    version,
    after_help = "Run 'surfacer <command> --help' for details on each command."
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

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Survey every target page and write the JSON and Markdown reports
    Run {
        /// Plan file (JSON). Omit to survey --base-url with defaults
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Root URL of the application (overrides the plan's base_url)
        #[arg(long)]
        base_url: Option<String>,
        /// Directory for report.json, report.md, and screenshots/
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Run the browser with a visible window
        #[arg(long)]
        headed: bool,
    },
    /// Show the effective plan and resolved target URLs without running
    Plan {
        /// Plan file (JSON)
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Root URL of the application
        #[arg(long)]
        base_url: Option<String>,
    },
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
        std::env::set_var("SURFACER_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("SURFACER_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("SURFACER_VERBOSE", "1");
    }
    if cli.no_color {
        std::env::set_var("SURFACER_NO_COLOR", "1");
    }

    let result = match cli.command {
        Commands::Run {
            plan,
            base_url,
            out_dir,
            headed,
        } => {
            cli::run_cmd::run(
                plan.as_deref(),
                base_url.as_deref(),
                out_dir.as_deref(),
                headed,
            )
            .await
        }
        Commands::Plan { plan, base_url } => {
            cli::plan_cmd::run(plan.as_deref(), base_url.as_deref()).await
        }
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "surfacer", &mut std::io::stdout());
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
