//! Binary entry point for selfheal.
//!
//! This binary provides the CLI interface for the incident remediation
//! co-pilot.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use selfheal::Error;
use selfheal::cli::{
    AnalyzeCommand, ConfigCommand, FactsCommand, OutputFormat, PromptCommand, RetrieveCommand,
    ServeCommand, build_knowledge_store, build_pipeline, read_incident,
};
use selfheal::config::SelfhealConfig;
use selfheal::observability::{self, InitOptions, ObservabilityHandle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Selfheal - An incident remediation co-pilot for self-healing infrastructure.
#[derive(Parser)]
#[command(name = "selfheal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "SELFHEAL_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Collect metrics and print a Prometheus snapshot to stderr on exit.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Analyze an incident and print a remediation report.
    Analyze {
        /// Incident text (logs, alerts). Read from --file or stdin if omitted.
        incident: Option<String>,

        /// Read the incident from a file.
        #[arg(short, long, conflicts_with = "incident")]
        file: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Also print the prompt sent to the model.
        #[arg(long)]
        show_prompt: bool,
    },

    /// Show which knowledge facts match a query.
    Retrieve {
        /// The query text.
        query: String,

        /// Maximum number of facts.
        #[arg(short, default_value = "3")]
        k: usize,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the assembled prompt without calling the API.
    Prompt {
        /// Incident text.
        incident: String,
    },

    /// List the knowledge facts.
    Facts {
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },

    /// Run the HTTP shell.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value_t = selfheal::cli::DEFAULT_PORT)]
        port: u16,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let serving = matches!(cli.command, Commands::Serve { .. });
    let observability = match observability::init_from_config(
        &config,
        InitOptions {
            verbose: cli.verbose,
            metrics: cli.metrics || serving,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    let result = run_command(cli.command, config, observability.clone());

    if !serving {
        if let Some(snapshot) = observability.render_metrics() {
            eprintln!("{snapshot}");
        }
    }

    match result {
        Ok(code) => code,
        Err(Error::InvalidInput(message)) => {
            eprintln!("Warning: {message}");
            ExitCode::FAILURE
        },
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Loads configuration from `path` or the default location, then applies
/// environment overrides.
fn load_config(path: Option<&Path>) -> selfheal::Result<SelfhealConfig> {
    let config = match path {
        Some(path) => SelfhealConfig::load_from_file(path)?,
        None => SelfhealConfig::load_default(),
    };
    Ok(config.with_env_overrides())
}

/// Runs the selected command.
///
/// `analyze` exits with status 2 when a report could not be generated, after
/// printing the failure message in place of the report.
fn run_command(
    command: Commands,
    config: SelfhealConfig,
    observability: ObservabilityHandle,
) -> selfheal::Result<ExitCode> {
    let mut stdout = io::stdout().lock();

    match command {
        Commands::Analyze {
            incident,
            file,
            format,
            show_prompt,
        } => {
            let (pipeline, graph) = build_pipeline(&config)?;
            let incident = read_incident(incident, file.as_deref(), &mut io::stdin().lock())?;
            let analysis = AnalyzeCommand::new(format)
                .with_show_prompt(show_prompt || config.features.show_prompt)
                .execute(&pipeline, graph.as_deref(), &incident, &mut stdout)?;
            if analysis.outcome.is_report() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(2))
            }
        },
        Commands::Retrieve { query, k, format } => {
            let store = build_knowledge_store(&config);
            RetrieveCommand::new(format).execute(&store, &query, k, &mut stdout)?;
            Ok(ExitCode::SUCCESS)
        },
        Commands::Prompt { incident } => {
            let store = build_knowledge_store(&config);
            PromptCommand::new().execute(&store, &incident, config.retrieval.top_k, &mut stdout)?;
            Ok(ExitCode::SUCCESS)
        },
        Commands::Facts { format } => {
            let store = build_knowledge_store(&config);
            FactsCommand::new(format).execute(&store, &mut stdout)?;
            Ok(ExitCode::SUCCESS)
        },
        Commands::Config { show } => {
            ConfigCommand::new().execute(&config, show, &mut stdout)?;
            Ok(ExitCode::SUCCESS)
        },
        Commands::Serve { port } => {
            drop(stdout);
            ServeCommand::new()
                .with_port(port)
                .execute(config, observability)?;
            Ok(ExitCode::SUCCESS)
        },
    }
}
