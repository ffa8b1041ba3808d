use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::{error, warn};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use ffmpeg_sandbox::config::Config;
use ffmpeg_sandbox::gateway;
use ffmpeg_sandbox::tools::ToolRegistry;

/// Sandboxed ffmpeg tool server
#[derive(Parser, Debug)]
#[command(name = "ffmpeg-sandbox", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (defaults to the platform config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the tools over HTTP
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List the available tools and their parameter schemas
    Tools {
        /// Print full JSON specs instead of names
        #[arg(long)]
        json: bool,
    },

    /// Call a single tool and print its result as JSON
    Call {
        /// Tool name, e.g. create_sandbox
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the JSON Schema of the config file
    Schema,
    /// Print the effective configuration as TOML
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "ffmpeg-sandbox", &mut io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            check_tool_on_path(&config.executor.tool);
            let registry = ToolRegistry::from_config(&config)?;
            gateway::run(&config.gateway, registry).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tools { json } => {
            let registry = ToolRegistry::from_config(&config)?;
            let mut out = io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut out, &registry.specs())?;
                writeln!(out)?;
            } else {
                for spec in registry.specs() {
                    let summary = spec.description.split(". ").next().unwrap_or_default();
                    writeln!(out, "{:<28} {summary}", spec.name)?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Call { tool, args } => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            if tool == "run_command" {
                check_tool_on_path(&config.executor.tool);
            }
            let registry = ToolRegistry::from_config(&config)?;
            let result = registry.call(&tool, args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Config { action } => {
            match action {
                ConfigAction::Schema => {
                    println!("{}", serde_json::to_string_pretty(&Config::json_schema())?);
                }
                ConfigAction::Show => print!("{}", toml::to_string_pretty(&config)?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completions { .. } => Ok(ExitCode::SUCCESS),
    }
}

/// Commands still run without the binary on PATH; they fail at spawn time.
fn check_tool_on_path(tool: &str) {
    if let Err(e) = which::which(tool) {
        warn!(tool, "not found on PATH: {e}");
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::rfc_3339())
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
