mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackflow")]
#[command(about = "Environments, services, databases and pipelines as CloudFormation stacks", long_about = None)]
struct Cli {
    /// Configuration file (default: discovered from the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory whose templates take precedence over the bundled ones
    #[arg(long, global = true)]
    templates_dir: Option<PathBuf>,

    /// AWS region (default: configuration, then the AWS environment)
    #[arg(short, long, global = true)]
    region: Option<String>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage environments (network + compute cluster)
    #[command(subcommand)]
    Env(EnvCommands),
    /// Manage services
    #[command(subcommand)]
    Svc(SvcCommands),
    /// Manage service databases
    #[command(subcommand)]
    Db(DbCommands),
    /// Manage service pipelines
    #[command(subcommand)]
    Pipeline(PipelineCommands),
    /// Inspect and validate the bundled templates
    #[command(subcommand)]
    Templates(TemplateCommands),
    /// Print the version
    Version,
}

#[derive(Subcommand)]
pub enum EnvCommands {
    /// Create or update an environment
    Upsert {
        /// Environment name
        environment: String,
    },
    /// Delete an environment
    Terminate {
        /// Environment name
        environment: String,
    },
}

#[derive(Subcommand)]
pub enum SvcCommands {
    /// Deploy the service to an environment
    Deploy {
        /// Environment name
        environment: String,
        /// Service name (default: service.name, then repo.name)
        #[arg(short, long)]
        service: Option<String>,
        /// Code revision (default: repo.revision, then "latest")
        #[arg(short = 't', long)]
        revision: Option<String>,
    },
    /// Remove the service from an environment
    Terminate {
        environment: String,
        #[arg(short, long)]
        service: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Create or update the service database in an environment
    Upsert {
        environment: String,
        #[arg(short, long)]
        service: Option<String>,
    },
    /// Delete the service database in an environment
    Terminate {
        environment: String,
        #[arg(short, long)]
        service: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Create or update the service pipeline
    Upsert {
        #[arg(short, long)]
        service: Option<String>,
    },
    /// Delete the service pipeline
    Terminate {
        #[arg(short, long)]
        service: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TemplateCommands {
    /// List template identifiers
    List {
        /// Only identifiers starting with this prefix
        #[arg(short, long, default_value = "")]
        prefix: String,
    },
    /// Print a template
    Show {
        /// Template identifier (e.g. cloudformation/vpc.yml)
        id: String,
        /// Render with an empty context instead of printing the source
        #[arg(long)]
        rendered: bool,
    },
    /// Validate every stack template with the provider
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            let auth = e
                .downcast_ref::<stackflow_core::WorkflowError>()
                .is_some_and(|e| e.is_auth());
            if auth {
                eprintln!(
                    "{}",
                    "Check your AWS credentials and session (AWS_PROFILE, AWS_ACCESS_KEY_ID)"
                        .yellow()
                );
            }
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr. `--verbose` overrides `RUST_LOG`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let globals = commands::Globals {
        config: cli.config,
        templates_dir: cli.templates_dir,
        region: cli.region,
    };

    match cli.command {
        Commands::Version => {
            println!("stackflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Env(cmd) => commands::env::handle(&globals, cmd).await,
        Commands::Svc(cmd) => commands::svc::handle(&globals, cmd).await,
        Commands::Db(cmd) => commands::db::handle(&globals, cmd).await,
        Commands::Pipeline(cmd) => commands::pipeline::handle(&globals, cmd).await,
        Commands::Templates(cmd) => commands::templates::handle(&globals, cmd).await,
    }
}
