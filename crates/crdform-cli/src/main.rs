//! crdform CLI - Kubernetes custom resources as typed configuration blocks

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod display;
mod document;
mod error;
mod exit_codes;

use commands::Settings;
use commands::schema::BlockArg;

#[derive(Parser)]
#[command(name = "crdform")]
#[command(author = "crdform Contributors")]
#[command(version)]
#[command(about = "Manage Kubernetes custom resources as typed configuration blocks", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Provider configuration file (default: <config dir>/crdform/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Kubeconfig file
    #[arg(long, global = true, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// Kubeconfig context
    #[arg(long, global = true, env = "CRDFORM_CONTEXT")]
    context: Option<String>,

    /// Additional CRD file or directory (repeatable)
    #[arg(long = "crds", global = true)]
    crds: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available resource types
    Types {
        /// Only show type names containing this string
        #[arg(long)]
        filter: Option<String>,
    },

    /// Print the schema of a block type as JSON
    Schema {
        /// Type name (`<type>_manifest` for the manifest block)
        type_name: String,

        /// Block to describe
        #[arg(long, value_enum)]
        block: Option<BlockArg>,
    },

    /// Validate a block document
    Validate {
        /// Block document (YAML with a `type` key)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Validate as a data source instead of a resource
        #[arg(long)]
        data: bool,
    },

    /// Render a block document as Kubernetes YAML
    Manifest {
        /// Block document (YAML with a `type` key)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },

    /// Create or update the object of a block document
    Apply {
        /// Block document (YAML with a `type` key)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// State file (read for updates, written afterwards)
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Refresh a state file from the cluster
    Read {
        /// State file
        #[arg(long)]
        state: PathBuf,
    },

    /// Delete the object recorded in a state file
    Delete {
        /// State file
        #[arg(long)]
        state: PathBuf,
    },

    /// Import an existing object
    Import {
        /// Resource type name
        type_name: String,

        /// `<namespace>/<name>`, or `<name>` for cluster-scoped types
        id: String,

        /// State file to write
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Read an object through its data source
    Get {
        /// Resource type name
        type_name: String,

        /// Object name
        name: String,

        /// Namespace (default: default)
        #[arg(short, long)]
        namespace: Option<String>,
    },
}

fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_env("CRDFORM_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> error::Result<()> {
    let settings = Settings {
        config: cli.config,
        kubeconfig: cli.kubeconfig,
        context: cli.context,
        crds: cli.crds,
    };

    match cli.command {
        Commands::Types { filter } => commands::types::run(&settings, filter.as_deref()),

        Commands::Schema { type_name, block } => {
            commands::schema::run(&settings, &type_name, block)
        }

        Commands::Validate { file, data } => commands::validate::run(&settings, &file, data),

        Commands::Manifest { file } => commands::manifest::run(&settings, &file),

        Commands::Apply { file, state } => {
            commands::apply::run(&settings, &file, state.as_deref()).await
        }

        Commands::Read { state } => commands::read::run(&settings, &state).await,

        Commands::Delete { state } => commands::delete::run(&settings, &state).await,

        Commands::Import {
            type_name,
            id,
            state,
        } => commands::import::run(&settings, &type_name, &id, state.as_deref()).await,

        Commands::Get {
            type_name,
            name,
            namespace,
        } => commands::get::run(&settings, &type_name, &name, namespace.as_deref()).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(e) = run(cli).await {
        let code = e.exit_code();
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(code);
    }

    Ok(())
}
