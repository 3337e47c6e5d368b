mod cli; // Command implementations

use std::path::PathBuf;
use std::process::ExitCode;

use bloom_core::env::parse_bool;
use bloom_core::kernel::constants::{APP_NAME, APP_VERSION, ENV_DEBUG};
use clap::{Parser, Subcommand};
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

/// Bloom: application kernel for web projects
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Simple ping command for testing
    #[arg(long)]
    ping: bool,

    /// Log at debug level unless RUST_LOG says otherwise (also enabled by APP_DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the resolved application paths
    Paths {
        /// Project root
        #[arg(long, default_value = ".")]
        base: PathBuf,
    },
    /// Inspect the built configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Build the application and run one request through the HTTP kernel
    ServeOnce {
        /// Project root
        #[arg(long, default_value = ".")]
        base: PathBuf,
        #[arg(long, default_value = "GET")]
        method: String,
        #[arg(long, default_value = "/")]
        path: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the value under a dotted key
    Get {
        /// Dotted key, e.g. `app.locale`
        key: String,
        /// Project root
        #[arg(long, default_value = ".")]
        base: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let app_debug = std::env::var(ENV_DEBUG)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(false);
    let default_level = if verbose || app_debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Route `log` records from bloom-core into tracing before the subscriber exists
    if let Err(e) = LogTracer::init() {
        eprintln!("LogTracer init skipped: {}", e);
    }

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    init_logging(args.verbose);

    let result = match args.command {
        Some(Commands::Paths { base }) => cli::paths(&base),
        Some(Commands::Config {
            command: ConfigCommand::Get { key, base },
        }) => cli::config_get(&base, &key).await,
        Some(Commands::ServeOnce { base, method, path }) => cli::serve_once(&base, &method, &path).await,
        None => {
            println!("{} v{}", APP_NAME, APP_VERSION);
            println!("Run with --help to list the available commands.");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
