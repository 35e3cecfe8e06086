#![forbid(unsafe_code)]

mod cmd;
mod output;
mod store;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use pubview_core::config::{ConfigError, load_config};
use pubview_core::endpoint::EndpointError;
use pubview_core::error::ErrorCode;
use pubview_core::fetch::FetchError;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "pubview: trade-publication message viewer",
    long_about = None
)]
struct Cli {
    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format.
    #[arg(long, global = true, value_enum, value_name = "FORMAT")]
    format: Option<OutputMode>,

    /// Config file to use instead of the default lookup.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Print the request URL for a position",
        long_about = "Print the URL that `keys` and `table` would request for a position id.",
        after_help = "EXAMPLES:\n    # URL for the default api-version\n    pubview url POS-123\n\n    # Another version and host\n    pubview url POS-123 --api-version 2 --base-url https://pubs.example/api/msg"
    )]
    Url(cmd::url::UrlArgs),

    #[command(
        about = "List message keys by version",
        long_about = "Fetch the publication messages for a position and list their keys grouped by version.",
        after_help = "EXAMPLES:\n    # Keys from content.key\n    pubview keys POS-123\n\n    # Keys stored on the envelope, without saving the response\n    pubview keys POS-123 --key-path envelope --no-store\n\n    # Emit machine-readable output\n    pubview keys POS-123 --json"
    )]
    Keys(cmd::keys::KeysArgs),

    #[command(
        about = "Show the time-ordered message table",
        long_about = "Fetch (or read) the publication messages for a position and render them ordered by message timestamp.",
        after_help = "EXAMPLES:\n    # Fetch and render\n    pubview table POS-123\n\n    # Render a saved response body\n    pubview table --input response.json\n\n    # Re-render the last stored response\n    pubview table POS-123 --cached --timezone local"
    )]
    Table(cmd::table::TableArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("PUBVIEW_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "pubview=debug,pubview_core=debug,info"
        } else {
            "pubview=info,pubview_core=info,warn"
        })
    });

    let format = env::var("PUBVIEW_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Attach the machine code for errors the core knows about.
fn cli_error(err: &anyhow::Error) -> CliError {
    if let Some(fetch) = err.downcast_ref::<FetchError>() {
        return CliError::from(fetch);
    }

    let message = format!("{err:#}");
    let code = if let Some(config) = err.downcast_ref::<ConfigError>() {
        config.code()
    } else if let Some(endpoint) = err.downcast_ref::<EndpointError>() {
        endpoint.code()
    } else if err.downcast_ref::<std::io::Error>().is_some() {
        ErrorCode::InputReadFailed
    } else {
        return CliError::new(message);
    };
    CliError::with_code(message, code)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let project_root = env::current_dir()?;
    let config = load_config(cli.config.as_deref(), &project_root)?;
    let output =
        output::resolve_output_mode(cli.format, cli.json, config.display.output.as_deref());
    debug!(?output, "resolved output mode");

    let ctx = cmd::Context { config, output };
    match &cli.command {
        Commands::Url(args) => cmd::url::run_url(args, &ctx),
        Commands::Keys(args) => cmd::keys::run_keys(args, &ctx),
        Commands::Table(args) => cmd::table::run_table(args, &ctx),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Config may not have loaded, so only flags and env pick the mode here.
            let mode = output::resolve_output_mode(cli.format, cli.json, None);
            if let Err(render_err) = render_error(mode, &cli_error(&err)) {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_and_after_subcommand() {
        let cli = Cli::parse_from(["pubview", "--json", "url", "P1"]);
        assert!(cli.json);
        let cli = Cli::parse_from(["pubview", "url", "P1", "--json"]);
        assert!(cli.json);
    }

    #[test]
    fn format_flag_parses_value_enum() {
        let cli = Cli::parse_from(["pubview", "table", "--input", "x.json", "--format", "text"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["pubview", "keys", "P1", "--config", "/tmp/c.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn keys_defaults_to_content_key_path() {
        let cli = Cli::parse_from(["pubview", "keys", "P1"]);
        let Commands::Keys(args) = cli.command else {
            panic!("expected keys");
        };
        assert_eq!(args.key_path, cmd::keys::KeyPath::Content);
        assert!(!args.remote.no_store);
        assert!(args.remote.max_retries.is_none());
    }

    #[test]
    fn keys_accepts_remote_overrides() {
        let cli = Cli::parse_from([
            "pubview",
            "keys",
            "P1",
            "--key-path",
            "envelope",
            "--no-store",
            "--max-retries",
            "5",
            "--api-version",
            "2",
        ]);
        let Commands::Keys(args) = cli.command else {
            panic!("expected keys");
        };
        assert_eq!(args.key_path, cmd::keys::KeyPath::Envelope);
        assert!(args.remote.no_store);
        assert_eq!(args.remote.max_retries, Some(5));
        assert_eq!(args.remote.endpoint.api_version, Some(2));
    }

    #[test]
    fn table_requires_position_unless_input() {
        assert!(Cli::try_parse_from(["pubview", "table"]).is_err());
        assert!(Cli::try_parse_from(["pubview", "table", "--input", "r.json"]).is_ok());
        assert!(Cli::try_parse_from(["pubview", "table", "P1", "--cached"]).is_ok());
    }

    #[test]
    fn table_input_conflicts_with_cached() {
        assert!(Cli::try_parse_from(["pubview", "table", "P1", "--input", "r.json", "--cached"]).is_err());
    }

    #[test]
    fn fetch_errors_keep_their_message() {
        let err = anyhow::Error::from(FetchError::Authentication);
        let cli_err = cli_error(&err);
        assert_eq!(cli_err.error, "Authentication failed");
        assert_eq!(cli_err.code, Some("E1001"));
    }

    #[test]
    fn endpoint_errors_carry_invalid_endpoint_code() {
        let err = anyhow::Error::from(EndpointError::UnsupportedApiVersion(9));
        assert_eq!(cli_error(&err).code, Some(ErrorCode::InvalidEndpoint.code()));
    }

    #[test]
    fn context_wrapped_io_errors_are_input_failures() {
        use anyhow::Context as _;
        let err = std::fs::read_to_string("/definitely/not/here.json")
            .context("Failed to read /definitely/not/here.json")
            .unwrap_err();
        let cli_err = cli_error(&err);
        assert_eq!(cli_err.code, Some(ErrorCode::InputReadFailed.code()));
        assert!(cli_err.error.starts_with("Failed to read"));
    }
}
