use std::path::PathBuf;

use clap::{ArgAction, Parser};

use azurefuncs::config::{HandlerConfig, log_path};

#[derive(Parser)]
#[command(name = "azurefuncs")]
#[command(version, about = "Custom handler for Azure Functions")]
struct Cli {
    /// JSON configuration file
    #[arg(long, env = "AZUREFUNCS_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides FUNCTIONS_CUSTOMHANDLER_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Log to a file instead of stderr (defaults to the data directory)
    #[arg(long, num_args = 0..=1, value_name = "PATH")]
    log_file: Option<Option<PathBuf>>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = cli.log_file.map(|path| path.unwrap_or_else(log_path));
    let _guard = azurefuncs::logging::init(cli.verbose, cli.log_json, log_file.as_deref())?;

    let mut config = HandlerConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(azurefuncs::handler::server::run_server(config))?;

    Ok(())
}
