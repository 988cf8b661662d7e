mod auth;
mod messages;
mod pages;
mod server_config;
mod web_server;
mod ws_handler;

use clap::Parser;
use common::config::{ConfigManager, FileContentConfigProvider};
use common::{log, logger};
use server_config::{DEFAULT_CONFIG_FILE, ServerConfig};

#[derive(Parser)]
#[command(name = "tictactoe_server")]
struct Args {
    /// YAML config; built-in defaults are used when the file does not exist.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    #[arg(long)]
    use_log_prefix: bool,

    /// Also log ignored moves and individual cell choices.
    #[arg(long)]
    verbose: bool,

    /// Print the built-in defaults as YAML and exit.
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let prefix = if args.use_log_prefix {
        Some("Server".to_string())
    } else {
        None
    };
    logger::init_logger(prefix, args.verbose);

    let config_manager: ConfigManager<FileContentConfigProvider, ServerConfig> =
        ConfigManager::from_yaml_file(&args.config);
    if args.print_default_config {
        print!("{}", config_manager.default_content()?);
        return Ok(());
    }

    let config = config_manager.get_config()?;
    log!(
        "Loaded config from {}: difficulty {:?}, computer delay {} ms",
        args.config,
        config.default_difficulty,
        config.computer_move_delay_ms
    );

    web_server::run_web_server(&config).await?;

    Ok(())
}
