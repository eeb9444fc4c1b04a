use clap::Parser;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::File;

use supportchat::core::auth::{AuthContext, TokenStore};
use supportchat::core::config::{self, CliOverrides, SupportChatConfig};
use supportchat::tui;

#[derive(Parser)]
#[command(name = "supportchat", about = "Terminal client for the campus support chatbot")]
struct Args {
    /// Chat server URL (overrides config and SUPPORTCHAT_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Email domain accounts must belong to
    #[arg(long)]
    email_domain: Option<String>,

    /// Forget the stored login token and exit
    #[arg(long)]
    logout: bool,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // A broken config file must not keep the client from starting.
    let (file_config, config_error) = match config::load_config() {
        Ok(c) => (c, None),
        Err(e) => (SupportChatConfig::default(), Some(e)),
    };
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            base_url: args.base_url,
            email_domain: args.email_domain,
        },
    );

    // Stdout belongs to the TUI, so logs go to a file.
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(resolved.log_level, log_config, log_file);
    }

    if let Some(e) = config_error {
        log::warn!("Ignoring config file: {}", e);
        eprintln!("supportchat: ignoring config file ({e}), using defaults");
    }

    if args.logout {
        AuthContext::new(TokenStore::default_location()).clear();
        log::info!("Stored token removed");
        println!("Logged out.");
        return Ok(());
    }

    log::info!("Support chat starting up against {}", resolved.base_url);

    tui::run(resolved)
}
