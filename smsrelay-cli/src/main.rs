mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::handlers::{self, Session};
use smsrelay_core::models::LogLevel;

#[derive(Parser)]
#[command(name = "smsrelay")]
#[command(version)]
#[command(about = "Lease virtual numbers from an SMS-relay service and wait for verification codes")]
struct Cli {
    /// API key for the relay service (falls back to SMSRELAY_API_KEY, then the config file)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Override the relay service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Path to configuration file (default: ~/.config/smsrelay/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Logging verbosity
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Print status events as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lease a number from the relay service
    ///
    /// Examples:
    ///   smsrelay number
    ///   smsrelay number --card-type physical
    ///   smsrelay number --phone 13800000000
    Number {
        /// Lease this specific number (leave out for any available number)
        #[arg(short, long)]
        phone: Option<String>,

        /// Card type: physical, virtual or any (unrecognized values mean any)
        #[arg(long, default_value = "any")]
        card_type: String,
    },

    /// Wait for an SMS on a leased number (Ctrl+C cancels)
    ///
    /// Polls up to 12 times, 5 seconds apart.
    Sms {
        /// Leased phone number
        #[arg(short, long)]
        phone: String,

        /// Keyword the SMS must contain
        #[arg(short, long, default_value = "")]
        keyword: String,
    },

    /// Release a leased number
    Release {
        /// Phone number to release
        #[arg(short, long)]
        phone: String,
    },

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the effective configuration (API key masked)
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli::config::resolve_config_path(cli.config.as_deref())?;
    let mut config = cli::config::load_config(&config_path)?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }

    let level = cli.log_level.unwrap_or(config.log_level);
    if let Err(e) = smsrelay_core::services::init_logging(level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match cli.command {
        Commands::Config { init, show } => {
            if init {
                handlers::handle_config_init(&config_path).await?;
            } else if show {
                handlers::handle_config_show(&config, &config_path)?;
            } else {
                println!("Config command requires --init or --show");
                println!("Usage: smsrelay config --init | --show [--config PATH]");
            }
        }
        Commands::Number { phone, card_type } => {
            let session = Session::new(&config, cli.api_key, cli.json)?;
            handlers::handle_number(&session, phone, &card_type).await?;
        }
        Commands::Sms { phone, keyword } => {
            let session = Session::new(&config, cli.api_key, cli.json)?;
            handlers::handle_sms(&session, &phone, &keyword).await?;
        }
        Commands::Release { phone } => {
            let session = Session::new(&config, cli.api_key, cli.json)?;
            handlers::handle_release(&session, &phone).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_defaults() {
        let cli = Cli::try_parse_from(["smsrelay", "number"]).unwrap();
        match cli.command {
            Commands::Number { phone, card_type } => {
                assert_eq!(phone, None);
                assert_eq!(card_type, "any");
            }
            _ => panic!("expected number command"),
        }
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_sms_with_global_flags() {
        let cli = Cli::try_parse_from([
            "smsrelay",
            "sms",
            "--phone",
            "13800000000",
            "--keyword",
            "Acme",
            "--api-key",
            "k",
            "--json",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("k"));
        assert!(cli.json);
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
        match cli.command {
            Commands::Sms { phone, keyword } => {
                assert_eq!(phone, "13800000000");
                assert_eq!(keyword, "Acme");
            }
            _ => panic!("expected sms command"),
        }
    }

    #[test]
    fn test_sms_requires_phone() {
        assert!(Cli::try_parse_from(["smsrelay", "sms"]).is_err());
        assert!(Cli::try_parse_from(["smsrelay", "release"]).is_err());
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        assert!(Cli::try_parse_from(["smsrelay", "number", "--log-level", "loud"]).is_err());
    }
}
