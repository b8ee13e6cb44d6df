/// CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Build timestamp injected at compile time
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
pub const VERSION_WITH_BUILD: &str =
    concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser, Debug)]
#[command(name = "botctl")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Settings file (default: ~/.config/botctl/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Bot .env file (default: <working dir>/.env)
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the health reporter, optionally supervising the bot process
    #[cfg(feature = "server")]
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Bot command to run alongside the reporter
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Check the bot unit once and restart it if it is down (run from cron)
    Monitor {
        /// systemd unit to watch
        #[arg(short, long)]
        unit: Option<String>,

        /// Wait after a restart before checking again (e.g. 10s)
        #[arg(short, long)]
        settle: Option<String>,
    },

    /// Show the bot unit's state
    Status {
        /// systemd unit to query
        #[arg(short, long)]
        unit: Option<String>,
    },

    /// Query the health endpoint
    Probe {
        /// Endpoint URL (default: from settings)
        #[arg(long)]
        url: Option<String>,
    },

    /// Show recent monitor log entries
    Logs {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "20")]
        lines: usize,
    },

    /// Bot .env management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Render host configuration files (.env, systemd, nginx, logrotate, cron)
    Provision {
        /// Output directory
        #[arg(short, long, default_value = "provision")]
        out: PathBuf,

        /// Overwrite files that already exist
        #[arg(short, long)]
        force: bool,

        /// Service account running the bot
        #[arg(short, long)]
        user: Option<String>,

        /// Public server name for the nginx site
        #[arg(short, long)]
        domain: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// View configuration with secrets masked
    View,

    /// Validate configuration
    Validate,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_monitor_args() {
        let cli = Cli::try_parse_from(["botctl", "monitor", "--unit", "session-bot", "-s", "5s"])
            .unwrap();
        match cli.command {
            Commands::Monitor { unit, settle } => {
                assert_eq!(unit.as_deref(), Some("session-bot"));
                assert_eq!(settle.as_deref(), Some("5s"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[cfg(feature = "server")]
    #[test]
    fn test_serve_trailing_command() {
        let cli = Cli::try_parse_from([
            "botctl",
            "--config",
            "/etc/botctl.toml",
            "serve",
            "--port",
            "9000",
            "--",
            "python",
            "improved_session_bot.py",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/botctl.toml")));
        match cli.command {
            Commands::Serve { host, port, command } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
                assert_eq!(command, ["python", "improved_session_bot.py"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_config_set_args() {
        let cli = Cli::try_parse_from([
            "botctl", "--env-file", "/srv/bot/.env", "config", "set", "LOG_LEVEL", "DEBUG",
        ])
        .unwrap();

        assert_eq!(cli.env_file, Some(PathBuf::from("/srv/bot/.env")));
        match cli.command {
            Commands::Config { command: ConfigCommands::Set { key, value } } => {
                assert_eq!(key, "LOG_LEVEL");
                assert_eq!(value, "DEBUG");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
