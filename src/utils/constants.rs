/// Defaults for the bot host layout
///
/// Every value here can be overridden from the settings file
/// (see `AppConfig`); these are what a fresh provisioning run assumes.

use std::time::Duration;

/// Service identifier reported by the health endpoint
pub const DEFAULT_SERVICE_ID: &str = "enhanced-session-generator-bot";

/// systemd unit running the bot
pub const DEFAULT_UNIT_NAME: &str = "telegram-bot";

/// Health reporter bind address (loopback only)
pub const DEFAULT_HEALTH_HOST: &str = "127.0.0.1";
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Liveness route served by the health reporter
pub const HEALTH_PATH: &str = "/health";

/// Wait after a restart before the unit is checked again
pub const DEFAULT_SETTLE: &str = "10s";

/// Monitor log and lock, relative to the working directory
pub const DEFAULT_MONITOR_LOG: &str = "logs/monitor.log";
pub const DEFAULT_MONITOR_LOCK: &str = "logs/monitor.lock";

/// Bot environment file, relative to the working directory
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Environment variable overriding the working directory
pub const WORKING_DIR_ENV: &str = "BOT_HOME";

/// Timestamp layout used in monitor log lines
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Probe request timeout
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Provisioning defaults
pub const DEFAULT_SERVICE_USER: &str = "botuser";
pub const DEFAULT_INSTALL_DIR: &str = "/home/botuser/telegram-bot";
pub const DEFAULT_BOTCTL_PATH: &str = "/usr/local/bin/botctl";
pub const DEFAULT_BOT_ENTRYPOINT: &str = "improved_session_bot.py";
pub const MONITOR_CRON_SCHEDULE: &str = "*/5 * * * *";
pub const LOG_RETENTION_DAYS: u32 = 7;

/// Log levels accepted in the bot's LOG_LEVEL setting
pub const BOT_LOG_LEVELS: &[&str] = &["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Keys written to a fresh .env template, in order
pub const ENV_KEYS: &[&str] = &[
    "BOT_TOKEN",
    "OWNER_ID",
    "REDIS_URL",
    "DATABASE_URL",
    "RATE_LIMIT_ENABLED",
    "MAX_SESSIONS_PER_HOUR",
    "LOG_LEVEL",
    "LOG_FILE",
];
