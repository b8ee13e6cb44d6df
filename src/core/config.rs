/// Bot environment management for .env files
///
/// Handles reading, writing, and validating the Telegram bot configuration

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::{
    is_sensitive_key, is_valid_bot_token, is_valid_redis_url, mask_sensitive, BOT_LOG_LEVELS,
};

#[derive(Debug, Clone)]
pub struct ConfigValue {
    pub key: String,
    pub value: String,
    pub comment: Option<String>,
}

pub struct ConfigManager {
    env_file: PathBuf,
    config: HashMap<String, ConfigValue>,
}

impl ConfigManager {
    /// Load configuration from .env file
    pub fn load<P: AsRef<Path>>(env_file: P) -> Result<Self> {
        let env_file = env_file.as_ref().to_path_buf();

        if !env_file.exists() {
            return Err(anyhow!(".env file not found at {}", env_file.display()));
        }

        let content = fs::read_to_string(&env_file)
            .context("Failed to read .env file")?;

        let mut config = HashMap::new();
        let mut current_comment = None;

        for line in content.lines() {
            let line = line.trim();

            if line.starts_with('#') {
                current_comment = Some(line.trim_start_matches('#').trim().to_string());
                continue;
            }

            if line.is_empty() {
                current_comment = None;
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().trim_start_matches("export ").trim().to_string();
                let value = unquote(value.trim()).to_string();

                config.insert(
                    key.clone(),
                    ConfigValue {
                        key,
                        value,
                        comment: current_comment.take(),
                    },
                );
            }
        }

        Ok(Self { env_file, config })
    }

    /// Save configuration to .env file
    ///
    /// Existing lines keep their position; keys added with `set` are appended.
    pub fn save(&self) -> Result<()> {
        let mut lines = Vec::new();
        let mut written = std::collections::HashSet::new();

        let original = fs::read_to_string(&self.env_file)?;
        for line in original.lines() {
            let line_trimmed = line.trim();

            if line_trimmed.starts_with('#') || line_trimmed.is_empty() {
                lines.push(line.to_string());
            } else if let Some((key, _)) = line_trimmed.split_once('=') {
                let key = key.trim().trim_start_matches("export ").trim();
                if let Some(value) = self.config.get(key) {
                    lines.push(format!("{}={}", key, value.value));
                    written.insert(key.to_string());
                } else {
                    lines.push(line.to_string());
                }
            }
        }

        for key in self.keys() {
            if written.contains(&key) {
                continue;
            }
            if let Some(value) = self.config.get(&key) {
                if let Some(comment) = &value.comment {
                    lines.push(format!("# {}", comment));
                }
                lines.push(format!("{}={}", key, value.value));
            }
        }

        let mut contents = lines.join("\n");
        contents.push('\n');

        fs::write(&self.env_file, contents)
            .context("Failed to write .env file")?;

        Ok(())
    }

    /// Get a configuration value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .map(|v| v.value.as_str())
            .filter(|v| !v.is_empty())
    }

    /// Set a configuration value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        if let Some(existing) = self.config.get_mut(&key) {
            existing.value = value;
        } else {
            self.config.insert(
                key.clone(),
                ConfigValue {
                    key,
                    value,
                    comment: None,
                },
            );
        }
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    /// Typed view of the bot settings, with the bot's own defaults applied
    pub fn bot_settings(&self) -> BotSettings {
        BotSettings {
            owner_id: self.get("OWNER_ID").and_then(|v| v.parse().ok()).unwrap_or(0),
            redis_url: self.get("REDIS_URL").map(|s| s.to_string()),
            database_url: self.get("DATABASE_URL").map(|s| s.to_string()),
            // The bot only enables rate limiting for a literal "true"; anything else disables it
            rate_limit_enabled: self
                .get("RATE_LIMIT_ENABLED")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            max_sessions_per_hour: self
                .get("MAX_SESSIONS_PER_HOUR")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            log_level: self.get("LOG_LEVEL").unwrap_or("INFO").to_string(),
            log_file: self.get("LOG_FILE").unwrap_or("bot.log").to_string(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        match self.get("BOT_TOKEN") {
            None => errors.push("BOT_TOKEN is not set".to_string()),
            Some(token) if !is_valid_bot_token(token) => {
                errors.push("BOT_TOKEN must look like <bot id>:<secret>".to_string())
            }
            Some(_) => {}
        }

        match self.get("OWNER_ID").map(|v| v.parse::<i64>()) {
            None => errors.push("OWNER_ID is not set".to_string()),
            Some(Ok(0)) => errors.push("OWNER_ID must not be 0".to_string()),
            Some(Err(_)) => errors.push("OWNER_ID must be an integer".to_string()),
            Some(Ok(_)) => {}
        }

        if let Some(url) = self.get("REDIS_URL") {
            if !is_valid_redis_url(url) {
                errors.push(format!("Invalid REDIS_URL: {}", url));
            }
        }

        if let Some(flag) = self.get("RATE_LIMIT_ENABLED") {
            if !flag.eq_ignore_ascii_case("true") && !flag.eq_ignore_ascii_case("false") {
                errors.push(format!("RATE_LIMIT_ENABLED must be true or false, got {}", flag));
            }
        }

        if let Some(max) = self.get("MAX_SESSIONS_PER_HOUR") {
            match max.parse::<u32>() {
                Ok(n) if n > 0 => {}
                _ => errors.push(format!(
                    "MAX_SESSIONS_PER_HOUR must be a positive integer, got {}",
                    max
                )),
            }
        }

        // Level names are looked up on Python's logging module, so case matters
        if let Some(level) = self.get("LOG_LEVEL") {
            if !BOT_LOG_LEVELS.contains(&level) {
                errors.push(format!(
                    "LOG_LEVEL must be one of {}, got {}",
                    BOT_LOG_LEVELS.join(", "),
                    level
                ));
            }
        }

        errors
    }

    /// Get all configuration keys
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.config.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Key/value pairs safe for display, secrets masked
    pub fn masked_entries(&self) -> Vec<(String, String)> {
        self.keys()
            .into_iter()
            .filter_map(|key| {
                let value = self.config.get(&key)?.value.clone();
                let display = if is_sensitive_key(&key) {
                    mask_sensitive(&value, 4)
                } else {
                    value
                };
                Some((key, display))
            })
            .collect()
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Settings the bot process reads from its environment
#[derive(Debug, Clone, PartialEq)]
pub struct BotSettings {
    pub owner_id: i64,
    pub redis_url: Option<String>,
    pub database_url: Option<String>,
    pub rate_limit_enabled: bool,
    pub max_sessions_per_hour: u32,
    pub log_level: String,
    pub log_file: String,
}
