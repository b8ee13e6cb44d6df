/// Helper utilities for botctl

use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::utils::WORKING_DIR_ENV;

/// Resolve the bot's working directory
///
/// Order: `BOT_HOME`, then the configured `working_dir`, then the current directory.
pub fn resolve_working_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Ok(home) = std::env::var(WORKING_DIR_ENV) {
        if !home.trim().is_empty() {
            return Ok(PathBuf::from(home));
        }
    }

    if let Some(dir) = configured {
        return Ok(PathBuf::from(dir));
    }

    std::env::current_dir().context("Failed to get current directory")
}

/// Join a possibly relative path onto the working directory
pub fn resolve_path<P: AsRef<Path>>(working_dir: &Path, path: P) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    }
}

/// Load a .env file into the process environment
///
/// Returns `Ok(false)` when the file does not exist. Variables already set in
/// the environment win over the file.
pub fn load_env_file(path: &Path) -> Result<bool, dotenv::Error> {
    if !path.exists() {
        return Ok(false);
    }
    dotenv::from_path(path)?;
    Ok(true)
}

/// Mask sensitive data (show only first and last N characters)
pub fn mask_sensitive(value: &str, visible_chars: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= visible_chars * 2 {
        "*".repeat(chars.len())
    } else {
        let start: String = chars[..visible_chars].iter().collect();
        let end: String = chars[chars.len() - visible_chars..].iter().collect();
        format!("{}...{}", start, end)
    }
}

/// Whether a .env key holds a secret that must not be printed
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_uppercase();
    ["TOKEN", "SECRET", "PASSWORD", "KEY"]
        .iter()
        .any(|marker| key.contains(marker))
}

fn bot_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{5,}:[A-Za-z0-9_-]{35,}$").expect("valid bot token regex"))
}

/// Validate a Telegram bot token (`<bot id>:<secret>`)
pub fn is_valid_bot_token(token: &str) -> bool {
    bot_token_regex().is_match(token)
}

/// Validate a Redis connection URL (basic check)
pub fn is_valid_redis_url(url: &str) -> bool {
    ["redis://", "rediss://", "unix://"]
        .iter()
        .any(|scheme| url.starts_with(scheme) && url.len() > scheme.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive() {
        let token = "5e7f294e4c92a9aa661fae8d347d832d";
        let masked = mask_sensitive(token, 4);
        assert_eq!(masked, "5e7f...832d");
        assert_eq!(mask_sensitive("short", 4), "*****");
    }

    #[test]
    fn test_is_sensitive_key() {
        assert!(is_sensitive_key("BOT_TOKEN"));
        assert!(is_sensitive_key("api_key"));
        assert!(!is_sensitive_key("OWNER_ID"));
        assert!(!is_sensitive_key("LOG_LEVEL"));
    }

    #[test]
    fn test_is_valid_bot_token() {
        assert!(is_valid_bot_token(
            "123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw-"
        ));
        assert!(!is_valid_bot_token("your_bot_token_here"));
        assert!(!is_valid_bot_token("123456789:short"));
    }

    #[test]
    fn test_is_valid_redis_url() {
        assert!(is_valid_redis_url("redis://localhost:6379/0"));
        assert!(is_valid_redis_url("rediss://cache.internal:6380"));
        assert!(!is_valid_redis_url("redis://"));
        assert!(!is_valid_redis_url("http://localhost:6379"));
    }

    #[test]
    fn test_load_env_file() {
        let dir = tempfile::TempDir::new().unwrap();

        assert!(!load_env_file(&dir.path().join("absent.env")).unwrap());

        let good = dir.path().join("good.env");
        std::fs::write(&good, "# comment\nBOTCTL_HELPERS_TEST_LEVEL=WARNING\n").unwrap();
        assert!(load_env_file(&good).unwrap());
        assert_eq!(std::env::var("BOTCTL_HELPERS_TEST_LEVEL").unwrap(), "WARNING");

        let bad = dir.path().join("bad.env");
        std::fs::write(&bad, "this line has no assignment\n").unwrap();
        assert!(load_env_file(&bad).is_err());
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/srv/bot");
        assert_eq!(resolve_path(base, "logs/a.log"), PathBuf::from("/srv/bot/logs/a.log"));
        assert_eq!(resolve_path(base, "/var/log/a.log"), PathBuf::from("/var/log/a.log"));
    }
}
