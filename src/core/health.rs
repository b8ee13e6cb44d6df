/// Liveness status reported by the health endpoint
///
/// A `HealthStatus` is built fresh for every request and never stored. It
/// says the process is alive, not that the bot is doing useful work.

use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    /// Unix epoch seconds
    pub timestamp: i64,
    pub service: String,
}

impl HealthStatus {
    pub fn now(service: impl Into<String>) -> Self {
        Self {
            status: HealthState::Healthy,
            timestamp: Utc::now().timestamp(),
            service: service.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let status = HealthStatus {
            status: HealthState::Healthy,
            timestamp: 1_760_000_000,
            service: "enhanced-session-generator-bot".to_string(),
        };

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["timestamp"], 1_760_000_000);
        assert_eq!(value["service"], "enhanced-session-generator-bot");
    }

    #[test]
    fn test_now_uses_current_time() {
        let before = Utc::now().timestamp();
        let status = HealthStatus::now("bot");
        let after = Utc::now().timestamp();

        assert!(status.timestamp >= before && status.timestamp <= after);
        assert_eq!(status.status, HealthState::Healthy);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let json = r#"{"status":"degraded","timestamp":1,"service":"bot"}"#;
        assert!(serde_json::from_str::<HealthStatus>(json).is_err());
    }
}
