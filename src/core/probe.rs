/// Health endpoint probing

use anyhow::{Context, Result};
use reqwest::Client;

use crate::core::health::{HealthState, HealthStatus};
use crate::utils::PROBE_TIMEOUT;

pub struct HealthProbe {
    client: Client,
}

#[derive(Debug)]
pub struct ProbeResult {
    pub success: bool,
    pub status_code: Option<u16>,
    pub health: Option<HealthStatus>,
    pub response_time_ms: u128,
    pub error: Option<String>,
}

impl HealthProbe {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    /// GET the liveness endpoint; transport failures are reported in the result
    pub async fn check(&self, url: &str) -> ProbeResult {
        let start = std::time::Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                return ProbeResult {
                    success: false,
                    status_code: None,
                    health: None,
                    response_time_ms: start.elapsed().as_millis(),
                    error: Some(format!("Request failed: {}", e)),
                };
            }
        };

        let status = response.status();

        if !status.is_success() {
            return ProbeResult {
                success: false,
                status_code: Some(status.as_u16()),
                health: None,
                response_time_ms: start.elapsed().as_millis(),
                error: Some(format!("HTTP {}", status)),
            };
        }

        let parsed = response.json::<HealthStatus>().await;
        let elapsed = start.elapsed().as_millis();

        match parsed {
            Ok(health) => ProbeResult {
                success: health.status == HealthState::Healthy,
                status_code: Some(status.as_u16()),
                error: None,
                health: Some(health),
                response_time_ms: elapsed,
            },
            Err(e) => ProbeResult {
                success: false,
                status_code: Some(status.as_u16()),
                health: None,
                response_time_ms: elapsed,
                error: Some(format!("Invalid health response: {}", e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_failed_result() {
        let probe = HealthProbe::new().unwrap();

        // Bind then drop to get a loopback port with nothing listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = probe.check(&format!("http://127.0.0.1:{}/health", port)).await;
        assert!(!result.success);
        assert!(result.status_code.is_none());
        assert!(result.error.unwrap().starts_with("Request failed"));
    }
}
