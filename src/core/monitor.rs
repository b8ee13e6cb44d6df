/// Restart monitor
///
/// One invocation is one cycle: check the unit, restart it once if it is not
/// active, wait for it to settle, check again. Nothing carries over between
/// cycles; cron provides the retry cadence.

use anyhow::Result;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::lock::{LockError, MonitorLock};
use crate::core::monitor_log::MonitorLog;
use crate::core::service::{ServiceManager, ServiceState};

/// How a cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Unit was active at the first check
    RunningNormally,
    /// Unit was down and came back after the restart
    Restarted,
    /// Unit was down and still is after the settle interval
    RestartFailed,
    /// Another invocation held the monitor lock; the unit was not touched
    Skipped,
}

impl MonitorOutcome {
    pub fn is_healthy(&self) -> bool {
        !matches!(self, MonitorOutcome::RestartFailed)
    }
}

impl fmt::Display for MonitorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorOutcome::RunningNormally => write!(f, "running normally"),
            MonitorOutcome::Restarted => write!(f, "restarted"),
            MonitorOutcome::RestartFailed => write!(f, "restart failed"),
            MonitorOutcome::Skipped => write!(f, "skipped, another monitor is running"),
        }
    }
}

pub struct RestartMonitor<M> {
    manager: M,
    unit: String,
    settle: Duration,
    log: MonitorLog,
}

impl<M: ServiceManager> RestartMonitor<M> {
    pub fn new(manager: M, unit: impl Into<String>, settle: Duration, log: MonitorLog) -> Self {
        Self {
            manager,
            unit: unit.into(),
            settle,
            log,
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Run one cycle while holding the monitor lock at `lock_path`
    ///
    /// When another invocation holds the lock the unit is neither queried nor
    /// restarted; a single `Monitor skipped` line is logged instead.
    pub async fn run_exclusive(&self, lock_path: &Path) -> Result<MonitorOutcome> {
        let _lock = match MonitorLock::acquire(lock_path) {
            Ok(lock) => lock,
            Err(e @ (LockError::AlreadyRunning { .. } | LockError::Held(_))) => {
                warn!(unit = %self.unit, "{}", e);
                self.log.append(&format!("Monitor skipped: {}", e))?;
                return Ok(MonitorOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        self.run_once().await
    }

    /// Run one Check/Restart cycle and record it in the monitor log
    ///
    /// Errors are only returned when the log itself cannot be written.
    pub async fn run_once(&self) -> Result<MonitorOutcome> {
        if self.check().await.is_active() {
            self.log.append(&format!("{} is running normally", self.unit))?;
            return Ok(MonitorOutcome::RunningNormally);
        }

        self.log
            .append(&format!("{} is not running. Attempting to restart...", self.unit))?;

        if let Err(e) = self.manager.restart(&self.unit).await {
            warn!(unit = %self.unit, "restart request failed: {}", e);
        }

        tokio::time::sleep(self.settle).await;

        if self.check().await.is_active() {
            info!(unit = %self.unit, "unit restarted");
            self.log
                .append(&format!("{} restarted successfully", self.unit))?;
            Ok(MonitorOutcome::Restarted)
        } else {
            warn!(unit = %self.unit, "unit still inactive after restart");
            self.log.append(&format!(
                "Failed to restart {}: still inactive after {}",
                self.unit,
                humantime::format_duration(self.settle)
            ))?;
            Ok(MonitorOutcome::RestartFailed)
        }
    }

    /// Query errors count as inactive
    async fn check(&self) -> ServiceState {
        match self.manager.query_active(&self.unit).await {
            Ok(state) => state,
            Err(e) => {
                warn!(unit = %self.unit, "status query failed: {}", e);
                ServiceState::Inactive
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::service::{MockServiceManager, ServiceError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn monitor(manager: MockServiceManager, dir: &TempDir) -> RestartMonitor<MockServiceManager> {
        let log = MonitorLog::new(dir.path().join("monitor.log"));
        RestartMonitor::new(manager, "telegram-bot", Duration::ZERO, log)
    }

    fn log_lines(dir: &TempDir) -> Vec<String> {
        std::fs::read_to_string(dir.path().join("monitor.log"))
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    /// Mock whose query answers follow `states` in order
    fn scripted(states: Vec<ServiceState>) -> (MockServiceManager, Arc<AtomicUsize>) {
        let restarts = Arc::new(AtomicUsize::new(0));
        let mut manager = MockServiceManager::new();

        let calls = AtomicUsize::new(0);
        let count = states.len();
        manager
            .expect_query_active()
            .times(count)
            .returning(move |_| Ok(states[calls.fetch_add(1, Ordering::SeqCst)]));

        let counter = restarts.clone();
        manager.expect_restart().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        (manager, restarts)
    }

    #[tokio::test]
    async fn test_active_unit_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let (manager, restarts) = scripted(vec![ServiceState::Active]);

        let outcome = monitor(manager, &dir).run_once().await.unwrap();

        assert_eq!(outcome, MonitorOutcome::RunningNormally);
        assert_eq!(restarts.load(Ordering::SeqCst), 0);
        let lines = log_lines(&dir);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("running normally"));
    }

    #[tokio::test]
    async fn test_inactive_unit_recovers() {
        let dir = TempDir::new().unwrap();
        let (manager, restarts) = scripted(vec![ServiceState::Inactive, ServiceState::Active]);

        let outcome = monitor(manager, &dir).run_once().await.unwrap();

        assert_eq!(outcome, MonitorOutcome::Restarted);
        assert_eq!(restarts.load(Ordering::SeqCst), 1);
        let lines = log_lines(&dir);
        assert!(lines.last().unwrap().contains("restarted successfully"));
    }

    #[tokio::test]
    async fn test_inactive_unit_fails_without_second_attempt() {
        let dir = TempDir::new().unwrap();
        let (manager, restarts) = scripted(vec![ServiceState::Inactive, ServiceState::Inactive]);

        let outcome = monitor(manager, &dir).run_once().await.unwrap();

        assert_eq!(outcome, MonitorOutcome::RestartFailed);
        assert!(!outcome.is_healthy());
        assert_eq!(restarts.load(Ordering::SeqCst), 1);
        let lines = log_lines(&dir);
        assert!(lines.last().unwrap().contains("Failed to restart telegram-bot"));
    }

    #[tokio::test]
    async fn test_manager_errors_count_as_inactive() {
        let dir = TempDir::new().unwrap();
        let mut manager = MockServiceManager::new();
        manager.expect_query_active().times(2).returning(|_| {
            Err(ServiceError::CommandFailed {
                command: "systemctl is-active telegram-bot".to_string(),
                status: "exit status: 1".to_string(),
                stderr: String::new(),
            })
        });
        manager.expect_restart().times(1).returning(|_| {
            Err(ServiceError::CommandFailed {
                command: "systemctl restart telegram-bot".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Access denied".to_string(),
            })
        });

        let outcome = monitor(manager, &dir).run_once().await.unwrap();
        assert_eq!(outcome, MonitorOutcome::RestartFailed);
    }

    #[tokio::test]
    async fn test_settle_interval_is_waited() {
        let dir = TempDir::new().unwrap();
        let (manager, _) = scripted(vec![ServiceState::Inactive, ServiceState::Active]);
        let log = MonitorLog::new(dir.path().join("monitor.log"));
        let monitor = RestartMonitor::new(manager, "telegram-bot", Duration::from_millis(50), log);

        let start = std::time::Instant::now();
        monitor.run_once().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_held_lock_skips_without_touching_unit() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("monitor.lock");
        let _held = MonitorLock::acquire(&lock_path).unwrap();

        let mut manager = MockServiceManager::new();
        manager.expect_query_active().times(0);
        manager.expect_restart().times(0);

        let outcome = monitor(manager, &dir).run_exclusive(&lock_path).await.unwrap();

        assert_eq!(outcome, MonitorOutcome::Skipped);
        assert!(outcome.is_healthy());
        let lines = log_lines(&dir);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Monitor skipped"));
    }

    #[tokio::test]
    async fn test_free_lock_runs_cycle_and_releases() {
        let dir = TempDir::new().unwrap();
        let lock_path = dir.path().join("monitor.lock");
        let (manager, _) = scripted(vec![ServiceState::Active]);

        let outcome = monitor(manager, &dir).run_exclusive(&lock_path).await.unwrap();

        assert_eq!(outcome, MonitorOutcome::RunningNormally);
        assert!(MonitorLock::acquire(&lock_path).is_ok());
    }

    #[tokio::test]
    async fn test_repeated_runs_only_append() {
        let dir = TempDir::new().unwrap();
        let (manager, _) = scripted(vec![ServiceState::Active; 3]);
        let monitor = monitor(manager, &dir);

        let mut snapshots = Vec::new();
        for _ in 0..3 {
            monitor.run_once().await.unwrap();
            snapshots.push(log_lines(&dir));
        }

        assert_eq!(snapshots[2].len(), 3);
        assert_eq!(snapshots[0][..], snapshots[2][..1]);
        assert_eq!(snapshots[1][..], snapshots[2][..2]);
    }
}
