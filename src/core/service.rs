/// Host service manager integration
///
/// The monitor only needs two capabilities from the host: asking whether a
/// unit is active and asking for it to be restarted. `ServiceManager` is that
/// seam; `SystemctlManager` implements it by shelling out to systemd.

use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use tokio::process::Command;

/// Observed state of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Active,
    Inactive,
}

impl ServiceState {
    pub fn is_active(&self) -> bool {
        matches!(self, ServiceState::Active)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Active => write!(f, "active"),
            ServiceState::Inactive => write!(f, "inactive"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// Whether the unit is currently active
    async fn query_active(&self, unit: &str) -> Result<ServiceState, ServiceError>;

    /// Request a restart; returns once the manager accepted the request
    async fn restart(&self, unit: &str) -> Result<(), ServiceError>;
}

/// systemd via the `systemctl` binary
#[derive(Debug, Clone)]
pub struct SystemctlManager {
    program: String,
    use_sudo: bool,
}

impl SystemctlManager {
    pub fn new(use_sudo: bool) -> Self {
        Self {
            program: "systemctl".to_string(),
            use_sudo,
        }
    }

    /// Use a different binary in place of `systemctl`
    pub fn with_program(program: impl Into<String>, use_sudo: bool) -> Self {
        Self {
            program: program.into(),
            use_sudo,
        }
    }

    fn restart_command(&self, unit: &str) -> Command {
        let mut cmd = if self.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg("-n").arg(&self.program);
            cmd
        } else {
            Command::new(&self.program)
        };
        cmd.args(["restart", unit]);
        cmd
    }
}

impl Default for SystemctlManager {
    fn default() -> Self {
        Self::new(false)
    }
}

#[async_trait]
impl ServiceManager for SystemctlManager {
    async fn query_active(&self, unit: &str) -> Result<ServiceState, ServiceError> {
        // is-active exits 0 only for "active"; every other state is non-zero
        let status = Command::new(&self.program)
            .args(["is-active", "--quiet", unit])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| ServiceError::Spawn {
                command: format!("{} is-active {}", self.program, unit),
                source,
            })?;

        Ok(if status.success() {
            ServiceState::Active
        } else {
            ServiceState::Inactive
        })
    }

    async fn restart(&self, unit: &str) -> Result<(), ServiceError> {
        let command = format!("{} restart {}", self.program, unit);
        let output = self
            .restart_command(unit)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ServiceError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ServiceError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}
