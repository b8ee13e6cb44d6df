pub mod config;
pub mod health;
pub mod lock;
pub mod monitor;
pub mod monitor_log;
pub mod probe;
pub mod service;

pub use config::ConfigManager;
pub use health::{HealthState, HealthStatus};
pub use lock::{LockError, MonitorLock};
pub use monitor::{MonitorOutcome, RestartMonitor};
pub use monitor_log::{MonitorLog, MonitorLogEntry};
pub use probe::HealthProbe;
pub use service::{ServiceManager, ServiceState, SystemctlManager};
