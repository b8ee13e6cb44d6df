/// Provisioning output
///
/// Renders the files the host setup places on disk: the bot .env, the
/// systemd unit, the nginx site, the logrotate rule, the cron entry, the
/// sudoers rule for the monitor's restart and a botctl settings file.
/// Nothing here installs packages or touches system directories; files land
/// in an output directory and the report says where each one belongs.

pub mod templates;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::{
    AppConfig, DEFAULT_BOTCTL_PATH, DEFAULT_BOT_ENTRYPOINT, DEFAULT_HEALTH_HOST,
    DEFAULT_HEALTH_PORT, DEFAULT_INSTALL_DIR, DEFAULT_SERVICE_ID, DEFAULT_SERVICE_USER,
    DEFAULT_UNIT_NAME,
};

#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    pub service_user: String,
    pub install_dir: PathBuf,
    pub unit_name: String,
    pub service_id: String,
    pub botctl_path: PathBuf,
    pub bot_entrypoint: String,
    pub health_host: String,
    pub health_port: u16,
    pub domain: Option<String>,
}

impl Default for ProvisionPlan {
    fn default() -> Self {
        Self {
            service_user: DEFAULT_SERVICE_USER.to_string(),
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            unit_name: DEFAULT_UNIT_NAME.to_string(),
            service_id: DEFAULT_SERVICE_ID.to_string(),
            botctl_path: PathBuf::from(DEFAULT_BOTCTL_PATH),
            bot_entrypoint: DEFAULT_BOT_ENTRYPOINT.to_string(),
            health_host: DEFAULT_HEALTH_HOST.to_string(),
            health_port: DEFAULT_HEALTH_PORT,
            domain: None,
        }
    }
}

impl ProvisionPlan {
    /// Plan for `user`, installed under `/home/<user>/telegram-bot`, using the
    /// health and monitor settings from `config`
    pub fn from_config(config: &AppConfig, user: Option<String>, domain: Option<String>) -> Self {
        let defaults = Self::default();
        let (service_user, install_dir) = match user {
            Some(user) => {
                let dir = PathBuf::from("/home").join(&user).join("telegram-bot");
                (user, dir)
            }
            None => (defaults.service_user, defaults.install_dir),
        };

        Self {
            service_user,
            install_dir: config
                .working_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or(install_dir),
            unit_name: config.monitor.unit.clone(),
            service_id: config.health.service.clone(),
            health_host: config.health.host.clone(),
            health_port: config.health.port,
            domain,
            ..defaults
        }
    }

    /// Settings file the unit and cron entry point botctl at
    fn botctl_config(&self) -> Result<String> {
        let mut config = AppConfig {
            working_dir: Some(self.install_dir.to_string_lossy().to_string()),
            ..AppConfig::default()
        };
        config.health.host = self.health_host.clone();
        config.health.port = self.health_port;
        config.health.service = self.service_id.clone();
        config.monitor.unit = self.unit_name.clone();
        // cron runs the monitor as the service user
        config.monitor.use_sudo = true;

        toml::to_string_pretty(&config).context("Failed to serialize botctl settings")
    }

    pub fn render(&self) -> Result<Vec<RenderedFile>> {
        let unit = &self.unit_name;
        Ok(vec![
            RenderedFile {
                name: ".env".to_string(),
                target: self.install_dir.join(".env"),
                contents: templates::env_file(self),
                mode: Some(0o600),
            },
            RenderedFile {
                name: "botctl.toml".to_string(),
                target: self.install_dir.join("botctl.toml"),
                contents: self.botctl_config()?,
                mode: None,
            },
            RenderedFile {
                name: format!("{}.service", unit),
                target: PathBuf::from("/etc/systemd/system").join(format!("{}.service", unit)),
                contents: templates::systemd_unit(self),
                mode: None,
            },
            RenderedFile {
                name: format!("{}.nginx.conf", unit),
                target: PathBuf::from("/etc/nginx/sites-available").join(unit),
                contents: templates::nginx_site(self),
                mode: None,
            },
            RenderedFile {
                name: format!("{}.logrotate", unit),
                target: PathBuf::from("/etc/logrotate.d").join(unit),
                contents: templates::logrotate_rule(self),
                mode: None,
            },
            RenderedFile {
                name: format!("{}-monitor.cron", unit),
                target: PathBuf::from("/etc/cron.d").join(format!("{}-monitor", unit)),
                contents: templates::cron_entry(self),
                mode: None,
            },
            RenderedFile {
                name: format!("{}-monitor.sudoers", unit),
                target: PathBuf::from("/etc/sudoers.d").join(format!("{}-monitor", unit)),
                contents: templates::sudoers_rule(self),
                mode: Some(0o440),
            },
        ])
    }
}

#[derive(Debug, Clone)]
pub struct RenderedFile {
    /// File name inside the output directory
    pub name: String,
    /// Where the file goes on the host
    pub target: PathBuf,
    pub contents: String,
    /// Permission bits to set after writing, when the default umask is too loose
    pub mode: Option<u32>,
}

#[derive(Debug, Default)]
pub struct ProvisionReport {
    pub written: Vec<(PathBuf, PathBuf)>,
    pub skipped: Vec<PathBuf>,
}

/// Write every rendered file into `out_dir`
///
/// Existing files are left untouched unless `force` is set, so rerunning
/// never clobbers a filled-in .env.
pub fn write_files(plan: &ProvisionPlan, out_dir: &Path, force: bool) -> Result<ProvisionReport> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    let mut report = ProvisionReport::default();

    for file in plan.render()? {
        let path = out_dir.join(&file.name);

        if path.exists() && !force {
            report.skipped.push(path);
            continue;
        }

        fs::write(&path, &file.contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = file.mode {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(mode))
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        report.written.push((path, file.target));
    }

    Ok(report)
}
