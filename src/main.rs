use anyhow::{bail, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use botctl::cli::{Cli, Commands, ConfigCommands};
use botctl::core::{
    ConfigManager, HealthProbe, MonitorLog, MonitorOutcome, RestartMonitor, ServiceManager,
    SystemctlManager,
};
use botctl::provision::{self, ProvisionPlan};
use botctl::utils::{load_env_file, resolve_path, AppConfig, DEFAULT_ENV_FILE};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let env_file = match &cli.env_file {
        Some(path) => path.clone(),
        None => resolve_path(&config.working_dir()?, DEFAULT_ENV_FILE),
    };

    // The bot's .env also sets LOG_LEVEL for botctl; a missing file is fine here
    let env_loaded = load_env_file(&env_file);
    botctl::logging::init();
    if let Err(e) = env_loaded {
        tracing::warn!("Failed to load {}: {}", env_file.display(), e);
    }

    match cli.command {
        #[cfg(feature = "server")]
        Commands::Serve { host, port, command } => {
            handle_serve(&config, host, port, command).await?;
        }
        Commands::Monitor { unit, settle } => {
            handle_monitor(&config, unit, settle).await?;
        }
        Commands::Status { unit } => {
            handle_status(&config, unit).await?;
        }
        Commands::Probe { url } => {
            handle_probe(&config, url).await?;
        }
        Commands::Logs { lines } => {
            handle_logs(&config, lines)?;
        }
        Commands::Config { command } => {
            handle_config(&env_file, command)?;
        }
        Commands::Provision { out, force, user, domain } => {
            handle_provision(&config, out, force, user, domain)?;
        }
    }

    Ok(())
}

#[cfg(feature = "server")]
async fn handle_serve(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
    command: Vec<String>,
) -> Result<()> {
    let mut health = config.health.clone();
    if let Some(host) = host {
        health.host = host;
    }
    if let Some(port) = port {
        health.port = port;
    }

    botctl::server::run(health.socket_addr()?, health.service, command).await
}

async fn handle_monitor(
    config: &AppConfig,
    unit: Option<String>,
    settle: Option<String>,
) -> Result<()> {
    let mut settings = config.monitor.clone();
    if let Some(unit) = unit {
        settings.unit = unit;
    }
    if let Some(settle) = settle {
        settings.settle = settle;
    }
    let settle = settings.settle_interval()?;

    let log = MonitorLog::new(config.monitor_log_path()?);
    let manager = SystemctlManager::new(settings.use_sudo);
    let monitor = RestartMonitor::new(manager, settings.unit, settle, log);
    let outcome = monitor.run_exclusive(&config.monitor_lock_path()?).await?;

    println!("{}: {}", monitor.unit(), outcome);

    if outcome == MonitorOutcome::RestartFailed {
        bail!("{} is still down after restart", monitor.unit());
    }

    Ok(())
}

async fn handle_status(config: &AppConfig, unit: Option<String>) -> Result<()> {
    let unit = unit.unwrap_or_else(|| config.monitor.unit.clone());
    let manager = SystemctlManager::new(config.monitor.use_sudo);
    let state = manager.query_active(&unit).await?;

    println!("{:<25} {:<15}", "Unit", "State");
    println!("{}", "-".repeat(40));
    println!("{:<25} {:<15}", unit, state);

    Ok(())
}

async fn handle_probe(config: &AppConfig, url: Option<String>) -> Result<()> {
    let url = url.unwrap_or_else(|| config.health.url());
    let probe = HealthProbe::new()?;

    println!("Probing {}...\n", url);
    let result = probe.check(&url).await;

    if result.success {
        println!("  ✓ Healthy ({}ms)", result.response_time_ms);
        if let Some(health) = result.health {
            println!("  Service:   {}", health.service);
            println!("  Timestamp: {}", health.timestamp);
        }
        Ok(())
    } else {
        let error = result.error.unwrap_or_default();
        println!("  ✗ Unhealthy: {}", error);
        bail!("Health check failed: {}", error)
    }
}

fn handle_logs(config: &AppConfig, lines: usize) -> Result<()> {
    let log = MonitorLog::new(config.monitor_log_path()?);
    let entries = log.tail(lines)?;

    if entries.is_empty() {
        println!("No monitor entries in {}", log.path().display());
        return Ok(());
    }

    for entry in entries {
        if entry.timestamp.is_empty() {
            println!("{}", entry.message);
        } else {
            println!("{}", entry);
        }
    }

    Ok(())
}

fn handle_config(env_file: &Path, command: ConfigCommands) -> Result<()> {
    let mut config = ConfigManager::load(env_file)?;

    match command {
        ConfigCommands::View => {
            println!("Configuration ({}):\n", config.env_file().display());
            for (key, value) in config.masked_entries() {
                println!("{}: {}", key, value);
            }

            let settings = config.bot_settings();
            println!();
            let rate_limiting = if settings.rate_limit_enabled { "Enabled" } else { "Disabled" };
            println!("Rate limiting: {}", rate_limiting);
            println!("Max sessions per hour: {}", settings.max_sessions_per_hour);
            println!("Log level: {}", settings.log_level);
        }
        ConfigCommands::Set { key, value } => {
            config.set(&key, value);
            config.save()?;
            println!("✓ Set {}", key);
        }
        ConfigCommands::Validate => {
            let errors = config.validate();

            if errors.is_empty() {
                println!("✓ Configuration is valid");
            } else {
                println!("✗ Configuration errors:");
                for error in &errors {
                    println!("  - {}", error);
                }
                bail!("{} configuration error(s)", errors.len());
            }
        }
    }

    Ok(())
}

fn handle_provision(
    config: &AppConfig,
    out: PathBuf,
    force: bool,
    user: Option<String>,
    domain: Option<String>,
) -> Result<()> {
    let plan = ProvisionPlan::from_config(config, user, domain);
    let report = provision::write_files(&plan, &out, force)?;

    println!("Provisioning files for {} in {}\n", plan.unit_name, out.display());
    for (path, target) in &report.written {
        println!("  ✓ {} -> {}", path.display(), target.display());
    }
    for path in &report.skipped {
        println!("  - {} exists, skipped (use --force to overwrite)", path.display());
    }

    println!("\nNext steps:");
    println!("  1. Fill in BOT_TOKEN and OWNER_ID in .env");
    println!("  2. Copy each file to the path shown above");
    println!("  3. systemctl daemon-reload && systemctl enable --now {}", plan.unit_name);
    println!(
        "  4. ln -s /etc/nginx/sites-available/{} /etc/nginx/sites-enabled/ && nginx -s reload",
        plan.unit_name
    );
    println!("  5. visudo -cf /etc/sudoers.d/{}-monitor", plan.unit_name);

    Ok(())
}
