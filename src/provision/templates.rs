/// Host configuration templates
///
/// Pure renderers: every function takes the plan and returns file contents.

use std::fmt::Write;

use super::ProvisionPlan;
use crate::utils::{LOG_RETENTION_DAYS, MONITOR_CRON_SCHEDULE};

pub fn env_file(plan: &ProvisionPlan) -> String {
    let mut out = String::new();
    out.push_str("# Telegram bot configuration\n");
    out.push_str("# Generated by botctl; fill in the placeholders before starting the unit\n\n");
    out.push_str("# Bot Configuration\n");
    out.push_str("BOT_TOKEN=your_bot_token_here\n");
    out.push_str("OWNER_ID=0\n\n");
    out.push_str("# Redis Configuration (optional - for production rate limiting)\n");
    out.push_str("REDIS_URL=redis://localhost:6379/0\n\n");
    out.push_str("# Database (optional)\n");
    out.push_str("DATABASE_URL=\n\n");
    out.push_str("# Rate limiting\n");
    out.push_str("RATE_LIMIT_ENABLED=true\n");
    out.push_str("MAX_SESSIONS_PER_HOUR=5\n\n");
    out.push_str("# Logging\n");
    out.push_str("LOG_LEVEL=INFO\n");
    let _ = writeln!(out, "LOG_FILE={}/logs/bot.log", plan.install_dir.display());
    out
}

pub fn systemd_unit(plan: &ProvisionPlan) -> String {
    let dir = plan.install_dir.display();
    format!(
        "[Unit]
Description=Telegram bot ({service})
After=network-online.target redis-server.service
Wants=network-online.target

[Service]
Type=simple
User={user}
Group={user}
WorkingDirectory={dir}
EnvironmentFile={dir}/.env
ExecStart={botctl} --config {dir}/botctl.toml serve -- {dir}/venv/bin/python {dir}/{entry}
Restart=always
RestartSec=10
KillSignal=SIGTERM
TimeoutStopSec=30
StandardOutput=journal
StandardError=journal
NoNewPrivileges=true
PrivateTmp=true

[Install]
WantedBy=multi-user.target
",
        service = plan.service_id,
        user = plan.service_user,
        dir = dir,
        botctl = plan.botctl_path.display(),
        entry = plan.bot_entrypoint,
    )
}

pub fn nginx_site(plan: &ProvisionPlan) -> String {
    let server_name = plan.domain.as_deref().unwrap_or("_");
    format!(
        "server {{
    listen 80;
    server_name {server_name};

    location = /health {{
        proxy_pass http://{host}:{port}/health;
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_connect_timeout 5s;
        proxy_read_timeout 5s;
        access_log off;
    }}

    location / {{
        return 404;
    }}
}}
",
        server_name = server_name,
        host = plan.health_host,
        port = plan.health_port,
    )
}

pub fn logrotate_rule(plan: &ProvisionPlan) -> String {
    format!(
        "{dir}/logs/*.log {{
    daily
    rotate {days}
    compress
    delaycompress
    missingok
    notifempty
    copytruncate
    su {user} {user}
}}
",
        dir = plan.install_dir.display(),
        days = LOG_RETENTION_DAYS,
        user = plan.service_user,
    )
}

/// Runs as the service user so the monitor log stays owned by it; the
/// restart goes through `sudo -n`, allowed by `sudoers_rule`
pub fn cron_entry(plan: &ProvisionPlan) -> String {
    let dir = plan.install_dir.display();
    format!(
        "# Restart monitor for {unit}
SHELL=/bin/sh
PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin
{schedule} {user} {botctl} --config {dir}/botctl.toml monitor >/dev/null 2>&1
",
        unit = plan.unit_name,
        schedule = MONITOR_CRON_SCHEDULE,
        user = plan.service_user,
        botctl = plan.botctl_path.display(),
        dir = dir,
    )
}

/// Lets the service user restart the bot unit and nothing else
pub fn sudoers_rule(plan: &ProvisionPlan) -> String {
    format!(
        "# Allow the restart monitor to restart {unit}\n\
         {user} ALL=(root) NOPASSWD: /usr/bin/systemctl restart {unit}, \
         /bin/systemctl restart {unit}\n",
        unit = plan.unit_name,
        user = plan.service_user,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> ProvisionPlan {
        ProvisionPlan {
            domain: Some("bot.example.com".to_string()),
            ..ProvisionPlan::default()
        }
    }

    #[test]
    fn test_env_file_lists_every_key() {
        let rendered = env_file(&plan());
        for key in crate::utils::ENV_KEYS {
            assert!(rendered.contains(&format!("\n{}=", key)), "missing {}", key);
        }
    }

    #[test]
    fn test_systemd_unit_runs_bot_under_reporter() {
        let unit = systemd_unit(&plan());
        assert!(unit.contains("User=botuser"));
        assert!(unit.contains("EnvironmentFile=/home/botuser/telegram-bot/.env"));
        assert!(unit.contains(
            "ExecStart=/usr/local/bin/botctl \
             --config /home/botuser/telegram-bot/botctl.toml serve -- \
             /home/botuser/telegram-bot/venv/bin/python \
             /home/botuser/telegram-bot/improved_session_bot.py"
        ));
        assert!(unit.contains("Restart=always"));
    }

    #[test]
    fn test_nginx_proxies_health_only() {
        let site = nginx_site(&plan());
        assert!(site.contains("server_name bot.example.com;"));
        assert!(site.contains("proxy_pass http://127.0.0.1:8080/health;"));

        let catch_all = nginx_site(&ProvisionPlan::default());
        assert!(catch_all.contains("server_name _;"));
    }

    #[test]
    fn test_logrotate_and_cron() {
        let rule = logrotate_rule(&plan());
        assert!(rule.starts_with("/home/botuser/telegram-bot/logs/*.log {"));
        assert!(rule.contains("rotate 7"));

        let cron = cron_entry(&plan());
        let job = cron.lines().last().unwrap();
        assert!(job.starts_with("*/5 * * * * botuser /usr/local/bin/botctl"));
        assert!(job.contains(" monitor "));
    }

    #[test]
    fn test_cron_and_logrotate_share_the_service_user() {
        let plan = ProvisionPlan {
            service_user: "alice".to_string(),
            ..plan()
        };

        let cron = cron_entry(&plan);
        let cron_user = cron.lines().last().unwrap().split_whitespace().nth(5).unwrap();
        assert_eq!(cron_user, "alice");

        let rule = logrotate_rule(&plan);
        assert!(rule.contains("\n    su alice alice\n"));

        let sudoers = sudoers_rule(&plan);
        let grant = sudoers.lines().last().unwrap();
        assert!(grant.starts_with("alice ALL=(root) NOPASSWD: "));
        assert!(grant.contains("/usr/bin/systemctl restart telegram-bot"));
    }
}
