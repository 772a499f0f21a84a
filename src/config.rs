//! Configuration for certtrack
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Certtrack - verification certificate tracking service
#[derive(Parser, Debug, Clone)]
#[command(name = "certtrack")]
#[command(about = "Tracks verification certificates through assignment, reminders and escalation")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Path to the SQLite database
    #[arg(long, env = "DB_PATH", default_value = "certtrack.db")]
    pub db_path: PathBuf,

    /// Directory for stored verification evidence
    #[arg(long, env = "EVIDENCE_DIR", default_value = "evidence")]
    pub evidence_dir: PathBuf,

    /// Seconds between sweep ticks (reminders + escalations)
    #[arg(long, env = "SWEEP_INTERVAL_SECS", default_value = "3600")]
    pub sweep_interval_secs: u64,

    /// Days until a newly created certificate is due
    #[arg(long, env = "GRACE_PERIOD_DAYS", default_value = "15")]
    pub grace_period_days: i64,

    /// Comma-separated admin distribution for escalation notices
    #[arg(long, env = "ADMIN_EMAILS")]
    pub admin_emails: Option<String>,

    /// TOML seed file with regions and users, applied at startup
    #[arg(long, env = "SEED_FILE")]
    pub seed_file: Option<PathBuf>,

    /// Publish notices to NATS instead of logging them
    #[arg(long, env = "NATS_ENABLED", default_value = "false")]
    pub nats_enabled: bool,

    /// NATS configuration
    #[command(flatten)]
    pub nats: NatsArgs,

    /// Enable development mode (soft-fails optional collaborators)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// NATS connection configuration
#[derive(Parser, Debug, Clone)]
pub struct NatsArgs {
    /// NATS server URL
    #[arg(long, env = "NATS_URL", default_value = "nats://127.0.0.1:4222")]
    pub nats_url: String,

    /// NATS username (optional)
    #[arg(long, env = "NATS_USER")]
    pub nats_user: Option<String>,

    /// NATS password (optional)
    #[arg(long, env = "NATS_PASSWORD")]
    pub nats_password: Option<String>,
}

impl Args {
    /// Admin distribution as a list
    pub fn admin_email_list(&self) -> Vec<String> {
        self.admin_emails
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Sweep interval as a duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.sweep_interval_secs == 0 {
            return Err("SWEEP_INTERVAL_SECS must be greater than zero".to_string());
        }

        if self.grace_period_days <= 0 {
            return Err("GRACE_PERIOD_DAYS must be greater than zero".to_string());
        }

        if !self.dev_mode && self.admin_email_list().is_empty() {
            return Err("ADMIN_EMAILS is required in production mode".to_string());
        }

        Ok(())
    }
}
