//! Command line and environment settings.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use revsync_ccadb::DEFAULT_REPORT_URL;
use revsync_updater::{
    BugzillaConfig, ConfigError, DEFAULT_BUCKET, DEFAULT_BUGZILLA_URL, DEFAULT_COLLECTION,
    DEFAULT_PRODUCTION_URL, DEFAULT_STAGING_URL, StoreConfig, UpdaterConfig, parse_cc_accounts,
};

/// Every setting can also come from the environment, and from the env file
/// (variables already set win over the file).
#[derive(Parser, Debug)]
#[command(
    name = "revsync",
    version,
    about = "Add intermediates the CCADB reports as revoked to OneCRL"
)]
pub struct Cli {
    /// Env file to load (default: config.env next to the executable)
    #[arg(value_name = "CONFIG_ENV")]
    pub config_env: Option<PathBuf>,

    /// Print the entries that would be added without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Production Kinto API root
    #[arg(long, env = "ONECRL_PRODUCTION", default_value = DEFAULT_PRODUCTION_URL)]
    pub production: String,
    #[arg(long, env = "ONECRL_PRODUCTION_USER")]
    pub production_user: Option<String>,
    #[arg(long, env = "ONECRL_PRODUCTION_PASSWORD", hide_env_values = true)]
    pub production_password: Option<String>,
    #[arg(long, env = "ONECRL_PRODUCTION_TOKEN", hide_env_values = true)]
    pub production_token: Option<String>,
    #[arg(long, env = "ONECRL_PRODUCTION_BUCKET", default_value = DEFAULT_BUCKET)]
    pub production_bucket: String,
    #[arg(long, env = "ONECRL_PRODUCTION_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub production_collection: String,

    /// Staging Kinto API root
    #[arg(long, env = "ONECRL_STAGING", default_value = DEFAULT_STAGING_URL)]
    pub staging: String,
    #[arg(long, env = "ONECRL_STAGING_USER")]
    pub staging_user: Option<String>,
    #[arg(long, env = "ONECRL_STAGING_PASSWORD", hide_env_values = true)]
    pub staging_password: Option<String>,
    #[arg(long, env = "ONECRL_STAGING_TOKEN", hide_env_values = true)]
    pub staging_token: Option<String>,
    #[arg(long, env = "ONECRL_STAGING_BUCKET", default_value = DEFAULT_BUCKET)]
    pub staging_bucket: String,
    #[arg(long, env = "ONECRL_STAGING_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub staging_collection: String,

    /// Bugzilla host
    #[arg(long, env = "BUGZILLA", default_value = DEFAULT_BUGZILLA_URL)]
    pub bugzilla: String,
    #[arg(long, env = "BUGZILLA_API_KEY", hide_env_values = true)]
    pub bugzilla_api_key: Option<String>,
    /// Accounts to CC on filed bugs, comma separated
    #[arg(long, env = "BUGZILLA_CC_ACCOUNTS", default_value = "")]
    pub bugzilla_cc_accounts: String,

    /// CCADB "ready to add" report
    #[arg(long, env = "CCADB_REPORT_URL", default_value = DEFAULT_REPORT_URL)]
    pub ccadb_report_url: String,

    #[arg(long, env = "LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
    /// Write the log to a new timestamped file in this directory
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
    /// Emit the log as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Cli {
    pub fn updater_config(&self) -> Result<UpdaterConfig, ConfigError> {
        let store = |url: &str,
                     bucket: &str,
                     collection: &str,
                     user: &Option<String>,
                     password: &Option<String>,
                     token: &Option<String>| StoreConfig {
            url: url.to_string(),
            bucket: bucket.to_string(),
            collection: collection.to_string(),
            user: user.clone(),
            password: password.clone(),
            token: token.clone(),
        };
        Ok(UpdaterConfig {
            production: store(
                &self.production,
                &self.production_bucket,
                &self.production_collection,
                &self.production_user,
                &self.production_password,
                &self.production_token,
            ),
            staging: store(
                &self.staging,
                &self.staging_bucket,
                &self.staging_collection,
                &self.staging_user,
                &self.staging_password,
                &self.staging_token,
            ),
            bugzilla: BugzillaConfig {
                url: self.bugzilla.clone(),
                api_key: self.bugzilla_api_key.clone(),
                cc: parse_cc_accounts(&self.bugzilla_cc_accounts)?,
            },
            report_url: self.ccadb_report_url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_the_updater_config() {
        let cli = Cli::try_parse_from([
            "revsync",
            "--staging",
            "http://localhost:8888/v1",
            "--staging-user",
            "admin",
            "--staging-password",
            "hunter2",
            "--production-collection",
            "onecrl-test",
            "--bugzilla-cc-accounts",
            "a@example.org,b@example.org",
        ])
        .unwrap();
        let config = cli.updater_config().unwrap();
        assert_eq!(config.staging.url, "http://localhost:8888/v1");
        assert_eq!(config.staging.user.as_deref(), Some("admin"));
        assert_eq!(config.production.collection, "onecrl-test");
        assert_eq!(config.production.bucket, DEFAULT_BUCKET);
        assert_eq!(config.bugzilla.cc, ["a@example.org", "b@example.org"]);
    }

    #[test]
    fn log_level_rejects_unknown_names() {
        assert!(Cli::try_parse_from(["revsync", "--log-level", "loud"]).is_err());
        let cli = Cli::try_parse_from(["revsync", "--log-level", "warn"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Warn);
    }
}
