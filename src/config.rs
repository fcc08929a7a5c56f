//! Run configuration, loaded from `LECTERN_*` environment variables.
//!
//! Validation is fail-fast: an empty required option is a configuration
//! error raised before any I/O happens.

use crate::error::LecternError;
use anyhow::Result;
use std::path::PathBuf;

/// Everything a run needs to know about the portal and its surroundings.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the academic portal (login lives here).
    pub portal_base_url: String,
    /// Base URL of the learning subsystem reached via the portal bridge.
    pub learn_base_url: String,
    /// Portal account username.
    pub username: String,
    /// Portal account password.
    pub password: String,
    /// Webhook endpoint for change and error notifications.
    pub webhook_url: String,
    /// SQLite database path for snapshots and the page audit trail.
    pub db_path: PathBuf,
}

impl Config {
    /// Validate a fully specified configuration.
    pub fn new(
        portal_base_url: String,
        learn_base_url: String,
        username: String,
        password: String,
        webhook_url: String,
        db_path: PathBuf,
    ) -> Result<Self, LecternError> {
        let config = Self {
            portal_base_url,
            learn_base_url,
            username,
            password,
            webhook_url,
            db_path,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the environment.
    ///
    /// Required: `LECTERN_PORTAL_URL`, `LECTERN_LEARN_URL`,
    /// `LECTERN_USERNAME`, `LECTERN_PASSWORD`, `LECTERN_WEBHOOK_URL`.
    /// Optional: `LECTERN_DB_PATH` (defaults to `~/.lectern/lectern.db`).
    pub fn from_env() -> Result<Self> {
        let db_path = match std::env::var("LECTERN_DB_PATH") {
            Ok(p) if !p.is_empty() => PathBuf::from(p),
            _ => default_db_path(),
        };

        let config = Self {
            portal_base_url: env_or_empty("LECTERN_PORTAL_URL"),
            learn_base_url: env_or_empty("LECTERN_LEARN_URL"),
            username: env_or_empty("LECTERN_USERNAME"),
            password: env_or_empty("LECTERN_PASSWORD"),
            webhook_url: env_or_empty("LECTERN_WEBHOOK_URL"),
            db_path,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), LecternError> {
        if self.portal_base_url.is_empty() {
            return Err(LecternError::MissingOption("portal_base_url"));
        }
        if self.learn_base_url.is_empty() {
            return Err(LecternError::MissingOption("learn_base_url"));
        }
        if self.username.is_empty() {
            return Err(LecternError::MissingOption("username"));
        }
        if self.password.is_empty() {
            return Err(LecternError::MissingOption("password"));
        }
        if self.webhook_url.is_empty() {
            return Err(LecternError::MissingOption("webhook_url"));
        }
        Ok(())
    }

    /// Portal login page URL.
    pub fn login_url(&self) -> String {
        format!("{}/login", self.portal_base_url.trim_end_matches('/'))
    }

    /// Learning subsystem landing page URL.
    pub fn learn_landing_url(&self) -> String {
        format!("{}/my/subjects", self.learn_base_url.trim_end_matches('/'))
    }
}

/// Default database location at ~/.lectern/lectern.db.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".lectern")
        .join("lectern.db")
}

fn env_or_empty(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> Result<Config, LecternError> {
        Config::new(
            "https://portal.example.edu".into(),
            "https://learn.example.edu".into(),
            "student".into(),
            "hunter2".into(),
            "https://hooks.example.com/lectern".into(),
            PathBuf::from("/tmp/lectern.db"),
        )
    }

    #[test]
    fn test_valid_config() {
        assert!(full().is_ok());
    }

    #[test]
    fn test_empty_username_rejected() {
        let err = Config::new(
            "https://portal.example.edu".into(),
            "https://learn.example.edu".into(),
            String::new(),
            "hunter2".into(),
            "https://hooks.example.com/lectern".into(),
            PathBuf::from("/tmp/lectern.db"),
        )
        .unwrap_err();
        assert!(matches!(err, LecternError::MissingOption("username")));
    }

    #[test]
    fn test_login_url_trims_trailing_slash() {
        let mut config = full().unwrap();
        config.portal_base_url = "https://portal.example.edu/".into();
        assert_eq!(config.login_url(), "https://portal.example.edu/login");
    }
}
