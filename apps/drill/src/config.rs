//! Runtime configuration from the environment.

use std::path::PathBuf;

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub user: String,
    pub log_filter: String,
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("DRILL_DATABASE")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let user = lookup("DRILL_USER")
            .filter(|value| !value.is_empty())
            .or_else(|| lookup("USER").filter(|value| !value.is_empty()))
            .unwrap_or_else(|| "default".to_string());

        let log_filter = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        Self {
            database_path,
            user,
            log_filter,
        }
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, database: Option<PathBuf>, user: Option<String>) -> Self {
        if let Some(database) = database {
            self.database_path = database;
        }
        if let Some(user) = user {
            self.user = user;
        }
        self
    }
}

fn default_database_path() -> PathBuf {
    // Use the local data directory, falling back to the current dir
    dirs::data_local_dir()
        .map(|dir| dir.join("drill").join("drill.db"))
        .unwrap_or_else(|| PathBuf::from("drill.db"))
}
