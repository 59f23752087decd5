//! Settings for the application.
//!
//! Read from an optional `settings.toml` next to the binary, then overridden by
//! `TALLY_*` environment variables (`TALLY_APP__LEVEL=debug`,
//! `TALLY_DATABASE__SQLITE=./ledger.db`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    /// Log level passed to the tracing filter.
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("./tally.db".to_string())
    }
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Self::Memory => String::from("sqlite::memory:"),
            Self::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_sources(File::with_name("settings").required(false))
    }

    fn from_sources<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("TALLY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(raw: &str) -> Settings {
        Settings::from_sources(File::from_str(raw, FileFormat::Toml)).unwrap()
    }

    #[test]
    fn defaults_to_local_sqlite_file() {
        let settings = from_toml("");
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.database.url(), "sqlite:./tally.db?mode=rwc");
    }

    #[test]
    fn reads_level_and_database() {
        let settings = from_toml(
            r#"
            [app]
            level = "debug"

            [database]
            sqlite = "/tmp/ledger.db"
            "#,
        );
        assert_eq!(settings.app.level, "debug");
        assert_eq!(
            settings.database,
            Database::Sqlite("/tmp/ledger.db".to_string())
        );
    }

    #[test]
    fn memory_database() {
        let settings = from_toml(r#"database = "memory""#);
        assert_eq!(settings.database.url(), "sqlite::memory:");
    }
}
