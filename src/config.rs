//! Session settings and per-call option overrides.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::SqlConduitError;
use crate::params::ParamTypes;
use crate::session::SqliteSession;

/// Commit granularity for multi-row statement batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitMode {
    /// Prepare once, bind and commit each row in its own transaction.
    /// Failed rows roll back individually; later rows still run.
    #[default]
    PerRowPrepared,
    /// Render each row as a fully literal statement and commit it in its own
    /// transaction. Slower, but avoids prepared-slot reuse entirely.
    PerRowLiteral,
    /// One transaction for the whole batch. Any row failure rolls back
    /// every row.
    SingleCommit,
}

/// What a read call does when the statement returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnEmptyRead {
    /// Return an empty result set.
    #[default]
    ReturnEmpty,
    /// Raise `SqlConduitError::NoDataFound`.
    Error,
}

impl std::str::FromStr for CommitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

impl std::str::FromStr for OnEmptyRead {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// Settings for opening a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbSettings {
    /// Database file path, or `:memory:`.
    pub path: String,
    #[serde(default)]
    pub read_only: bool,
    /// Driver-level busy timeout, applied at open.
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    /// Session default for empty reads; overridable per call.
    #[serde(default)]
    pub on_empty_read: OnEmptyRead,
    /// Session default commit granularity for batches; overridable per call.
    #[serde(default)]
    pub commit_mode: CommitMode,
    /// Whether batch failure records carry the failing row's values.
    #[serde(default)]
    pub capture_failed_rows: bool,
}

impl DbSettings {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            read_only: false,
            busy_timeout_ms: None,
            on_empty_read: OnEmptyRead::default(),
            commit_mode: CommitMode::default(),
            capture_failed_rows: false,
        }
    }

    #[must_use]
    pub fn builder(path: impl Into<String>) -> DbSettingsBuilder {
        DbSettingsBuilder::new(path)
    }

    /// Build settings from flat key → value string pairs.
    ///
    /// Recognized keys: `path`, `read_only`, `busy_timeout_ms`,
    /// `on_empty_read`, `commit_mode`, `capture_failed_rows`. Enum values use
    /// their kebab-case names.
    ///
    /// # Errors
    ///
    /// Returns `SqlConduitError::Config` on an unrecognized key, an
    /// unparseable value, or a missing `path`.
    pub fn from_kv_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, SqlConduitError> {
        let mut path: Option<String> = None;
        let mut settings = Self::new(String::new());
        for (key, value) in pairs {
            match key {
                "path" => path = Some(value.to_string()),
                "read_only" => settings.read_only = parse_bool(key, value)?,
                "busy_timeout_ms" => {
                    let ms = value.trim().parse::<u64>().map_err(|_| bad_value(key, value))?;
                    settings.busy_timeout_ms = Some(ms);
                }
                "on_empty_read" => {
                    settings.on_empty_read = value.parse().map_err(|_| bad_value(key, value))?;
                }
                "commit_mode" => {
                    settings.commit_mode = value.parse().map_err(|_| bad_value(key, value))?;
                }
                "capture_failed_rows" => {
                    settings.capture_failed_rows = parse_bool(key, value)?;
                }
                other => {
                    return Err(SqlConduitError::Config(format!(
                        "unrecognized setting {other:?}"
                    )));
                }
            }
        }
        settings.path = path.ok_or_else(|| {
            SqlConduitError::Config("no database path configured".to_string())
        })?;
        Ok(settings)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SqlConduitError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(bad_value(key, value)),
    }
}

fn bad_value(key: &str, value: &str) -> SqlConduitError {
    SqlConduitError::Config(format!("invalid value {value:?} for setting {key:?}"))
}

/// Fluent builder for session settings.
#[derive(Debug, Clone)]
pub struct DbSettingsBuilder {
    settings: DbSettings,
}

impl DbSettingsBuilder {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            settings: DbSettings::new(path),
        }
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.settings.read_only = read_only;
        self
    }

    #[must_use]
    pub fn busy_timeout_ms(mut self, ms: u64) -> Self {
        self.settings.busy_timeout_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn on_empty_read(mut self, on_empty: OnEmptyRead) -> Self {
        self.settings.on_empty_read = on_empty;
        self
    }

    #[must_use]
    pub fn commit_mode(mut self, mode: CommitMode) -> Self {
        self.settings.commit_mode = mode;
        self
    }

    #[must_use]
    pub fn capture_failed_rows(mut self, capture: bool) -> Self {
        self.settings.capture_failed_rows = capture;
        self
    }

    #[must_use]
    pub fn finish(self) -> DbSettings {
        self.settings
    }

    /// Open a session with these settings.
    ///
    /// # Errors
    ///
    /// Returns `SqlConduitError::Connection` if the database cannot be opened.
    pub fn open(self) -> Result<SqliteSession, SqlConduitError> {
        SqliteSession::open(self.finish())
    }
}

/// Per-call options for the read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadOptions {
    on_empty: Option<OnEmptyRead>,
}

impl ReadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the session's empty-read behavior for this call.
    #[must_use]
    pub fn with_on_empty(mut self, on_empty: OnEmptyRead) -> Self {
        self.on_empty = Some(on_empty);
        self
    }

    #[must_use]
    pub(crate) fn resolve_on_empty(self, session_default: OnEmptyRead) -> OnEmptyRead {
        self.on_empty.unwrap_or(session_default)
    }
}

/// Per-call options for the store path.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    commit_mode: Option<CommitMode>,
    param_types: Option<ParamTypes>,
    capture_failed_rows: Option<bool>,
}

impl StoreOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the session's commit granularity for this call.
    #[must_use]
    pub fn with_commit_mode(mut self, mode: CommitMode) -> Self {
        self.commit_mode = Some(mode);
        self
    }

    /// Supply explicit storage types instead of first-row inference.
    #[must_use]
    pub fn with_param_types(mut self, types: ParamTypes) -> Self {
        self.param_types = Some(types);
        self
    }

    /// Override whether failure records carry the failing row's values.
    #[must_use]
    pub fn with_capture_failed_rows(mut self, capture: bool) -> Self {
        self.capture_failed_rows = Some(capture);
        self
    }

    #[must_use]
    pub(crate) fn resolve_commit_mode(&self, session_default: CommitMode) -> CommitMode {
        self.commit_mode.unwrap_or(session_default)
    }

    pub(crate) fn param_types(&self) -> Option<&ParamTypes> {
        self.param_types.as_ref()
    }

    #[must_use]
    pub(crate) fn resolve_capture_failed_rows(&self, session_default: bool) -> bool {
        self.capture_failed_rows.unwrap_or(session_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_pairs_build_full_settings() {
        let settings = DbSettings::from_kv_pairs([
            ("path", "/tmp/x.db"),
            ("read_only", "true"),
            ("busy_timeout_ms", "250"),
            ("on_empty_read", "error"),
            ("commit_mode", "single-commit"),
            ("capture_failed_rows", "1"),
        ])
        .unwrap();
        assert_eq!(settings.path, "/tmp/x.db");
        assert!(settings.read_only);
        assert_eq!(settings.busy_timeout_ms, Some(250));
        assert_eq!(settings.on_empty_read, OnEmptyRead::Error);
        assert_eq!(settings.commit_mode, CommitMode::SingleCommit);
        assert!(settings.capture_failed_rows);
    }

    #[test]
    fn kv_pairs_require_a_path() {
        let err = DbSettings::from_kv_pairs([("read_only", "false")]).unwrap_err();
        assert!(matches!(err, SqlConduitError::Config(_)));
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn unrecognized_key_is_rejected() {
        let err =
            DbSettings::from_kv_pairs([("path", "x.db"), ("pool_size", "4")]).unwrap_err();
        assert!(err.to_string().contains("pool_size"));
    }

    #[test]
    fn bad_enum_value_names_key_and_value() {
        let err = DbSettings::from_kv_pairs([("path", "x.db"), ("commit_mode", "sometimes")])
            .unwrap_err();
        assert!(err.to_string().contains("commit_mode"));
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn settings_deserialize_from_json_with_defaults() {
        let settings: DbSettings =
            serde_json::from_str(r#"{"path": ":memory:", "commit_mode": "per-row-literal"}"#)
                .unwrap();
        assert_eq!(settings.path, ":memory:");
        assert_eq!(settings.commit_mode, CommitMode::PerRowLiteral);
        assert_eq!(settings.on_empty_read, OnEmptyRead::ReturnEmpty);
        assert!(!settings.read_only);
    }

    #[test]
    fn enum_names_round_trip_from_str() {
        assert_eq!(
            "per-row-prepared".parse::<CommitMode>().unwrap(),
            CommitMode::PerRowPrepared
        );
        assert_eq!(
            "return-empty".parse::<OnEmptyRead>().unwrap(),
            OnEmptyRead::ReturnEmpty
        );
        assert!("nope".parse::<CommitMode>().is_err());
    }

    #[test]
    fn per_call_options_resolve_against_session_defaults() {
        let opts = ReadOptions::new();
        assert_eq!(opts.resolve_on_empty(OnEmptyRead::Error), OnEmptyRead::Error);
        let opts = ReadOptions::new().with_on_empty(OnEmptyRead::ReturnEmpty);
        assert_eq!(
            opts.resolve_on_empty(OnEmptyRead::Error),
            OnEmptyRead::ReturnEmpty
        );

        let opts = StoreOptions::new();
        assert_eq!(
            opts.resolve_commit_mode(CommitMode::SingleCommit),
            CommitMode::SingleCommit
        );
        let opts = StoreOptions::new().with_commit_mode(CommitMode::PerRowLiteral);
        assert_eq!(
            opts.resolve_commit_mode(CommitMode::SingleCommit),
            CommitMode::PerRowLiteral
        );
        assert!(!opts.resolve_capture_failed_rows(false));
    }
}
