//! Configuration types for contact-archiver

use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// Largest accepted event channel capacity
pub const MAX_EVENT_BUFFER: usize = 65_536;

/// Archive job settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArchiveConfig {
    /// Time a run takes to reach completion (default: 10 seconds)
    ///
    /// Progress is the elapsed time since start divided by this value, so a
    /// poll at half the duration reports 0.5. Stored in config files as whole
    /// seconds.
    #[serde(default = "default_nominal_duration", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub nominal_duration: Duration,

    /// Name the artifact is served under (default: "archive.json")
    #[serde(default = "default_download_name")]
    #[schema(value_type = String)]
    pub download_name: PathBuf,

    /// Capacity of the event broadcast channel (default: 100, max: 65536)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// Pretty-print the artifact JSON (default: true)
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            nominal_duration: default_nominal_duration(),
            download_name: default_download_name(),
            event_buffer: default_event_buffer(),
            pretty: true,
        }
    }
}

/// Contact store settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecordsConfig {
    /// Contacts per page for paginated listing (default: 10)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

/// Main configuration
///
/// Every field has a serde default, so `{}` deserializes to
/// [`Config::default()`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Archive job settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Contact store settings
    #[serde(default)]
    pub records: RecordsConfig,
}

impl Config {
    /// Read a JSON configuration file and validate it
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read,
    /// [`Error::Serialization`] if it is not valid JSON for this schema, and
    /// [`Error::Config`] if a value is out of range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Check that every value is usable
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.archive.nominal_duration.is_zero() {
            return Err(Error::config(
                "nominal_duration",
                "nominal_duration must be greater than zero",
            ));
        }
        if self.archive.nominal_duration.subsec_nanos() != 0 {
            return Err(Error::config(
                "nominal_duration",
                "nominal_duration must be a whole number of seconds",
            ));
        }
        if self.archive.download_name.as_os_str().is_empty() {
            return Err(Error::config("download_name", "download_name must not be empty"));
        }
        if self.archive.event_buffer == 0 {
            return Err(Error::config(
                "event_buffer",
                "event_buffer must be greater than zero",
            ));
        }
        if self.archive.event_buffer > MAX_EVENT_BUFFER {
            return Err(Error::config(
                "event_buffer",
                format!("event_buffer must be at most {MAX_EVENT_BUFFER}"),
            ));
        }
        if self.records.page_size == 0 {
            return Err(Error::config("page_size", "page_size must be greater than zero"));
        }
        Ok(())
    }
}

fn default_nominal_duration() -> Duration {
    Duration::from_secs(10)
}

fn default_download_name() -> PathBuf {
    PathBuf::from("archive.json")
}

fn default_event_buffer() -> usize {
    100
}

fn default_page_size() -> usize {
    10
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_object_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialize failed");
        assert_eq!(config, Config::default());
        assert_eq!(config.archive.nominal_duration, Duration::from_secs(10));
        assert_eq!(config.archive.download_name, PathBuf::from("archive.json"));
        assert_eq!(config.records.page_size, 10);
    }

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().expect("defaults must validate");
    }

    #[test]
    fn nominal_duration_serializes_as_seconds() {
        let config = ArchiveConfig {
            nominal_duration: Duration::from_secs(30),
            ..ArchiveConfig::default()
        };
        let json = serde_json::to_value(&config).expect("serialize failed");
        assert_eq!(
            json["nominal_duration"], 30,
            "duration_serde must serialize Duration as integer seconds"
        );
    }

    #[test]
    fn nominal_duration_rejects_string() {
        let result: std::result::Result<ArchiveConfig, _> =
            serde_json::from_str(r#"{"nominal_duration":"10s"}"#);
        assert!(result.is_err(), "string durations are not accepted");
    }

    #[test]
    fn zero_nominal_duration_is_rejected() {
        let mut config = Config::default();
        config.archive.nominal_duration = Duration::ZERO;

        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("nominal_duration")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn sub_second_nominal_duration_is_rejected() {
        let mut config = Config::default();
        config.archive.nominal_duration = Duration::from_millis(1500);

        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("nominal_duration")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn valid_config_survives_save_and_load() {
        let mut config = Config::default();
        config.archive.nominal_duration = Duration::from_secs(45);
        config.archive.event_buffer = MAX_EVENT_BUFFER;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&config).unwrap()).unwrap();

        assert_eq!(Config::load(file.path()).unwrap(), config);
    }

    #[test]
    fn oversized_event_buffer_is_rejected() {
        let mut config = Config::default();
        config.archive.event_buffer = MAX_EVENT_BUFFER + 1;

        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("event_buffer")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn load_rejects_huge_event_buffer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"archive":{{"event_buffer":18446744073709551615}}}}"#).unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut config = Config::default();
        config.records.page_size = 0;

        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("page_size")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn empty_download_name_is_rejected() {
        let mut config = Config::default();
        config.archive.download_name = PathBuf::new();
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn load_reads_partial_file_and_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"archive":{{"nominal_duration":3}}}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.archive.nominal_duration, Duration::from_secs(3));
        assert_eq!(config.archive.event_buffer, 100);
        assert_eq!(config.records, RecordsConfig::default());
    }

    #[test]
    fn load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"archive":{{"nominal_duration":0}}}}"#).unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn load_malformed_json_is_serialization_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(Error::Serialization(_))
        ));
    }
}
