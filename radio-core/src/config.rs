//! radio-core configuration
//!
//! Command-line flags (with environment fallbacks) override the TOML file,
//! which overrides compiled defaults.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::audio::ducking::DEFAULT_DUCK_DB;
use crate::audio::types::DEFAULT_CHUNK_SIZE;
use crate::broadcast::DEFAULT_LISTENER_CAPACITY;
use crate::error::{Error, Result};
use crate::playback::EngineConfig;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_IDLE_INTERVAL_MS: u64 = 1000;
pub const DATABASE_FILE: &str = "radio.db";

/// Bytes per sample of decoded PCM (signed 16-bit)
const DECODED_SAMPLE_WIDTH: usize = 2;

/// Command-line arguments for radio-core
#[derive(Parser, Debug, Default)]
#[command(name = "radio-core")]
#[command(about = "Live audio engine and stream server for the shared radio")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "RADIO_PORT")]
    pub port: Option<u16>,

    /// Root folder holding the database and audio files
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(short, long, env = "RADIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Playlist database, defaults to radio.db under the root folder
    #[arg(short, long, env = "RADIO_DATABASE")]
    pub database: Option<PathBuf>,
}

/// Contents of config.toml. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub root_folder: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub chunk_size_bytes: Option<usize>,
    pub listener_capacity: Option<usize>,
    pub idle_interval_ms: Option<u64>,
    pub duck_db: Option<f32>,
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub root_folder: PathBuf,
    pub database: PathBuf,
    pub listener_capacity: usize,
    pub engine: EngineConfig,
}

impl Config {
    /// Read the config file (explicit or platform default) and merge `args` over it
    pub fn load(args: &Args) -> Result<Self> {
        let path = args
            .config
            .clone()
            .or_else(radio_common::config::default_config_path);

        let file = match path {
            Some(path) => radio_common::config::load_toml::<FileConfig>(&path)?.unwrap_or_default(),
            None => FileConfig::default(),
        };

        Self::merge(args, file)
    }

    pub fn merge(args: &Args, file: FileConfig) -> Result<Self> {
        let root_folder = radio_common::config::resolve_root_folder(
            args.root_folder.as_deref(),
            file.root_folder.as_deref(),
        );
        let database = args
            .database
            .clone()
            .or(file.database)
            .unwrap_or_else(|| root_folder.join(DATABASE_FILE));

        let chunk_size_bytes = file.chunk_size_bytes.unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size_bytes == 0 || chunk_size_bytes % DECODED_SAMPLE_WIDTH != 0 {
            return Err(Error::Config(format!(
                "chunk_size_bytes must be a positive multiple of {}, got {}",
                DECODED_SAMPLE_WIDTH, chunk_size_bytes
            )));
        }

        let listener_capacity = file.listener_capacity.unwrap_or(DEFAULT_LISTENER_CAPACITY);
        if listener_capacity == 0 {
            return Err(Error::Config("listener_capacity must be positive".to_string()));
        }

        let duck_db = file.duck_db.unwrap_or(DEFAULT_DUCK_DB);
        if !duck_db.is_finite() || duck_db < 0.0 {
            return Err(Error::Config(format!(
                "duck_db must be a non-negative number of decibels, got {}",
                duck_db
            )));
        }

        let idle_interval_ms = file.idle_interval_ms.unwrap_or(DEFAULT_IDLE_INTERVAL_MS).max(1);

        Ok(Self {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            root_folder,
            database,
            listener_capacity,
            engine: EngineConfig {
                chunk_size_bytes,
                idle_interval: Duration::from_millis(idle_interval_ms),
                duck_db,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with_root() -> Args {
        Args {
            root_folder: Some(PathBuf::from("/srv/radio")),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::merge(&args_with_root(), FileConfig::default()).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database, PathBuf::from("/srv/radio/radio.db"));
        assert_eq!(config.listener_capacity, 20);
        assert_eq!(config.engine.chunk_size_bytes, 1024);
        assert_eq!(config.engine.idle_interval, Duration::from_secs(1));
        assert_eq!(config.engine.duck_db, 10.0);
    }

    #[test]
    fn test_cli_overrides_file() {
        let args = Args {
            port: Some(8080),
            database: Some(PathBuf::from("/tmp/other.db")),
            ..args_with_root()
        };
        let file = FileConfig {
            port: Some(9000),
            database: Some(PathBuf::from("/var/lib/radio.db")),
            listener_capacity: Some(50),
            ..Default::default()
        };

        let config = Config::merge(&args, file).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.database, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.listener_capacity, 50);
    }

    #[test]
    fn test_file_values_parse() {
        let file: FileConfig = toml::from_str(
            r#"
            port = 5100
            chunk_size_bytes = 4096
            idle_interval_ms = 250
            duck_db = 6.0
            "#,
        )
        .unwrap();

        let config = Config::merge(&args_with_root(), file).unwrap();
        assert_eq!(config.port, 5100);
        assert_eq!(config.engine.chunk_size_bytes, 4096);
        assert_eq!(config.engine.idle_interval, Duration::from_millis(250));
        assert_eq!(config.engine.duck_db, 6.0);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let zero_chunk = FileConfig {
            chunk_size_bytes: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            Config::merge(&args_with_root(), zero_chunk),
            Err(Error::Config(_))
        ));

        let odd_chunk = FileConfig {
            chunk_size_bytes: Some(1001),
            ..Default::default()
        };
        assert!(matches!(
            Config::merge(&args_with_root(), odd_chunk),
            Err(Error::Config(_))
        ));

        let zero_capacity = FileConfig {
            listener_capacity: Some(0),
            ..Default::default()
        };
        assert!(Config::merge(&args_with_root(), zero_capacity).is_err());

        let negative_duck = FileConfig {
            duck_db: Some(-3.0),
            ..Default::default()
        };
        assert!(Config::merge(&args_with_root(), negative_duck).is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["radio-core", "--port", "5001", "-r", "/music"]).unwrap();
        assert_eq!(args.port, Some(5001));
        assert_eq!(args.root_folder, Some(PathBuf::from("/music")));
        assert!(args.config.is_none());
    }
}
