use std::path::PathBuf;

use thiserror::Error;

/// Failure to load a select source from disk.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read select source {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse select source {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failure to load a configuration file.
///
/// Only the file itself can be rejected. Individual values that are out of
/// range or of the wrong type are normalized to their defaults instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
