//! Error types emitted by the Stopwise CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use stopwise_core::ServiceError;
use stopwise_data::{ProviderBuildError, SqliteStoreError};
use thiserror::Error;

/// Errors emitted by the Stopwise CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// Starting the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Opening the address list database failed.
    #[error("failed to open address list store at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: SqliteStoreError,
    },
    /// Constructing the geocoder failed.
    #[error("failed to build geocoder for {base_url:?}: {source}")]
    BuildGeocoder {
        base_url: String,
        #[source]
        source: ProviderBuildError,
    },
    /// Reading the address list file failed.
    #[error("failed to read addresses at {path:?}: {source}")]
    ReadAddresses {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading the address update file failed.
    #[error("failed to read address updates at {path:?}: {source}")]
    ReadUpdates {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The address update file was not a JSON array of updates.
    #[error("failed to parse address updates at {path:?}: {source}")]
    ParseUpdates {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The requested list does not exist for this owner.
    #[error("address list {list_id} not found")]
    ListNotFound { list_id: u64 },
    /// The address list operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// Serialising the command output failed.
    #[error("failed to serialise output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
