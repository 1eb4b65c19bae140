//! Subcommand arguments and their resolved configurations.
//!
//! Each `*Args` struct is layered by `ortho_config` (CLI flags over
//! `STOPWISE_CMDS_<COMMAND>_<FIELD>` environment variables over config files)
//! and then converted into a `*Config` with defaults applied and required
//! fields checked.

use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use stopwise_core::{CreateAddressList, GeoPoint, ListId, OwnerId, ServiceConfig};
use stopwise_data::HttpGeocoderConfig;
use stopwise_data::geocoding::DEFAULT_GEOCODE_URL;

use crate::CliError;

pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_OWNER: &str = "owner";
pub(crate) const ARG_LABEL: &str = "label";
pub(crate) const ARG_NOTE: &str = "note";
pub(crate) const ARG_ADDRESSES_FILE: &str = "file";
pub(crate) const ARG_GOOGLE_MAPS_KEY: &str = "google-maps-key";
pub(crate) const ARG_GEOCODER_URL: &str = "geocoder-url";
pub(crate) const ARG_GEOCODE_TIMEOUT_SECS: &str = "geocode-timeout-secs";
pub(crate) const ARG_LIST_ID: &str = "list-id";
pub(crate) const ARG_START_LAT: &str = "start-lat";
pub(crate) const ARG_START_LNG: &str = "start-lng";
pub(crate) const ARG_UPDATES: &str = "updates";

pub(crate) const ENV_CREATE_OWNER: &str = "STOPWISE_CMDS_CREATE_OWNER";
pub(crate) const ENV_CREATE_LABEL: &str = "STOPWISE_CMDS_CREATE_LABEL";
pub(crate) const ENV_CREATE_GOOGLE_MAPS_KEY: &str = "STOPWISE_CMDS_CREATE_GOOGLE_MAPS_KEY";
pub(crate) const ENV_LIST_OWNER: &str = "STOPWISE_CMDS_LIST_OWNER";
pub(crate) const ENV_SHOW_OWNER: &str = "STOPWISE_CMDS_SHOW_OWNER";
pub(crate) const ENV_SHOW_LIST_ID: &str = "STOPWISE_CMDS_SHOW_LIST_ID";
pub(crate) const ENV_OPTIMIZE_OWNER: &str = "STOPWISE_CMDS_OPTIMIZE_OWNER";
pub(crate) const ENV_OPTIMIZE_LIST_ID: &str = "STOPWISE_CMDS_OPTIMIZE_LIST_ID";
pub(crate) const ENV_OPTIMIZE_START_LAT: &str = "STOPWISE_CMDS_OPTIMIZE_START_LAT";
pub(crate) const ENV_OPTIMIZE_START_LNG: &str = "STOPWISE_CMDS_OPTIMIZE_START_LNG";
pub(crate) const ENV_RECIPIENTS_OWNER: &str = "STOPWISE_CMDS_RECIPIENTS_OWNER";
pub(crate) const ENV_RECIPIENTS_LIST_ID: &str = "STOPWISE_CMDS_RECIPIENTS_LIST_ID";
pub(crate) const ENV_UPDATE_OWNER: &str = "STOPWISE_CMDS_UPDATE_OWNER";
pub(crate) const ENV_UPDATE_LIST_ID: &str = "STOPWISE_CMDS_UPDATE_LIST_ID";
pub(crate) const ENV_UPDATE_UPDATES: &str = "STOPWISE_CMDS_UPDATE_UPDATES";

/// Database used when none is configured.
pub(crate) const DEFAULT_DATABASE: &str = "stopwise.db";

/// Per-address geocoding limit used when none is configured.
const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 10;

/// Where lists live and who is asking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoreConfig {
    /// SQLite database path.
    pub(crate) database: Utf8PathBuf,
    /// Principal every operation is scoped to.
    pub(crate) owner: OwnerId,
}

impl StoreConfig {
    fn resolve(
        database: Option<Utf8PathBuf>,
        owner: Option<String>,
        owner_env: &'static str,
    ) -> Result<Self, CliError> {
        let owner = owner
            .map(|owner| owner.trim().to_owned())
            .filter(|owner| !owner.is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_OWNER,
                env: owner_env,
            })?;
        Ok(Self {
            database: database.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            owner: OwnerId::new(owner),
        })
    }
}

fn require<T>(value: Option<T>, field: &'static str, env: &'static str) -> Result<T, CliError> {
    value.ok_or(CliError::MissingArgument { field, env })
}

/// CLI arguments for the `create` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Geocode every address concurrently and store them as a new \
                 list in submission order. Addresses the geocoder cannot match \
                 are kept without coordinates; any provider failure aborts the \
                 whole list.",
    about = "Create an address list"
)]
#[ortho_config(prefix = "STOPWISE")]
pub(crate) struct CreateArgs {
    /// Addresses to geocode, in visiting order.
    #[arg(value_name = "address")]
    #[serde(default)]
    pub(crate) addresses: Vec<String>,
    /// File holding one address per line, appended after positional ones.
    #[arg(long = ARG_ADDRESSES_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) addresses_file: Option<Utf8PathBuf>,
    /// Human-readable name for the list.
    #[arg(long = ARG_LABEL, value_name = "text")]
    #[serde(default)]
    pub(crate) label: Option<String>,
    /// Free-form note describing where the route starts.
    #[arg(long = ARG_NOTE, value_name = "text")]
    #[serde(default)]
    pub(crate) note: Option<String>,
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Owner the list belongs to.
    #[arg(long = ARG_OWNER, value_name = "id")]
    #[serde(default)]
    pub(crate) owner: Option<String>,
    /// Google Geocoding API key.
    #[arg(long = ARG_GOOGLE_MAPS_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) google_maps_key: Option<String>,
    /// Override the geocoding endpoint.
    #[arg(long = ARG_GEOCODER_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) geocoder_url: Option<String>,
    /// Upper bound on each address lookup, in seconds.
    #[arg(long = ARG_GEOCODE_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) geocode_timeout_secs: Option<u64>,
}

impl CreateArgs {
    pub(crate) fn into_config(self) -> Result<CreateConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CreateConfig::try_from(merged)
    }
}

/// Resolved `create` command configuration.
#[derive(Debug, Clone)]
pub(crate) struct CreateConfig {
    pub(crate) store: StoreConfig,
    pub(crate) request: CreateAddressList,
    pub(crate) addresses_file: Option<Utf8PathBuf>,
    pub(crate) geocoder: HttpGeocoderConfig,
    pub(crate) geocode_timeout: Duration,
}

impl CreateConfig {
    pub(crate) fn service_config(&self) -> ServiceConfig {
        ServiceConfig::default().with_geocode_timeout(self.geocode_timeout)
    }
}

impl TryFrom<CreateArgs> for CreateConfig {
    type Error = CliError;

    fn try_from(args: CreateArgs) -> Result<Self, Self::Error> {
        let store = StoreConfig::resolve(args.database, args.owner, ENV_CREATE_OWNER)?;
        let label = require(args.label, ARG_LABEL, ENV_CREATE_LABEL)?;
        let api_key = require(
            args.google_maps_key,
            ARG_GOOGLE_MAPS_KEY,
            ENV_CREATE_GOOGLE_MAPS_KEY,
        )?;
        let geocode_timeout = Duration::from_secs(
            args.geocode_timeout_secs
                .unwrap_or(DEFAULT_GEOCODE_TIMEOUT_SECS),
        );
        let geocoder = HttpGeocoderConfig::new(api_key)
            .with_base_url(
                args.geocoder_url
                    .unwrap_or_else(|| DEFAULT_GEOCODE_URL.to_owned()),
            )
            .with_timeout(geocode_timeout);
        Ok(Self {
            store,
            request: CreateAddressList {
                label,
                starting_note: args.note,
                addresses: args.addresses,
            },
            addresses_file: args.addresses_file,
            geocoder,
            geocode_timeout,
        })
    }
}

/// CLI arguments for the `list` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "List the owner's address lists")]
#[ortho_config(prefix = "STOPWISE")]
pub(crate) struct ListArgs {
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Owner whose lists are shown.
    #[arg(long = ARG_OWNER, value_name = "id")]
    #[serde(default)]
    pub(crate) owner: Option<String>,
}

impl ListArgs {
    pub(crate) fn into_config(self) -> Result<StoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        StoreConfig::try_from(merged)
    }
}

impl TryFrom<ListArgs> for StoreConfig {
    type Error = CliError;

    fn try_from(args: ListArgs) -> Result<Self, Self::Error> {
        Self::resolve(args.database, args.owner, ENV_LIST_OWNER)
    }
}

/// CLI arguments for the `show` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Show one address list in visiting order")]
#[ortho_config(prefix = "STOPWISE")]
pub(crate) struct ShowArgs {
    /// Identifier of the list.
    #[arg(value_name = ARG_LIST_ID)]
    #[serde(default)]
    pub(crate) list_id: Option<u64>,
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Owner of the list.
    #[arg(long = ARG_OWNER, value_name = "id")]
    #[serde(default)]
    pub(crate) owner: Option<String>,
}

impl ShowArgs {
    pub(crate) fn into_config(self) -> Result<ShowConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ShowConfig::try_from(merged)
    }
}

/// Resolved `show` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShowConfig {
    pub(crate) store: StoreConfig,
    pub(crate) list_id: ListId,
}

impl TryFrom<ShowArgs> for ShowConfig {
    type Error = CliError;

    fn try_from(args: ShowArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            store: StoreConfig::resolve(args.database, args.owner, ENV_SHOW_OWNER)?,
            list_id: ListId(require(args.list_id, ARG_LIST_ID, ENV_SHOW_LIST_ID)?),
        })
    }
}

/// CLI arguments for the `optimize` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Reorder a list nearest-first from the given start point, \
                 persist the new order and print it with a shareable \
                 directions link.",
    about = "Optimise the visiting order of a list"
)]
#[ortho_config(prefix = "STOPWISE")]
pub(crate) struct OptimizeArgs {
    /// Identifier of the list.
    #[arg(value_name = ARG_LIST_ID)]
    #[serde(default)]
    pub(crate) list_id: Option<u64>,
    /// Latitude of the start point in degrees.
    #[arg(
        long = ARG_START_LAT,
        visible_alias = "lat",
        value_name = "deg",
        allow_negative_numbers = true
    )]
    #[serde(default)]
    pub(crate) start_lat: Option<f64>,
    /// Longitude of the start point in degrees.
    #[arg(
        long = ARG_START_LNG,
        visible_alias = "lng",
        value_name = "deg",
        allow_negative_numbers = true
    )]
    #[serde(default)]
    pub(crate) start_lng: Option<f64>,
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Owner of the list.
    #[arg(long = ARG_OWNER, value_name = "id")]
    #[serde(default)]
    pub(crate) owner: Option<String>,
}

impl OptimizeArgs {
    pub(crate) fn into_config(self) -> Result<OptimizeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        OptimizeConfig::try_from(merged)
    }
}

/// Resolved `optimize` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OptimizeConfig {
    pub(crate) store: StoreConfig,
    pub(crate) list_id: ListId,
    pub(crate) start: GeoPoint,
}

impl TryFrom<OptimizeArgs> for OptimizeConfig {
    type Error = CliError;

    fn try_from(args: OptimizeArgs) -> Result<Self, Self::Error> {
        let store = StoreConfig::resolve(args.database, args.owner, ENV_OPTIMIZE_OWNER)?;
        let list_id = require(args.list_id, ARG_LIST_ID, ENV_OPTIMIZE_LIST_ID)?;
        let latitude = require(args.start_lat, ARG_START_LAT, ENV_OPTIMIZE_START_LAT)?;
        let longitude = require(args.start_lng, ARG_START_LNG, ENV_OPTIMIZE_START_LNG)?;
        Ok(Self {
            store,
            list_id: ListId(list_id),
            start: GeoPoint::new(latitude, longitude),
        })
    }
}

/// CLI arguments for the `recipients` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Replace the recipients a list is shared with")]
#[ortho_config(prefix = "STOPWISE")]
pub(crate) struct RecipientsArgs {
    /// Identifier of the list.
    #[arg(value_name = ARG_LIST_ID)]
    #[serde(default)]
    pub(crate) list_id: Option<u64>,
    /// Email addresses; an empty set clears the recipients.
    #[arg(long = "email", value_name = "address")]
    #[serde(default)]
    pub(crate) emails: Vec<String>,
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Owner of the list.
    #[arg(long = ARG_OWNER, value_name = "id")]
    #[serde(default)]
    pub(crate) owner: Option<String>,
}

impl RecipientsArgs {
    pub(crate) fn into_config(self) -> Result<RecipientsConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RecipientsConfig::try_from(merged)
    }
}

/// Resolved `recipients` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecipientsConfig {
    pub(crate) store: StoreConfig,
    pub(crate) list_id: ListId,
    pub(crate) emails: Vec<String>,
}

impl TryFrom<RecipientsArgs> for RecipientsConfig {
    type Error = CliError;

    fn try_from(args: RecipientsArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            store: StoreConfig::resolve(args.database, args.owner, ENV_RECIPIENTS_OWNER)?,
            list_id: ListId(require(args.list_id, ARG_LIST_ID, ENV_RECIPIENTS_LIST_ID)?),
            emails: args.emails,
        })
    }
}

/// CLI arguments for the `update` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Apply field-level edits from a JSON file holding an array of \
                 {\"id\", \"formattedAddress\", \"comment\", \"orderIndex\"} \
                 objects. Reordering must rank every address in the list.",
    about = "Edit addresses in a list"
)]
#[ortho_config(prefix = "STOPWISE")]
pub(crate) struct UpdateArgs {
    /// Identifier of the list.
    #[arg(value_name = ARG_LIST_ID)]
    #[serde(default)]
    pub(crate) list_id: Option<u64>,
    /// Path to the JSON file of edits.
    #[arg(long = ARG_UPDATES, visible_alias = "file", value_name = "path")]
    #[serde(default)]
    pub(crate) updates: Option<Utf8PathBuf>,
    /// Path to the SQLite database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Owner of the list.
    #[arg(long = ARG_OWNER, value_name = "id")]
    #[serde(default)]
    pub(crate) owner: Option<String>,
}

impl UpdateArgs {
    pub(crate) fn into_config(self) -> Result<UpdateConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        UpdateConfig::try_from(merged)
    }
}

/// Resolved `update` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UpdateConfig {
    pub(crate) store: StoreConfig,
    pub(crate) list_id: ListId,
    pub(crate) updates: Utf8PathBuf,
}

impl TryFrom<UpdateArgs> for UpdateConfig {
    type Error = CliError;

    fn try_from(args: UpdateArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            store: StoreConfig::resolve(args.database, args.owner, ENV_UPDATE_OWNER)?,
            list_id: ListId(require(args.list_id, ARG_LIST_ID, ENV_UPDATE_LIST_ID)?),
            updates: require(args.updates, ARG_UPDATES, ENV_UPDATE_UPDATES)?,
        })
    }
}
