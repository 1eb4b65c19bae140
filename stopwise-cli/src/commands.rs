//! Command executors shared by the binary and its tests.
//!
//! Executors are generic over the geocoder and store so tests can drive them
//! with in-memory doubles; [`crate::run`] wires them to the HTTP geocoder and
//! SQLite store.

use std::io::{BufReader, Read, Write};

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use log::debug;
use serde::Serialize;
use stopwise_core::{
    AddressList, AddressListService, AddressListStore, AddressUpdate, GeocodeError,
    GeocodeResult, Geocoder, OptimizedRoute,
};

use crate::CliError;
use crate::args::{
    CreateConfig, OptimizeConfig, RecipientsConfig, ShowConfig, StoreConfig, UpdateConfig,
};

/// Geocoder for commands that never create lists.
///
/// Every lookup fails so an accidental call surfaces instead of silently
/// storing unresolved addresses.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DisabledGeocoder;

pub(crate) const DISABLED_STATUS: &str = "DISABLED";

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn resolve(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        Err(GeocodeError::ProviderStatus {
            status: DISABLED_STATUS.to_owned(),
            message: format!("geocoding is not configured for this command ({address})"),
        })
    }
}

pub(crate) async fn create<G, S>(
    service: &AddressListService<G, S>,
    config: &CreateConfig,
) -> Result<AddressList, CliError>
where
    G: Geocoder,
    S: AddressListStore,
{
    let mut request = config.request.clone();
    if let Some(path) = &config.addresses_file {
        request.addresses.extend(load_address_lines(path)?);
    }
    Ok(service.create(&config.store.owner, request).await?)
}

pub(crate) async fn list<G, S>(
    service: &AddressListService<G, S>,
    config: &StoreConfig,
) -> Result<Vec<AddressList>, CliError>
where
    G: Geocoder,
    S: AddressListStore,
{
    Ok(service.list(&config.owner).await?)
}

/// Fetch one list, treating a missing or foreign list as an error.
pub(crate) async fn show<G, S>(
    service: &AddressListService<G, S>,
    config: &ShowConfig,
) -> Result<AddressList, CliError>
where
    G: Geocoder,
    S: AddressListStore,
{
    service
        .get_by_id(&config.store.owner, config.list_id)
        .await?
        .ok_or(CliError::ListNotFound {
            list_id: config.list_id.0,
        })
}

pub(crate) async fn optimize<G, S>(
    service: &AddressListService<G, S>,
    config: &OptimizeConfig,
) -> Result<OptimizedRoute, CliError>
where
    G: Geocoder,
    S: AddressListStore,
{
    Ok(service
        .optimize_route(&config.store.owner, config.list_id, config.start)
        .await?)
}

pub(crate) async fn recipients<G, S>(
    service: &AddressListService<G, S>,
    config: &RecipientsConfig,
) -> Result<AddressList, CliError>
where
    G: Geocoder,
    S: AddressListStore,
{
    Ok(service
        .add_recipients(&config.store.owner, config.list_id, &config.emails)
        .await?)
}

pub(crate) async fn update<G, S>(
    service: &AddressListService<G, S>,
    config: &UpdateConfig,
) -> Result<AddressList, CliError>
where
    G: Geocoder,
    S: AddressListStore,
{
    let updates = load_updates(&config.updates)?;
    debug!("applying {} address updates from {}", updates.len(), config.updates);
    Ok(service
        .update_addresses(&config.store.owner, config.list_id, &updates)
        .await?)
}

/// Read one address per line, skipping blank lines.
pub(crate) fn load_address_lines(path: &Utf8Path) -> Result<Vec<String>, CliError> {
    let read_error = |source| CliError::ReadAddresses {
        path: path.to_path_buf(),
        source,
    };
    let mut contents = String::new();
    fs_utf8::File::open_ambient(path, ambient_authority())
        .and_then(|mut file| file.read_to_string(&mut contents))
        .map_err(read_error)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect())
}

/// Load a JSON array of [`AddressUpdate`] values from disk.
pub(crate) fn load_updates(path: &Utf8Path) -> Result<Vec<AddressUpdate>, CliError> {
    let file = fs_utf8::File::open_ambient(path, ambient_authority()).map_err(|source| {
        CliError::ReadUpdates {
            path: path.to_path_buf(),
            source,
        }
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::ParseUpdates {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerializeOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

