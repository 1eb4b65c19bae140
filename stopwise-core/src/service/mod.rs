//! Address list operations and route optimisation.
//!
//! [`AddressListService`] ties a [`Geocoder`] and an [`AddressListStore`]
//! together. Creating a list geocodes every address concurrently and commits
//! only once all lookups have finished; a single provider failure aborts the
//! batch. Optimising a route sequences the stored addresses from a start
//! point, writes the new ranks back in one versioned write, and derives a
//! shareable directions link.

mod error;
mod validate;

pub use error::{ErrorKind, ServiceError, ValidationError};

use std::time::Duration;

use futures_util::future::try_join_all;
use log::{debug, info, warn};

use crate::{
    Address, AddressList, AddressListStore, AddressUpdate, DEFAULT_SHARE_LINK_BASE, GeoPoint,
    GeocodeError, GeocodeResult, Geocoder, ListId, NewAddress, NewAddressList, OwnerId,
    RouteComputation, ShareLinkBuilder, route_distance_km,
};

/// Default per-address geocoding time limit in seconds.
const DEFAULT_GEOCODE_TIMEOUT_SECS: u64 = 10;

/// Tunables for [`AddressListService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Upper bound on a single address lookup.
    pub geocode_timeout: Duration,
    /// Base URL for generated directions links.
    pub share_link_base: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            geocode_timeout: Duration::from_secs(DEFAULT_GEOCODE_TIMEOUT_SECS),
            share_link_base: DEFAULT_SHARE_LINK_BASE.to_owned(),
        }
    }
}

impl ServiceConfig {
    /// Set the per-address geocoding time limit.
    #[must_use]
    pub const fn with_geocode_timeout(mut self, timeout: Duration) -> Self {
        self.geocode_timeout = timeout;
        self
    }

    /// Set the base URL for directions links.
    #[must_use]
    pub fn with_share_link_base(mut self, base: impl Into<String>) -> Self {
        self.share_link_base = base.into();
        self
    }
}

/// Request to create a list from raw address text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct CreateAddressList {
    /// Human-readable name.
    pub label: String,
    /// Optional note describing where the route starts.
    #[cfg_attr(feature = "serde", serde(default))]
    pub starting_note: Option<String>,
    /// Address text in submission order.
    pub addresses: Vec<String>,
}

/// Result of [`AddressListService::optimize_route`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct OptimizedRoute {
    /// Addresses in their new visiting order.
    pub addresses: Vec<Address>,
    /// Directions link starting at the requested start point.
    pub share_url: String,
    /// Great-circle length of the walk through resolved stops, in kilometres.
    pub total_distance_km: f64,
}

/// Address list operations scoped to the requesting owner.
///
/// # Examples
/// ```
/// use stopwise_core::test_support::{MemoryAddressListStore, StubGeocoder};
/// use stopwise_core::{AddressListService, CreateAddressList, GeoPoint, OwnerId};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let geocoder = StubGeocoder::default()
///     .with_match("Depot", "1 Depot Rd", GeoPoint::new(0.0, 1.0));
/// let service = AddressListService::new(geocoder, MemoryAddressListStore::default());
/// let owner = OwnerId::new("driver");
///
/// let list = service
///     .create(&owner, CreateAddressList {
///         label: "Monday".into(),
///         starting_note: None,
///         addresses: vec!["Depot".into()],
///     })
///     .await?;
/// let route = service.optimize_route(&owner, list.id, GeoPoint::new(0.0, 0.0)).await?;
/// assert_eq!(route.share_url, "https://www.google.com/maps/dir/0,0/0,1");
/// # Ok::<(), stopwise_core::ServiceError>(())
/// # }).unwrap();
/// ```
#[derive(Debug)]
pub struct AddressListService<G, S>
where
    G: Geocoder,
    S: AddressListStore,
{
    geocoder: G,
    store: S,
    config: ServiceConfig,
    share_links: ShareLinkBuilder,
}

impl<G, S> AddressListService<G, S>
where
    G: Geocoder,
    S: AddressListStore,
{
    /// Construct a service using default configuration.
    pub fn new(geocoder: G, store: S) -> Self {
        Self::with_config(geocoder, store, ServiceConfig::default())
    }

    /// Construct a service with explicit configuration.
    pub fn with_config(geocoder: G, store: S, config: ServiceConfig) -> Self {
        let share_links = ShareLinkBuilder::new(config.share_link_base.clone());
        Self {
            geocoder,
            store,
            config,
            share_links,
        }
    }

    /// Borrow the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Geocode `request.addresses` concurrently and persist a new list in
    /// submission order.
    ///
    /// Addresses the provider cannot match are kept with their raw text and
    /// an unresolved location. Any provider failure or timeout aborts the
    /// whole call before anything is written.
    pub async fn create(
        &self,
        owner: &OwnerId,
        request: CreateAddressList,
    ) -> Result<AddressList, ServiceError> {
        let label = validate::label(&request.label)?;
        let texts = validate::raw_addresses(&request.addresses)?;

        let lookups = texts.iter().map(|text| self.resolve_bounded(text));
        let resolved = try_join_all(lookups).await?;

        let unresolved = resolved
            .iter()
            .filter(|result| !result.location.is_resolved())
            .count();
        if unresolved > 0 {
            warn!("{unresolved} of {} addresses could not be geocoded", texts.len());
        }

        let addresses = texts
            .into_iter()
            .zip(resolved)
            .map(|(raw_text, result)| NewAddress {
                raw_text,
                formatted_address: result.formatted_address,
                location: result.location,
            })
            .collect();
        let list = self
            .store
            .insert(NewAddressList {
                owner: owner.clone(),
                label,
                starting_note: request
                    .starting_note
                    .map(|note| note.trim().to_owned())
                    .filter(|note| !note.is_empty()),
                addresses,
            })
            .await?;
        info!(
            "created address list {} with {} addresses for {owner}",
            list.id,
            list.addresses.len()
        );
        Ok(list)
    }

    /// All lists owned by `owner`.
    pub async fn list(&self, owner: &OwnerId) -> Result<Vec<AddressList>, ServiceError> {
        Ok(self.store.list_for_owner(owner).await?)
    }

    /// The list `id` if `owner` owns it; `None` otherwise.
    pub async fn get_by_id(
        &self,
        owner: &OwnerId,
        id: ListId,
    ) -> Result<Option<AddressList>, ServiceError> {
        Ok(self.store.get(owner, id).await?)
    }

    /// Apply field-level edits to some of a list's addresses.
    ///
    /// Edits are validated against the full address set and written in one
    /// versioned write; see [`ValidationError`] for the rejected shapes.
    pub async fn update_addresses(
        &self,
        owner: &OwnerId,
        id: ListId,
        updates: &[AddressUpdate],
    ) -> Result<AddressList, ServiceError> {
        let list = self.require(owner, id).await?;
        if updates.is_empty() {
            return Ok(list);
        }
        let addresses = validate::apply_updates(&list, updates)?;
        let saved = self
            .save_addresses(owner, id, list.version, &addresses)
            .await?;
        debug!("updated {} addresses on list {id}", updates.len());
        Ok(saved)
    }

    /// Replace the list's recipients with `emails`.
    pub async fn add_recipients(
        &self,
        owner: &OwnerId,
        id: ListId,
        emails: &[String],
    ) -> Result<AddressList, ServiceError> {
        let recipients = validate::recipients(emails)?;
        let list = self.store.replace_recipients(owner, id, &recipients).await?;
        debug!("list {id} now has {} recipients", list.recipients.len());
        Ok(list)
    }

    /// Reorder the list nearest-first from `start` and build a share link.
    ///
    /// The new ranks are written in one versioned write; if another writer
    /// changed the list in the meantime the call fails with
    /// [`ServiceError::Conflict`] and nothing is applied.
    pub async fn optimize_route(
        &self,
        owner: &OwnerId,
        id: ListId,
        start: GeoPoint,
    ) -> Result<OptimizedRoute, ServiceError> {
        let start_coord = validate::start_point(start)?;
        let list = self.require(owner, id).await?;

        let route = RouteComputation::plan(start, &list.addresses);
        let reordered = route.apply(&list.addresses);
        let saved = self
            .save_addresses(owner, id, list.version, &reordered)
            .await?;

        let addresses: Vec<Address> = saved.ordered_addresses().into_iter().cloned().collect();
        let share_url = self.share_links.build(start_coord, &addresses);
        let total_distance_km =
            route_distance_km(start, addresses.iter().map(|address| address.location));
        info!(
            "optimised list {id}: {} stops, {total_distance_km:.1} km",
            addresses.len()
        );
        Ok(OptimizedRoute {
            addresses,
            share_url,
            total_distance_km,
        })
    }

    async fn require(&self, owner: &OwnerId, id: ListId) -> Result<AddressList, ServiceError> {
        self.store
            .get(owner, id)
            .await?
            .ok_or(ServiceError::NotFound { list_id: id })
    }

    async fn save_addresses(
        &self,
        owner: &OwnerId,
        id: ListId,
        expected_version: u64,
        addresses: &[Address],
    ) -> Result<AddressList, ServiceError> {
        self.store
            .save_addresses(owner, id, expected_version, addresses)
            .await
            .map_err(|error| {
                let mapped = ServiceError::from(error);
                if mapped.kind() == ErrorKind::Conflict {
                    warn!("list {id} changed since version {expected_version}; write rejected");
                }
                mapped
            })
    }

    async fn resolve_bounded(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        let limit = self.config.geocode_timeout;
        let result = tokio::time::timeout(limit, self.geocoder.resolve(address))
            .await
            .map_err(|_| GeocodeError::Timeout {
                target: address.to_owned(),
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })?;
        match &result {
            Ok(found) if found.location.is_resolved() => debug!("geocoded {address:?}"),
            Ok(_) => debug!("no geocoding match for {address:?}"),
            Err(error) => debug!("geocoding {address:?} failed: {error}"),
        }
        result
    }
}
