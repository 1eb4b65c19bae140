//! In-memory store and scripted geocoder used by unit and behaviour tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::{
    Address, AddressId, AddressList, AddressListStore, GeoPoint, GeocodeError, GeocodeResult,
    Geocoder, ListId, NewAddressList, OwnerId, Recipient, StoreError,
};

/// In-memory `AddressListStore` implementation used in tests.
///
/// Identifiers start at one and are shared by all lists, mirroring an
/// autoincrement column.
#[derive(Debug, Default)]
pub struct MemoryAddressListStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_list_id: u64,
    last_address_id: u64,
    lists: BTreeMap<ListId, AddressList>,
}

impl MemoryState {
    fn owned_mut(&mut self, owner: &OwnerId, id: ListId) -> Result<&mut AddressList, StoreError> {
        self.lists
            .get_mut(&id)
            .filter(|list| list.owner == *owner)
            .ok_or(StoreError::NotFound { list_id: id })
    }
}

impl MemoryAddressListStore {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of lists held, regardless of owner.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().lists.len()
    }

    /// Whether the store holds no lists at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sorted(mut list: AddressList) -> AddressList {
    list.addresses
        .sort_by_key(|address| (address.order_index, address.id));
    list
}

#[async_trait]
impl AddressListStore for MemoryAddressListStore {
    async fn insert(&self, list: NewAddressList) -> Result<AddressList, StoreError> {
        let mut state = self.lock();
        state.last_list_id += 1;
        let id = ListId(state.last_list_id);
        let mut addresses = Vec::with_capacity(list.addresses.len());
        for (order_index, address) in (0_u32..).zip(list.addresses) {
            state.last_address_id += 1;
            addresses.push(Address {
                id: AddressId(state.last_address_id),
                raw_text: address.raw_text,
                formatted_address: address.formatted_address,
                location: address.location,
                comment: None,
                order_index,
            });
        }
        let stored = AddressList {
            id,
            owner: list.owner,
            label: list.label,
            starting_note: list.starting_note,
            addresses,
            recipients: Vec::new(),
            version: 0,
        };
        state.lists.insert(id, stored.clone());
        Ok(stored)
    }

    async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<AddressList>, StoreError> {
        Ok(self
            .lock()
            .lists
            .values()
            .filter(|list| list.owner == *owner)
            .cloned()
            .map(sorted)
            .collect())
    }

    async fn get(&self, owner: &OwnerId, id: ListId) -> Result<Option<AddressList>, StoreError> {
        Ok(self
            .lock()
            .lists
            .get(&id)
            .filter(|list| list.owner == *owner)
            .cloned()
            .map(sorted))
    }

    async fn save_addresses(
        &self,
        owner: &OwnerId,
        id: ListId,
        expected_version: u64,
        addresses: &[Address],
    ) -> Result<AddressList, StoreError> {
        let mut state = self.lock();
        let list = state.owned_mut(owner, id)?;
        if list.version != expected_version {
            return Err(StoreError::VersionConflict {
                list_id: id,
                expected: expected_version,
                found: list.version,
            });
        }
        if let Some(stray) = addresses
            .iter()
            .find(|update| list.address(update.id).is_none())
        {
            return Err(StoreError::UnknownAddress {
                list_id: id,
                address_id: stray.id,
            });
        }
        for update in addresses {
            if let Some(address) = list
                .addresses
                .iter_mut()
                .find(|address| address.id == update.id)
            {
                address.formatted_address.clone_from(&update.formatted_address);
                address.comment.clone_from(&update.comment);
                address.order_index = update.order_index;
            }
        }
        list.version += 1;
        Ok(sorted(list.clone()))
    }

    async fn replace_recipients(
        &self,
        owner: &OwnerId,
        id: ListId,
        recipients: &[Recipient],
    ) -> Result<AddressList, StoreError> {
        let mut state = self.lock();
        let list = state.owned_mut(owner, id)?;
        list.recipients = recipients.to_vec();
        Ok(sorted(list.clone()))
    }
}

#[derive(Debug, Clone)]
enum StubAnswer {
    Match(GeocodeResult),
    Failure(GeocodeError),
    Hang,
}

/// Scripted `Geocoder` returning canned answers per address text.
///
/// Unscripted addresses resolve as "no match".
#[derive(Debug, Default)]
pub struct StubGeocoder {
    answers: HashMap<String, StubAnswer>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Counts a lookup as in flight until dropped, including on cancellation.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StubGeocoder {
    /// Answer `address` with `formatted_address` at `location`.
    #[must_use]
    pub fn with_match(
        mut self,
        address: impl Into<String>,
        formatted_address: impl Into<String>,
        location: GeoPoint,
    ) -> Self {
        self.answers.insert(
            address.into(),
            StubAnswer::Match(GeocodeResult {
                formatted_address: formatted_address.into(),
                location,
            }),
        );
        self
    }

    /// Fail lookups of `address` with `error`.
    #[must_use]
    pub fn with_failure(mut self, address: impl Into<String>, error: GeocodeError) -> Self {
        self.answers
            .insert(address.into(), StubAnswer::Failure(error));
        self
    }

    /// Never complete lookups of `address`.
    #[must_use]
    pub fn with_hang(mut self, address: impl Into<String>) -> Self {
        self.answers.insert(address.into(), StubAnswer::Hang);
        self
    }

    /// Number of lookups issued so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Largest number of lookups that were pending at the same time.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn resolve(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _pending = self.enter();
        match self.answers.get(address).cloned() {
            Some(StubAnswer::Match(result)) => Ok(result),
            Some(StubAnswer::Failure(error)) => Err(error),
            Some(StubAnswer::Hang) => std::future::pending().await,
            None => Ok(GeocodeResult::unmatched(address)),
        }
    }
}
