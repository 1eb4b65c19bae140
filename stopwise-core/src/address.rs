//! Address lists and the addresses they own.
//!
//! An [`AddressList`] is the aggregate root: it owns its [`Address`] values,
//! their visiting order, and the recipients the route is shared with. The
//! `order_index` values of a list's addresses form a permutation of
//! `0..addresses.len()` after every successful mutation.

use std::fmt;

use crate::GeoPoint;

/// Identifier of an [`AddressList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct ListId(pub u64);

/// Identifier of an [`Address`], unique across all lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct AddressId(pub u64);

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to the principal that owns a list.
///
/// Every read is filtered by owner, so a list belonging to someone else is
/// indistinguishable from one that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap a principal reference.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stop on a route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Address {
    /// Identifier assigned at creation.
    pub id: AddressId,
    /// Text exactly as the user supplied it.
    pub raw_text: String,
    /// Provider-normalised text, or `raw_text` when geocoding found nothing.
    pub formatted_address: String,
    /// Position recorded at geocode time.
    pub location: GeoPoint,
    /// Free-form note attached by the user.
    pub comment: Option<String>,
    /// Zero-based rank within the owning list's visiting order.
    pub order_index: u32,
}

/// A recipient the route is shared with.
///
/// Construct through [`Recipient::parse`], which normalises and checks the
/// address shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct Recipient(String);

impl Recipient {
    /// Trim, lowercase and check that `raw` looks like `local@domain.tld`.
    ///
    /// # Examples
    /// ```
    /// use stopwise_core::Recipient;
    ///
    /// let recipient = Recipient::parse(" Driver@Example.com ").expect("valid email");
    /// assert_eq!(recipient.as_str(), "driver@example.com");
    /// assert!(Recipient::parse("not-an-email").is_none());
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalised = raw.trim().to_lowercase();
        let (local, domain) = normalised.split_once('@')?;
        let plausible = !local.is_empty()
            && !domain.contains('@')
            && !normalised.chars().any(char::is_whitespace)
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty());
        plausible.then_some(Self(normalised))
    }

    /// Borrow the normalised address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Aggregate root owning a set of addresses and their visiting order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct AddressList {
    /// Identifier assigned at creation.
    pub id: ListId,
    /// Principal that owns the list.
    pub owner: OwnerId,
    /// Human-readable name.
    pub label: String,
    /// Optional note describing where the route starts.
    pub starting_note: Option<String>,
    /// Addresses, sorted by `order_index` when read from a store.
    pub addresses: Vec<Address>,
    /// Recipients the route is shared with.
    pub recipients: Vec<Recipient>,
    /// Number of address writes applied so far; used for optimistic locking.
    pub version: u64,
}

impl AddressList {
    /// Look up one of this list's addresses.
    #[must_use]
    pub fn address(&self, id: AddressId) -> Option<&Address> {
        self.addresses.iter().find(|address| address.id == id)
    }

    /// Addresses in visiting order, ready for export or sharing.
    #[must_use]
    pub fn ordered_addresses(&self) -> Vec<&Address> {
        let mut ordered: Vec<&Address> = self.addresses.iter().collect();
        ordered.sort_by_key(|address| (address.order_index, address.id));
        ordered
    }

    /// Whether the `order_index` values form a permutation of `0..n`.
    ///
    /// # Examples
    /// ```
    /// use stopwise_core::{Address, AddressId, AddressList, GeoPoint, ListId, OwnerId};
    ///
    /// let address = |id, order_index| Address {
    ///     id: AddressId(id),
    ///     raw_text: "somewhere".into(),
    ///     formatted_address: "somewhere".into(),
    ///     location: GeoPoint::UNRESOLVED,
    ///     comment: None,
    ///     order_index,
    /// };
    /// let mut list = AddressList {
    ///     id: ListId(1),
    ///     owner: OwnerId::new("owner"),
    ///     label: "Monday".into(),
    ///     starting_note: None,
    ///     addresses: vec![address(1, 1), address(2, 0)],
    ///     recipients: Vec::new(),
    ///     version: 0,
    /// };
    /// assert!(list.has_dense_ordering());
    /// list.addresses[0].order_index = 0;
    /// assert!(!list.has_dense_ordering());
    /// ```
    #[must_use]
    pub fn has_dense_ordering(&self) -> bool {
        is_permutation(self.addresses.iter().map(|address| address.order_index))
    }
}

/// Whether `indices` is exactly `{0, .., n - 1}` for its own length `n`.
pub(crate) fn is_permutation(indices: impl ExactSizeIterator<Item = u32>) -> bool {
    let len = indices.len();
    let mut seen = vec![false; len];
    for index in indices {
        let Some(slot) = usize::try_from(index)
            .ok()
            .and_then(|position| seen.get_mut(position))
        else {
            return false;
        };
        if *slot {
            return false;
        }
        *slot = true;
    }
    true
}

/// An address awaiting its first write to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAddress {
    /// Text exactly as the user supplied it.
    pub raw_text: String,
    /// Provider-normalised text.
    pub formatted_address: String,
    /// Geocoded position, possibly unresolved.
    pub location: GeoPoint,
}

/// A list awaiting its first write to a store.
///
/// Stores assign identifiers and set each address's `order_index` to its
/// position in `addresses`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAddressList {
    /// Principal that will own the list.
    pub owner: OwnerId,
    /// Human-readable name.
    pub label: String,
    /// Optional note describing where the route starts.
    pub starting_note: Option<String>,
    /// Addresses in submission order.
    pub addresses: Vec<NewAddress>,
}

/// Field-level edit of one address.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct AddressUpdate {
    /// Address to edit.
    pub id: AddressId,
    /// Replacement display text.
    pub formatted_address: String,
    /// Replacement comment; `None` leaves the current comment untouched.
    #[cfg_attr(feature = "serde", serde(default))]
    pub comment: Option<String>,
    /// Replacement rank; `None` leaves the ordering untouched.
    #[cfg_attr(feature = "serde", serde(default))]
    pub order_index: Option<u32>,
}
