//! Persistence boundary for address lists.
//!
//! The [`AddressListStore`] trait is the only way the service touches
//! storage. Every read is filtered by owner, and address mutations go through
//! a single versioned aggregate write so concurrent route optimisations on the
//! same list cannot interleave their orderings.

mod error;

pub use error::StoreError;

use async_trait::async_trait;

use crate::{Address, AddressList, ListId, NewAddressList, OwnerId, Recipient};

/// Create, read and update address lists.
///
/// Lists returned by any method have their addresses sorted by
/// `order_index`. Identifiers are assigned by the store; addresses are
/// numbered in submission order.
#[async_trait]
pub trait AddressListStore: Send + Sync {
    /// Persist a new list, assigning ids and `order_index = position`.
    async fn insert(&self, list: NewAddressList) -> Result<AddressList, StoreError>;

    /// All lists owned by `owner`, ordered by id.
    async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<AddressList>, StoreError>;

    /// The list `id` if `owner` owns it.
    async fn get(&self, owner: &OwnerId, id: ListId) -> Result<Option<AddressList>, StoreError>;

    /// Overwrite the mutable fields (`formatted_address`, `comment`,
    /// `order_index`) of `addresses` atomically.
    ///
    /// Succeeds only while the stored version equals `expected_version`, then
    /// increments it. Fails with [`StoreError::NotFound`],
    /// [`StoreError::VersionConflict`] or [`StoreError::UnknownAddress`]
    /// without applying anything.
    async fn save_addresses(
        &self,
        owner: &OwnerId,
        id: ListId,
        expected_version: u64,
        addresses: &[Address],
    ) -> Result<AddressList, StoreError>;

    /// Replace the recipient set wholesale.
    async fn replace_recipients(
        &self,
        owner: &OwnerId,
        id: ListId,
        recipients: &[Recipient],
    ) -> Result<AddressList, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryAddressListStore;
    use crate::{AddressId, GeoPoint, NewAddress};
    use rstest::{fixture, rstest};

    #[fixture]
    fn owner() -> OwnerId {
        OwnerId::new("driver-1")
    }

    fn new_list(owner: &OwnerId, texts: &[&str]) -> NewAddressList {
        NewAddressList {
            owner: owner.clone(),
            label: "Monday".into(),
            starting_note: Some("Depot".into()),
            addresses: texts
                .iter()
                .map(|text| NewAddress {
                    raw_text: (*text).to_owned(),
                    formatted_address: (*text).to_owned(),
                    location: GeoPoint::UNRESOLVED,
                })
                .collect(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn insert_numbers_addresses_in_submission_order(owner: OwnerId) {
        let store = MemoryAddressListStore::default();
        let list = store
            .insert(new_list(&owner, &["A", "B", "C"]))
            .await
            .expect("insert");
        let ranks: Vec<(&str, u32)> = list
            .addresses
            .iter()
            .map(|address| (address.raw_text.as_str(), address.order_index))
            .collect();
        assert_eq!(ranks, vec![("A", 0), ("B", 1), ("C", 2)]);
        assert_eq!(list.version, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn reads_are_scoped_to_owner(owner: OwnerId) {
        let store = MemoryAddressListStore::default();
        let list = store.insert(new_list(&owner, &["A"])).await.expect("insert");
        let stranger = OwnerId::new("someone-else");

        assert!(store.get(&stranger, list.id).await.expect("get").is_none());
        assert!(store
            .list_for_owner(&stranger)
            .await
            .expect("list")
            .is_empty());
        let err = store
            .replace_recipients(&stranger, list.id, &[])
            .await
            .expect_err("stranger cannot write");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn stale_version_is_rejected(owner: OwnerId) {
        let store = MemoryAddressListStore::default();
        let list = store
            .insert(new_list(&owner, &["A", "B"]))
            .await
            .expect("insert");
        let mut reversed = list.addresses.clone();
        reversed.reverse();
        for (rank, address) in (0_u32..).zip(reversed.iter_mut()) {
            address.order_index = rank;
        }

        let saved = store
            .save_addresses(&owner, list.id, list.version, &reversed)
            .await
            .expect("first write");
        assert_eq!(saved.version, 1);

        let err = store
            .save_addresses(&owner, list.id, list.version, &list.addresses)
            .await
            .expect_err("stale write");
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                expected: 0,
                found: 1,
                ..
            }
        ));
        let current = store.get(&owner, list.id).await.expect("get").expect("list");
        assert_eq!(current.addresses, saved.addresses);
    }

    #[rstest]
    #[tokio::test]
    async fn foreign_address_is_rejected(owner: OwnerId) {
        let store = MemoryAddressListStore::default();
        let first = store.insert(new_list(&owner, &["A"])).await.expect("insert");
        let second = store.insert(new_list(&owner, &["B"])).await.expect("insert");

        let err = store
            .save_addresses(&owner, first.id, first.version, &second.addresses)
            .await
            .expect_err("address from another list");
        assert!(matches!(
            err,
            StoreError::UnknownAddress { address_id, .. } if address_id == AddressId(2)
        ));
    }
}
