//! Input checks run before the service touches the provider or the store.

use std::collections::HashSet;

use geo::Coord;

use crate::address::is_permutation;
use crate::{Address, AddressList, AddressUpdate, GeoPoint, Recipient};

use super::ValidationError;

/// Trim the submitted addresses, rejecting an empty or blank batch.
pub(super) fn raw_addresses(addresses: &[String]) -> Result<Vec<String>, ValidationError> {
    if addresses.is_empty() {
        return Err(ValidationError::NoAddresses);
    }
    addresses
        .iter()
        .enumerate()
        .map(|(position, address)| {
            let trimmed = address.trim();
            if trimmed.is_empty() {
                Err(ValidationError::BlankAddress { position })
            } else {
                Ok(trimmed.to_owned())
            }
        })
        .collect()
}

pub(super) fn label(label: &str) -> Result<String, ValidationError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankLabel);
    }
    Ok(trimmed.to_owned())
}

/// Require a resolved, in-range start point.
pub(super) fn start_point(start: GeoPoint) -> Result<Coord<f64>, ValidationError> {
    let coord = start.coord().ok_or(ValidationError::StartUnresolved)?;
    if !start.is_within_bounds() {
        return Err(ValidationError::StartOutOfRange {
            latitude: coord.y,
            longitude: coord.x,
        });
    }
    Ok(coord)
}

/// Normalise recipients, dropping duplicates but keeping first-seen order.
pub(super) fn recipients(emails: &[String]) -> Result<Vec<Recipient>, ValidationError> {
    let mut seen = HashSet::new();
    let mut parsed = Vec::with_capacity(emails.len());
    for email in emails {
        let recipient = Recipient::parse(email).ok_or_else(|| ValidationError::InvalidRecipient {
            value: email.clone(),
        })?;
        if seen.insert(recipient.clone()) {
            parsed.push(recipient);
        }
    }
    Ok(parsed)
}

/// Apply `updates` to a copy of `list`'s addresses.
///
/// Rank changes are all-or-nothing: either no update carries an
/// `order_index`, or every address does and together they form a permutation.
pub(super) fn apply_updates(
    list: &AddressList,
    updates: &[AddressUpdate],
) -> Result<Vec<Address>, ValidationError> {
    let mut seen = HashSet::new();
    for update in updates {
        if list.address(update.id).is_none() {
            return Err(ValidationError::UnknownAddress {
                address_id: update.id,
            });
        }
        if !seen.insert(update.id) {
            return Err(ValidationError::DuplicateUpdate {
                address_id: update.id,
            });
        }
        if update.formatted_address.trim().is_empty() {
            return Err(ValidationError::BlankFormattedAddress {
                address_id: update.id,
            });
        }
    }
    check_ordering(list.addresses.len(), updates)?;

    let mut addresses = list.addresses.clone();
    for update in updates {
        if let Some(address) = addresses.iter_mut().find(|address| address.id == update.id) {
            update.formatted_address.trim().clone_into(&mut address.formatted_address);
            if let Some(comment) = &update.comment {
                address.comment = Some(comment.clone());
            }
            if let Some(order_index) = update.order_index {
                address.order_index = order_index;
            }
        }
    }
    Ok(addresses)
}

fn check_ordering(expected: usize, updates: &[AddressUpdate]) -> Result<(), ValidationError> {
    let indices: Vec<u32> = updates
        .iter()
        .filter_map(|update| update.order_index)
        .collect();
    if indices.is_empty() {
        return Ok(());
    }
    if indices.len() != expected {
        return Err(ValidationError::PartialOrdering {
            supplied: indices.len(),
            expected,
        });
    }
    if !is_permutation(indices.into_iter()) {
        return Err(ValidationError::InvalidOrdering { expected });
    }
    Ok(())
}
