//! SQLite-backed [`AddressListStore`].
//!
//! Lists, addresses and recipients live in three tables keyed by SQLite
//! autoincrement ids. Every write runs in a single transaction, and address
//! writes are guarded by the list's `version` column so a stale writer is
//! rejected with [`StoreError::VersionConflict`] instead of interleaving its
//! ordering with another.
//!
//! Queries run on Tokio's blocking pool; the connection is shared behind a
//! mutex, so calls are serialised.

mod error;
mod schema;

pub use error::SqliteStoreError;

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use log::debug;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use stopwise_core::{
    Address, AddressId, AddressList, AddressListStore, GeoPoint, ListId, NewAddressList, OwnerId,
    Recipient, StoreError,
};

use error::Failure;

/// Address list store persisted to a SQLite database.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use stopwise_data::store::SqliteAddressListStore;
///
/// # fn main() -> Result<(), stopwise_data::store::SqliteStoreError> {
/// let store = SqliteAddressListStore::open(Utf8Path::new("data/stopwise.db"))?;
/// # let _ = store;
/// # Ok(())
/// # }
/// ```
pub struct SqliteAddressListStore {
    connection: Arc<Mutex<Connection>>,
    path: Option<Utf8PathBuf>,
}

impl fmt::Debug for SqliteAddressListStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteAddressListStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteAddressListStore {
    /// Open or create the database at `path`, creating parent directories and
    /// tables as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the database
    /// cannot be opened, or the schema cannot be initialised.
    pub fn open(path: &Utf8Path) -> Result<Self, SqliteStoreError> {
        ensure_parent_dir(path)?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| SqliteStoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        schema::initialise(&connection)?;
        debug!("opened address list store at {path}");
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot allocate the database or the schema
    /// cannot be initialised.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection = Connection::open_in_memory().map_err(|source| SqliteStoreError::Open {
            path: Utf8PathBuf::from(":memory:"),
            source,
        })?;
        schema::initialise(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            path: None,
        })
    }

    /// Run `task` against the connection on the blocking pool.
    async fn run<T, F>(&self, task: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, Failure> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        let joined = tokio::task::spawn_blocking(move || {
            let mut guard = connection.lock().unwrap_or_else(PoisonError::into_inner);
            task(&mut guard)
        })
        .await;
        match joined {
            Ok(outcome) => outcome.map_err(StoreError::from),
            Err(source) => Err(StoreError::backend(SqliteStoreError::Worker { source })),
        }
    }
}

#[async_trait]
impl AddressListStore for SqliteAddressListStore {
    async fn insert(&self, list: NewAddressList) -> Result<AddressList, StoreError> {
        self.run(move |connection| insert_list(connection, list))
            .await
    }

    async fn list_for_owner(&self, owner: &OwnerId) -> Result<Vec<AddressList>, StoreError> {
        let owner = owner.clone();
        self.run(move |connection| {
            let ids = {
                let mut statement = connection
                    .prepare("SELECT id FROM address_lists WHERE owner = ?1 ORDER BY id")?;
                let rows = statement.query_map([owner.as_str()], |row| row.get::<_, i64>(0))?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            let mut lists = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(list) = load_list(connection, &owner, ListId(from_sql_id(id)?))? {
                    lists.push(list);
                }
            }
            Ok(lists)
        })
        .await
    }

    async fn get(&self, owner: &OwnerId, id: ListId) -> Result<Option<AddressList>, StoreError> {
        let owner = owner.clone();
        self.run(move |connection| load_list(connection, &owner, id))
            .await
    }

    async fn save_addresses(
        &self,
        owner: &OwnerId,
        id: ListId,
        expected_version: u64,
        addresses: &[Address],
    ) -> Result<AddressList, StoreError> {
        let owner = owner.clone();
        let addresses = addresses.to_vec();
        self.run(move |connection| {
            let transaction = connection.transaction()?;
            let found = owned_version(&transaction, &owner, id)?;
            if found != expected_version {
                return Err(StoreError::VersionConflict {
                    list_id: id,
                    expected: expected_version,
                    found,
                }
                .into());
            }
            write_addresses(&transaction, id, &addresses)?;
            transaction.execute(
                "UPDATE address_lists SET version = version + 1 WHERE id = ?1",
                [to_sql_id(id.0)?],
            )?;
            transaction.commit()?;
            load_list(connection, &owner, id)?
                .ok_or_else(|| StoreError::NotFound { list_id: id }.into())
        })
        .await
    }

    async fn replace_recipients(
        &self,
        owner: &OwnerId,
        id: ListId,
        recipients: &[Recipient],
    ) -> Result<AddressList, StoreError> {
        let owner = owner.clone();
        let recipients = recipients.to_vec();
        self.run(move |connection| {
            let transaction = connection.transaction()?;
            owned_version(&transaction, &owner, id)?;
            let list_id = to_sql_id(id.0)?;
            transaction.execute("DELETE FROM recipients WHERE list_id = ?1", [list_id])?;
            {
                let mut statement = transaction.prepare(
                    "INSERT OR IGNORE INTO recipients (list_id, email) VALUES (?1, ?2)",
                )?;
                for recipient in &recipients {
                    statement.execute(params![list_id, recipient.as_str()])?;
                }
            }
            transaction.commit()?;
            load_list(connection, &owner, id)?
                .ok_or_else(|| StoreError::NotFound { list_id: id }.into())
        })
        .await
    }
}

fn insert_list(connection: &mut Connection, list: NewAddressList) -> Result<AddressList, Failure> {
    let transaction = connection.transaction()?;
    transaction.execute(
        "INSERT INTO address_lists (owner, label, starting_note, version) VALUES (?1, ?2, ?3, 0)",
        params![list.owner.as_str(), list.label, list.starting_note],
    )?;
    let list_id = transaction.last_insert_rowid();

    let mut addresses = Vec::with_capacity(list.addresses.len());
    {
        let mut statement = transaction.prepare(
            "INSERT INTO addresses \
             (list_id, raw_text, formatted_address, latitude, longitude, comment, order_index) \
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)",
        )?;
        for (order_index, address) in (0_u32..).zip(list.addresses) {
            statement.execute(params![
                list_id,
                address.raw_text,
                address.formatted_address,
                address.location.latitude,
                address.location.longitude,
                order_index,
            ])?;
            addresses.push(Address {
                id: AddressId(from_sql_id(transaction.last_insert_rowid())?),
                raw_text: address.raw_text,
                formatted_address: address.formatted_address,
                location: address.location,
                comment: None,
                order_index,
            });
        }
    }
    transaction.commit()?;

    Ok(AddressList {
        id: ListId(from_sql_id(list_id)?),
        owner: list.owner,
        label: list.label,
        starting_note: list.starting_note,
        addresses,
        recipients: Vec::new(),
        version: 0,
    })
}

/// Current version of list `id`, or `NotFound` if `owner` does not own it.
fn owned_version(
    transaction: &Transaction<'_>,
    owner: &OwnerId,
    id: ListId,
) -> Result<u64, Failure> {
    let version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM address_lists WHERE id = ?1 AND owner = ?2",
            params![to_sql_id(id.0)?, owner.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    let version = version.ok_or(StoreError::NotFound { list_id: id })?;
    Ok(u64::try_from(version).map_err(|_| SqliteStoreError::CorruptValue {
        column: "version",
        value: version,
    })?)
}

fn write_addresses(
    transaction: &Transaction<'_>,
    id: ListId,
    addresses: &[Address],
) -> Result<(), Failure> {
    let list_id = to_sql_id(id.0)?;
    let mut statement = transaction.prepare(
        "UPDATE addresses SET formatted_address = ?1, comment = ?2, order_index = ?3 \
         WHERE id = ?4 AND list_id = ?5",
    )?;
    for address in addresses {
        let changed = statement.execute(params![
            address.formatted_address,
            address.comment,
            address.order_index,
            to_sql_id(address.id.0)?,
            list_id,
        ])?;
        if changed == 0 {
            return Err(StoreError::UnknownAddress {
                list_id: id,
                address_id: address.id,
            }
            .into());
        }
    }
    Ok(())
}

fn load_list(
    connection: &Connection,
    owner: &OwnerId,
    id: ListId,
) -> Result<Option<AddressList>, Failure> {
    let list_id = to_sql_id(id.0)?;
    let header: Option<(String, Option<String>, i64)> = connection
        .query_row(
            "SELECT label, starting_note, version FROM address_lists \
             WHERE id = ?1 AND owner = ?2",
            params![list_id, owner.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    let Some((label, starting_note, version)) = header else {
        return Ok(None);
    };

    let addresses = {
        let mut statement = connection.prepare(
            "SELECT id, raw_text, formatted_address, latitude, longitude, comment, order_index \
             FROM addresses WHERE list_id = ?1 ORDER BY order_index, id",
        )?;
        let mut rows = statement.query([list_id])?;
        let mut addresses = Vec::new();
        while let Some(row) = rows.next()? {
            let order_index: i64 = row.get(6)?;
            addresses.push(Address {
                id: AddressId(from_sql_id(row.get(0)?)?),
                raw_text: row.get(1)?,
                formatted_address: row.get(2)?,
                location: GeoPoint {
                    latitude: row.get(3)?,
                    longitude: row.get(4)?,
                },
                comment: row.get(5)?,
                order_index: u32::try_from(order_index).map_err(|_| {
                    SqliteStoreError::CorruptValue {
                        column: "order_index",
                        value: order_index,
                    }
                })?,
            });
        }
        addresses
    };

    let recipients = {
        let mut statement =
            connection.prepare("SELECT email FROM recipients WHERE list_id = ?1 ORDER BY id")?;
        let rows = statement.query_map([list_id], |row| row.get::<_, String>(0))?;
        let mut recipients = Vec::new();
        for email in rows {
            // Rows are only ever written from parsed recipients.
            if let Some(recipient) = Recipient::parse(&email?) {
                recipients.push(recipient);
            }
        }
        recipients
    };

    Ok(Some(AddressList {
        id,
        owner: owner.clone(),
        label,
        starting_note,
        addresses,
        recipients,
        version: u64::try_from(version).map_err(|_| SqliteStoreError::CorruptValue {
            column: "version",
            value: version,
        })?,
    }))
}

fn to_sql_id(id: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(id).map_err(|_| SqliteStoreError::IdOutOfRange { id })
}

fn from_sql_id(id: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(id).map_err(|_| SqliteStoreError::CorruptValue {
        column: "id",
        value: id,
    })
}

fn ensure_parent_dir(path: &Utf8Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base, relative) = if parent.is_absolute() {
        ("/", parent.strip_prefix("/").unwrap_or(parent))
    } else {
        (".", parent)
    };
    let create_error = |source| SqliteStoreError::CreateDirectory {
        path: parent.to_path_buf(),
        source,
    };
    fs_utf8::Dir::open_ambient_dir(base, ambient_authority())
        .map_err(create_error)?
        .create_dir_all(relative)
        .map_err(create_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use stopwise_core::NewAddress;
    use tempfile::TempDir;

    #[fixture]
    fn owner() -> OwnerId {
        OwnerId::new("driver-1")
    }

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("create temp dir")
    }

    fn new_list(owner: &OwnerId) -> NewAddressList {
        NewAddressList {
            owner: owner.clone(),
            label: "Friday".into(),
            starting_note: None,
            addresses: vec![
                NewAddress {
                    raw_text: "1 High St".into(),
                    formatted_address: "1 High St, Town".into(),
                    location: GeoPoint::new(51.5, -0.1),
                },
                NewAddress {
                    raw_text: "Nowhere".into(),
                    formatted_address: "Nowhere".into(),
                    location: GeoPoint::UNRESOLVED,
                },
            ],
        }
    }

    #[rstest]
    #[tokio::test]
    async fn persists_across_reopen(temp_dir: TempDir, owner: OwnerId) {
        let path = Utf8PathBuf::from_path_buf(temp_dir.path().join("nested/lists.db"))
            .expect("utf-8 path");

        let created = {
            let store = SqliteAddressListStore::open(&path).expect("open store");
            store.insert(new_list(&owner)).await.expect("insert")
        };

        let reopened = SqliteAddressListStore::open(&path).expect("reopen store");
        let loaded = reopened
            .get(&owner, created.id)
            .await
            .expect("get")
            .expect("list should exist");
        assert_eq!(loaded, created);
        assert_eq!(loaded.addresses[1].location, GeoPoint::UNRESOLVED);
    }

    #[rstest]
    #[tokio::test]
    async fn save_bumps_version_and_reorders(owner: OwnerId) {
        let store = SqliteAddressListStore::open_in_memory().expect("open store");
        let list = store.insert(new_list(&owner)).await.expect("insert");
        let mut edited = list.addresses.clone();
        edited[0].order_index = 1;
        edited[0].comment = Some("ring twice".into());
        edited[1].order_index = 0;

        let saved = store
            .save_addresses(&owner, list.id, list.version, &edited)
            .await
            .expect("save");

        assert_eq!(saved.version, 1);
        assert_eq!(saved.addresses[0].raw_text, "Nowhere");
        assert_eq!(saved.addresses[1].comment.as_deref(), Some("ring twice"));

        let err = store
            .save_addresses(&owner, list.id, list.version, &edited)
            .await
            .expect_err("stale version");
        assert!(matches!(
            err,
            StoreError::VersionConflict { expected: 0, found: 1, .. }
        ));
    }

    #[rstest]
    #[tokio::test]
    async fn foreign_address_rolls_back(owner: OwnerId) {
        let store = SqliteAddressListStore::open_in_memory().expect("open store");
        let first = store.insert(new_list(&owner)).await.expect("insert");
        let second = store.insert(new_list(&owner)).await.expect("insert");
        let mut mixed = first.addresses.clone();
        mixed[0].formatted_address = "changed".into();
        mixed.push(second.addresses[0].clone());

        let err = store
            .save_addresses(&owner, first.id, first.version, &mixed)
            .await
            .expect_err("foreign address");
        assert!(matches!(err, StoreError::UnknownAddress { .. }));

        let unchanged = store
            .get(&owner, first.id)
            .await
            .expect("get")
            .expect("list should exist");
        assert_eq!(unchanged, first);
    }

    #[rstest]
    #[tokio::test]
    async fn recipients_are_replaced(owner: OwnerId) {
        let store = SqliteAddressListStore::open_in_memory().expect("open store");
        let list = store.insert(new_list(&owner)).await.expect("insert");
        let parse = |raw: &str| Recipient::parse(raw).expect("valid recipient");

        store
            .replace_recipients(&owner, list.id, &[parse("a@x.io"), parse("b@x.io")])
            .await
            .expect("first replace");
        let updated = store
            .replace_recipients(&owner, list.id, &[parse("c@x.io")])
            .await
            .expect("second replace");

        assert_eq!(updated.recipients, vec![parse("c@x.io")]);
        assert_eq!(updated.version, list.version);
    }

    #[rstest]
    #[tokio::test]
    async fn other_owners_see_nothing(owner: OwnerId) {
        let store = SqliteAddressListStore::open_in_memory().expect("open store");
        let list = store.insert(new_list(&owner)).await.expect("insert");
        let stranger = OwnerId::new("stranger");

        assert!(store.get(&stranger, list.id).await.expect("get").is_none());
        assert!(store
            .list_for_owner(&stranger)
            .await
            .expect("list")
            .is_empty());
        let err = store
            .save_addresses(&stranger, list.id, list.version, &list.addresses)
            .await
            .expect_err("stranger cannot write");
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
