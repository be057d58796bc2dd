//! Record store: typed CRUD over table trees
//!
//! Values are encoded before any table is touched, so an unserializable value
//! never reaches the engine. Guarded writes (`insert`, `update`) check and
//! write inside one engine transaction; `delete` relies on the engine's
//! atomic remove.

use serde::Serialize;
use sled::transaction::{abort, ConflictableTransactionResult, TransactionalTree};

use bucketdb_common::error::{Error, Result};

use crate::codec::{self, Record};
use crate::handle::Database;

/// Precondition a guarded write places on the current record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    /// Key must be absent
    Absent,
    /// Key must be present
    Present,
}

impl Database {
    /// Store `value` under `key`, replacing any existing record
    pub fn save<V: Serialize + ?Sized>(&self, value: &V, key: &str, table: &str) -> Result<()> {
        let bytes = codec::encode(value)?;
        let tree = self.table(table)?;
        tree.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    /// Store `value` under `key` only if the key is not in use.
    ///
    /// Fails with [`Error::AlreadyExists`] otherwise, leaving the stored
    /// record untouched.
    pub fn insert<V: Serialize + ?Sized>(&self, value: &V, key: &str, table: &str) -> Result<()> {
        self.guarded_write(value, key, table, Guard::Absent)
    }

    /// Replace the record under `key` only if there is one.
    ///
    /// Fails with [`Error::DoesNotExist`] otherwise, writing nothing.
    pub fn update<V: Serialize + ?Sized>(&self, value: &V, key: &str, table: &str) -> Result<()> {
        self.guarded_write(value, key, table, Guard::Present)
    }

    /// Decode the record under `key` into `T`
    pub fn get<T: Record>(&self, key: &str, table: &str) -> Result<T> {
        let tree = self.table(table)?;
        let stored = tree
            .get(key.as_bytes())?
            .ok_or_else(|| Error::NoResults {
                table: table.to_string(),
                key: key.to_string(),
            })?;
        codec::decode(&stored)
    }

    /// Decode every record in `table`, in key order
    pub fn get_all<T: Record>(&self, table: &str) -> Result<Vec<T>> {
        let tree = self.table(table)?;
        tree.iter()
            .values()
            .map(|stored| codec::decode(&stored?))
            .collect()
    }

    /// Remove the record under `key`.
    ///
    /// Fails with [`Error::NoResults`] if there is nothing to remove.
    pub fn delete(&self, key: &str, table: &str) -> Result<()> {
        let tree = self.table(table)?;
        match tree.remove(key.as_bytes())? {
            Some(_) => Ok(()),
            None => Err(Error::NoResults {
                table: table.to_string(),
                key: key.to_string(),
            }),
        }
    }

    fn guarded_write<V: Serialize + ?Sized>(
        &self,
        value: &V,
        key: &str,
        table: &str,
        guard: Guard,
    ) -> Result<()> {
        let bytes = codec::encode(value)?;
        let tree = self.table(table)?;

        tree.transaction(
            |tx: &TransactionalTree| -> ConflictableTransactionResult<(), Error> {
                let present = tx.get(key.as_bytes())?.is_some();
                match (guard, present) {
                    (Guard::Absent, true) => abort(Error::AlreadyExists {
                        table: table.to_string(),
                        key: key.to_string(),
                    }),
                    (Guard::Present, false) => abort(Error::DoesNotExist {
                        table: table.to_string(),
                        key: key.to_string(),
                    }),
                    _ => {
                        tx.insert(key.as_bytes(), bytes.as_slice())?;
                        Ok(())
                    }
                }
            },
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde::Deserialize;
    use tempfile::TempDir;

    const USERS: &str = "users";

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        name: String,
        pass: String,
    }

    fn user(name: &str, pass: &str) -> User {
        User {
            name: name.to_string(),
            pass: pass.to_string(),
        }
    }

    fn open(dir: &TempDir) -> Database {
        Database::initialize(dir.path().join("store"), [USERS]).unwrap()
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        db.save(&user("first", "pw"), "first", USERS).unwrap();
        db.save(&user("first", "changed"), "first", USERS).unwrap();

        let stored: User = db.get("first", USERS).unwrap();
        assert_eq!(stored.pass, "changed");
        assert_eq!(db.get_all::<User>(USERS).unwrap().len(), 1);
    }

    #[test]
    fn test_get_missing_key() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        let err = db.get::<User>("ghost", USERS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoResults);
    }

    #[test]
    fn test_insert_guard() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        db.insert(&user("first", "pw"), "first", USERS).unwrap();
        let err = db.insert(&user("first", "other"), "first", USERS).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(db.get::<User>("first", USERS).unwrap().pass, "pw");
    }

    #[test]
    fn test_update_guard() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        let err = db.update(&user("first", "pw"), "first", USERS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DoesNotExist);
        assert!(db.get_all::<User>(USERS).unwrap().is_empty());

        db.save(&user("first", "pw"), "first", USERS).unwrap();
        db.update(&user("renamed", "new"), "first", USERS).unwrap();
        assert_eq!(
            db.get::<User>("first", USERS).unwrap(),
            user("renamed", "new")
        );
    }

    #[test]
    fn test_update_replaces_rather_than_merges() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        db.save(&serde_json::json!({"name": "a", "extra": 1}), "k", USERS)
            .unwrap();
        db.update(&serde_json::json!({"name": "b"}), "k", USERS).unwrap();

        let stored: serde_json::Value = db.get("k", USERS).unwrap();
        assert_eq!(stored, serde_json::json!({"name": "b"}));
    }

    #[test]
    fn test_delete_twice() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        db.save(&user("first", "pw"), "first", USERS).unwrap();
        db.delete("first", USERS).unwrap();

        let err = db.delete("first", USERS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoResults);
    }

    #[test]
    fn test_get_all_in_key_order() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        for name in ["carol", "alice", "bob"] {
            db.save(&user(name, "pw"), name, USERS).unwrap();
        }

        let names: Vec<String> = db
            .get_all::<User>(USERS)
            .unwrap()
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_get_all_fails_on_undecodable_record() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);

        db.save(&user("first", "pw"), "first", USERS).unwrap();
        db.with_connection(|engine| {
            engine
                .open_tree(USERS)
                .and_then(|tree| tree.insert("broken", "{not json".as_bytes()))
        })
        .unwrap()
        .unwrap();

        let err = db.get_all::<User>(USERS).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
    }

    #[test]
    fn test_operations_after_close() {
        let dir = TempDir::new().unwrap();
        let db = open(&dir);
        db.close().unwrap();

        let kind = ErrorKind::NoConnection;
        assert_eq!(
            db.save(&user("a", "b"), "a", USERS).unwrap_err().kind(),
            kind
        );
        assert_eq!(db.get::<User>("a", USERS).unwrap_err().kind(), kind);
        assert_eq!(db.get_all::<User>(USERS).unwrap_err().kind(), kind);
        assert_eq!(db.delete("a", USERS).unwrap_err().kind(), kind);
    }
}
