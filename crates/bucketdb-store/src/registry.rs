//! Table registry: creating and listing tables

use sled::Tree;
use tracing::debug;

use bucketdb_common::error::{Error, Result};

use crate::handle::Database;

/// Name of the engine's own default tree, never exposed as a table
const ENGINE_DEFAULT_TREE: &[u8] = b"__sled__default";

impl Database {
    /// Create every table in `names` that does not exist yet.
    ///
    /// All names are attempted; the failures are returned together.
    pub fn create_tables_if_missing<I, S>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let errors = names
            .into_iter()
            .filter_map(|name| self.create_table(name.as_ref()).err())
            .collect();
        Error::join(errors)
    }

    /// Names of the tables currently in the store, sorted.
    ///
    /// Empty once the handle is closed.
    pub fn tables(&self) -> Vec<String> {
        let Ok(db) = self.engine() else {
            return Vec::new();
        };

        let mut names: Vec<String> = db
            .tree_names()
            .into_iter()
            .filter(|name| &name[..] != ENGINE_DEFAULT_TREE)
            .map(|name| String::from_utf8_lossy(&name).into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_ok()
    }

    /// Tree backing `name`, or [`Error::InvalidTable`] if there is no such table
    pub(crate) fn table(&self, name: &str) -> Result<Tree> {
        let db = self.engine()?;
        if let Some(tree) = self.tables.get(name) {
            return Ok(tree.clone());
        }

        // Tables created through the raw connection are picked up lazily.
        let exists = name.as_bytes() != ENGINE_DEFAULT_TREE
            && db
                .tree_names()
                .iter()
                .any(|existing| &existing[..] == name.as_bytes());
        if !exists {
            return Err(Error::InvalidTable(name.to_string()));
        }

        let tree = db.open_tree(name)?;
        self.tables.insert(name.to_string(), tree.clone());
        Ok(tree)
    }

    /// Register every table already present in the store
    pub(crate) fn load_tables(&self) -> Result<()> {
        let db = self.engine()?;
        for name in db.tree_names() {
            if &name[..] == ENGINE_DEFAULT_TREE {
                continue;
            }
            let Ok(table) = String::from_utf8(name.to_vec()) else {
                continue;
            };
            let tree = db.open_tree(&name)?;
            self.tables.insert(table, tree);
        }
        Ok(())
    }

    fn create_table(&self, name: &str) -> Result<()> {
        if name.is_empty() || name.as_bytes() == ENGINE_DEFAULT_TREE {
            return Err(Error::InvalidTable(name.to_string()));
        }
        if self.tables.contains_key(name) {
            return Ok(());
        }

        let tree = self.engine()?.open_tree(name)?;
        debug!("Created table {}", name);
        self.tables.insert(name.to_string(), tree);
        Ok(())
    }
}
