pub mod contacts;
pub mod draft;
pub mod session;
pub mod working;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use redb::{Database, TableDefinition};

// Draft form state and per-plot working media sets, bitcode-encoded.
pub const DRAFT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("draft");

// Admin session under a fixed key, serde_json bytes.
pub const SESSION_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("session");

// Cached backend reads (contacts), serde_json bytes.
pub const CACHE_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("cache");

/// Local persistent state. One redb file holds everything the tool
/// remembers between runs: the admin session, unpublished drafts, and
/// per-plot media edits that have not been committed yet.
pub struct Store {
    pub in_disk: Database,
}

impl Store {
    /// Opens (or creates) the store and makes sure every table exists,
    /// so later reads never hit a missing table.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("failed to create data directory {:?}", parent))?;
        }
        let in_disk =
            Database::create(path).context(format!("failed to open store at {:?}", path))?;
        let txn = in_disk.begin_write()?;
        {
            txn.open_table(DRAFT_TABLE)?;
            txn.open_table(SESSION_TABLE)?;
            txn.open_table(CACHE_TABLE)?;
        }
        txn.commit()?;
        Ok(Self { in_disk })
    }

    pub fn begin_read(&self) -> Result<redb::ReadTransaction> {
        Ok(self.in_disk.begin_read()?)
    }

    pub fn begin_write(&self) -> Result<redb::WriteTransaction> {
        Ok(self.in_disk.begin_write()?)
    }

    fn read_bytes(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> Result<Option<Vec<u8>>> {
        let txn = self.begin_read()?;
        let table = txn.open_table(table)?;
        Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
    }

    fn write_bytes(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
        bytes: &[u8],
    ) -> Result<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(table)?;
            table.insert(key, bytes)?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove_key(&self, table: TableDefinition<&str, &[u8]>, key: &str) -> Result<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(table)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn temp_store() -> Store {
    let dir = std::env::temp_dir().join(format!("altai-store-{}", uuid::Uuid::new_v4()));
    Store::open(&dir.join("admin.redb")).unwrap()
}
