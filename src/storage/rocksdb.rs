//! Generic RocksDB storage utilities.
//!
//! Pure key-value helpers with no domain logic: configurable database
//! setup, column families, serialized point operations, and full-column
//! iteration. The chat store composes these into its domain layer.

use crate::error::{Result, YumsgError};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options,
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Configuration for RocksDB storage.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Maximum number of open files.
    pub max_open_files: i32,
    /// Number of log files to keep.
    pub keep_log_file_num: usize,
    /// Maximum WAL size in bytes.
    pub max_wal_size: u64,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            max_open_files: 128,
            keep_log_file_num: 2,
            max_wal_size: 16 * 1024 * 1024,      // 16MB
            write_buffer_size: 16 * 1024 * 1024, // 16MB
        }
    }
}

impl DbConfig {
    /// Builds RocksDB Options from this configuration.
    pub fn build_options(&self) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(self.max_open_files);
        opts.set_keep_log_file_num(self.keep_log_file_num);
        opts.set_max_total_wal_size(self.max_wal_size);
        opts.increase_parallelism(num_cpus::get() as i32);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }
}

fn db_error(op: &str, cf: &str, err: impl std::fmt::Display) -> YumsgError {
    YumsgError::storage(format!("{} in column family '{}': {}", op, cf, err))
}

/// A wrapper around RocksDB providing the operations the core needs.
pub struct DbHandle {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl DbHandle {
    /// Opens a RocksDB database with the given column families.
    pub fn open(
        db_path: impl AsRef<Path>,
        config: &DbConfig,
        column_families: &[&str],
    ) -> Result<Self> {
        let path = db_path.as_ref();
        let cf_opts = Options::default();
        let descriptors = column_families
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, cf_opts.clone()));

        let db = DBWithThreadMode::<MultiThreaded>::open_cf_descriptors(
            &config.build_options(),
            path,
            descriptors,
        )
        .map_err(|e| {
            YumsgError::storage(format!(
                "cannot open chat database at '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Gets a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db.cf_handle(name).ok_or_else(|| {
            YumsgError::storage(format!("database has no column family named '{}'", name))
        })
    }

    /// Stores a serializable value at the given key.
    pub fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let bytes = bincode::serialize(value).map_err(|e| {
            YumsgError::serialization(format!("record for '{}' did not serialize: {}", cf_name, e))
        })?;
        let cf = self.cf(cf_name)?;
        self.db
            .put_cf(&cf, key, &bytes)
            .map_err(|e| db_error("put", cf_name, e))
    }

    /// Loads and deserializes a value from the given key.
    pub fn get<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        let Some(bytes) = self
            .db
            .get_cf(&cf, key)
            .map_err(|e| db_error("get", cf_name, e))?
        else {
            return Ok(None);
        };

        let value = bincode::deserialize(&bytes).map_err(|e| {
            YumsgError::serialization(format!(
                "stored record in '{}' did not deserialize: {}",
                cf_name, e
            ))
        })?;
        Ok(Some(value))
    }

    /// Checks if a key exists.
    pub fn exists(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        let cf = self.cf(cf_name)?;
        Ok(self
            .db
            .get_cf(&cf, key)
            .map_err(|e| db_error("get", cf_name, e))?
            .is_some())
    }

    /// Deletes a key.
    pub fn delete(&self, cf_name: &str, key: &[u8]) -> Result<()> {
        let cf = self.cf(cf_name)?;
        self.db
            .delete_cf(&cf, key)
            .map_err(|e| db_error("delete", cf_name, e))
    }

    /// Iterates over all entries in a column family.
    ///
    /// The callback receives (key, value) pairs and returns true to
    /// continue or false to stop.
    pub fn iterate_all<F>(&self, cf_name: &str, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> bool,
    {
        let cf = self.cf(cf_name)?;
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            match item {
                Ok((key, value)) => {
                    if !callback(&key, &value) {
                        break;
                    }
                }
                Err(e) => {
                    warn!(cf = cf_name, error = %e, "skipping unreadable record during scan");
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for DbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbHandle").field("db", &"RocksDB").finish()
    }
}
