use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::RawRow;
use redb::{
    CommitError, Database, DatabaseError, ReadableTable, StorageError, TableDefinition, TableError,
    TransactionError,
};
use serde::{Deserialize, Serialize};
use tracing::info;

const SNAPSHOT_VERSION: u32 = 1;

const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const ROWS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("rows");

const META_VERSION_KEY: &str = "version";

/// CSV column order used when writing the song file.
pub const CSV_HEADERS: [&str; 11] = [
    "Main Artist",
    "Featuring",
    "Song",
    "Duration",
    "Year Released",
    "BPM",
    "Key",
    "Country",
    "Language",
    "Arrangement",
    "Genre",
];

/// Supplies the rows the catalog is built from.
pub trait RecordSource {
    fn load(&self) -> Result<Vec<RawRow>, StoreError>;
}

/// Receives the full row collection after an append.
pub trait RecordSink: Send + Sync {
    fn persist(&self, rows: &[RawRow]) -> Result<(), StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Csv(csv::Error),
    Redb(redb::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch(u32),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "io error: {}", err),
            StoreError::Csv(err) => write!(f, "csv error: {}", err),
            StoreError::Redb(err) => write!(f, "db error: {}", err),
            StoreError::Bincode(err) => write!(f, "bincode error: {}", err),
            StoreError::VersionMismatch(version) => {
                write!(f, "snapshot version mismatch: {}", version)
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        StoreError::Csv(err)
    }
}

impl From<redb::Error> for StoreError {
    fn from(err: redb::Error) -> Self {
        StoreError::Redb(err)
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        StoreError::Redb(err.into())
    }
}

impl From<TableError> for StoreError {
    fn from(err: TableError) -> Self {
        StoreError::Redb(err.into())
    }
}

impl From<TransactionError> for StoreError {
    fn from(err: TransactionError) -> Self {
        StoreError::Redb(err.into())
    }
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        StoreError::Redb(err.into())
    }
}

impl From<CommitError> for StoreError {
    fn from(err: CommitError) -> Self {
        StoreError::Redb(err.into())
    }
}

impl From<Box<bincode::ErrorKind>> for StoreError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        StoreError::Bincode(err)
    }
}

/// Song table kept as a CSV file under its usual column headers.
#[derive(Clone, Debug)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for CsvStore {
    fn load(&self) -> Result<Vec<RawRow>, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_path(&self.path)?;
        let mut rows = Vec::new();
        for record in reader.deserialize::<RawRow>() {
            rows.push(record?);
        }
        info!("Loaded {} rows from {:?}", rows.len(), self.path);
        Ok(rows)
    }
}

impl RecordSink for CsvStore {
    /// Writes to a sibling temp file and renames it over the target, so a
    /// failed write leaves the previous file in place.
    fn persist(&self, rows: &[RawRow]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut tmp_name = self.path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&tmp_path)?;
            writer.write_record(CSV_HEADERS)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        info!("Wrote {} rows to {:?}", rows.len(), self.path);
        Ok(())
    }
}

/// Song table kept in a redb database, one bincode row per key.
#[derive(Clone)]
pub struct SnapshotStore {
    db: Arc<Database>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub version: u32,
    pub rows: usize,
}

impl SnapshotStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let db = if path.exists() {
            Database::open(path)?
        } else {
            Database::create(path)?
        };
        Ok(Self { db: Arc::new(db) })
    }

    /// Version and row count of the stored snapshot, or `None` when nothing
    /// has been written yet.
    pub fn info(&self) -> Result<Option<SnapshotInfo>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let meta = match read_txn.open_table(META_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let version: u32 = match meta.get(META_VERSION_KEY)? {
            Some(value) => decode_value(value.value())?,
            None => return Ok(None),
        };
        let rows = match read_txn.open_table(ROWS_TABLE) {
            Ok(table) => table.len()? as usize,
            Err(TableError::TableDoesNotExist(_)) => 0,
            Err(err) => return Err(err.into()),
        };
        Ok(Some(SnapshotInfo { version, rows }))
    }
}

impl RecordSource for SnapshotStore {
    fn load(&self) -> Result<Vec<RawRow>, StoreError> {
        match self.info()? {
            Some(info) if info.version == SNAPSHOT_VERSION => {}
            Some(info) => return Err(StoreError::VersionMismatch(info.version)),
            None => return Ok(Vec::new()),
        }
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ROWS_TABLE)?;
        let mut rows = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            rows.push(decode_value(entry.1.value())?);
        }
        Ok(rows)
    }
}

impl RecordSink for SnapshotStore {
    fn persist(&self, rows: &[RawRow]) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        match write_txn.delete_table(ROWS_TABLE) {
            Ok(_) | Err(TableError::TableDoesNotExist(_)) => {}
            Err(err) => return Err(err.into()),
        }
        {
            let mut table = write_txn.open_table(ROWS_TABLE)?;
            for (index, row) in rows.iter().enumerate() {
                let bytes = encode_value(row)?;
                table.insert(index as u64, bytes.as_slice())?;
            }
            let mut meta = write_txn.open_table(META_TABLE)?;
            let version = encode_value(&SNAPSHOT_VERSION)?;
            meta.insert(META_VERSION_KEY, version.as_slice())?;
        }
        write_txn.commit()?;
        info!("Snapshot saved: {} rows", rows.len());
        Ok(())
    }
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(bincode::deserialize(bytes)?)
}
