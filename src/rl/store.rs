//! Durable storage for the Q-table

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use thiserror::Error;
use time::{OffsetDateTime, format_description};
use tracing::{info, warn};

use super::q_table::{QLearningParams, QTable, TableData};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode table: {0}")]
    Encode(#[source] bincode::Error),

    #[error("failed to decode table {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("stored table does not match the action space: {0}")]
    Layout(String),
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Whole-table persistence
pub trait TableStore {
    /// The stored table, or `None` when nothing has been stored yet
    fn load(&mut self) -> Result<Option<TableData>, StoreError>;

    /// Replace the stored table
    fn persist(&mut self, data: &TableData) -> Result<(), StoreError>;
}

/// Gzip-compressed bincode file, replaced atomically on every persist
#[derive(Debug, Clone)]
pub struct GzipFileStore {
    path: PathBuf,
}

impl GzipFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Move an unreadable table out of the way so the next persist does not
    /// destroy it.
    fn quarantine(&self) -> Option<PathBuf> {
        let stamp = OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .format(&format_description::parse("[year][month][day]-[hour][minute][second]").ok()?)
            .ok()?;
        let target = self.sibling(&format!(".corrupt-{stamp}"));
        fs::rename(&self.path, &target).ok()?;
        Some(target)
    }
}

impl TableStore for GzipFileStore {
    fn load(&mut self) -> Result<Option<TableData>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        let decoder = GzDecoder::new(BufReader::new(file));
        match bincode::deserialize_from::<_, TableData>(decoder) {
            Ok(data) => {
                info!(path = %self.path.display(), states = data.rows.len(), "Loaded Q-table");
                Ok(Some(data))
            }
            Err(source) => {
                if let Some(moved) = self.quarantine() {
                    warn!(path = %moved.display(), "Moved unreadable Q-table aside");
                }
                Err(StoreError::Decode {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    fn persist(&mut self, data: &TableData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let temp = self.sibling(".tmp");
        let file = File::create(&temp).map_err(|e| StoreError::io(&temp, e))?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        bincode::serialize_into(&mut encoder, data).map_err(StoreError::Encode)?;
        let mut writer = encoder.finish().map_err(|e| StoreError::io(&temp, e))?;
        writer.flush().map_err(|e| StoreError::io(&temp, e))?;
        drop(writer);

        fs::rename(&temp, &self.path).map_err(|e| StoreError::io(&self.path, e))?;
        info!(path = %self.path.display(), states = data.rows.len(), "Persisted Q-table");
        Ok(())
    }
}

/// In-memory store, for dry runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Option<TableData>,
    persist_count: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: TableData) -> Self {
        Self {
            data: Some(data),
            persist_count: 0,
        }
    }

    pub fn data(&self) -> Option<&TableData> {
        self.data.as_ref()
    }

    pub fn persist_count(&self) -> usize {
        self.persist_count
    }
}

impl TableStore for MemoryStore {
    fn load(&mut self) -> Result<Option<TableData>, StoreError> {
        Ok(self.data.clone())
    }

    fn persist(&mut self, data: &TableData) -> Result<(), StoreError> {
        self.data = Some(data.clone());
        self.persist_count += 1;
        Ok(())
    }
}

/// Load a table for `columns`, falling back to an empty one.
///
/// Missing storage is a cold start. Unreadable storage, or a table written
/// for a different action space, is logged and also yields an empty table.
pub fn load_table(
    store: &mut dyn TableStore,
    columns: Vec<String>,
    params: QLearningParams,
) -> QTable {
    let loaded = store.load().and_then(|data| match data {
        Some(data) => check_layout(data, &columns).map(Some),
        None => Ok(None),
    });

    match loaded {
        Ok(Some(data)) => QTable::from_data(data, params),
        Ok(None) => {
            info!("No stored Q-table, starting empty");
            QTable::new(columns, params)
        }
        Err(e) => {
            warn!(error = %e, "Discarding stored Q-table, starting empty");
            QTable::new(columns, params)
        }
    }
}

fn check_layout(data: TableData, columns: &[String]) -> Result<TableData, StoreError> {
    if data.columns != columns {
        return Err(StoreError::Layout(format!(
            "stored {} columns, expected {}",
            data.columns.len(),
            columns.len()
        )));
    }
    if !data.is_well_formed() {
        return Err(StoreError::Layout("row width differs from column count".to_string()));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::encoder::StateVector;
    use crate::rl::q_table::NextState;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    fn columns() -> Vec<String> {
        ["donothing", "trainmarine", "attack_15_15"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn trained_table() -> QTable {
        let mut table = QTable::new(columns(), QLearningParams::default());
        let a = StateVector::new([1, 0, 0, 0, 0, 0, 0, 0]).key();
        let b = StateVector::new([1, 1, 0, 3, 0, 0, 0, 1]).key();
        table.learn(a, 1, 0.0, NextState::State(b));
        table.learn(b, 2, 1.0, NextState::Terminal);
        table.learn(a, 1, 0.0, NextState::State(b));
        table
    }

    #[test]
    fn test_missing_file_is_cold_start() {
        let dir = TempDir::new().unwrap();
        let mut store = GzipFileStore::new(dir.path().join("absent.gz"));
        assert!(store.load().unwrap().is_none());

        let table = load_table(&mut store, columns(), QLearningParams::default());
        assert!(table.is_empty());
        assert_eq!(table.num_actions(), 3);
    }

    #[test]
    fn test_persist_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("table.gz");
        let table = trained_table();

        GzipFileStore::new(&path).persist(table.data()).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("nested").join("table.gz.tmp").exists());

        let mut store = GzipFileStore::new(&path);
        let loaded = load_table(&mut store, columns(), QLearningParams::default());
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_reloaded_table_chooses_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.gz");
        let mut original = trained_table();
        GzipFileStore::new(&path).persist(original.data()).unwrap();
        let mut reloaded = load_table(
            &mut GzipFileStore::new(&path),
            columns(),
            QLearningParams::default(),
        );

        let keys: Vec<_> = original.data().rows.keys().copied().collect();
        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            for key in &keys {
                assert_eq!(
                    original.choose_action(*key, &mut rng_a),
                    reloaded.choose_action(*key, &mut rng_b)
                );
            }
        }
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.gz");
        fs::write(&path, b"definitely not gzip").unwrap();

        let mut store = GzipFileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Decode { .. })));
        assert!(!path.exists());

        let quarantined = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .any(|e| e.file_name().to_string_lossy().starts_with("table.gz.corrupt-"));
        assert!(quarantined);

        let table = load_table(&mut store, columns(), QLearningParams::default());
        assert!(table.is_empty());
    }

    #[test]
    fn test_layout_mismatch_starts_empty() {
        let mut store = MemoryStore::with_data(trained_table().data().clone());
        let other_columns = vec!["donothing".to_string()];

        let table = load_table(&mut store, other_columns, QLearningParams::default());
        assert!(table.is_empty());
        assert_eq!(table.num_actions(), 1);
    }

    #[test]
    fn test_memory_store_counts_persists() {
        let mut store = MemoryStore::new();
        let table = trained_table();
        store.persist(table.data()).unwrap();
        store.persist(table.data()).unwrap();

        assert_eq!(store.persist_count(), 2);
        assert_eq!(store.data(), Some(table.data()));
    }
}
