//! Dataset stores - where confirmed imports land.
//!
//! The import core only ever talks to a [`DatasetStore`] through
//! `update_schools` / `update_students`, and only on confirm. Both calls
//! upsert by record id: known ids are replaced in place, new ids are
//! appended in input order.
//!
//! Two implementations are provided:
//! - [`MemoryStore`] - plain in-memory collections
//! - [`FileStore`] - the same, snapshotted to a JSON file after every write

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StoreResult;
use crate::models::{Dataset, School, Student};

/// Default snapshot location (relative to current dir)
pub const DEFAULT_STORE_PATH: &str = ".educa/dataset.json";

/// The working dataset the registry edits.
pub trait DatasetStore {
    /// Current schools, in insertion order.
    fn schools(&self) -> &[School];

    /// Current students, in insertion order.
    fn students(&self) -> &[Student];

    /// Merge schools by id.
    fn update_schools(&mut self, records: Vec<School>) -> StoreResult<()>;

    /// Merge students by id.
    fn update_students(&mut self, records: Vec<Student>) -> StoreResult<()>;
}

/// Upsert `incoming` into `existing`, keyed by `id`.
fn upsert<T>(existing: &mut Vec<T>, incoming: Vec<T>, id: impl Fn(&T) -> &str) {
    let mut positions: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, item)| (id(item).to_string(), i))
        .collect();

    for item in incoming {
        match positions.get(id(&item)) {
            Some(&i) => existing[i] = item,
            None => {
                positions.insert(id(&item).to_string(), existing.len());
                existing.push(item);
            }
        }
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-memory dataset.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    dataset: Dataset,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

impl DatasetStore for MemoryStore {
    fn schools(&self) -> &[School] {
        &self.dataset.schools
    }

    fn students(&self) -> &[Student] {
        &self.dataset.students
    }

    fn update_schools(&mut self, records: Vec<School>) -> StoreResult<()> {
        upsert(&mut self.dataset.schools, records, |s| s.id.as_str());
        Ok(())
    }

    fn update_students(&mut self, records: Vec<Student>) -> StoreResult<()> {
        upsert(&mut self.dataset.students, records, |s| s.id.as_str());
        Ok(())
    }
}

// =============================================================================
// File Store
// =============================================================================

/// Dataset persisted as one JSON snapshot (`{ schools, students }`).
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Open the default snapshot
    pub fn open_default() -> StoreResult<Self> {
        Self::open(DEFAULT_STORE_PATH)
    }

    /// Open a snapshot file. A missing file is an empty dataset.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = PathBuf::from(path.as_ref());
        let dataset = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str::<Dataset>(&content)?
        } else {
            Dataset::default()
        };

        Ok(Self {
            path,
            inner: MemoryStore::with_dataset(dataset),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dataset(&self) -> &Dataset {
        self.inner.dataset()
    }

    /// Write the snapshot; a temp file is renamed over the old one.
    pub fn save(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self.inner.dataset())?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl DatasetStore for FileStore {
    fn schools(&self) -> &[School] {
        self.inner.schools()
    }

    fn students(&self) -> &[Student] {
        self.inner.students()
    }

    fn update_schools(&mut self, records: Vec<School>) -> StoreResult<()> {
        self.inner.update_schools(records)?;
        self.save()
    }

    fn update_students(&mut self, records: Vec<Student>) -> StoreResult<()> {
        self.inner.update_students(records)?;
        self.save()
    }
}

// =============================================================================
// Backup export
// =============================================================================

/// Full copy of a store, in backup shape.
pub fn backup(store: &dyn DatasetStore) -> Dataset {
    Dataset {
        schools: store.schools().to_vec(),
        students: store.students().to_vec(),
    }
}

/// `backup_educa_YYYY-MM-DD.json`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("backup_educa_{}.json", date.format("%Y-%m-%d"))
}

/// Backup file name for today (local time).
pub fn today_backup_file_name() -> String {
    backup_file_name(chrono::Local::now().date_naive())
}
