//! Mapping store - persist column mappings and serve them per batch.
//!
//! Each mapping lives in its own `<id>.json` file under the store
//! directory. All entries are loaded into memory when the store opens;
//! writes go to disk first, then to memory.

pub mod page;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::logs::log_warning;
use crate::error::{StoreError, StoreResult};
use crate::models::{ColumnMapping, MappingRequest};
use crate::transform::mapping::MappingTable;
use crate::transform::path::TargetPath;

pub use page::{Page, PageRequest, SearchField, SortDirection, SortField};

/// Directory where mappings are stored (relative to current dir).
pub const DEFAULT_STORE_DIR: &str = ".sheetmap/mappings";

/// File-backed store of [`ColumnMapping`] entries keyed by id.
#[derive(Debug)]
pub struct MappingStore {
    dir: PathBuf,
    mappings: BTreeMap<u64, ColumnMapping>,
}

impl MappingStore {
    /// Open the store in [`DEFAULT_STORE_DIR`].
    pub fn open_default() -> StoreResult<Self> {
        Self::open(DEFAULT_STORE_DIR)
    }

    /// Open (creating if needed) a store rooted at `dir`.
    ///
    /// Files that fail to parse are skipped with a warning.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut mappings = BTreeMap::new();
        for entry in fs::read_dir(&dir)?.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(StoreError::from)
                .and_then(|content| Ok(serde_json::from_str::<ColumnMapping>(&content)?));
            match parsed {
                Ok(mapping) => {
                    mappings.insert(mapping.id, mapping);
                }
                Err(e) => log_warning(format!("Skipping {}: {}", path.display(), e)),
            }
        }

        Ok(Self { dir, mappings })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // -------------------------------------------------------------------------
    // Read
    // -------------------------------------------------------------------------

    /// All mappings ordered by id.
    pub fn list(&self) -> Vec<&ColumnMapping> {
        self.mappings.values().collect()
    }

    pub fn get(&self, id: u64) -> Option<&ColumnMapping> {
        self.mappings.get(&id)
    }

    pub fn exists(&self, id: u64) -> bool {
        self.mappings.contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.mappings.len()
    }

    /// One page of all mappings.
    pub fn page(&self, request: &PageRequest) -> Page<ColumnMapping> {
        Page::from_items(self.mappings.values().cloned().collect(), request)
    }

    /// Case-insensitive substring search on one field, paged.
    pub fn search(&self, field: SearchField, query: &str, request: &PageRequest) -> Page<ColumnMapping> {
        let needle = query.to_lowercase();
        let matches = self
            .mappings
            .values()
            .filter(|m| field.value_of(m).to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Page::from_items(matches, request)
    }

    /// Snapshot used by one transform batch.
    pub fn mapping_table(&self) -> MappingTable {
        let mappings: Vec<ColumnMapping> = self.mappings.values().cloned().collect();
        MappingTable::from_mappings(&mappings)
    }

    // -------------------------------------------------------------------------
    // Write
    // -------------------------------------------------------------------------

    /// Validate and store a new mapping under the next free id.
    pub fn create(&mut self, request: MappingRequest) -> StoreResult<ColumnMapping> {
        let request = validate(request)?;
        let id = self.mappings.keys().next_back().map_or(1, |last| last + 1);

        let mapping = ColumnMapping {
            id,
            json_path: request.json_path,
            main_column_name: request.main_column_name,
            alternate_column_names: request.alternate_column_names,
        };
        self.persist(&mapping)?;
        self.mappings.insert(id, mapping.clone());
        Ok(mapping)
    }

    /// Replace path, main name and alternates of an existing mapping.
    pub fn update(&mut self, id: u64, request: MappingRequest) -> StoreResult<ColumnMapping> {
        if !self.exists(id) {
            return Err(StoreError::NotFound(id));
        }
        let request = validate(request)?;

        let mapping = ColumnMapping {
            id,
            json_path: request.json_path,
            main_column_name: request.main_column_name,
            alternate_column_names: request.alternate_column_names,
        };
        self.persist(&mapping)?;
        self.mappings.insert(id, mapping.clone());
        Ok(mapping)
    }

    pub fn delete(&mut self, id: u64) -> StoreResult<()> {
        if !self.exists(id) {
            return Err(StoreError::NotFound(id));
        }
        fs::remove_file(self.file_for(id))?;
        self.mappings.remove(&id);
        Ok(())
    }

    /// Remove every mapping; returns how many were deleted.
    pub fn delete_all(&mut self) -> StoreResult<usize> {
        let ids: Vec<u64> = self.mappings.keys().copied().collect();
        for id in &ids {
            self.delete(*id)?;
        }
        Ok(ids.len())
    }

    /// Create one mapping per entry of a JSON array file.
    ///
    /// Stops at the first invalid entry; entries before it stay stored.
    pub fn import(&mut self, path: &Path) -> StoreResult<Vec<ColumnMapping>> {
        let content = fs::read_to_string(path)?;
        let requests: Vec<MappingRequest> = serde_json::from_str(&content)?;
        requests.into_iter().map(|r| self.create(r)).collect()
    }

    /// All mappings as a pretty JSON array of requests (ids omitted), the
    /// format accepted by [`MappingStore::import`].
    pub fn export(&self) -> StoreResult<String> {
        let requests: Vec<MappingRequest> = self.mappings.values().map(MappingRequest::from).collect();
        Ok(serde_json::to_string_pretty(&requests)?)
    }

    fn file_for(&self, id: u64) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn persist(&self, mapping: &ColumnMapping) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(mapping)?;
        fs::write(self.file_for(mapping.id), content)?;
        Ok(())
    }
}

/// Trim names and reject blank columns or unusable paths.
fn validate(mut request: MappingRequest) -> StoreResult<MappingRequest> {
    request.main_column_name = request.main_column_name.trim().to_string();
    request.json_path = request.json_path.trim().to_string();

    if request.main_column_name.is_empty() {
        return Err(StoreError::BlankColumn);
    }
    TargetPath::parse(&request.json_path).map_err(|reason| StoreError::InvalidPath {
        path: request.json_path.clone(),
        reason,
    })?;

    Ok(request)
}
