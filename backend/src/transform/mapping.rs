//! Column name to target path lookup used by the row transformer.

use std::collections::HashMap;

use crate::models::ColumnMapping;

/// Read-only column name -> raw target path table.
///
/// Built once per batch from the mapping store and shared by every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    paths: HashMap<String, String>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index stored mappings by main column name, then by alternate names.
    ///
    /// Main names are registered first so an alternate spelling never
    /// shadows another entry's main name. Among equal keys the first entry
    /// wins.
    pub fn from_mappings(mappings: &[ColumnMapping]) -> Self {
        let mut table = Self::new();
        for mapping in mappings {
            table.insert_if_absent(&mapping.main_column_name, &mapping.json_path);
        }
        for mapping in mappings {
            for alternate in &mapping.alternate_column_names {
                table.insert_if_absent(alternate, &mapping.json_path);
            }
        }
        table
    }

    /// Map `column` to `path`, replacing any previous entry.
    pub fn insert(&mut self, column: impl Into<String>, path: impl Into<String>) {
        self.paths.insert(column.into(), path.into());
    }

    fn insert_if_absent(&mut self, column: &str, path: &str) {
        if column.trim().is_empty() {
            return;
        }
        self.paths
            .entry(column.to_string())
            .or_insert_with(|| path.to_string());
    }

    /// Raw target path for a column, if mapped.
    pub fn path_for(&self, column: &str) -> Option<&str> {
        self.paths.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.paths.contains_key(column)
    }

    /// Headers that have no entry in the table, in header order.
    pub fn unmapped<'a>(&self, headers: &'a [String]) -> Vec<&'a str> {
        headers
            .iter()
            .map(String::as_str)
            .filter(|h| !self.contains(h))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MappingTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = MappingTable::new();
        for (column, path) in iter {
            table.insert(column, path);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(id: u64, main: &str, path: &str, alternates: &[&str]) -> ColumnMapping {
        ColumnMapping {
            id,
            json_path: path.to_string(),
            main_column_name: main.to_string(),
            alternate_column_names: alternates.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_alternates_resolve_to_same_path() {
        let table = MappingTable::from_mappings(&[mapping(1, "USER_ID", "$.user.id", &["UID"])]);
        assert_eq!(table.path_for("USER_ID"), Some("$.user.id"));
        assert_eq!(table.path_for("UID"), Some("$.user.id"));
        assert_eq!(table.path_for("uid"), None);
    }

    #[test]
    fn test_main_name_beats_alternate() {
        let table = MappingTable::from_mappings(&[
            mapping(1, "NAME", "$.user.name", &["COUNTRY"]),
            mapping(2, "COUNTRY", "$.country", &[]),
        ]);
        assert_eq!(table.path_for("COUNTRY"), Some("$.country"));
    }

    #[test]
    fn test_first_duplicate_wins() {
        let table = MappingTable::from_mappings(&[
            mapping(1, "A", "$.first", &[]),
            mapping(2, "A", "$.second", &[]),
        ]);
        assert_eq!(table.path_for("A"), Some("$.first"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unmapped_headers() {
        let table: MappingTable = [("A", "$.a")].into_iter().collect();
        let headers = vec!["A".to_string(), "B".to_string()];
        assert_eq!(table.unmapped(&headers), vec!["B"]);
    }
}
