//! Paging and sorting over stored mappings.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::ColumnMapping;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Sortable mapping attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Id,
    JsonPath,
    MainColumnName,
    AlternateColumnNames,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Text attributes searchable with a substring query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchField {
    JsonPath,
    MainColumnName,
    AlternateColumnNames,
}

impl SearchField {
    /// Text the query is matched against. Alternates are joined with `", "`.
    pub fn value_of(&self, mapping: &ColumnMapping) -> String {
        match self {
            SearchField::JsonPath => mapping.json_path.clone(),
            SearchField::MainColumnName => mapping.main_column_name.clone(),
            SearchField::AlternateColumnNames => mapping.alternate_column_names.join(", "),
        }
    }
}

impl std::str::FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json-path" | "jsonPath" | "path" => Ok(SearchField::JsonPath),
            "main-column" | "mainColumnName" | "column" => Ok(SearchField::MainColumnName),
            "alternate-columns" | "alternateColumnNames" | "alternates" => {
                Ok(SearchField::AlternateColumnNames)
            }
            other => Err(format!("unknown search field '{}'", other)),
        }
    }
}

/// Page selection, with the defaults of the list endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Zero-based page index.
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

fn default_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: SortField::default(),
            sort_direction: SortDirection::default(),
        }
    }
}

impl PageRequest {
    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    pub fn effective_size(&self) -> usize {
        self.size.clamp(1, MAX_PAGE_SIZE)
    }

    fn compare(&self, a: &ColumnMapping, b: &ColumnMapping) -> Ordering {
        let ordering = match self.sort_by {
            SortField::Id => a.id.cmp(&b.id),
            SortField::JsonPath => a.json_path.cmp(&b.json_path),
            SortField::MainColumnName => a.main_column_name.cmp(&b.main_column_name),
            SortField::AlternateColumnNames => a.alternate_column_names.cmp(&b.alternate_column_names),
        }
        .then(a.id.cmp(&b.id));

        match self.sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Zero-based page index.
    pub number: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
    pub first: bool,
    pub last: bool,
}

impl Page<ColumnMapping> {
    /// Sort `items` and cut out the requested page.
    pub fn from_items(mut items: Vec<ColumnMapping>, request: &PageRequest) -> Self {
        items.sort_by(|a, b| request.compare(a, b));

        let size = request.effective_size();
        let total_elements = items.len();
        let total_pages = total_elements.div_ceil(size);
        let content: Vec<ColumnMapping> = items
            .into_iter()
            .skip(request.page.saturating_mul(size))
            .take(size)
            .collect();

        Page {
            content,
            number: request.page,
            size,
            total_elements,
            total_pages,
            first: request.page == 0,
            last: request.page.saturating_add(1) >= total_pages,
        }
    }
}
