use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};
use serde::Serialize;

use super::error::LoadError;

/// Separator between species and condition in a raw class name
pub const LABEL_SEPARATOR: &str = "___";

const INDEX_COLUMN: &str = "class_index";
const LABEL_COLUMN: &str = "class";
const UNKNOWN: &str = "Unknown";

/// One class of the model's output layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEntry {
    pub index: usize,
    pub raw_name: String,
    pub species: String,
    pub condition: String,
    pub is_healthy: bool,
}

impl LabelEntry {
    /// Derives species, condition and health flag from a raw
    /// `<Species>___<Condition>` class name.
    pub fn new(index: usize, raw_name: impl Into<String>) -> Self {
        let raw_name = raw_name.into();
        let (species, condition) = format_label(&raw_name);
        let is_healthy = is_healthy_label(&raw_name);
        Self { index, raw_name, species, condition, is_healthy }
    }

    /// Entry returned for indices the catalog does not know about.
    pub fn unknown(index: usize) -> Self {
        Self {
            index,
            raw_name: UNKNOWN.to_string(),
            species: UNKNOWN.to_string(),
            condition: UNKNOWN.to_string(),
            is_healthy: false,
        }
    }
}

/// Splits a raw class name into display `(species, condition)`.
///
/// Underscores become spaces. A name without the `___` separator has
/// condition `"Unknown"`.
pub fn format_label(raw_name: &str) -> (String, String) {
    let mut parts = raw_name.split(LABEL_SEPARATOR);
    let species = parts.next().unwrap_or_default().replace('_', " ");
    let condition = parts
        .next()
        .map(|c| c.replace('_', " "))
        .unwrap_or_else(|| UNKNOWN.to_string());
    (species, condition)
}

/// Inverse of [`format_label`] for names that contain no literal spaces.
pub fn join_label(species: &str, condition: &str) -> String {
    format!(
        "{}{}{}",
        species.replace(' ', "_"),
        LABEL_SEPARATOR,
        condition.replace(' ', "_")
    )
}

/// True iff the lowercased raw name contains `"healthy"`.
pub fn is_healthy_label(raw_name: &str) -> bool {
    raw_name.to_lowercase().contains("healthy")
}

/// Immutable index → label mapping, dense over `[0, N)`.
#[derive(Debug, Clone)]
pub struct LabelCatalog {
    entries: Vec<LabelEntry>,
}

impl LabelCatalog {
    /// Loads a CSV label table.
    ///
    /// The table needs a header row. Columns named `class_index` and `class`
    /// are used when present, otherwise the first two columns. Extra columns
    /// are ignored.
    ///
    /// # Errors
    /// - `TableUnreadable` if the file cannot be opened or read
    /// - `MalformedTable` for a missing cell, a non-integer index, an empty
    ///   table or indices that are not dense `0..N-1`
    /// - `DuplicateIndex` if two rows share an index
    pub fn load(table_path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let table_path = table_path.as_ref();
        info!("Loading label table from {:?}", table_path);
        let file = File::open(table_path).map_err(|e| LoadError::TableUnreadable {
            path: table_path.to_path_buf(),
            message: e.to_string(),
        })?;
        let catalog = Self::parse(file, table_path)?;
        info!("Label table loaded: {} classes", catalog.size());
        Ok(catalog)
    }

    /// Same as [`LabelCatalog::load`] over an arbitrary reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        Self::parse(reader, Path::new("<reader>"))
    }

    /// Builds a catalog from `(index, raw_name)` pairs under the same rules
    /// as a table load.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        let rows = entries
            .into_iter()
            .enumerate()
            .map(|(i, (index, raw))| (i as u64 + 1, index, raw.into()))
            .collect();
        Self::from_rows(rows)
    }

    fn parse<R: Read>(reader: R, path: &Path) -> Result<Self, LoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers().map_err(|e| csv_error(path, e))?.clone();
        let index_col = headers
            .iter()
            .position(|h| h.trim() == INDEX_COLUMN)
            .unwrap_or(0);
        let label_col = headers
            .iter()
            .position(|h| h.trim() == LABEL_COLUMN)
            .unwrap_or(1);
        if index_col == label_col {
            return Err(LoadError::MalformedTable(format!(
                "index and label resolve to the same column ({})",
                index_col
            )));
        }
        debug!("Label table columns: index={}, label={}", index_col, label_col);

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(|e| csv_error(path, e))?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let index_field = record
                .get(index_col)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    LoadError::MalformedTable(format!("line {}: missing class index", line))
                })?;
            let label = record
                .get(label_col)
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| {
                    LoadError::MalformedTable(format!("line {}: missing class label", line))
                })?;
            let index: usize = index_field.parse().map_err(|_| {
                LoadError::MalformedTable(format!(
                    "line {}: class index '{}' is not a non-negative integer",
                    line, index_field
                ))
            })?;

            rows.push((line, index, label.to_string()));
        }

        Self::from_rows(rows)
    }

    fn from_rows(rows: Vec<(u64, usize, String)>) -> Result<Self, LoadError> {
        if rows.is_empty() {
            return Err(LoadError::MalformedTable("label table has no rows".into()));
        }

        let mut seen = HashSet::with_capacity(rows.len());
        for (line, index, _) in &rows {
            if !seen.insert(*index) {
                return Err(LoadError::DuplicateIndex { index: *index, line: *line });
            }
        }

        // No duplicates and every index below N means every slot is filled.
        let n = rows.len();
        let mut slots: Vec<Option<LabelEntry>> = vec![None; n];
        for (line, index, raw) in rows {
            if index >= n {
                return Err(LoadError::MalformedTable(format!(
                    "line {}: class index {} outside dense range 0..{}",
                    line, index, n
                )));
            }
            slots[index] = Some(LabelEntry::new(index, raw));
        }

        Ok(Self { entries: slots.into_iter().flatten().collect() })
    }

    /// Returns the entry for `index`, or the `Unknown` sentinel.
    pub fn get(&self, index: usize) -> LabelEntry {
        self.lookup(index)
            .cloned()
            .unwrap_or_else(|| LabelEntry::unknown(index))
    }

    pub fn lookup(&self, index: usize) -> Option<&LabelEntry> {
        self.entries.get(index)
    }

    /// Raw class names in index order
    pub fn all_labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.raw_name.as_str()).collect()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelEntry> {
        self.entries.iter()
    }
}

fn csv_error(path: &Path, err: csv::Error) -> LoadError {
    match err.kind() {
        csv::ErrorKind::Io(_) => LoadError::TableUnreadable {
            path: path.to_path_buf(),
            message: err.to_string(),
        },
        _ => LoadError::MalformedTable(err.to_string()),
    }
}
