use std::{collections::HashMap, fs, path::Path};

use campus_core::Institution;
use serde_json::{Map, Value};

use crate::error::RosterError;

/// Fields copied from a supplementary record onto an institution.
pub const SUPPLEMENTARY_FIELDS: [&str; 5] = [
    "majorCategory",
    "natureOfRunning",
    "is985",
    "is211",
    "isDoubleFirstClass",
];

/// Supplementary records keyed by institution name.
#[derive(Debug, Clone, Default)]
pub struct SupplementaryIndex {
    records: HashMap<String, Map<String, Value>>,
}

impl SupplementaryIndex {
    /// Loads a JSON array of objects. Entries without a string `name` are
    /// ignored; a later entry replaces an earlier one with the same name.
    ///
    /// # Errors
    ///
    /// I/O failure or a document that is not an array of objects.
    pub fn load(path: &Path) -> Result<Self, RosterError> {
        let raw = fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let items: Vec<Map<String, Value>> =
            serde_json::from_str(&raw).map_err(|source| RosterError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_records(items))
    }

    /// Builds the index from parsed records.
    #[must_use]
    pub fn from_records(items: impl IntoIterator<Item = Map<String, Value>>) -> Self {
        let records = items
            .into_iter()
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?.to_string();
                Some((name, item))
            })
            .collect();
        Self { records }
    }

    /// Number of named records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no record was loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copies the supplementary fields onto `institution`. Returns `false`
    /// and sets every field to null when no record matches its name.
    pub fn merge(&self, institution: &mut Institution) -> bool {
        if let Some(record) = self.records.get(&institution.name) {
            for field in SUPPLEMENTARY_FIELDS {
                if let Some(value) = record.get(field) {
                    institution
                        .supplementary
                        .insert(field.to_string(), value.clone());
                }
            }
            true
        } else {
            for field in SUPPLEMENTARY_FIELDS {
                institution
                    .supplementary
                    .insert(field.to_string(), Value::Null);
            }
            false
        }
    }
}
