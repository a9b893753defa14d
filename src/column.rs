//! Column names and per-column value extraction.
//!
//! A column is written as `<dataset>.<dotted.path>`, for example
//! `city.city.names.en`. The first segment picks the dataset, the rest is the
//! key into the flattened lookup result.

use std::fmt;
use std::net::IpAddr;

use tracing::debug;

use crate::dataset::{DatasetKind, Datasets};
use crate::error::{Error, Result};
use crate::flatten::{flatten, FlatMap};
use crate::record::Value;

/// A parsed column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    dataset: DatasetKind,
    key_start: usize,
}

impl Column {
    /// Parse `dataset.path[.more]`.
    pub fn parse(name: &str) -> Result<Self> {
        let Some((prefix, _)) = name.split_once('.') else {
            return Err(Error::InvalidColumn {
                column: name.to_string(),
            });
        };
        let dataset = prefix.parse().map_err(|_| Error::UnknownDataset {
            column: name.to_string(),
        })?;

        Ok(Column {
            name: name.to_string(),
            dataset,
            key_start: prefix.len() + 1,
        })
    }

    /// The full column name as given.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dataset(&self) -> DatasetKind {
        self.dataset
    }

    /// The flattened-record key, i.e. everything after the dataset segment.
    pub fn key(&self) -> &str {
        &self.name[self.key_start..]
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Parse `names` and check each against the opened datasets.
///
/// This runs once before any input is read so that a bad column never
/// produces a partial row.
pub fn resolve_columns<S: AsRef<str>>(names: &[S], datasets: &Datasets) -> Result<Vec<Column>> {
    if names.is_empty() {
        return Err(Error::NoColumns);
    }

    names
        .iter()
        .map(|name| {
            let column = Column::parse(name.as_ref())?;
            if !datasets.contains(column.dataset()) {
                return Err(Error::DatasetNotOpened {
                    column: column.name,
                });
            }
            Ok(column)
        })
        .collect()
}

/// Look up `ip` in the column's dataset and flatten the result.
///
/// `Ok(None)` means the dataset had nothing for the address.
pub fn lookup_flat(
    dataset: DatasetKind,
    datasets: &Datasets,
    ip: IpAddr,
) -> Result<Option<FlatMap>> {
    let table = datasets.get(dataset).ok_or_else(|| Error::DatasetNotOpened {
        column: dataset.to_string(),
    })?;

    match table.lookup(ip) {
        Ok(record) => Ok(Some(flatten(&record))),
        Err(err) => {
            debug!(%ip, %dataset, error = %err, "lookup miss");
            Ok(None)
        }
    }
}

/// Resolve one column for one address.
///
/// A lookup miss is not an error: the column is simply empty.
pub fn extract(column: &Column, datasets: &Datasets, ip: IpAddr) -> Result<String> {
    let flat = lookup_flat(column.dataset(), datasets, ip)?;
    Ok(field_value(column, flat.as_ref()))
}

/// The column's string value from an already flattened lookup result.
#[inline]
pub fn field_value(column: &Column, flat: Option<&FlatMap>) -> String {
    flat.and_then(|flat| flat.get(column.key()))
        .map(coerce)
        .unwrap_or_default()
}

/// Render a scalar the way prior versions of the tool printed it.
pub fn coerce(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::UInt(n) => itoa::Buffer::new().format(*n).to_owned(),
        // Display is the shortest round-trip form and never uses an exponent.
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
    }
}

/// Every column name available from each dataset, in canonical dataset
/// order and sorted within a dataset.
pub fn catalog() -> Vec<(DatasetKind, Vec<String>)> {
    DatasetKind::ALL
        .into_iter()
        .map(|kind| {
            let flat = flatten(&kind.sample_record());
            let columns = flat
                .sorted_keys()
                .into_iter()
                .map(|key| format!("{}.{}", kind, key))
                .collect();
            (kind, columns)
        })
        .collect()
}
