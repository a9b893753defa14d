//! Flattening of nested lookup results into dotted-path keys.
//!
//! A city lookup such as
//!
//! ```text
//! city:    { names: { en: "Linköping" } }
//! country: { iso_code: "SE", names: {} }
//! ```
//!
//! flattens to `city.names.en -> "Linköping"`, `country.iso_code -> "SE"` and
//! `country.names.[language] -> ""`. Column names are written against these
//! exact keys, so the key shape must not change.

use rustc_hash::FxHashMap;

use crate::record::{Record, Value};

/// Path segment injected for a string-keyed map that exists but is empty.
pub const LANGUAGE_PLACEHOLDER: &str = "[language]";

/// Dotted path to scalar value for one lookup result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatMap {
    entries: FxHashMap<String, Value>,
}

impl FlatMap {
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// All keys in lexicographic order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Flatten a record into a [`FlatMap`].
///
/// Every scalar leaf is stored under the `.`-joined path of map keys, field
/// tags and list indexes that leads to it. A scalar at the root has no path
/// and is dropped.
pub fn flatten(record: &Record) -> FlatMap {
    let mut flat = FlatMap::default();
    let mut path = String::new();
    flatten_into(record, &mut path, &mut flat.entries);
    flat
}

fn flatten_into(record: &Record, path: &mut String, out: &mut FxHashMap<String, Value>) {
    match record {
        Record::Absent => {}
        Record::Scalar(value) => {
            if !path.is_empty() {
                out.insert(path.clone(), value.clone());
            }
        }
        Record::Map(map) if map.is_empty() => {
            let value = Record::Scalar(Value::String(String::new()));
            descend(path, LANGUAGE_PLACEHOLDER, |path| flatten_into(&value, path, out));
        }
        Record::Map(map) => {
            for (key, child) in map {
                descend(path, key, |path| flatten_into(child, path, out));
            }
        }
        Record::Struct(fields) => {
            for field in fields {
                descend(path, field.segment(), |path| {
                    flatten_into(&field.value, path, out)
                });
            }
        }
        Record::List(items) => {
            let mut index = itoa::Buffer::new();
            for (i, child) in items.iter().enumerate() {
                descend(path, index.format(i), |path| {
                    flatten_into(child, path, out)
                });
            }
        }
    }
}

/// Run `f` with `segment` appended to `path`, then restore `path`.
///
/// The separator is only added when `path` is non-empty, which means an
/// empty segment still leaves a trailing `.` behind a non-empty parent.
#[inline]
fn descend(path: &mut String, segment: &str, f: impl FnOnce(&mut String)) {
    let len = path.len();
    if len > 0 {
        path.push('.');
    }
    path.push_str(segment);
    f(path);
    path.truncate(len);
}
