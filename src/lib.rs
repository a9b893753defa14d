//! The geoipcli library: resolve IP addresses against GeoIP2 databases and
//! print selected attributes as CSV or TSV rows.
//!
//! Lookup results are flattened into dotted-path keys, and a column such as
//! `city.city.names.en` selects the `city` dataset and the `city.names.en`
//! key of its flattened record.
//!
//! # Examples
//!
//! Resolving rows against a custom dataset:
//!
//! ```rust
//! use std::net::IpAddr;
//! use geoipcli::{Datasets, DatasetKind, Escapes, Format, Lookup, Resolver, RowWriter};
//! use geoipcli::record::{Field, Record, Value};
//!
//! #[derive(Debug)]
//! struct Everywhere;
//!
//! impl Lookup for Everywhere {
//!     fn lookup(&self, _ip: IpAddr) -> geoipcli::Result<Record> {
//!         Ok(Record::Struct(vec![Field::tagged(
//!             "country",
//!             Record::Struct(vec![Field::tagged("iso_code", Value::String("US".into()))]),
//!         )]))
//!     }
//! }
//!
//! let mut datasets = Datasets::default();
//! datasets.insert(DatasetKind::Country, Everywhere);
//! let resolver = Resolver::new(datasets, &[] as &[&str], false)?;
//!
//! let mut writer = RowWriter::new(Vec::new(), Format::Csv, Escapes::default());
//! resolver.run(["8.8.8.8"], &mut writer)?;
//! assert_eq!(writer.into_inner()?, b"8.8.8.8,US\n");
//! # Ok::<(), geoipcli::Error>(())
//! ```

pub mod column;
pub mod config;
pub mod dataset;
pub mod error;
pub mod flatten;
pub mod input;
pub mod output;
pub mod record;
pub mod resolve;
pub mod schema;

pub use crate::column::{catalog, extract, Column};
pub use crate::config::{ConfigLayer, Settings};
pub use crate::dataset::{DatasetKind, Datasets, Lookup, MmdbDataset};
pub use crate::error::{Error, Result};
pub use crate::flatten::{flatten, FlatMap};
pub use crate::output::{Escapes, Format, RowWriter};
pub use crate::resolve::Resolver;
