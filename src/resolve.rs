use std::io;
use std::net::IpAddr;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::column::{self, resolve_columns, Column};
use crate::dataset::{DatasetKind, Datasets};
use crate::error::{Error, Result};
use crate::flatten::FlatMap;
use crate::output::RowWriter;

/// Turns input addresses into output rows.
///
/// Holds the opened datasets and the validated column list for the whole
/// run. Nothing is mutated after construction.
#[derive(Debug)]
pub struct Resolver {
    datasets: Datasets,
    columns: Vec<Column>,
    skip_invalid_ip: bool,
}

impl Resolver {
    /// Validate `columns` against `datasets`.
    ///
    /// An empty column list selects the default columns of every opened
    /// dataset.
    pub fn new<S: AsRef<str>>(
        datasets: Datasets,
        columns: &[S],
        skip_invalid_ip: bool,
    ) -> Result<Self> {
        if datasets.is_empty() {
            return Err(Error::NoDatasets);
        }

        let columns = if columns.is_empty() {
            debug!("output columns not configured, using defaults");
            resolve_columns(&datasets.default_columns(), &datasets)?
        } else {
            resolve_columns(columns, &datasets)?
        };

        debug!(
            columns = %columns.iter().map(Column::name).collect::<Vec<_>>().join(", "),
            "output"
        );

        Ok(Resolver {
            datasets,
            columns,
            skip_invalid_ip,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Resolve one input address into a row.
    ///
    /// The first field is the trimmed input, followed by one field per
    /// column. Returns `Ok(None)` for an invalid address when invalid
    /// addresses are skipped.
    pub fn resolve(&self, address: &str) -> Result<Option<Vec<String>>> {
        let address = address.trim();
        let ip: IpAddr = match address.parse() {
            Ok(ip) => ip,
            Err(_) if self.skip_invalid_ip => {
                debug!(%address, "skip invalid IP address");
                return Ok(None);
            }
            Err(_) => {
                return Err(Error::InvalidAddress {
                    address: address.to_string(),
                })
            }
        };

        // A dataset is looked up at most once per address.
        let mut lookups: FxHashMap<DatasetKind, Option<FlatMap>> = FxHashMap::default();
        let mut row = Vec::with_capacity(self.columns.len() + 1);
        row.push(address.to_string());

        for column in &self.columns {
            let dataset = column.dataset();
            if !lookups.contains_key(&dataset) {
                let flat = column::lookup_flat(dataset, &self.datasets, ip)?;
                lookups.insert(dataset, flat);
            }
            let flat = lookups.get(&dataset).and_then(Option::as_ref);
            row.push(column::field_value(column, flat));
        }

        Ok(Some(row))
    }

    /// Resolve every address and write one row for each, in input order.
    ///
    /// Blank lines are ignored. Stops at the first fatal error.
    pub fn run<I, S, W>(&self, addresses: I, writer: &mut RowWriter<W>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        W: io::Write,
    {
        for address in addresses {
            self.process(address.as_ref(), writer)?;
        }
        Ok(())
    }

    /// Resolve a single address and write its row, if any.
    #[inline]
    pub fn process<W: io::Write>(&self, address: &str, writer: &mut RowWriter<W>) -> Result<()> {
        if address.trim().is_empty() {
            return Ok(());
        }
        if let Some(row) = self.resolve(address)? {
            writer.write_row(&row)?;
        }
        Ok(())
    }
}
