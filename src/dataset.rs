use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use camino::Utf8Path;
use maxminddb::{MaxMindDBError, Mmap, Reader};
use tracing::debug;

use crate::error::{Error, Result};
use crate::record::{Record, ToRecord};
use crate::schema::{self, Schema};

/// The GeoIP2 datasets geoipcli knows how to query.
///
/// Declaration order is the canonical order used for default columns and
/// listings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatasetKind {
    Country,
    City,
    Asn,
    Isp,
    Domain,
    ConnectionType,
    AnonymousIp,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 7] = [
        DatasetKind::Country,
        DatasetKind::City,
        DatasetKind::Asn,
        DatasetKind::Isp,
        DatasetKind::Domain,
        DatasetKind::ConnectionType,
        DatasetKind::AnonymousIp,
    ];

    /// Name used as the first segment of column names and as the config key.
    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Country => "country",
            DatasetKind::City => "city",
            DatasetKind::Asn => "asn",
            DatasetKind::Isp => "isp",
            DatasetKind::Domain => "domain",
            DatasetKind::ConnectionType => "connection_type",
            DatasetKind::AnonymousIp => "anonymousip",
        }
    }

    /// Columns printed when no column list is configured.
    pub fn default_columns(self) -> &'static [&'static str] {
        match self {
            DatasetKind::Country => &["country.country.iso_code"],
            DatasetKind::City => &["city.country.iso_code", "city.city.names.en"],
            DatasetKind::Asn => &[
                "asn.autonomous_system_number",
                "asn.autonomous_system_organization",
            ],
            DatasetKind::Isp => &[
                "isp.autonomous_system_number",
                "isp.autonomous_system_organization",
            ],
            DatasetKind::Domain => &["domain.domain"],
            DatasetKind::ConnectionType => &["connection_type.connection_type"],
            DatasetKind::AnonymousIp => &["anonymousip.is_anonymous"],
        }
    }

    /// A representative record of this dataset, used to list its columns.
    pub fn sample_record(self) -> Record {
        match self {
            DatasetKind::Country => schema::Country::sample().to_record(),
            DatasetKind::City => schema::City::sample().to_record(),
            DatasetKind::Asn => schema::Asn::sample().to_record(),
            DatasetKind::Isp => schema::Isp::sample().to_record(),
            DatasetKind::Domain => schema::Domain::sample().to_record(),
            DatasetKind::ConnectionType => schema::ConnectionType::sample().to_record(),
            DatasetKind::AnonymousIp => schema::AnonymousIp::sample().to_record(),
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string is not a recognized dataset name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDatasetName(pub String);

impl fmt::Display for UnknownDatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown dataset: {}", self.0)
    }
}

impl std::error::Error for UnknownDatasetName {}

impl FromStr for DatasetKind {
    type Err = UnknownDatasetName;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownDatasetName(s.to_string()))
    }
}

/// Something that can resolve an address to a record.
///
/// Any error is treated by callers as "no data for this address".
pub trait Lookup: fmt::Debug {
    fn lookup(&self, ip: IpAddr) -> Result<Record>;
}

/// A dataset backed by a memory-mapped MMDB file.
#[derive(Debug)]
pub struct MmdbDataset {
    kind: DatasetKind,
    reader: Reader<Mmap>,
}

impl MmdbDataset {
    /// Open the database at `path` as a dataset of the given kind.
    pub fn open(kind: DatasetKind, path: &Utf8Path) -> Result<Self> {
        let reader = Reader::open_mmap(path).map_err(|source| Error::DatabaseOpen {
            path: path.to_owned(),
            source,
        })?;

        debug!(
            dataset = %kind,
            path = %path,
            database_type = %reader.metadata.database_type,
            "opened database"
        );

        Ok(Self { kind, reader })
    }

    fn decode<T: Schema>(&self, ip: IpAddr) -> Result<Record> {
        match self.reader.lookup::<T>(ip) {
            Ok(record) => Ok(record.to_record()),
            Err(MaxMindDBError::AddressNotFoundError(_)) => Err(Error::AddressNotFound { ip }),
            Err(source) => Err(Error::LookupFailed { ip, source }),
        }
    }
}

impl Lookup for MmdbDataset {
    fn lookup(&self, ip: IpAddr) -> Result<Record> {
        match self.kind {
            DatasetKind::Country => self.decode::<schema::Country>(ip),
            DatasetKind::City => self.decode::<schema::City>(ip),
            DatasetKind::Asn => self.decode::<schema::Asn>(ip),
            DatasetKind::Isp => self.decode::<schema::Isp>(ip),
            DatasetKind::Domain => self.decode::<schema::Domain>(ip),
            DatasetKind::ConnectionType => self.decode::<schema::ConnectionType>(ip),
            DatasetKind::AnonymousIp => self.decode::<schema::AnonymousIp>(ip),
        }
    }
}

/// The opened datasets, keyed by kind.
///
/// Built once at startup and only read afterwards.
#[derive(Debug, Default)]
pub struct Datasets {
    tables: BTreeMap<DatasetKind, Box<dyn Lookup>>,
}

impl Datasets {
    /// Open an MMDB file for every configured path.
    pub fn open<'a, I>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DatasetKind, &'a Utf8Path)>,
    {
        let mut datasets = Datasets::default();
        for (kind, path) in paths {
            datasets.insert(kind, MmdbDataset::open(kind, path)?);
        }
        Ok(datasets)
    }

    /// Register a dataset, replacing any previous one of the same kind.
    pub fn insert(&mut self, kind: DatasetKind, dataset: impl Lookup + 'static) {
        self.tables.insert(kind, Box::new(dataset));
    }

    pub fn get(&self, kind: DatasetKind) -> Option<&dyn Lookup> {
        self.tables.get(&kind).map(|d| d.as_ref())
    }

    pub fn contains(&self, kind: DatasetKind) -> bool {
        self.tables.contains_key(&kind)
    }

    /// Opened kinds in canonical order.
    pub fn kinds(&self) -> impl Iterator<Item = DatasetKind> + '_ {
        self.tables.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Default columns of every opened dataset, in canonical order.
    pub fn default_columns(&self) -> Vec<String> {
        self.kinds()
            .flat_map(|kind| kind.default_columns().iter().map(|c| c.to_string()))
            .collect()
    }
}
