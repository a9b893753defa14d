use camino::Utf8PathBuf;
use std::net::IpAddr;

/// Error types for the geoipcli library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Column names a dataset that geoipcli does not know about.
    #[error("unknown column name: {column}")]
    UnknownDataset { column: String },

    /// Column is not of the form `dataset.path[.more]`.
    #[error("invalid column name: {column}")]
    InvalidColumn { column: String },

    /// Column refers to a dataset whose database was not opened.
    #[error("database corresponding to the column name not found: {column}")]
    DatasetNotOpened { column: String },

    /// No database paths were configured.
    #[error("no databases")]
    NoDatasets,

    /// Column list resolved to nothing.
    #[error("no output columns")]
    NoColumns,

    /// Input line is not an IPv4 or IPv6 address.
    #[error("invalid IP address: {address}")]
    InvalidAddress { address: String },

    /// Address is valid but has no entry in the dataset.
    #[error("address not found: {ip}")]
    AddressNotFound { ip: IpAddr },

    /// IP address lookup failed in the MMDB database.
    #[error("lookup failed for {ip}")]
    LookupFailed {
        ip: IpAddr,
        #[source]
        source: maxminddb::MaxMindDBError,
    },

    /// MMDB database could not be opened.
    #[error("failed to read GeoIP database: {path}")]
    DatabaseOpen {
        path: Utf8PathBuf,
        #[source]
        source: maxminddb::MaxMindDBError,
    },

    /// Config file could not be read.
    #[error("failed to read config file: {path}")]
    ConfigRead {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid YAML for the expected layout.
    #[error("failed to parse config file: {path}")]
    ConfigParse {
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Writing a delimited row failed.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results using the library error.
pub type Result<T> = std::result::Result<T, Error>;
