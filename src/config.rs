//! Layered configuration.
//!
//! Settings come from, lowest precedence first: built-in defaults,
//! `~/.geoipcli.yaml`, `~/.config/geoipcli.yaml`, an explicit `--conffile`,
//! and finally command line flags. Each layer only overrides the values it
//! actually sets.
//!
//! ```yaml
//! paths:
//!   country: ~/GeoIP/GeoLite2-Country.mmdb
//!   asn: ~/GeoIP/GeoLite2-ASN.mmdb
//! output:
//!   format: csv
//!   columns:
//!     - country.country.iso_code
//!     - asn.autonomous_system_organization
//!   skip_invalid_ip: false
//! ```

use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::debug;

use crate::dataset::DatasetKind;
use crate::error::{Error, Result};
use crate::output::{Escapes, Format};

/// Default config files, lowest precedence first.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["~/.geoipcli.yaml", "~/.config/geoipcli.yaml"];

/// Database paths section of a config layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathsLayer {
    pub country: Option<String>,
    pub city: Option<String>,
    pub asn: Option<String>,
    pub isp: Option<String>,
    pub domain: Option<String>,
    pub connection_type: Option<String>,
    pub anonymousip: Option<String>,
}

impl PathsLayer {
    fn slot(&mut self, kind: DatasetKind) -> &mut Option<String> {
        match kind {
            DatasetKind::Country => &mut self.country,
            DatasetKind::City => &mut self.city,
            DatasetKind::Asn => &mut self.asn,
            DatasetKind::Isp => &mut self.isp,
            DatasetKind::Domain => &mut self.domain,
            DatasetKind::ConnectionType => &mut self.connection_type,
            DatasetKind::AnonymousIp => &mut self.anonymousip,
        }
    }

    pub fn get(&self, kind: DatasetKind) -> Option<&str> {
        match kind {
            DatasetKind::Country => self.country.as_deref(),
            DatasetKind::City => self.city.as_deref(),
            DatasetKind::Asn => self.asn.as_deref(),
            DatasetKind::Isp => self.isp.as_deref(),
            DatasetKind::Domain => self.domain.as_deref(),
            DatasetKind::ConnectionType => self.connection_type.as_deref(),
            DatasetKind::AnonymousIp => self.anonymousip.as_deref(),
        }
    }

    pub fn set(&mut self, kind: DatasetKind, path: impl Into<String>) {
        *self.slot(kind) = Some(path.into());
    }
}

/// Output section of a config layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputLayer {
    pub format: Option<Format>,
    pub columns: Option<Vec<String>>,
    pub skip_invalid_ip: Option<bool>,
    pub escape_comma: Option<bool>,
    pub escape_double_quotes: Option<bool>,
}

/// One source of settings. Every value is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub paths: PathsLayer,
    pub output: OutputLayer,
}

macro_rules! override_with {
    ($self:ident, $other:ident, $($section:ident . $field:ident),* $(,)?) => {
        $(
            if $other.$section.$field.is_some() {
                $self.$section.$field = $other.$section.$field;
            }
        )*
    };
}

impl ConfigLayer {
    /// Parse a layer from YAML text. An empty document is an empty layer.
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(ConfigLayer::default());
        }
        serde_yaml::from_str(text)
    }

    /// Read and parse a layer from a YAML file.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        debug!(%path, "loading config");
        let text = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        ConfigLayer::from_yaml(&text).map_err(|source| Error::ConfigParse {
            path: path.to_owned(),
            source,
        })
    }

    /// Apply `other` on top of `self`; values set in `other` win.
    pub fn merge(mut self, other: ConfigLayer) -> Self {
        override_with!(
            self,
            other,
            paths.country,
            paths.city,
            paths.asn,
            paths.isp,
            paths.domain,
            paths.connection_type,
            paths.anonymousip,
            output.format,
            output.columns,
            output.skip_invalid_ip,
            output.escape_comma,
            output.escape_double_quotes,
        );
        self
    }
}

/// Load the default config files that exist, then `explicit` if given.
///
/// Missing default files are skipped. A missing explicit file is an error.
pub fn load_layers(explicit: Option<&Utf8Path>) -> Result<ConfigLayer> {
    let mut layer = ConfigLayer::default();

    for path in DEFAULT_CONFIG_PATHS {
        let path = expand_tilde(path);
        if !path.exists() {
            debug!(%path, "skip default config (not found)");
            continue;
        }
        layer = layer.merge(ConfigLayer::load(&path)?);
    }

    if let Some(path) = explicit {
        layer = layer.merge(ConfigLayer::load(&expand_tilde(path.as_str()))?);
    }

    Ok(layer)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Finalized settings, built once from the merged layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Expanded database path per configured dataset. Blank paths are dropped.
    pub paths: BTreeMap<DatasetKind, Utf8PathBuf>,
    pub format: Format,
    /// Requested columns. Empty means the opened datasets' defaults.
    pub columns: Vec<String>,
    pub skip_invalid_ip: bool,
    pub escapes: Escapes,
}

impl From<ConfigLayer> for Settings {
    fn from(layer: ConfigLayer) -> Self {
        let paths = DatasetKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let path = layer.paths.get(kind)?.trim();
                (!path.is_empty()).then(|| (kind, expand_tilde(path)))
            })
            .collect();

        let defaults = Escapes::default();
        Settings {
            paths,
            format: layer.output.format.unwrap_or_default(),
            columns: layer.output.columns.unwrap_or_default(),
            skip_invalid_ip: layer.output.skip_invalid_ip.unwrap_or(false),
            escapes: Escapes {
                comma: layer.output.escape_comma.unwrap_or(defaults.comma),
                double_quotes: layer
                    .output
                    .escape_double_quotes
                    .unwrap_or(defaults.double_quotes),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_full_document() {
        let layer = ConfigLayer::from_yaml(
            r#"
paths:
  country: /data/GeoLite2-Country.mmdb
  connection_type: /data/GeoIP2-Connection-Type.mmdb
  enterprise: /data/GeoIP2-Enterprise.mmdb
output:
  format: tsv
  columns: [country.country.iso_code, connection_type.connection_type]
  skip_invalid_ip: true
  escape_comma: false
"#,
        )
        .unwrap();

        assert_eq!(
            layer.paths.country.as_deref(),
            Some("/data/GeoLite2-Country.mmdb")
        );
        assert_eq!(
            layer.paths.get(DatasetKind::ConnectionType),
            Some("/data/GeoIP2-Connection-Type.mmdb")
        );
        assert_eq!(layer.output.format, Some(Format::Tsv));
        assert_eq!(layer.output.columns.as_ref().map(Vec::len), Some(2));
        assert_eq!(layer.output.skip_invalid_ip, Some(true));
        assert_eq!(layer.output.escape_comma, Some(false));
        assert_eq!(layer.output.escape_double_quotes, None);
    }

    #[test]
    fn empty_document_is_empty_layer() {
        assert_eq!(ConfigLayer::from_yaml("\n").unwrap(), ConfigLayer::default());
    }

    #[test]
    fn bad_format_is_rejected() {
        assert!(ConfigLayer::from_yaml("output:\n  format: json\n").is_err());
    }

    #[test]
    fn later_layers_override_only_what_they_set() {
        let mut base = ConfigLayer::default();
        base.paths.set(DatasetKind::Country, "/base/country.mmdb");
        base.paths.set(DatasetKind::Asn, "/base/asn.mmdb");
        base.output.columns = Some(vec!["asn.autonomous_system_number".to_string()]);

        let mut top = ConfigLayer::default();
        top.paths.set(DatasetKind::Asn, "/top/asn.mmdb");
        top.output.skip_invalid_ip = Some(true);

        let merged = base.merge(top);
        assert_eq!(merged.paths.get(DatasetKind::Country), Some("/base/country.mmdb"));
        assert_eq!(merged.paths.get(DatasetKind::Asn), Some("/top/asn.mmdb"));
        assert_eq!(
            merged.output.columns,
            Some(vec!["asn.autonomous_system_number".to_string()])
        );
        assert_eq!(merged.output.skip_invalid_ip, Some(true));
    }

    #[test]
    fn settings_defaults() {
        let settings = Settings::from(ConfigLayer::default());
        assert!(settings.paths.is_empty());
        assert_eq!(settings.format, Format::Csv);
        assert!(settings.columns.is_empty());
        assert!(!settings.skip_invalid_ip);
        assert_eq!(settings.escapes, Escapes::default());
    }

    #[test]
    fn settings_drop_blank_paths() {
        let mut layer = ConfigLayer::default();
        layer.paths.set(DatasetKind::City, "  ");
        layer.paths.set(DatasetKind::Domain, "/data/GeoIP2-Domain.mmdb");
        let settings = Settings::from(layer);
        assert_eq!(settings.paths.len(), 1);
        assert_eq!(
            settings.paths.get(&DatasetKind::Domain),
            Some(&Utf8PathBuf::from("/data/GeoIP2-Domain.mmdb"))
        );
    }

    #[test]
    fn tilde_expands_to_home() {
        let expanded = expand_tilde("~/GeoIP/GeoLite2-City.mmdb");
        assert!(expanded.as_str().ends_with("/GeoIP/GeoLite2-City.mmdb"));
        if std::env::var_os("HOME").is_some() {
            assert!(!expanded.as_str().starts_with('~'));
        }
        assert_eq!(expand_tilde("/abs/path.mmdb"), Utf8PathBuf::from("/abs/path.mmdb"));
    }

    #[test]
    fn load_reads_file_and_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "paths:\n  isp: /data/GeoIP2-ISP.mmdb").unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();

        let layer = ConfigLayer::load(path).unwrap();
        assert_eq!(layer.paths.isp.as_deref(), Some("/data/GeoIP2-ISP.mmdb"));

        let missing = Utf8Path::new("/nonexistent/geoipcli.yaml");
        let err = ConfigLayer::load(missing).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
        assert!(err.to_string().contains("/nonexistent/geoipcli.yaml"));
    }

    #[test]
    fn load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "paths: 42").unwrap();
        let path = Utf8Path::from_path(file.path()).unwrap();
        assert!(matches!(
            ConfigLayer::load(path),
            Err(Error::ConfigParse { .. })
        ));
    }
}
