//! GeoIP2 record layouts for each supported dataset.
//!
//! Every field falls back to its zero value when the database entry does not
//! carry it, so a found address always yields the full set of columns
//! (`""`, `0`, `false` or an empty `names` map for missing data).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::record::ToRecord;
use crate::record_struct;

/// Localized names keyed by language code.
pub type Names = BTreeMap<String, String>;

/// A typed dataset record that can be decoded from a database and flattened.
pub trait Schema: DeserializeOwned + ToRecord + Default {
    /// Representative record used to enumerate the available columns.
    fn sample() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Continent {
    pub code: String,
    pub geoname_id: u32,
    pub names: Names,
}

record_struct!(Continent {
    code => "code",
    geoname_id => "geoname_id",
    names => "names",
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CountryInfo {
    pub geoname_id: u32,
    pub is_in_european_union: bool,
    pub iso_code: String,
    pub names: Names,
}

record_struct!(CountryInfo {
    geoname_id => "geoname_id",
    is_in_european_union => "is_in_european_union",
    iso_code => "iso_code",
    names => "names",
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RepresentedCountry {
    pub geoname_id: u32,
    pub is_in_european_union: bool,
    pub iso_code: String,
    pub names: Names,
    #[serde(rename = "type")]
    pub kind: String,
}

record_struct!(RepresentedCountry {
    geoname_id => "geoname_id",
    is_in_european_union => "is_in_european_union",
    iso_code => "iso_code",
    names => "names",
    kind => "type",
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Traits {
    pub is_anonymous_proxy: bool,
    pub is_satellite_provider: bool,
}

record_struct!(Traits {
    is_anonymous_proxy => "is_anonymous_proxy",
    is_satellite_provider => "is_satellite_provider",
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CityInfo {
    pub geoname_id: u32,
    pub names: Names,
}

record_struct!(CityInfo {
    geoname_id => "geoname_id",
    names => "names",
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Location {
    pub accuracy_radius: u16,
    pub latitude: f64,
    pub longitude: f64,
    pub metro_code: u32,
    pub time_zone: String,
}

record_struct!(Location {
    accuracy_radius => "accuracy_radius",
    latitude => "latitude",
    longitude => "longitude",
    metro_code => "metro_code",
    time_zone => "time_zone",
});

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Postal {
    pub code: String,
}

record_struct!(Postal { code => "code" });

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Subdivision {
    pub geoname_id: u32,
    pub iso_code: String,
    pub names: Names,
}

record_struct!(Subdivision {
    geoname_id => "geoname_id",
    iso_code => "iso_code",
    names => "names",
});

/// GeoIP2/GeoLite2 Country record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Country {
    pub continent: Continent,
    pub country: CountryInfo,
    pub registered_country: CountryInfo,
    pub represented_country: RepresentedCountry,
    pub traits: Traits,
}

record_struct!(Country {
    continent => "continent",
    country => "country",
    registered_country => "registered_country",
    represented_country => "represented_country",
    traits => "traits",
});

impl Schema for Country {}

/// GeoIP2/GeoLite2 City record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct City {
    pub city: CityInfo,
    pub continent: Continent,
    pub country: CountryInfo,
    pub location: Location,
    pub postal: Postal,
    pub registered_country: CountryInfo,
    pub represented_country: RepresentedCountry,
    pub subdivisions: Vec<Subdivision>,
    pub traits: Traits,
}

record_struct!(City {
    city => "city",
    continent => "continent",
    country => "country",
    location => "location",
    postal => "postal",
    registered_country => "registered_country",
    represented_country => "represented_country",
    subdivisions => "subdivisions",
    traits => "traits",
});

impl Schema for City {
    fn sample() -> Self {
        City {
            subdivisions: vec![Subdivision::default()],
            ..City::default()
        }
    }
}

/// GeoLite2 ASN record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Asn {
    pub autonomous_system_number: u32,
    pub autonomous_system_organization: String,
}

record_struct!(Asn {
    autonomous_system_number => "autonomous_system_number",
    autonomous_system_organization => "autonomous_system_organization",
});

impl Schema for Asn {}

/// GeoIP2 ISP record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Isp {
    pub autonomous_system_number: u32,
    pub autonomous_system_organization: String,
    pub isp: String,
    pub organization: String,
}

record_struct!(Isp {
    autonomous_system_number => "autonomous_system_number",
    autonomous_system_organization => "autonomous_system_organization",
    isp => "isp",
    organization => "organization",
});

impl Schema for Isp {}

/// GeoIP2 Domain record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Domain {
    pub domain: String,
}

record_struct!(Domain { domain => "domain" });

impl Schema for Domain {}

/// GeoIP2 Connection-Type record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionType {
    pub connection_type: String,
}

record_struct!(ConnectionType {
    connection_type => "connection_type",
});

impl Schema for ConnectionType {}

/// GeoIP2 Anonymous-IP record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnonymousIp {
    pub is_anonymous: bool,
    pub is_anonymous_vpn: bool,
    pub is_hosting_provider: bool,
    pub is_public_proxy: bool,
    pub is_tor_exit_node: bool,
}

record_struct!(AnonymousIp {
    is_anonymous => "is_anonymous",
    is_anonymous_vpn => "is_anonymous_vpn",
    is_hosting_provider => "is_hosting_provider",
    is_public_proxy => "is_public_proxy",
    is_tor_exit_node => "is_tor_exit_node",
});

impl Schema for AnonymousIp {}
