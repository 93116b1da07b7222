//! Location row and the public result records mapped from it.

use serde::Serialize;

/// One stored postal/administrative area entry.
///
/// `(country_code, postal_code)` is deliberately not unique: several places
/// can share a postal code, so every lookup returns a set of rows.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Location {
    pub country_code: String,
    pub postal_code: String,
    pub place_name: String,
    pub admin_name1: String,
    pub admin_code1: String,
    pub admin_name2: String,
    pub admin_code2: String,
    pub admin_name3: String,
    pub admin_code3: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<i64>,
}

/// Basic search result used by the name/postal/country/coordinate lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placemark {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Location> for Placemark {
    fn from(row: Location) -> Self {
        Self {
            name: row.place_name,
            country: row.country_code,
            latitude: row.latitude,
            longitude: row.longitude,
        }
    }
}

/// Rich result for the exact `(country, postal_code)` geolocation lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub state: String,
    pub country_code: String,
    pub state_code: String,
    pub province: String,
    pub province_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<i64>,
}

impl From<Location> for Geolocation {
    fn from(row: Location) -> Self {
        Self {
            latitude: row.latitude,
            longitude: row.longitude,
            city: row.place_name,
            state: row.admin_name1,
            country_code: row.country_code,
            state_code: row.admin_code1,
            province: row.admin_name2,
            province_code: row.admin_code2,
            accuracy: row.accuracy,
        }
    }
}

/// One `top_countries` row.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct CountryCount {
    pub country_code: String,
    pub entries: i64,
}
