//! Search criteria resolution.
//!
//! The search command accepts exactly one criteria group. Ambiguous or
//! incomplete flag combinations are rejected here, before any storage
//! access, so the caller can tell a usage error apart from "no results".

use anyhow::{bail, Result};

/// One fully-specified way of searching the database.
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Name(String),
    PostalCode {
        country_code: String,
        postal_code: String,
    },
    CountryCode(String),
    Coordinates {
        lat: f64,
        lon: f64,
        radius_km: f64,
    },
}

const USAGE: &str = "provide exactly one search criteria: --name, \
    --postal-code with --country-code, --country-code, or --lat with --lon";

/// Resolve raw search flags into a single criteria group.
pub fn resolve(
    name: Option<String>,
    postal_code: Option<String>,
    country_code: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    radius_km: f64,
) -> Result<Criteria> {
    let wants_name = name.is_some();
    let wants_postal = postal_code.is_some();
    let wants_country = country_code.is_some() && !wants_postal;
    let wants_coords = lat.is_some() || lon.is_some();

    let groups =
        wants_name as u32 + wants_postal as u32 + wants_country as u32 + wants_coords as u32;
    match groups {
        0 => bail!("no search criteria given; {}", USAGE),
        1 => {}
        _ => bail!("ambiguous search criteria; {}", USAGE),
    }

    if let Some(name) = name {
        return Ok(Criteria::Name(name));
    }
    if let Some(postal_code) = postal_code {
        let Some(country_code) = country_code else {
            bail!("--postal-code also needs --country-code");
        };
        return Ok(Criteria::PostalCode {
            country_code,
            postal_code,
        });
    }
    if let Some(country_code) = country_code {
        return Ok(Criteria::CountryCode(country_code));
    }

    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok(Criteria::Coordinates {
            lat,
            lon,
            radius_km,
        }),
        _ => bail!("coordinate search needs both --lat and --lon"),
    }
}
