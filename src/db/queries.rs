//! Lookup queries and aggregate statistics.
//!
//! Search operations degrade to an empty result set on storage failure (the
//! cause is logged); aggregate operations propagate the error. Callers
//! render distinct messages for "no results" versus "cannot compute
//! statistics", so the asymmetry is part of the contract.

use tracing::error;

use super::Store;
use crate::error::{Error, Result};
use crate::models::{CountryCount, Geolocation, Location, Placemark};

/// Result cap for country-code lookups.
const COUNTRY_RESULT_CAP: u32 = 100;

/// Kilometers per degree of latitude; the coordinate search uses it as a
/// per-axis bounding-box tolerance, not a great-circle distance.
const KM_PER_DEGREE: f64 = 111.0;

fn swallow(result: sqlx::Result<Vec<Location>>, operation: &str) -> Vec<Location> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            error!("{} failed: {}", operation, e);
            Vec::new()
        }
    }
}

impl Store {
    /// Exact `(country, postal_code)` lookup with the rich field set.
    ///
    /// Country is upper-cased and the postal code trimmed before matching.
    /// Several places can share a postal code, so this returns every match.
    pub async fn geolocation(&self, country: &str, postal_code: &str) -> Vec<Geolocation> {
        let result = sqlx::query_as::<_, Location>(
            "SELECT * FROM locations WHERE country_code = ? AND postal_code = ?",
        )
        .bind(country.to_uppercase())
        .bind(postal_code.trim())
        .fetch_all(self.pool())
        .await;

        swallow(result, "geolocation lookup")
            .into_iter()
            .map(Geolocation::from)
            .collect()
    }

    /// Case-insensitive substring match on place name.
    pub async fn search_by_name(&self, name: &str) -> Vec<Placemark> {
        let result = sqlx::query_as::<_, Location>(
            "SELECT * FROM locations WHERE place_name LIKE ?",
        )
        .bind(format!("%{}%", name))
        .fetch_all(self.pool())
        .await;

        swallow(result, "name search")
            .into_iter()
            .map(Placemark::from)
            .collect()
    }

    /// Same predicate as [`Store::geolocation`], basic field set.
    pub async fn search_by_postal_code(&self, country: &str, postal_code: &str) -> Vec<Placemark> {
        let result = sqlx::query_as::<_, Location>(
            "SELECT * FROM locations WHERE country_code = ? AND postal_code = ?",
        )
        .bind(country.to_uppercase())
        .bind(postal_code.trim())
        .fetch_all(self.pool())
        .await;

        swallow(result, "postal code search")
            .into_iter()
            .map(Placemark::from)
            .collect()
    }

    /// All entries for a country, capped at 100 results.
    pub async fn search_by_country_code(&self, country: &str) -> Vec<Placemark> {
        let result = sqlx::query_as::<_, Location>(
            "SELECT * FROM locations WHERE country_code = ? LIMIT ?",
        )
        .bind(country.to_uppercase())
        .bind(COUNTRY_RESULT_CAP as i64)
        .fetch_all(self.pool())
        .await;

        swallow(result, "country code search")
            .into_iter()
            .map(Placemark::from)
            .collect()
    }

    /// Entries within `radius_km` of a point, nearest first.
    ///
    /// The radius becomes a `radius_km / 111` degree bounding box on both
    /// axes, and survivors are ordered by ascending Manhattan distance in
    /// degrees as a cheap proxy for true distance. Fails with
    /// [`Error::InvalidArgument`] before any storage access when
    /// `radius_km` is not positive.
    pub async fn search_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
        limit: u32,
    ) -> Result<Vec<Placemark>> {
        if radius_km <= 0.0 || radius_km.is_nan() {
            return Err(Error::InvalidArgument(format!(
                "radius must be positive, got {}",
                radius_km
            )));
        }

        let tolerance = radius_km / KM_PER_DEGREE;
        let result = sqlx::query_as::<_, Location>(
            "SELECT * FROM locations \
             WHERE latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ? \
             ORDER BY ABS(latitude - ?) + ABS(longitude - ?) \
             LIMIT ?",
        )
        .bind(lat - tolerance)
        .bind(lat + tolerance)
        .bind(lon - tolerance)
        .bind(lon + tolerance)
        .bind(lat)
        .bind(lon)
        .bind(limit as i64)
        .fetch_all(self.pool())
        .await;

        Ok(swallow(result, "coordinate search")
            .into_iter()
            .map(Placemark::from)
            .collect())
    }

    /// Total number of stored entries.
    pub async fn total_entries(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM locations")
            .fetch_one(self.pool())
            .await?)
    }

    /// Number of distinct country codes.
    pub async fn country_count(&self) -> Result<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(DISTINCT country_code) FROM locations")
                .fetch_one(self.pool())
                .await?,
        )
    }

    /// Country codes by descending entry count. Ties break in storage order.
    pub async fn top_countries(&self, limit: u32) -> Result<Vec<CountryCount>> {
        Ok(sqlx::query_as::<_, CountryCount>(
            "SELECT country_code, COUNT(*) AS entries FROM locations \
             GROUP BY country_code ORDER BY entries DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(self.pool())
        .await?)
    }
}
