//! Data model shared by the import pipeline and the query engine.

mod location;

pub use location::{CountryCount, Geolocation, Location, Placemark};
