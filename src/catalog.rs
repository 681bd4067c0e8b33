//! Place catalog loading from CSV.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::info;

use crate::error::{GeoError, Result};
use crate::models::Place;

const CITY_COLUMN: &str = "city";
const LOCATION_COLUMN: &str = "location";
const LONGITUDE_COLUMN: &str = "longitude";
const LATITUDE_COLUMN: &str = "latitude";

/// Load places from a CSV file.
///
/// Requires a `city` column. Coordinates come from a `location` column, from
/// `longitude`/`latitude` columns, or both; every other column is kept as a
/// string attribute.
pub fn load_places<P: AsRef<Path>>(path: P) -> Result<Vec<Place>> {
    let path = path.as_ref();
    info!("Loading places from {}", path.display());

    let file = File::open(path).map_err(|e| GeoError::data_source(path, e.into()))?;
    let places = read_places(file, path)?;

    info!("Loaded {} places", places.len());
    Ok(places)
}

/// Read places from any CSV source
pub fn parse_places<R: Read>(reader: R) -> Result<Vec<Place>> {
    read_places(reader, Path::new("<input>"))
}

fn read_places<R: Read>(reader: R, source: &Path) -> Result<Vec<Place>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| GeoError::data_source(source, e))?
        .clone();

    let position = |name: &str| headers.iter().position(|h| h.trim() == name);

    let city_idx = position(CITY_COLUMN)
        .ok_or_else(|| GeoError::Schema(format!("column '{}' not found", CITY_COLUMN)))?;
    let location_idx = position(LOCATION_COLUMN);
    let lon_idx = position(LONGITUDE_COLUMN);
    let lat_idx = position(LATITUDE_COLUMN);

    let known = [Some(city_idx), location_idx, lon_idx, lat_idx];
    let attribute_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| !known.contains(&Some(*idx)))
        .map(|(idx, h)| (idx, h.trim().to_string()))
        .collect();

    let mut places = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| GeoError::data_source(source, e))?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let attributes: BTreeMap<String, String> = attribute_cols
            .iter()
            .filter_map(|(idx, key)| Some((key.clone(), cell(Some(*idx))?.to_string())))
            .collect();

        places.push(Place {
            city: cell(Some(city_idx)).unwrap_or_default().to_string(),
            location: cell(location_idx).map(String::from),
            longitude: cell(lon_idx).and_then(|v| v.parse().ok()),
            latitude: cell(lat_idx).and_then(|v| v.parse().ok()),
            attributes,
        });
    }

    Ok(places)
}

/// Places whose city name equals `city` exactly
pub fn places_in_city<'a>(catalog: &'a [Place], city: &str) -> Vec<&'a Place> {
    catalog.iter().filter(|p| p.city == city).collect()
}
