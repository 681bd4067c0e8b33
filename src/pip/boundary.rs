//! Region boundary construction from flattened CSV rows.
//!
//! Ring vertices are stored as indexed columns:
//! `geometry.coordinates[0][i][0]` (longitude) and
//! `geometry.coordinates[0][i][1]` (latitude).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use geo::Coord;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{GeoError, Result};
use crate::models::{BoundaryCollection, Crs, Region};

pub const DEFAULT_NAME_COLUMN: &str = "properties.name";

const COORDINATE_COLUMN_PATTERN: &str = r"^geometry\.coordinates\[0\]\[(\d+)\]\[([01])\]$";

/// Column positions of one ring vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VertexColumns {
    lon: usize,
    lat: usize,
}

/// Header layout resolved once per source
#[derive(Debug)]
struct BoundarySchema {
    name: usize,
    vertices: Vec<VertexColumns>,
    /// Every other column, kept as region properties
    properties: Vec<(usize, String)>,
}

impl BoundarySchema {
    fn resolve(headers: &StringRecord, name_column: &str) -> Result<Self> {
        let pattern = Regex::new(COORDINATE_COLUMN_PATTERN)
            .map_err(|e| GeoError::Schema(format!("invalid coordinate pattern: {}", e)))?;

        let mut lon_cols: Vec<(usize, usize)> = Vec::new();
        let mut lat_cols: Vec<(usize, usize)> = Vec::new();
        let mut name = None;
        let mut properties = Vec::new();

        for (col, header) in headers.iter().enumerate() {
            let header = header.trim();
            if let Some(caps) = pattern.captures(header) {
                let Ok(vertex) = caps[1].parse::<usize>() else {
                    continue;
                };
                if &caps[2] == "0" {
                    lon_cols.push((vertex, col));
                } else {
                    lat_cols.push((vertex, col));
                }
            } else if header == name_column {
                name = Some(col);
            } else {
                properties.push((col, header.to_string()));
            }
        }

        if lon_cols.is_empty() || lat_cols.is_empty() {
            return Err(GeoError::Schema(
                "no geometry.coordinates[0][i][0|1] columns found".to_string(),
            ));
        }

        let name = name.ok_or_else(|| {
            GeoError::Schema(format!("region name column '{}' not found", name_column))
        })?;

        // Numeric order, so vertex 10 follows vertex 9
        lon_cols.sort_unstable();
        lat_cols.sort_unstable();

        if lon_cols.len() != lat_cols.len() {
            warn!(
                "Unbalanced coordinate columns: {} longitude vs {} latitude",
                lon_cols.len(),
                lat_cols.len()
            );
        }

        let vertices = lon_cols
            .iter()
            .zip(lat_cols.iter())
            .map(|(&(_, lon), &(_, lat))| VertexColumns { lon, lat })
            .collect();

        Ok(Self {
            name,
            vertices,
            properties,
        })
    }

    /// Walk the vertex columns in index order, skipping empty slots.
    ///
    /// A dropped interior vertex joins its neighbours directly; the ring is
    /// not repaired.
    fn ring(&self, record: &StringRecord) -> Vec<Coord<f64>> {
        self.vertices
            .iter()
            .filter_map(|cols| {
                let lon = parse_cell(record.get(cols.lon))?;
                let lat = parse_cell(record.get(cols.lat))?;
                Some(Coord { x: lon, y: lat })
            })
            .collect()
    }

    fn properties(&self, record: &StringRecord) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .filter_map(|(col, key)| {
                let value = record.get(*col)?.trim();
                (!value.is_empty()).then(|| (key.clone(), value.to_string()))
            })
            .collect()
    }
}

fn parse_cell(cell: Option<&str>) -> Option<f64> {
    let cell = cell?.trim();
    if cell.is_empty() {
        return None;
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            debug!("Skipping unparseable coordinate cell '{}'", cell);
            None
        }
    }
}

/// Builds a [`BoundaryCollection`] from flattened boundary rows
#[derive(Debug, Clone)]
pub struct BoundaryBuilder {
    name_column: String,
}

impl Default for BoundaryBuilder {
    fn default() -> Self {
        Self {
            name_column: DEFAULT_NAME_COLUMN.to_string(),
        }
    }
}

impl BoundaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different column for the region identifier
    pub fn with_name_column(mut self, column: impl Into<String>) -> Self {
        self.name_column = column.into();
        self
    }

    /// Load boundaries from a CSV file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<BoundaryCollection> {
        let path = path.as_ref();
        info!("Loading region boundaries from {}", path.display());

        let file = File::open(path).map_err(|e| GeoError::data_source(path, e.into()))?;
        self.read(file, path)
    }

    /// Build boundaries from any CSV source
    pub fn build<R: Read>(&self, reader: R) -> Result<BoundaryCollection> {
        self.read(reader, Path::new("<input>"))
    }

    fn read<R: Read>(&self, reader: R, source: &Path) -> Result<BoundaryCollection> {
        // Rows may stop before the last vertex column
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| GeoError::data_source(source, e))?
            .clone();
        let schema = BoundarySchema::resolve(&headers, &self.name_column)?;

        debug!(
            "Boundary schema: {} vertex columns, {} property columns",
            schema.vertices.len(),
            schema.properties.len()
        );

        let mut regions = Vec::new();
        let mut degenerate = 0usize;

        for result in csv_reader.records() {
            let record = result.map_err(|e| GeoError::data_source(source, e))?;

            let name = record.get(schema.name).unwrap_or_default().trim().to_string();
            let region = Region::new(name, schema.ring(&record))
                .with_properties(schema.properties(&record));

            if region.is_degenerate() {
                debug!(
                    "Region '{}' has {} distinct vertices",
                    region.name,
                    region.distinct_vertex_count()
                );
                degenerate += 1;
            }

            regions.push(region);
        }

        if degenerate > 0 {
            warn!("{} degenerate region boundaries loaded", degenerate);
        }
        info!("Loaded {} region boundaries", regions.len());

        Ok(BoundaryCollection::new(Crs::Wgs84, regions))
    }
}

/// Load boundaries with the default column layout
pub fn load_boundaries<P: AsRef<Path>>(path: P) -> Result<BoundaryCollection> {
    BoundaryBuilder::new().load_file(path)
}
