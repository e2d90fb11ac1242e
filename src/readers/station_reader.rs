use crate::error::{ProcessingError, Result};
use crate::models::{Scale, Station};
use crate::utils::constants::{DEFAULT_CATALOG_DATE_KEY, STATION_COLUMNS, VARIABLES_DIR};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use validator::Validate;

/// Where a station catalog comes from
#[derive(Debug, Clone)]
pub enum CatalogSource {
    /// An explicit station list file
    File(PathBuf),
    /// The first CSV shipped inside an extracted archive directory
    Directory {
        root: PathBuf,
        variable: String,
        scale: Scale,
        date_key: String,
    },
}

impl CatalogSource {
    pub fn directory(root: &Path, variable: &str, scale: Scale) -> Self {
        CatalogSource::Directory {
            root: root.to_path_buf(),
            variable: variable.to_string(),
            scale,
            date_key: DEFAULT_CATALOG_DATE_KEY.to_string(),
        }
    }

    /// Resolve to the catalog file on disk
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            CatalogSource::File(path) => {
                if path.is_file() {
                    Ok(path.clone())
                } else {
                    Err(ProcessingError::CatalogNotFound { path: path.clone() })
                }
            }
            CatalogSource::Directory {
                root,
                variable,
                scale,
                date_key,
            } => {
                let variables = root.join(VARIABLES_DIR);
                let candidates = [
                    variables.join(scale.as_str()).join(variable).join(date_key),
                    variables.join(variable).join(date_key),
                ];

                for dir in &candidates {
                    if let Some(path) = first_csv(dir)? {
                        return Ok(path);
                    }
                }

                Err(ProcessingError::CatalogNotFound {
                    path: candidates[0].clone(),
                })
            }
        }
    }
}

fn first_csv(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut csv_files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    csv_files.sort();

    Ok(csv_files.into_iter().next())
}

/// The stations of one run, in catalog order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationCatalog {
    stations: Vec<Station>,
}

impl StationCatalog {
    pub fn new(stations: Vec<Station>) -> Self {
        Self { stations }
    }

    /// Load and normalise a catalog.
    ///
    /// A strict parse is attempted first; when it fails the file is parsed
    /// again without its first line, which tolerates the disclaimer row
    /// PRISM puts above the header.
    pub fn load(source: &CatalogSource) -> Result<Self> {
        let path = source.resolve()?;
        let content = fs::read_to_string(&path)?;

        let stations = match parse_catalog(&content) {
            Ok(stations) => stations,
            Err(strict_err) => {
                debug!(
                    "Strict parse of {} failed ({}), retrying without first row",
                    path.display(),
                    strict_err
                );
                let remainder = content.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
                parse_catalog(remainder).map_err(|offset_err| ProcessingError::CatalogParseError {
                    path: path.clone(),
                    reason: format!("strict: {}; offset by one row: {}", strict_err, offset_err),
                })?
            }
        };

        info!("Loaded {} stations from {}", stations.len(), path.display());
        Ok(Self { stations })
    }

    /// Normalised column names, identical for every accepted source layout
    pub fn columns(&self) -> &'static [&'static str] {
        &STATION_COLUMNS
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.stations.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.name == name)
    }

    /// Coordinates of the station called `name` (exact match)
    pub fn lookup(&self, name: &str) -> Result<(f64, f64)> {
        self.get(name)
            .map(Station::coordinates)
            .ok_or_else(|| ProcessingError::StationNotFound {
                name: name.to_string(),
            })
    }

    /// Stations inside the inclusive bounding box
    pub fn within_bounds(&self, west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            stations: self
                .stations
                .iter()
                .filter(|s| s.is_within_bounds(west, south, east, north))
                .cloned()
                .collect(),
        }
    }

    /// Concatenate catalogs, keeping the first of any stations sharing
    /// name, longitude, latitude and elevation
    pub fn merge_unique<'a>(catalogs: impl IntoIterator<Item = &'a StationCatalog>) -> Self {
        let mut stations: Vec<Station> = Vec::new();
        for catalog in catalogs {
            for station in &catalog.stations {
                let duplicate = stations.iter().any(|s| {
                    s.name == station.name
                        && s.longitude == station.longitude
                        && s.latitude == station.latitude
                        && s.elevation == station.elevation
                });
                if !duplicate {
                    stations.push(station.clone());
                }
            }
        }
        Self { stations }
    }

    /// Persist the catalog in the normalised schema
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = WriterBuilder::new().from_path(path)?;
        writer.write_record(STATION_COLUMNS)?;
        for s in &self.stations {
            writer.write_record([
                s.key.clone(),
                s.name.clone(),
                s.longitude.to_string(),
                s.latitude.to_string(),
                s.elevation.to_string(),
                s.network.clone(),
                s.station_id.clone(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Parse catalog text whose first line is a header row.
///
/// Header names are discarded; columns are mapped positionally onto
/// `STATION_COLUMNS`.
fn parse_catalog(content: &str) -> Result<Vec<Station>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let header_len = reader.headers()?.len();
    if header_len != STATION_COLUMNS.len() {
        return Err(ProcessingError::InvalidFormat(format!(
            "Expected {} columns, found {}",
            STATION_COLUMNS.len(),
            header_len
        )));
    }

    let mut stations = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or("").to_string();
        let number = |i: usize| -> Result<f64> {
            let raw = record.get(i).unwrap_or("");
            raw.parse::<f64>().map_err(|_| {
                ProcessingError::InvalidFormat(format!(
                    "Invalid {} value: '{}'",
                    STATION_COLUMNS[i], raw
                ))
            })
        };

        let station = Station::new(
            field(0),
            field(1),
            number(2)?,
            number(3)?,
            number(4)?,
            field(5),
            field(6),
        );
        station.validate()?;
        stations.push(station);
    }

    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const HEADER: &str = "Station,Name,Longitude,Latitude,Elevation(m),Network,stnid";

    fn write_catalog(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_load_catalog_without_offset() -> Result<()> {
        let file = write_catalog(&[
            HEADER,
            "0,STONEVILLE EXP STN,-90.92,33.42,38,COOP,USC00228445",
            "1,GREENWOOD,-90.08,33.50,40,COOP,USC00223645",
        ]);

        let catalog = StationCatalog::load(&CatalogSource::File(file.path().to_path_buf()))?;
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.stations()[0].name, "STONEVILLE EXP STN");
        assert_eq!(catalog.stations()[1].station_id, "USC00223645");
        Ok(())
    }

    #[test]
    fn test_load_catalog_with_disclaimer_row() -> Result<()> {
        let plain = write_catalog(&[HEADER, "0,GREENWOOD,-90.08,33.50,40,COOP,USC00223645"]);
        let offset = write_catalog(&[
            "PRISM station data are provisional",
            "Id,Station Name,Lon,Lat,Elev,Net,Station Id",
            "0,GREENWOOD,-90.08,33.50,40,COOP,USC00223645",
        ]);

        let a = StationCatalog::load(&CatalogSource::File(plain.path().to_path_buf()))?;
        let b = StationCatalog::load(&CatalogSource::File(offset.path().to_path_buf()))?;
        assert_eq!(a.columns(), b.columns());
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_unparseable_catalog() {
        let file = write_catalog(&["a,b", "c,d", "e,f"]);
        let result = StationCatalog::load(&CatalogSource::File(file.path().to_path_buf()));
        assert!(matches!(result, Err(ProcessingError::CatalogParseError { .. })));
    }

    #[test]
    fn test_missing_catalog() {
        let dir = TempDir::new().unwrap();
        let result = StationCatalog::load(&CatalogSource::directory(dir.path(), "ppt", Scale::Daily));
        assert!(matches!(result, Err(ProcessingError::CatalogNotFound { .. })));
    }

    #[test]
    fn test_directory_source_picks_first_csv() -> Result<()> {
        let dir = TempDir::new()?;
        let day_dir = dir.path().join("variables/daily/ppt/19810101");
        fs::create_dir_all(&day_dir)?;
        fs::write(day_dir.join("b.csv"), "not,a,catalog\n")?;
        fs::write(
            day_dir.join("a.stn.csv"),
            format!("{}\n0,GREENWOOD,-90.08,33.50,40,COOP,USC00223645\n", HEADER),
        )?;

        let catalog = StationCatalog::load(&CatalogSource::directory(dir.path(), "ppt", Scale::Daily))?;
        assert_eq!(catalog.names(), vec!["GREENWOOD"]);
        Ok(())
    }

    #[test]
    fn test_lookup() {
        let catalog = StationCatalog::new(vec![Station::new(
            "0".into(),
            "GREENWOOD".into(),
            -90.08,
            33.5,
            40.0,
            "COOP".into(),
            "USC00223645".into(),
        )]);

        assert_eq!(catalog.lookup("GREENWOOD").unwrap(), (-90.08, 33.5));
        assert!(matches!(
            catalog.lookup("greenwood"),
            Err(ProcessingError::StationNotFound { .. })
        ));
    }

    #[test]
    fn test_merge_unique_and_bounds() {
        let a = StationCatalog::new(vec![
            Station::new("0".into(), "A".into(), -90.0, 33.0, 1.0, "N".into(), "1".into()),
            Station::new("1".into(), "B".into(), -80.0, 40.0, 1.0, "N".into(), "2".into()),
        ]);
        let b = StationCatalog::new(vec![
            Station::new("9".into(), "A".into(), -90.0, 33.0, 1.0, "N".into(), "1".into()),
            Station::new("2".into(), "C".into(), -89.0, 32.0, 1.0, "N".into(), "3".into()),
        ]);

        let merged = StationCatalog::merge_unique([&a, &b]);
        assert_eq!(merged.names(), vec!["A", "B", "C"]);
        assert_eq!(merged.stations()[0].key, "0");

        let inside = merged.within_bounds(-91.7, 30.1, -88.1, 35.0);
        assert_eq!(inside.names(), vec!["A", "C"]);
    }

    #[test]
    fn test_write_and_reload() -> Result<()> {
        let dir = TempDir::new()?;
        let catalog = StationCatalog::new(vec![Station::new(
            "0".into(),
            "GREENWOOD".into(),
            -90.08,
            33.5,
            40.0,
            "COOP".into(),
            "USC00223645".into(),
        )]);
        let path = dir.path().join("out/stations.csv");
        catalog.write_csv(&path)?;

        let reloaded = StationCatalog::load(&CatalogSource::File(path))?;
        assert_eq!(reloaded, catalog);
        Ok(())
    }
}
