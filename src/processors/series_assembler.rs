use crate::error::{ProcessingError, Result};
use crate::models::Station;
use crate::processors::extraction::{format_cell, parse_cell, ExtractionTable};
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Dates × stations table for one variable.
///
/// Rows are unique date keys in first-seen order; columns are station
/// names. Missing cells hold NaN.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WideSeriesTable {
    dates: Vec<String>,
    stations: Vec<String>,
    rows: Vec<Vec<f32>>,
}

impl WideSeriesTable {
    pub fn new(stations: Vec<String>) -> Self {
        Self {
            dates: Vec::new(),
            stations,
            rows: Vec::new(),
        }
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    pub fn station_index(&self, name: &str) -> Option<usize> {
        self.stations.iter().position(|s| s == name)
    }

    /// Value for a station on a date row; `None` when the cell is empty
    pub fn value(&self, row: usize, station: usize) -> Option<f32> {
        self.rows
            .get(row)
            .and_then(|r| r.get(station))
            .copied()
            .filter(|v| !v.is_nan())
    }

    pub fn push_row(&mut self, date: String, values: Vec<f32>) {
        self.dates.push(date);
        self.rows.push(values);
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = WriterBuilder::new().from_path(path)?;

        let mut header = vec!["date"];
        header.extend(self.stations.iter().map(String::as_str));
        writer.write_record(&header)?;

        for (date, row) in self.dates.iter().zip(&self.rows) {
            let mut record = vec![date.clone()];
            record.extend((0..self.stations.len()).map(|i| {
                format_cell(row.get(i).copied().unwrap_or(f32::NAN))
            }));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let stations: Vec<String> = reader.headers()?.iter().skip(1).map(str::to_string).collect();
        let mut table = Self::new(stations);
        for record in reader.records() {
            let record = record?;
            let date = record.get(0).unwrap_or("").to_string();
            let values = (0..table.stations.len())
                .map(|i| parse_cell(record.get(i + 1).unwrap_or("")))
                .collect();
            table.push_row(date, values);
        }
        Ok(table)
    }
}

/// Files written by one [`SeriesAssembler::assemble`] call
#[derive(Debug, Clone)]
pub struct AssembledSeries {
    pub table: WideSeriesTable,
    pub station_info: Vec<Station>,
    pub station_info_path: PathBuf,
    pub series_path: PathBuf,
    pub years_read: Vec<i32>,
    pub duplicate_dates: usize,
}

/// Concatenates per-year extraction tables of one state into a
/// multi-year wide table
pub struct SeriesAssembler {
    data_dir: PathBuf,
    output_dir: PathBuf,
}

impl SeriesAssembler {
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn year_file(&self, state: &str, variable: &str, year: i32) -> PathBuf {
        self.data_dir
            .join(state)
            .join(format!("Prism_{}_{}.csv", variable, year))
    }

    pub fn station_info_path(&self, state: &str) -> PathBuf {
        self.output_dir.join(format!("PRISM_{}_station_info.csv", state))
    }

    pub fn series_path(&self, state: &str, variable: &str, years: &RangeInclusive<i32>) -> PathBuf {
        self.output_dir.join(state).join(format!(
            "PRISM_{}_{}_daily_{}.csv",
            years.start(),
            years.end(),
            variable
        ))
    }

    pub fn assemble(&self, state: &str, variable: &str, years: RangeInclusive<i32>) -> Result<AssembledSeries> {
        let mut stations: Vec<Station> = Vec::new();
        let mut station_index: HashMap<String, usize> = HashMap::new();
        let mut seen_dates: HashSet<String> = HashSet::new();
        let mut table = WideSeriesTable::default();
        let mut years_read = Vec::new();
        let mut duplicate_dates = 0;

        for year in years.clone() {
            let path = self.year_file(state, variable, year);
            if !path.is_file() {
                warn!("{} not found, skipping {}", path.display(), year);
                continue;
            }

            let year_table = ExtractionTable::read_csv(&path, variable, year)?;
            debug!(
                "Read {} ({} stations, {} dates)",
                path.display(),
                year_table.stations().len(),
                year_table.date_keys().len()
            );

            let columns: Vec<usize> = year_table
                .stations()
                .iter()
                .map(|station| {
                    *station_index.entry(station.name.clone()).or_insert_with(|| {
                        stations.push(station.clone());
                        stations.len() - 1
                    })
                })
                .collect();

            for date in year_table.date_keys() {
                if !seen_dates.insert(date.clone()) {
                    duplicate_dates += 1;
                    continue;
                }
                let values = year_table.column(date).unwrap_or(&[]);
                let mut row = vec![f32::NAN; stations.len()];
                for (value, &column) in values.iter().zip(&columns) {
                    row[column] = *value;
                }
                table.push_row(date.clone(), row);
            }
            years_read.push(year);
        }

        if years_read.is_empty() {
            return Err(ProcessingError::MissingData(format!(
                "No Prism_{}_<year>.csv files for {} in {}..={}",
                variable,
                state,
                years.start(),
                years.end()
            )));
        }

        if duplicate_dates > 0 {
            warn!("Dropped {} duplicate date columns for {} {}", duplicate_dates, state, variable);
        }

        table.stations = stations.iter().map(|s| s.name.clone()).collect();
        for row in &mut table.rows {
            row.resize(stations.len(), f32::NAN);
        }

        let station_info_path = self.station_info_path(state);
        write_station_info(&station_info_path, &stations)?;
        let series_path = self.series_path(state, variable, &years);
        table.write_csv(&series_path)?;

        info!(
            "Assembled {} dates for {} stations into {}",
            table.dates().len(),
            stations.len(),
            series_path.display()
        );

        Ok(AssembledSeries {
            table,
            station_info: stations,
            station_info_path,
            series_path,
            years_read,
            duplicate_dates,
        })
    }
}

/// Station metadata keyed by name
fn write_station_info(path: &Path, stations: &[Station]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(["Name", "stnid", "Longitude", "Latitude", "Elevation(m)"])?;
    for station in stations {
        writer.write_record([
            station.name.clone(),
            station.station_id.clone(),
            station.longitude.to_string(),
            station.latitude.to_string(),
            station.elevation.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn station(name: &str, id: &str) -> Station {
        Station::new(
            String::new(),
            name.to_string(),
            -90.5,
            33.4,
            38.0,
            String::new(),
            id.to_string(),
        )
    }

    fn write_year(dir: &Path, year: i32, stations: &[(&str, &str)], columns: &[(&str, Vec<f32>)]) {
        let mut table = ExtractionTable::new(
            "ppt",
            year,
            stations.iter().map(|(n, id)| station(n, id)).collect(),
        );
        for (key, values) in columns {
            table.push_column(*key, values.clone()).unwrap();
        }
        table
            .write_csv(&dir.join("MS").join(format!("Prism_ppt_{}.csv", year)))
            .unwrap();
    }

    #[test]
    fn test_assemble_drops_duplicate_dates() {
        let dir = TempDir::new().unwrap();
        let stations = [("Stoneville", "1"), ("Leland", "2")];
        write_year(
            dir.path(),
            1981,
            &stations,
            &[("19811231", vec![1.0, 2.0])],
        );
        write_year(
            dir.path(),
            1982,
            &stations,
            &[("19811231", vec![9.0, 9.0]), ("19820101", vec![3.0, 4.0])],
        );

        let assembler = SeriesAssembler::new(dir.path(), dir.path().join("out"));
        let series = assembler.assemble("MS", "ppt", 1981..=1982).unwrap();

        assert_eq!(series.table.dates(), &["19811231".to_string(), "19820101".to_string()]);
        assert_eq!(series.duplicate_dates, 1);
        assert_eq!(series.table.value(0, 0), Some(1.0));
        assert_eq!(series.table.value(1, 1), Some(4.0));
        assert_eq!(series.table.stations(), &["Stoneville".to_string(), "Leland".to_string()]);
        assert!(series.series_path.ends_with("MS/PRISM_1981_1982_daily_ppt.csv"));

        let content = fs::read_to_string(&series.series_path).unwrap();
        assert_eq!(
            content,
            "date,Stoneville,Leland\n19811231,1,2\n19820101,3,4\n"
        );

        let info = fs::read_to_string(&series.station_info_path).unwrap();
        assert_eq!(info.lines().count(), 3);
        assert!(info.starts_with("Name,stnid,Longitude,Latitude,Elevation(m)\nStoneville,1,"));
    }

    #[test]
    fn test_stations_aligned_by_name_across_years() {
        let dir = TempDir::new().unwrap();
        write_year(dir.path(), 1981, &[("Stoneville", "1")], &[("19811231", vec![1.0])]);
        write_year(
            dir.path(),
            1982,
            &[("Leland", "2"), ("Stoneville", "1")],
            &[("19820101", vec![4.0, 3.0])],
        );

        let series = SeriesAssembler::new(dir.path(), dir.path())
            .assemble("MS", "ppt", 1981..=1982)
            .unwrap();

        assert_eq!(series.table.stations(), &["Stoneville".to_string(), "Leland".to_string()]);
        assert_eq!(series.table.value(0, 1), None);
        assert_eq!(series.table.value(1, 0), Some(3.0));
        assert_eq!(series.table.value(1, 1), Some(4.0));

        let reloaded = WideSeriesTable::read_csv(&series.series_path).unwrap();
        assert_eq!(reloaded.dates(), series.table.dates());
        assert_eq!(reloaded.stations(), series.table.stations());
        assert_eq!(reloaded.value(0, 0), Some(1.0));
        assert_eq!(reloaded.value(0, 1), None);
    }

    #[test]
    fn test_missing_years() {
        let dir = TempDir::new().unwrap();
        write_year(dir.path(), 1983, &[("Stoneville", "1")], &[("19830101", vec![1.0])]);

        let assembler = SeriesAssembler::new(dir.path(), dir.path());
        let series = assembler.assemble("MS", "ppt", 1982..=1983).unwrap();
        assert_eq!(series.years_read, vec![1983]);

        let result = assembler.assemble("MS", "ppt", 1990..=1991);
        assert!(matches!(result, Err(ProcessingError::MissingData(_))));
    }
}
