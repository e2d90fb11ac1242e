use crate::error::{ProcessingError, Result};
use crate::models::station::file_stem;
use crate::models::{DailyRecord, FieldSet};
use crate::processors::series_assembler::WideSeriesTable;
use crate::utils::constants::{OPTIONAL_WEATHER_VARIABLES, REQUIRED_WEATHER_VARIABLES, STATION_DIR};
use crate::writers::FixedFormatEncoder;
use chrono::NaiveDate;
use csv::WriterBuilder;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Parse a wide-table date cell, `YYYYMMDD` or `YYYY-MM-DD`
pub fn parse_series_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(ProcessingError::from)
}

/// f32 cells widened through their shortest decimal form, so 7.2 stays 7.2
fn widen(value: f32) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(f64::from(value))
}

struct VariableTable {
    variable: &'static str,
    table: WideSeriesTable,
    rows_by_date: HashMap<String, usize>,
}

impl VariableTable {
    fn new(variable: &'static str, table: WideSeriesTable) -> Self {
        let rows_by_date = table
            .dates()
            .iter()
            .enumerate()
            .map(|(i, d)| (d.clone(), i))
            .collect();
        Self {
            variable,
            table,
            rows_by_date,
        }
    }

    fn value(&self, station: &str, date: &str) -> Option<f64> {
        let column = self.table.station_index(station)?;
        let row = *self.rows_by_date.get(date)?;
        self.table.value(row, column).map(widen)
    }
}

/// Outcome of [`StationSeriesBuilder::build`]
#[derive(Debug, Clone, Default)]
pub struct StationSeriesSummary {
    pub fields: FieldSet,
    pub variables: Vec<String>,
    pub stations_written: Vec<String>,
    /// Stations left without files (encoding failure or unusable file name), with the reason
    pub stations_failed: Vec<(String, String)>,
    pub station_dir: PathBuf,
}

/// Joins the per-variable wide tables into per-station CSV and `.dly` files
pub struct StationSeriesBuilder {
    input_dir: PathBuf,
    output_dir: PathBuf,
    years: RangeInclusive<i32>,
}

impl StationSeriesBuilder {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, years: RangeInclusive<i32>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            years,
        }
    }

    pub fn table_path(&self, variable: &str) -> PathBuf {
        self.input_dir.join(format!(
            "PRISM_{}_{}_daily_{}.csv",
            self.years.start(),
            self.years.end(),
            variable
        ))
    }

    pub fn station_dir(&self) -> PathBuf {
        self.output_dir.join(STATION_DIR)
    }

    fn load_tables(&self) -> Result<Vec<VariableTable>> {
        let mut tables = Vec::new();

        for &variable in REQUIRED_WEATHER_VARIABLES {
            let path = self.table_path(variable);
            if !path.is_file() {
                return Err(ProcessingError::MissingData(format!(
                    "required table {} not found",
                    path.display()
                )));
            }
            tables.push(VariableTable::new(variable, WideSeriesTable::read_csv(&path)?));
        }

        for &variable in OPTIONAL_WEATHER_VARIABLES {
            let path = self.table_path(variable);
            if path.is_file() {
                tables.push(VariableTable::new(variable, WideSeriesTable::read_csv(&path)?));
            } else {
                debug!("No {} table, leaving it out", variable);
            }
        }

        Ok(tables)
    }

    pub fn build(&self) -> Result<StationSeriesSummary> {
        let tables = self.load_tables()?;
        let has = |variable: &str| tables.iter().any(|t| t.variable == variable);
        let fields = FieldSet::new(has("srad"), has("rhum"), has("wind"));
        let encoder = FixedFormatEncoder::new(fields);
        debug!("Writing weather files with the {:?} layout", encoder.layout());

        // The precipitation table defines the station set and the dates
        let base = &tables[0].table;
        let dates = base
            .dates()
            .iter()
            .map(|raw| Ok((raw.clone(), parse_series_date(raw)?)))
            .collect::<Result<Vec<(String, NaiveDate)>>>()?;

        let station_dir = self.station_dir();
        fs::create_dir_all(&station_dir)?;

        let mut summary = StationSeriesSummary {
            fields,
            variables: tables.iter().map(|t| t.variable.to_string()).collect(),
            station_dir: station_dir.clone(),
            ..Default::default()
        };

        let mut stems = HashSet::new();
        for station in base.stations() {
            let stem = file_stem(station);
            if stem.is_empty() {
                warn!("Skipping station {}: name has no letters for a file name", station);
                summary
                    .stations_failed
                    .push((station.clone(), "empty file name".to_string()));
                continue;
            }
            if !stems.insert(stem.clone()) {
                warn!("Skipping station {}: file name {} already taken", station, stem);
                summary
                    .stations_failed
                    .push((station.clone(), format!("duplicate file name {}", stem)));
                continue;
            }

            let records: Vec<DailyRecord> = dates
                .iter()
                .map(|(raw, date)| {
                    let mut record = DailyRecord::for_date(*date);
                    for table in &tables {
                        record.set(table.variable, table.value(station, raw));
                    }
                    record
                })
                .collect();

            let weather = match encoder.encode_all(&records) {
                Ok(weather) => weather,
                Err(e) => {
                    warn!("Skipping station {}: {}", station, e);
                    summary.stations_failed.push((station.clone(), e.to_string()));
                    continue;
                }
            };

            write_station_csv(&station_dir.join(format!("{}.csv", stem)), &summary.variables, &records)?;
            fs::write(station_dir.join(format!("{}.dly", stem)), weather)?;
            summary.stations_written.push(station.clone());
        }

        info!(
            "Wrote {} station files to {} ({} failed)",
            summary.stations_written.len(),
            station_dir.display(),
            summary.stations_failed.len()
        );

        Ok(summary)
    }
}

fn write_station_csv(path: &Path, variables: &[String], records: &[DailyRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;

    let mut header = vec!["Year".to_string(), "Month".to_string(), "Day".to_string()];
    header.extend(variables.iter().cloned());
    writer.write_record(&header)?;

    let cell = |v: Option<String>| v.unwrap_or_default();
    for record in records {
        let mut row = vec![
            cell(record.year.map(|v| v.to_string())),
            cell(record.month.map(|v| v.to_string())),
            cell(record.day.map(|v| v.to_string())),
        ];
        row.extend(variables.iter().map(|v| cell(record.get(v).map(|x| x.to_string()))));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
