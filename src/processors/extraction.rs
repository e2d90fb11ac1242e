use crate::error::{ProcessingError, Result};
use crate::models::{DateKey, Scale, Station};
use crate::raster::{PointSampler, RasterStore};
use crate::utils::constants::{DEFAULT_CHECKPOINT_EVERY, EXTRACTION_META_COLUMNS};
use crate::utils::progress::ProgressReporter;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// What to do when the raster for a date is missing or unreadable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingRasterPolicy {
    /// Warn, fill the date's column with NaN and carry on
    #[default]
    Skip,
    /// Stop the year at the first missing date
    Abort,
}

impl FromStr for MissingRasterPolicy {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(MissingRasterPolicy::Skip),
            "abort" => Ok(MissingRasterPolicy::Abort),
            other => Err(ProcessingError::Config(format!(
                "Unknown missing raster policy '{}'. Expected 'skip' or 'abort'",
                other
            ))),
        }
    }
}

impl fmt::Display for MissingRasterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingRasterPolicy::Skip => write!(f, "skip"),
            MissingRasterPolicy::Abort => write!(f, "abort"),
        }
    }
}

/// Station × date values for one variable and one year.
///
/// Rows are stations in catalog order; columns are appended one date at a
/// time, so a finished year has one column per date key. Cells with no
/// value hold NaN and are written as empty fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionTable {
    variable: String,
    year: i32,
    stations: Vec<Station>,
    date_keys: Vec<String>,
    columns: Vec<Vec<f32>>,
}

impl ExtractionTable {
    pub fn new(variable: &str, year: i32, stations: Vec<Station>) -> Self {
        Self {
            variable: variable.to_string(),
            year,
            stations,
            date_keys: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn date_keys(&self) -> &[String] {
        &self.date_keys
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, date_key: &str) -> Option<&[f32]> {
        self.date_keys
            .iter()
            .position(|k| k == date_key)
            .map(|i| self.columns[i].as_slice())
    }

    pub fn value(&self, station: &str, date_key: &str) -> Option<f32> {
        let row = self.stations.iter().position(|s| s.name == station)?;
        self.column(date_key).map(|column| column[row])
    }

    pub fn push_column(&mut self, date_key: impl Into<String>, values: Vec<f32>) -> Result<()> {
        let date_key = date_key.into();
        if values.len() != self.stations.len() {
            return Err(ProcessingError::DataMerge(format!(
                "Column {} has {} values for {} stations",
                date_key,
                values.len(),
                self.stations.len()
            )));
        }
        self.date_keys.push(date_key);
        self.columns.push(values);
        Ok(())
    }

    /// Write the table, replacing `path` atomically
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = WriterBuilder::new().from_writer(temp.as_file_mut());

            let mut header: Vec<&str> = EXTRACTION_META_COLUMNS.to_vec();
            header.extend(self.date_keys.iter().map(String::as_str));
            writer.write_record(&header)?;

            for (row, station) in self.stations.iter().enumerate() {
                let mut record = vec![
                    station.station_id.clone(),
                    station.name.clone(),
                    station.longitude.to_string(),
                    station.latitude.to_string(),
                    station.elevation.to_string(),
                ];
                record.extend(self.columns.iter().map(|column| format_cell(column[row])));
                writer.write_record(&record)?;
            }
            writer.flush()?;
        }
        temp.as_file_mut().flush()?;
        temp.persist(path).map_err(|e| ProcessingError::Io(e.error))?;
        Ok(())
    }

    /// Read a table written by [`ExtractionTable::write_csv`]
    pub fn read_csv(path: &Path, variable: &str, year: i32) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let meta = EXTRACTION_META_COLUMNS.len();
        if headers.len() < meta {
            return Err(ProcessingError::InvalidFormat(format!(
                "{} has {} columns, expected at least {}",
                path.display(),
                headers.len(),
                meta
            )));
        }

        let mut table = Self::new(variable, year, Vec::new());
        table.date_keys = headers.iter().skip(meta).map(str::to_string).collect();
        for key in &table.date_keys {
            DateKey::parse(key).map_err(|_| {
                ProcessingError::InvalidFormat(format!(
                    "{}: column '{}' is not a date key",
                    path.display(),
                    key
                ))
            })?;
        }
        table.columns = vec![Vec::new(); table.date_keys.len()];

        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let number = |i: usize| -> Result<f64> {
                let raw = record.get(i).unwrap_or("");
                raw.parse::<f64>().map_err(|_| {
                    ProcessingError::InvalidFormat(format!(
                        "{} row {}: '{}' in column {} is not numeric",
                        path.display(),
                        line + 2,
                        raw,
                        EXTRACTION_META_COLUMNS[i]
                    ))
                })
            };

            table.stations.push(Station::new(
                String::new(),
                record.get(1).unwrap_or("").to_string(),
                number(2)?,
                number(3)?,
                number(4)?,
                String::new(),
                record.get(0).unwrap_or("").to_string(),
            ));

            for (i, column) in table.columns.iter_mut().enumerate() {
                column.push(parse_cell(record.get(meta + i).unwrap_or("")));
            }
        }

        Ok(table)
    }
}

pub(crate) fn format_cell(value: f32) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

pub(crate) fn parse_cell(raw: &str) -> f32 {
    raw.trim().parse::<f32>().unwrap_or(f32::NAN)
}

/// Outcome of extracting one variable for one year
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSummary {
    pub variable: String,
    pub year: i32,
    pub dates_processed: usize,
    pub dates_skipped: Vec<String>,
    /// First missing or unreadable date when the year was stopped under [`MissingRasterPolicy::Abort`]
    pub stopped_at: Option<String>,
    /// Station-date units counted by the progress reporter
    pub progress: u64,
    pub output_path: PathBuf,
}

/// Samples every raster of a year at the catalog stations
pub struct ExtractionEngine {
    store: RasterStore,
    output_dir: PathBuf,
    scale: Scale,
    policy: MissingRasterPolicy,
    checkpoint_every: usize,
    show_progress: bool,
}

impl ExtractionEngine {
    pub fn new(root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, scale: Scale) -> Self {
        Self {
            store: RasterStore::new(root),
            output_dir: output_dir.into(),
            scale,
            policy: MissingRasterPolicy::default(),
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            show_progress: false,
        }
    }

    pub fn with_store(mut self, store: RasterStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_policy(mut self, policy: MissingRasterPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Checkpoint every `dates` columns; 0 writes only at the end
    pub fn with_checkpoint_every(mut self, dates: usize) -> Self {
        self.checkpoint_every = dates;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn output_path(&self, variable: &str, year: i32) -> PathBuf {
        self.output_dir.join(format!("Prism_{}_{}.csv", variable, year))
    }

    pub fn extract(&self, year: i32, variable: &str, stations: &[Station]) -> Result<ExtractionTable> {
        self.extract_with_summary(year, variable, stations)
            .map(|(table, _)| table)
    }

    pub fn extract_with_summary(
        &self,
        year: i32,
        variable: &str,
        stations: &[Station],
    ) -> Result<(ExtractionTable, ExtractionSummary)> {
        let date_keys = self.scale.date_keys(year)?;
        let output_path = self.output_path(variable, year);
        let points: Vec<(f64, f64)> = stations.iter().map(Station::coordinates).collect();

        let mut table = ExtractionTable::new(variable, year, stations.to_vec());
        let mut summary = ExtractionSummary {
            variable: variable.to_string(),
            year,
            dates_processed: 0,
            dates_skipped: Vec::new(),
            stopped_at: None,
            progress: 0,
            output_path: output_path.clone(),
        };

        let units_per_date = stations.len() as u64;
        let progress = ProgressReporter::new(
            units_per_date * date_keys.len() as u64,
            &format!("Extracting {} {}", variable, year),
            !self.show_progress,
        );

        info!(
            "Extracting {} for {} stations over {} {} dates",
            variable,
            stations.len(),
            date_keys.len(),
            self.scale
        );

        for date_key in &date_keys {
            match self.sample_date(variable, date_key, &points) {
                Ok(values) => {
                    table.push_column(date_key.to_string(), values)?;
                    summary.dates_processed += 1;
                }
                Err(e) => match self.policy {
                    MissingRasterPolicy::Skip => {
                        warn!("Skipping {} {}: {}", variable, date_key, e);
                        table.push_column(date_key.to_string(), vec![f32::NAN; stations.len()])?;
                        summary.dates_skipped.push(date_key.to_string());
                    }
                    MissingRasterPolicy::Abort => {
                        warn!("{}; stopping {} {} at {}", e, variable, year, date_key);
                        summary.stopped_at = Some(date_key.to_string());
                        break;
                    }
                },
            }

            if self.checkpoint_every > 0 && table.column_count() % self.checkpoint_every == 0 {
                debug!("Checkpoint after {} dates", table.column_count());
                table.write_csv(&output_path)?;
            }
            progress.increment(units_per_date);
        }

        table.write_csv(&output_path)?;
        progress.finish_with_message(&format!("{} {} written", variable, year));
        summary.progress = progress.position();

        info!(
            "Wrote {} ({} dates, {} skipped, {}/{} station-dates)",
            output_path.display(),
            summary.dates_processed,
            summary.dates_skipped.len(),
            progress.position(),
            progress.total()
        );

        Ok((table, summary))
    }

    /// Every failure here is confined to one date's raster
    fn sample_date(&self, variable: &str, date_key: &DateKey, points: &[(f64, f64)]) -> Result<Vec<f32>> {
        let grid = self.store.open(variable, date_key, self.scale)?;
        debug!(
            "{} {}: {} x {} cells in {}",
            variable,
            date_key,
            grid.width(),
            grid.height(),
            grid.crs_identifier()
        );
        let sampler = PointSampler::new(&grid)?;
        Ok(sampler.sample(points))
    }

    /// Extract every variable for every year in `years`, in that order
    pub fn extract_range(
        &self,
        years: std::ops::RangeInclusive<i32>,
        variables: &[&str],
        stations: &[Station],
    ) -> Result<Vec<ExtractionSummary>> {
        let mut summaries = Vec::new();
        for variable in variables {
            for year in years.clone() {
                let (_, summary) = self.extract_with_summary(year, variable, stations)?;
                summaries.push(summary);
            }
        }
        Ok(summaries)
    }
}
