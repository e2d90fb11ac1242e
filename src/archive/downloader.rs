//! Sequential download and unpacking of PRISM raster archives.

use crate::archive::extract::extract_archive;
use crate::error::{ProcessingError, Result};
use crate::models::Scale;
use crate::utils::constants::{DEFAULT_BASE_URL, FIRST_MONTHLY_ARCHIVE_YEAR, VARIABLES_DIR, ZIP_DIR};
use crate::utils::progress::ProgressReporter;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// One archive to fetch: the folder key it unpacks into and the URLs to
/// try, preferred first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveUnit {
    pub key: String,
    pub urls: Vec<String>,
}

/// Archives that make up `year` of `variable` at `scale`.
///
/// Daily data is one archive per day. Monthly data is one archive per month
/// from 1981, one per year before that; both try the `M2` release first
/// and fall back to `M3`.
pub fn archive_units(base_url: &str, variable: &str, scale: Scale, year: i32) -> Result<Vec<ArchiveUnit>> {
    let folder = format!("{}/{}/{}/{}", base_url.trim_end_matches('/'), scale, variable, year);
    let url = |name: String| format!("{}/{}", folder, name);

    let units = match scale {
        Scale::Daily => scale
            .date_keys(year)?
            .into_iter()
            .map(|key| ArchiveUnit {
                urls: vec![url(format!("PRISM_{}_stable_4kmD2_{}_bil.zip", variable, key))],
                key: key.to_string(),
            })
            .collect(),
        Scale::Monthly if year < FIRST_MONTHLY_ARCHIVE_YEAR => vec![ArchiveUnit {
            key: year.to_string(),
            urls: ["M2", "M3"]
                .iter()
                .map(|release| url(format!("PRISM_{}_stable_4km{}_{}_all_bil.zip", variable, release, year)))
                .collect(),
        }],
        Scale::Monthly => scale
            .date_keys(year)?
            .into_iter()
            .map(|key| ArchiveUnit {
                urls: ["M2", "M3"]
                    .iter()
                    .map(|release| url(format!("PRISM_{}_stable_4km{}_{}_bil.zip", variable, release, key)))
                    .collect(),
                key: key.to_string(),
            })
            .collect(),
    };

    Ok(units)
}

/// What one [`PrismDownloader::download_year`] call fetched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadSummary {
    pub variable: String,
    pub year: i32,
    pub downloaded: Vec<String>,
    pub failed: Vec<String>,
    /// Daily key at which the year stopped because the remote had no archive
    pub stopped_at: Option<String>,
}

pub struct PrismDownloader {
    client: reqwest::Client,
    base_url: String,
    root: PathBuf,
    show_progress: bool,
}

impl PrismDownloader {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("prism-extractor/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            root: root.into(),
            show_progress: false,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn zip_dir(&self, variable: &str, scale: Scale) -> PathBuf {
        self.root.join(ZIP_DIR).join(scale.as_str()).join(variable)
    }

    pub fn extract_dir(&self, variable: &str, scale: Scale, key: &str) -> PathBuf {
        self.root
            .join(VARIABLES_DIR)
            .join(scale.as_str())
            .join(variable)
            .join(key)
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let failure = |reason: String| ProcessingError::DownloadFailure {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failure(format!("HTTP {}", response.status())));
        }

        let bytes = response.bytes().await.map_err(|e| failure(e.to_string()))?;
        fs::write(dest, &bytes)?;
        debug!("Saved {} ({} bytes)", dest.display(), bytes.len());
        Ok(())
    }

    /// Fetch the first URL of `unit` that yields a readable archive and
    /// unpack it
    async fn fetch_unit(&self, unit: &ArchiveUnit, variable: &str, scale: Scale) -> Result<PathBuf> {
        let zip_dir = self.zip_dir(variable, scale);
        fs::create_dir_all(&zip_dir)?;

        let mut last_error = None;
        for url in &unit.urls {
            let name = url.rsplit('/').next().unwrap_or(url.as_str());
            let zip_path = zip_dir.join(name);

            if let Err(e) = self.fetch(url, &zip_path).await {
                debug!("{}", e);
                last_error = Some(e);
                continue;
            }

            let dest = self.extract_dir(variable, scale, &unit.key);
            match extract_archive(&zip_path, &dest) {
                Ok(_) => return Ok(dest),
                Err(e) => {
                    warn!("{} is not a usable archive: {}", zip_path.display(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ProcessingError::DownloadFailure {
            url: unit.key.clone(),
            reason: "no candidate URLs".to_string(),
        }))
    }

    /// Download and unpack every archive of one year, one at a time.
    ///
    /// A missing daily archive ends the year, since later dates are not
    /// published either; a missing monthly archive is logged and skipped.
    pub async fn download_year(&self, variable: &str, scale: Scale, year: i32) -> Result<DownloadSummary> {
        let units = archive_units(&self.base_url, variable, scale, year)?;
        let progress = ProgressReporter::new(
            units.len() as u64,
            &format!("Downloading {} {} {}", scale, variable, year),
            !self.show_progress,
        );

        let mut summary = DownloadSummary {
            variable: variable.to_string(),
            year,
            ..Default::default()
        };

        for unit in &units {
            progress.set_message(&format!("{} {} {}", scale, variable, unit.key));
            match self.fetch_unit(unit, variable, scale).await {
                Ok(dest) => {
                    debug!("{} unpacked into {}", unit.key, dest.display());
                    summary.downloaded.push(unit.key.clone());
                }
                Err(e) if scale == Scale::Daily => {
                    warn!("{}; stopping {} {} at {}", e, variable, year, unit.key);
                    summary.failed.push(unit.key.clone());
                    summary.stopped_at = Some(unit.key.clone());
                    break;
                }
                Err(e) => {
                    warn!("{}", e);
                    summary.failed.push(unit.key.clone());
                }
            }
            progress.increment(1);
        }

        progress.finish_with_message(&format!("{} {} downloaded", variable, year));
        info!(
            "{} {} {}: {} archives downloaded, {} failed",
            scale,
            variable,
            year,
            summary.downloaded.len(),
            summary.failed.len()
        );
        Ok(summary)
    }

    pub async fn download_range(
        &self,
        variable: &str,
        scale: Scale,
        years: std::ops::RangeInclusive<i32>,
    ) -> Result<Vec<DownloadSummary>> {
        let mut summaries = Vec::new();
        for year in years {
            summaries.push(self.download_year(variable, scale, year).await?);
        }
        Ok(summaries)
    }
}
