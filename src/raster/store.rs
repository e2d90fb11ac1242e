use crate::error::{ProcessingError, Result};
use crate::models::{DateKey, Scale};
use crate::raster::{GdalAdapter, RasterAdapter, RasterGrid};
use crate::utils::constants::VARIABLES_DIR;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves (variable, date key, scale) to a raster on disk under
/// `<root>/variables/<scale>/<variable>/<date_key>/`
pub struct RasterStore {
    root: PathBuf,
    adapter: Box<dyn RasterAdapter>,
}

impl RasterStore {
    /// Store reading rasters through GDAL
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_adapter(root, Box::new(GdalAdapter::new()))
    }

    pub fn with_adapter(root: impl Into<PathBuf>, adapter: Box<dyn RasterAdapter>) -> Self {
        Self {
            root: root.into(),
            adapter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raster_dir(&self, variable: &str, date_key: &DateKey, scale: Scale) -> PathBuf {
        self.root
            .join(VARIABLES_DIR)
            .join(scale.as_str())
            .join(variable)
            .join(date_key.to_string())
    }

    /// First file, in name order, that the adapter reads
    pub fn locate(&self, variable: &str, date_key: &DateKey, scale: Scale) -> Result<PathBuf> {
        let dir = self.raster_dir(variable, date_key, scale);
        if !dir.is_dir() {
            return Err(ProcessingError::RasterNotFound { path: dir });
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        files
            .into_iter()
            .find(|path| self.adapter.supports(path))
            .ok_or(ProcessingError::RasterNotFound { path: dir })
    }

    pub fn open(&self, variable: &str, date_key: &DateKey, scale: Scale) -> Result<RasterGrid> {
        let path = self.locate(variable, date_key, scale)?;
        debug!("Opening {} with {} adapter", path.display(), self.adapter.name());
        self.adapter.read(&path)
    }
}
