use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Invalid time scale '{0}'. Expected 'daily' or 'monthly'")]
    InvalidScale(String),

    #[error("Station catalog not found: {}", path.display())]
    CatalogNotFound { path: PathBuf },

    #[error("Could not parse station catalog {}: {reason}", path.display())]
    CatalogParseError { path: PathBuf, reason: String },

    #[error("No raster found in {}", path.display())]
    RasterNotFound { path: PathBuf },

    #[error("Invalid raster {}: {reason}", path.display())]
    InvalidRaster { path: PathBuf, reason: String },

    #[error("Unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),

    #[error("Station '{name}' not found")]
    StationNotFound { name: String },

    #[error("Cannot encode field '{field}': {reason}")]
    EncodingError { field: String, reason: String },

    #[error("Download failed for {url}: {reason}")]
    DownloadFailure { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Data merge error: {0}")]
    DataMerge(String),

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl ProcessingError {
    pub fn encoding(field: &str, reason: impl Into<String>) -> Self {
        ProcessingError::EncodingError {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_raster(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ProcessingError::InvalidRaster {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for ProcessingError {
    fn from(err: config::ConfigError) -> Self {
        ProcessingError::Config(err.to_string())
    }
}
