use crate::error::{ProcessingError, Result};
use crate::raster::{has_extension, Crs, GeoTransform, RasterAdapter, RasterGrid};
use gdal::errors::GdalError;
use gdal::Dataset;
use std::path::Path;
use tracing::debug;

/// Extensions opened as rasters. Sidecars (`.hdr`, `.prj`, `.stx`, `.xml`)
/// sit in the same folders and are left to GDAL.
pub const RASTER_EXTENSIONS: &[&str] = &["bil", "asc", "tif", "tiff", "img"];

/// Reads the first band of anything GDAL opens: PRISM's BIL archives,
/// ESRI ASCII grids, GeoTIFF
#[derive(Debug, Default, Clone, Copy)]
pub struct GdalAdapter;

impl GdalAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl RasterAdapter for GdalAdapter {
    fn name(&self) -> &'static str {
        "gdal"
    }

    fn supports(&self, path: &Path) -> bool {
        RASTER_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
    }

    fn read(&self, path: &Path) -> Result<RasterGrid> {
        let invalid = |e: GdalError| ProcessingError::invalid_raster(path, e.to_string());

        let dataset = Dataset::open(path).map_err(invalid)?;
        let (width, height) = dataset.raster_size();
        let coefficients = dataset.geo_transform().map_err(invalid)?;
        let transform = GeoTransform::from_gdal(&coefficients)
            .ok_or_else(|| ProcessingError::invalid_raster(path, "rotated grids are not supported"))?;

        let projection = dataset.projection();
        let crs = if projection.trim().is_empty() {
            debug!("{} carries no CRS, assuming NAD83 geographic", path.display());
            Crs::prism_default()?
        } else {
            Crs::from_wkt(&projection)?
        };

        let band = dataset.rasterband(1).map_err(invalid)?;
        let nodata = band.no_data_value().map(|value| value as f32);
        let buffer = band
            .read_as::<f32>((0, 0), (width, height), (width, height), None)
            .map_err(invalid)?;
        let (_, values) = buffer.into_shape_and_vec();

        RasterGrid::new(width, height, values, transform, crs, nodata)
    }
}
