//! Gridded rasters and point sampling.
//!
//! Every on-disk format is read by a [`RasterAdapter`] into the same
//! in-memory [`RasterGrid`]; nothing downstream knows which adapter
//! produced a grid.

pub mod crs;
pub mod gdal_reader;
pub mod sampler;
pub mod store;

pub use crs::{CoordinateTransform, Crs};
pub use gdal_reader::GdalAdapter;
pub use sampler::PointSampler;
pub use store::RasterStore;

use crate::error::{ProcessingError, Result};
use std::path::Path;

/// North-up affine transform from pixel space to CRS coordinates.
///
/// `origin_x`/`origin_y` locate the outer corner of the upper-left cell;
/// `pixel_height` is negative for rows running north to south.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub origin_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            pixel_width,
            origin_y,
            pixel_height,
        }
    }

    /// From GDAL-ordered coefficients; `None` for rotated grids
    pub fn from_gdal(coefficients: &[f64; 6]) -> Option<Self> {
        let [origin_x, pixel_width, row_rotation, origin_y, column_rotation, pixel_height] = *coefficients;
        (row_rotation == 0.0 && column_rotation == 0.0)
            .then(|| Self::new(origin_x, pixel_width, origin_y, pixel_height))
    }

    /// Fractional (column, row) of a CRS coordinate
    pub fn pixel_of(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Cell containing a CRS coordinate, if it lies inside a `width` × `height` grid
    pub fn cell_of(&self, x: f64, y: f64, width: usize, height: usize) -> Option<(usize, usize)> {
        let (col, row) = self.pixel_of(x, y);
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }

        let (col, row) = (col.floor() as usize, row.floor() as usize);
        (col < width && row < height).then_some((col, row))
    }
}

/// One variable's field for one date, held fully in memory
#[derive(Debug, Clone)]
pub struct RasterGrid {
    width: usize,
    height: usize,
    values: Vec<f32>,
    transform: GeoTransform,
    crs: Crs,
    nodata: Option<f32>,
}

impl RasterGrid {
    pub fn new(
        width: usize,
        height: usize,
        values: Vec<f32>,
        transform: GeoTransform,
        crs: Crs,
        nodata: Option<f32>,
    ) -> Result<Self> {
        if values.len() != width * height {
            return Err(ProcessingError::InvalidFormat(format!(
                "Raster of {} x {} cells cannot hold {} values",
                width,
                height,
                values.len()
            )));
        }

        Ok(Self {
            width,
            height,
            values,
            transform,
            crs,
            nodata,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn crs_identifier(&self) -> String {
        self.crs.identifier()
    }

    pub fn nodata(&self) -> Option<f32> {
        self.nodata
    }

    /// Value returned for points that have no cell: the declared no-data
    /// value, or NaN when the raster declares none
    pub fn nodata_or_nan(&self) -> f32 {
        self.nodata.unwrap_or(f32::NAN)
    }

    pub fn value_at(&self, col: usize, row: usize) -> Option<f32> {
        if col < self.width && row < self.height {
            self.values.get(row * self.width + col).copied()
        } else {
            None
        }
    }

    /// Nearest-cell value at a coordinate already in the raster's CRS
    pub fn sample_native(&self, x: f64, y: f64) -> f32 {
        self.transform
            .cell_of(x, y, self.width, self.height)
            .and_then(|(col, row)| self.value_at(col, row))
            .unwrap_or_else(|| self.nodata_or_nan())
    }
}

/// Reads one on-disk raster format into a [`RasterGrid`]
pub trait RasterAdapter: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this adapter reads the file at `path`
    fn supports(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> Result<RasterGrid>;
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
pub(crate) mod test_support {
    use gdal::raster::Buffer;
    use gdal::spatial_ref::SpatialRef;
    use gdal::DriverManager;
    use std::path::Path;

    /// Single-band float BIL (`.bil` + `.hdr` + `.prj`) with square cells
    #[allow(clippy::too_many_arguments)]
    pub fn write_bil(
        path: &Path,
        width: usize,
        height: usize,
        values: &[f32],
        origin_x: f64,
        origin_y: f64,
        cell: f64,
        epsg: u32,
    ) {
        let driver = DriverManager::get_driver_by_name("EHdr").unwrap();
        let mut dataset = driver
            .create_with_band_type::<f32, _>(path, width, height, 1)
            .unwrap();
        dataset
            .set_geo_transform(&[origin_x, cell, 0.0, origin_y, 0.0, -cell])
            .unwrap();
        let wkt = SpatialRef::from_epsg(epsg).unwrap().to_wkt().unwrap();
        dataset.set_projection(&wkt).unwrap();

        let mut band = dataset.rasterband(1).unwrap();
        band.set_no_data_value(Some(-9999.0)).unwrap();
        let mut buffer = Buffer::new((width, height), values.to_vec());
        band.write((0, 0), (width, height), &mut buffer).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> RasterGrid {
        // 3 x 2 grid of 1-degree cells, upper-left corner at (-91, 34)
        RasterGrid::new(
            3,
            2,
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            GeoTransform::new(-91.0, 1.0, 34.0, -1.0),
            Crs::prism_default().unwrap(),
            Some(-9999.0),
        )
        .unwrap()
    }

    #[test]
    fn test_cell_lookup() {
        let g = grid();
        assert_eq!(g.sample_native(-90.5, 33.5), 1.0);
        assert_eq!(g.sample_native(-89.5, 32.5), 5.0);
        assert_eq!(g.sample_native(-88.01, 32.01), 6.0);
    }

    #[test]
    fn test_out_of_extent_returns_nodata() {
        let g = grid();
        assert_eq!(g.sample_native(-92.0, 33.5), -9999.0);
        assert_eq!(g.sample_native(-90.5, 35.0), -9999.0);
        assert_eq!(g.sample_native(-87.5, 33.5), -9999.0);
        assert_eq!(g.sample_native(f64::NAN, 33.5), -9999.0);
    }

    #[test]
    fn test_value_count_must_match_shape() {
        let result = RasterGrid::new(
            2,
            2,
            vec![1.0],
            GeoTransform::new(0.0, 1.0, 0.0, -1.0),
            Crs::prism_default().unwrap(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_transform_from_gdal() {
        let t = GeoTransform::from_gdal(&[-91.0, 1.0, 0.0, 34.0, 0.0, -1.0]).unwrap();
        assert_eq!(t, GeoTransform::new(-91.0, 1.0, 34.0, -1.0));
        assert!(GeoTransform::from_gdal(&[-91.0, 1.0, 0.2, 34.0, 0.0, -1.0]).is_none());
    }
}
