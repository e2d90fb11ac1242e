use crate::error::Result;
use crate::raster::{CoordinateTransform, RasterGrid};

/// Samples one raster at WGS84 longitude/latitude points.
///
/// The transform into the raster's CRS is built once, when the sampler is
/// created; a CRS GDAL cannot transform into fails here rather than per point.
pub struct PointSampler<'a> {
    grid: &'a RasterGrid,
    transform: CoordinateTransform,
}

impl<'a> PointSampler<'a> {
    pub fn new(grid: &'a RasterGrid) -> Result<Self> {
        Ok(Self {
            grid,
            transform: CoordinateTransform::from_wgs84(grid.crs())?,
        })
    }

    /// Nearest-cell value; no-data (or NaN) when the point falls outside
    pub fn sample_point(&self, lon: f64, lat: f64) -> f32 {
        let (x, y) = self.transform.transform(lon, lat);
        self.grid.sample_native(x, y)
    }

    /// One value per `(lon, lat)` point, in input order
    pub fn sample(&self, points: &[(f64, f64)]) -> Vec<f32> {
        self.transform
            .transform_all(points)
            .into_iter()
            .map(|(x, y)| self.grid.sample_native(x, y))
            .collect()
    }
}

/// Sample `grid` at `points` with a one-off sampler
pub fn sample(grid: &RasterGrid, points: &[(f64, f64)]) -> Result<Vec<f32>> {
    Ok(PointSampler::new(grid)?.sample(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{Crs, GeoTransform};

    fn geographic_grid(nodata: Option<f32>) -> RasterGrid {
        RasterGrid::new(
            2,
            2,
            vec![5.0, 6.0, 7.0, 8.0],
            GeoTransform::new(-91.0, 1.0, 34.0, -1.0),
            Crs::prism_default().unwrap(),
            nodata,
        )
        .unwrap()
    }

    #[test]
    fn test_sample_preserves_point_order() {
        let grid = geographic_grid(Some(-9999.0));
        let values = sample(&grid, &[(-89.5, 32.5), (-90.5, 33.5), (-90.2, 32.1)]).unwrap();
        assert_eq!(values, vec![8.0, 5.0, 7.0]);
    }

    #[test]
    fn test_out_of_extent_is_nodata() {
        let grid = geographic_grid(Some(-9999.0));
        let sampler = PointSampler::new(&grid).unwrap();
        assert_eq!(sampler.sample_point(-120.0, 45.0), -9999.0);
    }

    #[test]
    fn test_out_of_extent_without_nodata_is_nan() {
        let grid = geographic_grid(None);
        let sampler = PointSampler::new(&grid).unwrap();
        assert!(sampler.sample_point(-120.0, 45.0).is_nan());
    }

    #[test]
    fn test_utm_raster_is_reprojected() {
        let crs = Crs::from_epsg(32615).unwrap();
        let (x, y) = CoordinateTransform::from_wgs84(&crs).unwrap().transform(-93.0, 33.0);

        // 10 km cells with a corner on the projected point
        let grid = RasterGrid::new(
            2,
            2,
            vec![1.0, 2.0, 3.0, 4.0],
            GeoTransform::new(x - 10_000.0, 10_000.0, y + 10_000.0, -10_000.0),
            crs,
            Some(-9999.0),
        )
        .unwrap();

        let values = sample(&grid, &[(-92.99, 33.01), (-93.01, 32.99), (-80.0, 33.0)]).unwrap();
        assert_eq!(values, vec![2.0, 3.0, -9999.0]);
    }

    #[test]
    fn test_albers_raster_is_reprojected() {
        // 10 km cells around the CONUS Albers origin (-96, 23); the datum
        // shift is metres, far inside a cell
        let grid = RasterGrid::new(
            2,
            2,
            vec![1.0, 2.0, 3.0, 4.0],
            GeoTransform::new(-10_000.0, 10_000.0, 10_000.0, -10_000.0),
            Crs::from_epsg(5070).unwrap(),
            Some(-9999.0),
        )
        .unwrap();

        let sampler = PointSampler::new(&grid).unwrap();
        // Slightly north-east of the origin lands in the upper-right cell
        assert_eq!(sampler.sample_point(-95.97, 23.03), 2.0);
        // Slightly south-west lands in the lower-left cell
        assert_eq!(sampler.sample_point(-96.03, 22.97), 3.0);
        assert_eq!(sampler.sample_point(-90.0, 33.0), -9999.0);
    }
}
