//! Coordinate reference systems and the lon/lat forward transform.
//!
//! Station coordinates are WGS84 longitude/latitude. A raster's CRS is
//! whatever GDAL reads next to it (PRISM ships NAD83 geographic `.prj`
//! files); any definition GDAL/PROJ understands can be sampled.

use crate::error::{ProcessingError, Result};
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};

const WGS84_EPSG: u32 = 4326;

/// NAD83 geographic, assumed for rasters that carry no CRS
pub const PRISM_DEFAULT_EPSG: u32 = 4269;

/// A CRS held as OGC WKT, so grids carrying it stay `Clone`
#[derive(Debug, Clone, PartialEq)]
pub struct Crs {
    wkt: String,
}

impl Crs {
    pub fn prism_default() -> Result<Self> {
        Self::from_epsg(PRISM_DEFAULT_EPSG)
    }

    pub fn from_epsg(code: u32) -> Result<Self> {
        let srs = SpatialRef::from_epsg(code)
            .map_err(|e| ProcessingError::UnsupportedCrs(format!("EPSG:{}: {}", code, e)))?;
        Self::from_spatial_ref(&srs)
    }

    /// Any WKT dialect GDAL imports, ESRI `.prj` files included
    pub fn from_wkt(wkt: &str) -> Result<Self> {
        let srs = SpatialRef::from_wkt(wkt.trim())
            .map_err(|e| ProcessingError::UnsupportedCrs(format!("{}: {}", truncate(wkt), e)))?;
        Self::from_spatial_ref(&srs)
    }

    pub fn from_spatial_ref(srs: &SpatialRef) -> Result<Self> {
        Ok(Self { wkt: srs.to_wkt()? })
    }

    pub fn wkt(&self) -> &str {
        &self.wkt
    }

    pub fn spatial_ref(&self) -> Result<SpatialRef> {
        Ok(SpatialRef::from_wkt(&self.wkt)?)
    }

    /// `AUTHORITY:CODE` when the CRS has one, otherwise its WKT name
    pub fn identifier(&self) -> String {
        self.spatial_ref()
            .ok()
            .and_then(|srs| srs.authority().ok())
            .or_else(|| self.wkt.split('"').nth(1).map(str::to_string))
            .unwrap_or_else(|| truncate(&self.wkt))
    }
}

fn truncate(wkt: &str) -> String {
    wkt.trim().chars().take(60).collect()
}

/// Forward transform between two CRSs, longitude (easting) first on both
/// sides. Built once per raster.
pub struct CoordinateTransform {
    inner: CoordTransform,
}

impl CoordinateTransform {
    pub fn new(source: &Crs, target: &Crs) -> Result<Self> {
        let mut source_srs = source.spatial_ref()?;
        let mut target_srs = target.spatial_ref()?;
        source_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        target_srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);

        let inner = CoordTransform::new(&source_srs, &target_srs).map_err(|e| {
            ProcessingError::UnsupportedCrs(format!(
                "no transform from {} to {}: {}",
                source.identifier(),
                target.identifier(),
                e
            ))
        })?;
        Ok(Self { inner })
    }

    /// Transform from EPSG:4326 into `target`
    pub fn from_wgs84(target: &Crs) -> Result<Self> {
        Self::new(&Crs::from_epsg(WGS84_EPSG)?, target)
    }

    /// Project one point; NaN when it has no image in the target CRS
    pub fn transform(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (mut x, mut y, mut z) = ([lon], [lat], [0.0]);
        match self.inner.transform_coords(&mut x, &mut y, &mut z) {
            Ok(()) => (x[0], y[0]),
            Err(_) => (f64::NAN, f64::NAN),
        }
    }

    /// Project every point in one call, in input order
    pub fn transform_all(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut xs: Vec<f64> = points.iter().map(|&(lon, _)| lon).collect();
        let mut ys: Vec<f64> = points.iter().map(|&(_, lat)| lat).collect();
        let mut zs = vec![0.0; points.len()];

        if self.inner.transform_coords(&mut xs, &mut ys, &mut zs).is_ok() {
            xs.into_iter().zip(ys).collect()
        } else {
            // A single failing point fails the batch
            points.iter().map(|&(lon, lat)| self.transform(lon, lat)).collect()
        }
    }
}
