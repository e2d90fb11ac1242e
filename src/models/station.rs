use serde::{Deserialize, Serialize};
use validator::Validate;

/// One monitoring station as listed in a PRISM station catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Station {
    /// Leading row key of the catalog file (the `Station` column)
    pub key: String,

    #[validate(length(min = 1))]
    pub name: String,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    pub elevation: f64,

    pub network: String,

    pub station_id: String,
}

impl Station {
    pub fn new(
        key: String,
        name: String,
        longitude: f64,
        latitude: f64,
        elevation: f64,
        network: String,
        station_id: String,
    ) -> Self {
        Self {
            key,
            name,
            longitude,
            latitude,
            elevation,
            network,
            station_id,
        }
    }

    pub fn coordinates(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }

    pub fn is_within_bounds(&self, west: f64, south: f64, east: f64, north: f64) -> bool {
        self.longitude >= west
            && self.longitude <= east
            && self.latitude >= south
            && self.latitude <= north
    }

    /// File stem for per-station outputs: the ASCII letters of the name
    pub fn file_stem(&self) -> String {
        file_stem(&self.name)
    }
}

pub fn file_stem(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphabetic()).collect()
}
