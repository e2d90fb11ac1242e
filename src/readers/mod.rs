pub mod station_reader;

pub use station_reader::{CatalogSource, StationCatalog};
