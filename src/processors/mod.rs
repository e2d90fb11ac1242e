pub mod extraction;
pub mod series_assembler;
pub mod station_series;

pub use extraction::{ExtractionEngine, ExtractionSummary, ExtractionTable, MissingRasterPolicy};
pub use series_assembler::{AssembledSeries, SeriesAssembler, WideSeriesTable};
pub use station_series::{StationSeriesBuilder, StationSeriesSummary};
