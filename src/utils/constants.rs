/// PRISM variable tokens
pub const VAR_PPT: &str = "ppt";
pub const VAR_TMIN: &str = "tmin";
pub const VAR_TMAX: &str = "tmax";
pub const VAR_TDMEAN: &str = "tdmean";
pub const VAR_VPDMIN: &str = "vpdmin";
pub const VAR_VPDMAX: &str = "vpdmax";

/// Variables a weather file cannot be written without
pub const REQUIRED_WEATHER_VARIABLES: &[&str] = &[VAR_PPT, VAR_TMIN, VAR_TMAX];

/// Variables carried into per-station outputs when their tables exist
pub const OPTIONAL_WEATHER_VARIABLES: &[&str] =
    &[VAR_TDMEAN, VAR_VPDMIN, VAR_VPDMAX, "srad", "rhum", "wind"];

/// Directory names
pub const VARIABLES_DIR: &str = "variables";
pub const ZIP_DIR: &str = "zips";
pub const STATION_DIR: &str = "Station";

/// File names
pub const STATION_LIST_FILE: &str = "WDLYLIST.DAT";

/// Normalised station catalog schema, leading row key first
pub const STATION_COLUMNS: [&str; 7] = [
    "Station",
    "Name",
    "Longitude",
    "Latitude",
    "Elevation(m)",
    "Network",
    "stnid",
];

/// Leading metadata columns of a per-year extraction table
pub const EXTRACTION_META_COLUMNS: [&str; 5] =
    ["stnid", "Name", "Longitude", "Latitude", "Elevation(m)"];

/// Date key of the archive whose station list is used when none is given
pub const DEFAULT_CATALOG_DATE_KEY: &str = "19810101";

/// Remote archive service
pub const DEFAULT_BASE_URL: &str = "https://ftp.prism.oregonstate.edu";

/// First year PRISM publishes monthly archives month by month
pub const FIRST_MONTHLY_ARCHIVE_YEAR: i32 = 1981;

/// Dates between extraction checkpoints
pub const DEFAULT_CHECKPOINT_EVERY: usize = 30;
