pub mod fixed_width;
pub mod station_list;

pub use fixed_width::{FixedFormatEncoder, Layout, LINE_WIDTH};
pub use station_list::{format_station_line, write_station_list};
