use crate::error::Result;
use crate::models::Station;
use crate::writers::fixed_width::{format_float, format_integer, format_text};
use std::fs;
use std::path::Path;
use tracing::info;

/// One `WDLYLIST.DAT` line: `(I5, A18, F6.2, F8.2, F8.1, A50)`
pub fn format_station_line(index: usize, station: &Station) -> String {
    let comment = format!(
        "Station {}: {} within {} network",
        station.station_id, station.name, station.network
    );

    [
        format_integer(index as i64, 5),
        format_text(&format!("{}.dly", station.file_stem()), 18),
        format_float(station.latitude, 6, 2),
        format_float(station.longitude, 8, 2),
        format_float(station.elevation, 8, 1),
        format_text(&comment, 50),
    ]
    .concat()
}

/// Write the station directory read by the hydrology model, indexed from 1
pub fn write_station_list(path: &Path, stations: &[Station]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut content = String::new();
    for (i, station) in stations.iter().enumerate() {
        content.push_str(&format_station_line(i + 1, station));
        content.push('\n');
    }
    fs::write(path, content)?;

    info!("Wrote {} stations to {}", stations.len(), path.display());
    Ok(())
}
