use crate::error::{ProcessingError, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Unpack every file of a raster archive into `destination`, keeping the
/// archive's relative paths. Entries that would escape it are rejected.
pub fn extract_archive(zip_path: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;
    fs::create_dir_all(destination)?;

    let mut extracted_paths = Vec::new();
    for i in 0..archive.len() {
        let mut zip_file = archive.by_index(i)?;
        if zip_file.is_dir() {
            continue;
        }

        let relative = zip_file.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
            ProcessingError::InvalidFormat(format!(
                "Archive '{}' has unsafe entry '{}'",
                zip_path.display(),
                zip_file.name()
            ))
        })?;
        let dest_path = destination.join(relative);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&dest_path)?);
        std::io::copy(&mut zip_file, &mut writer)?;
        writer.flush()?;

        extracted_paths.push(dest_path);
    }

    debug!(
        "Extracted {} files from {} into {}",
        extracted_paths.len(),
        zip_path.display(),
        destination.display()
    );
    Ok(extracted_paths)
}
