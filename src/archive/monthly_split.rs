use crate::error::{ProcessingError, Result};
use crate::models::Scale;
use crate::utils::constants::VARIABLES_DIR;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Copies the per-month files of a yearly archive into per-month folders,
/// `<var>/<YYYY>/` to `<var>/<YYYYMM>/`, so monthly years before 1981 have
/// the same layout as later ones
pub struct MonthlySplitter {
    root: PathBuf,
    scale: Scale,
}

impl MonthlySplitter {
    pub fn new(root: impl Into<PathBuf>, scale: Scale) -> Self {
        Self {
            root: root.into(),
            scale,
        }
    }

    fn variable_dir(&self, variable: &str) -> PathBuf {
        self.root
            .join(VARIABLES_DIR)
            .join(self.scale.as_str())
            .join(variable)
    }

    /// Split one year; returns the number of files copied
    pub fn split_year(&self, variable: &str, year: i32) -> Result<usize> {
        let year_dir = self.variable_dir(variable).join(year.to_string());
        if !year_dir.is_dir() {
            return Err(ProcessingError::RasterNotFound { path: year_dir });
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&year_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut copied = 0;
        for month in 1..=12 {
            let key = format!("{}{:02}", year, month);
            let month_dir = self.variable_dir(variable).join(&key);
            let matching: Vec<&PathBuf> = files.iter().filter(|p| file_name_contains(p, &key)).collect();

            if matching.is_empty() {
                warn!("No files for {} in {}", key, year_dir.display());
                continue;
            }

            fs::create_dir_all(&month_dir)?;
            for path in matching {
                if let Some(name) = path.file_name() {
                    fs::copy(path, month_dir.join(name))?;
                    copied += 1;
                }
            }
        }

        info!("Split {} {} into monthly folders ({} files)", variable, year, copied);
        Ok(copied)
    }

    /// Split every year in `years`; missing years are logged and skipped
    pub fn split_range(&self, variable: &str, years: std::ops::RangeInclusive<i32>) -> Result<usize> {
        let mut copied = 0;
        for year in years {
            match self.split_year(variable, year) {
                Ok(n) => copied += n,
                Err(ProcessingError::RasterNotFound { path }) => {
                    warn!("{} not found, skipping {}", path.display(), year);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(copied)
    }
}

fn file_name_contains(path: &Path, key: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_year() {
        let dir = TempDir::new().unwrap();
        let year_dir = dir.path().join("variables/monthly/tmax/1950");
        fs::create_dir_all(&year_dir).unwrap();
        for name in [
            "PRISM_tmax_stable_4kmM2_195001_bil.bil",
            "PRISM_tmax_stable_4kmM2_195001_bil.hdr",
            "PRISM_tmax_stable_4kmM2_195012_bil.bil",
            "PRISM_tmax_stable_4kmM2_1950_bil.bil",
        ] {
            fs::write(year_dir.join(name), "x").unwrap();
        }

        let splitter = MonthlySplitter::new(dir.path(), Scale::Monthly);
        assert_eq!(splitter.split_year("tmax", 1950).unwrap(), 3);

        let january = dir.path().join("variables/monthly/tmax/195001");
        assert!(january.join("PRISM_tmax_stable_4kmM2_195001_bil.hdr").is_file());
        assert!(dir.path().join("variables/monthly/tmax/195012").is_dir());
        assert!(!dir.path().join("variables/monthly/tmax/195002").exists());
    }

    #[test]
    fn test_split_range_skips_missing_years() {
        let dir = TempDir::new().unwrap();
        let splitter = MonthlySplitter::new(dir.path(), Scale::Monthly);
        assert_eq!(splitter.split_range("tmax", 1950..=1951).unwrap(), 0);
        assert!(splitter.split_year("tmax", 1950).is_err());
    }
}
