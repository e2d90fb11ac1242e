pub mod downloader;
pub mod extract;
pub mod monthly_split;

pub use downloader::{archive_units, ArchiveUnit, DownloadSummary, PrismDownloader};
pub use extract::extract_archive;
pub use monthly_split::MonthlySplitter;
