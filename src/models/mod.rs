pub mod daily_record;
pub mod date_key;
pub mod station;

pub use daily_record::{DailyRecord, FieldSet};
pub use date_key::{DateKey, Scale};
pub use station::Station;
