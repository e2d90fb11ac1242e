use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProcessingError, Result};

/// Temporal resolution of a PRISM dataset unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Daily,
    Monthly,
}

impl Scale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Daily => "daily",
            Scale::Monthly => "monthly",
        }
    }

    /// Ordered date keys covering every day (or month) of `year`
    pub fn date_keys(&self, year: i32) -> Result<Vec<DateKey>> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| ProcessingError::InvalidFormat(format!("Year out of range: {}", year)))?;

        let keys = match self {
            Scale::Daily => first
                .iter_days()
                .take_while(|date| date.year() == year)
                .map(DateKey::daily)
                .collect(),
            Scale::Monthly => (1..=12)
                .filter_map(|month| NaiveDate::from_ymd_opt(year, month, 1))
                .map(DateKey::monthly)
                .collect(),
        };

        Ok(keys)
    }
}

impl FromStr for Scale {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Scale::Daily),
            "monthly" => Ok(Scale::Monthly),
            _ => Err(ProcessingError::InvalidScale(s.to_string())),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Date token addressing one raster archive and one table column.
///
/// Daily keys render as `YYYYMMDD`, monthly keys as `YYYYMM`. Monthly keys
/// always carry day 1 internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey {
    date: NaiveDate,
    scale: Scale,
}

impl DateKey {
    pub fn daily(date: NaiveDate) -> Self {
        Self {
            date,
            scale: Scale::Daily,
        }
    }

    pub fn monthly(date: NaiveDate) -> Self {
        Self {
            date: date.with_day(1).unwrap_or(date),
            scale: Scale::Monthly,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Parse an 8-digit daily or 6-digit monthly token
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if !token.chars().all(|c| c.is_ascii_digit()) {
            return Err(ProcessingError::InvalidFormat(format!(
                "Invalid date key: '{}'",
                token
            )));
        }

        match token.len() {
            8 => Ok(Self::daily(NaiveDate::parse_from_str(token, "%Y%m%d")?)),
            6 => {
                let date = NaiveDate::parse_from_str(&format!("{}01", token), "%Y%m%d")?;
                Ok(Self::monthly(date))
            }
            _ => Err(ProcessingError::InvalidFormat(format!(
                "Invalid date key: '{}'",
                token
            ))),
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scale {
            Scale::Daily => write!(f, "{}", self.date.format("%Y%m%d")),
            Scale::Monthly => write!(f, "{}", self.date.format("%Y%m")),
        }
    }
}

/// Generate the date keys for `year` at the scale named by `scale`
pub fn generate(year: i32, scale: &str) -> Result<Vec<DateKey>> {
    scale.parse::<Scale>()?.date_keys(year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_leap(year: i32) -> bool {
        (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
    }

    #[test]
    fn test_daily_key_count_follows_leap_years() {
        for year in [1900, 1981, 1996, 2000, 2023, 2024, 2100] {
            let keys = generate(year, "daily").unwrap();
            let expected = if is_leap(year) { 366 } else { 365 };
            assert_eq!(keys.len(), expected, "year {}", year);
        }
    }

    #[test]
    fn test_monthly_keys() {
        let keys = generate(1981, "monthly").unwrap();
        assert_eq!(keys.len(), 12);
        assert_eq!(keys[0].to_string(), "198101");
        assert_eq!(keys[11].to_string(), "198112");
    }

    #[test]
    fn test_daily_key_format_and_order() {
        let keys = generate(2024, "daily").unwrap();
        assert_eq!(keys[0].to_string(), "20240101");
        assert_eq!(keys[59].to_string(), "20240229");
        assert_eq!(keys[365].to_string(), "20241231");
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_keys_sort_chronologically() {
        let mut keys = vec![
            DateKey::parse("19810301").unwrap(),
            DateKey::parse("19801231").unwrap(),
            DateKey::parse("19810101").unwrap(),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(DateKey::to_string).collect();
        assert_eq!(rendered, vec!["19801231", "19810101", "19810301"]);
        assert!(Scale::Daily < Scale::Monthly);
    }

    #[test]
    fn test_invalid_scale() {
        assert!(matches!(
            generate(2000, "weekly"),
            Err(ProcessingError::InvalidScale(s)) if s == "weekly"
        ));
    }

    #[test]
    fn test_parse_date_key() {
        let key = DateKey::parse("19810215").unwrap();
        assert_eq!(key.scale(), Scale::Daily);
        assert_eq!(key.to_string(), "19810215");

        let key = DateKey::parse("198102").unwrap();
        assert_eq!(key.scale(), Scale::Monthly);
        assert_eq!(key.to_string(), "198102");

        assert!(DateKey::parse("1981-02-15").is_err());
        assert!(DateKey::parse("19810230").is_err());
    }
}
