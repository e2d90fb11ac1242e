use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Which optional weather fields a dataset carries.
///
/// The fixed-width layout is chosen from this declaration, never from the
/// values present on an individual record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSet {
    pub srad: bool,
    pub rhum: bool,
    pub wind: bool,
}

impl FieldSet {
    pub const NONE: FieldSet = FieldSet {
        srad: false,
        rhum: false,
        wind: false,
    };

    pub const ALL: FieldSet = FieldSet {
        srad: true,
        rhum: true,
        wind: true,
    };

    pub fn new(srad: bool, rhum: bool, wind: bool) -> Self {
        Self { srad, rhum, wind }
    }

    /// Every combination of optional fields, in a stable order
    pub fn combinations() -> [FieldSet; 8] {
        let mut all = [FieldSet::NONE; 8];
        for (i, set) in all.iter_mut().enumerate() {
            *set = FieldSet::new(i & 1 != 0, i & 2 != 0, i & 4 != 0);
        }
        all
    }
}

/// One station-day of weather values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub ppt: Option<f64>,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
    pub tdmean: Option<f64>,
    pub vpdmin: Option<f64>,
    pub vpdmax: Option<f64>,
    pub srad: Option<f64>,
    pub rhum: Option<f64>,
    pub wind: Option<f64>,
    pub label: String,
}

impl DailyRecord {
    /// Empty record for `date`, labelled with its midnight timestamp
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            year: Some(date.year()),
            month: Some(date.month()),
            day: Some(date.day()),
            ppt: None,
            tmin: None,
            tmax: None,
            tdmean: None,
            vpdmin: None,
            vpdmax: None,
            srad: None,
            rhum: None,
            wind: None,
            label: format!("{} 00:00:00", date.format("%Y-%m-%d")),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)
    }

    /// Set a value by its PRISM variable token; unknown tokens are ignored
    pub fn set(&mut self, variable: &str, value: Option<f64>) -> bool {
        let slot = match variable {
            "ppt" => &mut self.ppt,
            "tmin" => &mut self.tmin,
            "tmax" => &mut self.tmax,
            "tdmean" => &mut self.tdmean,
            "vpdmin" => &mut self.vpdmin,
            "vpdmax" => &mut self.vpdmax,
            "srad" => &mut self.srad,
            "rhum" => &mut self.rhum,
            "wind" => &mut self.wind,
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn get(&self, variable: &str) -> Option<f64> {
        match variable {
            "ppt" => self.ppt,
            "tmin" => self.tmin,
            "tmax" => self.tmax,
            "tdmean" => self.tdmean,
            "vpdmin" => self.vpdmin,
            "vpdmax" => self.vpdmax,
            "srad" => self.srad,
            "rhum" => self.rhum,
            "wind" => self.wind,
            _ => None,
        }
    }
}
