//! Fixed-width weather lines for the legacy hydrology model.
//!
//! Field order is year `I6`, month `I4`, day `I4`, srad `F6.1`, tmax `F6.1`,
//! tmin `F6.1`, ppt `F6.2`, rhum `F6.1`, wind `F6.1`, label `A25`. Optional
//! fields a dataset does not carry become six blanks, so every line is
//! [`LINE_WIDTH`] characters.

use crate::error::{ProcessingError, Result};
use crate::models::{DailyRecord, FieldSet};

pub const LINE_WIDTH: usize = 75;

const NUMERIC_WIDTH: usize = 6;
const LABEL_WIDTH: usize = 25;

/// Which optional fields a weather file carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    Base,
    Srad,
    Rhum,
    Wind,
    SradRhum,
    SradWind,
    RhumWind,
    Full,
}

impl Layout {
    pub fn from_fields(fields: FieldSet) -> Self {
        match (fields.srad, fields.rhum, fields.wind) {
            (false, false, false) => Layout::Base,
            (true, false, false) => Layout::Srad,
            (false, true, false) => Layout::Rhum,
            (false, false, true) => Layout::Wind,
            (true, true, false) => Layout::SradRhum,
            (true, false, true) => Layout::SradWind,
            (false, true, true) => Layout::RhumWind,
            (true, true, true) => Layout::Full,
        }
    }

    pub fn fields(&self) -> FieldSet {
        match self {
            Layout::Base => FieldSet::new(false, false, false),
            Layout::Srad => FieldSet::new(true, false, false),
            Layout::Rhum => FieldSet::new(false, true, false),
            Layout::Wind => FieldSet::new(false, false, true),
            Layout::SradRhum => FieldSet::new(true, true, false),
            Layout::SradWind => FieldSet::new(true, false, true),
            Layout::RhumWind => FieldSet::new(false, true, true),
            Layout::Full => FieldSet::new(true, true, true),
        }
    }
}

/// `Iw`: right-justified integer, `*` fill on overflow
pub fn format_integer(value: i64, width: usize) -> String {
    fit(format!("{:>width$}", value, width = width), width)
}

/// `Fw.d`: right-justified fixed-point, `*` fill on overflow
pub fn format_float(value: f64, width: usize, decimals: usize) -> String {
    fit(
        format!("{:>width$.decimals$}", value, width = width, decimals = decimals),
        width,
    )
}

/// `Aw`: right-justified when short, truncated on the right when long.
///
/// Width counts bytes, like the fixed columns the reader expects; a
/// multi-byte character that would straddle the edge is dropped.
pub fn format_text(value: &str, width: usize) -> String {
    let mut end = value.len().min(width);
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let text = &value[..end];
    format!("{}{}", " ".repeat(width - text.len()), text)
}

fn fit(formatted: String, width: usize) -> String {
    if formatted.len() > width {
        "*".repeat(width)
    } else {
        formatted
    }
}

/// Encodes [`DailyRecord`]s for one declared [`Layout`]
#[derive(Debug, Clone, Copy)]
pub struct FixedFormatEncoder {
    layout: Layout,
}

impl FixedFormatEncoder {
    pub fn new(fields: FieldSet) -> Self {
        Self {
            layout: Layout::from_fields(fields),
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn encode(&self, record: &DailyRecord) -> Result<String> {
        let fields = self.layout.fields();
        let mut line = String::with_capacity(LINE_WIDTH);

        line.push_str(&format_integer(required_int(record.year.map(i64::from), "year")?, 6));
        line.push_str(&format_integer(required_int(record.month.map(i64::from), "month")?, 4));
        line.push_str(&format_integer(required_int(record.day.map(i64::from), "day")?, 4));
        line.push_str(&optional_field(record.srad, fields.srad, "srad", 1)?);
        line.push_str(&format_float(required(record.tmax, "tmax")?, NUMERIC_WIDTH, 1));
        line.push_str(&format_float(required(record.tmin, "tmin")?, NUMERIC_WIDTH, 1));
        line.push_str(&format_float(required(record.ppt, "ppt")?, NUMERIC_WIDTH, 2));
        line.push_str(&optional_field(record.rhum, fields.rhum, "rhum", 1)?);
        line.push_str(&optional_field(record.wind, fields.wind, "wind", 1)?);
        line.push_str(&format_text(&record.label, LABEL_WIDTH));

        Ok(line)
    }

    /// Encode every record before returning anything, one line each
    pub fn encode_all<'a>(&self, records: impl IntoIterator<Item = &'a DailyRecord>) -> Result<String> {
        let mut out = String::new();
        for record in records {
            out.push_str(&self.encode(record)?);
            out.push('\n');
        }
        Ok(out)
    }
}

fn required_int(value: Option<i64>, field: &str) -> Result<i64> {
    value.ok_or_else(|| ProcessingError::encoding(field, "value is missing"))
}

fn required(value: Option<f64>, field: &str) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(ProcessingError::encoding(field, format!("value {} is not numeric", v))),
        None => Err(ProcessingError::encoding(field, "value is missing")),
    }
}

fn optional_field(value: Option<f64>, declared: bool, field: &str, decimals: usize) -> Result<String> {
    if !declared {
        return Ok(" ".repeat(NUMERIC_WIDTH));
    }
    let value = required(value, field)
        .map_err(|_| ProcessingError::encoding(field, "declared field has no value on this record"))?;
    Ok(format_float(value, NUMERIC_WIDTH, decimals))
}
