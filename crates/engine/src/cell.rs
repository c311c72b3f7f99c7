use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Day zero of the 1900 date system as Excel counts it (serial 1 = 1900-01-01,
/// with the phantom 1900-02-29 folded in for serials >= 61).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Text formats accepted when a date was typed into a cell as plain text.
const TEXT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];
const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display string used for row field maps. Integers print without a
    /// trailing `.0`, dates print as ISO (time omitted at midnight).
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime(dt) => {
                if dt.time() == chrono::NaiveTime::MIN {
                    dt.date().format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }

    /// Interpret the cell as a point in time. Native date cells always
    /// qualify; text qualifies when it parses in one of the accepted forms.
    /// Plain numbers are not treated as dates.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Text(s) => parse_datetime_text(s.trim()),
            _ => None,
        }
    }
}

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in TEXT_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in TEXT_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn excel_epoch() -> NaiveDateTime {
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert an Excel serial date (1900 system) to a timestamp.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let secs = (serial * SECONDS_PER_DAY).round() as i64;
    excel_epoch().checked_add_signed(Duration::seconds(secs))
}

/// Convert a timestamp to an Excel serial date (1900 system).
pub fn datetime_to_serial(dt: NaiveDateTime) -> f64 {
    let delta = dt - excel_epoch();
    delta.num_seconds() as f64 / SECONDS_PER_DAY
}
