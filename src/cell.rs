//! Cell values read from CSV fields and spreadsheet cells.
//!
//! A cell is either a value or null. Nulls are represented as `None` and
//! dropped on extraction; this covers empty cells, error cells, and the
//! usual "not available" spellings.

use serde::Serialize;

/// Field contents that read as null.
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A non-null cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Text.
    Text(String),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// A spreadsheet date/time as a serial day number.
    DateTime(f64),
}

impl CellValue {
    /// Type a CSV field: integers, then floats, then booleans, else text.
    ///
    /// A field that parses as NaN in any spelling is null. Infinities are
    /// kept as text, since a workbook cannot hold them as numbers.
    ///
    /// ```rust
    /// use quarry::CellValue;
    ///
    /// assert_eq!(CellValue::parse_field("42"), Some(CellValue::Int(42)));
    /// assert_eq!(CellValue::parse_field("2.5"), Some(CellValue::Float(2.5)));
    /// assert_eq!(CellValue::parse_field("TRUE"), Some(CellValue::Bool(true)));
    /// assert_eq!(CellValue::parse_field("N/A"), None);
    /// ```
    #[must_use]
    pub fn parse_field(field: &str) -> Option<Self> {
        if is_na(field) {
            return None;
        }
        if let Ok(i) = field.trim().parse::<i64>() {
            return Some(Self::Int(i));
        }
        if let Ok(f) = field.trim().parse::<f64>() {
            if f.is_nan() {
                return None;
            }
            if f.is_finite() {
                return Some(Self::Float(f));
            }
        }
        if field.eq_ignore_ascii_case("true") {
            return Some(Self::Bool(true));
        }
        if field.eq_ignore_ascii_case("false") {
            return Some(Self::Bool(false));
        }
        Some(Self::Text(field.to_string()))
    }

    /// Convert a spreadsheet cell.
    #[must_use]
    pub fn from_cell(cell: &calamine::Data) -> Option<Self> {
        match cell {
            calamine::Data::Int(i) => Some(Self::Int(*i)),
            calamine::Data::Float(f) if f.is_nan() => None,
            calamine::Data::Float(f) => Some(Self::Float(*f)),
            calamine::Data::String(s) if is_na(s) => None,
            calamine::Data::String(s) => Some(Self::Text(s.clone())),
            calamine::Data::Bool(b) => Some(Self::Bool(*b)),
            calamine::Data::DateTime(dt) => Some(Self::DateTime(dt.as_f64())),
            calamine::Data::DateTimeIso(s) | calamine::Data::DurationIso(s) => {
                Some(Self::Text(s.clone()))
            }
            calamine::Data::Error(_) | calamine::Data::Empty => None,
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) | Self::DateTime(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

fn is_na(field: &str) -> bool {
    NA_TOKENS.contains(&field)
}
