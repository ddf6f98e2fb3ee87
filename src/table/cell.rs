// src/table/cell.rs

use calamine::Data;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new("[^0-9]").expect("valid regex"));

/// A worksheet value reduced to what the case table can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Integer value of a count cell. Text keeps only its digits, so `"1,234"`
    /// and `"*5"` both read as numbers; text with no digits at all does not.
    pub fn coerce(&self) -> Option<i64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            Cell::Text(s) => {
                let digits = NON_DIGITS.replace_all(s, "");
                digits.parse().ok()
            }
            _ => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::Bool(v) => Cell::Text(v.to_string()),
            Data::String(v) => Cell::Text(v.clone()),
            Data::DateTime(v) => match v.as_datetime() {
                Some(dt) => Cell::Date(dt.date()),
                None => Cell::Number(v.as_f64()),
            },
            Data::DateTimeIso(v) => NaiveDate::parse_from_str(v.get(..10).unwrap_or(v), "%Y-%m-%d")
                .map(Cell::Date)
                .unwrap_or_else(|_| Cell::Text(v.clone())),
            Data::DurationIso(v) => Cell::Text(v.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Text(s) => f.write_str(s),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce() {
        assert_eq!(Cell::Number(1234.0).coerce(), Some(1234));
        assert_eq!(Cell::Number(12.9).coerce(), Some(12));
        assert_eq!(Cell::Text("1,234".into()).coerce(), Some(1234));
        assert_eq!(Cell::Text("*5".into()).coerce(), Some(5));
        assert_eq!(Cell::Text("*".into()).coerce(), None);
        assert_eq!(Cell::Empty.coerce(), None);
        assert_eq!(Cell::Number(f64::NAN).coerce(), None);
    }

    #[test]
    fn test_from_calamine() {
        assert_eq!(Cell::from(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(Cell::from(&Data::String("NHS Fife".into())), Cell::Text("NHS Fife".into()));
        assert_eq!(
            Cell::from(&Data::DateTimeIso("2020-10-25T00:00:00".into())),
            Cell::Date(NaiveDate::from_ymd_opt(2020, 10, 25).unwrap())
        );
        assert!(Cell::from(&Data::Empty).is_empty());
        assert!(Cell::Text("  ".into()).is_empty());
    }
}
