use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate};

/// A single resolved date, or an explicit unknown
///
/// Known dates order the same way their rendered strings sort: a
/// year-only date comes before every full date in the same year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalDate {
    /// Full calendar date, rendered `YYYY/MM/DD`
    Day(NaiveDate),
    /// Year recovered without month or day, rendered `YYYY`
    Year(i32),
    /// Nothing parseable, rendered `unknown`
    Unknown,
}

impl CanonicalDate {
    pub const UNKNOWN_LABEL: &'static str = "unknown";

    pub fn is_known(&self) -> bool {
        !matches!(self, CanonicalDate::Unknown)
    }

    /// (year, month, day) with zeros standing in for a missing month/day
    fn sort_key(&self) -> Option<(i32, u32, u32)> {
        match self {
            CanonicalDate::Day(d) => Some((d.year(), d.month(), d.day())),
            CanonicalDate::Year(y) => Some((*y, 0, 0)),
            CanonicalDate::Unknown => None,
        }
    }
}

impl PartialOrd for CanonicalDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Unknown sorts after every known date
impl Ord for CanonicalDate {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.sort_key(), other.sort_key()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalDate::Day(d) => write!(f, "{}", d.format("%Y/%m/%d")),
            CanonicalDate::Year(y) => write!(f, "{:04}", y),
            CanonicalDate::Unknown => f.write_str(Self::UNKNOWN_LABEL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> CanonicalDate {
        CanonicalDate::Day(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(day(2010, 1, 5).to_string(), "2010/01/05");
        assert_eq!(CanonicalDate::Year(1999).to_string(), "1999");
        assert_eq!(CanonicalDate::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_ordering_matches_rendered_strings() {
        let mut dates = vec![
            day(2011, 3, 1),
            CanonicalDate::Year(2010),
            day(2010, 12, 31),
            day(2010, 1, 1),
            CanonicalDate::Year(2009),
        ];
        let mut rendered: Vec<String> = dates.iter().map(ToString::to_string).collect();
        dates.sort();
        rendered.sort();
        let sorted: Vec<String> = dates.iter().map(ToString::to_string).collect();
        assert_eq!(sorted, rendered);
    }
}
