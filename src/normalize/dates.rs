use chrono::NaiveDate;
use serde_json::Value;

use crate::models::{AuthorityRecord, CanonicalDate};

use super::literal::decode_literal;

/// Parse free-text date into a canonical date
///
/// Everything except digits and `/` is stripped first. If the cleaned text
/// is not a plain date, it is assumed to be several dates run together
/// and the first one is recovered from its position.
pub fn normalize_date(raw: &str) -> CanonicalDate {
    if raw.trim().is_empty() {
        return CanonicalDate::Unknown;
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '/')
        .collect();

    if cleaned.is_empty() {
        return CanonicalDate::Unknown;
    }

    parse_plain_date(&cleaned).unwrap_or_else(|| recover_concatenated(&cleaned))
}

/// `m/d/YYYY`, `m/d/yy`, `YYYY/m/d`, `m/YYYY` or a bare `YYYY`
fn parse_plain_date(text: &str) -> Option<CanonicalDate> {
    let parts: Vec<&str> = text.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    match parts.as_slice() {
        [y] if y.len() == 4 => y.parse().ok().map(CanonicalDate::Year),
        [m, y] => ymd(y, m, "1"),
        [a, b, c] if a.len() == 4 => ymd(a, b, c),
        [m, d, yy] if yy.len() == 2 => two_digit_year(m, d, yy),
        [m, d, y] => ymd(y, m, d),
        _ => None,
    }
}

fn ymd(y: &str, m: &str, d: &str) -> Option<CanonicalDate> {
    if y.len() != 4 || m.len() > 2 || d.len() > 2 {
        return None;
    }
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
        .map(CanonicalDate::Day)
}

/// Century follows chrono's `%y` rule: low values land in the 2000s,
/// high values in the 1900s
fn two_digit_year(m: &str, d: &str, yy: &str) -> Option<CanonicalDate> {
    if m.len() > 2 || d.len() > 2 {
        return None;
    }
    let padded = format!("{:0>2}/{:0>2}/{}", m, d, yy);
    NaiveDate::parse_from_str(&padded, "%m/%d/%y")
        .ok()
        .map(CanonicalDate::Day)
}

/// Positional recovery for dates that were concatenated without a separator
fn recover_concatenated(text: &str) -> CanonicalDate {
    // "01/15/201002/01/2011": keep through the second slash and a 4-digit year
    if text.chars().take(4).any(|c| c == '/') {
        return match text.match_indices('/').nth(1) {
            Some((second_slash, _)) => {
                let end = (second_slash + 5).min(text.len());
                parse_plain_date(&text[..end]).unwrap_or(CanonicalDate::Unknown)
            }
            None => CanonicalDate::Unknown,
        };
    }

    match text.len() {
        // Two years ("20102012") or a year then m/d/YYYY ("20101/5/2011")
        8 | 12 => leading_year(text),
        _ => CanonicalDate::Unknown,
    }
}

fn leading_year(text: &str) -> CanonicalDate {
    let year = &text[..4];
    if year.chars().all(|c| c.is_ascii_digit()) {
        year.parse()
            .map(CanonicalDate::Year)
            .unwrap_or(CanonicalDate::Unknown)
    } else {
        CanonicalDate::Unknown
    }
}

/// Earliest parseable date across every authority's six date fields
pub fn earliest_authority_date(authorities: &[AuthorityRecord]) -> CanonicalDate {
    authorities
        .iter()
        .flat_map(AuthorityRecord::date_texts)
        .map(normalize_date)
        .filter(CanonicalDate::is_known)
        .min()
        .unwrap_or(CanonicalDate::Unknown)
}

/// Final date for a record
///
/// The first parseable start-date candidate wins; otherwise the earliest
/// authority date; otherwise unknown.
pub fn resolve_record_date<'a, I>(
    start_candidates: I,
    authorities: &[AuthorityRecord],
) -> CanonicalDate
where
    I: IntoIterator<Item = &'a str>,
{
    start_candidates
        .into_iter()
        .map(normalize_date)
        .find(CanonicalDate::is_known)
        .unwrap_or_else(|| earliest_authority_date(authorities))
}

/// Read a cell holding a list of authorities
///
/// Accepts a JSON array, its textual encoding, or null/blank for none.
pub fn parse_authorities(cell: &Value) -> Result<Vec<AuthorityRecord>, String> {
    match cell {
        Value::Null => Ok(Vec::new()),
        Value::String(text) if text.trim().is_empty() => Ok(Vec::new()),
        Value::String(text) => {
            let decoded = decode_literal(text)?;
            serde_json::from_value(decoded).map_err(|e| e.to_string())
        }
        Value::Array(_) => serde_json::from_value(cell.clone()).map_err(|e| e.to_string()),
        other => Err(format!("expected a list of authorities, found {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> CanonicalDate {
        CanonicalDate::Day(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn authority(enacted: &str, effective_text: &str) -> AuthorityRecord {
        AuthorityRecord {
            enacted_date: Some(enacted.to_string()),
            effective_text: Some(effective_text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_plain_formats() {
        assert_eq!(normalize_date("01/15/2010"), day(2010, 1, 15));
        assert_eq!(normalize_date("1/5/2010"), day(2010, 1, 5));
        assert_eq!(normalize_date("2010/01/15"), day(2010, 1, 15));
        assert_eq!(normalize_date("06/2008"), day(2008, 6, 1));
        assert_eq!(normalize_date("2004"), CanonicalDate::Year(2004));
    }

    #[test]
    fn test_two_digit_years() {
        assert_eq!(normalize_date("01/15/10"), day(2010, 1, 15));
        assert_eq!(normalize_date("1/5/10"), day(2010, 1, 5));
        assert_eq!(normalize_date("12/31/99"), day(1999, 12, 31));
        assert_eq!(normalize_date("Effective 7/1/05"), day(2005, 7, 1));
        assert_eq!(normalize_date("2/30/10"), CanonicalDate::Unknown);
    }

    #[test]
    fn test_strips_noise_before_parsing() {
        assert_eq!(normalize_date("Enacted: 3/12/2009."), day(2009, 3, 12));
        assert_eq!(normalize_date("  2015 "), CanonicalDate::Year(2015));
    }

    #[test]
    fn test_empty_or_noise_is_unknown() {
        assert_eq!(normalize_date(""), CanonicalDate::Unknown);
        assert_eq!(normalize_date("   "), CanonicalDate::Unknown);
        assert_eq!(normalize_date("n/a"), CanonicalDate::Unknown);
        assert_eq!(normalize_date("no date given"), CanonicalDate::Unknown);
    }

    #[test]
    fn test_concatenated_full_dates_take_first() {
        assert_eq!(normalize_date("01/15/201002/01/2011"), day(2010, 1, 15));
        assert_eq!(normalize_date("1/5/2010 and 2/1/2011"), day(2010, 1, 5));
    }

    #[test]
    fn test_eight_digits_take_leading_year() {
        for input in ["20102012", "19992001", "20100115", "00001234"] {
            let expected: i32 = input[..4].parse().unwrap();
            assert_eq!(normalize_date(input), CanonicalDate::Year(expected), "{}", input);
        }
        assert_eq!(normalize_date("2008, 2012").to_string(), "2008");
    }

    #[test]
    fn test_twelve_chars_take_leading_year() {
        assert_eq!(normalize_date("20101/5/2011"), CanonicalDate::Year(2010));
    }

    #[test]
    fn test_other_lengths_are_unknown() {
        assert_eq!(normalize_date("123456"), CanonicalDate::Unknown);
        assert_eq!(normalize_date("13/45/2010"), CanonicalDate::Unknown);
    }

    #[test]
    fn test_earliest_authority_date_all_empty() {
        let authorities = vec![authority("", ""), AuthorityRecord::default()];
        assert_eq!(earliest_authority_date(&authorities), CanonicalDate::Unknown);
        assert_eq!(earliest_authority_date(&[]), CanonicalDate::Unknown);
    }

    #[test]
    fn test_earliest_authority_date_is_minimum() {
        let authorities = vec![
            authority("05/01/2012", "effective 2011"),
            authority("garbage", "03/03/2011"),
            AuthorityRecord {
                effective_date_display: Some("12/31/2010".to_string()),
                ..Default::default()
            },
        ];

        let earliest = earliest_authority_date(&authorities);
        assert_eq!(earliest, day(2010, 12, 31));

        let rendered = earliest.to_string();
        for text in authorities.iter().flat_map(AuthorityRecord::date_texts) {
            let other = normalize_date(text);
            if other.is_known() {
                assert!(rendered <= other.to_string());
            }
        }
    }

    #[test]
    fn test_resolve_prefers_start_date() {
        let authorities = vec![authority("01/15/2010", "")];
        assert_eq!(resolve_record_date(["03/01/2015"], &authorities), day(2015, 3, 1));
        assert_eq!(resolve_record_date(["", "tbd"], &authorities), day(2010, 1, 15));
        assert_eq!(resolve_record_date([""], &[]), CanonicalDate::Unknown);
    }

    #[test]
    fn test_parse_authorities_shapes() {
        let structured = json!([{"enactedDate": "01/15/2010", "id": 1}]);
        assert_eq!(parse_authorities(&structured).unwrap().len(), 1);

        let textual = json!("[{'enactedDate': '01/15/2010', 'effectiveText': None}]");
        let parsed = parse_authorities(&textual).unwrap();
        assert_eq!(parsed[0].enacted_date.as_deref(), Some("01/15/2010"));

        assert!(parse_authorities(&Value::Null).unwrap().is_empty());
        assert!(parse_authorities(&json!(42)).is_err());
    }
}
