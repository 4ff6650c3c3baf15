//! Parsing helpers for upstream date strings and location slugs.
//!
//! Pure functions, no I/O. Used by the join engine and by the request
//! filters.

use chrono::NaiveDate;

use crate::error::ParseError;
use crate::models::LocationName;

/// Marker prefixed to dates that are not confirmed yet.
pub const UNCONFIRMED_MARKER: char = '*';

/// Parse an upstream concert date.
///
/// Accepts `DD-MM-YYYY` (the usual upstream form) and `YYYY-MM-DD`,
/// optionally prefixed with a single [`UNCONFIRMED_MARKER`].
///
/// # Example
/// ```
/// use gigscope::parser::parse_date;
///
/// let date = parse_date("*23-08-2019").unwrap();
/// assert_eq!(date.to_string(), "2019-08-23");
/// ```
pub fn parse_date(value: &str) -> Result<NaiveDate, ParseError> {
    let cleaned = value
        .strip_prefix(UNCONFIRMED_MARKER)
        .unwrap_or(value)
        .trim();

    if cleaned.is_empty() {
        return Err(ParseError::EmptyDate);
    }

    // Fixed-width fields only: chrono alone would take `1-1-2020` or `01-01-20`.
    let format = if has_shape(cleaned, [4, 2, 2]) {
        "%Y-%m-%d"
    } else if has_shape(cleaned, [2, 2, 4]) {
        "%d-%m-%Y"
    } else {
        return Err(ParseError::InvalidDate(value.to_string()));
    };

    NaiveDate::parse_from_str(cleaned, format)
        .map_err(|_| ParseError::InvalidDate(value.to_string()))
}

/// Three dash-separated runs of ASCII digits with exactly these widths.
fn has_shape(value: &str, widths: [usize; 3]) -> bool {
    let mut parts = value.split('-');
    let matched = widths.iter().all(|&width| {
        parts
            .next()
            .is_some_and(|part| part.len() == width && part.bytes().all(|b| b.is_ascii_digit()))
    });
    matched && parts.next().is_none()
}

/// Split a slug like `los_angeles-usa` into a readable city and country.
///
/// The last `-` separated segment is the country, everything before it the
/// city. A slug without any `-` is all city.
pub fn split_slug(slug: &str) -> LocationName {
    let (city, country) = match slug.rsplit_once('-') {
        Some((city, country)) => (city, country),
        None => (slug, ""),
    };

    LocationName {
        city: title_case(&city.replace('_', " ")),
        country: title_case(&country.replace('_', " ")),
        raw: slug.to_string(),
    }
}

/// Naive per-word title case: first letter upper, rest lower.
///
/// Collapses runs of whitespace. No locale awareness.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_day_first() {
        let date = parse_date("07-02-2020").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2020, 2, 7));
    }

    #[test]
    fn test_parse_year_first() {
        let date = parse_date("2024-01-02").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 1, 2));
    }

    #[test]
    fn test_parse_unconfirmed_marker() {
        let date = parse_date("*23-08-2019").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2019, 8, 23));

        let date = parse_date("* 23-08-2019 ").unwrap();
        assert_eq!(date.day(), 23);
    }

    #[test]
    fn test_parse_empty_fails() {
        assert_eq!(parse_date(""), Err(ParseError::EmptyDate));
        assert_eq!(parse_date("*"), Err(ParseError::EmptyDate));
        assert_eq!(parse_date("   "), Err(ParseError::EmptyDate));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(matches!(parse_date("soon"), Err(ParseError::InvalidDate(_))));
        assert!(parse_date("31-02-2020").is_err());
        assert!(parse_date("2020/01/01").is_err());
    }

    #[test]
    fn test_parse_rejects_unpadded_and_short_fields() {
        for raw in ["01-01-20", "1-1-2020", "2020-1-5", "5-6-2019", "*1-01-2020", "01-01-2020-01", "0a-01-2020"] {
            assert!(
                matches!(parse_date(raw), Err(ParseError::InvalidDate(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_impossible_day() {
        assert!(parse_date("31-02-2020").is_err());
        assert!(parse_date("2020-13-01").is_err());
    }

    #[test]
    fn test_split_slug() {
        let loc = split_slug("los_angeles-usa");
        assert_eq!(loc.city, "Los Angeles");
        assert_eq!(loc.country, "Usa");
        assert_eq!(loc.raw, "los_angeles-usa");

        let loc = split_slug("paris-france");
        assert_eq!(loc.city, "Paris");
        assert_eq!(loc.country, "France");
    }

    #[test]
    fn test_split_slug_multi_dash_city() {
        let loc = split_slug("saint-etienne-france");
        assert_eq!(loc.city, "Saint-etienne");
        assert_eq!(loc.country, "France");
    }

    #[test]
    fn test_split_slug_without_country() {
        let loc = split_slug("playa_del_carmen");
        assert_eq!(loc.city, "Playa Del Carmen");
        assert_eq!(loc.country, "");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("NEW   york"), "New York");
        assert_eq!(title_case(""), "");
    }
}
