// Parser for free-form printer console lines of the shape
//
//   12:00:00 // probe accuracy results: maximum 0.123, minimum -0.045, ...
//
// The caller names the separator (the "result header") that divides the clock time on the left
// from the comma-separated key/value tokens on the right, and the measurement the resulting
// records are filed under.
//
// This is a log-tailing pipeline and must survive noisy input indefinitely, so a bad token is
// skipped, never fatal.  The three line-level failures are kept distinct so that drivers can
// report them differently.

use crate::dates;
use crate::{Record, Value};
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// The configured separator does not occur in the line.
    #[error("result header not found")]
    MissingHeader,

    #[error("unparseable timestamp `{0}`")]
    BadTimestamp(String),

    /// Every token on the data side failed numeric coercion.
    #[error("no usable fields")]
    EmptyFields,
}

/// How to take a free-form line apart.
#[derive(Debug, Clone)]
pub struct FreeformConfig {
    /// Literal separator between the clock time and the data portion.
    pub separator: String,

    /// Measurement name for the records produced.
    pub measurement: String,

    /// Optional "key=value" tag attached to every record.
    pub tag: Option<String>,

    /// Key rewrites applied before whitespace normalization, eg "standard deviation" -> "stddev".
    pub renames: Vec<(String, String)>,
}

/// Parse one trimmed, non-empty line.  On success, returns the record along with the raw tokens
/// that were skipped because their value would not parse as a number; the caller decides how to
/// diagnose those.
pub fn parse_freeform(
    line: &str,
    config: &FreeformConfig,
    today: NaiveDate,
) -> Result<(Record, Vec<String>), ParseError> {
    let Some((time_part, data_part)) = line.split_once(config.separator.as_str()) else {
        return Err(ParseError::MissingHeader);
    };
    let time_part = time_part.trim();
    let Some(timestamp) = dates::parse_clock(time_part, today) else {
        return Err(ParseError::BadTimestamp(time_part.to_string()));
    };

    let mut fields: Vec<(String, Value)> = vec![];
    let mut skipped = vec![];
    for token in data_part.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match split_token(token) {
            Some((key, value)) => {
                let key = normalize_key(key, &config.renames);
                // A repeated key overwrites the earlier value.
                match fields.iter_mut().find(|(k, _)| *k == key) {
                    Some(slot) => slot.1 = Value::Num(value),
                    None => fields.push((key, Value::Num(value))),
                }
            }
            None => skipped.push(token.to_string()),
        }
    }
    if fields.is_empty() {
        return Err(ParseError::EmptyFields);
    }

    Ok((
        Record {
            measurement: config.measurement.clone(),
            tag: config.tag.clone(),
            fields,
            timestamp,
        },
        skipped,
    ))
}

// Split at the last `=` if there is one, else at the last space; the right side must be numeric.
fn split_token(token: &str) -> Option<(&str, f64)> {
    let at = token.rfind('=').or_else(|| token.rfind(' '))?;
    let value = token[at + 1..].trim().parse::<f64>().ok()?;
    Some((token[..at].trim_end(), value))
}

fn normalize_key(key: &str, renames: &[(String, String)]) -> String {
    let mut key = key.to_string();
    for (from, to) in renames {
        if key == *from {
            key = to.clone();
        }
    }
    key.replace(' ', "_")
}

#[cfg(test)]
fn probe_config() -> FreeformConfig {
    FreeformConfig {
        separator: " // probe accuracy results: ".to_string(),
        measurement: "probe_accuracy".to_string(),
        tag: None,
        renames: vec![("standard deviation".to_string(), "stddev".to_string())],
    }
}

#[cfg(test)]
fn jan1() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[test]
fn test_parse_freeform() {
    let line = "12:00:00 // probe accuracy results: maximum 0.123, minimum -0.045, \
                range 0.168, average 0.010, standard deviation 0.056";
    let (r, skipped) = parse_freeform(line, &probe_config(), jan1()).unwrap();
    assert!(skipped.is_empty());
    assert!(r.measurement == "probe_accuracy");
    assert!(r.tag.is_none());
    assert!(r.timestamp == 1704110400 * dates::NS_PER_SEC);
    let expected = vec![
        ("maximum", 0.123),
        ("minimum", -0.045),
        ("range", 0.168),
        ("average", 0.010),
        ("stddev", 0.056),
    ];
    assert!(r.fields.len() == expected.len());
    for ((k, v), (xk, xv)) in r.fields.iter().zip(expected.iter()) {
        assert!(k == xk);
        assert!(*v == Value::Num(*xv));
    }
}

#[test]
fn test_parse_freeform_equals_preferred() {
    let config = FreeformConfig {
        separator: " :: ".to_string(),
        measurement: "m".to_string(),
        tag: Some("device=printer".to_string()),
        renames: vec![],
    };
    let (r, skipped) = parse_freeform("2024-01-01 12:00:00 :: bed temp=61.5, probe z 0.02", &config, jan1()).unwrap();
    assert!(skipped.is_empty());
    assert!(r.tag.as_deref() == Some("device=printer"));
    // `=` wins over the space, and key whitespace becomes underscores.
    assert!(r.get("bed_temp") == Some(&Value::Num(61.5)));
    assert!(r.get("probe_z") == Some(&Value::Num(0.02)));
}

#[test]
fn test_parse_freeform_skips_bad_tokens() {
    let line = "12:00:00 // probe accuracy results: maximum 0.1, Midpoint reached, range 0.2";
    let (r, skipped) = parse_freeform(line, &probe_config(), jan1()).unwrap();
    assert!(r.fields.len() == 2);
    assert!(skipped == vec!["Midpoint reached".to_string()]);
}

#[test]
fn test_parse_freeform_errors() {
    assert!(
        parse_freeform("12:00:00 no header here", &probe_config(), jan1())
            == Err(ParseError::MissingHeader)
    );
    assert!(
        parse_freeform("blah // probe accuracy results: maximum 0.1", &probe_config(), jan1())
            == Err(ParseError::BadTimestamp("blah".to_string()))
    );
    assert!(
        parse_freeform("12:00:00 // probe accuracy results: nothing numeric", &probe_config(), jan1())
            == Err(ParseError::EmptyFields)
    );
}

#[test]
fn test_parse_freeform_duplicate_key() {
    let line = "12:00:00 // probe accuracy results: maximum 0.1, maximum 0.3";
    let (r, _) = parse_freeform(line, &probe_config(), jan1()).unwrap();
    assert!(r.fields.len() == 1);
    assert!(r.get("maximum") == Some(&Value::Num(0.3)));
}
