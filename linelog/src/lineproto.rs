// Parser for already-encoded InfluxDB line protocol:
//
//   measurement[,tag] key=value[,key=value]* timestamp
//
// This is an explicit tokenizer, not a regex: locate the trailing digit run first, then the
// optional tag, then the comma-separated fields.  A line that does not match the grammar yields
// None and the caller moves on, silently or with a diagnostic as it sees fit.
//
// Values that parse as f64 become numeric; anything else is kept as text for display-only
// consumers.  The averager ignores text fields.

use crate::{Record, Value};

pub fn parse_line_protocol(line: &str) -> Option<Record> {
    let line = line.trim();
    let (rest, ts) = line.rsplit_once(' ')?;
    if ts.is_empty() || !ts.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let timestamp = ts.parse::<i64>().ok()?;

    let (head, data) = rest.trim_end().split_once(' ')?;
    let (measurement, tag) = match head.split_once(',') {
        Some((m, t)) => (m, Some(t)),
        None => (head, None),
    };
    if !is_identifier(measurement) {
        return None;
    }
    if let Some(t) = tag {
        if t.is_empty() || !t.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'=') {
            return None;
        }
    }

    let mut fields: Vec<(String, Value)> = vec![];
    for token in data.split(',') {
        let Some((key, value)) = token.trim().split_once('=') else {
            continue;
        };
        let value = match value.parse::<f64>() {
            Ok(n) => Value::Num(n),
            Err(_) => Value::Text(value.to_string()),
        };
        // A repeated key overwrites the earlier value.
        match fields.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => fields.push((key.to_string(), value)),
        }
    }
    if fields.is_empty() {
        return None;
    }

    Some(Record {
        measurement: measurement.to_string(),
        tag: tag.map(|t| t.to_string()),
        fields,
        timestamp,
    })
}

/// True for nonempty strings of letters, digits, and underscores.
pub fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[test]
fn test_parse_line_protocol() {
    let r = parse_line_protocol("probe_accuracy maximum=0.123,minimum=-0.045 1704110400000000000")
        .unwrap();
    assert!(r.measurement == "probe_accuracy");
    assert!(r.tag.is_none());
    assert!(r.timestamp == 1704110400000000000);
    assert!(r.fields.len() == 2);
    assert!(r.fields[0] == ("maximum".to_string(), Value::Num(0.123)));
    assert!(r.fields[1] == ("minimum".to_string(), Value::Num(-0.045)));
}

#[test]
fn test_parse_line_protocol_tag() {
    let r = parse_line_protocol("temperature,device=3d_printer bed_temp=60,bed_target=60 123456")
        .unwrap();
    assert!(r.tag.as_deref() == Some("device=3d_printer"));
    assert!(r.timestamp == 123456);

    // An empty or malformed tag segment fails the whole line.
    assert!(parse_line_protocol("temperature, bed_temp=60 123456").is_none());
    assert!(parse_line_protocol("temperature,dev-ice bed_temp=60 123456").is_none());
}

#[test]
fn test_parse_line_protocol_text_fields() {
    let r = parse_line_protocol("status state=printing,progress=0.42 99").unwrap();
    assert!(r.get("state") == Some(&Value::Text("printing".to_string())));
    assert!(r.get("progress") == Some(&Value::Num(0.42)));
}

#[test]
fn test_parse_line_protocol_rejects() {
    // No timestamp.
    assert!(parse_line_protocol("m x=1").is_none());
    assert!(parse_line_protocol("m x=1 12s9").is_none());
    // No fields segment.
    assert!(parse_line_protocol("m 123").is_none());
    // No parseable field.
    assert!(parse_line_protocol("hello world 123").is_none());
    // Bad measurement identifier.
    assert!(parse_line_protocol("bad-name x=1 123").is_none());
    assert!(parse_line_protocol("").is_none());
}

#[test]
fn test_parse_line_protocol_duplicate_key() {
    let r = parse_line_protocol("m x=1,x=2 10").unwrap();
    assert!(r.fields.len() == 1);
    assert!(r.get("x") == Some(&Value::Num(2.0)));
}
