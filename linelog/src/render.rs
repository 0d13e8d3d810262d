// Rendering records back to text.

use crate::{Record, Value};
use itertools::Itertools;

/// How numeric field values are written out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Precision {
    /// Shortest representation that round-trips, for data that will be re-parsed.
    Full,
    /// Three decimals with trailing zeros stripped, for re-derived values such as averages.
    Rounded,
}

/// Round to three decimals, then strip trailing zeros and a bare trailing point:
/// 2.000 -> "2", 2.500 -> "2.5", 2.501 -> "2.501".
pub fn format_number(v: f64) -> String {
    let s = format!("{v:.3}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Encode a record as one line of line protocol.  Text values are emitted bare, without quoting
/// or escaping (see the TODO in lib.rs).
pub fn line_protocol(r: &Record, precision: Precision) -> String {
    let tag = match &r.tag {
        Some(t) => format!(",{t}"),
        None => "".to_string(),
    };
    let fields = r
        .fields
        .iter()
        .map(|(k, v)| match v {
            Value::Num(n) if precision == Precision::Rounded => {
                format!("{k}={}", format_number(*n))
            }
            Value::Num(n) => format!("{k}={n}"),
            Value::Text(t) => format!("{k}={t}"),
        })
        .join(",");
    format!("{}{} {} {}", r.measurement, tag, fields, r.timestamp)
}

#[test]
fn test_format_number() {
    assert!(format_number(2.0) == "2");
    assert!(format_number(2.5) == "2.5");
    assert!(format_number(2.501) == "2.501");
    assert!(format_number(2.0004) == "2");
    assert!(format_number(2.0006) == "2.001");
    assert!(format_number(10.0) == "10");
    assert!(format_number(-0.045) == "-0.045");
    // Negative underflow keeps its sign, as in the reference.
    assert!(format_number(-0.0001) == "-0");
    assert!(format_number(0.0) == "0");
}

#[test]
fn test_line_protocol() {
    let r = Record {
        measurement: "probe_accuracy".to_string(),
        tag: None,
        fields: vec![
            ("maximum".to_string(), Value::Num(0.123)),
            ("average".to_string(), Value::Num(0.010)),
        ],
        timestamp: 1704110400000000000,
    };
    assert!(
        line_protocol(&r, Precision::Full)
            == "probe_accuracy maximum=0.123,average=0.01 1704110400000000000"
    );

    let r = Record {
        measurement: "temperature".to_string(),
        tag: Some("device=3d_printer".to_string()),
        fields: vec![
            ("bed_temp".to_string(), Value::Num(1.0 / 3.0)),
            ("state".to_string(), Value::Text("printing".to_string())),
        ],
        timestamp: 99,
    };
    assert!(
        line_protocol(&r, Precision::Rounded)
            == "temperature,device=3d_printer bed_temp=0.333,state=printing 99"
    );
}

#[test]
fn test_line_protocol_round_trip() {
    let r = Record {
        measurement: "probe".to_string(),
        tag: Some("axis=z".to_string()),
        fields: vec![
            ("range".to_string(), Value::Num(0.168)),
            ("samples".to_string(), Value::Num(10.0)),
        ],
        timestamp: 1704110400000000000,
    };
    let reparsed = crate::parse_line_protocol(&line_protocol(&r, Precision::Full)).unwrap();
    assert!(reparsed == r);
}
