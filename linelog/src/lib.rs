// This library handles streams of 3D-printer telemetry records.  It parses free-form console log
// lines and already-encoded InfluxDB line protocol into a common record shape, computes
// time-weighted averages over fixed windows, and renders records back to text.
//
// TODO (normal pri)
//
//  - String-valued fields are emitted without quoting or escaping; a comma or space inside such a
//    value will corrupt the line on re-parse.  Known gap, kept for compatibility with the data the
//    existing collectors produce.

mod dates;
mod freeform;
mod lineproto;
mod render;
mod window;

// Timestamp helpers: clock-text to epoch nanoseconds and back.

pub use dates::{current_date, human_timestamp, iso_timestamp, parse_clock, NS_PER_SEC};

// Parse a free-form log line ("12:00:00 // probe accuracy results: maximum 0.123, ...") into a
// record, given a configuration that names the separator and the measurement.

pub use freeform::{parse_freeform, FreeformConfig, ParseError};

// Parse one line of line protocol into a record, or None if the line does not match the grammar.

pub use lineproto::{is_identifier, parse_line_protocol};

// Render a record as line protocol, and the shared numeric display rule.

pub use render::{format_number, line_protocol, Precision};

// Streaming time-weighted averaging over fixed windows.

pub use window::Averager;

/// Nanoseconds since the Unix epoch.
pub type Timestamp = i64;

/// A field value is numeric when it parses as f64; otherwise the original text is kept verbatim
/// for display-only consumers.  Aggregation ignores the text variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Text(String),
}

/// One parsed record, the single currency between the parsers, the averager, and the renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Identifier, letters/digits/underscore only.
    pub measurement: String,

    /// At most one "key=value" tag.
    pub tag: Option<String>,

    /// Field keys are unique; insertion order is preserved so that rendering is deterministic.
    pub fields: Vec<(String, Value)>,

    /// Records in a stream are expected to arrive in non-decreasing timestamp order; the
    /// averager does not check this.
    pub timestamp: Timestamp,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}
