// Streaming time-weighted averaging over fixed windows.
//
// The averager consumes records in timestamp order and emits one averaged record whenever the
// span since the window start reaches the interval.  Values are modeled as a step function held
// constant between samples: each value is weighted by how long it was in effect, and the closing
// record's values additionally cover the remainder of the window up to the nominal boundary.
//
// Grouping is by arrival only.  Records are NOT keyed by measurement or tag: the tool is invoked
// on one measurement stream at a time, and a mixed stream will be averaged as one.  Fields
// present in some records but not others contribute weight only for the spans they cover.

use crate::{Record, Timestamp, Value};

struct FieldAcc {
    key: String,
    weighted_sum: f64,
    weighted_ns: f64,
}

pub struct Averager {
    interval_ns: i64,
    start: Option<Timestamp>,
    prev: Option<Record>,
    // Per-field accumulators, in first-seen order within the current window.
    accs: Vec<FieldAcc>,
}

impl Averager {
    pub fn new(interval_ns: i64) -> Averager {
        Averager {
            interval_ns,
            start: None,
            prev: None,
            accs: vec![],
        }
    }

    /// Feed one record; returns the averaged record if this record closed a window.  The emitted
    /// record carries the closing record's measurement, tag, and timestamp, and the closing
    /// record seeds the next window.
    pub fn push(&mut self, r: Record) -> Option<Record> {
        let start = *self.start.get_or_insert(r.timestamp);
        if let Some(prev) = self.prev.take() {
            let dt = (r.timestamp - prev.timestamp) as f64;
            self.accumulate(&prev, dt);
        }
        if r.timestamp - start >= self.interval_ns {
            // Tail weight: the closing record's values are held from its own timestamp to the
            // nominal end of the window.  Zero when the sample lands exactly on the boundary,
            // negative when it overshoots.
            let tail = (self.interval_ns - (r.timestamp - start)) as f64;
            self.accumulate(&r, tail);
            let fields = self
                .accs
                .drain(..)
                .map(|a| {
                    let avg = if a.weighted_ns == 0.0 {
                        0.0
                    } else {
                        a.weighted_sum / a.weighted_ns
                    };
                    (a.key, Value::Num(avg))
                })
                .collect();
            let averaged = Record {
                measurement: r.measurement.clone(),
                tag: r.tag.clone(),
                fields,
                timestamp: r.timestamp,
            };
            self.start = Some(r.timestamp);
            self.prev = Some(r);
            Some(averaged)
        } else {
            self.prev = Some(r);
            None
        }
    }

    fn accumulate(&mut self, r: &Record, dt: f64) {
        for (key, value) in &r.fields {
            let Value::Num(n) = value else {
                // Text fields are display-only.
                continue;
            };
            match self.accs.iter_mut().find(|a| a.key == *key) {
                Some(a) => {
                    a.weighted_sum += n * dt;
                    a.weighted_ns += dt;
                }
                None => self.accs.push(FieldAcc {
                    key: key.clone(),
                    weighted_sum: n * dt,
                    weighted_ns: dt,
                }),
            }
        }
    }
}

#[cfg(test)]
use crate::NS_PER_SEC;

#[cfg(test)]
fn rec(secs: i64, fields: &[(&str, f64)]) -> Record {
    Record {
        measurement: "m".to_string(),
        tag: None,
        fields: fields
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Num(*v)))
            .collect(),
        timestamp: secs * NS_PER_SEC,
    }
}

#[cfg(test)]
fn avg_of(r: &Record, key: &str) -> f64 {
    match r.get(key) {
        Some(Value::Num(n)) => *n,
        _ => panic!("no numeric field {key}"),
    }
}

#[test]
fn test_weighted_average() {
    // x=1 held for 5s, x=2 held for 5s, x=3 lands exactly on the boundary and gets zero tail:
    // (1*5 + 2*5 + 3*0) / 10 = 1.5.
    let mut a = Averager::new(10 * NS_PER_SEC);
    assert!(a.push(rec(0, &[("x", 1.0)])).is_none());
    assert!(a.push(rec(5, &[("x", 2.0)])).is_none());
    let out = a.push(rec(10, &[("x", 3.0)])).unwrap();
    assert!(out.measurement == "m");
    assert!(out.timestamp == 10 * NS_PER_SEC);
    assert!(avg_of(&out, "x") == 1.5);
}

#[test]
fn test_constant_input() {
    // Whatever the spacing or interval, a constant signal averages to itself.
    let mut a = Averager::new(7 * NS_PER_SEC);
    let mut emitted = 0;
    for t in [0, 1, 2, 5, 9, 13, 20, 31] {
        if let Some(out) = a.push(rec(t, &[("y", 42.0)])) {
            assert!(avg_of(&out, "y") == 42.0);
            emitted += 1;
        }
    }
    assert!(emitted > 1);
}

#[test]
fn test_overshoot_tail() {
    // The closing sample overshoots the boundary; the tail weight goes negative, exactly as the
    // reference computes it: (2*25 + 4*(10-25)) / (25-15) = -1.
    let mut a = Averager::new(10 * NS_PER_SEC);
    assert!(a.push(rec(0, &[("x", 2.0)])).is_none());
    let out = a.push(rec(25, &[("x", 4.0)])).unwrap();
    assert!(avg_of(&out, "x") == -1.0);
}

#[test]
fn test_degenerate_window() {
    // A zero interval closes on the first record with zero weighted duration; the average is
    // defined as 0.
    let mut a = Averager::new(0);
    let out = a.push(rec(3, &[("x", 9.0)])).unwrap();
    assert!(avg_of(&out, "x") == 0.0);
    assert!(out.timestamp == 3 * NS_PER_SEC);
}

#[test]
fn test_partial_fields_and_text() {
    let mut a = Averager::new(10 * NS_PER_SEC);
    // "x" is present throughout; "y" appears only at t=5 and so is weighted only over [5,10).
    assert!(a.push(rec(0, &[("x", 1.0)])).is_none());
    assert!(a.push(rec(5, &[("x", 1.0), ("y", 8.0)])).is_none());
    let mut closing = rec(10, &[("x", 1.0)]);
    closing
        .fields
        .push(("state".to_string(), Value::Text("printing".to_string())));
    let out = a.push(closing).unwrap();
    assert!(avg_of(&out, "x") == 1.0);
    assert!(avg_of(&out, "y") == 8.0);
    // Text fields never make it into an average.
    assert!(out.get("state").is_none());
}

#[test]
fn test_window_reset() {
    // The closing record seeds the next window: its value is held from its timestamp onward.
    let mut a = Averager::new(10 * NS_PER_SEC);
    assert!(a.push(rec(0, &[("x", 1.0)])).is_none());
    let first = a.push(rec(10, &[("x", 3.0)])).unwrap();
    assert!(avg_of(&first, "x") == 1.0);
    // Second window [10,20): x=3 for 10s.
    let second = a.push(rec(20, &[("x", 5.0)])).unwrap();
    assert!(avg_of(&second, "x") == 3.0);
    assert!(second.timestamp == 20 * NS_PER_SEC);
}
