// Session-oriented rendering of records as aligned columns or CSV.
//
// The session owns the set of field names seen so far.  The set only grows; columns appear in
// sorted name order, and whenever a record introduces a field the session has never seen, the
// header is printed again immediately before that record's row.  A record missing a known field
// gets an empty cell.  There is no ambient state: one session, one field set.

use anyhow::Result;
use clap::ValueEnum;
use linelog::{self, Record, Value};
use std::collections::BTreeSet;
use std::io::Write;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    /// Fixed-width columns with a header
    Line,
    /// Comma-separated values
    Csv,
}

const TIME_WIDTH: usize = 20;
const MEASUREMENT_WIDTH: usize = 15;
const TAG_WIDTH: usize = 20;
const FIELD_WIDTH: usize = 15;

pub enum Session<W: Write> {
    Columns {
        output: W,
        known: BTreeSet<String>,
    },
    Csv {
        writer: csv::Writer<W>,
        known: BTreeSet<String>,
    },
}

impl<W: Write> Session<W> {
    pub fn new(output: W, format: OutputFormat) -> Session<W> {
        match format {
            OutputFormat::Line => Session::Columns {
                output,
                known: BTreeSet::new(),
            },
            OutputFormat::Csv => Session::Csv {
                // Header reprints change the record length mid-stream.
                writer: csv::WriterBuilder::new().flexible(true).from_writer(output),
                known: BTreeSet::new(),
            },
        }
    }

    pub fn render(&mut self, record: &Record) -> Result<()> {
        let known = match self {
            Session::Columns { known, .. } => known,
            Session::Csv { known, .. } => known,
        };
        let mut grew = false;
        for (key, _) in &record.fields {
            if known.insert(key.clone()) {
                grew = true;
            }
        }
        if grew {
            self.header()?;
        }
        self.row(record)
    }

    fn header(&mut self) -> Result<()> {
        match self {
            Session::Columns { output, known } => {
                let mut header = format!(
                    "{:<tw$} {:<mw$} {:<gw$}",
                    "Timestamp",
                    "Measurement",
                    "Tag",
                    tw = TIME_WIDTH,
                    mw = MEASUREMENT_WIDTH,
                    gw = TAG_WIDTH
                );
                for key in known.iter() {
                    header += &format!("{:<w$}", key, w = FIELD_WIDTH);
                }
                writeln!(output, "{}", header)?;
                writeln!(output, "{}", "=".repeat(header.len()))?;
                output.flush()?;
            }
            Session::Csv { writer, known } => {
                let mut cells = vec!["timestamp".to_string(), "measurement".to_string()];
                cells.extend(known.iter().cloned());
                writer.write_record(&cells)?;
                writer.flush()?;
            }
        }
        Ok(())
    }

    fn row(&mut self, record: &Record) -> Result<()> {
        match self {
            Session::Columns { output, known } => {
                let mut row = format!(
                    "{:<tw$} {:<mw$} {:<gw$}",
                    linelog::human_timestamp(record.timestamp),
                    record.measurement,
                    record.tag.as_deref().unwrap_or(""),
                    tw = TIME_WIDTH,
                    mw = MEASUREMENT_WIDTH,
                    gw = TAG_WIDTH
                );
                for key in known.iter() {
                    row += &format!("{:<w$}", cell(record, key), w = FIELD_WIDTH);
                }
                writeln!(output, "{}", row)?;
                output.flush()?;
            }
            Session::Csv { writer, known } => {
                let mut cells = vec![
                    linelog::iso_timestamp(record.timestamp),
                    record.measurement.clone(),
                ];
                for key in known.iter() {
                    cells.push(cell(record, key));
                }
                writer.write_record(&cells)?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

fn cell(record: &Record, key: &str) -> String {
    match record.get(key) {
        Some(Value::Num(n)) => linelog::format_number(*n),
        Some(Value::Text(t)) => t.clone(),
        None => "".to_string(),
    }
}

#[cfg(test)]
fn rendered(records: &[&str], format: OutputFormat) -> String {
    let mut session = Session::new(Vec::new(), format);
    for line in records {
        session
            .render(&linelog::parse_line_protocol(line).unwrap())
            .unwrap();
    }
    let buf = match session {
        Session::Columns { output, .. } => output,
        Session::Csv { writer, .. } => match writer.into_inner() {
            Ok(output) => output,
            Err(_) => panic!("csv writer flush failed"),
        },
    };
    String::from_utf8(buf).unwrap()
}

#[test]
fn test_columns_growth() {
    let out = rendered(
        &[
            "probe maximum=2 1704110400000000000",
            "probe maximum=2.5 1704110405000000000",
            "probe maximum=2.0006,range=1 1704110410000000000",
        ],
        OutputFormat::Line,
    );
    let lines = out.lines().collect::<Vec<&str>>();
    // Header, rule, row, row, then a reprinted header when `range` appears, rule, row.
    assert!(lines.len() == 7);
    assert!(lines[0].starts_with("Timestamp"));
    assert!(lines[0].contains("maximum"));
    assert!(!lines[0].contains("range"));
    assert!(lines[1].chars().all(|c| c == '='));
    assert!(lines[2].starts_with("2024-01-01 12:00:00"));
    // Every cell, the last included, is padded to full column width.
    assert!(lines[2].len() == lines[0].len());
    assert!(lines[6].len() == lines[4].len());
    assert!(lines[2].trim_end().ends_with(" 2"));
    assert!(lines[3].trim_end().ends_with(" 2.5"));
    assert!(lines[4].contains("maximum") && lines[4].contains("range"));
    // Once seen, a field stays; columns are sorted by name.
    assert!(lines[4].find("maximum").unwrap() < lines[4].find("range").unwrap());
    assert!(lines[6].contains("2.001") && lines[6].trim_end().ends_with("1"));
}

#[test]
fn test_csv() {
    let out = rendered(
        &[
            "probe maximum=2 1704110400000000000",
            "probe range=0.5 1704110405000000000",
        ],
        OutputFormat::Csv,
    );
    let lines = out.lines().collect::<Vec<&str>>();
    assert!(lines.len() == 4);
    assert!(lines[0] == "timestamp,measurement,maximum");
    assert!(lines[1] == "2024-01-01T12:00:00,probe,2");
    // The new field reprints the header; the old column keeps its slot, empty when absent.
    assert!(lines[2] == "timestamp,measurement,maximum,range");
    assert!(lines[3] == "2024-01-01T12:00:05,probe,,0.5");
}
