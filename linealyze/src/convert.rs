// The `convert` subcommand: free-form console log lines in, line protocol out.

use crate::ConvertArgs;
use anyhow::Result;
use linelog::{self, FreeformConfig, Precision};
use std::io::{BufRead, Write};

pub fn convert(output: &mut dyn Write, input: impl BufRead, args: &ConvertArgs) -> Result<()> {
    let config = FreeformConfig {
        separator: args.result_header.clone(),
        measurement: args.measurement.clone(),
        tag: args.tag.clone(),
        // The probe accuracy report spells this field name out in full.
        renames: vec![("standard deviation".to_string(), "stddev".to_string())],
    };
    let today = args.date.unwrap_or_else(linelog::current_date);
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match linelog::parse_freeform(line, &config, today) {
            Ok((record, skipped)) => {
                for token in skipped {
                    eprintln!("skipping field `{}`: not numeric", token);
                }
                writeln!(output, "{}", linelog::line_protocol(&record, Precision::Full))?;
            }
            Err(e) => {
                eprintln!("skipping line `{}`: {}", line, e);
            }
        }
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
fn probe_args() -> ConvertArgs {
    ConvertArgs {
        result_header: " // probe accuracy results: ".to_string(),
        measurement: "probe_accuracy".to_string(),
        tag: None,
        date: Some(chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
    }
}

#[test]
fn test_convert() {
    let input = "12:00:00 // probe accuracy results: maximum 0.123, minimum -0.045, \
                 range 0.168, average 0.010, standard deviation 0.056\n";
    let mut output = Vec::new();
    convert(&mut output, input.as_bytes(), &probe_args()).unwrap();
    assert!(
        String::from_utf8(output).unwrap()
            == "probe_accuracy maximum=0.123,minimum=-0.045,range=0.168,average=0.01,\
                stddev=0.056 1704110400000000000\n"
    );
}

#[test]
fn test_convert_skips_bad_lines() {
    let input = "\n\
                 something else entirely\n\
                 12:00:05 // probe accuracy results: maximum 0.2\n\
                 bad // probe accuracy results: maximum 0.3\n";
    let mut output = Vec::new();
    convert(&mut output, input.as_bytes(), &probe_args()).unwrap();
    assert!(
        String::from_utf8(output).unwrap()
            == "probe_accuracy maximum=0.2 1704110405000000000\n"
    );
}

#[test]
fn test_convert_tag() {
    let mut args = probe_args();
    args.tag = Some("device=printer".to_string());
    let mut output = Vec::new();
    convert(
        &mut output,
        "12:00:00 // probe accuracy results: maximum 0.5\n".as_bytes(),
        &args,
    )
    .unwrap();
    assert!(
        String::from_utf8(output).unwrap()
            == "probe_accuracy,device=printer maximum=0.5 1704110400000000000\n"
    );
}
