// The `summarize` subcommand: line protocol in, one time-weighted average per window out.
//
// Lines that are not line protocol are dropped silently; in a live pipe the stream routinely
// contains partial or foreign lines and a diagnostic per line would drown the output.

use crate::SummarizeArgs;
use anyhow::Result;
use linelog::{self, Averager, Precision, NS_PER_SEC};
use std::io::{BufRead, Write};

pub fn summarize(output: &mut dyn Write, input: impl BufRead, args: &SummarizeArgs) -> Result<()> {
    let mut averager = Averager::new(args.interval as i64 * NS_PER_SEC);
    for line in input.lines() {
        let line = line?;
        if let Some(record) = linelog::parse_line_protocol(&line) {
            if let Some(averaged) = averager.push(record) {
                writeln!(output, "{}", linelog::line_protocol(&averaged, Precision::Rounded))?;
                // The consumer is typically a live pipe; don't sit on a closed window.
                output.flush()?;
            }
        }
    }
    Ok(())
}

#[test]
fn test_summarize() {
    let input = "m x=1 0\n\
                 m x=2 5000000000\n\
                 m x=3 10000000000\n";
    let mut output = Vec::new();
    summarize(&mut output, input.as_bytes(), &SummarizeArgs { interval: 10 }).unwrap();
    assert!(String::from_utf8(output).unwrap() == "m x=1.5 10000000000\n");
}

#[test]
fn test_summarize_ignores_noise() {
    let input = "not line protocol\n\
                 temperature,device=p bed=60 0\n\
                 \n\
                 temperature,device=p bed=62 10000000000\n";
    let mut output = Vec::new();
    summarize(&mut output, input.as_bytes(), &SummarizeArgs { interval: 10 }).unwrap();
    // Constant-by-span average: bed=60 held for the whole window.
    assert!(
        String::from_utf8(output).unwrap() == "temperature,device=p bed=60 10000000000\n"
    );
}

#[test]
fn test_summarize_multiple_windows() {
    let input = "m x=2 0\n\
                 m x=2 10000000000\n\
                 m x=4 20000000000\n";
    let mut output = Vec::new();
    summarize(&mut output, input.as_bytes(), &SummarizeArgs { interval: 10 }).unwrap();
    assert!(
        String::from_utf8(output).unwrap()
            == "m x=2 10000000000\nm x=2 20000000000\n"
    );
}
