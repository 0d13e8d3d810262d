// The `read` subcommand: line protocol in, aligned columns or CSV out.

use crate::ReadArgs;
use anyhow::Result;
use std::io::{BufRead, Write};

pub fn read(output: &mut dyn Write, input: impl BufRead, args: &ReadArgs) -> Result<()> {
    let mut session = crate::format::Session::new(output, args.format);
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match linelog::parse_line_protocol(line) {
            Some(record) => session.render(&record)?,
            None => eprintln!("skipping line `{}`: not line protocol", line),
        }
    }
    Ok(())
}

#[test]
fn test_read_csv() {
    let input = "probe maximum=1 1704110400000000000\n\
                 garbage in between\n\
                 probe maximum=3 1704110410000000000\n";
    let mut output = Vec::new();
    let args = ReadArgs {
        format: crate::format::OutputFormat::Csv,
    };
    read(&mut output, input.as_bytes(), &args).unwrap();
    assert!(
        String::from_utf8(output).unwrap()
            == "timestamp,measurement,maximum\n\
                2024-01-01T12:00:00,probe,1\n\
                2024-01-01T12:00:10,probe,3\n"
    );
}
