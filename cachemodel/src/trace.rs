use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::error::TraceError;
use crate::metrics::AccessKind;

lazy_static! {
    // e.g. "I  0400d7d4,8" or " S 7ff000398,8"
    static ref LACKEY_LINE: Regex =
        Regex::new(r"^\s*(?P<kind>[ILSM])\s+(?P<address>[0-9a-fA-F]+),(?P<size>[0-9]+)\s*$")
            .expect("the lackey pattern is valid");
}

/// A single access of a trace, `<read|write>,<hex address>` in text form
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub kind: AccessKind,
    pub address: u64,
}

impl TraceRecord {
    pub fn read(address: u64) -> Self {
        Self {
            kind: AccessKind::Read,
            address,
        }
    }

    pub fn write(address: u64) -> Self {
        Self {
            kind: AccessKind::Write,
            address,
        }
    }
}

/// Error of a record parsed on its own, without line information
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected '<read|write>,<hex address>'")]
pub struct ParseRecordError;

impl FromStr for TraceRecord {
    type Err = ParseRecordError;

    /// # Examples
    ///
    /// ```
    /// use cachemodel::trace::TraceRecord;
    /// let record: TraceRecord = "write,0x1f40".parse().unwrap();
    /// assert_eq!(record, TraceRecord::write(0x1f40));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, address) = s.trim().split_once(',').ok_or(ParseRecordError)?;
        let kind = match kind.trim() {
            "read" => AccessKind::Read,
            "write" => AccessKind::Write,
            _ => return Err(ParseRecordError),
        };
        let address = address.trim();
        let digits = address
            .strip_prefix("0x")
            .or_else(|| address.strip_prefix("0X"))
            .unwrap_or(address);
        let address = u64::from_str_radix(digits, 16).map_err(|_| ParseRecordError)?;
        Ok(Self { kind, address })
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{:x}", self.kind, self.address)
    }
}

/// Reads trace records line by line. Blank lines are skipped, malformed ones are reported with
/// their 1-based line number
pub struct TraceReader<R: BufRead> {
    reader: R,
    line: usize,
    buffer: String,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(TraceError::Io(e))),
            }
            self.line += 1;
            let record = self.buffer.trim();
            if record.is_empty() {
                continue;
            }
            return Some(record.parse().map_err(|_| TraceError::Malformed {
                line: self.line,
                record: record.to_string(),
            }));
        }
    }
}

/// Number of records written by `convert_lackey`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct LackeyCounts {
    pub instructions: u64,
    pub loads: u64,
    pub stores: u64,
    pub skipped: u64,
}

/// Splits a Valgrind lackey log (`--tool=lackey --trace-mem=yes`) into an instruction trace and a
/// data trace
///
/// Instruction fetches (`I`) and loads (`L`) become reads, stores (`S`) become writes. Modify
/// records (`M`) and anything that isn't a memory record, such as the Valgrind banner, are skipped
///
/// # Arguments
///
/// * `log`: The lackey log
/// * `instructions`: Where the instruction trace is written
/// * `data`: Where the data trace is written
///
/// returns: Result<LackeyCounts, TraceError>
pub fn convert_lackey<R: BufRead, I: Write, D: Write>(
    log: R,
    mut instructions: I,
    mut data: D,
) -> Result<LackeyCounts, TraceError> {
    let mut counts = LackeyCounts::default();
    for line in log.lines() {
        let line = line?;
        let Some(captures) = LACKEY_LINE.captures(&line) else {
            counts.skipped += 1;
            continue;
        };
        let address = &captures["address"];
        match &captures["kind"] {
            "I" => {
                writeln!(instructions, "read,{address}")?;
                counts.instructions += 1;
            }
            "L" => {
                writeln!(data, "read,{address}")?;
                counts.loads += 1;
            }
            "S" => {
                writeln!(data, "write,{address}")?;
                counts.stores += 1;
            }
            _ => counts.skipped += 1,
        }
    }
    instructions.flush()?;
    data.flush()?;
    Ok(counts)
}
