//! Experience-source loader.
//!
//! A trace is a stream of whitespace-separated tokens, four per record:
//! `state action reward next_state`. Records may span or share lines.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::error::{QraceError, Result};
use crate::experience::{ExperienceBuffer, Transition};

/// Load at most `limit` records from the file at `path`
pub fn load_experiences<P: AsRef<Path>>(path: P, limit: Option<usize>) -> Result<ExperienceBuffer> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let buffer = parse_experiences(BufReader::new(file), limit)?;
    info!(path = %path.display(), records = buffer.len(), "loaded experience trace");
    Ok(buffer)
}

/// Parse at most `limit` records from `reader`.
///
/// Stops at end of input or once `limit` records are read. A partial final
/// record, a non-numeric token or a line that is not UTF-8 is a
/// [`QraceError::Parse`] naming the offending line.
pub fn parse_experiences<R: BufRead>(mut reader: R, limit: Option<usize>) -> Result<ExperienceBuffer> {
    let limit = limit.unwrap_or(usize::MAX);
    let mut transitions = Vec::new();
    let mut record = Transition::new(0, 0, 0.0, 0);
    let mut filled = 0;
    let mut record_line = 0;

    let mut buf = Vec::new();
    let mut line_no = 0;
    'lines: while transitions.len() < limit {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = std::str::from_utf8(&buf).map_err(|err| QraceError::Parse {
            line: line_no,
            reason: format!("invalid UTF-8: {}", err),
        })?;

        for token in line.split_whitespace() {
            if transitions.len() >= limit {
                break 'lines;
            }
            if filled == 0 {
                record_line = line_no;
            }
            match filled {
                0 => record.state = parse_field(token, line_no, "state")?,
                1 => record.action = parse_field(token, line_no, "action")?,
                2 => record.reward = parse_field(token, line_no, "reward")?,
                _ => record.next_state = parse_field(token, line_no, "next_state")?,
            }
            filled += 1;
            if filled == 4 {
                transitions.push(record);
                filled = 0;
            }
        }
    }

    if filled > 0 && transitions.len() < limit {
        return Err(QraceError::Parse {
            line: record_line,
            reason: format!("incomplete record: {} of 4 fields", filled),
        });
    }

    Ok(ExperienceBuffer::new(transitions))
}

fn parse_field<T: FromStr>(token: &str, line: usize, name: &str) -> Result<T> {
    token.parse().map_err(|_| QraceError::Parse {
        line,
        reason: format!("invalid {} '{}'", name, token),
    })
}
