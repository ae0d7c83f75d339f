use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Recording rate assumed when a trace does not state one.
pub const DEFAULT_SAMPLING_RATE: u32 = 625;

/// A recorded contact trace of a single key, with its labelled press count.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub samples: Vec<bool>,
    pub sampling_rate: u32,
    pub presses: u32,
}

/// Parse a trace file.
///
/// `0` and `1` are samples, whitespace is ignored and `#` starts a comment
/// running to the end of the line. Two comments carry metadata:
/// `# SAMPLES-PER-SECOND: N` and `# PRESSES: N`.
pub fn parse(text: &str) -> Result<Trace> {
    let mut samples = Vec::new();
    let mut sampling_rate: i64 = DEFAULT_SAMPLING_RATE as i64;
    let mut presses: Option<i64> = None;

    for (line_num, line) in text.lines().enumerate() {
        for (col, ch) in line.char_indices() {
            match ch {
                '0' => samples.push(false),
                '1' => samples.push(true),
                ' ' | '\t' | '\r' => {}
                '#' => {
                    let comment = line[col..].trim_start_matches('#').trim_start();
                    if let Some(value) = comment.strip_prefix("SAMPLES-PER-SECOND:") {
                        sampling_rate = leading_int(value);
                        log::debug!("line {}: sampling rate {}", line_num + 1, sampling_rate);
                    } else if let Some(value) = comment.strip_prefix("PRESSES:") {
                        presses = Some(leading_int(value));
                        log::debug!("line {}: {} presses", line_num + 1, leading_int(value));
                    }
                    break;
                }
                other => log::debug!("line {}: skipping {:?}", line_num + 1, other),
            }
        }
    }

    if samples.is_empty() {
        bail!("no samples");
    }
    let presses = match presses {
        Some(n) if n >= 0 => n as u32,
        _ => bail!("could not find the number of presses"),
    };
    if sampling_rate <= 0 {
        bail!("invalid sampling rate {}", sampling_rate);
    }

    Ok(Trace {
        samples,
        sampling_rate: u32::try_from(sampling_rate).context("sampling rate out of range")?,
        presses,
    })
}

pub fn load(path: &Path) -> Result<Trace> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Leading decimal integer after optional whitespace, 0 if there is none.
fn leading_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let value = digits
        .chars()
        .map_while(|c| c.to_digit(10))
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(d as i64));
    if negative {
        -value
    } else {
        value
    }
}
