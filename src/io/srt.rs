// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! SubRip (`.srt`) encoding and decoding.
//!
//! Encoding is total: any caption collection, including an empty one,
//! produces valid SRT. Cues are written in collection order.

use crate::models::caption::{Caption, CaptionCollection};
use anyhow::{bail, Context, Result};

/// Encode captions as SRT. An empty collection yields an empty string.
pub fn encode(captions: &CaptionCollection) -> String {
    encode_slice(captions.as_slice())
}

/// Encode a slice of captions as SRT.
pub fn encode_slice(captions: &[Caption]) -> String {
    let mut output = String::new();

    for (index, caption) in captions.iter().enumerate() {
        output.push_str(&format!("{}\n", index + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(caption.start),
            format_timestamp(caption.end)
        ));
        output.push_str(&caption.text);
        output.push_str("\n\n");
    }

    output
}

/// Format seconds as `HH:MM:SS,mmm`, truncating to whole milliseconds.
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = whole_millis(seconds);
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs % 3600) / 60;
    let hours = total_secs / 3600;

    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, ms)
}

// Floor to milliseconds. The tolerance absorbs binary rounding so that a value
// entered as 65.3 lands on 300 ms rather than 299.
fn whole_millis(seconds: f64) -> u64 {
    if seconds.is_nan() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 1000.0 + 1e-6).floor() as u64
}

/// Parse SRT text into captions, in file order.
///
/// The index line is optional, `.` is accepted in place of `,` and cue text
/// spanning several lines is joined with newlines. Cue bounds are not
/// validated here; callers push the result through [`CaptionCollection::add`].
pub fn parse(input: &str) -> Result<Vec<Caption>> {
    let mut cues = Vec::new();
    let mut lines = input.lines().map(|l| l.trim_start_matches('\u{feff}')).peekable();

    while let Some(line) = lines.next() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let times = if line.contains("-->") {
            line
        } else {
            lines
                .next()
                .map(str::trim)
                .context("SRT cue is missing a timestamp line")?
        };

        let (start_raw, end_raw) = times
            .split_once("-->")
            .map(|(a, b)| (a.trim(), b.trim()))
            .context("SRT cue timestamp line must contain '-->'")?;

        let start = parse_timestamp(start_raw)
            .with_context(|| format!("Failed to parse SRT start timestamp '{start_raw}'"))?;
        let end = parse_timestamp(end_raw)
            .with_context(|| format!("Failed to parse SRT end timestamp '{end_raw}'"))?;

        let mut text_lines = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() {
                break;
            }
            if let Some(next) = lines.next() {
                text_lines.push(next.trim().to_string());
            }
        }

        cues.push(Caption {
            text: text_lines.join("\n"),
            start,
            end,
        });
    }

    Ok(cues)
}

/// Parse `HH:MM:SS,mmm` (or `HH:MM:SS.mmm`) into seconds.
pub fn parse_timestamp(value: &str) -> Result<f64> {
    let cleaned = value.trim().replace(',', ".");
    let (time_part, fractional_part) = match cleaned.split_once('.') {
        Some((time, frac)) => (time, frac),
        None => (cleaned.as_str(), "0"),
    };

    let fields = time_part
        .split(':')
        .map(|field| field.parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid timestamp '{value}'"))?;
    let [hours, minutes, seconds] = fields[..] else {
        bail!("Timestamp must have the form HH:MM:SS,mmm: '{value}'");
    };

    let mut millis_str: String = fractional_part.chars().take(3).collect();
    while millis_str.len() < 3 {
        millis_str.push('0');
    }
    let millis = millis_str
        .parse::<u64>()
        .with_context(|| format!("Invalid millisecond component in '{value}'"))?;

    let total_ms = (hours * 3600 + minutes * 60 + seconds) * 1000 + millis;
    Ok(total_ms as f64 / 1000.0)
}
