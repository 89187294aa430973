// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Time utility functions.
//!
//! Conversions between seconds on the video timeline and fractions of a
//! widget's width, plus clock formatting for labels.

/// Convert a time in seconds to a fraction of the timeline (0.0 to 1.0).
pub fn time_to_fraction(seconds: f64, duration: f64) -> f32 {
    if duration <= 0.0 || !duration.is_finite() {
        return 0.0;
    }
    (seconds / duration).clamp(0.0, 1.0) as f32
}

/// Convert a timeline fraction back to seconds.
pub fn fraction_to_time(fraction: f32, duration: f64) -> f64 {
    f64::from(fraction.clamp(0.0, 1.0)) * duration.max(0.0)
}

/// Format seconds as `M:SS.cc`, or `H:MM:SS.cc` past the hour.
pub fn format_clock(seconds: f64) -> String {
    let centis = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 100.0 + 1e-6).floor() as u64
    } else {
        0
    };
    let cs = centis % 100;
    let total_secs = centis / 100;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    if hours > 0 {
        format!("{}:{:02}:{:02}.{:02}", hours, mins, secs, cs)
    } else {
        format!("{}:{:02}.{:02}", mins, secs, cs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_mapping() {
        assert_eq!(time_to_fraction(30.0, 120.0), 0.25);
        assert!((fraction_to_time(0.25, 120.0) - 30.0).abs() < 0.0001);

        // Out of range
        assert_eq!(time_to_fraction(-5.0, 120.0), 0.0);
        assert_eq!(time_to_fraction(500.0, 120.0), 1.0);
        assert_eq!(fraction_to_time(1.5, 10.0), 10.0);
    }

    #[test]
    fn test_zero_duration() {
        assert_eq!(time_to_fraction(3.0, 0.0), 0.0);
        assert_eq!(time_to_fraction(3.0, f64::NAN), 0.0);
        assert_eq!(fraction_to_time(0.5, 0.0), 0.0);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "0:00.00");
        assert_eq!(format_clock(65.25), "1:05.25");
        assert_eq!(format_clock(3723.5), "1:02:03.50");
        assert_eq!(format_clock(-2.0), "0:00.00");
    }
}
