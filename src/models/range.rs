// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Trim selection within a known duration.
//!
//! The two bounds are coupled: dragging one past the other drags the other
//! along, so `0 <= start <= end <= duration` holds after every call. Inputs
//! are clamped, never rejected.

use serde::{Deserialize, Serialize};

/// A `[start, end]` selection in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeRange {
    start: f64,
    end: f64,
    duration: f64,
}

impl TimeRange {
    /// Create a range spanning the whole duration.
    pub fn new(duration: f64) -> Self {
        let duration = sanitize(duration);
        Self {
            start: 0.0,
            end: duration,
            duration,
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// True when the selection is non-empty and can be submitted as a trim.
    pub fn is_valid_selection(&self) -> bool {
        self.start < self.end
    }

    /// Move the start bound. Pulls `end` up when `v` passes it.
    pub fn set_start(&mut self, v: f64) {
        let v = self.clamp(v);
        self.start = v;
        if self.end < v {
            self.end = v;
        }
    }

    /// Move the end bound. Pulls `start` down when `v` passes it.
    pub fn set_end(&mut self, v: f64) {
        let v = self.clamp(v);
        self.end = v;
        if self.start > v {
            self.start = v;
        }
    }

    /// Select the whole duration again.
    pub fn reset(&mut self) {
        self.start = 0.0;
        self.end = self.duration;
    }

    /// Adopt a new duration (a new asset was loaded) and select all of it.
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = sanitize(duration);
        self.reset();
    }

    fn clamp(&self, v: f64) -> f64 {
        sanitize(v).min(self.duration)
    }
}

fn sanitize(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_spans_full_duration() {
        let range = TimeRange::new(42.5);
        assert_eq!(range.start(), 0.0);
        assert_eq!(range.end(), 42.5);
        assert!(range.is_valid_selection());
    }

    #[test]
    fn test_inputs_are_clamped() {
        let mut range = TimeRange::new(10.0);
        range.set_start(-3.0);
        assert_eq!(range.start(), 0.0);
        range.set_end(99.0);
        assert_eq!(range.end(), 10.0);
        range.set_start(f64::NAN);
        assert_eq!(range.start(), 0.0);
    }

    #[test]
    fn test_start_past_end_pulls_end_up() {
        let mut range = TimeRange::new(10.0);
        range.set_end(4.0);
        range.set_start(6.0);
        assert_eq!(range.start(), 6.0);
        assert_eq!(range.end(), 6.0);
        assert!(!range.is_valid_selection());
    }

    #[test]
    fn test_end_below_start_pulls_start_down() {
        for v in [0.5, 3.0, 7.25, 10.0] {
            let mut range = TimeRange::new(10.0);
            range.set_start(v);
            let v2 = v / 2.0;
            range.set_end(v2);
            assert_eq!(range.start(), v2);
            assert_eq!(range.end(), v2);
        }
    }

    #[test]
    fn test_set_duration_resets_selection() {
        let mut range = TimeRange::new(60.0);
        range.set_start(5.0);
        range.set_end(20.0);
        range.set_duration(15.0);
        assert_eq!(range, TimeRange::new(15.0));
    }

    #[test]
    fn test_reset() {
        let mut range = TimeRange::new(8.0);
        range.set_start(2.0);
        range.set_end(3.0);
        range.reset();
        assert_eq!(range.start(), 0.0);
        assert_eq!(range.end(), 8.0);
        assert_eq!(range.length(), 8.0);
    }
}
