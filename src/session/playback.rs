// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback surface abstraction.
//!
//! The session only needs to load a video, seek, play, pause and hear back
//! about the playhead and duration. Anything that can do that (an external
//! player, a test double) can back the editor.

use crate::models::asset::Asset;
use anyhow::Result;

/// Notification from the playback surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// The playhead moved.
    TimeUpdate(f64),
    /// The loaded video's duration is known.
    DurationKnown(f64),
    /// Playback reached the end of the video.
    Ended,
}

/// A surface that can play the current asset.
pub trait PlaybackSurface {
    /// Create a playback handle for `asset`. Any previous handle must already
    /// have been released.
    fn load(&mut self, asset: &Asset) -> Result<()>;

    /// Drop the current playback handle and its resources.
    fn release(&mut self);

    fn seek(&mut self, seconds: f64);

    fn play(&mut self);

    fn pause(&mut self);

    /// Drain events produced since the last call.
    fn poll_events(&mut self) -> Vec<PlaybackEvent>;
}

/// Pending auto-stop for a preview: pause once the playhead reaches `at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PreviewStop {
    pub at: f64,
}

impl PreviewStop {
    pub fn reached(&self, time: f64) -> bool {
        time >= self.at
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Recording surface for session tests.

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Load(String, usize),
        Release,
        Seek(f64),
        Play,
        Pause,
    }

    #[derive(Debug, Default)]
    pub struct RecordingSurface {
        pub calls: Vec<Call>,
        pub queued: Vec<PlaybackEvent>,
        pub fail_load: bool,
    }

    impl RecordingSurface {
        /// Index of the last call matching `pred`.
        pub fn last_index(&self, pred: impl Fn(&Call) -> bool) -> Option<usize> {
            self.calls.iter().rposition(pred)
        }
    }

    impl PlaybackSurface for RecordingSurface {
        fn load(&mut self, asset: &Asset) -> Result<()> {
            if self.fail_load {
                anyhow::bail!("no player available");
            }
            self.calls.push(Call::Load(asset.title.clone(), asset.len()));
            Ok(())
        }

        fn release(&mut self) {
            self.calls.push(Call::Release);
        }

        fn seek(&mut self, seconds: f64) {
            self.calls.push(Call::Seek(seconds));
        }

        fn play(&mut self) {
            self.calls.push(Call::Play);
        }

        fn pause(&mut self) {
            self.calls.push(Call::Pause);
        }

        fn poll_events(&mut self) -> Vec<PlaybackEvent> {
            std::mem::take(&mut self.queued)
        }
    }
}
