// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the editing session.

use crate::gateway::GatewayError;
use crate::session::SessionState;
use thiserror::Error;

/// Input rejected locally, before anything is sent to the transform service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Please enter caption text")]
    EmptyText,

    #[error("End time must be after start time ({start:.2}s >= {end:.2}s)")]
    StartNotBeforeEnd { start: f64, end: f64 },

    #[error("Please add at least one caption")]
    NoCaptions,

    #[error("No video is ready for editing")]
    NotReady,
}

/// Everything an editing operation can fail with.
#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Caption {index} does not exist (collection has {len})")]
    Index { index: usize, len: usize },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Already processing: {state}")]
    Busy { state: SessionState },

    #[error("A video is already loaded in this session")]
    AlreadyLoaded,

    #[error("No transform with id {0} is in flight")]
    UnknownJob(u64),

    #[error("Could not start playback: {0}")]
    Playback(String),
}

impl EditError {
    /// Busy rejections are a no-op for the user, not a failure.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}
