// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Caption project files.
//!
//! A project is the caption list of one video, saved so work can be resumed
//! or moved between videos. Captions read back from a file are not trusted;
//! they go through the session's validation before use.

use super::caption::{Caption, CaptionCollection};
use serde::{Deserialize, Serialize};

/// Serialized caption project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionProject {
    pub title: String,
    #[serde(default)]
    pub captions: Vec<Caption>,
}

impl CaptionProject {
    pub fn new(title: impl Into<String>, captions: &CaptionCollection) -> Self {
        Self {
            title: title.into(),
            captions: captions.as_slice().to_vec(),
        }
    }
}
