// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O: media files, caption projects, subtitles and the preview player.

pub mod media;
pub mod player;
pub mod serialization;
pub mod srt;
