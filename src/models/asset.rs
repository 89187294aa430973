// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The binary video being edited.

use bytes::Bytes;

/// A video payload. Assets are replaced wholesale after a transform, never
/// mutated; cloning one only bumps the reference count of its bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub bytes: Bytes,
    pub title: String,
    /// Known once the playback surface has reported it.
    pub duration: Option<f64>,
}

impl Asset {
    pub fn new(bytes: impl Into<Bytes>, title: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            title: title.into(),
            duration: None,
        }
    }

    /// File name used when uploading or saving this asset.
    pub fn file_name(&self) -> String {
        format!("{}.mp4", self.title)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A finished video handed to the save/export collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl ExportFile {
    /// Export named `<prefix><title>.mp4`.
    pub fn with_prefix(prefix: &str, title: &str, bytes: Bytes) -> Self {
        Self {
            file_name: format!("{prefix}{title}.mp4"),
            bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_bytes() {
        let asset = Asset::new(vec![1u8, 2, 3], "clip");
        let copy = asset.clone();
        assert_eq!(asset.bytes.as_ptr(), copy.bytes.as_ptr());
        assert_eq!(copy.file_name(), "clip.mp4");
        assert_eq!(copy.duration, None);
    }

    #[test]
    fn test_export_names() {
        let export = ExportFile::with_prefix("captioned_", "clip", Bytes::from_static(b"x"));
        assert_eq!(export.file_name, "captioned_clip.mp4");
    }
}
