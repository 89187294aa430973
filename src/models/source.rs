// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Remote source metadata and download requests.

use bytes::Bytes;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Metadata returned by the info endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatInfo>,
}

/// One downloadable format of the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub format_id: String,
    #[serde(default = "FormatInfo::default_ext")]
    pub ext: String,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default = "FormatInfo::no_codec")]
    pub acodec: String,
    #[serde(default = "FormatInfo::no_codec")]
    pub vcodec: String,
}

impl FormatInfo {
    fn default_ext() -> String {
        "mp4".to_string()
    }

    fn no_codec() -> String {
        "none".to_string()
    }

    pub fn has_audio(&self) -> bool {
        self.acodec != "none"
    }

    pub fn has_video(&self) -> bool {
        self.vcodec != "none"
    }

    /// Label shown in the format picker.
    pub fn label(&self) -> String {
        let resolution = self
            .resolution
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or("Audio");
        let note = self.note.as_deref().unwrap_or_default();
        let size = self
            .filesize
            .map(|bytes| format!("{}KB", (bytes as f64 / 1024.0).round() as u64))
            .unwrap_or_default();
        format!("{resolution} - {note} - {} - {size}", self.ext.to_uppercase())
    }
}

impl VideoInfo {
    /// Format preselected after the info arrives: first with audio, else first.
    pub fn default_format(&self) -> Option<&FormatInfo> {
        self.formats
            .iter()
            .find(|f| f.has_audio())
            .or_else(|| self.formats.first())
    }

    /// Format preselected for audio-only downloads.
    pub fn audio_format(&self) -> Option<&FormatInfo> {
        self.formats
            .iter()
            .find(|f| f.has_audio() && !f.has_video())
            .or_else(|| self.formats.iter().find(|f| f.has_audio() && f.ext == "m4a"))
    }
}

/// Body of a download request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub format_id: String,
    pub audio_only: bool,
}

/// A downloaded source file.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl DownloadedFile {
    /// File name without its extension, used as the asset title.
    pub fn title(&self) -> String {
        match self.file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => self.file_name.clone(),
        }
    }
}

/// Reduce YouTube watch URLs to `https://www.youtube.com/watch?v=<id>`,
/// dropping playlist and timestamp parameters. Anything else passes through.
pub fn normalize_source_url(input: &str) -> String {
    let input = input.trim();
    let Ok(url) = Url::parse(input) else {
        return input.to_string();
    };
    let is_youtube = url
        .host_str()
        .is_some_and(|host| host.contains("youtube.com"));
    if !is_youtube {
        return input.to_string();
    }
    match url.query_pairs().find(|(key, _)| key == "v") {
        Some((_, id)) => format!("https://www.youtube.com/watch?v={id}"),
        None => input.to_string(),
    }
}

/// Format a duration as `M:SS` for the source summary.
pub fn format_minutes(seconds: f64) -> String {
    if seconds.is_nan() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(id: &str, ext: &str, acodec: &str, vcodec: &str) -> FormatInfo {
        FormatInfo {
            format_id: id.to_string(),
            ext: ext.to_string(),
            resolution: None,
            note: None,
            filesize: None,
            acodec: acodec.to_string(),
            vcodec: vcodec.to_string(),
        }
    }

    fn info_with(formats: Vec<FormatInfo>) -> VideoInfo {
        VideoInfo {
            title: "t".into(),
            duration: 10.0,
            thumbnail: None,
            formats,
        }
    }

    #[test]
    fn test_default_format_prefers_audio() {
        let info = info_with(vec![
            format("1", "mp4", "none", "avc1"),
            format("2", "mp4", "mp4a", "avc1"),
        ]);
        assert_eq!(info.default_format().unwrap().format_id, "2");

        let silent = info_with(vec![format("9", "webm", "none", "vp9")]);
        assert_eq!(silent.default_format().unwrap().format_id, "9");
        assert!(info_with(vec![]).default_format().is_none());
    }

    #[test]
    fn test_audio_format_selection() {
        let info = info_with(vec![
            format("18", "mp4", "mp4a", "avc1"),
            format("140", "m4a", "mp4a", "none"),
        ]);
        assert_eq!(info.audio_format().unwrap().format_id, "140");

        let combined_only = info_with(vec![
            format("18", "mp4", "mp4a", "avc1"),
            format("22", "m4a", "mp4a", "avc1"),
        ]);
        assert_eq!(combined_only.audio_format().unwrap().format_id, "22");
    }

    #[test]
    fn test_info_deserializes_server_payload() {
        let json = r#"{
            "title": "Talk",
            "thumbnail": "",
            "duration": 125,
            "formats": [{"format_id": "18", "ext": "mp4", "resolution": "640x360",
                         "filesize": null, "note": "360p", "vcodec": "avc1", "acodec": "mp4a",
                         "has_audio": true}]
        }"#;
        let info: VideoInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.duration, 125.0);
        assert_eq!(info.formats[0].label(), "640x360 - 360p - MP4 - ");
    }

    #[test]
    fn test_label_with_size() {
        let mut f = format("140", "m4a", "mp4a", "none");
        f.filesize = Some(2048);
        assert_eq!(f.label(), "Audio -  - M4A - 2KB");
    }

    #[test]
    fn test_normalize_source_url() {
        assert_eq!(
            normalize_source_url("https://www.youtube.com/watch?v=abc123&list=PL1&t=42s"),
            "https://www.youtube.com/watch?v=abc123"
        );
        assert_eq!(
            normalize_source_url("https://vimeo.com/1234?x=1"),
            "https://vimeo.com/1234?x=1"
        );
        assert_eq!(normalize_source_url(" not a url "), "not a url");
    }

    #[test]
    fn test_downloaded_title() {
        let file = DownloadedFile {
            file_name: "My Clip.mp4".into(),
            bytes: Bytes::new(),
        };
        assert_eq!(file.title(), "My Clip");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0.0), "0:00");
        assert_eq!(format_minutes(65.9), "1:05");
        assert_eq!(format_minutes(600.0), "10:00");
    }
}
