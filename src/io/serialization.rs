// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Caption project and subtitle files.
//!
//! Projects are written as YAML or JSON depending on the file extension.
//! Captions can also be exported to and imported from SubRip files.

use crate::io::srt;
use crate::models::caption::{Caption, CaptionCollection};
use crate::models::project::CaptionProject;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Export a project to YAML format.
pub fn export_yaml(project: &CaptionProject, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(project).context("serializing project to YAML")?;
    std::fs::write(path, yaml).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Export a project to JSON format.
pub fn export_json(project: &CaptionProject, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(project).context("serializing project to JSON")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Import a project from YAML format.
pub fn import_yaml(path: &Path) -> Result<CaptionProject> {
    let yaml = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&yaml).with_context(|| format!("parsing YAML project {}", path.display()))
}

/// Import a project from JSON format.
pub fn import_json(path: &Path) -> Result<CaptionProject> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing JSON project {}", path.display()))
}

/// Save a project, picking the format from the extension.
pub fn export_project(project: &CaptionProject, path: &Path) -> Result<()> {
    match extension(path).as_deref() {
        Some("yaml") | Some("yml") => export_yaml(project, path),
        Some("json") => export_json(project, path),
        other => bail!("Unsupported project file extension: {:?}", other),
    }
}

/// Load a project, picking the format from the extension.
pub fn import_project(path: &Path) -> Result<CaptionProject> {
    match extension(path).as_deref() {
        Some("yaml") | Some("yml") => import_yaml(path),
        Some("json") => import_json(path),
        other => bail!("Unsupported project file extension: {:?}", other),
    }
}

/// Write captions as a SubRip file.
pub fn export_srt(captions: &CaptionCollection, path: &Path) -> Result<()> {
    std::fs::write(path, srt::encode(captions))
        .with_context(|| format!("writing subtitles to {}", path.display()))
}

/// Read cues from a SubRip file.
pub fn import_srt(path: &Path) -> Result<Vec<Caption>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading subtitles from {}", path.display()))?;
    srt::parse(&text).with_context(|| format!("parsing subtitles {}", path.display()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::caption::DraftCaption;
    use tempfile::tempdir;

    fn sample() -> CaptionCollection {
        let mut captions = CaptionCollection::new();
        for (text, start, end) in [("Hello", 0.5, 2.0), ("World", 2.5, 4.25)] {
            captions
                .add(&DraftCaption {
                    text: text.into(),
                    start,
                    end,
                })
                .unwrap();
        }
        captions
    }

    #[test]
    fn test_project_in_both_formats() {
        let dir = tempdir().unwrap();
        let project = CaptionProject::new("clip", &sample());

        for name in ["captions.yaml", "captions.YML", "captions.json"] {
            let path = dir.path().join(name);
            export_project(&project, &path).unwrap();
            assert_eq!(import_project(&path).unwrap(), project, "{name}");
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let project = CaptionProject::new("clip", &sample());
        assert!(export_project(&project, &dir.path().join("captions.txt")).is_err());
        assert!(import_project(&dir.path().join("captions")).is_err());
    }

    #[test]
    fn test_project_without_captions_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bare.json");
        std::fs::write(&path, r#"{"title": "bare"}"#).unwrap();
        let project = import_project(&path).unwrap();
        assert_eq!(project.title, "bare");
        assert!(project.captions.is_empty());
    }

    #[test]
    fn test_srt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("captions.srt");
        export_srt(&sample(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("1\n00:00:00,500 --> 00:00:02,000\nHello\n\n"));
        assert_eq!(import_srt(&path).unwrap(), sample().as_slice());
    }
}
