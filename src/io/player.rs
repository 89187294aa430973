// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! mpv-backed playback surface.
//!
//! Each loaded asset gets its own mpv process, a temporary copy of the video
//! and a JSON IPC socket. A reader thread turns mpv's property-change
//! messages into [`PlaybackEvent`]s. Events are tagged with the load
//! generation so nothing from a released player leaks into the next one.

use crate::models::asset::Asset;
use crate::session::playback::{PlaybackEvent, PlaybackSurface};
use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};

#[cfg(unix)]
use std::os::unix::net::UnixStream;

const OBSERVE_TIME: u64 = 1;
const OBSERVE_DURATION: u64 = 2;
const OBSERVE_EOF: u64 = 3;

/// Longest the UI waits for a fresh mpv to open its IPC socket.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(1500);
const CONNECT_POLL: Duration = Duration::from_millis(20);

/// Playback through an external mpv window.
pub struct MpvSurface {
    binary: String,
    generation: u64,
    handle: Option<MpvHandle>,
    tx_events: Sender<(u64, PlaybackEvent)>,
    rx_events: Receiver<(u64, PlaybackEvent)>,
}

struct MpvHandle {
    child: Child,
    #[cfg(unix)]
    socket: UnixStream,
    // Held so the files outlive the player.
    _media: NamedTempFile,
    _socket_dir: TempDir,
}

impl MpvSurface {
    pub fn new(binary: impl Into<String>) -> Self {
        let (tx_events, rx_events) = unbounded();
        Self {
            binary: binary.into(),
            generation: 0,
            handle: None,
            tx_events,
            rx_events,
        }
    }

    fn send(&mut self, command: Value) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };
        if let Err(e) = handle.send(&command) {
            log::warn!("mpv command failed: {:#}", e);
        }
    }
}

impl PlaybackSurface for MpvSurface {
    fn load(&mut self, asset: &Asset) -> Result<()> {
        self.release();
        self.generation += 1;

        let mut media = tempfile::Builder::new()
            .prefix("clipsmith-")
            .suffix(".mp4")
            .tempfile()
            .context("Failed to create temporary video file")?;
        media
            .write_all(&asset.bytes)
            .and_then(|_| media.flush())
            .context("Failed to write temporary video file")?;

        let socket_dir = tempfile::tempdir().context("Failed to create mpv socket directory")?;
        let socket_path = socket_dir.path().join("mpv.sock");

        let mut child = Command::new(&self.binary)
            .args(mpv_args(&socket_path, &asset.title))
            .arg(media.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn {}. Install mpv for previews.", self.binary))?;

        let handle = match connect(&mut child, &socket_path, CONNECT_TIMEOUT) {
            Ok(socket) => {
                spawn_reader(&socket, self.generation, self.tx_events.clone())?;
                MpvHandle {
                    child,
                    #[cfg(unix)]
                    socket,
                    _media: media,
                    _socket_dir: socket_dir,
                }
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };
        self.handle = Some(handle);

        for (id, property) in [
            (OBSERVE_TIME, "time-pos"),
            (OBSERVE_DURATION, "duration"),
            (OBSERVE_EOF, "eof-reached"),
        ] {
            self.send(json!({ "command": ["observe_property", id, property] }));
        }
        log::info!("mpv started for '{}' (generation {})", asset.title, self.generation);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            let _ = handle.send(&json!({ "command": ["quit"] }));
            let _ = handle.child.kill();
            let _ = handle.child.wait();
            log::debug!("mpv generation {} released", self.generation);
        }
    }

    fn seek(&mut self, seconds: f64) {
        self.send(json!({ "command": ["seek", seconds, "absolute+exact"] }));
    }

    fn play(&mut self) {
        self.send(json!({ "command": ["set_property", "pause", false] }));
    }

    fn pause(&mut self) {
        self.send(json!({ "command": ["set_property", "pause", true] }));
    }

    fn poll_events(&mut self) -> Vec<PlaybackEvent> {
        let current = self.generation;
        self.rx_events
            .try_iter()
            .filter(|(generation, _)| *generation == current)
            .map(|(_, event)| event)
            .collect()
    }
}

impl Drop for MpvSurface {
    fn drop(&mut self) {
        self.release();
    }
}

impl MpvHandle {
    #[cfg(unix)]
    fn send(&mut self, command: &Value) -> Result<()> {
        log::debug!("mpv <- {}", command);
        let mut line = serde_json::to_string(command).context("Failed to serialize mpv command")?;
        line.push('\n');
        self.socket
            .write_all(line.as_bytes())
            .context("Failed to write to mpv socket")
    }

    #[cfg(not(unix))]
    fn send(&mut self, _command: &Value) -> Result<()> {
        anyhow::bail!("mpv IPC is not supported on this platform")
    }
}

fn mpv_args(socket: &Path, title: &str) -> Vec<String> {
    vec![
        format!("--input-ipc-server={}", socket.display()),
        "--pause".to_string(),
        "--keep-open=yes".to_string(),
        "--force-window=yes".to_string(),
        "--no-terminal".to_string(),
        format!("--title={title}"),
    ]
}

#[cfg(unix)]
fn connect(child: &mut Child, socket_path: &Path, timeout: Duration) -> Result<UnixStream> {
    use std::time::Instant;

    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(stream) = UnixStream::connect(socket_path) {
            return Ok(stream);
        }
        if let Some(status) = child.try_wait().context("Failed to poll mpv")? {
            anyhow::bail!("mpv exited before opening its IPC socket ({status})");
        }
        if Instant::now() >= deadline {
            anyhow::bail!(
                "Timed out waiting for mpv socket at {}",
                socket_path.display()
            );
        }
        std::thread::sleep(CONNECT_POLL);
    }
}

#[cfg(not(unix))]
fn connect(_child: &mut Child, _socket_path: &Path, _timeout: Duration) -> Result<()> {
    anyhow::bail!("mpv IPC is not supported on this platform")
}

#[cfg(unix)]
fn spawn_reader(
    socket: &UnixStream,
    generation: u64,
    tx: Sender<(u64, PlaybackEvent)>,
) -> Result<()> {
    use std::io::{BufRead, BufReader};

    let stream = socket.try_clone().context("Failed to clone mpv socket")?;
    std::thread::Builder::new()
        .name(format!("mpv-reader-{generation}"))
        .spawn(move || {
            for line in BufReader::new(stream).lines() {
                let Ok(line) = line else { break };
                if let Some(event) = parse_event(&line) {
                    if tx.send((generation, event)).is_err() {
                        break;
                    }
                }
            }
        })
        .context("Failed to spawn mpv reader thread")?;
    Ok(())
}

#[cfg(not(unix))]
fn spawn_reader(_socket: &(), _generation: u64, _tx: Sender<(u64, PlaybackEvent)>) -> Result<()> {
    Ok(())
}

/// Translate one line of mpv IPC output.
fn parse_event(line: &str) -> Option<PlaybackEvent> {
    let value: Value = serde_json::from_str(line).ok()?;
    match value.get("event")?.as_str()? {
        "property-change" => {
            let data = value.get("data")?;
            match value.get("name")?.as_str()? {
                "time-pos" => data.as_f64().map(PlaybackEvent::TimeUpdate),
                "duration" => data
                    .as_f64()
                    .filter(|d| *d > 0.0)
                    .map(PlaybackEvent::DurationKnown),
                "eof-reached" => data
                    .as_bool()
                    .filter(|eof| *eof)
                    .map(|_| PlaybackEvent::Ended),
                _ => None,
            }
        }
        "end-file" => Some(PlaybackEvent::Ended),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_property_changes() {
        assert_eq!(
            parse_event(r#"{"event":"property-change","id":1,"name":"time-pos","data":12.5}"#),
            Some(PlaybackEvent::TimeUpdate(12.5))
        );
        assert_eq!(
            parse_event(r#"{"event":"property-change","id":2,"name":"duration","data":93.04}"#),
            Some(PlaybackEvent::DurationKnown(93.04))
        );
        assert_eq!(
            parse_event(r#"{"event":"property-change","id":3,"name":"eof-reached","data":true}"#),
            Some(PlaybackEvent::Ended)
        );
    }

    #[test]
    fn test_parse_ignores_noise() {
        assert_eq!(
            parse_event(r#"{"event":"property-change","id":2,"name":"duration"}"#),
            None
        );
        assert_eq!(
            parse_event(r#"{"event":"property-change","id":2,"name":"duration","data":null}"#),
            None
        );
        assert_eq!(
            parse_event(r#"{"event":"property-change","id":3,"name":"eof-reached","data":false}"#),
            None
        );
        assert_eq!(parse_event(r#"{"data":null,"error":"success","request_id":0}"#), None);
        assert_eq!(parse_event("not json"), None);
    }

    #[test]
    fn test_mpv_args() {
        let args = mpv_args(Path::new("/tmp/x/mpv.sock"), "My Clip");
        assert_eq!(args[0], "--input-ipc-server=/tmp/x/mpv.sock");
        assert!(args.contains(&"--pause".to_string()));
        assert_eq!(args.last().unwrap(), "--title=My Clip");
    }

    #[cfg(unix)]
    #[test]
    fn test_connect_gives_up_at_deadline() {
        use std::time::Instant;

        let dir = tempfile::tempdir().unwrap();
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();

        let started = Instant::now();
        let err = connect(&mut child, &dir.path().join("mpv.sock"), Duration::from_millis(100))
            .unwrap_err();
        let waited = started.elapsed();
        let _ = child.kill();
        let _ = child.wait();

        assert!(err.to_string().contains("Timed out"), "{err}");
        assert!(waited < Duration::from_secs(1), "waited {waited:?}");
    }

    #[cfg(unix)]
    #[test]
    fn test_connect_stops_when_player_exits() {
        let dir = tempfile::tempdir().unwrap();
        let mut child = Command::new("true").spawn().unwrap();
        let _ = child.wait();

        let err = connect(&mut child, &dir.path().join("mpv.sock"), CONNECT_TIMEOUT).unwrap_err();
        assert!(err.to_string().contains("exited"), "{err}");
    }

    #[test]
    fn test_missing_binary_fails_cleanly() {
        let mut surface = MpvSurface::new("/nonexistent/clipsmith-mpv");
        let err = surface
            .load(&Asset::new(&b"video"[..], "clip"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("Failed to spawn"));
        assert!(surface.poll_events().is_empty());
        surface.release();
    }
}
