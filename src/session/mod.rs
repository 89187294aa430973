// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video editing session.
//!
//! One [`EditSession`] owns everything about the video being edited: the
//! current asset, the pristine original, the trim selection, the captions
//! and the draft caption. It is the only writer of that state.
//!
//! Transforms are split in two halves so the caller decides where the
//! network call runs: `begin_*` validates and snapshots a [`TransformJob`],
//! and [`EditSession::complete`] absorbs the gateway's outcome. Between the
//! two the previous asset stays authoritative and further transforms are
//! rejected as busy.

pub mod playback;

use crate::error::{EditError, ValidationError};
use crate::gateway::{GatewayError, TransformInput, TransformOp};
use crate::io::srt;
use crate::models::asset::{Asset, ExportFile};
use crate::models::caption::{Caption, CaptionCollection, DraftCaption};
use crate::models::range::TimeRange;
use bytes::Bytes;
use playback::{PlaybackEvent, PlaybackSurface, PreviewStop};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default length of a quick-marked caption, in seconds.
pub const DEFAULT_QUICK_CAPTION_SECS: f64 = 3.0;

// Ids are unique per process so results of a closed session never match the
// jobs or downloads of a later one.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// The three remote transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    Trim,
    Caption,
    Combined,
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No asset loaded.
    Idle,
    /// An asset is loaded but the playback surface has not reported its
    /// duration yet.
    FetchingInfo,
    /// Asset present, duration known, range initialized.
    Ready,
    TrimPending,
    CaptionPending,
    CombinedPending,
}

impl SessionState {
    fn pending(kind: TransformKind) -> Self {
        match kind {
            TransformKind::Trim => Self::TrimPending,
            TransformKind::Caption => Self::CaptionPending,
            TransformKind::Combined => Self::CombinedPending,
        }
    }

    /// The transform in flight, if any.
    pub fn pending_kind(&self) -> Option<TransformKind> {
        match self {
            Self::TrimPending => Some(TransformKind::Trim),
            Self::CaptionPending => Some(TransformKind::Caption),
            Self::CombinedPending => Some(TransformKind::Combined),
            _ => None,
        }
    }

    /// True while new transforms would be rejected.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::FetchingInfo) || self.pending_kind().is_some()
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Idle => "no video loaded",
            Self::FetchingInfo => "loading video",
            Self::Ready => "ready",
            Self::TrimPending => "trimming video",
            Self::CaptionPending => "adding captions",
            Self::CombinedPending => "trimming and adding captions",
        };
        f.write_str(text)
    }
}

/// A validated transform request, ready to hand to a gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformJob {
    pub id: u64,
    pub kind: TransformKind,
    pub input: TransformInput,
}

/// What a successful transform produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Completed {
    /// The trimmed video replaced the editing asset.
    Trimmed,
    /// The captioned video replaced the editing asset and should be saved.
    Captioned(ExportFile),
    /// Trim and captions applied to the original; the editing asset is untouched.
    Combined(ExportFile),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Busy,
    Error,
}

/// Latest user-visible message.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            text: text.into(),
        }
    }
}

impl From<&EditError> for StatusMessage {
    fn from(err: &EditError) -> Self {
        let level = if err.is_busy() {
            StatusLevel::Busy
        } else {
            StatusLevel::Error
        };
        Self {
            level,
            text: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: u64,
    kind: TransformKind,
    /// Expected duration of the result, used if the surface cannot report one.
    duration_hint: Option<f64>,
}

/// The editing session.
pub struct EditSession<S: PlaybackSurface> {
    id: u64,
    surface: S,
    state: SessionState,
    original: Option<Asset>,
    current: Option<Asset>,
    range: TimeRange,
    captions: CaptionCollection,
    draft: DraftCaption,
    editing: Option<usize>,
    playhead: f64,
    preview_stop: Option<PreviewStop>,
    in_flight: Option<InFlight>,
    progress: f32,
    status: Option<StatusMessage>,
    quick_caption_secs: f64,
}

impl<S: PlaybackSurface> EditSession<S> {
    /// Create an empty session driving `surface`.
    pub fn new(surface: S) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            surface,
            state: SessionState::Idle,
            original: None,
            current: None,
            range: TimeRange::default(),
            captions: CaptionCollection::new(),
            draft: DraftCaption::default(),
            editing: None,
            playhead: 0.0,
            preview_stop: None,
            in_flight: None,
            progress: 0.0,
            status: None,
            quick_caption_secs: DEFAULT_QUICK_CAPTION_SECS,
        }
    }

    /// Set the length used by [`EditSession::quick_mark`].
    pub fn with_quick_caption_secs(mut self, secs: f64) -> Self {
        self.quick_caption_secs = secs.max(0.0);
        self
    }

    /// Process-unique id, used to route background results to this session.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The asset being edited.
    pub fn asset(&self) -> Option<&Asset> {
        self.current.as_ref()
    }

    pub fn duration(&self) -> Option<f64> {
        self.current.as_ref().and_then(|asset| asset.duration)
    }

    pub fn range(&self) -> &TimeRange {
        &self.range
    }

    pub fn captions(&self) -> &CaptionCollection {
        &self.captions
    }

    pub fn draft(&self) -> &DraftCaption {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut DraftCaption {
        &mut self.draft
    }

    /// The draft for in-place editing alongside the committed captions.
    pub fn caption_editor(&mut self) -> (&mut DraftCaption, &CaptionCollection) {
        (&mut self.draft, &self.captions)
    }

    /// Index of the caption loaded into the draft for editing.
    pub fn editing_index(&self) -> Option<usize> {
        self.editing
    }

    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    /// Upload progress of the transform in flight, `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The first asset is being downloaded.
    pub fn begin_fetch(&mut self) -> Result<(), EditError> {
        match self.state {
            SessionState::Idle => {
                self.state = SessionState::FetchingInfo;
                self.status = Some(StatusMessage {
                    level: StatusLevel::Busy,
                    text: "Downloading video...".to_string(),
                });
                Ok(())
            }
            SessionState::Ready => self.fail(EditError::AlreadyLoaded),
            state => self.fail(EditError::Busy { state }),
        }
    }

    /// The download started by [`EditSession::begin_fetch`] failed.
    pub fn fail_fetch(&mut self, err: GatewayError) {
        if self.state == SessionState::FetchingInfo && self.current.is_none() {
            log::error!("Fetching video failed: {}", err);
            self.state = SessionState::Idle;
            self.status = Some(StatusMessage::from(&EditError::Gateway(err)));
        }
    }

    /// Load the first asset of the session. `duration_hint` is adopted only
    /// if the playback surface cannot be started.
    pub fn load_asset(&mut self, asset: Asset, duration_hint: Option<f64>) -> Result<(), EditError> {
        let fetching = matches!(self.state, SessionState::Idle | SessionState::FetchingInfo);
        if !fetching || self.current.is_some() {
            return self.fail(EditError::AlreadyLoaded);
        }
        log::info!("Loaded '{}' ({} bytes)", asset.title, asset.len());
        self.original = Some(asset.clone());
        if let Err(err) = self.install(asset, duration_hint) {
            self.original = None;
            return Err(err);
        }
        Ok(())
    }

    // Swap in a new editing asset. The old playback handle goes first. If the
    // surface cannot play it and no duration is known, the asset is dropped
    // and the session returns to Idle.
    fn install(&mut self, asset: Asset, duration_hint: Option<f64>) -> Result<(), EditError> {
        if self.current.is_some() {
            self.surface.release();
        }
        self.preview_stop = None;
        self.playhead = 0.0;
        self.state = SessionState::FetchingInfo;

        let loaded = self.surface.load(&asset);
        self.current = Some(asset);

        if let Err(e) = loaded {
            log::error!("Failed to start playback: {:#}", e);
            match duration_hint {
                Some(hint) => {
                    log::warn!("Using estimated duration {:.2}s", hint);
                    self.on_duration_known(hint);
                }
                None => {
                    self.current = None;
                    self.range = TimeRange::default();
                    self.state = SessionState::Idle;
                    return self.fail(EditError::Playback(format!("{e:#}")));
                }
            }
        }
        Ok(())
    }

    /// Drain the playback surface and react to its events.
    pub fn pump(&mut self) {
        for event in self.surface.poll_events() {
            self.handle_event(event);
        }
    }

    pub fn handle_event(&mut self, event: PlaybackEvent) {
        match event {
            PlaybackEvent::TimeUpdate(t) => self.on_time_update(t),
            PlaybackEvent::DurationKnown(d) => self.on_duration_known(d),
            PlaybackEvent::Ended => self.preview_stop = None,
        }
    }

    /// The playback surface reported the loaded asset's duration.
    pub fn on_duration_known(&mut self, duration: f64) {
        let Some(asset) = self.current.as_mut() else {
            return;
        };
        if asset.duration.is_some() && self.state != SessionState::FetchingInfo {
            return;
        }
        asset.duration = Some(duration);
        self.range.set_duration(duration);
        if self.state == SessionState::FetchingInfo {
            self.state = SessionState::Ready;
            log::info!("'{}' ready, duration {:.2}s", asset.title, duration);
        }
    }

    /// The playhead moved. Pauses once a running preview reaches its bound.
    pub fn on_time_update(&mut self, time: f64) {
        self.playhead = time;
        if let Some(stop) = self.preview_stop {
            if stop.reached(time) {
                self.surface.pause();
                self.preview_stop = None;
            }
        }
    }

    // ---- trim selection -------------------------------------------------

    pub fn set_range_start(&mut self, v: f64) {
        self.range.set_start(v);
    }

    pub fn set_range_end(&mut self, v: f64) {
        self.range.set_end(v);
    }

    pub fn reset_range(&mut self) {
        self.range.reset();
    }

    // ---- preview ----------------------------------------------------------

    /// Play `[start, end]` and stop at `end`.
    pub fn preview_range(&mut self, start: f64, end: f64) {
        if self.current.is_none() {
            return;
        }
        self.surface.seek(start);
        self.surface.play();
        self.playhead = start;
        self.preview_stop = Some(PreviewStop { at: end });
    }

    /// Play the current selection.
    pub fn preview_selection(&mut self) {
        let (start, end) = (self.range.start(), self.range.end());
        self.preview_range(start, end);
    }

    /// Play from the selection start to the end of the video.
    pub fn preview_from_start_bound(&mut self) {
        let (start, end) = (self.range.start(), self.range.duration());
        self.preview_range(start, end);
    }

    /// Play from the beginning of the video up to the selection end.
    pub fn preview_to_end_bound(&mut self) {
        let end = self.range.end();
        self.preview_range(0.0, end);
    }

    /// Play the caption at `index` over its own time span.
    pub fn preview_caption(&mut self, index: usize) -> Result<(), EditError> {
        let Some(caption) = self.captions.get(index) else {
            let len = self.captions.len();
            return self.fail(EditError::Index { index, len });
        };
        let (start, end) = (caption.start, caption.end);
        self.preview_range(start, end);
        Ok(())
    }

    /// Caption showing at the playhead, for highlighting.
    pub fn active_caption(&self) -> Option<(usize, &Caption)> {
        self.captions.find_active(self.playhead)
    }

    // ---- captions ---------------------------------------------------------

    pub fn mark_draft_start(&mut self) {
        self.draft.start = self.playhead;
    }

    pub fn mark_draft_end(&mut self) {
        self.draft.end = self.playhead;
    }

    /// Start the draft at the playhead and end it a few seconds later.
    pub fn quick_mark(&mut self) {
        let mut end = self.playhead + self.quick_caption_secs;
        if let Some(duration) = self.duration() {
            end = end.min(duration);
        }
        self.draft.start = self.playhead;
        self.draft.end = end;
    }

    /// Add the draft, or write it back over the caption being edited.
    pub fn commit_draft(&mut self) -> Result<(), EditError> {
        let result = match self.editing {
            Some(index) => self.captions.update(index, &self.draft),
            None => self.captions.add(&self.draft).map_err(EditError::from),
        };
        if let Err(err) = result {
            return self.fail(err);
        }
        log::info!("Captions: {}", self.captions.len());
        self.editing = None;
        self.draft = DraftCaption::default();
        Ok(())
    }

    /// Load the caption at `index` into the draft for editing.
    pub fn edit_caption(&mut self, index: usize) -> Result<(), EditError> {
        let Some(caption) = self.captions.get(index) else {
            let len = self.captions.len();
            return self.fail(EditError::Index { index, len });
        };
        self.draft = DraftCaption::from(caption);
        self.editing = Some(index);
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
        self.draft = DraftCaption::default();
    }

    pub fn delete_caption(&mut self, index: usize) -> Result<Caption, EditError> {
        let removed = match self.captions.remove(index) {
            Ok(caption) => caption,
            Err(err) => return self.fail(err),
        };
        match self.editing {
            Some(editing) if editing == index => self.cancel_edit(),
            Some(editing) if editing > index => self.editing = Some(editing - 1),
            _ => {}
        }
        Ok(removed)
    }

    /// Add already-timed captions (e.g. from an SRT file). Invalid entries are
    /// skipped; returns how many were added.
    pub fn import_captions(&mut self, captions: &[Caption]) -> usize {
        let mut added = 0;
        for caption in captions {
            match self.captions.add(&DraftCaption::from(caption)) {
                Ok(()) => added += 1,
                Err(e) => log::warn!("Skipping caption '{}': {}", caption.text, e),
            }
        }
        added
    }

    // ---- transforms -------------------------------------------------------

    /// Validate the selection and start a trim of the current asset.
    pub fn begin_trim(&mut self) -> Result<TransformJob, EditError> {
        let asset = self.submittable()?.clone();
        let (start, end) = (self.range.start(), self.range.end());
        if let Err(err) = self.check_selection() {
            return self.fail(err.into());
        }
        let op = TransformOp::Trim { start, end };
        Ok(self.start_job(TransformKind::Trim, &asset, op, Some(end - start)))
    }

    /// Start burning the captions into the current asset.
    pub fn begin_caption(&mut self) -> Result<TransformJob, EditError> {
        let asset = self.submittable()?.clone();
        if self.captions.is_empty() {
            return self.fail(ValidationError::NoCaptions.into());
        }
        let op = TransformOp::Caption {
            subtitle_text: srt::encode(&self.captions),
        };
        let hint = asset.duration;
        Ok(self.start_job(TransformKind::Caption, &asset, op, hint))
    }

    /// Trim and caption the original asset in one remote step. The result is
    /// an export only; the editing asset is left alone.
    pub fn begin_combined(&mut self) -> Result<TransformJob, EditError> {
        self.submittable()?;
        if let Err(err) = self.check_selection() {
            return self.fail(err.into());
        }
        if self.captions.is_empty() {
            return self.fail(ValidationError::NoCaptions.into());
        }
        let Some(original) = self.original.clone() else {
            return self.fail(ValidationError::NotReady.into());
        };
        let op = TransformOp::Combined {
            start: self.range.start(),
            end: self.range.end(),
            subtitle_text: srt::encode(&self.captions),
        };
        Ok(self.start_job(TransformKind::Combined, &original, op, None))
    }

    /// Record upload progress for the job in flight.
    pub fn report_progress(&mut self, job_id: u64, fraction: f32) {
        if self.in_flight.is_some_and(|flight| flight.id == job_id) {
            self.progress = fraction.clamp(0.0, 1.0);
            log::debug!("Job {} upload {:.0}%", job_id, self.progress * 100.0);
        }
    }

    /// Absorb the gateway's answer for `job_id`.
    ///
    /// On failure nothing but the state and status message changes: the
    /// asset and captions are exactly what they were before submission.
    pub fn complete(
        &mut self,
        job_id: u64,
        outcome: Result<Bytes, GatewayError>,
    ) -> Result<Completed, EditError> {
        let flight = match self.in_flight {
            Some(flight) if flight.id == job_id => flight,
            _ => {
                log::warn!("Ignoring result of unknown job {}", job_id);
                return Err(EditError::UnknownJob(job_id));
            }
        };
        self.in_flight = None;
        self.progress = 0.0;
        self.state = SessionState::Ready;

        let bytes = match outcome {
            Ok(bytes) => bytes,
            Err(err) => {
                log::error!("{:?} failed: {}", flight.kind, err);
                return self.fail(err.into());
            }
        };
        log::info!("{:?} finished ({} bytes)", flight.kind, bytes.len());

        // Without a player the previous duration is the best estimate.
        let hint = flight.duration_hint.or(self.duration());
        match flight.kind {
            TransformKind::Trim => {
                let title = self.current_title();
                self.install(Asset::new(bytes, title), hint)?;
                self.status = Some(StatusMessage::info("Trimmed video loaded"));
                Ok(Completed::Trimmed)
            }
            TransformKind::Caption => {
                let title = self.current_title();
                let export = ExportFile::with_prefix("captioned_", &title, bytes.clone());
                self.install(Asset::new(bytes, title), hint)?;
                self.status = Some(StatusMessage::info("Captions added"));
                Ok(Completed::Captioned(export))
            }
            TransformKind::Combined => {
                let title = self
                    .original
                    .as_ref()
                    .map(|asset| asset.title.clone())
                    .unwrap_or_default();
                self.status = Some(StatusMessage::info("Trimmed and captioned video ready"));
                Ok(Completed::Combined(ExportFile::with_prefix(
                    "edited_", &title, bytes,
                )))
            }
        }
    }

    /// The current asset as a file to save.
    pub fn export_current(&self) -> Option<ExportFile> {
        self.current.as_ref().map(|asset| ExportFile {
            file_name: asset.file_name(),
            bytes: asset.bytes.clone(),
        })
    }

    fn current_title(&self) -> String {
        self.current
            .as_ref()
            .map(|asset| asset.title.clone())
            .unwrap_or_default()
    }

    fn check_selection(&self) -> Result<(), ValidationError> {
        if self.range.is_valid_selection() {
            Ok(())
        } else {
            Err(ValidationError::StartNotBeforeEnd {
                start: self.range.start(),
                end: self.range.end(),
            })
        }
    }

    // Gate for every transform: busy first so a rejection never touches the
    // job already in flight.
    fn submittable(&mut self) -> Result<&Asset, EditError> {
        match self.state {
            SessionState::Ready => {}
            SessionState::Idle => return self.fail(ValidationError::NotReady.into()),
            state => {
                log::warn!("Rejected transform while {}", state);
                return self.fail(EditError::Busy { state });
            }
        }
        match self.current.as_ref() {
            Some(asset) => Ok(asset),
            None => Err(ValidationError::NotReady.into()),
        }
    }

    fn start_job(
        &mut self,
        kind: TransformKind,
        asset: &Asset,
        op: TransformOp,
        duration_hint: Option<f64>,
    ) -> TransformJob {
        let id = NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed);
        self.in_flight = Some(InFlight {
            id,
            kind,
            duration_hint,
        });
        self.state = SessionState::pending(kind);
        self.progress = 0.0;
        self.status = Some(StatusMessage {
            level: StatusLevel::Busy,
            text: format!("{}...", capitalize(&self.state.to_string())),
        });
        log::info!("Job {} submitted: {:?}", id, kind);

        TransformJob {
            id,
            kind,
            input: TransformInput {
                video: asset.bytes.clone(),
                title: asset.title.clone(),
                op,
            },
        }
    }

    fn fail<T>(&mut self, err: EditError) -> Result<T, EditError> {
        self.status = Some(StatusMessage::from(&err));
        Err(err)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
