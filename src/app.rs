// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app has two screens. The source screen looks a video up on the
//! server and downloads it; the editor screen owns an [`EditSession`] and
//! routes panel actions into it. All network traffic goes through the
//! [`GatewayWorker`]; its events are drained at the top of every frame.

use crate::config::AppConfig;
use crate::gateway::{GatewayError, HttpGateway};
use crate::io::{media, player::MpvSurface, serialization};
use crate::models::asset::{Asset, ExportFile};
use crate::models::project::CaptionProject;
use crate::models::source::DownloadedFile;
use crate::session::playback::PlaybackSurface;
use crate::session::{Completed, EditSession, StatusLevel};
use crate::ui::{properties, source, timeline, toolbar};
use crate::worker::{Command, DownloadPurpose, GatewayWorker, Notify, WorkerEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

type Session = EditSession<MpvSurface>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Source,
    Editor,
}

/// Main application state.
pub struct ClipsmithApp {
    config: AppConfig,

    /// Background gateway worker; `None` if it could not be started
    worker: Option<GatewayWorker>,

    screen: Screen,

    source: source::SourceForm,

    /// Editing session, alive while the editor screen is shown
    session: Option<Session>,

    /// App-level message (saved files, file dialog errors)
    notice: Option<(StatusLevel, String)>,
}

impl ClipsmithApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let ctx = cc.egui_ctx.clone();
        let notify: Notify = Arc::new(move || ctx.request_repaint());

        let worker = HttpGateway::new(&config.api_url, config.request_timeout())
            .map_err(anyhow::Error::from)
            .and_then(|gateway| GatewayWorker::start(Arc::new(gateway), notify));
        let (worker, notice) = match worker {
            Ok(worker) => (Some(worker), None),
            Err(e) => {
                log::error!("Failed to start gateway worker: {:#}", e);
                (None, Some((StatusLevel::Error, format!("Offline: {e:#}"))))
            }
        };

        log::info!("Using API at {}", config.api_url);
        Self {
            config,
            worker,
            screen: Screen::Source,
            source: source::SourceForm::default(),
            session: None,
            notice,
        }
    }

    fn submit(&mut self, command: Command) -> bool {
        match &self.worker {
            Some(worker) => {
                worker.submit(command);
                true
            }
            None => {
                self.notice = Some((StatusLevel::Error, "The server connection is unavailable".into()));
                false
            }
        }
    }

    fn new_session(&self) -> Session {
        EditSession::new(MpvSurface::new(self.config.mpv_binary.clone()))
            .with_quick_caption_secs(self.config.quick_caption_secs)
    }

    /// Drop the editor and go back to the source screen.
    fn close_session(&mut self) {
        if self.session.take().is_some() {
            log::info!("Editing session closed");
        }
        self.screen = Screen::Source;
    }

    fn handle_worker_events(&mut self, ctx: &egui::Context) {
        let events = match &self.worker {
            Some(worker) => worker.drain(),
            None => return,
        };

        for event in events {
            match event {
                WorkerEvent::Info(result) => {
                    self.source.busy = None;
                    match result {
                        Ok(info) => {
                            log::info!("Info for '{}': {} formats", info.title, info.formats.len());
                            if let Some(url) = info.thumbnail.clone() {
                                self.submit(Command::Thumbnail(url));
                            }
                            self.source.apply_info(info);
                        }
                        Err(e) => self.source.error = Some(e.to_string()),
                    }
                }
                WorkerEvent::Downloaded(purpose, result) => self.on_downloaded(purpose, result),
                WorkerEvent::Thumbnail(Ok(bytes)) => match media::decode_image(&bytes) {
                    Ok(img) => {
                        let size = [img.width as usize, img.height as usize];
                        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &img.pixels);
                        self.source.thumbnail =
                            Some(ctx.load_texture("thumbnail", color_image, egui::TextureOptions::LINEAR));
                    }
                    Err(e) => log::warn!("Thumbnail not shown: {:#}", e),
                },
                WorkerEvent::Thumbnail(Err(_)) => {}
                WorkerEvent::Progress { job_id, fraction } => {
                    if let Some(session) = self.session.as_mut() {
                        session.report_progress(job_id, fraction);
                    }
                }
                WorkerEvent::Transformed { job_id, result } => {
                    let Some(session) = self.session.as_mut() else {
                        log::warn!("Dropping result of job {} after the session closed", job_id);
                        continue;
                    };
                    match session.complete(job_id, result) {
                        Ok(Completed::Trimmed) => {}
                        Ok(Completed::Captioned(export)) | Ok(Completed::Combined(export)) => {
                            self.save_export_dialog(&export);
                        }
                        // Already reflected in the session status.
                        Err(_) => {}
                    }
                }
            }
        }
    }

    fn on_downloaded(&mut self, purpose: DownloadPurpose, result: Result<DownloadedFile, GatewayError>) {
        match purpose {
            DownloadPurpose::Save => {
                self.source.busy = None;
                match result {
                    Ok(file) => {
                        let export = ExportFile {
                            file_name: media::sanitize_file_name(&file.file_name),
                            bytes: file.bytes,
                        };
                        self.save_export_dialog(&export);
                    }
                    Err(e) => self.source.error = Some(e.to_string()),
                }
            }
            DownloadPurpose::Edit(session_id) => {
                let hint = self
                    .source
                    .info
                    .as_ref()
                    .map(|info| info.duration)
                    .filter(|d| *d > 0.0);
                match apply_edit_download(self.session.as_mut(), session_id, result, hint) {
                    EditDownload::Loaded | EditDownload::Stale => {}
                    EditDownload::Failed(message) => {
                        self.source.error = Some(message);
                        self.close_session();
                    }
                }
            }
        }
    }

    fn handle_source_action(&mut self, action: source::SourceAction) {
        match action {
            source::SourceAction::None => {}
            source::SourceAction::FetchInfo(url) => {
                self.source.error = None;
                self.source.info = None;
                if self.submit(Command::FetchInfo(url)) {
                    self.source.busy = Some("Fetching video info...".into());
                }
            }
            source::SourceAction::Save(request) => {
                self.source.error = None;
                if self.submit(Command::Download(request, DownloadPurpose::Save)) {
                    self.source.busy = Some("Downloading...".into());
                }
            }
            source::SourceAction::Edit(request) => {
                self.source.error = None;
                let mut session = self.new_session();
                let purpose = DownloadPurpose::Edit(session.id());
                if session.begin_fetch().is_ok() && self.submit(Command::Download(request, purpose)) {
                    self.session = Some(session);
                    self.screen = Screen::Editor;
                }
            }
        }
    }

    /// Open a local video file in a new session.
    fn open_video_file(&mut self, path: PathBuf) {
        match media::read_video(&path) {
            Ok(asset) => {
                let mut session = self.new_session();
                if let Err(e) = session.load_asset(asset, None) {
                    self.notice = Some((StatusLevel::Error, e.to_string()));
                    return;
                }
                self.session = Some(session);
                self.screen = Screen::Editor;
                self.notice = None;
            }
            Err(e) => {
                log::error!("Failed to open video: {:#}", e);
                self.notice = Some((StatusLevel::Error, format!("{e:#}")));
            }
        }
    }

    /// Ask where to save a finished video and write it there.
    fn save_export_dialog(&mut self, export: &ExportFile) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Video", &["mp4", "m4a", "webm", "mp3"])
            .set_file_name(media::sanitize_file_name(&export.file_name))
            .save_file()
        else {
            return;
        };

        self.notice = Some(match media::save_export(export, &path) {
            Ok(()) => (StatusLevel::Info, format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("Failed to save video: {:#}", e);
                (StatusLevel::Error, format!("{e:#}"))
            }
        });
    }

    /// Export the captions as a project file or SRT, by extension.
    fn export_captions(&mut self, path: PathBuf) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let is_srt = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));

        let result = if is_srt {
            serialization::export_srt(session.captions(), &path)
        } else {
            let title = session.asset().map(|a| a.title.clone()).unwrap_or_default();
            serialization::export_project(&CaptionProject::new(title, session.captions()), &path)
        };

        self.notice = Some(match result {
            Ok(()) => {
                log::info!("Exported captions to {}", path.display());
                (StatusLevel::Info, format!("Exported captions to {}", path.display()))
            }
            Err(e) => {
                log::error!("Failed to export captions: {:#}", e);
                (StatusLevel::Error, format!("{e:#}"))
            }
        });
    }

    /// Import captions from a project file or SRT, by extension.
    fn import_captions(&mut self, path: PathBuf) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let is_srt = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));

        let cues = if is_srt {
            serialization::import_srt(&path)
        } else {
            serialization::import_project(&path).map(|project| project.captions)
        };

        self.notice = Some(match cues {
            Ok(cues) => {
                let added = session.import_captions(&cues);
                log::info!("Imported {} of {} captions from {}", added, cues.len(), path.display());
                let skipped = cues.len() - added;
                if skipped > 0 {
                    (StatusLevel::Info, format!("Imported {added} captions, skipped {skipped} invalid"))
                } else {
                    (StatusLevel::Info, format!("Imported {added} captions"))
                }
            }
            Err(e) => {
                log::error!("Failed to import captions: {:#}", e);
                (StatusLevel::Error, format!("{e:#}"))
            }
        });
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let editing = self.session.is_some();

        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Video...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Video", &["mp4", "mov", "mkv", "webm"])
                        .pick_file()
                    {
                        self.open_video_file(path);
                    }
                    ui.close_menu();
                }
                let current = self.session.as_ref().and_then(|s| s.export_current());
                if ui
                    .add_enabled(current.is_some(), egui::Button::new("Save Current Video..."))
                    .clicked()
                {
                    if let Some(export) = current {
                        self.save_export_dialog(&export);
                    }
                    ui.close_menu();
                }
                ui.separator();
                if ui
                    .add_enabled(editing, egui::Button::new("Import Captions..."))
                    .clicked()
                {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Captions", &["srt", "yaml", "yml", "json"])
                        .pick_file()
                    {
                        self.import_captions(path);
                    }
                    ui.close_menu();
                }
                ui.add_enabled_ui(editing, |ui| {
                    ui.menu_button("Export Captions", |ui| {
                        for (label, filter, ext) in [
                            ("Export as SRT...", "SubRip", "srt"),
                            ("Export as YAML...", "YAML", "yaml"),
                            ("Export as JSON...", "JSON", "json"),
                        ] {
                            if ui.button(label).clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter(filter, &[ext])
                                    .set_file_name(format!("captions.{ext}"))
                                    .save_file()
                                {
                                    self.export_captions(path);
                                }
                                ui.close_menu();
                            }
                        }
                    });
                });
                ui.separator();
                if ui
                    .add_enabled(editing, egui::Button::new("Back to Source"))
                    .clicked()
                {
                    self.close_session();
                    ui.close_menu();
                }
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
        });
    }

    fn status_line(&self, ui: &mut egui::Ui) {
        let session_status = self
            .session
            .as_ref()
            .and_then(|s| s.status())
            .map(|m| (m.level, m.text.as_str()));
        let notice = self.notice.as_ref().map(|(level, text)| (*level, text.as_str()));

        ui.horizontal(|ui| {
            for (level, text) in [session_status, notice].into_iter().flatten() {
                let color = match level {
                    StatusLevel::Info => egui::Color32::from_gray(190),
                    StatusLevel::Busy => egui::Color32::from_rgb(230, 180, 60),
                    StatusLevel::Error => egui::Color32::from_rgb(230, 90, 90),
                };
                ui.colored_label(color, text);
                ui.separator();
            }
        });
    }

    fn editor(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_mut() else {
            self.screen = Screen::Source;
            return;
        };

        session.pump();

        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, session.state(), session.progress()))
            .inner;
        let job = match toolbar_action {
            toolbar::ToolbarAction::None => None,
            toolbar::ToolbarAction::Trim => session.begin_trim().ok(),
            toolbar::ToolbarAction::Caption => session.begin_caption().ok(),
            toolbar::ToolbarAction::Combined => session.begin_combined().ok(),
        };

        let active = session.active_caption().map(|(index, _)| index);
        let editing = session.editing_index();
        let playhead = session.playhead();
        let caption_action = egui::SidePanel::right("captions")
            .default_width(320.0)
            .show(ctx, |ui| {
                let (draft, captions) = session.caption_editor();
                properties::show(ui, draft, captions, editing, active, playhead)
            })
            .inner;

        // Errors from these calls are already in the session status.
        let _ = match caption_action {
            properties::CaptionAction::None => Ok(()),
            properties::CaptionAction::MarkStart => {
                session.mark_draft_start();
                Ok(())
            }
            properties::CaptionAction::MarkEnd => {
                session.mark_draft_end();
                Ok(())
            }
            properties::CaptionAction::QuickAdd => {
                session.quick_mark();
                Ok(())
            }
            properties::CaptionAction::Commit => session.commit_draft(),
            properties::CaptionAction::CancelEdit => {
                session.cancel_edit();
                Ok(())
            }
            properties::CaptionAction::Preview(index) => session.preview_caption(index),
            properties::CaptionAction::Edit(index) => session.edit_caption(index),
            properties::CaptionAction::Delete(index) => session.delete_caption(index).map(|_| ()),
        };

        let timeline_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                match session.asset() {
                    Some(asset) => {
                        ui.heading(&asset.title);
                        ui.label(
                            egui::RichText::new(format!(
                                "{:.1} MB · {}",
                                asset.len() as f64 / (1024.0 * 1024.0),
                                match asset.duration {
                                    Some(d) => crate::util::time::format_clock(d),
                                    None => "duration unknown".to_string(),
                                }
                            ))
                            .weak(),
                        );
                    }
                    None => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Downloading video...");
                        });
                    }
                }
                ui.label(
                    egui::RichText::new("Playback opens in a separate mpv window")
                        .small()
                        .weak(),
                );
                ui.separator();
                timeline::show(
                    ui,
                    session.range(),
                    session.playhead(),
                    session.captions(),
                    active,
                )
            })
            .inner;

        match timeline_action {
            timeline::TimelineAction::None => {}
            timeline::TimelineAction::SetStart(v) => session.set_range_start(v),
            timeline::TimelineAction::SetEnd(v) => session.set_range_end(v),
            timeline::TimelineAction::Reset => session.reset_range(),
            timeline::TimelineAction::PreviewSelection => session.preview_selection(),
            timeline::TimelineAction::PreviewFromStart => session.preview_from_start_bound(),
            timeline::TimelineAction::PreviewToEnd => session.preview_to_end_bound(),
            timeline::TimelineAction::PreviewCaption(index) => {
                let _ = session.preview_caption(index);
            }
        }

        // Escape leaves caption editing, unless a text field has focus.
        if !ctx.wants_keyboard_input() && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            session.cancel_edit();
        }

        if session.asset().is_some() {
            // mpv reports the playhead asynchronously; keep polling it.
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        if let Some(job) = job {
            self.submit(Command::Transform(job));
        }
    }
}

/// What became of an edit download.
#[derive(Debug, PartialEq)]
enum EditDownload {
    Loaded,
    /// The session that asked for it is gone.
    Stale,
    /// The session is unusable; the message explains why.
    Failed(String),
}

/// Hand a finished edit download to the session that requested it.
fn apply_edit_download<S: PlaybackSurface>(
    session: Option<&mut EditSession<S>>,
    session_id: u64,
    result: Result<DownloadedFile, GatewayError>,
    duration_hint: Option<f64>,
) -> EditDownload {
    let Some(session) = session.filter(|s| s.id() == session_id) else {
        log::warn!("Dropping download for closed session {}", session_id);
        return EditDownload::Stale;
    };
    match result {
        Ok(file) => {
            let asset = Asset::new(file.bytes.clone(), file.title());
            match session.load_asset(asset, duration_hint) {
                Ok(()) => EditDownload::Loaded,
                Err(e) => EditDownload::Failed(e.to_string()),
            }
        }
        Err(e) => {
            let message = e.to_string();
            session.fail_fetch(e);
            EditDownload::Failed(message)
        }
    }
}

impl eframe::App for ClipsmithApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_worker_events(ctx);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.menu_bar(ctx, ui);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            self.status_line(ui);
        });

        match self.screen {
            Screen::Source => {
                let action = egui::CentralPanel::default()
                    .show(ctx, |ui| source::show(ui, &mut self.source))
                    .inner;
                self.handle_source_action(action);
            }
            Screen::Editor => self.editor(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::playback::testing::RecordingSurface;
    use crate::session::SessionState;
    use bytes::Bytes;

    fn fetching() -> EditSession<RecordingSurface> {
        let mut session = EditSession::new(RecordingSurface::default());
        session.begin_fetch().unwrap();
        session
    }

    fn file(bytes: &'static [u8]) -> Result<DownloadedFile, GatewayError> {
        Ok(DownloadedFile {
            file_name: "clip.mp4".into(),
            bytes: Bytes::from_static(bytes),
        })
    }

    #[test]
    fn test_edit_download_loads_requesting_session() {
        let mut session = fetching();
        let id = session.id();

        let outcome = apply_edit_download(Some(&mut session), id, file(b"video"), Some(8.0));

        assert_eq!(outcome, EditDownload::Loaded);
        assert_eq!(session.asset().unwrap().title, "clip");
    }

    #[test]
    fn test_stale_edit_download_is_dropped() {
        let abandoned = fetching();
        let mut current = fetching();

        let outcome = apply_edit_download(Some(&mut current), abandoned.id(), file(b"old"), None);
        assert_eq!(outcome, EditDownload::Stale);
        assert!(current.asset().is_none());
        assert_eq!(current.state(), SessionState::FetchingInfo);

        let failed = Err(GatewayError::Network("timed out".into()));
        let outcome = apply_edit_download(Some(&mut current), abandoned.id(), failed, None);
        assert_eq!(outcome, EditDownload::Stale);
        assert_eq!(current.state(), SessionState::FetchingInfo);

        assert_eq!(
            apply_edit_download::<RecordingSurface>(None, abandoned.id(), file(b"old"), None),
            EditDownload::Stale
        );
    }

    #[test]
    fn test_failed_edit_download_resets_session() {
        let mut session = fetching();
        let id = session.id();

        let failed = Err(GatewayError::Network("timed out".into()));
        let outcome = apply_edit_download(Some(&mut session), id, failed, None);

        assert!(matches!(outcome, EditDownload::Failed(_)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_unplayable_edit_download_fails() {
        let mut session = EditSession::new(RecordingSurface {
            fail_load: true,
            ..Default::default()
        });
        session.begin_fetch().unwrap();
        let id = session.id();

        let outcome = apply_edit_download(Some(&mut session), id, file(b"video"), None);

        assert!(matches!(outcome, EditDownload::Failed(_)));
        assert!(session.asset().is_none());
        assert_eq!(session.state(), SessionState::Idle);
    }
}
