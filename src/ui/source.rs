// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Source screen: look up a video by URL, pick a format, then save it or
//! open it for editing.

use crate::models::source::{format_minutes, normalize_source_url, DownloadRequest, VideoInfo};

/// State of the source form.
#[derive(Default)]
pub struct SourceForm {
    pub url: String,
    pub info: Option<VideoInfo>,
    pub format_id: Option<String>,
    pub audio_only: bool,
    pub thumbnail: Option<egui::TextureHandle>,
    /// Set while a request is running.
    pub busy: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceAction {
    None,
    FetchInfo(String),
    Save(DownloadRequest),
    Edit(DownloadRequest),
}

impl SourceForm {
    /// Take a fresh info result and preselect a format.
    pub fn apply_info(&mut self, info: VideoInfo) {
        self.format_id = info.default_format().map(|f| f.format_id.clone());
        self.audio_only = false;
        self.thumbnail = None;
        self.error = None;
        self.info = Some(info);
    }

    /// Toggle audio-only, moving the selection to a suitable format.
    pub fn set_audio_only(&mut self, audio_only: bool) {
        self.audio_only = audio_only;
        let Some(info) = &self.info else {
            return;
        };
        let format = if audio_only {
            info.audio_format()
        } else {
            info.default_format()
        };
        if let Some(format) = format {
            self.format_id = Some(format.format_id.clone());
        }
    }

    /// Request for the selected format, if one is selected.
    pub fn download_request(&self) -> Option<DownloadRequest> {
        self.info.as_ref()?;
        Some(DownloadRequest {
            url: normalize_source_url(&self.url),
            format_id: self.format_id.clone()?,
            audio_only: self.audio_only,
        })
    }
}

/// Display the source screen.
pub fn show(ui: &mut egui::Ui, form: &mut SourceForm) -> SourceAction {
    let mut action = SourceAction::None;
    let idle = form.busy.is_none();

    ui.vertical_centered(|ui| {
        ui.add_space(16.0);
        ui.heading(egui::RichText::new("clipsmith").size(28.0));
        ui.label(
            egui::RichText::new("Fetch a video, trim it and burn in captions")
                .color(egui::Color32::from_gray(160)),
        );
    });
    ui.add_space(16.0);

    ui.horizontal(|ui| {
        ui.label("Video URL:");
        let edit = ui.add_enabled(
            idle,
            egui::TextEdit::singleline(&mut form.url)
                .hint_text("https://www.youtube.com/watch?v=...")
                .desired_width(ui.available_width() - 110.0),
        );
        let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let clicked = ui
            .add_enabled(idle && !form.url.trim().is_empty(), egui::Button::new("Get Info"))
            .clicked();
        if (clicked || submitted) && !form.url.trim().is_empty() {
            action = SourceAction::FetchInfo(normalize_source_url(&form.url));
        }
    });

    if let Some(message) = &form.busy {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(message);
        });
    }
    if let Some(error) = &form.error {
        ui.colored_label(egui::Color32::from_rgb(230, 90, 90), error);
    }

    let Some(info) = &form.info else {
        return action;
    };

    ui.add_space(12.0);
    ui.separator();
    ui.horizontal(|ui| {
        if let Some(texture) = &form.thumbnail {
            let size = texture.size_vec2();
            let scale = (240.0 / size.x).min(1.0);
            ui.image((texture.id(), size * scale));
        }
        ui.vertical(|ui| {
            ui.label(egui::RichText::new(&info.title).strong().size(16.0));
            ui.label(format!("Duration: {}", format_minutes(info.duration)));
        });
    });

    ui.add_space(8.0);
    let mut audio_only = form.audio_only;
    if ui.checkbox(&mut audio_only, "Audio only").changed() {
        form.set_audio_only(audio_only);
    }

    let Some(info) = &form.info else {
        return action;
    };
    let selected_label = info
        .formats
        .iter()
        .find(|f| Some(&f.format_id) == form.format_id.as_ref())
        .map(|f| f.label())
        .unwrap_or_else(|| "Select a format".to_string());

    egui::ComboBox::from_label("Format")
        .selected_text(selected_label)
        .width(ui.available_width() - 80.0)
        .show_ui(ui, |ui| {
            for format in &info.formats {
                ui.selectable_value(&mut form.format_id, Some(format.format_id.clone()), format.label());
            }
        });

    ui.add_space(8.0);
    let request = form.download_request();
    ui.horizontal(|ui| {
        let ready = idle && request.is_some();
        if ui.add_enabled(ready, egui::Button::new("💾 Download")).clicked() {
            if let Some(request) = request.clone() {
                action = SourceAction::Save(request);
            }
        }
        if ui
            .add_enabled(ready && !form.audio_only, egui::Button::new("✂ Edit"))
            .clicked()
        {
            if let Some(request) = request.clone() {
                action = SourceAction::Edit(request);
            }
        }
    });

    action
}
