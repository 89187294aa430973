// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Trim range controls and caption timeline.
//!
//! Two sliders select the range to keep, each with a preview button. Below
//! them a bar shows every caption as a segment of the video; clicking a
//! segment previews that caption.

use crate::models::caption::CaptionCollection;
use crate::models::range::TimeRange;
use crate::util::time::{format_clock, time_to_fraction};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineAction {
    None,
    SetStart(f64),
    SetEnd(f64),
    Reset,
    PreviewSelection,
    PreviewFromStart,
    PreviewToEnd,
    PreviewCaption(usize),
}

const BAR_HEIGHT: f32 = 28.0;

/// Display the range panel. Returns at most one action per frame.
pub fn show(
    ui: &mut egui::Ui,
    range: &TimeRange,
    playhead: f64,
    captions: &CaptionCollection,
    active_caption: Option<usize>,
) -> TimelineAction {
    let mut action = TimelineAction::None;
    let duration = range.duration();
    let enabled = duration > 0.0;

    ui.add_enabled_ui(enabled, |ui| {
        egui::Grid::new("range_grid")
            .num_columns(3)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                ui.label("Start:");
                let mut start = range.start();
                let slider = egui::Slider::new(&mut start, 0.0..=duration.max(0.0))
                    .custom_formatter(|v, _| format_clock(v));
                if ui.add(slider).changed() {
                    action = TimelineAction::SetStart(start);
                }
                if ui.button("▶ Preview").on_hover_text("Play from here to the end").clicked() {
                    action = TimelineAction::PreviewFromStart;
                }
                ui.end_row();

                ui.label("End:");
                let mut end = range.end();
                let slider = egui::Slider::new(&mut end, 0.0..=duration.max(0.0))
                    .custom_formatter(|v, _| format_clock(v));
                if ui.add(slider).changed() {
                    action = TimelineAction::SetEnd(end);
                }
                if ui.button("▶ Preview").on_hover_text("Play from the beginning up to here").clicked() {
                    action = TimelineAction::PreviewToEnd;
                }
                ui.end_row();
            });

        ui.horizontal(|ui| {
            ui.label(format!(
                "Selection: {} – {} ({:.2}s)",
                format_clock(range.start()),
                format_clock(range.end()),
                range.length()
            ));
            if ui.button("▶ Preview Selection").clicked() {
                action = TimelineAction::PreviewSelection;
            }
            if ui.button("Reset").clicked() {
                action = TimelineAction::Reset;
            }
        });
    });

    ui.add_space(6.0);
    if let Some(index) = caption_bar(ui, range, playhead, captions, active_caption) {
        action = TimelineAction::PreviewCaption(index);
    }

    action
}

/// Draw the caption bar; returns the caption clicked, if any.
fn caption_bar(
    ui: &mut egui::Ui,
    range: &TimeRange,
    playhead: f64,
    captions: &CaptionCollection,
    active_caption: Option<usize>,
) -> Option<usize> {
    let duration = range.duration();
    let (rect, response) = ui.allocate_exact_size(
        egui::vec2(ui.available_width(), BAR_HEIGHT),
        egui::Sense::click(),
    );
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 4.0, egui::Color32::from_gray(35));

    let x_at = |t: f64| rect.min.x + time_to_fraction(t, duration) * rect.width();

    // Selected range
    let selection = egui::Rect::from_x_y_ranges(x_at(range.start())..=x_at(range.end()), rect.y_range());
    painter.rect_filled(
        selection,
        0.0,
        egui::Color32::from_rgba_unmultiplied(80, 140, 220, 50),
    );

    let mut segments = Vec::with_capacity(captions.len());
    for (index, caption) in captions.iter().enumerate() {
        let segment = egui::Rect::from_x_y_ranges(
            x_at(caption.start)..=x_at(caption.end).max(x_at(caption.start) + 2.0),
            rect.shrink(4.0).y_range(),
        );
        let color = if active_caption == Some(index) {
            egui::Color32::from_rgb(250, 200, 60)
        } else {
            egui::Color32::from_rgb(120, 180, 120)
        };
        painter.rect_filled(segment, 2.0, color);
        segments.push(segment);
    }

    if duration > 0.0 {
        let x = x_at(playhead);
        painter.line_segment(
            [egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())],
            egui::Stroke::new(2.0, egui::Color32::WHITE),
        );
    }

    if response.clicked() {
        let pos = response.interact_pointer_pos()?;
        // Later captions are drawn on top, so they win the hit test.
        return segments.iter().rposition(|segment| segment.contains(pos));
    }
    None
}
