// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Caption panel.
//!
//! The draft editor on top, the caption list below. The draft's text and
//! bounds are edited in place; everything else is reported as an action.

use crate::models::caption::{CaptionCollection, DraftCaption};
use crate::util::time::format_clock;

/// Result of caption panel interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionAction {
    None,
    MarkStart,
    MarkEnd,
    QuickAdd,
    Commit,
    CancelEdit,
    Preview(usize),
    Edit(usize),
    Delete(usize),
}

/// Display the caption panel.
pub fn show(
    ui: &mut egui::Ui,
    draft: &mut DraftCaption,
    captions: &CaptionCollection,
    editing: Option<usize>,
    active: Option<usize>,
    playhead: f64,
) -> CaptionAction {
    let mut action = CaptionAction::None;

    ui.heading("Captions");
    ui.separator();

    match editing {
        Some(index) => ui.label(egui::RichText::new(format!("Editing caption {}", index + 1)).strong()),
        None => ui.label(egui::RichText::new("New caption").strong()),
    };

    ui.add(
        egui::TextEdit::multiline(&mut draft.text)
            .hint_text("Caption text")
            .desired_rows(2)
            .desired_width(f32::INFINITY),
    );

    egui::Grid::new("draft_grid").num_columns(3).show(ui, |ui| {
        ui.label("Start:");
        ui.add(
            egui::DragValue::new(&mut draft.start)
                .speed(0.05)
                .range(0.0..=f64::MAX)
                .suffix(" s"),
        );
        if ui.button("⏱ Mark").on_hover_text("Use the current playback time").clicked() {
            action = CaptionAction::MarkStart;
        }
        ui.end_row();

        ui.label("End:");
        ui.add(
            egui::DragValue::new(&mut draft.end)
                .speed(0.05)
                .range(0.0..=f64::MAX)
                .suffix(" s"),
        );
        if ui.button("⏱ Mark").on_hover_text("Use the current playback time").clicked() {
            action = CaptionAction::MarkEnd;
        }
        ui.end_row();
    });

    ui.horizontal(|ui| {
        let label = if editing.is_some() { "Update Caption" } else { "Add Caption" };
        if ui
            .add_enabled(draft.is_committable(), egui::Button::new(label))
            .clicked()
        {
            action = CaptionAction::Commit;
        }
        if editing.is_some() {
            if ui.button("Cancel").clicked() {
                action = CaptionAction::CancelEdit;
            }
        } else if ui
            .button("Quick Add")
            .on_hover_text("Start at the playhead, run for a few seconds")
            .clicked()
        {
            action = CaptionAction::QuickAdd;
        }
    });

    ui.label(
        egui::RichText::new(format!("Playhead: {}", format_clock(playhead)))
            .weak()
            .small(),
    );

    ui.separator();

    if captions.is_empty() {
        ui.label(egui::RichText::new("No captions yet").italics().weak());
        return action;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for (index, caption) in captions.iter().enumerate() {
                let highlighted = active == Some(index) || editing == Some(index);
                let frame = if highlighted {
                    egui::Frame::group(ui.style()).fill(ui.visuals().selection.bg_fill.gamma_multiply(0.4))
                } else {
                    egui::Frame::group(ui.style())
                };

                frame.show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "{}. {} → {}",
                                index + 1,
                                format_clock(caption.start),
                                format_clock(caption.end)
                            ))
                            .monospace(),
                        );
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("🗑").on_hover_text("Delete").clicked() {
                                action = CaptionAction::Delete(index);
                            }
                            if ui.small_button("✏").on_hover_text("Edit").clicked() {
                                action = CaptionAction::Edit(index);
                            }
                            if ui.small_button("▶").on_hover_text("Preview").clicked() {
                                action = CaptionAction::Preview(index);
                            }
                        });
                    });
                    ui.label(&caption.text);
                });
            }
        });

    action
}
