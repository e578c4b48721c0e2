//! # Main Display Module
//!
//! This module contains the main display components and layout logic
//! for the Fanfare practice application.

use iced::widget::{Space, button, column, container, row, text};
use iced::{Alignment, Color, Element, Length};

use practice_core::{Correctness, valves};

use super::score_strip::ScoreStrip;
use super::valve_display::ValveDisplay;
use crate::{Message, PracticeDisplayData};

/// Creates the complete main application view
pub fn create_main_view(data: &PracticeDisplayData) -> Element<'static, Message> {
    let title = text("Fanfare").size(28);
    let status = text(data.status.clone())
        .size(14)
        .color(Color::from_rgb8(0x88, 0x88, 0x88));

    let note_panel = create_note_panel(data);
    let feedback = create_feedback_line(data);
    let navigation = create_navigation_row(data);
    let strip = ScoreStrip::new(data.note_names.clone(), data.snapshot.position).view();
    let controls = create_controls_row(data);

    let content = column![
        title,
        status,
        Space::with_height(16),
        note_panel,
        feedback,
        Space::with_height(12),
        navigation,
        Space::with_height(12),
        strip,
        Space::with_height(16),
        controls,
    ]
    .spacing(6)
    .align_x(Alignment::Center);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .padding(24)
        .into()
}

/// The current note, its required combination, and the valve canvas.
fn create_note_panel(data: &PracticeDisplayData) -> Element<'static, Message> {
    let snapshot = &data.snapshot;
    let note_name = snapshot
        .current_note_name
        .clone()
        .unwrap_or_else(|| "—".to_string());
    let combination = format!(
        "Valves: {}",
        valves::combination_label(&snapshot.required_combination)
    );

    column![
        text(note_name).size(64),
        text(combination)
            .size(18)
            .color(Color::from_rgb8(0xE8, 0xC5, 0x4A)),
        ValveDisplay::new(
            snapshot.required_combination.clone(),
            snapshot.pressed_set.clone(),
            snapshot.correctness,
        )
        .view(),
    ]
    .align_x(Alignment::Center)
    .into()
}

/// Feedback line colored by correctness.
fn create_feedback_line(data: &PracticeDisplayData) -> Element<'static, Message> {
    let snapshot = &data.snapshot;
    let color = match snapshot.correctness {
        Correctness::Correct => Color::from_rgb8(0x34, 0xDB, 0x98),
        Correctness::Incorrect => Color::from_rgb8(0xFF, 0x33, 0x33),
        Correctness::Unknown => Color::from_rgb8(0xCC, 0xCC, 0xCC),
    };
    text(snapshot.feedback_message.clone())
        .size(18)
        .color(color)
        .into()
}

/// Previous/next buttons around the position indicator. Buttons at the
/// sequence boundary are disabled rather than hidden.
fn create_navigation_row(data: &PracticeDisplayData) -> Element<'static, Message> {
    let snapshot = &data.snapshot;
    let position = match snapshot.position {
        Some(index) => format!("{} / {}", index + 1, snapshot.note_count),
        None => "– / –".to_string(),
    };

    row![
        button(text("Previous"))
            .on_press_maybe(snapshot.can_go_prev.then_some(Message::PrevPressed)),
        text(position).size(16),
        button(text("Next")).on_press_maybe(snapshot.can_go_next.then_some(Message::NextPressed)),
    ]
    .spacing(16)
    .align_y(Alignment::Center)
    .into()
}

/// Open-score button plus one rebinding button per valve.
fn create_controls_row(data: &PracticeDisplayData) -> Element<'static, Message> {
    let mut controls = row![button(text("Open Score...")).on_press(Message::OpenScore)]
        .spacing(10)
        .align_y(Alignment::Center);

    for (valve, key) in &data.bindings {
        let label = if data.remap_capture == Some(*valve) {
            format!("Valve {}: press a key...", valve)
        } else {
            match key {
                Some(key) => format!("Valve {}: {}", valve, key.to_ascii_uppercase()),
                None => format!("Valve {}: unbound", valve),
            }
        };
        controls = controls.push(button(text(label)).on_press(Message::BeginRemap(*valve)));
    }

    controls.into()
}
