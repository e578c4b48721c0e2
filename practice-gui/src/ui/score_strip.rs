//! # Score Strip Widget
//!
//! A horizontal strip of the note sequence around the current position,
//! so the learner sees what is coming. The current note is boxed and
//! highlighted; notes already played are dimmed.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Size, Theme, alignment, mouse};

/// How many notes are drawn at once; the current note sits in the middle
/// slot whenever the sequence allows it.
const VISIBLE_SLOTS: usize = 9;

/// Note sequence context widget.
#[derive(Debug, Clone)]
pub struct ScoreStrip {
    note_names: Vec<String>,
    current: Option<usize>,
}

impl ScoreStrip {
    pub fn new(note_names: Vec<String>, current: Option<usize>) -> Self {
        Self {
            note_names,
            current,
        }
    }

    pub fn view(self) -> Element<'static, super::super::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fill)
                .height(iced::Length::Fixed(60.0)),
        )
        .into()
    }

    /// First sequence index shown, keeping the current note centered and
    /// the window inside the sequence.
    fn window_start(&self) -> usize {
        let Some(current) = self.current else {
            return 0;
        };
        let half = VISIBLE_SLOTS / 2;
        let max_start = self.note_names.len().saturating_sub(VISIBLE_SLOTS);
        current.saturating_sub(half).min(max_start)
    }
}

impl<Message> canvas::Program<Message> for ScoreStrip {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        frame.fill(
            &Path::rectangle(Point::ORIGIN, bounds.size()),
            Color::from_rgb8(0x20, 0x20, 0x20),
        );

        if self.note_names.is_empty() {
            frame.fill_text(canvas::Text {
                content: "No score loaded".to_string(),
                position: Point::new(bounds.width / 2.0, bounds.height / 2.0),
                color: Color::from_rgb8(0x77, 0x77, 0x77),
                size: 16.0.into(),
                horizontal_alignment: alignment::Horizontal::Center,
                vertical_alignment: alignment::Vertical::Center,
                ..canvas::Text::default()
            });
            return vec![frame.into_geometry()];
        }

        let slot_width = bounds.width / VISIBLE_SLOTS as f32;
        let start = self.window_start();

        for slot in 0..VISIBLE_SLOTS {
            let index = start + slot;
            let Some(name) = self.note_names.get(index) else {
                break;
            };
            let is_current = self.current == Some(index);
            let is_played = self.current.is_some_and(|c| index < c);

            let center = Point::new((slot as f32 + 0.5) * slot_width, bounds.height / 2.0);

            if is_current {
                let box_size = Size::new(slot_width * 0.85, bounds.height * 0.8);
                let top_left = Point::new(
                    center.x - box_size.width / 2.0,
                    center.y - box_size.height / 2.0,
                );
                frame.stroke(
                    &Path::rectangle(top_left, box_size),
                    Stroke::default()
                        .with_width(2.0)
                        .with_color(Color::from_rgb8(0xE8, 0xC5, 0x4A)),
                );
            }

            let color = if is_current {
                Color::WHITE
            } else if is_played {
                Color::from_rgb8(0x60, 0x60, 0x60)
            } else {
                Color::from_rgb8(0xA8, 0xA8, 0xA8)
            };

            frame.fill_text(canvas::Text {
                content: name.clone(),
                position: center,
                color,
                size: 18.0.into(),
                horizontal_alignment: alignment::Horizontal::Center,
                vertical_alignment: alignment::Vertical::Center,
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}
