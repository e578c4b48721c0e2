//! # Valve Display Widget
//!
//! Draws the three piston valves as circles: a highlighted ring marks the
//! valves the current note requires, and the fill shows which valves the
//! learner is holding, colored by correctness.

use iced::widget::canvas::{self, Geometry, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Point, Rectangle, Renderer, Theme, alignment, mouse};

use practice_core::Correctness;
use practice_core::valves::{VALVE_IDS, ValveSet};

/// Valve visualization widget.
#[derive(Debug, Clone)]
pub struct ValveDisplay {
    required: ValveSet,
    pressed: ValveSet,
    correctness: Correctness,
}

impl ValveDisplay {
    pub fn new(required: ValveSet, pressed: ValveSet, correctness: Correctness) -> Self {
        Self {
            required,
            pressed,
            correctness,
        }
    }

    // Consumes `self` so the canvas can own the widget state.
    pub fn view(self) -> Element<'static, super::super::Message> {
        container(
            canvas::Canvas::new(self)
                .width(iced::Length::Fixed(320.0))
                .height(iced::Length::Fixed(140.0)),
        )
        .into()
    }

    fn fill_color(&self) -> Color {
        match self.correctness {
            Correctness::Correct => Color::from_rgb8(0x34, 0xDB, 0x98),
            Correctness::Incorrect => Color::from_rgb8(0xFF, 0x33, 0x33),
            Correctness::Unknown => Color::from_rgb8(0x4D, 0x7E, 0xC2),
        }
    }
}

impl<Message> canvas::Program<Message> for ValveDisplay {
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

        let slot_width = bounds.width / VALVE_IDS.len() as f32;
        let radius = (slot_width * 0.32).min(bounds.height * 0.32);
        let center_y = bounds.height * 0.42;

        for (slot, valve) in VALVE_IDS.iter().enumerate() {
            let center = Point::new((slot as f32 + 0.5) * slot_width, center_y);
            let circle = Path::circle(center, radius);

            if self.pressed.contains(valve) {
                frame.fill(&circle, self.fill_color());
            } else {
                frame.fill(&circle, Color::from_rgb8(0x2A, 0x2A, 0x2A));
            }

            let ring_color = if self.required.contains(valve) {
                Color::from_rgb8(0xE8, 0xC5, 0x4A) // required valves get a bright ring
            } else {
                Color::from_rgb8(0x55, 0x55, 0x55)
            };
            frame.stroke(
                &circle,
                Stroke::default().with_width(3.0).with_color(ring_color),
            );

            frame.fill_text(canvas::Text {
                content: valve.to_string(),
                position: Point::new(center.x, bounds.height - 14.0),
                color: Color::from_rgb8(0xBB, 0xBB, 0xBB),
                size: 16.0.into(),
                horizontal_alignment: alignment::Horizontal::Center,
                vertical_alignment: alignment::Vertical::Center,
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}
