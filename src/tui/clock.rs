use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::canvas::{Canvas, Circle, Line as CanvasLine},
    widgets::{Block, Borders},
    Frame,
};

use crate::model::TimerSnapshot;
use crate::timer::{hand_tip, PomodoroMode};

const FACE_RADIUS: f64 = 0.96;
const LONG_HAND: f64 = 0.5;
const SECOND_HAND: f64 = 0.7;
const LONG_HAND_COLOR: Color = Color::Rgb(167, 139, 250);
const SECOND_HAND_COLOR: Color = Color::Rgb(251, 191, 36);

/// Tick marks as (angle, inner radius): long marks at the quarters.
fn tick_marks() -> impl Iterator<Item = (f64, f64)> {
    (0..12).map(|i| {
        let angle = i as f64 * 30.0;
        let inner = if i % 3 == 0 { 0.8 } else { 0.86 };
        (angle, inner)
    })
}

/// Analog face for the current reading: countdown sweep in Pomodoro mode,
/// minutes-in-the-hour otherwise.
pub fn draw_clock(f: &mut Frame, area: Rect, snapshot: &TimerSnapshot) {
    let angles = snapshot.face();
    let title = match snapshot.pomodoro {
        Some(p) => {
            let color = match p.mode {
                PomodoroMode::Work => Color::LightRed,
                PomodoroMode::Break => Color::LightGreen,
            };
            Line::from(vec![
                Span::raw("Clock "),
                Span::styled(p.mode.label(), Style::default().fg(color)),
            ])
        }
        None => Line::from("Clock"),
    };

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(symbols::Marker::Braille)
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(move |ctx| {
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius: FACE_RADIUS,
                color: Color::DarkGray,
            });
            for (angle, inner) in tick_marks() {
                let (x1, y1) = hand_tip(angle, inner);
                let (x2, y2) = hand_tip(angle, 0.92);
                ctx.draw(&CanvasLine {
                    x1,
                    y1,
                    x2,
                    y2,
                    color: Color::Gray,
                });
            }
            let (lx, ly) = hand_tip(angles.long_hand_degrees, LONG_HAND);
            ctx.draw(&CanvasLine {
                x1: 0.0,
                y1: 0.0,
                x2: lx,
                y2: ly,
                color: LONG_HAND_COLOR,
            });
            let (sx, sy) = hand_tip(angles.second_hand_degrees, SECOND_HAND);
            ctx.draw(&CanvasLine {
                x1: 0.0,
                y1: 0.0,
                x2: sx,
                y2: sy,
                color: SECOND_HAND_COLOR,
            });
        });
    f.render_widget(canvas, area);
}

/// Largest roughly-circular area inside `area` (terminal cells are about twice as tall as wide).
pub fn square_area(area: Rect) -> Rect {
    let width = area.width.min(area.height.saturating_mul(2));
    let height = (width / 2).min(area.height).max(area.height.min(3));
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_area_fits_inside() {
        let outer = Rect::new(0, 0, 100, 20);
        let sq = square_area(outer);
        assert_eq!(sq.width, 40);
        assert_eq!(sq.height, 20);
        assert_eq!(sq.x, 30);

        let tall = square_area(Rect::new(5, 5, 20, 40));
        assert_eq!(tall.width, 20);
        assert_eq!(tall.height, 10);
        assert!(tall.y + tall.height <= 45);
    }

    #[test]
    fn four_long_tick_marks() {
        assert_eq!(tick_marks().filter(|(_, inner)| *inner < 0.85).count(), 4);
    }
}
