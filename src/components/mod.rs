pub mod dashboard;
pub mod history;
pub mod login;
pub mod profile;
pub mod receive;
pub mod send;
pub mod signup;
pub mod wallet_setup;
pub mod wallets;

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::tui::Frame;

/// A component is a reusable UI element that can handle events and render itself.
pub trait Component {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()>;
    fn draw(&mut self, f: &mut Frame, area: Rect);
}

pub const DISCLAIMER: &str =
    "Demo wallet: keys are stored unencrypted on this machine. Do not use with real funds.";

/// Render a labelled single-line input. `masked` hides the value.
pub fn draw_input(
    f: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    placeholder: &str,
    focused: bool,
    masked: bool,
) {
    let shown = if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let line = if value.is_empty() && !focused {
        Line::from(Span::styled(
            placeholder.to_string(),
            Style::default().fg(Color::DarkGray),
        ))
    } else if focused {
        Line::from(Span::styled(
            format!("{}│", shown),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(shown, Style::default().fg(Color::White)))
    };

    let widget = Paragraph::new(line).block(
        Block::default()
            .title(if focused {
                format!("> {}", label)
            } else {
                format!("  {}", label)
            })
            .borders(Borders::ALL)
            .border_style(if focused {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            }),
    );
    f.render_widget(widget, area);
}

/// Render a button row.
pub fn draw_button(f: &mut Frame, area: Rect, label: &str, focused: bool, color: Color) {
    let style = if focused {
        Style::default()
            .fg(Color::Black)
            .bg(color)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(color)
    };
    let widget = Paragraph::new(Line::from(Span::styled(format!("  [ {} ]  ", label), style)));
    f.render_widget(widget, area);
}

/// Error line in red, or success line in green.
pub fn message_line<'a>(error: Option<&'a str>, success: Option<&'a str>) -> Line<'a> {
    match (error, success) {
        (Some(err), _) => Line::from(Span::styled(
            format!("Error: {}", err),
            Style::default().fg(Color::Red),
        )),
        (None, Some(msg)) => Line::from(Span::styled(msg, Style::default().fg(Color::Green))),
        (None, None) => Line::from(""),
    }
}

/// A `width` x `height` rectangle centered in `area`.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    rect
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(area, 60, 20);
        assert_eq!(rect, Rect::new(20, 10, 60, 20));

        // Clamped to the available area
        let rect = centered_rect(Rect::new(0, 0, 30, 10), 60, 20);
        assert_eq!(rect.width, 30);
        assert_eq!(rect.height, 10);
    }
}
