//! Receive screen: the active address and its QR code.

use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use demo_wallet::{domain::models::Wallet, infra::qr};

use crate::tui::Frame;

use super::Component;

pub struct ReceiveComponent {
    pub wallet: Option<Wallet>,
    /// QR code for the wallet address, rendered once per wallet.
    pub qr_lines: Vec<String>,
}

impl ReceiveComponent {
    pub fn new() -> Self {
        Self {
            wallet: None,
            qr_lines: Vec::new(),
        }
    }

    pub fn set_wallet(&mut self, wallet: Option<Wallet>) {
        let same = match (&self.wallet, &wallet) {
            (Some(a), Some(b)) => a.address == b.address,
            _ => false,
        };
        if !same {
            self.qr_lines = wallet
                .as_ref()
                .and_then(|w| qr::render_lines(&w.address))
                .unwrap_or_default();
        }
        self.wallet = wallet;
    }

    pub fn draw_static(f: &mut Frame, area: Rect, wallet: Option<&Wallet>, qr_lines: &[String]) {
        let block = Block::default()
            .title("Receive")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let Some(wallet) = wallet else {
            let msg = Paragraph::new("No wallet selected.").style(Style::default().fg(Color::Red));
            f.render_widget(msg, inner);
            return;
        };

        let qr_height = qr_lines.len() as u16;
        let chunks = Layout::vertical([
            Constraint::Length(5),
            Constraint::Length(qr_height),
            Constraint::Min(0),
        ])
        .split(inner);

        let header = Paragraph::new(vec![
            Line::from(Span::styled(
                format!("Receive ETH to {}", wallet.label()),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                wallet.address.clone(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ])
        .alignment(Alignment::Center);
        f.render_widget(header, chunks[0]);

        let qr_widget = if qr_lines.is_empty() {
            Paragraph::new("QR code unavailable").style(Style::default().fg(Color::DarkGray))
        } else {
            Paragraph::new(qr_lines.iter().map(|l| Line::from(l.as_str())).collect::<Vec<_>>())
                .style(Style::default().fg(Color::White).bg(Color::Black))
        };
        f.render_widget(qr_widget.alignment(Alignment::Center), chunks[1]);

        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Share this address or let the sender scan the code.",
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                "Only send ETH on the network this wallet uses.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center);
        f.render_widget(hint, chunks[2]);
    }
}

impl Default for ReceiveComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for ReceiveComponent {
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<()> {
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        Self::draw_static(f, area, self.wallet.as_ref(), &self.qr_lines);
    }
}
