//! Transaction history with a details pane.

use chrono::{DateTime, Local, Utc};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use tokio::sync::mpsc::UnboundedSender;

use demo_wallet::domain::{
    models::{Transaction, TransactionDetail, TxKind, TxStatus},
    wallet::format_address,
};

use crate::{action::Action, tui::Frame};

use super::Component;

/// Format a millisecond timestamp relative to now.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    let Some(time) = DateTime::<Utc>::from_timestamp_millis(timestamp_ms) else {
        return timestamp_ms.to_string();
    };
    let secs = (Utc::now() - time).num_seconds();
    match secs {
        s if s < 0 => time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        s if s < 60 => "just now".to_string(),
        s if s < 3600 => format!("{} min ago", s / 60),
        s if s < 86400 => format!("{} hours ago", s / 3600),
        s if s < 604800 => format!("{} days ago", s / 86400),
        _ => time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    }
}

/// Signed amount and its color.
pub fn tx_amount(tx: &Transaction) -> (String, Color) {
    match tx.kind {
        TxKind::Sent => (format!("-{} ETH", tx.amount), Color::Red),
        TxKind::Received => (format!("+{} ETH", tx.amount), Color::Green),
    }
}

fn status_color(status: TxStatus) -> Color {
    match status {
        TxStatus::Success => Color::Green,
        TxStatus::Pending => Color::Yellow,
        TxStatus::Failed => Color::Red,
    }
}

pub struct HistoryComponent {
    action_tx: UnboundedSender<Action>,
    pub transactions: Vec<Transaction>,
    pub selected_index: usize,
    /// Details for the transaction at `selected_index`.
    pub details: Option<TransactionDetail>,
    pub details_loading: bool,
}

impl HistoryComponent {
    pub fn new(action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            transactions: Vec::new(),
            selected_index: 0,
            details: None,
            details_loading: false,
        }
    }

    pub fn set_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
        if self.selected_index >= self.transactions.len() {
            self.selected_index = self.transactions.len().saturating_sub(1);
        }
        self.details = None;
        self.details_loading = false;
    }

    pub fn set_details(&mut self, details: Option<TransactionDetail>) {
        self.details = details;
        self.details_loading = false;
    }

    fn select(&mut self, index: usize) {
        if index != self.selected_index {
            self.selected_index = index;
            self.details = None;
        }
    }

    fn next(&mut self) {
        if self.transactions.is_empty() {
            return;
        }
        self.select((self.selected_index + 1) % self.transactions.len());
    }

    fn previous(&mut self) {
        if self.transactions.is_empty() {
            return;
        }
        let len = self.transactions.len();
        self.select((self.selected_index + len - 1) % len);
    }

    pub fn draw_static(
        f: &mut Frame,
        area: Rect,
        transactions: &[Transaction],
        selected_index: usize,
        details: Option<&TransactionDetail>,
        details_loading: bool,
    ) {
        let chunks = Layout::horizontal([Constraint::Length(52), Constraint::Min(0)]).split(area);

        let items: Vec<ListItem> = transactions
            .iter()
            .map(|tx| {
                let (amount, color) = tx_amount(tx);
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<9}", tx.kind.to_string()), Style::default().fg(color)),
                    Span::styled(format!("{:<18}", amount), Style::default().fg(color)),
                    Span::styled(
                        format_timestamp(tx.timestamp),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();

        let mut list_state = ListState::default();
        if !transactions.is_empty() {
            list_state.select(Some(selected_index));
        }

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("History ({})", transactions.len()))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        f.render_stateful_widget(list, chunks[0], &mut list_state);

        let lines = match (transactions.get(selected_index), details) {
            (None, _) => vec![
                Line::from("No transactions yet"),
                Line::from(""),
                Line::from("Sent transfers appear here"),
            ],
            (Some(_), Some(detail)) => Self::detail_lines(detail),
            (Some(tx), None) => {
                let (amount, color) = tx_amount(tx);
                let mut lines = vec![
                    Line::from(vec![
                        Span::styled("Type: ", Style::default().fg(Color::DarkGray)),
                        Span::styled(tx.kind.to_string(), Style::default().fg(color)),
                    ]),
                    Line::from(vec![
                        Span::styled("Amount: ", Style::default().fg(Color::DarkGray)),
                        Span::styled(amount, Style::default().fg(color)),
                    ]),
                    Line::from(vec![
                        Span::styled("Counterparty: ", Style::default().fg(Color::DarkGray)),
                        Span::raw(format_address(&tx.address)),
                    ]),
                    Line::from(vec![
                        Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
                        Span::styled(
                            tx.status.to_string(),
                            Style::default().fg(status_color(tx.status)),
                        ),
                    ]),
                    Line::from(""),
                ];
                lines.push(Line::from(Span::styled(
                    if details_loading {
                        "Loading details..."
                    } else {
                        "Press Enter for full details"
                    },
                    Style::default().fg(Color::DarkGray),
                )));
                lines
            }
        };

        let details_widget = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("Transaction Details")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(details_widget, chunks[1]);
    }

    fn detail_lines(detail: &TransactionDetail) -> Vec<Line<'static>> {
        let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::DarkGray));
        let mut lines = vec![
            Line::from(vec![label("ID: "), Span::raw(detail.id.clone())]),
            Line::from(vec![
                label("Status: "),
                Span::styled(
                    detail.status.to_string(),
                    Style::default().fg(status_color(detail.status)),
                ),
            ]),
            Line::from(vec![
                label("Amount: "),
                Span::styled(
                    format!("{} ETH", detail.amount),
                    Style::default().fg(Color::Cyan),
                ),
            ]),
            Line::from(""),
            Line::from(label("From:")),
            Line::from(detail.from_address.clone()),
            Line::from(label("To:")),
            Line::from(detail.to_address.clone()),
            Line::from(""),
        ];
        if let Some(hash) = &detail.transaction_hash {
            lines.push(Line::from(label("TX Hash:")));
            lines.push(Line::from(Span::styled(
                hash.clone(),
                Style::default().fg(Color::Yellow),
            )));
        }
        if let Some(fee) = &detail.gas_fee {
            lines.push(Line::from(vec![label("Gas fee: "), Span::raw(format!("{} ETH", fee))]));
        }
        if let Some(block) = detail.block_number {
            lines.push(Line::from(vec![label("Block: "), Span::raw(block.to_string())]));
        }
        lines.push(Line::from(vec![label("Created: "), Span::raw(detail.created_at.clone())]));
        if let Some(sig) = &detail.signature {
            lines.push(Line::from(""));
            lines.push(Line::from(label("Signature:")));
            lines.push(Line::from(Span::styled(
                sig.clone(),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines
    }
}

impl Component for HistoryComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Enter => {
                if self.selected_index < self.transactions.len() && !self.details_loading {
                    self.details_loading = true;
                    self.action_tx
                        .send(Action::LoadTransactionDetails(self.selected_index))?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        Self::draw_static(
            f,
            area,
            &self.transactions,
            self.selected_index,
            self.details.as_ref(),
            self.details_loading,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn tx(id: &str, kind: TxKind) -> Transaction {
        Transaction {
            id: id.to_string(),
            kind,
            amount: "0.25".to_string(),
            address: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
            timestamp: Utc::now().timestamp_millis(),
            status: TxStatus::Success,
            tx_hash: None,
            signature: None,
        }
    }

    #[test]
    fn test_navigation_wraps() {
        let (tx_chan, _rx) = mpsc::unbounded_channel();
        let mut history = HistoryComponent::new(tx_chan);
        history.set_transactions(vec![tx("a", TxKind::Sent), tx("b", TxKind::Received)]);

        history.handle_key_event(key(KeyCode::Up)).unwrap();
        assert_eq!(history.selected_index, 1);
        history.handle_key_event(key(KeyCode::Down)).unwrap();
        assert_eq!(history.selected_index, 0);
    }

    #[test]
    fn test_enter_requests_details() {
        let (tx_chan, mut rx) = mpsc::unbounded_channel();
        let mut history = HistoryComponent::new(tx_chan);
        history.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(rx.try_recv().is_err());

        history.set_transactions(vec![tx("a", TxKind::Sent)]);
        history.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(history.details_loading);
        assert!(matches!(
            rx.try_recv(),
            Ok(Action::LoadTransactionDetails(0))
        ));
    }

    #[test]
    fn test_amount_sign() {
        assert_eq!(tx_amount(&tx("a", TxKind::Sent)).0, "-0.25 ETH");
        assert_eq!(tx_amount(&tx("b", TxKind::Received)).0, "+0.25 ETH");
    }

    #[test]
    fn test_format_timestamp() {
        let now = Utc::now().timestamp_millis();
        assert_eq!(format_timestamp(now), "just now");
        assert_eq!(format_timestamp(now - 5 * 60 * 1000), "5 min ago");
        assert_eq!(format_timestamp(now - 3 * 86_400_000), "3 days ago");
    }
}
