//! Dashboard: active wallet, balance, and the latest transactions.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use tokio::sync::mpsc::UnboundedSender;

use demo_wallet::domain::{
    models::{Transaction, Wallet},
    session::BalanceView,
    wallet::{eth_to_usd, format_address},
};

use crate::{action::Action, tui::Frame};

use super::{
    history::{format_timestamp, tx_amount},
    Component, DISCLAIMER,
};

pub const RECENT_LIMIT: usize = 5;

pub struct DashboardComponent {
    action_tx: UnboundedSender<Action>,
    pub wallet: Option<Wallet>,
    pub balance: Option<BalanceView>,
    pub eth_price: f64,
    pub recent: Vec<Transaction>,
    pub is_loading: bool,
}

impl DashboardComponent {
    pub fn new(action_tx: UnboundedSender<Action>, eth_price: f64) -> Self {
        Self {
            action_tx,
            wallet: None,
            balance: None,
            eth_price,
            recent: Vec::new(),
            is_loading: false,
        }
    }

    pub fn set_wallet(&mut self, wallet: Option<Wallet>) {
        self.wallet = wallet;
        self.balance = None;
    }

    pub fn set_recent(&mut self, mut recent: Vec<Transaction>) {
        recent.truncate(RECENT_LIMIT);
        self.recent = recent;
    }

    pub fn set_balance(&mut self, balance: BalanceView) {
        if let Some(wallet) = self.wallet.as_mut() {
            wallet.balance = balance.balance.clone();
        }
        self.balance = Some(balance);
        self.is_loading = false;
    }

    pub fn draw_static(
        f: &mut Frame,
        area: Rect,
        wallet: Option<&Wallet>,
        balance: Option<&BalanceView>,
        eth_price: f64,
        recent: &[Transaction],
        is_loading: bool,
    ) {
        let chunks = Layout::vertical([
            Constraint::Length(8), // Wallet card
            Constraint::Min(5),    // Recent transactions
            Constraint::Length(3), // Disclaimer
        ])
        .split(area);

        let card_lines = if let Some(wallet) = wallet {
            // Cached wallet balance until the first refresh lands
            let (eth, usd, stale) = match balance {
                Some(b) => (b.balance.clone(), b.usd_value.clone(), b.stale),
                None => (
                    wallet.balance.clone(),
                    eth_to_usd(&wallet.balance, eth_price),
                    true,
                ),
            };

            let mut balance_spans = vec![
                Span::styled("Balance: ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{} ETH", eth),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(format!("≈ ${}", usd), Style::default().fg(Color::White)),
            ];
            if is_loading {
                balance_spans.push(Span::styled(
                    "  refreshing...",
                    Style::default().fg(Color::Yellow),
                ));
            } else if stale {
                balance_spans.push(Span::styled(
                    "  (cached)",
                    Style::default().fg(Color::DarkGray),
                ));
            }

            let mut lines = vec![
                Line::from(""),
                Line::from(vec![
                    Span::styled(
                        wallet.label(),
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        format_address(&wallet.address),
                        Style::default().fg(Color::Yellow),
                    ),
                ]),
                Line::from(""),
                Line::from(balance_spans),
                Line::from(vec![
                    Span::styled("ETH price: ", Style::default().fg(Color::DarkGray)),
                    Span::raw(format!("${:.2}", eth_price)),
                ]),
            ];
            if !wallet.can_sign() {
                lines.push(Line::from(Span::styled(
                    "Watch-only: this wallet's keys are not on this device",
                    Style::default().fg(Color::Magenta),
                )));
            }
            lines
        } else {
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    "No wallet. Set one up to get started.",
                    Style::default().fg(Color::Red),
                )),
            ]
        };

        let card = Paragraph::new(card_lines).block(
            Block::default()
                .title("Wallet")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(card, chunks[0]);

        let items: Vec<ListItem> = if recent.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "No transactions yet",
                Style::default().fg(Color::DarkGray),
            )))]
        } else {
            recent
                .iter()
                .map(|tx| {
                    let (amount, color) = tx_amount(tx);
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{:<20}", amount), Style::default().fg(color)),
                        Span::styled(
                            format!("{:<16}", format_address(&tx.address)),
                            Style::default().fg(Color::White),
                        ),
                        Span::styled(
                            format_timestamp(tx.timestamp),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect()
        };
        let list = List::new(items).block(
            Block::default()
                .title("Recent Transactions")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(list, chunks[1]);

        let disclaimer = Paragraph::new(DISCLAIMER)
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(disclaimer, chunks[2]);
    }
}

impl Component for DashboardComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if let KeyCode::Char('r') = key.code {
            if !self.is_loading {
                self.is_loading = true;
                self.action_tx.send(Action::RefreshBalance)?;
            }
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        Self::draw_static(
            f,
            area,
            self.wallet.as_ref(),
            self.balance.as_ref(),
            self.eth_price,
            &self.recent,
            self.is_loading,
        );
    }
}
