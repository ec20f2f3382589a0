//! Send form and the review/sign modal.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
};
use tokio::sync::mpsc::UnboundedSender;

use demo_wallet::domain::{
    models::{now_millis, Currency, TransferQuote, Wallet},
    session::SendDraft,
    validation,
    wallet::{eth_to_usd, format_address, usd_to_eth},
};

use crate::{action::Action, tui::Frame};

use super::{centered_rect, Component};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendField {
    Recipient,
    Amount,
    Review,
}

/// A quote waiting for the user's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    pub draft: SendDraft,
    pub quote: TransferQuote,
    /// Seconds the quote had left when the modal opened.
    pub window_secs: u64,
}

pub struct SendComponent {
    action_tx: UnboundedSender<Action>,
    pub wallet: Option<Wallet>,
    pub eth_price: f64,
    pub recipient: String,
    pub amount: String,
    pub currency: Currency,
    pub focused_field: SendField,
    pub is_editing: bool,
    /// Waiting for a quote.
    pub is_loading: bool,
    pub review: Option<PendingTransfer>,
    /// Waiting for the signed transfer to be confirmed.
    pub is_sending: bool,
    pub error_message: Option<String>,
    pub success_message: Option<String>,
}

impl SendComponent {
    pub fn new(action_tx: UnboundedSender<Action>, eth_price: f64) -> Self {
        Self {
            action_tx,
            wallet: None,
            eth_price,
            recipient: String::new(),
            amount: String::new(),
            currency: Currency::Eth,
            focused_field: SendField::Recipient,
            is_editing: false,
            is_loading: false,
            review: None,
            is_sending: false,
            error_message: None,
            success_message: None,
        }
    }

    pub fn set_wallet(&mut self, wallet: Option<Wallet>) {
        self.wallet = wallet;
    }

    /// Keys go to the form or the modal instead of the tab bar.
    pub fn captures_input(&self) -> bool {
        self.is_editing || self.review.is_some()
    }

    pub fn clear(&mut self) {
        self.recipient.clear();
        self.amount.clear();
        self.currency = Currency::Eth;
        self.focused_field = SendField::Recipient;
        self.is_editing = false;
        self.is_loading = false;
        self.review = None;
        self.is_sending = false;
        self.error_message = None;
    }

    pub fn open_review(&mut self, draft: SendDraft, quote: TransferQuote) {
        self.is_loading = false;
        self.is_sending = false;
        let window_secs = quote.seconds_left(now_millis());
        self.review = Some(PendingTransfer {
            draft,
            quote,
            window_secs,
        });
    }

    /// Close the review once its quote has run out. Returns whether it did.
    pub fn expire_review(&mut self, now_ms: i64) -> bool {
        let expired = self
            .review
            .as_ref()
            .is_some_and(|r| !self.is_sending && r.quote.is_expired_at(now_ms));
        if expired {
            self.review = None;
            self.error_message = Some("Transaction expired".to_string());
        }
        expired
    }

    /// Amount in the other currency, for display under the input.
    pub fn converted_amount(&self) -> Option<String> {
        let amount = self.amount.trim();
        amount.parse::<f64>().ok().filter(|v| *v > 0.0)?;
        Some(match self.currency {
            Currency::Eth => format!("≈ ${}", eth_to_usd(amount, self.eth_price)),
            Currency::Usd => format!("≈ {} ETH", usd_to_eth(amount, self.eth_price)),
        })
    }

    fn next_field(&mut self) {
        self.focused_field = match self.focused_field {
            SendField::Recipient => SendField::Amount,
            SendField::Amount => SendField::Review,
            SendField::Review => SendField::Recipient,
        };
    }

    fn prev_field(&mut self) {
        self.focused_field = match self.focused_field {
            SendField::Recipient => SendField::Review,
            SendField::Amount => SendField::Recipient,
            SendField::Review => SendField::Amount,
        };
    }

    fn handle_char(&mut self, c: char) {
        match self.focused_field {
            SendField::Recipient => self.recipient.push(c),
            SendField::Amount if c.is_ascii_digit() || c == '.' => self.amount.push(c),
            _ => {}
        }
    }

    fn handle_backspace(&mut self) {
        match self.focused_field {
            SendField::Recipient => {
                self.recipient.pop();
            }
            SendField::Amount => {
                self.amount.pop();
            }
            SendField::Review => {}
        }
    }

    pub fn paste(&mut self, text: &str) {
        let text = text.trim();
        match self.focused_field {
            SendField::Recipient => self.recipient.push_str(text),
            SendField::Amount => self
                .amount
                .extend(text.chars().filter(|c| c.is_ascii_digit() || *c == '.')),
            SendField::Review => {}
        }
    }

    fn request_review(&mut self) -> Result<()> {
        if self.is_loading {
            return Ok(());
        }
        // Amount rules apply in either currency
        match validation::validate_send(&self.recipient, &self.amount) {
            Ok(_) => {
                self.is_loading = true;
                self.success_message = None;
                self.action_tx.send(Action::ReviewSend)?;
            }
            Err(e) => {
                self.focused_field = if e.field == "recipient" {
                    SendField::Recipient
                } else {
                    SendField::Amount
                };
                self.error_message = Some(e.message);
            }
        }
        Ok(())
    }

    fn handle_review_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.is_sending {
            return Ok(());
        }
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                self.is_sending = true;
                self.action_tx.send(Action::ConfirmSend)?;
            }
            KeyCode::Esc | KeyCode::Char('n') => {
                self.review = None;
                self.action_tx.send(Action::CancelSend)?;
            }
            _ => {}
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_static(
        f: &mut Frame,
        area: Rect,
        wallet: Option<&Wallet>,
        recipient: &str,
        amount: &str,
        currency: Currency,
        converted: Option<&str>,
        focused_field: SendField,
        is_editing: bool,
        is_loading: bool,
        error_message: Option<&str>,
        success_message: Option<&str>,
    ) {
        let chunks = Layout::vertical([
            Constraint::Length(4), // Wallet info
            Constraint::Length(4), // Recipient
            Constraint::Length(5), // Amount
            Constraint::Length(4), // Review button
            Constraint::Min(5),    // Status/help
        ])
        .split(area);

        let wallet_info = if let Some(w) = wallet {
            let mut spans = vec![
                Span::styled("From: ", Style::default().fg(Color::DarkGray)),
                Span::styled(w.label(), Style::default().fg(Color::White)),
                Span::raw(" "),
                Span::styled(format_address(&w.address), Style::default().fg(Color::Yellow)),
                Span::raw("  |  "),
                Span::styled("Available: ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{} ETH", w.balance),
                    Style::default().fg(Color::Green),
                ),
            ];
            if !w.can_sign() {
                spans.push(Span::styled(
                    "  (watch-only)",
                    Style::default().fg(Color::Magenta),
                ));
            }
            vec![Line::from(""), Line::from(spans)]
        } else {
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    "No wallet selected.",
                    Style::default().fg(Color::Red),
                )),
            ]
        };
        let wallet_widget = Paragraph::new(wallet_info).block(
            Block::default()
                .title("Send From")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(wallet_widget, chunks[0]);

        let field_style = |field: SendField| {
            if focused_field == field {
                if is_editing {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::Cyan)
                }
            } else {
                Style::default().fg(Color::White)
            }
        };
        let border_style = |field: SendField| {
            if focused_field == field {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            }
        };
        let input_text = |value: &str, field: SendField, placeholder: &str| {
            let mut text = if value.is_empty() && focused_field != field {
                placeholder.to_string()
            } else {
                value.to_string()
            };
            if is_editing && focused_field == field {
                text.push('│');
            }
            text
        };

        let recipient_widget = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                input_text(recipient, SendField::Recipient, "0x... recipient address"),
                field_style(SendField::Recipient),
            )),
        ])
        .block(
            Block::default()
                .title(if focused_field == SendField::Recipient {
                    "> Recipient Address"
                } else {
                    "  Recipient Address"
                })
                .borders(Borders::ALL)
                .border_style(border_style(SendField::Recipient)),
        );
        f.render_widget(recipient_widget, chunks[1]);

        let amount_widget = Paragraph::new(vec![
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    input_text(amount, SendField::Amount, "0.0"),
                    field_style(SendField::Amount),
                ),
                Span::raw(" "),
                Span::styled(
                    currency.to_string(),
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(Span::styled(
                converted.unwrap_or_default().to_string(),
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(
            Block::default()
                .title(if focused_field == SendField::Amount {
                    "> Amount  [t] toggle ETH/USD"
                } else {
                    "  Amount"
                })
                .borders(Borders::ALL)
                .border_style(border_style(SendField::Amount)),
        );
        f.render_widget(amount_widget, chunks[2]);

        let review_style = if focused_field == SendField::Review {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green)
        };
        let review_widget = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                if is_loading {
                    "  [ Requesting quote... ]  "
                } else {
                    "  [ Review Transfer ]  "
                },
                review_style,
            )),
        ])
        .block(
            Block::default()
                .title(if focused_field == SendField::Review {
                    "> Review"
                } else {
                    "  Review"
                })
                .borders(Borders::ALL)
                .border_style(border_style(SendField::Review)),
        );
        f.render_widget(review_widget, chunks[3]);

        let mut status_lines = vec![Line::from("")];
        if let Some(err) = error_message {
            status_lines.push(Line::from(Span::styled(
                format!("Error: {}", err),
                Style::default().fg(Color::Red),
            )));
        } else if let Some(success) = success_message {
            status_lines.push(Line::from(Span::styled(
                success,
                Style::default().fg(Color::Green),
            )));
        }
        status_lines.push(Line::from(""));
        status_lines.push(Line::from(Span::styled(
            if is_editing {
                "[Esc] Stop editing  [Tab/↓] Next field  [Shift+Tab/↑] Prev field"
            } else {
                "[Enter/e] Edit field  [Tab/↓] Next field  [t] ETH/USD  [c] Clear  [Enter on Review] Get quote"
            },
            Style::default().fg(Color::DarkGray),
        )));
        let status_widget = Paragraph::new(status_lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title("Help")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status_widget, chunks[4]);
    }

    /// The review modal, drawn over the form.
    pub fn draw_review(
        f: &mut Frame,
        area: Rect,
        review: &PendingTransfer,
        is_sending: bool,
    ) {
        let area = centered_rect(area, 70, 18);
        f.render_widget(Clear, area);

        let block = Block::default()
            .title(" Confirm Transfer ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::vertical([
            Constraint::Min(9),    // Summary
            Constraint::Length(1), // Countdown
            Constraint::Length(1),
            Constraint::Length(2), // Keys
        ])
        .split(inner);

        let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::DarkGray));
        let summary = Paragraph::new(vec![
            Line::from(vec![label("To:     "), Span::raw(review.draft.recipient.clone())]),
            Line::from(vec![
                label("Amount: "),
                Span::styled(
                    format!("{} ETH", review.quote.eth_amount),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("  (≈ ${} USD)", review.quote.usd_amount)),
            ]),
            Line::from(""),
            Line::from(label("Message to sign:")),
            Line::from(Span::styled(
                review.quote.message.clone(),
                Style::default().fg(Color::White),
            )),
            Line::from(""),
            Line::from(vec![label("Hash: "), Span::raw(review.quote.message_hash.clone())]),
        ])
        .wrap(Wrap { trim: false });
        f.render_widget(summary, chunks[0]);

        let left = review.quote.seconds_left(now_millis());
        let ratio = if review.window_secs == 0 {
            0.0
        } else {
            (left as f64 / review.window_secs as f64).clamp(0.0, 1.0)
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(if left <= 10 {
                Color::Red
            } else {
                Color::Green
            }))
            .ratio(ratio)
            .label(format!("Expires in {}s", left));
        f.render_widget(gauge, chunks[1]);

        let keys = Paragraph::new(if is_sending {
            Line::from(Span::styled(
                "Signing and sending...",
                Style::default().fg(Color::Yellow),
            ))
        } else {
            Line::from(vec![
                Span::styled("[Enter/y] ", Style::default().fg(Color::Green)),
                Span::raw("Sign & Send    "),
                Span::styled("[Esc/n] ", Style::default().fg(Color::Red)),
                Span::raw("Cancel"),
            ])
        })
        .alignment(Alignment::Center);
        f.render_widget(keys, chunks[3]);
    }
}

impl Component for SendComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if self.review.is_some() {
            return self.handle_review_key(key);
        }
        self.error_message = None;

        let on_input_field =
            self.focused_field == SendField::Recipient || self.focused_field == SendField::Amount;

        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.is_editing = false;
                self.next_field();
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.is_editing = false;
                self.prev_field();
            }
            KeyCode::Esc => {
                self.is_editing = false;
            }
            KeyCode::Enter => {
                if self.focused_field == SendField::Review {
                    self.request_review()?;
                } else if on_input_field {
                    self.is_editing = !self.is_editing;
                }
            }
            KeyCode::Char(c) => {
                if self.is_editing && on_input_field {
                    self.handle_char(c);
                } else if !self.is_editing {
                    match c {
                        'j' => self.next_field(),
                        'k' => self.prev_field(),
                        'c' => self.clear(),
                        't' => self.currency = self.currency.toggle(),
                        'e' if on_input_field => self.is_editing = true,
                        _ => {}
                    }
                }
            }
            KeyCode::Backspace => {
                if self.is_editing && on_input_field {
                    self.handle_backspace();
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let converted = self.converted_amount();
        Self::draw_static(
            f,
            area,
            self.wallet.as_ref(),
            &self.recipient,
            &self.amount,
            self.currency,
            converted.as_deref(),
            self.focused_field,
            self.is_editing,
            self.is_loading,
            self.error_message.as_deref(),
            self.success_message.as_deref(),
        );
        if let Some(review) = &self.review {
            Self::draw_review(f, area, review, self.is_sending);
        }
    }
}
