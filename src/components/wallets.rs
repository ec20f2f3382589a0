//! Wallets registered with the backend: list, create, import, select.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tokio::sync::mpsc::UnboundedSender;

use demo_wallet::domain::{models::RemoteWallet, validation, wallet::format_address};

use crate::{action::Action, tui::Frame};

use super::{centered_rect, draw_input, message_line, Component};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletsMode {
    List,
    Create,
    Import,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletField {
    Name,
    Phrase,
}

pub struct WalletsComponent {
    action_tx: UnboundedSender<Action>,
    pub wallets: Vec<RemoteWallet>,
    pub selected_index: usize,
    /// Address of the active wallet, to mark it in the list.
    pub active_address: Option<String>,
    pub eth_price: f64,
    pub mode: WalletsMode,
    pub name_input: String,
    pub phrase_input: String,
    pub focused_field: WalletField,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl WalletsComponent {
    pub fn new(action_tx: UnboundedSender<Action>, eth_price: f64) -> Self {
        Self {
            action_tx,
            wallets: Vec::new(),
            selected_index: 0,
            active_address: None,
            eth_price,
            mode: WalletsMode::List,
            name_input: String::new(),
            phrase_input: String::new(),
            focused_field: WalletField::Name,
            is_loading: false,
            error_message: None,
        }
    }

    pub fn set_wallets(&mut self, wallets: Vec<RemoteWallet>) {
        self.wallets = wallets;
        if self.selected_index >= self.wallets.len() {
            self.selected_index = self.wallets.len().saturating_sub(1);
        }
        self.is_loading = false;
    }

    pub fn captures_input(&self) -> bool {
        self.mode != WalletsMode::List
    }

    /// Back to the list, dropping any half-filled form.
    pub fn close_form(&mut self) {
        self.mode = WalletsMode::List;
        self.name_input.clear();
        self.phrase_input.clear();
        self.focused_field = WalletField::Name;
        self.is_loading = false;
        self.error_message = None;
    }

    fn open_form(&mut self, mode: WalletsMode) {
        self.close_form();
        self.mode = mode;
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focused_field {
            WalletField::Name => &mut self.name_input,
            WalletField::Phrase => &mut self.phrase_input,
        }
    }

    pub fn paste(&mut self, text: &str) {
        if self.captures_input() {
            self.field_mut().push_str(text);
        }
    }

    fn submit(&mut self) -> Result<()> {
        if let Err(e) = validation::validate_wallet_name(&self.name_input) {
            self.focused_field = WalletField::Name;
            self.error_message = Some(e.message);
            return Ok(());
        }
        match self.mode {
            WalletsMode::Create => {
                self.is_loading = true;
                self.action_tx.send(Action::CreateRemoteWallet)?;
            }
            WalletsMode::Import => match validation::validate_mnemonic(&self.phrase_input) {
                Ok(_) => {
                    self.is_loading = true;
                    self.action_tx.send(Action::ImportRemoteWallet)?;
                }
                Err(e) => {
                    self.focused_field = WalletField::Phrase;
                    self.error_message = Some(e.message);
                }
            },
            WalletsMode::List => {}
        }
        Ok(())
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.is_loading {
            return Ok(());
        }
        self.error_message = None;
        match key.code {
            KeyCode::Esc => self.close_form(),
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
                if self.mode == WalletsMode::Import {
                    self.focused_field = match self.focused_field {
                        WalletField::Name => WalletField::Phrase,
                        WalletField::Phrase => WalletField::Name,
                    };
                }
            }
            KeyCode::Enter => {
                if self.mode == WalletsMode::Import && self.focused_field == WalletField::Name {
                    self.focused_field = WalletField::Phrase;
                } else {
                    self.submit()?;
                }
            }
            KeyCode::Char(c) => self.field_mut().push(c),
            KeyCode::Backspace => {
                self.field_mut().pop();
            }
            _ => {}
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_static(
        f: &mut Frame,
        area: Rect,
        wallets: &[RemoteWallet],
        selected_index: usize,
        active_address: Option<&str>,
        eth_price: f64,
        is_loading: bool,
        error_message: Option<&str>,
    ) {
        let chunks = Layout::vertical([
            Constraint::Min(6),    // List
            Constraint::Length(5), // Help
        ])
        .split(area);

        let items: Vec<ListItem> = wallets
            .iter()
            .map(|w| {
                let is_active =
                    active_address.is_some_and(|a| a.eq_ignore_ascii_case(&w.address));
                let marker = if is_active { "● " } else { "  " };
                let mut spans = vec![
                    Span::styled(marker, Style::default().fg(Color::Green)),
                    Span::styled(
                        format!("{:<20}", w.wallet_name),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled(
                        format!("{:<16}", format_address(&w.address)),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(
                        format!("{:>12.4} ETH", w.balance),
                        Style::default().fg(Color::Green),
                    ),
                    Span::styled(
                        format!("  ${:>10.2}", w.balance * eth_price),
                        Style::default().fg(Color::DarkGray),
                    ),
                ];
                if w.is_primary {
                    spans.push(Span::styled(
                        "  [primary]",
                        Style::default().fg(Color::Cyan),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let mut list_state = ListState::default();
        if !wallets.is_empty() {
            list_state.select(Some(selected_index));
        }

        let title = if is_loading {
            "Wallets (loading...)".to_string()
        } else {
            format!("Wallets ({})  ETH ${:.2}", wallets.len(), eth_price)
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
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

        let mut help = vec![message_line(error_message, None)];
        if wallets.is_empty() && !is_loading {
            help.push(Line::from(Span::styled(
                "No wallets registered yet.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        help.push(Line::from(Span::styled(
            "[↑/↓] Navigate  [Enter] Use wallet  [n] New  [i] Import  [r] Reload",
            Style::default().fg(Color::DarkGray),
        )));
        let help_widget = Paragraph::new(help).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(help_widget, chunks[1]);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_form(
        f: &mut Frame,
        area: Rect,
        mode: WalletsMode,
        name_input: &str,
        phrase_input: &str,
        focused_field: WalletField,
        is_loading: bool,
        error_message: Option<&str>,
    ) {
        let height = if mode == WalletsMode::Import { 15 } else { 11 };
        let area = centered_rect(area, 72, height);
        f.render_widget(Clear, area);

        let block = Block::default()
            .title(if mode == WalletsMode::Import {
                " Import Wallet "
            } else {
                " New Wallet "
            })
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::vertical([
            Constraint::Length(3), // Name
            Constraint::Length(if mode == WalletsMode::Import { 4 } else { 0 }),
            Constraint::Length(2), // Message
            Constraint::Min(1),    // Help
        ])
        .split(inner);

        draw_input(
            f,
            chunks[0],
            "Wallet Name",
            name_input,
            "e.g. Savings",
            focused_field == WalletField::Name,
            false,
        );
        if mode == WalletsMode::Import {
            draw_input(
                f,
                chunks[1],
                "Recovery Phrase",
                phrase_input,
                "12 or 24 words",
                focused_field == WalletField::Phrase,
                false,
            );
        }

        let status = if is_loading {
            Line::from(Span::styled(
                "Registering wallet...",
                Style::default().fg(Color::Yellow),
            ))
        } else {
            message_line(error_message, None)
        };
        f.render_widget(Paragraph::new(status), chunks[2]);

        let help = Paragraph::new("[Enter] Save  [Tab] Next field  [Esc] Cancel")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(help, chunks[3]);
    }
}

impl Component for WalletsComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if self.captures_input() {
            return self.handle_form_key(key);
        }
        self.error_message = None;

        match key.code {
            KeyCode::Down | KeyCode::Char('j') if !self.wallets.is_empty() => {
                self.selected_index = (self.selected_index + 1) % self.wallets.len();
            }
            KeyCode::Up | KeyCode::Char('k') if !self.wallets.is_empty() => {
                let len = self.wallets.len();
                self.selected_index = (self.selected_index + len - 1) % len;
            }
            KeyCode::Enter if self.selected_index < self.wallets.len() => {
                self.action_tx.send(Action::SelectWallet(self.selected_index))?;
            }
            KeyCode::Char('n') => self.open_form(WalletsMode::Create),
            KeyCode::Char('i') => self.open_form(WalletsMode::Import),
            KeyCode::Char('r') if !self.is_loading => {
                self.is_loading = true;
                self.action_tx.send(Action::LoadWallets)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        Self::draw_static(
            f,
            area,
            &self.wallets,
            self.selected_index,
            self.active_address.as_deref(),
            self.eth_price,
            self.is_loading && !self.captures_input(),
            self.error_message.as_deref().filter(|_| !self.captures_input()),
        );
        if self.captures_input() {
            Self::draw_form(
                f,
                area,
                self.mode,
                &self.name_input,
                &self.phrase_input,
                self.focused_field,
                self.is_loading,
                self.error_message.as_deref(),
            );
        }
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

    fn remote(name: &str) -> RemoteWallet {
        RemoteWallet {
            id: name.to_string(),
            address: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
            balance: 1.5,
            wallet_name: name.to_string(),
            is_primary: false,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_select_sends_index() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut wallets = WalletsComponent::new(tx, 2500.0);
        wallets.set_wallets(vec![remote("a"), remote("b")]);

        wallets.handle_key_event(key(KeyCode::Down)).unwrap();
        wallets.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(rx.try_recv(), Ok(Action::SelectWallet(1))));
    }

    #[test]
    fn test_create_requires_name() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut wallets = WalletsComponent::new(tx, 2500.0);

        wallets.handle_key_event(key(KeyCode::Char('n'))).unwrap();
        assert!(wallets.captures_input());
        wallets.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(wallets.error_message.as_deref(), Some("Wallet name is required"));

        // 'n' is text inside the form
        for c in "nest egg".chars() {
            wallets.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
        wallets.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(wallets.name_input, "nest egg");
        assert!(matches!(rx.try_recv(), Ok(Action::CreateRemoteWallet)));
    }

    #[test]
    fn test_import_moves_to_phrase() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut wallets = WalletsComponent::new(tx, 2500.0);
        wallets.handle_key_event(key(KeyCode::Char('i'))).unwrap();
        wallets.paste("Old");
        wallets.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(wallets.focused_field, WalletField::Phrase);

        wallets.paste("one two three");
        wallets.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(
            wallets.error_message.as_deref(),
            Some("Mnemonic must be 12 or 24 words")
        );
        assert!(rx.try_recv().is_err());

        wallets.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(!wallets.captures_input());
        assert!(wallets.phrase_input.is_empty());
    }
}
