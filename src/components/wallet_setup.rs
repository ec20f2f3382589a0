//! Wallet setup for users without an active wallet: generate or import.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tokio::sync::mpsc::UnboundedSender;

use demo_wallet::domain::{models::Wallet, validation};

use crate::{action::Action, tui::Frame};

use super::{Component, DISCLAIMER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupMode {
    Menu,
    /// A freshly generated wallet waiting for the user to back it up.
    ShowPhrase,
    ImportPhrase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    CreateNew,
    Import,
    Logout,
}

impl MenuItem {
    fn next(self) -> Self {
        match self {
            MenuItem::CreateNew => MenuItem::Import,
            MenuItem::Import => MenuItem::Logout,
            MenuItem::Logout => MenuItem::CreateNew,
        }
    }

    fn prev(self) -> Self {
        match self {
            MenuItem::CreateNew => MenuItem::Logout,
            MenuItem::Import => MenuItem::CreateNew,
            MenuItem::Logout => MenuItem::Import,
        }
    }
}

pub struct WalletSetupComponent {
    action_tx: UnboundedSender<Action>,
    pub mode: SetupMode,
    pub selected_menu: MenuItem,
    /// Generated but not yet saved.
    pub pending_wallet: Option<Wallet>,
    pub phrase_input: String,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl WalletSetupComponent {
    pub fn new(action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            mode: SetupMode::Menu,
            selected_menu: MenuItem::CreateNew,
            pending_wallet: None,
            phrase_input: String::new(),
            is_loading: false,
            error_message: None,
        }
    }

    pub fn reset(&mut self) {
        self.mode = SetupMode::Menu;
        self.selected_menu = MenuItem::CreateNew;
        self.pending_wallet = None;
        self.phrase_input.clear();
        self.is_loading = false;
        self.error_message = None;
    }

    pub fn show_generated(&mut self, wallet: Wallet) {
        self.pending_wallet = Some(wallet);
        self.mode = SetupMode::ShowPhrase;
        self.error_message = None;
    }

    pub fn paste(&mut self, text: &str) {
        if self.mode == SetupMode::ImportPhrase {
            self.phrase_input.push_str(text);
            self.error_message = None;
        }
    }

    fn handle_enter(&mut self) -> Result<()> {
        self.error_message = None;
        match self.mode {
            SetupMode::Menu => match self.selected_menu {
                MenuItem::CreateNew => self.action_tx.send(Action::GenerateWallet)?,
                MenuItem::Import => self.mode = SetupMode::ImportPhrase,
                MenuItem::Logout => self.action_tx.send(Action::Logout)?,
            },
            SetupMode::ShowPhrase => {
                self.is_loading = true;
                self.action_tx.send(Action::SaveGeneratedWallet)?;
            }
            SetupMode::ImportPhrase => match validation::validate_mnemonic(&self.phrase_input) {
                Ok(_) => {
                    self.is_loading = true;
                    self.action_tx.send(Action::ImportWallet)?;
                }
                Err(e) => self.error_message = Some(e.message),
            },
        }
        Ok(())
    }

    fn handle_escape(&mut self) {
        match self.mode {
            SetupMode::Menu => {}
            SetupMode::ShowPhrase | SetupMode::ImportPhrase => self.reset(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_static(
        f: &mut Frame,
        area: Rect,
        mode: SetupMode,
        selected_menu: MenuItem,
        pending_wallet: Option<&Wallet>,
        phrase_input: &str,
        is_loading: bool,
        error_message: Option<&str>,
    ) {
        f.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Wallet Setup ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::vertical([
            Constraint::Length(3), // Title
            Constraint::Min(10),   // Content
            Constraint::Length(2), // Disclaimer
            Constraint::Length(2), // Status/error
            Constraint::Length(2), // Help
        ])
        .split(inner);

        let title = match mode {
            SetupMode::Menu => "Set Up Your Wallet",
            SetupMode::ShowPhrase => "New Wallet - Save Your Recovery Phrase",
            SetupMode::ImportPhrase => "Import Wallet - Enter Recovery Phrase",
        };
        let title_para = Paragraph::new(title)
            .style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center);
        f.render_widget(title_para, chunks[0]);

        match mode {
            SetupMode::Menu => Self::draw_menu(f, chunks[1], selected_menu),
            SetupMode::ShowPhrase => {
                if let Some(wallet) = pending_wallet {
                    Self::draw_phrase(f, chunks[1], wallet);
                }
            }
            SetupMode::ImportPhrase => Self::draw_phrase_input(f, chunks[1], phrase_input),
        }

        let disclaimer = Paragraph::new(DISCLAIMER)
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(disclaimer, chunks[2]);

        let status = if let Some(err) = error_message {
            Paragraph::new(err).style(Style::default().fg(Color::Red))
        } else if is_loading {
            Paragraph::new("Setting up wallet...").style(Style::default().fg(Color::Yellow))
        } else {
            Paragraph::new("")
        };
        f.render_widget(status.alignment(Alignment::Center), chunks[3]);

        let help = match mode {
            SetupMode::Menu => "↑/↓: Navigate  Enter: Select  q: Quit",
            SetupMode::ShowPhrase => "Enter: I have saved my phrase  Esc: Back",
            SetupMode::ImportPhrase => "Enter: Import  Esc: Back  Paste supported",
        };
        let help_para = Paragraph::new(help)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(help_para, chunks[4]);
    }

    fn draw_menu(f: &mut Frame, area: Rect, selected: MenuItem) {
        let items = [
            (
                MenuItem::CreateNew,
                "Create New Wallet",
                "Generate a new 12-word recovery phrase",
            ),
            (
                MenuItem::Import,
                "Import Existing Wallet",
                "Restore from a 12 or 24-word recovery phrase",
            ),
            (MenuItem::Logout, "Log Out", "Return to the login screen"),
        ];

        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

        for (i, (item, label, desc)) in items.iter().enumerate() {
            let is_selected = *item == selected;
            let style = if is_selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let prefix = if is_selected { "▶ " } else { "  " };
            let text = vec![
                Line::from(Span::styled(format!("{}{}", prefix, label), style)),
                Line::from(Span::styled(
                    format!("    {}", desc),
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            f.render_widget(Paragraph::new(text), chunks[i + 1]);
        }
    }

    fn draw_phrase(f: &mut Frame, area: Rect, wallet: &Wallet) {
        let words: Vec<&str> = wallet
            .mnemonic
            .as_deref()
            .map(|m| m.split_whitespace().collect())
            .unwrap_or_default();
        let rows = words.len().div_ceil(4).max(1) as u16;

        let chunks = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(rows + 1),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

        let warning = Paragraph::new(
            "Write down these words in order and keep them offline. They are the only way to recover this wallet.",
        )
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: true });
        f.render_widget(warning, chunks[0]);

        let col_chunks = Layout::horizontal([Constraint::Percentage(25); 4]).split(chunks[1]);
        for (col, col_area) in col_chunks.iter().enumerate() {
            let lines: Vec<Line> = (0..rows as usize)
                .filter_map(|row| {
                    let idx = row * 4 + col;
                    words
                        .get(idx)
                        .map(|w| Line::from(format!("{:2}. {}", idx + 1, w)))
                })
                .collect();
            f.render_widget(
                Paragraph::new(lines).style(Style::default().fg(Color::Green)),
                *col_area,
            );
        }

        let address = Paragraph::new(vec![
            Line::from(Span::styled("Address:", Style::default().fg(Color::DarkGray))),
            Line::from(Span::styled(
                wallet.address.clone(),
                Style::default().fg(Color::Cyan),
            )),
        ]);
        f.render_widget(address, chunks[2]);
    }

    fn draw_phrase_input(f: &mut Frame, area: Rect, input: &str) {
        let chunks = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(4),
            Constraint::Length(2),
        ])
        .split(area);

        let instructions = Paragraph::new("Enter your recovery phrase (space-separated):")
            .style(Style::default().fg(Color::White));
        f.render_widget(instructions, chunks[0]);

        let word_count = input.split_whitespace().count();
        let complete = word_count == 12 || word_count == 24;
        let input_block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if complete {
                Color::Green
            } else {
                Color::Yellow
            }))
            .title(format!(" Recovery Phrase ({} words) ", word_count));

        let input_para = Paragraph::new(format!("{}│", input))
            .style(Style::default().fg(Color::White))
            .block(input_block)
            .wrap(Wrap { trim: false });
        f.render_widget(input_para, chunks[1]);

        let hint = Paragraph::new("12 or 24 lowercase words")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(hint, chunks[2]);
    }
}

impl Component for WalletSetupComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if self.is_loading {
            return Ok(());
        }

        match key.code {
            KeyCode::Enter => self.handle_enter()?,
            KeyCode::Esc => self.handle_escape(),
            KeyCode::Up if self.mode == SetupMode::Menu => {
                self.selected_menu = self.selected_menu.prev();
            }
            KeyCode::Down if self.mode == SetupMode::Menu => {
                self.selected_menu = self.selected_menu.next();
            }
            KeyCode::Char(c) => match self.mode {
                SetupMode::Menu => match c {
                    'k' => self.selected_menu = self.selected_menu.prev(),
                    'j' => self.selected_menu = self.selected_menu.next(),
                    'q' => self.action_tx.send(Action::Quit)?,
                    _ => {}
                },
                SetupMode::ImportPhrase => {
                    self.phrase_input.push(c);
                    self.error_message = None;
                }
                SetupMode::ShowPhrase => {}
            },
            KeyCode::Backspace if self.mode == SetupMode::ImportPhrase => {
                self.phrase_input.pop();
                self.error_message = None;
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        Self::draw_static(
            f,
            area,
            self.mode,
            self.selected_menu,
            self.pending_wallet.as_ref(),
            &self.phrase_input,
            self.is_loading,
            self.error_message.as_deref(),
        );
    }
}
