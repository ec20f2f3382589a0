//! Account creation screen.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc::UnboundedSender;

use demo_wallet::domain::{session::Route, validation};

use crate::{action::Action, tui::Frame};

use super::{centered_rect, draw_button, draw_input, message_line, Component};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupField {
    Email,
    Username,
    Password,
    Confirm,
    Submit,
    LoginLink,
}

impl SignupField {
    const ORDER: [SignupField; 6] = [
        SignupField::Email,
        SignupField::Username,
        SignupField::Password,
        SignupField::Confirm,
        SignupField::Submit,
        SignupField::LoginLink,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    /// The field a validation error points at.
    fn from_error_field(name: &str) -> Self {
        match name {
            "email" => SignupField::Email,
            "username" => SignupField::Username,
            "password" => SignupField::Password,
            "confirm_password" => SignupField::Confirm,
            _ => SignupField::Email,
        }
    }
}

pub struct SignupComponent {
    action_tx: UnboundedSender<Action>,
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub focused_field: SignupField,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl SignupComponent {
    pub fn new(action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            email: String::new(),
            username: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            focused_field: SignupField::Email,
            is_loading: false,
            error_message: None,
        }
    }

    pub fn reset(&mut self) {
        self.email.clear();
        self.username.clear();
        self.password.clear();
        self.confirm_password.clear();
        self.focused_field = SignupField::Email;
        self.is_loading = false;
        self.error_message = None;
    }

    fn field_mut(&mut self) -> Option<&mut String> {
        match self.focused_field {
            SignupField::Email => Some(&mut self.email),
            SignupField::Username => Some(&mut self.username),
            SignupField::Password => Some(&mut self.password),
            SignupField::Confirm => Some(&mut self.confirm_password),
            _ => None,
        }
    }

    pub fn paste(&mut self, text: &str) {
        if let Some(field) = self.field_mut() {
            field.push_str(text.trim_end_matches(['\r', '\n']));
        }
    }

    fn submit(&mut self) -> Result<()> {
        match validation::validate_signup(
            &self.email,
            &self.username,
            &self.password,
            &self.confirm_password,
        ) {
            Ok(_) => {
                self.is_loading = true;
                self.action_tx.send(Action::Signup)?;
            }
            Err(e) => {
                self.focused_field = SignupField::from_error_field(e.field);
                self.error_message = Some(e.message);
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_static(
        f: &mut Frame,
        area: Rect,
        email: &str,
        username: &str,
        password: &str,
        confirm_password: &str,
        focused_field: SignupField,
        is_loading: bool,
        error_message: Option<&str>,
    ) {
        let area = centered_rect(area, 64, 28);
        f.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Sign Up ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::vertical([
            Constraint::Length(2), // Title
            Constraint::Length(3), // Email
            Constraint::Length(3), // Username
            Constraint::Length(3), // Password
            Constraint::Length(3), // Confirm
            Constraint::Length(1),
            Constraint::Length(1), // Submit
            Constraint::Length(1), // Login link
            Constraint::Length(2), // Message
            Constraint::Min(0),    // Help
        ])
        .split(inner);

        let title = Paragraph::new("Create your account")
            .style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center);
        f.render_widget(title, chunks[0]);

        let inputs = [
            (SignupField::Email, "Email", email, "you@example.com", false),
            (SignupField::Username, "Username", username, "3-30 letters, digits, _ or -", false),
            (SignupField::Password, "Password", password, "At least 12 characters", true),
            (SignupField::Confirm, "Confirm Password", confirm_password, "Repeat password", true),
        ];
        for (i, (field, label, value, placeholder, masked)) in inputs.into_iter().enumerate() {
            draw_input(
                f,
                chunks[i + 1],
                label,
                value,
                placeholder,
                focused_field == field,
                masked,
            );
        }

        draw_button(
            f,
            chunks[6],
            if is_loading { "Creating account..." } else { "Create Account" },
            focused_field == SignupField::Submit,
            Color::Green,
        );
        draw_button(
            f,
            chunks[7],
            "Already registered? Log in",
            focused_field == SignupField::LoginLink,
            Color::Cyan,
        );

        f.render_widget(Paragraph::new(message_line(error_message, None)), chunks[8]);

        let help = Paragraph::new("Password: upper and lower case, a number and a symbol")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(help, chunks[9]);
    }
}

impl Component for SignupComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if self.is_loading {
            return Ok(());
        }
        self.error_message = None;

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focused_field = self.focused_field.next(),
            KeyCode::BackTab | KeyCode::Up => self.focused_field = self.focused_field.prev(),
            KeyCode::Enter => match self.focused_field {
                SignupField::Confirm | SignupField::Submit => self.submit()?,
                SignupField::LoginLink => {
                    self.action_tx.send(Action::Navigate(Route::Login))?;
                }
                _ => self.focused_field = self.focused_field.next(),
            },
            KeyCode::Char(c) => {
                if let Some(field) = self.field_mut() {
                    field.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some(field) = self.field_mut() {
                    field.pop();
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
            &self.email,
            &self.username,
            &self.password,
            &self.confirm_password,
            self.focused_field,
            self.is_loading,
            self.error_message.as_deref(),
        );
    }
}
