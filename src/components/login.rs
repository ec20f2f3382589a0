//! Login screen.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc::UnboundedSender;

use demo_wallet::domain::{session::Route, validation};

use crate::{action::Action, tui::Frame};

use super::{centered_rect, draw_button, draw_input, message_line, Component};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
    Submit,
    SignupLink,
}

impl LoginField {
    fn next(self) -> Self {
        match self {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Submit,
            LoginField::Submit => LoginField::SignupLink,
            LoginField::SignupLink => LoginField::Email,
        }
    }

    fn prev(self) -> Self {
        match self {
            LoginField::Email => LoginField::SignupLink,
            LoginField::Password => LoginField::Email,
            LoginField::Submit => LoginField::Password,
            LoginField::SignupLink => LoginField::Submit,
        }
    }
}

pub struct LoginComponent {
    action_tx: UnboundedSender<Action>,
    pub email: String,
    pub password: String,
    pub focused_field: LoginField,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

impl LoginComponent {
    pub fn new(action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            email: String::new(),
            password: String::new(),
            focused_field: LoginField::Email,
            is_loading: false,
            error_message: None,
        }
    }

    /// Forget the password, keep the email for the next attempt.
    pub fn reset(&mut self) {
        self.password.clear();
        self.focused_field = if self.email.is_empty() {
            LoginField::Email
        } else {
            LoginField::Password
        };
        self.is_loading = false;
        self.error_message = None;
    }

    fn field_mut(&mut self) -> Option<&mut String> {
        match self.focused_field {
            LoginField::Email => Some(&mut self.email),
            LoginField::Password => Some(&mut self.password),
            _ => None,
        }
    }

    pub fn paste(&mut self, text: &str) {
        if let Some(field) = self.field_mut() {
            field.push_str(text.trim_end_matches(['\r', '\n']));
        }
    }

    fn submit(&mut self) -> Result<()> {
        match validation::validate_login(&self.email, &self.password) {
            Ok(_) => {
                self.is_loading = true;
                self.action_tx.send(Action::Login)?;
            }
            Err(e) => self.error_message = Some(e.message),
        }
        Ok(())
    }

    pub fn draw_static(
        f: &mut Frame,
        area: Rect,
        email: &str,
        password: &str,
        focused_field: LoginField,
        is_loading: bool,
        error_message: Option<&str>,
    ) {
        let area = centered_rect(area, 64, 22);
        f.render_widget(Clear, area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Log In ");
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::vertical([
            Constraint::Length(2), // Title
            Constraint::Length(3), // Email
            Constraint::Length(3), // Password
            Constraint::Length(1),
            Constraint::Length(1), // Submit
            Constraint::Length(1), // Signup link
            Constraint::Length(2), // Message
            Constraint::Min(0),    // Help
        ])
        .split(inner);

        let title = Paragraph::new("Welcome back")
            .style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center);
        f.render_widget(title, chunks[0]);

        draw_input(
            f,
            chunks[1],
            "Email",
            email,
            "you@example.com",
            focused_field == LoginField::Email,
            false,
        );
        draw_input(
            f,
            chunks[2],
            "Password",
            password,
            "Your password",
            focused_field == LoginField::Password,
            true,
        );

        draw_button(
            f,
            chunks[4],
            if is_loading { "Logging in..." } else { "Log In" },
            focused_field == LoginField::Submit,
            Color::Green,
        );
        draw_button(
            f,
            chunks[5],
            "No account? Sign up",
            focused_field == LoginField::SignupLink,
            Color::Cyan,
        );

        f.render_widget(Paragraph::new(message_line(error_message, None)), chunks[6]);

        let help = Paragraph::new(Line::from(
            "Tab/↓: Next field  Enter: Continue  Ctrl+C: Quit",
        ))
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
        f.render_widget(help, chunks[7]);
    }
}

impl Component for LoginComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if self.is_loading {
            return Ok(());
        }
        self.error_message = None;

        match key.code {
            KeyCode::Tab | KeyCode::Down => self.focused_field = self.focused_field.next(),
            KeyCode::BackTab | KeyCode::Up => self.focused_field = self.focused_field.prev(),
            KeyCode::Enter => match self.focused_field {
                LoginField::Email => self.focused_field = LoginField::Password,
                LoginField::Password | LoginField::Submit => self.submit()?,
                LoginField::SignupLink => {
                    self.action_tx.send(Action::Navigate(Route::Signup))?;
                }
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
            &self.password,
            self.focused_field,
            self.is_loading,
            self.error_message.as_deref(),
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

    fn type_str(c: &mut LoginComponent, s: &str) {
        for ch in s.chars() {
            c.handle_key_event(key(KeyCode::Char(ch))).unwrap();
        }
    }

    #[test]
    fn test_submit_sends_login() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut login = LoginComponent::new(tx);

        type_str(&mut login, "alice@example.com");
        login.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(login.focused_field, LoginField::Password);
        type_str(&mut login, "hunter2");
        login.handle_key_event(key(KeyCode::Enter)).unwrap();

        assert!(login.is_loading);
        assert!(matches!(rx.try_recv(), Ok(Action::Login)));
    }

    #[test]
    fn test_invalid_email_is_reported() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut login = LoginComponent::new(tx);

        type_str(&mut login, "not-an-email");
        login.focused_field = LoginField::Submit;
        login.handle_key_event(key(KeyCode::Enter)).unwrap();

        assert_eq!(login.error_message.as_deref(), Some("Invalid email address"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_signup_link() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut login = LoginComponent::new(tx);
        login.handle_key_event(key(KeyCode::BackTab)).unwrap();
        assert_eq!(login.focused_field, LoginField::SignupLink);
        login.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(matches!(
            rx.try_recv(),
            Ok(Action::Navigate(Route::Signup))
        ));
    }
}
