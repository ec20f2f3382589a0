//! Profile view and editor.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use tokio::sync::mpsc::UnboundedSender;

use demo_wallet::domain::{models::User, validation};

use crate::{action::Action, tui::Frame};

use super::{draw_input, message_line, Component};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    FirstName,
    LastName,
    Phone,
}

impl ProfileField {
    fn next(self) -> Self {
        match self {
            ProfileField::FirstName => ProfileField::LastName,
            ProfileField::LastName => ProfileField::Phone,
            ProfileField::Phone => ProfileField::FirstName,
        }
    }

    fn prev(self) -> Self {
        match self {
            ProfileField::FirstName => ProfileField::Phone,
            ProfileField::LastName => ProfileField::FirstName,
            ProfileField::Phone => ProfileField::LastName,
        }
    }
}

pub struct ProfileComponent {
    action_tx: UnboundedSender<Action>,
    pub user: Option<User>,
    /// Whether `user` reflects the backend rather than local data only.
    pub synced: bool,
    pub is_editing: bool,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub focused_field: ProfileField,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub success_message: Option<String>,
}

impl ProfileComponent {
    pub fn new(action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            user: None,
            synced: false,
            is_editing: false,
            first_name: String::new(),
            last_name: String::new(),
            phone_number: String::new(),
            focused_field: ProfileField::FirstName,
            is_loading: false,
            error_message: None,
            success_message: None,
        }
    }

    pub fn set_user(&mut self, user: User, synced: bool) {
        self.user = Some(user);
        self.synced = synced;
        self.is_loading = false;
    }

    pub fn start_editing(&mut self) {
        let user = self.user.clone().unwrap_or_default();
        self.first_name = user.first_name.unwrap_or_default();
        self.last_name = user.last_name.unwrap_or_default();
        self.phone_number = user.phone_number.unwrap_or_default();
        self.focused_field = ProfileField::FirstName;
        self.is_editing = true;
        self.error_message = None;
        self.success_message = None;
    }

    pub fn stop_editing(&mut self) {
        self.is_editing = false;
        self.is_loading = false;
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focused_field {
            ProfileField::FirstName => &mut self.first_name,
            ProfileField::LastName => &mut self.last_name,
            ProfileField::Phone => &mut self.phone_number,
        }
    }

    pub fn paste(&mut self, text: &str) {
        if self.is_editing {
            self.field_mut().push_str(text.trim());
        }
    }

    fn submit(&mut self) -> Result<()> {
        match validation::validate_profile(&self.first_name, &self.last_name, &self.phone_number)
        {
            Ok(_) => {
                self.is_loading = true;
                self.action_tx.send(Action::SaveProfile)?;
            }
            Err(e) => {
                self.focused_field = match e.field {
                    "last_name" => ProfileField::LastName,
                    "phone_number" => ProfileField::Phone,
                    _ => ProfileField::FirstName,
                };
                self.error_message = Some(e.message);
            }
        }
        Ok(())
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.is_loading {
            return Ok(());
        }
        self.error_message = None;
        match key.code {
            KeyCode::Esc => self.stop_editing(),
            KeyCode::Tab | KeyCode::Down => self.focused_field = self.focused_field.next(),
            KeyCode::BackTab | KeyCode::Up => self.focused_field = self.focused_field.prev(),
            KeyCode::Enter => {
                if self.focused_field == ProfileField::Phone {
                    self.submit()?;
                } else {
                    self.focused_field = self.focused_field.next();
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
        user: Option<&User>,
        synced: bool,
        is_editing: bool,
        inputs: [&str; 3],
        focused_field: ProfileField,
        is_loading: bool,
        error_message: Option<&str>,
        success_message: Option<&str>,
    ) {
        let chunks = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::DarkGray));
        let value = |v: Option<&str>| match v.filter(|s| !s.is_empty()) {
            Some(s) => Span::styled(s.to_string(), Style::default().fg(Color::White)),
            None => Span::styled("Not set", Style::default().fg(Color::DarkGray)),
        };

        let mut lines = match user {
            Some(u) => vec![
                Line::from(""),
                Line::from(Span::styled(
                    u.display_name(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(vec![label("Email:      "), value(Some(&u.email))]),
                Line::from(vec![label("Username:   "), value(Some(&u.username))]),
                Line::from(vec![label("First name: "), value(u.first_name.as_deref())]),
                Line::from(vec![label("Last name:  "), value(u.last_name.as_deref())]),
                Line::from(vec![label("Phone:      "), value(u.phone_number.as_deref())]),
                Line::from(""),
                Line::from(vec![label("Member since: "), value(u.created_at.as_deref())]),
                Line::from(vec![label("Updated:      "), value(u.updated_at.as_deref())]),
            ],
            None => vec![Line::from(if is_loading {
                "Loading profile..."
            } else {
                "No profile loaded"
            })],
        };
        if user.is_some() && !synced {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Showing local data; the server could not be reached.",
                Style::default().fg(Color::Yellow),
            )));
        }
        if !is_editing {
            lines.push(Line::from(""));
            lines.push(message_line(error_message, success_message));
            lines.push(Line::from(Span::styled(
                "[e] Edit  [r] Reload  [l] Log out",
                Style::default().fg(Color::DarkGray),
            )));
        }

        let view = Paragraph::new(lines).block(
            Block::default()
                .title("Profile")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(view, chunks[0]);

        if !is_editing {
            return;
        }

        let block = Block::default()
            .title("Edit Profile")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(chunks[1]);
        f.render_widget(block, chunks[1]);

        let rows = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .split(inner);

        let fields = [
            (ProfileField::FirstName, "First Name", "Jane"),
            (ProfileField::LastName, "Last Name", "Doe"),
            (ProfileField::Phone, "Phone (optional)", "+1 555 0100"),
        ];
        for (i, (field, name, placeholder)) in fields.into_iter().enumerate() {
            draw_input(
                f,
                rows[i],
                name,
                inputs[i],
                placeholder,
                focused_field == field,
                false,
            );
        }

        let status = if is_loading {
            Line::from(Span::styled("Saving...", Style::default().fg(Color::Yellow)))
        } else {
            message_line(error_message, None)
        };
        f.render_widget(Paragraph::new(status), rows[3]);
        f.render_widget(
            Paragraph::new("[Enter on Phone] Save  [Tab] Next field  [Esc] Cancel")
                .style(Style::default().fg(Color::DarkGray)),
            rows[4],
        );
    }
}

impl Component for ProfileComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if self.is_editing {
            return self.handle_edit_key(key);
        }
        match key.code {
            KeyCode::Char('e') if self.user.is_some() => self.start_editing(),
            KeyCode::Char('r') if !self.is_loading => {
                self.is_loading = true;
                self.action_tx.send(Action::LoadProfile)?;
            }
            KeyCode::Char('l') => self.action_tx.send(Action::Logout)?,
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, f: &mut Frame, area: Rect) {
        Self::draw_static(
            f,
            area,
            self.user.as_ref(),
            self.synced,
            self.is_editing,
            [
                self.first_name.as_str(),
                self.last_name.as_str(),
                self.phone_number.as_str(),
            ],
            self.focused_field,
            self.is_loading,
            self.error_message.as_deref(),
            self.success_message.as_deref(),
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

    fn user() -> User {
        User {
            user_id: "u1".to_string(),
            email: "carol@example.com".to_string(),
            username: "carol".to_string(),
            is_logged_in: true,
            first_name: Some("Carol".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_edit_prefills_and_validates() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut profile = ProfileComponent::new(tx);
        profile.set_user(user(), true);

        profile.handle_key_event(key(KeyCode::Char('e'))).unwrap();
        assert!(profile.is_editing);
        assert_eq!(profile.first_name, "Carol");

        profile.focused_field = ProfileField::Phone;
        profile.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(profile.error_message.as_deref(), Some("Last name is required"));
        assert_eq!(profile.focused_field, ProfileField::LastName);
        assert!(rx.try_recv().is_err());

        profile.paste("Jones");
        profile.focused_field = ProfileField::Phone;
        profile.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(profile.is_loading);
        assert!(matches!(rx.try_recv(), Ok(Action::SaveProfile)));
    }

    #[test]
    fn test_view_keys() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut profile = ProfileComponent::new(tx);

        // Nothing to edit before the profile loads
        profile.handle_key_event(key(KeyCode::Char('e'))).unwrap();
        assert!(!profile.is_editing);

        profile.handle_key_event(key(KeyCode::Char('l'))).unwrap();
        assert!(matches!(rx.try_recv(), Ok(Action::Logout)));
    }
}
