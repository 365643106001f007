//! # Header Component
//!
//! Two-line banner at the top of the screen.
//!
//! ```text
//! Legal Assistant 🇵🇱                      Anna Nowak (anna@example.com)
//! Ask questions about Polish legal matters   Thinking...
//! ```
//!
//! The right-hand side reflects the auth adapter: a loading note while it
//! settles, the signed-in profile, or a hint for signing in. A pending
//! device login replaces the hint with the code to enter. The status message
//! sits under it.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::auth::{AuthState, DeviceCode};
use crate::tui::component::Component;

pub const TITLE: &str = "Legal Assistant 🇵🇱";
pub const SUBTITLE: &str = "Ask questions about Polish legal matters";

pub struct Header<'a> {
    pub auth: &'a AuthState,
    pub pending_login: Option<&'a DeviceCode>,
    pub status_message: &'a str,
    /// Shown when the client is not talking to a real server.
    pub backend_name: &'a str,
}

impl<'a> Header<'a> {
    fn auth_line(&self) -> Line<'a> {
        let auth: &'a AuthState = self.auth;
        if let Some(code) = self.pending_login {
            return Line::from(vec![
                Span::raw("Sign in at "),
                Span::styled(code.url(), Style::default().fg(Color::Cyan)),
                Span::raw(" code "),
                Span::styled(
                    code.user_code.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ]);
        }
        if auth.is_loading {
            return Line::styled("Signing in...", Style::default().fg(Color::DarkGray));
        }
        match (&auth.user, auth.is_authenticated) {
            (Some(profile), true) => {
                let mut spans = vec![Span::styled(
                    profile.display_name(),
                    Style::default().add_modifier(Modifier::BOLD),
                )];
                if let Some(email) = &profile.email {
                    spans.push(Span::styled(
                        format!(" ({email})"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
                spans.push(Span::styled("  Ctrl+X log out", Style::default().fg(Color::DarkGray)));
                Line::from(spans)
            }
            (None, true) => Line::from("Signed in  Ctrl+X log out"),
            _ => Line::styled("Ctrl+L log in", Style::default().fg(Color::Yellow)),
        }
    }
}

impl Component for Header<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [left, right] =
            Layout::horizontal([Constraint::Min(0), Constraint::Min(0)]).areas(area);

        let mut title = vec![Span::styled(
            TITLE,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )];
        if self.backend_name == "offline" {
            title.push(Span::styled(" [offline]", Style::default().fg(Color::DarkGray)));
        }
        let heading = Paragraph::new(vec![
            Line::from(title),
            Line::styled(SUBTITLE, Style::default().fg(Color::Gray)),
        ]);
        frame.render_widget(heading, left);

        let status = Paragraph::new(vec![
            self.auth_line(),
            Line::styled(
                self.status_message.to_string(),
                Style::default().fg(Color::DarkGray),
            ),
        ])
        .alignment(Alignment::Right);
        frame.render_widget(status, right);
    }
}
