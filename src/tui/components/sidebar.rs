//! # Sidebar Component
//!
//! Conversation history down the left edge. Focused with Tab; Up/Down
//! move the selection, Enter opens, `n` starts a new chat, `d` twice
//! deletes. While history is hidden (signed out, online) the list is
//! empty, so no key can reach a conversation the user cannot see.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `SidebarState` lives in `TuiState`
//! - `Sidebar` is created each frame with borrowed state and props

use chrono::{DateTime, Local, Utc};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph, Wrap};

use crate::chat::Conversation;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

pub const EMPTY_TEXT: &str = "No conversations yet";
pub const EMPTY_HINT: &str = "Start a new chat to begin";
pub const SIGN_IN_HINT: &str = "Sign in to save your conversations and access them later";

/// Persistent state for the sidebar.
#[derive(Default)]
pub struct SidebarState {
    /// Ids of the listed conversations, in display order.
    ids: Vec<String>,
    pub selected: usize,
    pub confirm_delete: bool,
    pub list_state: ListState,
}

impl SidebarState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the known ids from the latest summary list, keeping the
    /// selection in range.
    pub fn sync(&mut self, conversations: &[Conversation]) {
        let changed = self.ids.len() != conversations.len()
            || self.ids.iter().zip(conversations).any(|(id, c)| *id != c.id);
        if !changed {
            return;
        }
        self.ids = conversations.iter().map(|c| c.id.clone()).collect();
        self.confirm_delete = false;
        if self.ids.is_empty() {
            self.selected = 0;
            self.list_state.select(None);
        } else {
            self.selected = self.selected.min(self.ids.len() - 1);
            self.list_state.select(Some(self.selected));
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.ids.get(self.selected).map(String::as_str)
    }
}

/// Events emitted by the sidebar.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarEvent {
    Open(String),
    CreateNew,
    Delete(String),
    /// Hand focus back to the composer.
    Blur,
}

impl EventHandler for SidebarState {
    type Event = SidebarEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<SidebarEvent> {
        // Any other key cancels a pending delete
        let is_delete_key = matches!(event, TuiEvent::InputChar('d'));
        if !is_delete_key {
            self.confirm_delete = false;
        }

        match event {
            TuiEvent::Escape | TuiEvent::ToggleFocus => Some(SidebarEvent::Blur),
            TuiEvent::CursorUp => {
                if !self.ids.is_empty() {
                    self.selected = self.selected.saturating_sub(1);
                    self.list_state.select(Some(self.selected));
                }
                None
            }
            TuiEvent::CursorDown => {
                if !self.ids.is_empty() {
                    self.selected = (self.selected + 1).min(self.ids.len() - 1);
                    self.list_state.select(Some(self.selected));
                }
                None
            }
            TuiEvent::Submit => self.selected_id().map(|id| SidebarEvent::Open(id.to_string())),
            TuiEvent::InputChar('n') => Some(SidebarEvent::CreateNew),
            TuiEvent::InputChar('d') => {
                let id = self.selected_id()?.to_string();
                if self.confirm_delete {
                    self.confirm_delete = false;
                    Some(SidebarEvent::Delete(id))
                } else {
                    self.confirm_delete = true;
                    None
                }
            }
            _ => None,
        }
    }
}

/// Transient render wrapper for the sidebar.
pub struct Sidebar<'a> {
    pub state: &'a mut SidebarState,
    pub conversations: &'a [Conversation],
    pub active_id: Option<&'a str>,
    /// False shows the sign-in hint instead of the list.
    pub show_history: bool,
    pub focused: bool,
}

impl Component for Sidebar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let help_text = match (self.focused, self.state.confirm_delete) {
            (true, true) => " d again to delete ",
            (true, false) => " n New  d Delete ",
            (false, _) => " Tab History ",
        };
        let border = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(" Conversations ")
            .title_bottom(Line::from(help_text).centered())
            .padding(Padding::horizontal(1));

        if !self.show_history {
            let hint = Paragraph::new(SIGN_IN_HINT)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(hint, area);
            return;
        }

        if self.conversations.is_empty() {
            let empty = Paragraph::new(vec![
                Line::from(EMPTY_TEXT),
                Line::styled(EMPTY_HINT, Style::default().fg(Color::DarkGray)),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let inner_width = area.width.saturating_sub(4) as usize; // borders + padding
        let items: Vec<ListItem> = self
            .conversations
            .iter()
            .enumerate()
            .map(|(i, conversation)| {
                let is_active = self.active_id == Some(conversation.id.as_str());
                let is_selected = self.focused && i == self.state.selected;
                let style = match (is_selected, self.state.confirm_delete, is_active) {
                    (true, true, _) => Style::default()
                        .fg(Color::Red)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                    (true, false, _) => Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED),
                    (false, _, true) => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    (false, _, false) => Style::default().fg(Color::Gray),
                };
                ListItem::new(vec![
                    Line::styled(truncate_str(&conversation.title(), inner_width), style),
                    Line::styled(
                        format_date(conversation.updated_at),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_stateful_widget(list, area, &mut self.state.list_state);
    }
}

/// Local calendar date of the last update.
fn format_date(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%b %d, %Y").to_string()
}

/// Truncate to `max_width` chars, adding "..." if needed.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        ".".repeat(max_width)
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Message;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn conversations() -> Vec<Conversation> {
        vec![
            Conversation::new("c1", vec![Message::user("How do I get a residence permit?")]),
            Conversation::new("c2", Vec::new()),
        ]
    }

    fn render(sidebar: &mut Sidebar) -> String {
        let backend = TestBackend::new(40, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| sidebar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_delete_needs_two_presses() {
        let mut state = SidebarState::new();
        state.sync(&conversations());
        assert_eq!(state.handle_event(&TuiEvent::InputChar('d')), None);
        assert!(state.confirm_delete);
        assert_eq!(
            state.handle_event(&TuiEvent::InputChar('d')),
            Some(SidebarEvent::Delete("c1".into()))
        );
    }

    #[test]
    fn test_other_key_cancels_delete() {
        let mut state = SidebarState::new();
        state.sync(&conversations());
        state.handle_event(&TuiEvent::InputChar('d'));
        state.handle_event(&TuiEvent::CursorDown);
        assert!(!state.confirm_delete);
        assert_eq!(state.handle_event(&TuiEvent::InputChar('d')), None);
    }

    #[test]
    fn test_navigation_and_open() {
        let mut state = SidebarState::new();
        state.sync(&conversations());
        state.handle_event(&TuiEvent::CursorDown);
        state.handle_event(&TuiEvent::CursorDown);
        assert_eq!(
            state.handle_event(&TuiEvent::Submit),
            Some(SidebarEvent::Open("c2".into()))
        );
        state.handle_event(&TuiEvent::CursorUp);
        assert_eq!(state.selected_id(), Some("c1"));
    }

    #[test]
    fn test_sync_clamps_selection() {
        let mut state = SidebarState::new();
        state.sync(&conversations());
        state.handle_event(&TuiEvent::CursorDown);
        state.sync(&conversations()[..1]);
        assert_eq!(state.selected_id(), Some("c1"));
        state.sync(&[]);
        assert_eq!(state.selected_id(), None);
        assert_eq!(state.handle_event(&TuiEvent::Submit), None);
    }

    #[test]
    fn test_render_signed_out_hint() {
        let mut state = SidebarState::new();
        let text = render(&mut Sidebar {
            state: &mut state,
            conversations: &[],
            active_id: None,
            show_history: false,
            focused: false,
        });
        assert!(text.contains("Sign in to save"));
    }

    #[test]
    fn test_render_empty_list() {
        let mut state = SidebarState::new();
        let text = render(&mut Sidebar {
            state: &mut state,
            conversations: &[],
            active_id: None,
            show_history: true,
            focused: false,
        });
        assert!(text.contains(EMPTY_TEXT));
        assert!(text.contains(EMPTY_HINT));
    }

    #[test]
    fn test_render_titles() {
        let list = conversations();
        let mut state = SidebarState::new();
        state.sync(&list);
        let text = render(&mut Sidebar {
            state: &mut state,
            conversations: &list,
            active_id: Some("c1"),
            show_history: true,
            focused: true,
        });
        assert!(text.contains("How do I get a residence"));
        assert!(text.contains("New conversation"));
    }

    #[test]
    fn test_truncate_str_counts_chars() {
        assert_eq!(truncate_str("Zażółć gęślą", 8), "Zażół...");
        assert_eq!(truncate_str("short", 10), "short");
    }
}
