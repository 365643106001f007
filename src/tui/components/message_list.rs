//! # MessageList Component
//!
//! Scrollable view of the active conversation.
//!
//! ## Responsibilities
//!
//! - Display the messages, or the welcome screen when there are none
//! - Show a loading row while an answer is pending and an error row for the
//!   last failure
//! - Keep a layout cache of message heights so only new messages are measured
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the messages (props).

use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::chat::Message as ChatMessage;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::Message;
use crate::tui::event::TuiEvent;

pub const WELCOME_TITLE: &str = "Welcome to Legal Assistant 🇵🇱";
pub const WELCOME_TEXT: &str = "How can I help you with Polish legal questions today?";
pub const WELCOME_SIGN_IN: &str = "Sign in (Ctrl+L) to save your conversation history.";

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
/// Rows taken by the loading indicator.
const LOADING_ROWS: u16 = 1;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            viewport_height: 0,
        }
    }

    fn content_height(&self) -> u16 {
        self.layout.heights.iter().sum()
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.content_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-engage auto-scroll once the user scrolls back to the end.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.content_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }
}

impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Scrollable conversation view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub messages: &'a [ChatMessage],
    pub is_loading: bool,
    /// Last error, "" for none.
    pub error: &'a str,
    pub is_authenticated: bool,
    pub spinner_frame: usize,
}

impl MessageList<'_> {
    fn render_welcome(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::styled(
                WELCOME_TITLE,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Line::from(""),
            Line::from(WELCOME_TEXT),
        ];
        if !self.is_authenticated {
            lines.push(Line::from(""));
            lines.push(Line::styled(WELCOME_SIGN_IN, Style::default().fg(Color::DarkGray)));
        }
        let top = area.height.saturating_sub(lines.len() as u16) / 2;
        let centered = Rect::new(area.x, area.y + top, area.width, area.height - top);
        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            centered,
        );
    }
}

const DISMISS_HINT: &str = "  (Esc to dismiss)";

fn error_paragraph(error: &str) -> Paragraph<'_> {
    Paragraph::new(Line::from(vec![
        Span::styled("Error: ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::styled(error, Style::default().fg(Color::Red)),
        Span::styled(DISMISS_HINT, Style::default().fg(Color::DarkGray)),
    ]))
    .wrap(Wrap { trim: true })
}

/// Rows the error line wraps to at `width`.
fn error_rows(error: &str, width: u16) -> u16 {
    if width == 0 {
        return 1;
    }
    let line = format!("Error: {error}{DISMISS_HINT}");
    let options = textwrap::Options::new(width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace);
    textwrap::wrap(&line, options).len().max(1) as u16
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if self.messages.is_empty() && !self.is_loading && self.error.is_empty() {
            self.render_welcome(frame, area);
            return;
        }

        let content_width = area.width.saturating_sub(1); // -1 for scrollbar

        // 1. Update layout cache
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(self.messages, content_width);
        layout.heights.truncate(reusable);
        for message in self.messages.iter().skip(layout.heights.len()) {
            layout
                .heights
                .push(Message::calculate_height(message, content_width));
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(self.messages, content_width);

        let messages_height = self.state.content_height();
        let loading_rows = if self.is_loading { LOADING_ROWS } else { 0 };
        let error_text: &str = self.error;
        let error_height = if error_text.is_empty() {
            0
        } else {
            error_rows(error_text, content_width)
        };
        let canvas_height = messages_height + loading_rows + error_height;

        // 2. Clamp scroll offset
        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }
        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible messages, then the status rows
        let mut scroll_view = ScrollView::new(Size::new(content_width, canvas_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = if visible_range.start > 0 {
            self.state.layout.prefix_heights[visible_range.start - 1]
        } else {
            0
        };
        for i in visible_range {
            let height = self.state.layout.heights[i];
            let rect = Rect::new(0, y_offset, content_width, height);
            scroll_view.render_widget(Message::new(&self.messages[i], false), rect);
            y_offset += height;
        }

        let mut y = messages_height;
        if self.is_loading {
            let frame_char = SPINNER[self.spinner_frame % SPINNER.len()];
            scroll_view.render_widget(
                Paragraph::new(format!("{frame_char} Assistant is typing..."))
                    .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)),
                Rect::new(0, y, content_width, LOADING_ROWS),
            );
            y += LOADING_ROWS;
        }
        if error_height > 0 {
            scroll_view.render_widget(
                error_paragraph(error_text),
                Rect::new(0, y, content_width, error_height),
            );
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }
        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// Cached message heights.
///
/// Messages never change once shown, so heights stay valid until the
/// width changes or a different conversation is loaded.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    message_count: usize,
    first_id: Option<String>,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            message_count: 0,
            first_id: None,
            content_width: 0,
        }
    }

    pub fn reusable_count(&self, messages: &[ChatMessage], content_width: u16) -> usize {
        if self.content_width != content_width || self.heights.is_empty() {
            return 0;
        }
        // Fewer messages, or a different first message: another conversation
        if messages.len() < self.message_count
            || messages.first().map(|m| m.id.as_str()) != self.first_id.as_deref()
        {
            return 0;
        }
        self.message_count.min(self.heights.len())
    }

    pub fn update_metadata(&mut self, messages: &[ChatMessage], content_width: u16) {
        self.message_count = messages.len();
        self.first_id = messages.first().map(|m| m.id.clone());
        self.content_width = content_width;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc += h;
                Some(*acc)
            })
            .collect();
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}
