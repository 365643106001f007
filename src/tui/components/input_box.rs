//! # InputBox Component
//!
//! The message composer.
//!
//! The buffer and cursor are internal state; `disabled` is a prop set from
//! `App::is_loading`. While disabled the user may keep typing but Enter
//! does not send.
//!
//! Text wraps by display width (so Polish diacritics and wide glyphs line
//! up) and hard-breaks at newlines. Up to [`MAX_VISIBLE_LINES`] rows show at
//! once; beyond that the box scrolls to keep the cursor in view.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2) consumed horizontally
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders
const VERTICAL_OVERHEAD: u16 = 2;
pub const MAX_VISIBLE_LINES: u16 = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Enter pressed with non-blank text; the buffer has been cleared.
    Submit(String),
    ContentChanged,
}

pub struct InputBox {
    pub buffer: String,
    /// Prop: a send is in flight.
    pub disabled: bool,
    /// Cursor as a byte offset into `buffer`.
    pos: usize,
    scroll_offset: u16,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte ranges of the visual rows of `text` at `width` columns.
fn visual_rows(text: &str, width: usize) -> Vec<(usize, usize)> {
    let mut rows = Vec::new();
    let mut start = 0;
    let mut col = 0;
    for (i, c) in text.char_indices() {
        if c == '\n' {
            rows.push((start, i));
            start = i + c.len_utf8();
            col = 0;
            continue;
        }
        let w = c.width().unwrap_or(0);
        if col + w > width && col > 0 {
            rows.push((start, i));
            start = i;
            col = 0;
        }
        col += w;
    }
    rows.push((start, text.len()));
    rows
}

fn inner_width(area_width: u16) -> usize {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD).max(1) as usize
}

fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(text.len())
}

impl InputBox {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            disabled: false,
            pos: 0,
            scroll_offset: 0,
        }
    }

    /// Height needed at `area_width`, borders included.
    pub fn calculate_height(&self, area_width: u16) -> u16 {
        let rows = visual_rows(&self.buffer, inner_width(area_width)).len() as u16;
        rows.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    /// Row and column of the cursor within the wrapped text.
    fn cursor_row_col(&self, rows: &[(usize, usize)]) -> (usize, usize) {
        let row = rows
            .iter()
            .rposition(|&(start, _)| start <= self.pos)
            .unwrap_or(0);
        let (start, _) = rows[row];
        let col = self.buffer[start..self.pos]
            .chars()
            .map(|c| c.width().unwrap_or(0))
            .sum();
        (row, col)
    }

    fn insert_str(&mut self, text: &str) -> Option<InputEvent> {
        self.buffer.insert_str(self.pos, text);
        self.pos += text.len();
        Some(InputEvent::ContentChanged)
    }

    fn move_to(&mut self, pos: usize) -> Option<InputEvent> {
        (pos != self.pos).then(|| {
            self.pos = pos;
            InputEvent::ContentChanged
        })
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = inner_width(area.width);
        let rows = visual_rows(&self.buffer, width);
        let (cursor_row, cursor_col) = self.cursor_row_col(&rows);

        // Keep the cursor row inside the visible window
        let row = cursor_row as u16;
        if row < self.scroll_offset {
            self.scroll_offset = row;
        } else if row >= self.scroll_offset + MAX_VISIBLE_LINES {
            self.scroll_offset = row + 1 - MAX_VISIBLE_LINES;
        }

        let visible: Vec<&str> = rows
            .iter()
            .skip(self.scroll_offset as usize)
            .take(MAX_VISIBLE_LINES as usize)
            .map(|&(start, end)| &self.buffer[start..end])
            .collect();

        let (title, color) = if self.disabled {
            (" Waiting for the answer... ", Color::DarkGray)
        } else {
            (" Ask a question (Enter send, Ctrl+J new line) ", Color::Green)
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(title)
            .padding(Padding::horizontal(1));

        let input = Paragraph::new(visible.join("\n"))
            .block(block)
            .style(Style::default().fg(color));
        frame.render_widget(input, area);

        let x = area.x + 2 + cursor_col.min(width) as u16;
        let y = area.y + 1 + row.saturating_sub(self.scroll_offset);
        frame.set_cursor_position((x, y));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => self.insert_str(c.encode_utf8(&mut [0; 4])),
            TuiEvent::Paste(text) => self.insert_str(text),
            TuiEvent::Backspace => {
                if self.pos == 0 {
                    return None;
                }
                let prev = prev_char_boundary(&self.buffer, self.pos);
                self.buffer.drain(prev..self.pos);
                self.pos = prev;
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Delete => {
                if self.pos >= self.buffer.len() {
                    return None;
                }
                let next = next_char_boundary(&self.buffer, self.pos);
                self.buffer.drain(self.pos..next);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::CursorLeft => self.move_to(prev_char_boundary(&self.buffer, self.pos)),
            TuiEvent::CursorRight => self.move_to(next_char_boundary(&self.buffer, self.pos)),
            TuiEvent::CursorHome => {
                let line_start = self.buffer[..self.pos]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                self.move_to(line_start)
            }
            TuiEvent::CursorEnd => {
                let line_end = self.buffer[self.pos..]
                    .find('\n')
                    .map(|i| self.pos + i)
                    .unwrap_or(self.buffer.len());
                self.move_to(line_end)
            }
            TuiEvent::Submit => {
                if self.disabled || self.buffer.trim().is_empty() {
                    return None;
                }
                let text = std::mem::take(&mut self.buffer);
                self.pos = 0;
                self.scroll_offset = 0;
                Some(InputEvent::Submit(text))
            }
            _ => None,
        }
    }
}
