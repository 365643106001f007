//! Screen layout.
//!
//! ```text
//! ┌ header (2 rows) ─────────────────────────────────────┐
//! ├ sidebar ──────┬ message list ────────────────────────┤
//! │               │                                      │
//! │               ├ input box ───────────────────────────┤
//! └───────────────┴──────────────────────────────────────┘
//! ```

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::chat::Conversation;
use crate::core::state::App;
use crate::tui::component::Component;
use crate::tui::components::{Header, MessageList, Sidebar};
use crate::tui::{Focus, TuiState};

const HEADER_HEIGHT: u16 = 2;
const SIDEBAR_WIDTH: u16 = 32;
/// Below this width the sidebar is hidden unless focused.
const NARROW_WIDTH: u16 = 70;

pub struct Areas {
    pub header: Rect,
    pub sidebar: Option<Rect>,
    pub messages: Rect,
    pub input: Rect,
}

pub fn layout(area: Rect, input_height: u16, sidebar_focused: bool) -> Areas {
    use Constraint::{Length, Min};
    let [header, body] = Layout::vertical([Length(HEADER_HEIGHT), Min(0)]).areas(area);

    let show_sidebar = area.width >= NARROW_WIDTH || sidebar_focused;
    let (sidebar, chat) = if show_sidebar {
        let width = SIDEBAR_WIDTH.min(area.width / 2);
        let [sidebar, chat] = Layout::horizontal([Length(width), Min(0)]).areas(body);
        (Some(sidebar), chat)
    } else {
        (None, body)
    };

    let [messages, input] = Layout::vertical([Min(0), Length(input_height)]).areas(chat);
    Areas {
        header,
        sidebar,
        messages,
        input,
    }
}

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, spinner_frame: usize) {
    let sidebar_focused = tui.focus == Focus::Sidebar;
    // The input height depends on the chat width, which the sidebar decides
    let chat_width = layout(frame.area(), 0, sidebar_focused).input.width;
    let input_height = tui.input_box.calculate_height(chat_width);
    let areas = layout(frame.area(), input_height, sidebar_focused);

    let show_history = app.show_history();
    let listed: &[Conversation] = if show_history {
        &app.conversations
    } else {
        &[]
    };
    tui.sidebar.sync(listed);

    Header {
        auth: &app.auth,
        pending_login: app.pending_login.as_ref(),
        status_message: &app.status_message,
        backend_name: &app.backend_name,
    }
    .render(frame, areas.header);

    if let Some(sidebar_area) = areas.sidebar {
        Sidebar {
            state: &mut tui.sidebar,
            conversations: listed,
            active_id: app.active_id(),
            show_history,
            focused: sidebar_focused,
        }
        .render(frame, sidebar_area);
    }

    MessageList {
        state: &mut tui.message_list,
        messages: &app.messages,
        is_loading: app.is_loading,
        error: &app.error,
        is_authenticated: app.auth.is_authenticated,
        spinner_frame,
    }
    .render(frame, areas.messages);

    tui.input_box.disabled = app.is_loading;
    tui.input_box.render(frame, areas.input);
}
