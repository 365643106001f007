//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into `core::Action` values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Effects
//!
//! `update()` returns an `Effect`; the loop hands it to a tokio task running
//! `run_effect`, which sends the resulting `Action` back over an mpsc
//! channel. The loop drains that channel between input polls.
//!
//! ## Redraw Strategy
//!
//! - **Loading**: draws every ~80ms so the spinner moves.
//! - **Idle**: sleeps up to 500ms and only redraws on events or new actions.

mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::io::stdout;
use std::sync::{Arc, mpsc};

use crossterm::cursor::{SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::auth::AuthAdapter;
use crate::chat::ChatBackend;
use crate::core::action::{Action, Effect, update};
use crate::core::controller::run_effect;
use crate::core::state::App;
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState, SidebarEvent, SidebarState};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Which pane receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sidebar,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub sidebar: SidebarState,
    pub focus: Focus,
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            sidebar: SidebarState::new(),
            focus: Focus::Input, // User expects to type immediately
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Shift+Enter through; terminals without
        // it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste
        );
    }
}

/// Runs one effect on a tokio task and posts its outcome back to the loop.
fn spawn_effect(
    effect: Effect,
    backend: &Arc<dyn ChatBackend>,
    auth: &Arc<dyn AuthAdapter>,
    tx: &mpsc::Sender<Action>,
) {
    if matches!(effect, Effect::None | Effect::Quit) {
        return;
    }
    debug!("Spawning effect: {:?}", effect);
    let backend = Arc::clone(backend);
    let auth = Arc::clone(auth);
    let tx = tx.clone();
    tokio::spawn(async move {
        if let Some(action) = run_effect(effect, backend.as_ref(), auth.as_ref()).await
            && tx.send(action).is_err()
        {
            warn!("Failed to deliver effect outcome: receiver dropped");
        }
    });
}

/// The event loop. Blocks until the user quits.
pub fn run(backend: Arc<dyn ChatBackend>, auth: Arc<dyn AuthAdapter>) -> std::io::Result<()> {
    let mut app = App::new(backend.name(), auth.state());
    let mut tui = TuiState::new();

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    // Dispatch an action and schedule whatever it asks for. Returns true on quit.
    let dispatch = |app: &mut App, action: Action| -> bool {
        let effect = update(app, action);
        if effect == Effect::Quit {
            return true;
        }
        spawn_effect(effect, &backend, &auth, &tx);
        false
    };

    if app.show_history() {
        dispatch(&mut app, Action::RefreshConversations);
    }

    let start_time = std::time::Instant::now();
    let mut needs_redraw = true;

    'main: loop {
        if app.is_loading || app.auth.is_loading {
            needs_redraw = true;
        }
        if needs_redraw {
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app, &mut tui, spinner_frame))?;
            needs_redraw = false;
        }

        let timeout = if app.is_loading || app.auth.is_loading {
            std::time::Duration::from_millis(80)
        } else {
            std::time::Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain all pending events before next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            let action = match event {
                TuiEvent::Resize => None,
                TuiEvent::ForceQuit => Some(Action::Quit),
                TuiEvent::NewConversation => {
                    tui.message_list = MessageListState::new();
                    Some(Action::NewConversation)
                }
                TuiEvent::RefreshConversations => Some(Action::RefreshConversations),
                TuiEvent::Login => Some(Action::Login),
                TuiEvent::Logout => Some(Action::Logout),
                TuiEvent::ScrollUp
                | TuiEvent::ScrollDown
                | TuiEvent::ScrollPageUp
                | TuiEvent::ScrollPageDown => {
                    tui.message_list.handle_event(&event);
                    None
                }
                _ => match tui.focus {
                    Focus::Sidebar => sidebar_action(&mut tui, &event),
                    Focus::Input => input_action(&mut tui, &app, &event),
                },
            };
            if let Some(action) = action
                && dispatch(&mut app, action)
            {
                break 'main;
            }
        }

        // Handle background task outcomes
        while let Ok(action) = rx.try_recv() {
            needs_redraw = true;
            debug!("Event loop received: {:?}", action);
            if dispatch(&mut app, action) {
                break 'main;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

fn sidebar_action(tui: &mut TuiState, event: &TuiEvent) -> Option<Action> {
    match tui.sidebar.handle_event(event)? {
        SidebarEvent::Open(id) => {
            tui.message_list = MessageListState::new();
            tui.focus = Focus::Input;
            Some(Action::SelectConversation(id))
        }
        SidebarEvent::CreateNew => {
            tui.message_list = MessageListState::new();
            tui.focus = Focus::Input;
            Some(Action::NewConversation)
        }
        SidebarEvent::Delete(id) => Some(Action::DeleteConversation(id)),
        SidebarEvent::Blur => {
            tui.focus = Focus::Input;
            None
        }
    }
}

fn input_action(tui: &mut TuiState, app: &App, event: &TuiEvent) -> Option<Action> {
    match event {
        TuiEvent::ToggleFocus => {
            tui.focus = Focus::Sidebar;
            None
        }
        TuiEvent::Escape if app.has_error() => Some(Action::DismissError),
        TuiEvent::Escape => None,
        // Up/Down scroll the conversation while composing
        TuiEvent::CursorUp => {
            tui.message_list.handle_event(&TuiEvent::ScrollUp);
            None
        }
        TuiEvent::CursorDown => {
            tui.message_list.handle_event(&TuiEvent::ScrollDown);
            None
        }
        _ => match tui.input_box.handle_event(event)? {
            InputEvent::Submit(text) => {
                tui.message_list.stick_to_bottom = true;
                Some(Action::Submit(text))
            }
            InputEvent::ContentChanged => None,
        },
    }
}
