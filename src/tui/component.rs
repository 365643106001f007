use ratatui::Frame;
use ratatui::layout::Rect;

use super::event::TuiEvent;

/// Something that draws itself into a region of the frame.
///
/// Props arrive as struct fields; `&mut self` lets a component refresh
/// caches (layout heights, scroll offsets) while it renders.
pub trait Component {
    fn render(&mut self, frame: &mut Frame, area: Rect);
}

/// A component that reacts to terminal input.
pub trait EventHandler {
    /// What the component reports back to the event loop.
    type Event;

    /// Consume a `TuiEvent`, returning a higher-level event when the
    /// component has something to say.
    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event>;
}
