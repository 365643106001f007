//! # TUI Components
//!
//! ## Stateless Components (Props-Based Rendering)
//!
//! Created each frame from borrowed data:
//! - `Header`: title, subtitle, auth status
//! - `Message`: one chat message with time and sources
//!
//! ## Stateful Components (Event-Driven)
//!
//! Persistent state lives in `TuiState`; a transient wrapper renders it:
//! - `InputBox`: the composer
//! - `MessageList` / `MessageListState`: scrollable conversation with layout caching
//! - `Sidebar` / `SidebarState`: conversation history
//!
//! Each file holds the component's state, events, rendering and tests.
//!
//! ```text
//! components/
//! ├── mod.rs
//! ├── header.rs
//! ├── sidebar.rs
//! ├── message.rs
//! ├── message_list.rs
//! └── input_box.rs
//! ```

pub mod header;
pub mod input_box;
pub mod message;
pub mod message_list;
pub mod sidebar;

pub use header::Header;
pub use input_box::{InputBox, InputEvent};
pub use message_list::{MessageList, MessageListState};
pub use sidebar::{Sidebar, SidebarEvent, SidebarState};
