//! # Core Application Logic
//!
//! This module contains Lexi's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • run_effect() (I/O)   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │ Controller │      │   Login    │
//!     │  Adapter   │      │ (headless) │      │  command   │
//!     │ (ratatui)  │      │            │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`]: The `App` struct, all conversation state in one place
//! - [`action`]: The `Action` enum and the pure `update()` reducer
//! - [`controller`]: Effect execution and the inline `Controller`
//! - [`config`]: Layered configuration

pub mod action;
pub mod config;
pub mod controller;
pub mod state;

pub use action::{Action, Effect, update};
pub use controller::{Controller, run_effect};
pub use state::App;
