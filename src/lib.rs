//! Lexi: a terminal chat client for questions about Polish law, plus the
//! HTTP endpoints it talks to.

pub mod auth;
pub mod chat;
pub mod core;
pub mod server;
pub mod tui;

#[cfg(test)]
pub mod test_support;
