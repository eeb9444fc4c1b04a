//! Terminal client for the campus support chatbot.

pub mod api;
pub mod core;
pub mod tui;

#[cfg(test)]
pub mod test_support;
