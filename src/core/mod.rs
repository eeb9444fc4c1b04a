//! # Core Application Logic
//!
//! Everything the client does, independent of how it is drawn.
//!
//! ```text
//!                    ┌──────────────────────────┐
//!                    │          CORE            │
//!                    │                          │
//!                    │  • auth (token, status)  │
//!                    │  • session_store         │
//!                    │  • thread (edit/send)    │
//!                    │  • state + action        │
//!                    └───────────┬──────────────┘
//!                                │
//!                ┌───────────────┴───────────────┐
//!                ▼                               ▼
//!         ┌────────────┐                  ┌────────────┐
//!         │    TUI     │                  │    API     │
//!         │  (ratatui) │                  │ (ChatApi)  │
//!         └────────────┘                  └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`auth`]: shared bearer token, its file, and the auth-status channel
//! - [`validation`]: email and password checks for the auth forms
//! - [`account`]: login and registration flows
//! - [`session_store`]: the user's session list
//! - [`thread`]: messages of one session and the edit-last state machine
//! - [`state`]: the `App` struct, all application state in one place
//! - [`action`]: the `Action` enum and the `update()` reducer
//! - [`config`]: layered settings

pub mod account;
pub mod action;
pub mod auth;
pub mod config;
pub mod session_store;
pub mod state;
pub mod thread;
pub mod validation;
