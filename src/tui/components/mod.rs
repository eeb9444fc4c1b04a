//! # TUI Components
//!
//! Two kinds of component live here:
//!
//! - **Stateless** (props only, rebuilt every frame): `TitleBar`,
//!   `MessageView`, `ModalView`.
//! - **Stateful**: a persistent `*State` struct kept in `TuiState` plus a
//!   transient wrapper that borrows it for one frame: `TextField`,
//!   `AuthForm`, `Sidebar`, `MessageList`.
//!
//! Components receive data as struct fields and never reach into `App`
//! themselves, which keeps them testable against a `TestBackend`.
//!
//! ```text
//! components/
//! ├── title_bar.rs     (status line)
//! ├── auth_form.rs     (login / register)
//! ├── sidebar.rs       (session list)
//! ├── message.rs       (one chat bubble)
//! ├── message_list.rs  (scrollable thread)
//! ├── text_field.rs    (compose box, form fields, topic prompt)
//! └── modal.rs         (overlays)
//! ```

pub mod auth_form;
pub mod message;
pub mod message_list;
pub mod modal;
pub mod sidebar;
pub mod text_field;
mod title_bar;

pub use auth_form::{AuthForm, AuthFormState, AuthMode};
pub use message_list::{MessageList, MessageListState};
pub use modal::ModalView;
pub use sidebar::{Sidebar, SidebarEvent, SidebarState};
pub use text_field::{TextField, TextFieldEvent};
pub use title_bar::TitleBar;
