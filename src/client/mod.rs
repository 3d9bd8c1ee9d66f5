// src/client/mod.rs

//! Client side of the portal: HTTP access, sessions, screen routing and the
//! admin console. The quiz engine runs on top of either [`PortalClient`] or
//! [`crate::quiz::LocalQuiz`].

pub mod api;
pub mod console;
pub mod session;
pub mod view;

pub use api::PortalClient;
pub use console::{AdminConsole, ConsoleBackend};
pub use session::{
    AccountLookup, FileSessionStorage, MemorySessionStorage, SessionManager, SessionState,
    SessionStorage, StudentState,
};
pub use view::{Route, View};
