//! Session management module.
//!
//! A session is one open handle to the device. Each session carries its
//! own read cursor; the buffer itself is shared by all sessions.

mod id;
mod table;

pub use id::SessionId;
pub use table::{Session, SessionTable};
