//! # chardev
//!
//! Minimal in-memory character device model.
//!
//! This crate models a single-instance byte-stream device behind a
//! kernel-style file interface: open/close sessions, a bounded
//! overwrite-on-write buffer, and per-session read cursors. Host
//! registration (identity, class, node, dispatch binding) goes through
//! the [`Registrar`] trait; [`MemoryRegistrar`] is the in-process
//! implementation.
//!
//! ## Semantics
//!
//! - **Write replaces**: a successful write sets the device's entire
//!   visible content; payloads of 256 bytes or more are rejected.
//! - **Read at a cursor**: each session reads at its own cursor, which
//!   advances with the bytes returned and is never reset by writes.
//! - **Staged registration**: load acquires identity, class, node, and
//!   dispatch in order, rolling back completed steps on failure; unload
//!   tears down in strict reverse order.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use chardev::{DeviceManager, MemoryRegistrar};
//!
//! fn main() -> chardev::Result<()> {
//!     let registrar = Arc::new(MemoryRegistrar::new());
//!     let device = DeviceManager::load(registrar, "chardev", "char_class")?;
//!
//!     let session = device.open()?;
//!     device.write(session, b"hello")?;
//!     assert_eq!(device.read(session, 10)?, b"hello");
//!
//!     device.close(session)?;
//!     device.unload()?;
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use buffer::{BufferStore, BUFFER_CAPACITY};
pub use config::Config;
pub use device::{
    ClassHandle, DeviceIdentity, DeviceManager, DeviceState, DispatchTable, MemoryRegistrar,
    NodeHandle, Registrar, RegistrarError, Registration, RegistrationStage,
};
pub use error::{ChardevError, Result};
pub use session::{Session, SessionId, SessionTable};
