//! Device buffer module.
//!
//! The device exposes a single fixed-capacity byte buffer shared by all
//! sessions. Writes replace the visible content wholesale; reads are
//! bounded by the valid length set by the last write.

mod store;

pub use store::{BufferStore, BUFFER_CAPACITY};
