//! Device session manager.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::registrar::{DispatchTable, Registrar};
use super::registration::Registration;
use crate::buffer::BufferStore;
use crate::error::ChardevError;
use crate::session::{SessionId, SessionTable};
use crate::Result;

/// Observable state of the device as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// The device is not registered with the host. Terminal after unload.
    Unregistered,
    /// The device is registered, with the given number of open sessions.
    Registered {
        /// Live session count.
        sessions: usize,
    },
}

/// The device session manager.
///
/// Owns the registration record, the shared buffer, and the session
/// table. Exists only while the device is registered: [`load`] is the
/// only constructor and [`unload`] consumes the manager, so device
/// operations on an unregistered device do not typecheck.
///
/// [`load`]: DeviceManager::load
/// [`unload`]: DeviceManager::unload
pub struct DeviceManager {
    registrar: Arc<dyn Registrar>,
    buffer: Arc<BufferStore>,
    sessions: SessionTable,
    registration: Registration,
}

impl std::fmt::Debug for DeviceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceManager")
            .field("buffer", &self.buffer)
            .field("sessions", &self.sessions)
            .field("registration", &self.registration)
            .finish_non_exhaustive()
    }
}

impl DeviceManager {
    /// Register the device and bring it to `Registered(0)`.
    ///
    /// Acquires identity, class, node, and dispatch binding from the
    /// registrar, rolling back on partial failure. A fresh empty buffer
    /// is created for the device.
    pub fn load(
        registrar: Arc<dyn Registrar>,
        device_name: &str,
        class_name: &str,
    ) -> Result<Self> {
        Self::load_with_buffer(registrar, device_name, class_name, Arc::new(BufferStore::new()))
    }

    /// Register the device using a caller-provided buffer.
    ///
    /// The buffer is the process-wide shared store; injecting it keeps
    /// the sharing visible to callers and lets tests observe the store
    /// independently of the manager.
    pub fn load_with_buffer(
        registrar: Arc<dyn Registrar>,
        device_name: &str,
        class_name: &str,
        buffer: Arc<BufferStore>,
    ) -> Result<Self> {
        let dispatch = DispatchTable::for_device(device_name);
        let registration =
            Registration::acquire(registrar.as_ref(), device_name, class_name, dispatch)?;

        info!(
            "device loaded: {} ({})",
            registration.node_path(),
            registration.identity()
        );

        Ok(Self {
            registrar,
            buffer,
            sessions: SessionTable::new(),
            registration,
        })
    }

    /// Open a new session with its read cursor at zero.
    ///
    /// Always succeeds while the device is registered. No bound is
    /// placed on the number of concurrent sessions.
    pub fn open(&self) -> Result<SessionId> {
        let id = self.sessions.insert()?;
        debug!("session {} opened ({} live)", id, self.sessions.count());
        Ok(id)
    }

    /// Close a session.
    ///
    /// Closing an unknown or already-closed session fails with
    /// [`ChardevError::SessionNotFound`]; the live count never goes
    /// negative.
    pub fn close(&self, id: SessionId) -> Result<()> {
        self.sessions.remove(id)?;
        debug!("session {} closed ({} live)", id, self.sessions.count());
        Ok(())
    }

    /// Read up to `max_len` bytes at the session's cursor.
    ///
    /// Returns an empty vec once the cursor is at or past the buffer's
    /// valid length. On a non-empty result the cursor advances by the
    /// number of bytes returned. Never blocks, never returns more than
    /// requested.
    pub fn read(&self, id: SessionId, max_len: usize) -> Result<Vec<u8>> {
        let offset = self.sessions.read_offset(id)?;
        let data = self.buffer.read(offset, max_len)?;
        if !data.is_empty() {
            self.sessions.advance(id, data.len())?;
        }
        Ok(data)
    }

    /// Replace the device's entire visible content with `data`.
    ///
    /// Delegates to the buffer store; fails with
    /// [`ChardevError::TooLarge`] for payloads at or over capacity. No
    /// session cursor is touched: sessions already past the new valid
    /// length observe end-of-stream until closed and reopened.
    pub fn write(&self, id: SessionId, data: &[u8]) -> Result<usize> {
        if !self.sessions.contains(id)? {
            return Err(ChardevError::SessionNotFound(id.to_string()));
        }
        self.buffer.write(data)
    }

    /// Number of currently open sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.count()
    }

    /// Current state of the device.
    pub fn state(&self) -> DeviceState {
        DeviceState::Registered {
            sessions: self.sessions.count(),
        }
    }

    /// Path of the device node.
    pub fn node_path(&self) -> &str {
        self.registration.node_path()
    }

    /// The shared buffer store.
    pub fn buffer(&self) -> &Arc<BufferStore> {
        &self.buffer
    }

    /// Unregister the device and drop all state.
    ///
    /// Permitted with sessions still open; their handles die with the
    /// device. Teardown runs in strict reverse order of acquisition.
    /// Returns the terminal [`DeviceState::Unregistered`] on success.
    pub fn unload(self) -> Result<DeviceState> {
        let live = self.sessions.count();
        if live > 0 {
            warn!("unloading with {} session(s) still open", live);
        }

        let node_path = self.registration.node_path().to_string();
        self.registration.release(self.registrar.as_ref())?;
        info!("device unloaded: {}", node_path);
        Ok(DeviceState::Unregistered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MemoryRegistrar;

    fn load() -> DeviceManager {
        DeviceManager::load(Arc::new(MemoryRegistrar::new()), "chardev", "char_class").unwrap()
    }

    #[test]
    fn test_load_starts_with_no_sessions() {
        let device = load();
        assert_eq!(device.session_count(), 0);
        assert_eq!(device.state(), DeviceState::Registered { sessions: 0 });
        assert_eq!(device.node_path(), "/dev/chardev");
    }

    #[test]
    fn test_open_close_counts() {
        let device = load();

        let a = device.open().unwrap();
        let b = device.open().unwrap();
        let c = device.open().unwrap();
        assert_eq!(device.session_count(), 3);

        device.close(b).unwrap();
        assert_eq!(device.session_count(), 2);
        device.close(a).unwrap();
        device.close(c).unwrap();
        assert_eq!(device.session_count(), 0);
    }

    #[test]
    fn test_close_twice_is_rejected() {
        let device = load();
        let id = device.open().unwrap();

        device.close(id).unwrap();
        assert!(matches!(
            device.close(id),
            Err(ChardevError::SessionNotFound(_))
        ));
        assert_eq!(device.session_count(), 0);
    }

    #[test]
    fn test_write_then_read_advances_cursor() {
        let device = load();
        let id = device.open().unwrap();

        device.write(id, b"hello").unwrap();
        assert_eq!(device.read(id, 3).unwrap(), b"hel");
        assert_eq!(device.read(id, 10).unwrap(), b"lo");
        // Cursor at end of content: end-of-stream
        assert!(device.read(id, 10).unwrap().is_empty());
    }

    #[test]
    fn test_sessions_read_independently() {
        let device = load();
        let a = device.open().unwrap();
        let b = device.open().unwrap();

        device.write(a, b"shared").unwrap();

        assert_eq!(device.read(a, 100).unwrap(), b"shared");
        // Session b's cursor was not moved by a's reads
        assert_eq!(device.read(b, 100).unwrap(), b"shared");
    }

    #[test]
    fn test_write_does_not_reset_cursors() {
        let device = load();
        let id = device.open().unwrap();

        device.write(id, b"long payload").unwrap();
        device.read(id, 100).unwrap();

        // Overwrite with shorter content; cursor stays past valid length
        device.write(id, b"hi").unwrap();
        assert!(device.read(id, 100).unwrap().is_empty());

        // Reopening starts from zero again
        device.close(id).unwrap();
        let fresh = device.open().unwrap();
        assert_eq!(device.read(fresh, 100).unwrap(), b"hi");
    }

    #[test]
    fn test_write_on_closed_session() {
        let device = load();
        let id = device.open().unwrap();
        device.close(id).unwrap();

        assert!(matches!(
            device.write(id, b"x"),
            Err(ChardevError::SessionNotFound(_))
        ));
    }

    #[test]
    fn test_too_large_write_propagates() {
        let device = load();
        let id = device.open().unwrap();

        let payload = vec![0u8; 256];
        assert!(matches!(
            device.write(id, &payload),
            Err(ChardevError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_unload_with_open_sessions_is_permitted() {
        let registrar = Arc::new(MemoryRegistrar::new());
        let device =
            DeviceManager::load(Arc::clone(&registrar) as Arc<dyn Registrar>, "chardev", "char_class")
                .unwrap();
        device.open().unwrap();
        device.open().unwrap();

        let state = device.unload().unwrap();
        assert_eq!(state, DeviceState::Unregistered);
        assert!(!registrar.node_exists("/dev/chardev"));
    }

    #[test]
    fn test_injected_buffer_is_shared() {
        let buffer = Arc::new(BufferStore::new());
        let device = DeviceManager::load_with_buffer(
            Arc::new(MemoryRegistrar::new()),
            "chardev",
            "char_class",
            Arc::clone(&buffer),
        )
        .unwrap();

        let id = device.open().unwrap();
        device.write(id, b"via device").unwrap();

        // Observable directly on the injected store
        assert_eq!(buffer.read(0, 100).unwrap(), b"via device");
    }
}
