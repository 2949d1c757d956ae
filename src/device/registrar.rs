//! Registrar collaborator interface.
//!
//! The registrar is the host subsystem that hands out device identities
//! and exposes the device under a discoverable path. The core never
//! talks to a real kernel; it talks to this trait. [`MemoryRegistrar`]
//! is the in-process implementation used by the binary and the tests.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Mutex;

use thiserror::Error;

/// Errors reported by a registrar.
#[derive(Error, Debug)]
pub enum RegistrarError {
    /// A device, class, or node name is already taken.
    #[error("name already in use: {0}")]
    NameInUse(String),

    /// The identity was never allocated or has been released.
    #[error("unknown identity: {0}")]
    UnknownIdentity(DeviceIdentity),

    /// The class handle does not refer to a live class.
    #[error("unknown class: {0}")]
    UnknownClass(String),

    /// The node handle does not refer to a live node.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// No dispatch table is bound to the identity.
    #[error("no dispatch table bound for {0}")]
    NotBound(DeviceIdentity),

    /// Registrar internal lock was poisoned.
    #[error("registrar lock poisoned")]
    LockPoisoned,
}

/// Numeric identity assigned to the device by the registrar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    /// Major number identifying the driver.
    pub major: u32,
    /// Minor number identifying the device instance.
    pub minor: u32,
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// Handle to a device class created in the registrar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHandle {
    name: String,
}

impl ClassHandle {
    /// Name of the class.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Handle to a device node exposed by the registrar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle {
    path: String,
}

impl NodeHandle {
    /// Filesystem-style path of the node.
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// File-operation dispatch table bound to a device identity.
///
/// This is the ops table as data: it names the device and declares which
/// file operations the device implements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTable {
    /// Name of the device the table dispatches to.
    pub device_name: String,
    /// Device supports open.
    pub open: bool,
    /// Device supports release (close).
    pub release: bool,
    /// Device supports read.
    pub read: bool,
    /// Device supports write.
    pub write: bool,
}

impl DispatchTable {
    /// Dispatch table for a device implementing all four file operations.
    pub fn for_device(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            open: true,
            release: true,
            read: true,
            write: true,
        }
    }
}

/// Host registration subsystem consumed by the device.
///
/// The four acquisition calls are paired with four inverse teardown
/// calls; callers are expected to tear down in strict reverse order of
/// acquisition.
pub trait Registrar: Send + Sync {
    /// Allocate a numeric identity for the named device.
    fn allocate_identity(&self, name: &str) -> Result<DeviceIdentity, RegistrarError>;

    /// Create a device class record.
    fn create_class(&self, name: &str) -> Result<ClassHandle, RegistrarError>;

    /// Create a device node under the class, visible at a path.
    fn create_node(
        &self,
        class: &ClassHandle,
        identity: DeviceIdentity,
        name: &str,
    ) -> Result<NodeHandle, RegistrarError>;

    /// Bind a dispatch table to the identity.
    fn bind_dispatch(
        &self,
        identity: DeviceIdentity,
        ops: DispatchTable,
    ) -> Result<(), RegistrarError>;

    /// Remove the dispatch binding for the identity.
    fn unbind_dispatch(&self, identity: DeviceIdentity) -> Result<(), RegistrarError>;

    /// Destroy a device node.
    fn destroy_node(&self, node: &NodeHandle) -> Result<(), RegistrarError>;

    /// Destroy a device class record.
    fn destroy_class(&self, class: &ClassHandle) -> Result<(), RegistrarError>;

    /// Release a previously allocated identity.
    fn release_identity(&self, identity: DeviceIdentity) -> Result<(), RegistrarError>;
}

#[derive(Debug, Default)]
struct MemoryRegistrarInner {
    next_major: u32,
    identities: HashMap<u32, String>,
    classes: HashSet<String>,
    nodes: HashSet<String>,
    dispatch: HashMap<u32, DispatchTable>,
}

/// In-process registrar backed by locked maps.
///
/// Majors are allocated from a counter starting at 240 (the historical
/// local/experimental range). Duplicate device, class, or node names are
/// rejected with [`RegistrarError::NameInUse`].
#[derive(Debug)]
pub struct MemoryRegistrar {
    inner: Mutex<MemoryRegistrarInner>,
}

impl MemoryRegistrar {
    /// Create a new empty registrar.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryRegistrarInner {
                next_major: 240,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryRegistrarInner>, RegistrarError> {
        self.inner.lock().map_err(|_| RegistrarError::LockPoisoned)
    }

    /// Check whether a node exists at the given path.
    pub fn node_exists(&self, path: &str) -> bool {
        self.lock().map(|i| i.nodes.contains(path)).unwrap_or(false)
    }

    /// Check whether a class with the given name exists.
    pub fn class_exists(&self, name: &str) -> bool {
        self.lock()
            .map(|i| i.classes.contains(name))
            .unwrap_or(false)
    }

    /// Number of live identities.
    pub fn identity_count(&self) -> usize {
        self.lock().map(|i| i.identities.len()).unwrap_or(0)
    }

    /// Check whether a dispatch table is bound to the identity.
    pub fn dispatch_bound(&self, identity: DeviceIdentity) -> bool {
        self.lock()
            .map(|i| i.dispatch.contains_key(&identity.major))
            .unwrap_or(false)
    }
}

impl Default for MemoryRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl Registrar for MemoryRegistrar {
    fn allocate_identity(&self, name: &str) -> Result<DeviceIdentity, RegistrarError> {
        let mut inner = self.lock()?;

        if inner.identities.values().any(|n| n == name) {
            return Err(RegistrarError::NameInUse(name.into()));
        }

        let major = inner.next_major;
        inner.next_major += 1;
        inner.identities.insert(major, name.into());
        Ok(DeviceIdentity { major, minor: 0 })
    }

    fn create_class(&self, name: &str) -> Result<ClassHandle, RegistrarError> {
        let mut inner = self.lock()?;

        if !inner.classes.insert(name.to_string()) {
            return Err(RegistrarError::NameInUse(name.into()));
        }
        Ok(ClassHandle { name: name.into() })
    }

    fn create_node(
        &self,
        class: &ClassHandle,
        identity: DeviceIdentity,
        name: &str,
    ) -> Result<NodeHandle, RegistrarError> {
        let mut inner = self.lock()?;

        if !inner.classes.contains(class.name()) {
            return Err(RegistrarError::UnknownClass(class.name().into()));
        }
        if !inner.identities.contains_key(&identity.major) {
            return Err(RegistrarError::UnknownIdentity(identity));
        }

        let path = format!("/dev/{}", name);
        if !inner.nodes.insert(path.clone()) {
            return Err(RegistrarError::NameInUse(path));
        }
        Ok(NodeHandle { path })
    }

    fn bind_dispatch(
        &self,
        identity: DeviceIdentity,
        ops: DispatchTable,
    ) -> Result<(), RegistrarError> {
        let mut inner = self.lock()?;

        if !inner.identities.contains_key(&identity.major) {
            return Err(RegistrarError::UnknownIdentity(identity));
        }
        inner.dispatch.insert(identity.major, ops);
        Ok(())
    }

    fn unbind_dispatch(&self, identity: DeviceIdentity) -> Result<(), RegistrarError> {
        let mut inner = self.lock()?;

        inner
            .dispatch
            .remove(&identity.major)
            .map(|_| ())
            .ok_or(RegistrarError::NotBound(identity))
    }

    fn destroy_node(&self, node: &NodeHandle) -> Result<(), RegistrarError> {
        let mut inner = self.lock()?;

        if !inner.nodes.remove(node.path()) {
            return Err(RegistrarError::UnknownNode(node.path().into()));
        }
        Ok(())
    }

    fn destroy_class(&self, class: &ClassHandle) -> Result<(), RegistrarError> {
        let mut inner = self.lock()?;

        if !inner.classes.remove(class.name()) {
            return Err(RegistrarError::UnknownClass(class.name().into()));
        }
        Ok(())
    }

    fn release_identity(&self, identity: DeviceIdentity) -> Result<(), RegistrarError> {
        let mut inner = self.lock()?;

        inner
            .identities
            .remove(&identity.major)
            .map(|_| ())
            .ok_or(RegistrarError::UnknownIdentity(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_identity() {
        let registrar = MemoryRegistrar::new();
        let id = registrar.allocate_identity("chardev").unwrap();

        assert_eq!(id.minor, 0);
        assert_eq!(registrar.identity_count(), 1);
    }

    #[test]
    fn test_allocate_duplicate_name() {
        let registrar = MemoryRegistrar::new();
        registrar.allocate_identity("chardev").unwrap();

        let err = registrar.allocate_identity("chardev").unwrap_err();
        assert!(matches!(err, RegistrarError::NameInUse(_)));
    }

    #[test]
    fn test_identities_get_distinct_majors() {
        let registrar = MemoryRegistrar::new();
        let a = registrar.allocate_identity("dev-a").unwrap();
        let b = registrar.allocate_identity("dev-b").unwrap();

        assert_ne!(a.major, b.major);
    }

    #[test]
    fn test_full_registration_sequence() {
        let registrar = MemoryRegistrar::new();

        let identity = registrar.allocate_identity("chardev").unwrap();
        let class = registrar.create_class("char_class").unwrap();
        let node = registrar.create_node(&class, identity, "chardev").unwrap();
        registrar
            .bind_dispatch(identity, DispatchTable::for_device("chardev"))
            .unwrap();

        assert_eq!(node.path(), "/dev/chardev");
        assert!(registrar.node_exists("/dev/chardev"));
        assert!(registrar.class_exists("char_class"));
        assert!(registrar.dispatch_bound(identity));
    }

    #[test]
    fn test_teardown_sequence() {
        let registrar = MemoryRegistrar::new();

        let identity = registrar.allocate_identity("chardev").unwrap();
        let class = registrar.create_class("char_class").unwrap();
        let node = registrar.create_node(&class, identity, "chardev").unwrap();
        registrar
            .bind_dispatch(identity, DispatchTable::for_device("chardev"))
            .unwrap();

        registrar.unbind_dispatch(identity).unwrap();
        registrar.destroy_node(&node).unwrap();
        registrar.destroy_class(&class).unwrap();
        registrar.release_identity(identity).unwrap();

        assert!(!registrar.node_exists("/dev/chardev"));
        assert!(!registrar.class_exists("char_class"));
        assert_eq!(registrar.identity_count(), 0);
        assert!(!registrar.dispatch_bound(identity));
    }

    #[test]
    fn test_node_requires_live_class() {
        let registrar = MemoryRegistrar::new();
        let identity = registrar.allocate_identity("chardev").unwrap();
        let class = registrar.create_class("char_class").unwrap();
        registrar.destroy_class(&class).unwrap();

        let err = registrar
            .create_node(&class, identity, "chardev")
            .unwrap_err();
        assert!(matches!(err, RegistrarError::UnknownClass(_)));
    }

    #[test]
    fn test_unbind_without_bind() {
        let registrar = MemoryRegistrar::new();
        let identity = registrar.allocate_identity("chardev").unwrap();

        let err = registrar.unbind_dispatch(identity).unwrap_err();
        assert!(matches!(err, RegistrarError::NotBound(_)));
    }

    #[test]
    fn test_released_identity_rejects_bind() {
        let registrar = MemoryRegistrar::new();
        let identity = registrar.allocate_identity("chardev").unwrap();
        registrar.release_identity(identity).unwrap();

        let err = registrar
            .bind_dispatch(identity, DispatchTable::for_device("chardev"))
            .unwrap_err();
        assert!(matches!(err, RegistrarError::UnknownIdentity(_)));
    }

    #[test]
    fn test_name_reusable_after_release() {
        let registrar = MemoryRegistrar::new();
        let identity = registrar.allocate_identity("chardev").unwrap();
        registrar.release_identity(identity).unwrap();

        assert!(registrar.allocate_identity("chardev").is_ok());
    }
}
