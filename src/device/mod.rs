//! Device lifecycle and dispatch module.
//!
//! This module covers everything between "nothing is registered" and a
//! live device node: the registrar collaborator interface, the staged
//! registration with rollback, and the session manager that owns the
//! device's state machine.

mod manager;
mod registrar;
mod registration;

pub use manager::{DeviceManager, DeviceState};
pub use registrar::{
    ClassHandle, DeviceIdentity, DispatchTable, MemoryRegistrar, NodeHandle, Registrar,
    RegistrarError,
};
pub use registration::{Registration, RegistrationStage};
