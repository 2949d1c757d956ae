//! Staged device registration with rollback.

use tracing::{debug, warn};

use super::registrar::{
    ClassHandle, DeviceIdentity, DispatchTable, NodeHandle, Registrar, RegistrarError,
};
use crate::error::ChardevError;
use crate::Result;

/// The four registration steps, in acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
    /// Allocating the numeric device identity.
    Identity,
    /// Creating the device-class record.
    Class,
    /// Creating the device node.
    Node,
    /// Binding the dispatch table to the identity.
    Dispatch,
}

/// Steps completed so far, unwound in reverse if a later step fails.
#[derive(Default)]
struct Completed {
    identity: Option<DeviceIdentity>,
    class: Option<ClassHandle>,
    node: Option<NodeHandle>,
}

impl Completed {
    /// Undo every completed step, newest first.
    ///
    /// Dispatch binding is the final step, so it can never need
    /// unwinding. Unwind failures are logged and skipped; the caller is
    /// already propagating the error that triggered the rollback.
    fn unwind(self, registrar: &dyn Registrar) {
        if let Some(node) = self.node {
            if let Err(e) = registrar.destroy_node(&node) {
                warn!("rollback: failed to destroy node: {}", e);
            }
        }
        if let Some(class) = self.class {
            if let Err(e) = registrar.destroy_class(&class) {
                warn!("rollback: failed to destroy class: {}", e);
            }
        }
        if let Some(identity) = self.identity {
            if let Err(e) = registrar.release_identity(identity) {
                warn!("rollback: failed to release identity: {}", e);
            }
        }
    }
}

/// A fully registered device: identity, class record, node, and dispatch
/// binding, held together so teardown can run in strict reverse order.
#[derive(Debug)]
pub struct Registration {
    identity: DeviceIdentity,
    class: ClassHandle,
    node: NodeHandle,
}

impl Registration {
    /// Acquire a complete registration from the registrar.
    ///
    /// Performs, in order: allocate identity, create class, create node,
    /// bind dispatch. If any step fails, the steps already completed are
    /// undone in reverse order and the first error is returned as
    /// [`ChardevError::RegistrationFailed`] with the failed stage. On
    /// failure the device never becomes visible at its node path.
    pub fn acquire(
        registrar: &dyn Registrar,
        device_name: &str,
        class_name: &str,
        dispatch: DispatchTable,
    ) -> Result<Self> {
        let mut completed = Completed::default();

        let identity = match registrar.allocate_identity(device_name) {
            Ok(identity) => identity,
            Err(e) => return Err(Self::fail(registrar, completed, RegistrationStage::Identity, e)),
        };
        completed.identity = Some(identity);
        debug!("allocated identity {} for {}", identity, device_name);

        let class = match registrar.create_class(class_name) {
            Ok(class) => class,
            Err(e) => return Err(Self::fail(registrar, completed, RegistrationStage::Class, e)),
        };
        completed.class = Some(class.clone());
        debug!("created class {}", class_name);

        let node = match registrar.create_node(&class, identity, device_name) {
            Ok(node) => node,
            Err(e) => return Err(Self::fail(registrar, completed, RegistrationStage::Node, e)),
        };
        completed.node = Some(node.clone());
        debug!("created node {}", node.path());

        if let Err(e) = registrar.bind_dispatch(identity, dispatch) {
            return Err(Self::fail(registrar, completed, RegistrationStage::Dispatch, e));
        }
        debug!("bound dispatch table for {}", identity);

        Ok(Self {
            identity,
            class,
            node,
        })
    }

    fn fail(
        registrar: &dyn Registrar,
        completed: Completed,
        stage: RegistrationStage,
        source: RegistrarError,
    ) -> ChardevError {
        warn!("registration failed at {:?} stage: {}", stage, source);
        completed.unwind(registrar);
        ChardevError::RegistrationFailed { stage, source }
    }

    /// The numeric identity assigned to the device.
    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    /// Path of the device node.
    pub fn node_path(&self) -> &str {
        self.node.path()
    }

    /// Tear down the registration in strict reverse order of acquisition:
    /// unbind dispatch, destroy node, destroy class, release identity.
    ///
    /// Every step runs regardless of earlier failures; the first error
    /// encountered is returned after teardown completes.
    pub fn release(self, registrar: &dyn Registrar) -> Result<()> {
        let mut first_err: Option<(RegistrationStage, RegistrarError)> = None;
        let mut record = |stage, r: std::result::Result<(), RegistrarError>| {
            if let Err(e) = r {
                warn!("teardown step {:?} failed: {}", stage, e);
                first_err.get_or_insert((stage, e));
            }
        };

        record(RegistrationStage::Dispatch, registrar.unbind_dispatch(self.identity));
        record(RegistrationStage::Node, registrar.destroy_node(&self.node));
        record(RegistrationStage::Class, registrar.destroy_class(&self.class));
        record(RegistrationStage::Identity, registrar.release_identity(self.identity));

        match first_err {
            None => Ok(()),
            Some((stage, source)) => Err(ChardevError::RegistrationFailed { stage, source }),
        }
    }
}
