//! # Runtime Error Types
//!
//! Structural errors are raised to the caller with no partial state change.
//! Callback faults are caught at the lifecycle/scheduler boundary, logged,
//! and never propagated.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::entity::{CallbackResult, EntityId};

/// Broad classification of an [`EntityError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Duplicate component type, duplicate child id, null/self/cyclic owner.
    StructuralConflict,
    /// Operating on a disposed entity or attaching to an unbound owner.
    InvalidState,
    /// The requested type could not be constructed.
    ConstructionFault,
    /// An external load was cancelled or failed.
    LoadAborted,
}

/// Errors raised synchronously by structural operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// The owner already has a component of this concrete type.
    #[error("entity {owner} already has component: {component}")]
    DuplicateComponent {
        /// The owner that rejected the component.
        owner: EntityId,
        /// Type name of the duplicate component.
        component: &'static str,
    },

    /// The parent already has a different child under this business id.
    #[error("entity {owner} already has a child with id {id}")]
    DuplicateChild {
        /// The parent that rejected the child.
        owner: EntityId,
        /// The colliding business id.
        id: u64,
    },

    /// A null owner was supplied.
    #[error("cannot set a null owner for {entity}")]
    NullOwner {
        /// Type name of the entity.
        entity: &'static str,
    },

    /// An entity was asked to own itself.
    #[error("cannot set self as owner: {entity}")]
    SelfOwner {
        /// Type name of the entity.
        entity: &'static str,
    },

    /// The new owner is a descendant of the entity.
    #[error("cannot move {entity} under its own descendant {owner}")]
    OwnershipCycle {
        /// The entity being moved.
        entity: EntityId,
        /// The rejected owner.
        owner: EntityId,
    },

    /// A scene with this name is already registered.
    #[error("scene {0} already exists")]
    DuplicateScene(String),

    /// The handle is stale or the entity is being disposed.
    #[error("entity {0} is disposed")]
    Disposed(EntityId),

    /// Attachment requires the owner to be bound to a scene.
    #[error("owner {owner} is not bound to a scene")]
    UnboundOwner {
        /// The unbound owner.
        owner: EntityId,
    },

    /// The entity is not attached as a component.
    #[error("entity {0} is not a component")]
    NotAComponent(EntityId),

    /// No factory is registered for the type.
    #[error("cannot construct unknown type: {0}")]
    UnknownType(&'static str),

    /// An external load was cancelled; the entity was removed.
    #[error("load of {0} was cancelled")]
    LoadCancelled(&'static str),

    /// An external load failed; the entity was removed.
    #[error("load of {component} failed: {reason}")]
    LoadFailed {
        /// Type name of the entity being loaded.
        component: &'static str,
        /// Failure reason reported by the loader.
        reason: String,
    },
}

impl EntityError {
    /// Returns the taxonomy bucket for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateComponent { .. }
            | Self::DuplicateChild { .. }
            | Self::NullOwner { .. }
            | Self::SelfOwner { .. }
            | Self::OwnershipCycle { .. }
            | Self::DuplicateScene(_) => ErrorKind::StructuralConflict,
            Self::Disposed(_) | Self::UnboundOwner { .. } | Self::NotAComponent(_) => {
                ErrorKind::InvalidState
            }
            Self::UnknownType(_) => ErrorKind::ConstructionFault,
            Self::LoadCancelled(_) | Self::LoadFailed { .. } => ErrorKind::LoadAborted,
        }
    }
}

/// Result type for structural operations.
pub type EntityResult<T> = Result<T, EntityError>;

/// Lifecycle phase a callback ran in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallbackPhase {
    /// Initialization after binding.
    Awake,
    /// Per-tick update.
    Update,
    /// Per-tick late update.
    LateUpdate,
    /// Destroy notification during disposal.
    Destroy,
    /// Dependency activation change.
    ActivationChanged,
}

impl fmt::Display for CallbackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Awake => "awake",
            Self::Update => "update",
            Self::LateUpdate => "late_update",
            Self::Destroy => "destroy",
            Self::ActivationChanged => "activation_changed",
        };
        f.write_str(name)
    }
}

/// A fault raised by a user callback, captured instead of propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{phase} error in {type_name}: {message}")]
pub struct CallbackFault {
    /// Phase the callback ran in.
    pub phase: CallbackPhase,
    /// Type name of the entity.
    pub type_name: &'static str,
    /// Error message or panic payload.
    pub message: String,
}

/// Runs `callback`, converting a returned error or a panic into a logged
/// [`CallbackFault`].
pub(crate) fn isolate<F>(
    phase: CallbackPhase,
    type_name: &'static str,
    callback: F,
) -> Option<CallbackFault>
where
    F: FnOnce() -> CallbackResult,
{
    let message = match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => return None,
        Ok(Err(err)) => err.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };

    let fault = CallbackFault {
        phase,
        type_name,
        message,
    };
    tracing::error!(entity = type_name, phase = %phase, "{fault}");
    Some(fault)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolate_ok() {
        assert!(isolate(CallbackPhase::Update, "T", || Ok(())).is_none());
    }

    #[test]
    fn test_isolate_error() {
        let fault = isolate(CallbackPhase::Awake, "T", || Err("boom".into())).unwrap();
        assert_eq!(fault.phase, CallbackPhase::Awake);
        assert_eq!(fault.message, "boom");
        assert_eq!(fault.to_string(), "awake error in T: boom");
    }

    #[test]
    fn test_isolate_panic() {
        let fault = isolate(CallbackPhase::Destroy, "T", || panic!("kaput")).unwrap();
        assert_eq!(fault.message, "kaput");
    }

    #[test]
    fn test_error_kinds() {
        let conflict = EntityError::DuplicateChild {
            owner: EntityId::NULL,
            id: 7,
        };
        assert_eq!(conflict.kind(), ErrorKind::StructuralConflict);
        assert_eq!(
            EntityError::Disposed(EntityId::NULL).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            EntityError::UnknownType("X").kind(),
            ErrorKind::ConstructionFault
        );
    }
}
