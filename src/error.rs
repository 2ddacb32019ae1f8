//! Gate dispatch error types.
//!
//! Errors are categorized by when they surface and whether the caller can
//! do anything about them:
//!
//! | Category | Variants | Recovery |
//! |----------|----------|----------|
//! | **Attachment** | `Attachment` | Fix the component tree |
//! | **Validation** | `InvalidKey`, `InvalidImplementation`, `ArityMismatch`, `InvalidUnitary` | Fix the gate definition |
//! | **Dispatch** | `Dispatch`, `GateNotFound` | Try other targets or another gate |
//! | **Registry** | `AliasCycle`, `AliasDepthExceeded`, `UnknownSlot`, `InvalidReference`, `ForeignImplementation` | Fix the registry |
//! | **Execution** | `InvalidArguments`, `Control` | Fix call arguments or the control layer |
//! | **Graph** | `UnknownComponent`, `WrongComponent`, `SelfPair` | Fix the caller |
//!
//! An ambiguous implementation lookup is not an error: it is reported as
//! `None` by [`Gate::get_implementation`](crate::Gate::get_implementation).

use thiserror::Error;

use crate::graph::ComponentId;
use crate::qubit::TargetKey;

/// Errors that can occur while resolving or dispatching gates.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GateError {
    // ── Attachment ───────────────────────────────────────────────────
    /// Implementation is not reachable to a qubit or qubit pair within two hops.
    #[error("Implementation {implementation} is not attached to a qubit or qubit pair")]
    Attachment {
        /// The implementation component that failed to resolve.
        implementation: ComponentId,
    },

    // ── Validation (raised eagerly on construction or mutation) ──────
    /// Key is neither a qubit, a qubit pair, nor a non-empty id tuple.
    #[error("Invalid implementation key for gate '{gate}': {reason}")]
    InvalidKey {
        /// Name of the gate being configured.
        gate: String,
        /// Why the key was rejected.
        reason: String,
    },

    /// Value does not satisfy the gate implementation contract.
    #[error("Invalid implementation {implementation} for gate '{gate}': {reason}")]
    InvalidImplementation {
        /// Name of the gate being configured.
        gate: String,
        /// The offending component.
        implementation: ComponentId,
        /// Why the implementation was rejected.
        reason: String,
    },

    /// Key length differs from the number of qubits the implementation acts on.
    #[error(
        "Invalid implementation key for gate '{gate}': arity mismatch, key {key} has {got} qubits but implementation acts on {expected}"
    )]
    ArityMismatch {
        /// Name of the gate being configured.
        gate: String,
        /// The offending key.
        key: TargetKey,
        /// Number of qubits the implementation (or unitary) acts on.
        expected: usize,
        /// Number of qubits in the key.
        got: usize,
    },

    /// Unitary matrix is not square with a power-of-two dimension.
    #[error("Invalid unitary: {0}")]
    InvalidUnitary(String),

    // ── Dispatch (recoverable) ───────────────────────────────────────
    /// No implementation is registered for the requested targets.
    #[error("Gate {gate} cannot be executed on qubits {targets}")]
    Dispatch {
        /// Name of the gate that was called.
        gate: String,
        /// Normalized targets of the call.
        targets: String,
    },

    /// Gate is not registered on a qubit pair.
    #[error("Gate not found in qubit pair gates: gate={gate}, known gates={known:?}")]
    GateNotFound {
        /// The gate that was requested.
        gate: String,
        /// Gate names registered on the pair.
        known: Vec<String>,
    },

    // ── Registry and alias resolution ────────────────────────────────
    /// Alias chain revisits a slot.
    #[error("Alias cycle detected: {}", .chain.join(" -> "))]
    AliasCycle {
        /// Slot names in visiting order, ending with the repeated one.
        chain: Vec<String>,
    },

    /// Alias chain is longer than the configured bound.
    #[error("Alias '{name}' did not resolve within {max_hops} hops")]
    AliasDepthExceeded {
        /// Slot name resolution started from.
        name: String,
        /// Configured hop bound.
        max_hops: usize,
    },

    /// Slot name is not present in the registry.
    #[error("No implementation slot named '{0}'")]
    UnknownSlot(String),

    /// Reference string does not follow the `#./<slot>` syntax.
    #[error("Invalid slot reference: {0}")]
    InvalidReference(String),

    /// Concrete slot points at an implementation owned by another object.
    #[error(
        "Slot '{name}' on {object} cannot hold implementation {implementation}, which is attached to {owner}"
    )]
    ForeignImplementation {
        /// Slot name.
        name: String,
        /// Object whose registry was written.
        object: ComponentId,
        /// The implementation component.
        implementation: ComponentId,
        /// Quantum object the implementation is attached to.
        owner: ComponentId,
    },

    // ── Execution ────────────────────────────────────────────────────
    /// Implementation rejected its logical or physical arguments.
    #[error("Invalid arguments for gate '{gate}': {reason}")]
    InvalidArguments {
        /// Name of the gate being executed.
        gate: String,
        /// Why the arguments were rejected.
        reason: String,
    },

    /// The pulse control layer reported a failure.
    #[error("Control error: {0}")]
    Control(String),

    // ── Graph ────────────────────────────────────────────────────────
    /// Component id does not exist in the graph.
    #[error("Unknown component {0}")]
    UnknownComponent(ComponentId),

    /// Component exists but has the wrong kind for the operation.
    #[error("Component {id} is a {found}, expected {expected}")]
    WrongComponent {
        /// The component id.
        id: ComponentId,
        /// Kind that was required.
        expected: &'static str,
        /// Kind that was found.
        found: &'static str,
    },

    /// Qubit pair built from the same qubit twice.
    #[error("Qubit pair needs two distinct qubits, got {0} twice")]
    SelfPair(ComponentId),
}

impl GateError {
    /// Returns `true` if the caller can recover by choosing other targets or
    /// another gate, without touching configuration.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Dispatch { .. } | Self::GateNotFound { .. })
    }

    /// Returns `true` for errors raised while validating a gate definition.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidKey { .. }
                | Self::InvalidImplementation { .. }
                | Self::ArityMismatch { .. }
                | Self::InvalidUnitary(_)
        )
    }
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;
