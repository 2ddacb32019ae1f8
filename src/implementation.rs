//! Gate implementation trait and call arguments.
//!
//! A [`GateImplementation`] is the hardware-bound half of a gate: it knows
//! which pulses realize the gate on the qubit (or pair) it is attached to.
//! Implementations are stored in the [`ComponentGraph`](crate::ComponentGraph)
//! and reached through a [`Gate`](crate::Gate) or a registry slot.
//!
//! ## Argument convention
//!
//! | Field | Carries | Example |
//! |-------|---------|---------|
//! | `logical` | abstract gate parameters | rotation angle |
//! | `physical` | pulse-level overrides | `amplitude`, `duration`, `extra_phase` |
//!
//! The split is a convention. Gates forward arguments untouched; each
//! implementation validates what it consumes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::control::PulseControl;
use crate::error::{GateError, GateResult};
use crate::graph::{Attachment, ComponentId};
use crate::qubit::Qubit;

/// Pulse-level overrides passed to an implementation.
pub type PhysicalParams = serde_json::Map<String, Value>;

/// Arguments of a gate call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateArgs {
    /// Logical parameters, e.g. rotation angles.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logical: Vec<f64>,
    /// Physical overrides, e.g. amplitude or extra phase.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub physical: PhysicalParams,
}

impl GateArgs {
    /// Create empty arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a logical argument.
    pub fn with_arg(mut self, value: f64) -> Self {
        self.logical.push(value);
        self
    }

    /// Set a physical override.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.physical.insert(key.into(), value.into());
        self
    }

    /// Get the logical argument at `index`.
    pub fn arg(&self, index: usize) -> Option<f64> {
        self.logical.get(index).copied()
    }

    /// Get a physical override.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.physical.get(key)
    }

    /// Get a numeric physical override.
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.physical.get(key).and_then(Value::as_f64)
    }
}

/// Everything an implementation sees when it runs.
#[derive(Debug, Clone, Copy)]
pub struct GateCall<'a> {
    /// Name of the gate being executed.
    pub gate: &'a str,
    /// The implementation component being executed.
    pub implementation: ComponentId,
    /// Qubit(s) the implementation is attached to.
    pub attachment: Attachment<'a>,
    /// Logical and physical arguments.
    pub args: &'a GateArgs,
}

impl<'a> GateCall<'a> {
    /// Build an [`GateError::InvalidArguments`] for this call.
    pub fn invalid(&self, reason: impl Into<String>) -> GateError {
        GateError::InvalidArguments {
            gate: self.gate.to_string(),
            reason: reason.into(),
        }
    }

    /// The qubit of a single-qubit attachment.
    pub fn qubit(&self) -> GateResult<&'a Qubit> {
        match self.attachment {
            Attachment::Qubit(qubit) => Ok(qubit),
            Attachment::Pair { .. } => Err(self.invalid("expected a single qubit, attached to a pair")),
        }
    }

    /// The `(control, target)` qubits of a pair attachment.
    pub fn pair(&self) -> GateResult<(&'a Qubit, &'a Qubit)> {
        match self.attachment {
            Attachment::Pair { control, target } => Ok((control, target)),
            Attachment::Qubit(_) => Err(self.invalid("expected a qubit pair, attached to a single qubit")),
        }
    }

    /// The first logical argument, interpreted as an angle.
    pub fn angle(&self) -> GateResult<f64> {
        self.args
            .arg(0)
            .ok_or_else(|| self.invalid("missing rotation angle (logical argument 0)"))
    }
}

/// Hardware-bound executable unit of a gate.
///
/// # Contract
///
/// - The implementation is attached to exactly one qubit or qubit pair,
///   directly or through one intermediate container.
/// - `execute()` is a blocking call into the pulse control layer.
/// - `execute()` MUST validate its own arguments; callers forward them
///   untouched.
pub trait GateImplementation: fmt::Debug + Send + Sync {
    /// Issue the pulse operations realizing the gate.
    fn execute(&self, call: &GateCall<'_>, control: &mut dyn PulseControl) -> GateResult<()>;
}
