//! Logical gates and implementation dispatch.
//!
//! A [`Gate`] maps target keys to implementations living in a
//! [`ComponentGraph`]. Every entry is validated when it is added:
//!
//! 1. the key is a qubit, a qubit pair, or a non-empty tuple of distinct ids;
//! 2. the value is an implementation attached to a qubit or qubit pair;
//! 3. the key has as many qubits as the implementation acts on (and as the
//!    gate's unitary, if it has one).
//!
//! Calls normalize their targets to a [`TargetKey`] and run the
//! implementation registered under it:
//!
//! ```text
//!   call(targets) ──→ normalize ──→ lookup ──→ execute(args)
//!                     (graph)       (key)      (implementation)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::control::PulseControl;
use crate::error::{GateError, GateResult};
use crate::graph::{ComponentGraph, ComponentId};
use crate::implementation::GateArgs;
use crate::qubit::{TargetKey, TargetSpec};
use crate::unitary::Unitary;

static NEXT_GATE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one [`Gate`] instance.
///
/// Two gates with the same name are still different gates; implementation
/// back-references compare by `GateId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GateId(u64);

impl GateId {
    fn next() -> Self {
        Self(NEXT_GATE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gate#{}", self.0)
    }
}

/// A logical gate with hardware implementations per target.
///
/// The implementation map is guarded by a lock: additions validate and
/// insert under the write side, calls only take the read side.
#[derive(Debug)]
pub struct Gate {
    id: GateId,
    name: String,
    unitary: Option<Unitary>,
    implementations: RwLock<FxHashMap<TargetKey, ComponentId>>,
}

impl Gate {
    /// Create a gate with no implementations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GateId::next(),
            name: name.into(),
            unitary: None,
            implementations: RwLock::new(FxHashMap::default()),
        }
    }

    /// Create a gate and validate every `(key, implementation)` entry.
    ///
    /// Fails on the first invalid entry. Each implementation's gate
    /// back-reference is set to the new gate.
    pub fn with_implementations<K: Into<TargetSpec>>(
        name: impl Into<String>,
        entries: impl IntoIterator<Item = (K, ComponentId)>,
        graph: &mut ComponentGraph,
    ) -> GateResult<Self> {
        let gate = Self::new(name);
        for (key, implementation) in entries {
            gate.insert(graph, key, implementation)?;
        }
        Ok(gate)
    }

    /// Attach a unitary.
    ///
    /// Fails if an already registered key acts on a different number of
    /// qubits.
    pub fn with_unitary(mut self, unitary: Unitary) -> GateResult<Self> {
        if let Some(key) = self.read().keys().find(|k| k.len() != unitary.num_qubits()) {
            return Err(GateError::ArityMismatch {
                gate: self.name.clone(),
                key: key.clone(),
                expected: unitary.num_qubits(),
                got: key.len(),
            });
        }
        self.unitary = Some(unitary);
        Ok(self)
    }

    /// Identity of this instance.
    pub fn id(&self) -> GateId {
        self.id
    }

    /// Gate name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unitary, if one was attached.
    pub fn unitary(&self) -> Option<&Unitary> {
        self.unitary.as_ref()
    }

    fn read(&self) -> RwLockReadGuard<'_, FxHashMap<TargetKey, ComponentId>> {
        self.implementations.read()
    }

    fn write(&self) -> RwLockWriteGuard<'_, FxHashMap<TargetKey, ComponentId>> {
        self.implementations.write()
    }

    /// Validate one entry and return its canonical key.
    pub fn validate_entry(
        &self,
        graph: &ComponentGraph,
        key: &TargetSpec,
        implementation: ComponentId,
    ) -> GateResult<TargetKey> {
        let key = self.validate_key(graph, key)?;

        let attachment = graph
            .implementation(implementation)
            .and_then(|_| graph.resolve_attachment(implementation))
            .map_err(|e| GateError::InvalidImplementation {
                gate: self.name.clone(),
                implementation,
                reason: e.to_string(),
            })?;

        let expected = attachment.num_qubits();
        if key.len() != expected {
            return Err(GateError::ArityMismatch {
                gate: self.name.clone(),
                got: key.len(),
                key,
                expected,
            });
        }
        if let Some(unitary) = &self.unitary {
            if key.len() != unitary.num_qubits() {
                return Err(GateError::ArityMismatch {
                    gate: self.name.clone(),
                    got: key.len(),
                    key,
                    expected: unitary.num_qubits(),
                });
            }
        }

        Ok(key)
    }

    fn validate_key(&self, graph: &ComponentGraph, key: &TargetSpec) -> GateResult<TargetKey> {
        let invalid = |reason: String| GateError::InvalidKey {
            gate: self.name.clone(),
            reason,
        };

        let key = match key {
            TargetSpec::Object(id) => {
                let component = graph.get(*id).map_err(|e| invalid(e.to_string()))?;
                if !component.is_quantum_object() {
                    return Err(invalid(format!(
                        "{} is a {}, expected a qubit or qubit pair",
                        id,
                        component.kind()
                    )));
                }
                graph.target_key_of(*id)?
            }
            TargetSpec::Ids(key) => key.clone(),
        };

        if key.is_empty() {
            return Err(invalid("empty target tuple".into()));
        }
        let mut seen = FxHashSet::default();
        if let Some(repeated) = key.iter().find(|id| !seen.insert(*id)) {
            return Err(invalid(format!("qubit {repeated} repeated in {key}")));
        }
        Ok(key)
    }

    /// Validate and add an entry, returning the implementation it replaced.
    pub fn insert(
        &self,
        graph: &mut ComponentGraph,
        key: impl Into<TargetSpec>,
        implementation: ComponentId,
    ) -> GateResult<Option<ComponentId>> {
        let mut entries = self.write();
        let key = self.validate_entry(graph, &key.into(), implementation)?;

        debug!("Registering {} implementation {} for {}", self.name, implementation, key);
        let previous = entries.insert(key, implementation);
        graph.bind_gate(implementation, self.id)?;

        if let Some(previous) = previous.filter(|p| *p != implementation) {
            if !entries.values().any(|v| *v == previous) {
                graph.unbind_gate(previous, self.id);
            }
        }
        Ok(previous)
    }

    /// Remove an entry, returning its implementation.
    ///
    /// The implementation's back-reference is cleared once no other key of
    /// this gate uses it.
    pub fn remove(
        &self,
        graph: &mut ComponentGraph,
        key: impl Into<TargetSpec>,
    ) -> GateResult<Option<ComponentId>> {
        let key = graph.normalize(&key.into())?;
        let mut entries = self.write();
        let removed = entries.remove(&key);
        if let Some(implementation) = removed {
            debug!("Removed {} implementation {} for {}", self.name, implementation, key);
            if !entries.values().any(|v| *v == implementation) {
                graph.unbind_gate(implementation, self.id);
            }
        }
        Ok(removed)
    }

    /// Re-run validation over every entry.
    pub fn revalidate(&self, graph: &ComponentGraph) -> GateResult<()> {
        for (key, implementation) in self.read().iter() {
            self.validate_entry(graph, &TargetSpec::Ids(key.clone()), *implementation)?;
        }
        Ok(())
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<TargetKey> {
        let mut keys: Vec<_> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Implementation registered under an exact key.
    pub fn implementation_for(&self, key: &TargetKey) -> Option<ComponentId> {
        self.read().get(key).copied()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the gate has no entries.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Normalize `targets` and find the implementation registered for them.
    pub fn resolve(
        &self,
        graph: &ComponentGraph,
        targets: impl Into<TargetSpec>,
    ) -> GateResult<ComponentId> {
        let key = graph.normalize(&targets.into())?;
        self.implementation_for(&key).ok_or_else(|| GateError::Dispatch {
            gate: self.name.clone(),
            targets: key.to_string(),
        })
    }

    /// Execute the gate on `targets`.
    ///
    /// Arguments are forwarded untouched to the implementation.
    pub fn call(
        &self,
        graph: &ComponentGraph,
        targets: impl Into<TargetSpec>,
        args: &GateArgs,
        control: &mut dyn PulseControl,
    ) -> GateResult<()> {
        let implementation = self.resolve(graph, targets)?;
        graph.execute_implementation(implementation, &self.name, args, control)
    }

    /// Find the unique implementation of this gate attached to `object`.
    ///
    /// First checks the object's slot named after the gate and accepts it if
    /// it is attached to `object` and bound to this exact gate. Otherwise
    /// scans this gate's entries for implementations owned by `object`.
    /// Returns `None` when there is no match or more than one.
    ///
    /// A slot aliasing a missing name counts as a miss; alias cycles and
    /// overlong chains are errors.
    pub fn get_implementation(
        &self,
        graph: &ComponentGraph,
        object: ComponentId,
    ) -> GateResult<Option<ComponentId>> {
        if graph.registry(object)?.contains(&self.name) {
            match graph.resolve_slot(object, &self.name) {
                Ok(implementation) => {
                    if graph.owner_of(implementation)? == object
                        && graph.implementation(implementation)?.gate() == Some(self.id)
                    {
                        return Ok(Some(implementation));
                    }
                }
                Err(GateError::UnknownSlot(missing)) => {
                    warn!(
                        "Slot {} on {} aliases missing slot {}, scanning {} entries",
                        self.name, object, missing, self.name
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let mut matches = FxHashSet::default();
        for implementation in self.read().values() {
            if graph.owner_of(*implementation)? == object {
                matches.insert(*implementation);
            }
        }

        match matches.len() {
            1 => Ok(matches.into_iter().next()),
            0 => Ok(None),
            n => {
                warn!(
                    "Gate {} has {} implementations attached to {}, none selected",
                    self.name, n, object
                );
                Ok(None)
            }
        }
    }

    /// Map every quantum object in the graph to its unique implementation
    /// of this gate, omitting objects with none or several.
    pub fn get_implementations(
        &self,
        graph: &ComponentGraph,
    ) -> GateResult<FxHashMap<ComponentId, ComponentId>> {
        let mut found = FxHashMap::default();
        for object in graph.quantum_objects() {
            if let Some(implementation) = self.get_implementation(graph, object)? {
                found.insert(object, implementation);
            }
        }
        Ok(found)
    }

    /// Execute this gate's implementation attached to `object`, bypassing
    /// target-key dispatch.
    pub fn execute_on(
        &self,
        graph: &ComponentGraph,
        object: ComponentId,
        args: &GateArgs,
        control: &mut dyn PulseControl,
    ) -> GateResult<()> {
        match self.get_implementation(graph, object)? {
            Some(implementation) => {
                graph.execute_implementation(implementation, &self.name, args, control)
            }
            None => Err(GateError::Dispatch {
                gate: self.name.clone(),
                targets: graph.target_key_of(object)?.to_string(),
            }),
        }
    }
}
