//! Component graph: quantum objects, containers and attached implementations.
//!
//! The graph is an arena of [`Component`]s linked by single-parent
//! attachment. It stands in for the configuration tree that owns qubits in
//! a full control stack and exposes only what resolution needs: identity,
//! parent links and the per-object implementation registries.
//!
//! ```text
//!   Qubit q0 ─┬─ Implementation "x"          (1 hop)
//!             └─ Container "macros"
//!                   └─ Implementation "sx"    (2 hops)
//!
//!   QubitPair (q0, q1) ── Implementation "CZ_fast"
//! ```
//!
//! An implementation resolves to the first quantum object found within two
//! hops up its parent chain. Anything deeper is an attachment error.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::DispatchConfig;
use crate::control::PulseControl;
use crate::error::{GateError, GateResult};
use crate::gate::GateId;
use crate::implementation::{GateArgs, GateCall, GateImplementation};
use crate::qubit::{Qubit, QubitId, QubitPair, TargetKey, TargetSpec};
use crate::registry::{ImplementationRegistry, Slot};

/// Maximum number of parent hops from an implementation to its owner.
pub const MAX_ATTACHMENT_HOPS: usize = 2;

/// Index of a component in a [`ComponentGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub(crate) usize);

impl ComponentId {
    /// Arena index of this component.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An implementation stored in the graph, with its gate back-reference.
#[derive(Debug)]
pub struct ImplementationNode {
    implementation: Box<dyn GateImplementation>,
    gate: Option<GateId>,
}

impl ImplementationNode {
    /// The executable implementation.
    pub fn implementation(&self) -> &dyn GateImplementation {
        self.implementation.as_ref()
    }

    /// Gate this implementation is bound to, if any.
    pub fn gate(&self) -> Option<GateId> {
        self.gate
    }
}

/// A node of the component graph.
#[derive(Debug)]
pub enum Component {
    /// A physical qubit.
    Qubit(Qubit),
    /// A coupled pair of qubits.
    QubitPair(QubitPair),
    /// An intermediate grouping node with no semantics of its own.
    Container(String),
    /// A gate implementation.
    Implementation(ImplementationNode),
}

impl Component {
    /// Short name of the component kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Qubit(_) => "qubit",
            Component::QubitPair(_) => "qubit pair",
            Component::Container(_) => "container",
            Component::Implementation(_) => "implementation",
        }
    }

    /// Check if this is a qubit or qubit pair.
    pub fn is_quantum_object(&self) -> bool {
        matches!(self, Component::Qubit(_) | Component::QubitPair(_))
    }

    fn registry(&self) -> Option<&ImplementationRegistry> {
        match self {
            Component::Qubit(q) => Some(&q.implementations),
            Component::QubitPair(p) => Some(&p.implementations),
            _ => None,
        }
    }

    fn registry_mut(&mut self) -> Option<&mut ImplementationRegistry> {
        match self {
            Component::Qubit(q) => Some(&mut q.implementations),
            Component::QubitPair(p) => Some(&mut p.implementations),
            _ => None,
        }
    }
}

/// The qubit(s) an implementation acts on.
#[derive(Debug, Clone, Copy)]
pub enum Attachment<'a> {
    /// A single qubit.
    Qubit(&'a Qubit),
    /// A qubit pair, resolved to its two qubits.
    Pair {
        /// Control qubit.
        control: &'a Qubit,
        /// Target qubit.
        target: &'a Qubit,
    },
}

impl Attachment<'_> {
    /// Number of qubits acted on.
    pub fn num_qubits(&self) -> usize {
        match self {
            Attachment::Qubit(_) => 1,
            Attachment::Pair { .. } => 2,
        }
    }

    /// Identifiers of the qubits acted on, in order.
    pub fn target_key(&self) -> TargetKey {
        match self {
            Attachment::Qubit(q) => TargetKey::from(q.id.clone()),
            Attachment::Pair { control, target } => {
                TargetKey(vec![control.id.clone(), target.id.clone()])
            }
        }
    }
}

#[derive(Debug)]
struct Node {
    component: Component,
    parent: Option<ComponentId>,
}

/// Arena of components linked by single-parent attachment.
#[derive(Debug, Default)]
pub struct ComponentGraph {
    nodes: Vec<Node>,
    config: DispatchConfig,
}

impl ComponentGraph {
    /// Create an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with the given configuration.
    pub fn with_config(config: DispatchConfig) -> Self {
        Self {
            nodes: Vec::new(),
            config,
        }
    }

    /// Configuration used for resolution.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no components.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, component: Component, parent: Option<ComponentId>) -> ComponentId {
        let id = ComponentId(self.nodes.len());
        self.nodes.push(Node { component, parent });
        id
    }

    fn node(&self, id: ComponentId) -> GateResult<&Node> {
        self.nodes.get(id.0).ok_or(GateError::UnknownComponent(id))
    }

    fn node_mut(&mut self, id: ComponentId) -> GateResult<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(GateError::UnknownComponent(id))
    }

    /// Add a qubit.
    pub fn add_qubit(&mut self, qubit: Qubit) -> ComponentId {
        debug!("Adding qubit {}", qubit.id);
        self.push(Component::Qubit(qubit), None)
    }

    /// Add a pair of two existing qubits.
    pub fn add_pair(&mut self, control: ComponentId, target: ComponentId) -> GateResult<ComponentId> {
        if control == target {
            return Err(GateError::SelfPair(control));
        }
        let control_id = self.qubit(control)?.id.clone();
        let target_id = self.qubit(target)?.id.clone();
        debug!("Adding qubit pair ({}, {})", control_id, target_id);
        Ok(self.push(Component::QubitPair(QubitPair::new(control, target)), None))
    }

    /// Add a grouping container under `parent`.
    pub fn add_container(
        &mut self,
        name: impl Into<String>,
        parent: ComponentId,
    ) -> GateResult<ComponentId> {
        self.check_attachable(parent)?;
        Ok(self.push(Component::Container(name.into()), Some(parent)))
    }

    /// Attach an implementation under `parent` without registering it.
    ///
    /// The attachment is permanent. `parent` may be a quantum object or a
    /// container; whether the implementation resolves to a qubit is checked
    /// at resolution time.
    pub fn attach_implementation(
        &mut self,
        parent: ComponentId,
        implementation: impl GateImplementation + 'static,
    ) -> GateResult<ComponentId> {
        self.check_attachable(parent)?;
        let id = self.push(
            Component::Implementation(ImplementationNode {
                implementation: Box::new(implementation),
                gate: None,
            }),
            Some(parent),
        );
        debug!("Attached implementation {} under {}", id, parent);
        Ok(id)
    }

    /// Attach an implementation directly under `object` and register it in
    /// the object's registry as `name`.
    pub fn implement(
        &mut self,
        object: ComponentId,
        name: impl Into<String>,
        implementation: impl GateImplementation + 'static,
    ) -> GateResult<ComponentId> {
        self.registry(object)?;
        let id = self.attach_implementation(object, implementation)?;
        self.register(object, name, Slot::Concrete(id))?;
        Ok(id)
    }

    fn check_attachable(&self, parent: ComponentId) -> GateResult<()> {
        match &self.node(parent)?.component {
            Component::Implementation(_) => Err(GateError::WrongComponent {
                id: parent,
                expected: "qubit, qubit pair or container",
                found: "implementation",
            }),
            _ => Ok(()),
        }
    }

    /// Assign a slot in a quantum object's registry, returning the previous
    /// content.
    ///
    /// A concrete slot must hold an implementation attached to `object`.
    pub fn register(
        &mut self,
        object: ComponentId,
        name: impl Into<String>,
        slot: impl Into<Slot>,
    ) -> GateResult<Option<Slot>> {
        let name = name.into();
        let slot = slot.into();
        if let Slot::Concrete(implementation) = slot {
            let owner = self.owner_of(implementation)?;
            if owner != object {
                return Err(GateError::ForeignImplementation {
                    name,
                    object,
                    implementation,
                    owner,
                });
            }
        }

        debug!("Registering slot {} on {}: {}", name, object, slot);
        let node = self.node_mut(object)?;
        let found = node.component.kind();
        node.component
            .registry_mut()
            .map(|registry| registry.insert(name, slot))
            .ok_or(GateError::WrongComponent {
                id: object,
                expected: "qubit or qubit pair",
                found,
            })
    }

    /// Assign a slot from a `#./<slot>` reference string.
    pub fn register_reference(
        &mut self,
        object: ComponentId,
        name: impl Into<String>,
        reference: &str,
    ) -> GateResult<Option<Slot>> {
        let slot = Slot::parse_reference(reference)?;
        self.register(object, name, slot)
    }

    /// Implementation registry of a quantum object.
    pub fn registry(&self, object: ComponentId) -> GateResult<&ImplementationRegistry> {
        let component = &self.node(object)?.component;
        component.registry().ok_or(GateError::WrongComponent {
            id: object,
            expected: "qubit or qubit pair",
            found: component.kind(),
        })
    }

    /// Resolve a named slot of a quantum object, following aliases.
    pub fn resolve_slot(&self, object: ComponentId, name: &str) -> GateResult<ComponentId> {
        self.registry(object)?
            .resolve(name, self.config.max_alias_hops)
    }

    /// Get a component.
    pub fn get(&self, id: ComponentId) -> GateResult<&Component> {
        Ok(&self.node(id)?.component)
    }

    /// Parent of a component.
    pub fn parent(&self, id: ComponentId) -> GateResult<Option<ComponentId>> {
        Ok(self.node(id)?.parent)
    }

    /// Get a qubit.
    pub fn qubit(&self, id: ComponentId) -> GateResult<&Qubit> {
        match &self.node(id)?.component {
            Component::Qubit(q) => Ok(q),
            other => Err(GateError::WrongComponent {
                id,
                expected: "qubit",
                found: other.kind(),
            }),
        }
    }

    /// Get a qubit pair.
    pub fn qubit_pair(&self, id: ComponentId) -> GateResult<&QubitPair> {
        match &self.node(id)?.component {
            Component::QubitPair(p) => Ok(p),
            other => Err(GateError::WrongComponent {
                id,
                expected: "qubit pair",
                found: other.kind(),
            }),
        }
    }

    /// Get a qubit pair for mutation, e.g. to add gates.
    pub fn qubit_pair_mut(&mut self, id: ComponentId) -> GateResult<&mut QubitPair> {
        match &mut self.node_mut(id)?.component {
            Component::QubitPair(p) => Ok(p),
            other => Err(GateError::WrongComponent {
                id,
                expected: "qubit pair",
                found: other.kind(),
            }),
        }
    }

    /// Get an implementation node.
    pub fn implementation(&self, id: ComponentId) -> GateResult<&ImplementationNode> {
        match &self.node(id)?.component {
            Component::Implementation(imp) => Ok(imp),
            other => Err(GateError::WrongComponent {
                id,
                expected: "implementation",
                found: other.kind(),
            }),
        }
    }

    /// Find the qubit component with the given identifier.
    pub fn find_qubit(&self, id: &QubitId) -> Option<ComponentId> {
        self.nodes.iter().enumerate().find_map(|(i, node)| match &node.component {
            Component::Qubit(q) if &q.id == id => Some(ComponentId(i)),
            _ => None,
        })
    }

    /// All qubits and qubit pairs, in insertion order.
    pub fn quantum_objects(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.component.is_quantum_object())
            .map(|(i, _)| ComponentId(i))
    }

    /// Quantum object an implementation is attached to.
    ///
    /// Looks at the parent, then the grandparent; see
    /// [`MAX_ATTACHMENT_HOPS`].
    pub fn owner_of(&self, implementation: ComponentId) -> GateResult<ComponentId> {
        self.implementation(implementation)?;

        let mut current = implementation;
        for _ in 0..MAX_ATTACHMENT_HOPS {
            let Some(parent) = self.node(current)?.parent else {
                break;
            };
            if self.node(parent)?.component.is_quantum_object() {
                return Ok(parent);
            }
            current = parent;
        }

        Err(GateError::Attachment { implementation })
    }

    /// Resolve the qubit(s) an implementation acts on.
    pub fn resolve_attachment(&self, implementation: ComponentId) -> GateResult<Attachment<'_>> {
        let owner = self.owner_of(implementation)?;
        match &self.node(owner)?.component {
            Component::Qubit(q) => Ok(Attachment::Qubit(q)),
            Component::QubitPair(pair) => Ok(Attachment::Pair {
                control: self.qubit(pair.control)?,
                target: self.qubit(pair.target)?,
            }),
            _ => Err(GateError::Attachment { implementation }),
        }
    }

    /// Identifier tuple of a qubit or qubit pair.
    pub fn target_key_of(&self, object: ComponentId) -> GateResult<TargetKey> {
        match &self.node(object)?.component {
            Component::Qubit(q) => Ok(TargetKey::from(q.id.clone())),
            Component::QubitPair(pair) => Ok(TargetKey(vec![
                self.qubit(pair.control)?.id.clone(),
                self.qubit(pair.target)?.id.clone(),
            ])),
            other => Err(GateError::WrongComponent {
                id: object,
                expected: "qubit or qubit pair",
                found: other.kind(),
            }),
        }
    }

    /// Normalize a target specification to its canonical identifier tuple.
    pub fn normalize(&self, spec: &TargetSpec) -> GateResult<TargetKey> {
        match spec {
            TargetSpec::Object(id) => self.target_key_of(*id),
            TargetSpec::Ids(key) => Ok(key.clone()),
        }
    }

    /// Record that `implementation` realizes the gate `gate`.
    pub(crate) fn bind_gate(&mut self, implementation: ComponentId, gate: GateId) -> GateResult<()> {
        match &mut self.node_mut(implementation)?.component {
            Component::Implementation(node) => {
                if let Some(previous) = node.gate.filter(|g| *g != gate) {
                    warn!(
                        "Rebinding implementation {} from gate {} to gate {}",
                        implementation, previous, gate
                    );
                }
                node.gate = Some(gate);
                Ok(())
            }
            other => Err(GateError::WrongComponent {
                id: implementation,
                expected: "implementation",
                found: other.kind(),
            }),
        }
    }

    /// Clear the back-reference if it still points at `gate`.
    pub(crate) fn unbind_gate(&mut self, implementation: ComponentId, gate: GateId) {
        if let Ok(Node {
            component: Component::Implementation(node),
            ..
        }) = self.node_mut(implementation)
        {
            if node.gate == Some(gate) {
                node.gate = None;
            }
        }
    }

    /// Run an implementation with the given arguments.
    pub fn execute_implementation(
        &self,
        implementation: ComponentId,
        gate: &str,
        args: &GateArgs,
        control: &mut dyn PulseControl,
    ) -> GateResult<()> {
        let node = self.implementation(implementation)?;
        let attachment = self.resolve_attachment(implementation)?;
        debug!(
            "Executing {} implementation {} on {}",
            gate,
            implementation,
            attachment.target_key()
        );
        let call = GateCall {
            gate,
            implementation,
            attachment,
            args,
        };
        node.implementation.execute(&call, control)
    }
}
