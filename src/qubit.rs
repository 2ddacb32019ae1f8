//! Qubit identity, target keys and the quantum objects gates act on.
//!
//! A target can be written three ways: a single identifier, an explicit
//! tuple of identifiers, or a [`Qubit`]/[`QubitPair`] component. All three
//! normalize to the same [`TargetKey`]:
//!
//! ```text
//!   Qubit component      ──→ (id,)
//!   QubitPair component  ──→ (control.id, target.id)
//!   single identifier    ──→ (id,)
//!   sequence             ──→ (id0, id1, ...)
//! ```

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::gate::Gate;
use crate::graph::ComponentId;
use crate::registry::ImplementationRegistry;

/// Identifier of a physical qubit: an integer index or a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QubitId {
    /// Integer index, e.g. `0`.
    Index(i64),
    /// Symbolic name, e.g. `"q0"`.
    Name(String),
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QubitId::Index(i) => write!(f, "{i}"),
            QubitId::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<i64> for QubitId {
    fn from(i: i64) -> Self {
        QubitId::Index(i)
    }
}

impl From<i32> for QubitId {
    fn from(i: i32) -> Self {
        QubitId::Index(i64::from(i))
    }
}

impl From<u32> for QubitId {
    fn from(i: u32) -> Self {
        QubitId::Index(i64::from(i))
    }
}

impl From<&str> for QubitId {
    fn from(name: &str) -> Self {
        QubitId::Name(name.to_string())
    }
}

impl From<String> for QubitId {
    fn from(name: String) -> Self {
        QubitId::Name(name)
    }
}

/// Canonical, ordered tuple of qubit identifiers used to index a gate's
/// implementations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetKey(pub Vec<QubitId>);

impl TargetKey {
    /// Create a key from any sequence of identifiers.
    pub fn new(ids: impl IntoIterator<Item = impl Into<QubitId>>) -> Self {
        Self(ids.into_iter().map(Into::into).collect())
    }

    /// Number of qubits in the key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the key has no qubits.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the identifiers in order.
    pub fn iter(&self) -> impl Iterator<Item = &QubitId> {
        self.0.iter()
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}")?;
        }
        write!(f, ")")
    }
}

impl From<QubitId> for TargetKey {
    fn from(id: QubitId) -> Self {
        Self(vec![id])
    }
}

impl From<Vec<QubitId>> for TargetKey {
    fn from(ids: Vec<QubitId>) -> Self {
        Self(ids)
    }
}

impl<A: Into<QubitId>, B: Into<QubitId>> From<(A, B)> for TargetKey {
    fn from((a, b): (A, B)) -> Self {
        Self(vec![a.into(), b.into()])
    }
}

impl<T: Into<QubitId>, const N: usize> From<[T; N]> for TargetKey {
    fn from(ids: [T; N]) -> Self {
        Self::new(ids)
    }
}

/// Target specification: a quantum-object component or explicit identifiers.
///
/// Used both as an implementation key when configuring a [`Gate`] and as
/// the target of a gate call. Normalized with
/// [`ComponentGraph::normalize`](crate::ComponentGraph::normalize).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A `Qubit` or `QubitPair` component.
    Object(ComponentId),
    /// One or more qubit identifiers.
    Ids(TargetKey),
}

impl From<ComponentId> for TargetSpec {
    fn from(id: ComponentId) -> Self {
        TargetSpec::Object(id)
    }
}

impl From<TargetKey> for TargetSpec {
    fn from(key: TargetKey) -> Self {
        TargetSpec::Ids(key)
    }
}

impl From<QubitId> for TargetSpec {
    fn from(id: QubitId) -> Self {
        TargetSpec::Ids(id.into())
    }
}

impl From<i32> for TargetSpec {
    fn from(i: i32) -> Self {
        QubitId::from(i).into()
    }
}

impl From<i64> for TargetSpec {
    fn from(i: i64) -> Self {
        QubitId::from(i).into()
    }
}

impl From<u32> for TargetSpec {
    fn from(i: u32) -> Self {
        QubitId::from(i).into()
    }
}

impl From<&str> for TargetSpec {
    fn from(name: &str) -> Self {
        QubitId::from(name).into()
    }
}

impl From<String> for TargetSpec {
    fn from(name: String) -> Self {
        QubitId::from(name).into()
    }
}

impl From<Vec<QubitId>> for TargetSpec {
    fn from(ids: Vec<QubitId>) -> Self {
        TargetSpec::Ids(ids.into())
    }
}

impl<A: Into<QubitId>, B: Into<QubitId>> From<(A, B)> for TargetSpec {
    fn from(pair: (A, B)) -> Self {
        TargetSpec::Ids(pair.into())
    }
}

impl<T: Into<QubitId>, const N: usize> From<[T; N]> for TargetSpec {
    fn from(ids: [T; N]) -> Self {
        TargetSpec::Ids(ids.into())
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Object(id) => write!(f, "{id}"),
            TargetSpec::Ids(key) => write!(f, "{key}"),
        }
    }
}

/// A physical qubit.
#[derive(Debug, Clone)]
pub struct Qubit {
    /// Stable identifier.
    pub id: QubitId,
    /// Drive (XY) channel name.
    pub drive: String,
    /// Flux (Z) channel name, if the qubit is tunable.
    pub flux: Option<String>,
    /// Named implementation slots owned by this qubit.
    pub implementations: ImplementationRegistry,
}

impl Qubit {
    /// Create a qubit whose drive channel is named `<id>.xy`.
    pub fn new(id: impl Into<QubitId>) -> Self {
        let id = id.into();
        Self {
            drive: format!("{id}.xy"),
            id,
            flux: None,
            implementations: ImplementationRegistry::new(),
        }
    }

    /// Override the drive channel name.
    pub fn with_drive(mut self, channel: impl Into<String>) -> Self {
        self.drive = channel.into();
        self
    }

    /// Attach a flux channel; `None` on a fresh qubit.
    pub fn with_flux(mut self, channel: impl Into<String>) -> Self {
        self.flux = Some(channel.into());
        self
    }
}

/// Two qubits coupled for two-qubit gates.
#[derive(Debug)]
pub struct QubitPair {
    /// Control qubit component.
    pub control: ComponentId,
    /// Target qubit component.
    pub target: ComponentId,
    /// Two-qubit gates available on this pair, by name.
    pub gates: FxHashMap<String, Arc<Gate>>,
    /// Named implementation slots owned by this pair.
    pub implementations: ImplementationRegistry,
}

impl QubitPair {
    pub(crate) fn new(control: ComponentId, target: ComponentId) -> Self {
        Self {
            control,
            target,
            gates: FxHashMap::default(),
            implementations: ImplementationRegistry::new(),
        }
    }

    /// Register a gate under its own name, replacing any previous entry.
    pub fn add_gate(&mut self, gate: Arc<Gate>) -> Option<Arc<Gate>> {
        self.gates.insert(gate.name().to_string(), gate)
    }

    /// Sorted names of the gates registered on this pair.
    pub fn gate_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.gates.keys().cloned().collect();
        names.sort();
        names
    }
}
