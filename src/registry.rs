//! Per-object implementation registry and alias resolution.
//!
//! Every [`Qubit`](crate::Qubit) and [`QubitPair`](crate::QubitPair) owns an
//! [`ImplementationRegistry`]: a map from slot name to [`Slot`]. A slot either
//! holds a concrete implementation or aliases another slot of the same
//! registry:
//!
//! ```text
//!   "CZ"      ──→ Alias("CZ_fast")
//!   "CZ_fast" ──→ Concrete(#7)
//!   "CZ_slow" ──→ Concrete(#8)
//! ```
//!
//! Aliases are written on the registration surface with the reference
//! syntax `#./<slot>` and are parsed into [`Slot::Alias`] once, at
//! registration time.

use std::fmt;
use std::str::FromStr;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{GateError, GateResult};
use crate::graph::ComponentId;

/// Prefix marking a reference to another slot of the same registry.
pub const REFERENCE_PREFIX: &str = "#./";

/// Content of a named implementation slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SlotRepr", into = "SlotRepr")]
pub enum Slot {
    /// A concrete implementation component.
    Concrete(ComponentId),
    /// Another slot name in the same registry.
    Alias(String),
}

impl Slot {
    /// Create an alias to `name`.
    pub fn alias(name: impl Into<String>) -> Self {
        Slot::Alias(name.into())
    }

    /// Parse a `#./<slot>` reference.
    pub fn parse_reference(reference: &str) -> GateResult<Self> {
        match reference.strip_prefix(REFERENCE_PREFIX) {
            Some(name) if !name.is_empty() && !name.contains('/') => Ok(Slot::alias(name)),
            _ => Err(GateError::InvalidReference(reference.to_string())),
        }
    }

    /// Check if this slot is an alias.
    pub fn is_alias(&self) -> bool {
        matches!(self, Slot::Alias(_))
    }
}

impl FromStr for Slot {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slot::parse_reference(s)
    }
}

impl From<ComponentId> for Slot {
    fn from(id: ComponentId) -> Self {
        Slot::Concrete(id)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Concrete(id) => write!(f, "{id}"),
            Slot::Alias(name) => write!(f, "{REFERENCE_PREFIX}{name}"),
        }
    }
}

/// Wire form of a slot: a bare component id or a reference string.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SlotRepr {
    Concrete(ComponentId),
    Reference(String),
}

impl TryFrom<SlotRepr> for Slot {
    type Error = GateError;

    fn try_from(repr: SlotRepr) -> Result<Self, Self::Error> {
        match repr {
            SlotRepr::Concrete(id) => Ok(Slot::Concrete(id)),
            SlotRepr::Reference(s) => Slot::parse_reference(&s),
        }
    }
}

impl From<Slot> for SlotRepr {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Concrete(id) => SlotRepr::Concrete(id),
            Slot::Alias(name) => SlotRepr::Reference(format!("{REFERENCE_PREFIX}{name}")),
        }
    }
}

/// Named implementation slots of one quantum object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImplementationRegistry {
    slots: FxHashMap<String, Slot>,
}

impl ImplementationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a slot, returning the previous content.
    pub fn insert(&mut self, name: impl Into<String>, slot: impl Into<Slot>) -> Option<Slot> {
        self.slots.insert(name.into(), slot.into())
    }

    /// Remove a slot.
    pub fn remove(&mut self, name: &str) -> Option<Slot> {
        self.slots.remove(name)
    }

    /// Get the raw slot content without following aliases.
    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    /// Check if a slot exists.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Sorted slot names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Iterate over concrete implementations, skipping aliases.
    pub fn concrete(&self) -> impl Iterator<Item = (&str, ComponentId)> {
        self.slots.iter().filter_map(|(name, slot)| match slot {
            Slot::Concrete(id) => Some((name.as_str(), *id)),
            Slot::Alias(_) => None,
        })
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Follow aliases from `name` to a concrete implementation.
    ///
    /// Fails with [`GateError::AliasCycle`] if a slot is visited twice and
    /// with [`GateError::AliasDepthExceeded`] if more than `max_hops` aliases
    /// are followed.
    pub fn resolve(&self, name: &str, max_hops: usize) -> GateResult<ComponentId> {
        let mut chain = vec![name.to_string()];
        let mut visited = FxHashSet::default();
        visited.insert(name);

        let mut current = name;
        let mut hops = 0;
        loop {
            let slot = self
                .slots
                .get(current)
                .ok_or_else(|| GateError::UnknownSlot(current.to_string()))?;

            let next = match slot {
                Slot::Concrete(id) => return Ok(*id),
                Slot::Alias(next) => next.as_str(),
            };

            chain.push(next.to_string());
            if !visited.insert(next) {
                return Err(GateError::AliasCycle { chain });
            }

            hops += 1;
            if hops > max_hops {
                return Err(GateError::AliasDepthExceeded {
                    name: name.to_string(),
                    max_hops,
                });
            }

            trace!("Alias hop {}: {} -> {}", hops, current, next);
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_fast_cz() -> ImplementationRegistry {
        let mut reg = ImplementationRegistry::new();
        reg.insert("CZ_fast", ComponentId(7));
        reg.insert("CZ_slow", ComponentId(8));
        reg.insert("CZ", Slot::parse_reference("#./CZ_fast").unwrap());
        reg
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(Slot::parse_reference("#./CZ_fast").unwrap(), Slot::alias("CZ_fast"));
        assert!(Slot::parse_reference("CZ_fast").is_err());
        assert!(Slot::parse_reference("#./").is_err());
        assert!(Slot::parse_reference("#./a/b").is_err());
        assert!("#./X".parse::<Slot>().unwrap().is_alias());
    }

    #[test]
    fn test_resolve_direct_and_alias() {
        let reg = registry_with_fast_cz();
        assert_eq!(reg.resolve("CZ_slow", 8).unwrap(), ComponentId(8));
        assert_eq!(reg.resolve("CZ", 8).unwrap(), ComponentId(7));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let reg = registry_with_fast_cz();
        let first = reg.resolve("CZ", 8).unwrap();
        let second = reg.resolve("CZ", 8).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let mut reg = ImplementationRegistry::new();
        reg.insert("CZ", Slot::alias("CZ"));
        match reg.resolve("CZ", 8) {
            Err(GateError::AliasCycle { chain }) => assert_eq!(chain, vec!["CZ", "CZ"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_two_slot_cycle() {
        let mut reg = ImplementationRegistry::new();
        reg.insert("a", Slot::alias("b"));
        reg.insert("b", Slot::alias("a"));
        assert!(matches!(reg.resolve("a", 8), Err(GateError::AliasCycle { .. })));
    }

    #[test]
    fn test_depth_bound() {
        let mut reg = ImplementationRegistry::new();
        for i in 0..5 {
            reg.insert(format!("s{i}"), Slot::alias(format!("s{}", i + 1)));
        }
        reg.insert("s5", ComponentId(1));

        assert_eq!(reg.resolve("s0", 5).unwrap(), ComponentId(1));
        assert!(matches!(
            reg.resolve("s0", 4),
            Err(GateError::AliasDepthExceeded { max_hops: 4, .. })
        ));
    }

    #[test]
    fn test_dangling_alias() {
        let mut reg = ImplementationRegistry::new();
        reg.insert("CZ", Slot::alias("CZ_missing"));
        match reg.resolve("CZ", 8) {
            Err(GateError::UnknownSlot(name)) => assert_eq!(name, "CZ_missing"),
            other => panic!("expected unknown slot, got {other:?}"),
        }
    }

    #[test]
    fn test_slot_serde() {
        let reg = registry_with_fast_cz();
        let json = serde_json::to_value(&reg).unwrap();
        assert_eq!(json["slots"]["CZ"], "#./CZ_fast");
        assert_eq!(json["slots"]["CZ_fast"], 7);

        let slot: Slot = serde_json::from_str(r##""#./CZ_slow""##).unwrap();
        assert_eq!(slot, Slot::alias("CZ_slow"));
        assert!(serde_json::from_str::<Slot>(r#""CZ_slow""#).is_err());
    }
}
