//! Applying gates on a qubit pair.

use std::sync::Arc;

use tracing::debug;

use crate::control::PulseControl;
use crate::error::{GateError, GateResult};
use crate::gate::Gate;
use crate::graph::{ComponentGraph, ComponentId};
use crate::implementation::GateArgs;
use crate::qubit::QubitPair;

/// A gate given by name or by instance.
#[derive(Debug, Clone, Copy)]
pub enum GateRef<'a> {
    /// Gate name.
    Name(&'a str),
    /// Gate instance; only its name is used for lookup.
    Gate(&'a Gate),
}

impl GateRef<'_> {
    /// Name used for lookup.
    pub fn name(&self) -> &str {
        match self {
            GateRef::Name(name) => name,
            GateRef::Gate(gate) => gate.name(),
        }
    }
}

impl<'a> From<&'a str> for GateRef<'a> {
    fn from(name: &'a str) -> Self {
        GateRef::Name(name)
    }
}

impl<'a> From<&'a String> for GateRef<'a> {
    fn from(name: &'a String) -> Self {
        GateRef::Name(name)
    }
}

impl<'a> From<&'a Gate> for GateRef<'a> {
    fn from(gate: &'a Gate) -> Self {
        GateRef::Gate(gate)
    }
}

impl<'a> From<&'a Arc<Gate>> for GateRef<'a> {
    fn from(gate: &'a Arc<Gate>) -> Self {
        GateRef::Gate(gate)
    }
}

/// A qubit pair together with the graph it lives in.
#[derive(Debug, Clone, Copy)]
pub struct QubitPairView<'g> {
    graph: &'g ComponentGraph,
    id: ComponentId,
    pair: &'g QubitPair,
}

impl<'g> QubitPairView<'g> {
    /// Component id of the pair.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// The underlying pair.
    pub fn pair(&self) -> &'g QubitPair {
        self.pair
    }

    /// Look up a gate registered on this pair.
    ///
    /// A gate instance is looked up by name; the registered gate is returned
    /// even when the caller passed a different instance.
    pub fn gate<'r>(&self, gate: impl Into<GateRef<'r>>) -> GateResult<&'g Arc<Gate>> {
        let gate = gate.into();
        self.pair
            .gates
            .get(gate.name())
            .ok_or_else(|| GateError::GateNotFound {
                gate: gate.name().to_string(),
                known: self.pair.gate_names(),
            })
    }

    /// Apply a registered gate to this pair.
    ///
    /// Runs the gate's implementation attached to this pair with `args`
    /// forwarded untouched.
    pub fn apply<'r>(
        &self,
        gate: impl Into<GateRef<'r>>,
        args: &GateArgs,
        control: &mut dyn PulseControl,
    ) -> GateResult<()> {
        let gate = self.gate(gate)?;
        debug!("Applying {} on qubit pair {}", gate.name(), self.id);
        gate.execute_on(self.graph, self.id, args, control)
    }
}

impl ComponentGraph {
    /// View a qubit pair for applying gates.
    pub fn pair_view(&self, id: ComponentId) -> GateResult<QubitPairView<'_>> {
        Ok(QubitPairView {
            graph: self,
            id,
            pair: self.qubit_pair(id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::PulseRecorder;
    use crate::qubit::Qubit;
    use crate::standard::FluxCz;

    fn cz_pair() -> (ComponentGraph, ComponentId, Arc<Gate>) {
        let mut graph = ComponentGraph::new();
        let q0 = graph.add_qubit(Qubit::new(0).with_flux("q0.z"));
        let q1 = graph.add_qubit(Qubit::new(1));
        let pair = graph.add_pair(q0, q1).unwrap();
        let imp = graph.implement(pair, "CZ", FluxCz::new("cz_flux")).unwrap();

        let cz = Arc::new(Gate::with_implementations("CZ", [(pair, imp)], &mut graph).unwrap());
        graph.qubit_pair_mut(pair).unwrap().add_gate(Arc::clone(&cz));
        (graph, pair, cz)
    }

    #[test]
    fn test_apply_by_name() {
        let (graph, pair, _) = cz_pair();
        let mut rec = PulseRecorder::new();
        graph
            .pair_view(pair)
            .unwrap()
            .apply("CZ", &GateArgs::new(), &mut rec)
            .unwrap();
        assert_eq!(rec.played(), vec!["cz_flux"]);
    }

    #[test]
    fn test_registered_gate_wins_over_instance() {
        let (graph, pair, cz) = cz_pair();
        let outsider = Gate::new("CZ");
        let view = graph.pair_view(pair).unwrap();

        let resolved = view.gate(&outsider).unwrap();
        assert!(Arc::ptr_eq(resolved, &cz));

        let mut rec = PulseRecorder::new();
        view.apply(&outsider, &GateArgs::new(), &mut rec).unwrap();
        assert_eq!(rec.played(), vec!["cz_flux"]);
    }

    #[test]
    fn test_apply_unknown_gate_lists_known() {
        let (graph, pair, _) = cz_pair();
        let err = graph
            .pair_view(pair)
            .unwrap()
            .apply("CZ_fast", &GateArgs::new(), &mut PulseRecorder::new())
            .unwrap_err();

        match err {
            GateError::GateNotFound { gate, known } => {
                assert_eq!(gate, "CZ_fast");
                assert_eq!(known, vec!["CZ"]);
            }
            other => panic!("expected gate not found, got {other:?}"),
        }
    }

    #[test]
    fn test_pair_view_rejects_qubit() {
        let (graph, pair, _) = cz_pair();
        let control = graph.qubit_pair(pair).unwrap().control;
        assert!(graph.pair_view(control).is_err());
    }
}
