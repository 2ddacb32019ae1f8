//! End-to-end dispatch over a small chip.
//!
//! The chip is three flux-tunable qubits in a line with couplers (0, 1) and
//! (1, 2). Single-qubit gates are implemented per qubit, CZ per pair, and
//! each pair carries a fast and a slow CZ with `CZ` aliased to the fast one.

use std::f64::consts::PI;
use std::sync::Arc;

use gate_dispatch::{
    ComponentGraph, ComponentId, DispatchConfig, FluxCz, Gate, GateArgs, GateError, PulseGate,
    PulseOp, PulseRecorder, Qubit, Slot, Unitary, VirtualZ,
};

struct Chip {
    graph: ComponentGraph,
    qubits: Vec<ComponentId>,
    pairs: Vec<ComponentId>,
    x: Arc<Gate>,
    rz: Arc<Gate>,
    cz: Arc<Gate>,
}

fn build_chip() -> Chip {
    let mut graph = ComponentGraph::with_config(DispatchConfig::default());
    let qubits: Vec<_> = (0..3)
        .map(|i| graph.add_qubit(Qubit::new(i).with_flux(format!("q{i}.z"))))
        .collect();
    let pairs = vec![
        graph.add_pair(qubits[0], qubits[1]).unwrap(),
        graph.add_pair(qubits[1], qubits[2]).unwrap(),
    ];

    let mut x_entries = Vec::new();
    let mut rz_entries = Vec::new();
    for (i, &q) in qubits.iter().enumerate() {
        // Single-qubit macros live in a container under the qubit.
        let macros = graph.add_container("macros", q).unwrap();
        let x = graph.attach_implementation(macros, PulseGate::new("x180")).unwrap();
        graph.register(q, "X", Slot::Concrete(x)).unwrap();
        let rz = graph.implement(q, "Rz", VirtualZ).unwrap();
        x_entries.push((i as i64, x));
        rz_entries.push((i as i64, rz));
    }

    let mut cz_entries = Vec::new();
    for (i, &pair) in pairs.iter().enumerate() {
        let fast = graph
            .implement(pair, "CZ_fast", FluxCz::new(format!("cz{i}_fast")))
            .unwrap();
        graph
            .implement(pair, "CZ_slow", FluxCz::new(format!("cz{i}_slow")))
            .unwrap();
        graph.register_reference(pair, "CZ", "#./CZ_fast").unwrap();
        cz_entries.push((pair, fast));
    }

    let x = Arc::new(
        Gate::with_implementations("X", x_entries, &mut graph)
            .unwrap()
            .with_unitary(Unitary::x())
            .unwrap(),
    );
    let rz = Arc::new(Gate::with_implementations("Rz", rz_entries, &mut graph).unwrap());
    let cz = Arc::new(
        Gate::with_implementations("CZ", cz_entries, &mut graph)
            .unwrap()
            .with_unitary(Unitary::cz())
            .unwrap(),
    );
    for &pair in &pairs {
        graph.qubit_pair_mut(pair).unwrap().add_gate(Arc::clone(&cz));
    }

    Chip {
        graph,
        qubits,
        pairs,
        x,
        rz,
        cz,
    }
}

#[test]
fn cz_runs_on_registered_pairs_only() {
    let chip = build_chip();
    let mut rec = PulseRecorder::new();

    chip.cz.call(&chip.graph, (0, 1), &GateArgs::new(), &mut rec).unwrap();
    chip.cz.call(&chip.graph, (1, 2), &GateArgs::new(), &mut rec).unwrap();
    assert_eq!(rec.played(), vec!["cz0_fast", "cz1_fast"]);

    let err = chip
        .cz
        .call(&chip.graph, (0, 2), &GateArgs::new(), &mut rec)
        .unwrap_err();
    assert!(matches!(err, GateError::Dispatch { ref gate, ref targets } if gate == "CZ" && targets == "(0, 2)"));
}

#[test]
fn single_qubit_gates_dispatch_by_id_or_object() {
    let chip = build_chip();
    let mut by_id = PulseRecorder::new();
    let mut by_object = PulseRecorder::new();

    chip.x.call(&chip.graph, 2, &GateArgs::new(), &mut by_id).unwrap();
    chip.x
        .call(&chip.graph, chip.qubits[2], &GateArgs::new(), &mut by_object)
        .unwrap();
    assert_eq!(by_id.ops(), by_object.ops());
    assert_eq!(
        chip.x.resolve(&chip.graph, 2).unwrap(),
        chip.x.resolve(&chip.graph, chip.qubits[2]).unwrap()
    );
}

#[test]
fn logical_and_physical_arguments_reach_the_implementation() {
    let chip = build_chip();
    let mut rec = PulseRecorder::new();
    let args = GateArgs::new().with_arg(PI / 4.0).with_param("extra_phase", PI / 4.0);

    chip.rz.call(&chip.graph, 0, &args, &mut rec).unwrap();
    assert_eq!(
        rec.ops(),
        &[PulseOp::ShiftPhase {
            channel: "0.xy".into(),
            phase: PI / 2.0
        }]
    );

    let err = chip
        .rz
        .call(&chip.graph, 0, &GateArgs::new(), &mut rec)
        .unwrap_err();
    assert!(matches!(err, GateError::InvalidArguments { .. }));
}

#[test]
fn pair_apply_follows_alias() {
    let chip = build_chip();
    let mut rec = PulseRecorder::new();

    let view = chip.graph.pair_view(chip.pairs[1]).unwrap();
    view.apply("CZ", &GateArgs::new(), &mut rec).unwrap();
    view.apply(chip.cz.as_ref(), &GateArgs::new(), &mut rec).unwrap();
    assert_eq!(rec.played(), vec!["cz1_fast", "cz1_fast"]);
}

#[test]
fn pair_apply_unknown_gate() {
    let chip = build_chip();
    let err = chip
        .graph
        .pair_view(chip.pairs[0])
        .unwrap()
        .apply("CZ_fast", &GateArgs::new(), &mut PulseRecorder::new())
        .unwrap_err();

    assert!(err.is_recoverable());
    let message = err.to_string();
    assert!(message.contains("CZ_fast"));
    assert!(message.contains("[\"CZ\"]"));
}

#[test]
fn get_implementations_covers_every_object() {
    let chip = build_chip();

    let x = chip.x.get_implementations(&chip.graph).unwrap();
    assert_eq!(x.len(), 3);
    for &q in &chip.qubits {
        assert_eq!(x.get(&q).copied(), chip.graph.resolve_slot(q, "X").ok());
    }

    let cz = chip.cz.get_implementations(&chip.graph).unwrap();
    assert_eq!(cz.len(), 2);
    for &pair in &chip.pairs {
        assert_eq!(cz[&pair], chip.graph.resolve_slot(pair, "CZ_fast").unwrap());
    }
}

#[test]
fn unbound_alias_target_falls_back_to_gate_entries() {
    let mut chip = build_chip();
    let pair = chip.pairs[0];
    chip.graph.register_reference(pair, "CZ", "#./CZ_slow").unwrap();

    // The slow CZ is not bound to the gate, so the scan over the gate's own
    // entries still finds the fast one.
    let mut rec = PulseRecorder::new();
    chip.graph
        .pair_view(pair)
        .unwrap()
        .apply("CZ", &GateArgs::new(), &mut rec)
        .unwrap();
    assert_eq!(rec.played(), vec!["cz0_fast"]);
}

#[test]
fn concurrent_calls_share_the_graph() {
    let chip = build_chip();
    let chip = &chip;

    let played: Vec<Vec<String>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(move || {
                    let mut rec = PulseRecorder::new();
                    chip.cz.call(&chip.graph, (0, 1), &GateArgs::new(), &mut rec).unwrap();
                    chip.x.call(&chip.graph, 1, &GateArgs::new(), &mut rec).unwrap();
                    rec.played().into_iter().map(String::from).collect()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for run in played {
        assert_eq!(run, vec!["cz0_fast", "x180"]);
    }
}
