//! Gate dispatch on a three-qubit line.
//!
//! Builds a small chip, wires up X, Rx, Rz and CZ, dispatches a short
//! sequence through a custom `PulseControl` that keeps a per-channel
//! timeline, and prints the resulting schedule.

use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::sync::Arc;

use gate_dispatch::{
    ComponentGraph, DispatchConfig, FluxCz, Gate, GateArgs, GateError, GateResult, PhysicalParams,
    PulseControl, PulseGate, PulseOp, PulseRecorder, Qubit, VirtualZ,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Control layer with fixed pulse lengths that tracks when each channel is
/// free again.
struct TimelineControl {
    durations: BTreeMap<&'static str, u32>,
    clock: BTreeMap<String, u32>,
    recorder: PulseRecorder,
}

impl TimelineControl {
    fn new() -> Self {
        Self {
            durations: BTreeMap::from([("x180", 40), ("x90", 20), ("cz_fast", 60), ("cz_slow", 120)]),
            clock: BTreeMap::new(),
            recorder: PulseRecorder::new(),
        }
    }

    fn total(&self) -> u32 {
        self.clock.values().copied().max().unwrap_or(0)
    }
}

impl PulseControl for TimelineControl {
    fn play(&mut self, channel: &str, pulse: &str, overrides: &PhysicalParams) -> GateResult<()> {
        let length = self
            .durations
            .get(pulse)
            .copied()
            .ok_or_else(|| GateError::Control(format!("no calibrated length for pulse {pulse}")))?;
        *self.clock.entry(channel.to_string()).or_default() += length;
        self.recorder.play(channel, pulse, overrides)
    }

    fn shift_phase(&mut self, channel: &str, phase: f64) -> GateResult<()> {
        self.recorder.shift_phase(channel, phase)
    }

    fn align(&mut self, channels: &[&str]) -> GateResult<()> {
        let latest = channels
            .iter()
            .filter_map(|c| self.clock.get(*c))
            .copied()
            .max()
            .unwrap_or(0);
        for channel in channels {
            self.clock.insert(channel.to_string(), latest);
        }
        self.recorder.align(channels)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut graph = ComponentGraph::with_config(DispatchConfig::from_env());
    let qubits: Vec<_> = (0..3)
        .map(|i| graph.add_qubit(Qubit::new(i).with_flux(format!("q{i}.z"))))
        .collect();

    let mut x = Vec::new();
    let mut rx = Vec::new();
    let mut rz = Vec::new();
    for (i, &q) in qubits.iter().enumerate() {
        let i = i as i64;
        x.push((i, graph.implement(q, "X", PulseGate::new("x180"))?));
        rx.push((i, graph.implement(q, "Rx", PulseGate::rotation("x180", PI))?));
        rz.push((i, graph.implement(q, "Rz", VirtualZ)?));
    }
    let x = Gate::with_implementations("X", x, &mut graph)?;
    let rx = Gate::with_implementations("Rx", rx, &mut graph)?;
    let rz = Gate::with_implementations("Rz", rz, &mut graph)?;

    let mut cz = Vec::new();
    for w in qubits.windows(2) {
        let pair = graph.add_pair(w[0], w[1])?;
        let fast = graph.implement(
            pair,
            "CZ_fast",
            FluxCz::new("cz_fast").with_phase_corrections(0.12, -0.08),
        )?;
        graph.implement(pair, "CZ_slow", FluxCz::new("cz_slow"))?;
        graph.register_reference(pair, "CZ", "#./CZ_fast")?;
        cz.push((pair, fast));
    }
    let pairs: Vec<_> = cz.iter().map(|(pair, _)| *pair).collect();
    let cz = Arc::new(Gate::with_implementations("CZ", cz, &mut graph)?);
    for &pair in &pairs {
        graph.qubit_pair_mut(pair)?.add_gate(Arc::clone(&cz));
    }

    info!("Built chip with {} components", graph.len());
    for key in cz.keys() {
        info!("CZ available on {}", key);
    }

    let mut control = TimelineControl::new();
    x.call(&graph, 0, &GateArgs::new(), &mut control)?;
    rx.call(&graph, 1, &GateArgs::new().with_arg(PI / 2.0), &mut control)?;
    rz.call(&graph, 2, &GateArgs::new().with_arg(PI / 4.0), &mut control)?;
    cz.call(&graph, (0, 1), &GateArgs::new(), &mut control)?;

    graph
        .pair_view(pairs[1])?
        .apply("CZ", &GateArgs::new().with_param("target_phase", 0.2), &mut control)?;

    if let Err(e) = cz.call(&graph, (0, 2), &GateArgs::new(), &mut control) {
        info!("Rejected as expected: {}", e);
    }

    println!("Schedule:");
    for op in control.recorder.ops() {
        match op {
            PulseOp::Play { channel, pulse, .. } => println!("  play   {channel:<6} {pulse}"),
            PulseOp::ShiftPhase { channel, phase } => println!("  phase  {channel:<6} {phase:+.3}"),
            PulseOp::Align { channels } => println!("  align  {}", channels.join(", ")),
        }
    }
    println!();
    println!("Total duration: {} ns", control.total());
    println!();
    println!("{}", serde_json::to_string_pretty(control.recorder.ops())?);

    Ok(())
}

