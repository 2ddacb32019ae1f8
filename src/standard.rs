//! Standard gate implementations.
//!
//! | Implementation | Attached to | Logical args | Physical overrides |
//! |----------------|-------------|--------------|--------------------|
//! | [`PulseGate`] | qubit | angle (rotation mode only) | forwarded to the pulse |
//! | [`VirtualZ`] | qubit | angle | `extra_phase` |
//! | [`FluxCz`] | qubit pair | none | `control_phase`, `target_phase`, rest forwarded |

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::control::PulseControl;
use crate::error::GateResult;
use crate::implementation::{GateCall, GateImplementation};

/// Override key for the amplitude scale derived from a rotation angle.
pub const AMPLITUDE_SCALE: &str = "amplitude_scale";

/// Plays one named pulse on the qubit's drive channel.
///
/// In rotation mode the first logical argument is an angle, and the pulse
/// amplitude is scaled by `angle / reference_angle` unless the caller passes
/// an explicit `amplitude_scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulseGate {
    /// Pulse name on the drive channel.
    pub pulse: String,
    /// Angle the unscaled pulse rotates by; enables rotation mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_angle: Option<f64>,
}

impl PulseGate {
    /// Fixed pulse, e.g. an `x180` for X.
    pub fn new(pulse: impl Into<String>) -> Self {
        Self {
            pulse: pulse.into(),
            reference_angle: None,
        }
    }

    /// Rotation pulse, e.g. `x180` with reference angle π for Rx(θ).
    pub fn rotation(pulse: impl Into<String>, reference_angle: f64) -> Self {
        Self {
            pulse: pulse.into(),
            reference_angle: Some(reference_angle),
        }
    }
}

impl GateImplementation for PulseGate {
    fn execute(&self, call: &GateCall<'_>, control: &mut dyn PulseControl) -> GateResult<()> {
        let qubit = call.qubit()?;
        let mut overrides = call.args.physical.clone();

        if let Some(reference) = self.reference_angle {
            if reference == 0.0 {
                return Err(call.invalid("reference angle is zero"));
            }
            let angle = call.angle()?;
            overrides
                .entry(AMPLITUDE_SCALE)
                .or_insert_with(|| Value::from(angle / reference));
        }

        control.play(&qubit.drive, &self.pulse, &overrides)
    }
}

/// Virtual Z rotation: a frame update on the drive channel, no pulse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualZ;

impl GateImplementation for VirtualZ {
    fn execute(&self, call: &GateCall<'_>, control: &mut dyn PulseControl) -> GateResult<()> {
        let qubit = call.qubit()?;
        let angle = call.angle()?;
        let extra = numeric_param(call, "extra_phase", 0.0)?;
        control.shift_phase(&qubit.drive, angle + extra)
    }
}

/// Flux-activated controlled-Z on a qubit pair.
///
/// Plays a flux pulse on the control qubit's flux channel, aligns both
/// qubits, then applies single-qubit phase corrections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxCz {
    /// Flux pulse name.
    pub flux_pulse: String,
    /// Phase correction on the control qubit.
    #[serde(default)]
    pub control_phase: f64,
    /// Phase correction on the target qubit.
    #[serde(default)]
    pub target_phase: f64,
}

impl FluxCz {
    /// CZ with no phase corrections.
    pub fn new(flux_pulse: impl Into<String>) -> Self {
        Self {
            flux_pulse: flux_pulse.into(),
            control_phase: 0.0,
            target_phase: 0.0,
        }
    }

    /// Set the calibrated phase corrections.
    pub fn with_phase_corrections(mut self, control_phase: f64, target_phase: f64) -> Self {
        self.control_phase = control_phase;
        self.target_phase = target_phase;
        self
    }
}

impl GateImplementation for FluxCz {
    fn execute(&self, call: &GateCall<'_>, control: &mut dyn PulseControl) -> GateResult<()> {
        let (control_qubit, target_qubit) = call.pair()?;
        let flux = control_qubit.flux.as_deref().ok_or_else(|| {
            call.invalid(format!("control qubit {} has no flux channel", control_qubit.id))
        })?;

        let control_phase = numeric_param(call, "control_phase", self.control_phase)?;
        let target_phase = numeric_param(call, "target_phase", self.target_phase)?;
        let mut overrides = call.args.physical.clone();
        overrides.remove("control_phase");
        overrides.remove("target_phase");

        control.play(flux, &self.flux_pulse, &overrides)?;
        control.align(&[flux, control_qubit.drive.as_str(), target_qubit.drive.as_str()])?;
        control.shift_phase(&control_qubit.drive, control_phase)?;
        control.shift_phase(&target_qubit.drive, target_phase)
    }
}

fn numeric_param(call: &GateCall<'_>, key: &str, default: f64) -> GateResult<f64> {
    match call.args.param(key) {
        None => Ok(default),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| call.invalid(format!("'{key}' must be a number, got {value}"))),
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::control::{PulseOp, PulseRecorder};
    use crate::error::GateError;
    use crate::graph::{ComponentGraph, ComponentId};
    use crate::implementation::GateArgs;
    use crate::qubit::Qubit;

    fn pair_graph() -> (ComponentGraph, ComponentId, ComponentId) {
        let mut graph = ComponentGraph::new();
        let q0 = graph.add_qubit(Qubit::new(0).with_flux("q0.z"));
        let q1 = graph.add_qubit(Qubit::new(1));
        let pair = graph.add_pair(q0, q1).unwrap();
        (graph, q0, pair)
    }

    #[test]
    fn test_rotation_scales_amplitude() {
        let (mut graph, q0, _) = pair_graph();
        let rx = graph.implement(q0, "Rx", PulseGate::rotation("x180", PI)).unwrap();

        let mut rec = PulseRecorder::new();
        let args = GateArgs::new().with_arg(PI / 2.0);
        graph.execute_implementation(rx, "Rx", &args, &mut rec).unwrap();

        match &rec.ops()[0] {
            PulseOp::Play { channel, overrides, .. } => {
                assert_eq!(channel, "0.xy");
                assert_eq!(overrides[AMPLITUDE_SCALE], 0.5);
            }
            other => panic!("expected play, got {other:?}"),
        }
    }

    #[test]
    fn test_physical_override_wins_over_angle() {
        let (mut graph, q0, _) = pair_graph();
        let rx = graph.implement(q0, "Rx", PulseGate::rotation("x180", PI)).unwrap();

        let mut rec = PulseRecorder::new();
        let args = GateArgs::new().with_arg(PI).with_param(AMPLITUDE_SCALE, 0.9);
        graph.execute_implementation(rx, "Rx", &args, &mut rec).unwrap();

        match &rec.ops()[0] {
            PulseOp::Play { overrides, .. } => assert_eq!(overrides[AMPLITUDE_SCALE], 0.9),
            other => panic!("expected play, got {other:?}"),
        }
    }

    #[test]
    fn test_rotation_requires_angle() {
        let (mut graph, q0, _) = pair_graph();
        let rx = graph.implement(q0, "Rx", PulseGate::rotation("x180", PI)).unwrap();
        let err = graph
            .execute_implementation(rx, "Rx", &GateArgs::new(), &mut PulseRecorder::new())
            .unwrap_err();
        assert!(matches!(err, GateError::InvalidArguments { ref gate, .. } if gate == "Rx"));
    }

    #[test]
    fn test_virtual_z_adds_extra_phase() {
        let (mut graph, q0, _) = pair_graph();
        let rz = graph.implement(q0, "Rz", VirtualZ).unwrap();

        let mut rec = PulseRecorder::new();
        let args = GateArgs::new().with_arg(0.5).with_param("extra_phase", 0.25);
        graph.execute_implementation(rz, "Rz", &args, &mut rec).unwrap();
        assert_eq!(
            rec.ops(),
            &[PulseOp::ShiftPhase {
                channel: "0.xy".into(),
                phase: 0.75
            }]
        );
    }

    #[test]
    fn test_flux_cz_sequence() {
        let (mut graph, _, pair) = pair_graph();
        let cz = graph
            .implement(pair, "CZ", FluxCz::new("cz_flux").with_phase_corrections(0.1, 0.2))
            .unwrap();

        let mut rec = PulseRecorder::new();
        let args = GateArgs::new().with_param("target_phase", 0.3).with_param("amplitude", 0.4);
        graph.execute_implementation(cz, "CZ", &args, &mut rec).unwrap();

        let ops = rec.ops();
        assert_eq!(ops.len(), 4);
        match &ops[0] {
            PulseOp::Play {
                channel,
                pulse,
                overrides,
            } => {
                assert_eq!(channel, "q0.z");
                assert_eq!(pulse, "cz_flux");
                assert_eq!(overrides["amplitude"], 0.4);
                assert!(!overrides.contains_key("target_phase"));
            }
            other => panic!("expected play, got {other:?}"),
        }
        assert_eq!(
            ops[3],
            PulseOp::ShiftPhase {
                channel: "1.xy".into(),
                phase: 0.3
            }
        );
    }

    #[test]
    fn test_flux_cz_rejects_single_qubit() {
        let (mut graph, q0, _) = pair_graph();
        let cz = graph.implement(q0, "CZ", FluxCz::new("cz_flux")).unwrap();
        assert!(
            graph
                .execute_implementation(cz, "CZ", &GateArgs::new(), &mut PulseRecorder::new())
                .is_err()
        );
    }

    #[test]
    fn test_flux_cz_needs_flux_channel() {
        let mut graph = ComponentGraph::new();
        let q0 = graph.add_qubit(Qubit::new(0));
        let q1 = graph.add_qubit(Qubit::new(1));
        let pair = graph.add_pair(q0, q1).unwrap();
        let cz = graph.implement(pair, "CZ", FluxCz::new("cz_flux")).unwrap();

        let err = graph
            .execute_implementation(cz, "CZ", &GateArgs::new(), &mut PulseRecorder::new())
            .unwrap_err();
        assert!(err.to_string().contains("no flux channel"));
    }

    #[test]
    fn test_non_numeric_phase_rejected() {
        let (mut graph, _, pair) = pair_graph();
        let cz = graph.implement(pair, "CZ", FluxCz::new("cz_flux")).unwrap();
        let args = GateArgs::new().with_param("control_phase", "fast");
        assert!(
            graph
                .execute_implementation(cz, "CZ", &args, &mut PulseRecorder::new())
                .is_err()
        );
    }
}
