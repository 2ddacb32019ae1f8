//! Pulse control collaborator.
//!
//! Implementations never generate waveforms themselves. They issue
//! operations against a [`PulseControl`], which stands for the program
//! builder or control stack executing them. [`PulseRecorder`] records the
//! operations in order and is what tests and the demo use.

use serde::{Deserialize, Serialize};

use crate::error::GateResult;
use crate::implementation::PhysicalParams;

/// Pulse execution primitives provided by the control layer.
pub trait PulseControl {
    /// Play a named pulse on a channel with optional overrides.
    fn play(&mut self, channel: &str, pulse: &str, overrides: &PhysicalParams) -> GateResult<()>;

    /// Rotate the frame of a channel by `phase` radians.
    fn shift_phase(&mut self, channel: &str, phase: f64) -> GateResult<()>;

    /// Synchronize channels so the next operations start together.
    fn align(&mut self, channels: &[&str]) -> GateResult<()>;
}

/// A recorded pulse operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PulseOp {
    /// A pulse was played.
    Play {
        /// Channel name.
        channel: String,
        /// Pulse name.
        pulse: String,
        /// Overrides passed with the pulse.
        #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
        overrides: PhysicalParams,
    },
    /// A frame rotation was applied.
    ShiftPhase {
        /// Channel name.
        channel: String,
        /// Phase in radians.
        phase: f64,
    },
    /// Channels were aligned.
    Align {
        /// Channel names.
        channels: Vec<String>,
    },
}

/// In-memory [`PulseControl`] that records every operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PulseRecorder {
    ops: Vec<PulseOp>,
}

impl PulseRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded operations in issue order.
    pub fn ops(&self) -> &[PulseOp] {
        &self.ops
    }

    /// Names of the pulses played, in order.
    pub fn played(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PulseOp::Play { pulse, .. } => Some(pulse.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Take the recorded operations, leaving the recorder empty.
    pub fn take(&mut self) -> Vec<PulseOp> {
        std::mem::take(&mut self.ops)
    }

    /// Number of recorded operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl PulseControl for PulseRecorder {
    fn play(&mut self, channel: &str, pulse: &str, overrides: &PhysicalParams) -> GateResult<()> {
        self.ops.push(PulseOp::Play {
            channel: channel.to_string(),
            pulse: pulse.to_string(),
            overrides: overrides.clone(),
        });
        Ok(())
    }

    fn shift_phase(&mut self, channel: &str, phase: f64) -> GateResult<()> {
        self.ops.push(PulseOp::ShiftPhase {
            channel: channel.to_string(),
            phase,
        });
        Ok(())
    }

    fn align(&mut self, channels: &[&str]) -> GateResult<()> {
        self.ops.push(PulseOp::Align {
            channels: channels.iter().map(|c| (*c).to_string()).collect(),
        });
        Ok(())
    }
}
