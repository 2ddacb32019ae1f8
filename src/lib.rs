//! Gate Dispatch: resolving logical gates to hardware implementations
//!
//! This crate maps abstract quantum gates (`X`, `Rx`, `CZ`, ...) to the
//! concrete, hardware-bound implementations attached to physical qubits and
//! qubit pairs, and dispatches calls to them.
//!
//! # Overview
//!
//! - [`ComponentGraph`] holds qubits, qubit pairs, containers and attached
//!   implementations, linked by single-parent attachment
//! - [`ImplementationRegistry`] / [`Slot`] give each qubit or pair named
//!   implementation slots, with `#./<slot>` aliases
//! - [`GateImplementation`] is the executable unit; [`PulseGate`],
//!   [`VirtualZ`] and [`FluxCz`] ship with the crate
//! - [`Gate`] maps target keys to implementations, validates every entry,
//!   and dispatches calls
//! - [`QubitPairView::apply`] runs a pair's registered two-qubit gate
//! - [`GateError`] categorizes attachment, validation, dispatch and alias
//!   failures
//!
//! # Dispatch
//!
//! ```text
//!   gate.call(graph, targets, args, control)
//!        │
//!        ├─ normalize targets ──→ TargetKey (0, 1)
//!        ├─ lookup key        ──→ implementation component
//!        ├─ resolve attachment (≤ 2 hops) ──→ Qubit | (control, target)
//!        └─ execute(args)     ──→ PulseControl
//! ```
//!
//! # Example
//!
//! ```
//! use gate_dispatch::{ComponentGraph, FluxCz, Gate, GateArgs, PulseRecorder, Qubit};
//!
//! let mut graph = ComponentGraph::new();
//! let q0 = graph.add_qubit(Qubit::new(0).with_flux("q0.z"));
//! let q1 = graph.add_qubit(Qubit::new(1));
//! let pair = graph.add_pair(q0, q1)?;
//!
//! let fast = graph.implement(pair, "CZ_fast", FluxCz::new("cz_fast"))?;
//! graph.register_reference(pair, "CZ", "#./CZ_fast")?;
//!
//! let cz = Gate::with_implementations("CZ", [((0, 1), fast)], &mut graph)?;
//!
//! let mut control = PulseRecorder::new();
//! cz.call(&graph, (0, 1), &GateArgs::new(), &mut control)?;
//! assert_eq!(control.played(), vec!["cz_fast"]);
//! # Ok::<(), gate_dispatch::GateError>(())
//! ```

pub mod config;
pub mod control;
pub mod error;
pub mod gate;
pub mod graph;
pub mod implementation;
pub mod pair;
pub mod qubit;
pub mod registry;
pub mod standard;
pub mod unitary;

pub use config::DispatchConfig;
pub use control::{PulseControl, PulseOp, PulseRecorder};
pub use error::{GateError, GateResult};
pub use gate::{Gate, GateId};
pub use graph::{Attachment, Component, ComponentGraph, ComponentId, ImplementationNode};
pub use implementation::{GateArgs, GateCall, GateImplementation, PhysicalParams};
pub use pair::{GateRef, QubitPairView};
pub use qubit::{Qubit, QubitId, QubitPair, TargetKey, TargetSpec};
pub use registry::{ImplementationRegistry, REFERENCE_PREFIX, Slot};
pub use standard::{FluxCz, PulseGate, VirtualZ};
pub use unitary::Unitary;
