/**
 * @file circuit.rs
 * @date 17/10/2026
 * @brief Interface of the external circuit simulator
 */
use crate::common::Seconds;
use crate::inspector::{InspectionEvent, InspectorRef};
use std::collections::{HashMap, HashSet};

/// The external continuous-time simulator, as seen from the emulator.
/// All calls are synchronous and happen only at tick boundaries or from
/// a register side effect inside a tick.
pub trait Circuit {
    /// Current simulated time, monotonic non-decreasing
    fn time(&self) -> Seconds;

    /// Voltage of `node`, `None` when the node is not connected
    fn node_voltage(&self, node: &str) -> Option<f64>;

    /// Drive `node` from an emulated digital output
    fn set_ext_voltage(&mut self, node: &str, volts: f64);
}

/// Resolves node voltages with a fallback, reporting each missing node once
#[derive(Default)]
pub struct UnresolvedNodes {
    reported: HashSet<String>,
}

impl UnresolvedNodes {
    pub fn voltage_or(
        &mut self,
        circuit: &dyn Circuit,
        node: &str,
        default: f64,
        inspector: &InspectorRef,
    ) -> f64 {
        if let Some(voltage) = circuit.node_voltage(node) {
            return voltage;
        }

        if self.reported.insert(node.to_string()) {
            log::warn!("Circuit node {node} is not connected, assuming {default}V");
            inspector.raise(InspectionEvent::UnresolvedNode {
                node: node.to_string(),
                default,
            });
        }

        default
    }

    pub fn is_reported(&self, node: &str) -> bool {
        self.reported.contains(node)
    }
}

/// A circuit with fixed node voltages and a manually advanced clock.
/// Driven outputs are recorded and read back for nodes without a fixed source.
#[derive(Debug, Default, Clone)]
pub struct FixedCircuit {
    time: Seconds,
    sources: HashMap<String, f64>,
    driven: HashMap<String, f64>,
}

impl FixedCircuit {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_voltage(mut self, node: &str, volts: f64) -> Self {
        self.set_voltage(node, volts);
        self
    }

    pub fn set_voltage(&mut self, node: &str, volts: f64) {
        self.sources.insert(node.to_string(), volts);
    }

    pub fn disconnect(&mut self, node: &str) {
        self.sources.remove(node);
        self.driven.remove(node);
    }

    pub fn set_time(&mut self, time: Seconds) {
        self.time = time;
    }

    pub fn advance(&mut self, dt: Seconds) {
        self.time += dt;
    }

    /// Last voltage driven onto `node` by the emulator
    pub fn driven(&self, node: &str) -> Option<f64> {
        self.driven.get(node).copied()
    }

    pub fn driven_nodes(&self) -> impl Iterator<Item = (&str, f64)> {
        self.driven.iter().map(|(node, volts)| (node.as_str(), *volts))
    }
}

impl Circuit for FixedCircuit {
    fn time(&self) -> Seconds {
        self.time
    }

    fn node_voltage(&self, node: &str) -> Option<f64> {
        self.sources
            .get(node)
            .or_else(|| self.driven.get(node))
            .copied()
    }

    fn set_ext_voltage(&mut self, node: &str, volts: f64) {
        self.driven.insert(node.to_string(), volts);
    }
}
