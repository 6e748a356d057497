/**
 * @file bridge.rs
 * @date 17/10/2026
 * @brief Digital pin translation between the emulated ports and circuit nodes
 */
use crate::circuit::{Circuit, UnresolvedNodes};
use crate::common::{is_logic_high, pin_node, rail_voltage};
use crate::gpio::PinState;
use crate::inspector::InspectionEvent;
use crate::mcu::Mcu;

/// Per-pin view of the last synchronization, used to report only changes
pub struct PinBridge {
    nodes: UnresolvedNodes,
    sampled: Vec<Option<bool>>,
    driven: Vec<Option<bool>>,
}

impl PinBridge {
    pub fn new(pin_count: usize) -> Self {
        Self {
            nodes: UnresolvedNodes::default(),
            sampled: vec![None; pin_count],
            driven: vec![None; pin_count],
        }
    }

    /// Level last driven onto the node of pin `index`, `None` while it is an input
    pub fn driven(&self, index: usize) -> Option<bool> {
        self.driven.get(index).copied().flatten()
    }

    /// Level last sampled from the node of pin `index`, `None` while it is an output
    pub fn sampled(&self, index: usize) -> Option<bool> {
        self.sampled.get(index).copied().flatten()
    }

    /// Sample the circuit into every pin currently configured as an input
    pub fn sync_pins_in(&mut self, mcu: &mut Mcu, circuit: &dyn Circuit) {
        for index in 0..mcu.pin_count().min(self.sampled.len()) {
            let Some(state) = mcu.pin_state(index) else {
                continue;
            };

            if state.is_output() {
                self.sampled[index] = None;
                continue;
            }

            // a floating pull-up reads high
            let default = rail_voltage(state == PinState::InputPullUp);
            let node = pin_node(index);
            let voltage = self
                .nodes
                .voltage_or(circuit, &node, default, mcu.inspector());
            let high = is_logic_high(voltage);

            mcu.set_pin_input(index, high);

            if self.sampled[index] != Some(high) {
                self.sampled[index] = Some(high);
                mcu.inspector()
                    .raise(InspectionEvent::PinSampled { pin: index, high });
            }
        }
    }

    /// Drive the node of every pin currently configured as an output
    pub fn sync_pins_out(&mut self, mcu: &Mcu, circuit: &mut dyn Circuit) {
        for index in 0..mcu.pin_count().min(self.driven.len()) {
            let Some(state) = mcu.pin_state(index) else {
                continue;
            };

            let Some(volts) = state.output_voltage() else {
                self.driven[index] = None;
                continue;
            };

            circuit.set_ext_voltage(&pin_node(index), volts);

            let high = state.is_high();
            if self.driven[index] != Some(high) {
                self.driven[index] = Some(high);
                mcu.inspector()
                    .raise(InspectionEvent::PinDriven { pin: index, high });
            }
        }
    }
}
