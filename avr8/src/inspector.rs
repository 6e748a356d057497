use crate::common::Seconds;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum InspectionEvent {
    StepCompleted {
        time: Seconds,
        executed_cycles: u64,
        total_cycles: u64,
    },
    ClockAnomaly {
        last: Seconds,
        now: Seconds,
    },

    AdcConversion {
        channel: u8,
        voltage: f64,
        value: u16,
    },

    PinSampled {
        pin: usize,
        high: bool,
    },
    PinDriven {
        pin: usize,
        high: bool,
    },

    UnresolvedNode {
        node: String,
        default: f64,
    },
}

pub trait Inspector {
    fn handle_event(&self, event: InspectionEvent);
}

#[derive(Clone)]
pub struct InspectorRef {
    inspector: Rc<dyn Inspector>,
}

impl Default for InspectorRef {
    fn default() -> Self {
        Self {
            inspector: Rc::new(DummyInspector),
        }
    }
}

impl Inspector for InspectorRef {
    fn handle_event(&self, event: InspectionEvent) {
        self.inspector.handle_event(event);
    }
}

impl InspectorRef {
    pub fn set_inspector(&mut self, inspector: Rc<dyn Inspector>) {
        self.inspector = inspector;
    }

    pub fn raise(&self, event: InspectionEvent) {
        self.inspector.handle_event(event);
    }
}

pub struct DummyInspector;

impl Inspector for DummyInspector {
    fn handle_event(&self, event: InspectionEvent) {
        match event {
            InspectionEvent::StepCompleted {
                time,
                executed_cycles,
                total_cycles,
            } => {
                log::debug!("t={time:.9}s: executed {executed_cycles} cycles ({total_cycles} total)");
            }

            InspectionEvent::ClockAnomaly { last, now } => {
                log::debug!("Clock anomaly: time went from {last}s back to {now}s");
            }

            InspectionEvent::AdcConversion {
                channel,
                voltage,
                value,
            } => {
                log::debug!("ADC: channel {channel} at {voltage:.3}V converted to {value}");
            }

            InspectionEvent::PinSampled { pin, high } => {
                log::trace!("Pin {pin}: input {}", if high { "high" } else { "low" });
            }

            InspectionEvent::PinDriven { pin, high } => {
                log::trace!("Pin {pin}: output {}", if high { "high" } else { "low" });
            }

            InspectionEvent::UnresolvedNode { node, default } => {
                log::debug!("Node {node} unresolved, using {default}V");
            }
        }
    }
}
