/**
 * @file trace.rs
 * @date 17/10/2026
 * @brief JSON lines trace of synchronization events
 */
use avr8::{InspectionEvent, Inspector};
use serde::Serialize;
use std::cell::RefCell;
use std::io::Write;

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceRecord {
    Step {
        time: f64,
        executed_cycles: u64,
        total_cycles: u64,
    },
    Pin {
        pin: usize,
        high: bool,
    },
    Adc {
        channel: u8,
        voltage: f64,
        value: u16,
    },
    ClockAnomaly {
        last: f64,
        now: f64,
    },
}

impl TraceRecord {
    fn from_event(event: &InspectionEvent) -> Option<Self> {
        let record = match *event {
            InspectionEvent::StepCompleted {
                time,
                executed_cycles,
                total_cycles,
            } => Self::Step {
                time,
                executed_cycles,
                total_cycles,
            },
            InspectionEvent::PinDriven { pin, high } => Self::Pin { pin, high },
            InspectionEvent::AdcConversion {
                channel,
                voltage,
                value,
            } => Self::Adc {
                channel,
                voltage,
                value,
            },
            InspectionEvent::ClockAnomaly { last, now } => Self::ClockAnomaly { last, now },
            _ => return None,
        };

        Some(record)
    }
}

/// Writes every traced event as one JSON object per line
pub struct TraceInspector<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> TraceInspector<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> Inspector for TraceInspector<W> {
    fn handle_event(&self, event: InspectionEvent) {
        let Some(record) = TraceRecord::from_event(&event) else {
            return;
        };

        let mut out = self.out.borrow_mut();
        let written = serde_json::to_writer(&mut *out, &record)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(out));

        if let Err(why) = written {
            log::warn!("Failed to write trace record: {why}");
        }
    }
}
