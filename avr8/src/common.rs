//! Common types and constants used in the library.

pub const KB: usize = 1 << 10;
pub const MHZ: f64 = 1e6;

/// Simulated physical time, as reported by the circuit simulator
pub type Seconds = f64;

/// Supply rail of the simulated 5V logic family
pub const VCC: f64 = 5.0;
pub const GND: f64 = 0.0;

/// Input voltages strictly above this read as logical high
pub const LOGIC_THRESHOLD: f64 = 2.5;

/// Resolution of the analog-to-digital converter
pub const ADC_MAX: u16 = 1023;

/// Circuit node carrying the digital pin `index`
pub fn pin_node(index: usize) -> String {
    format!("pin{index}")
}

/// Circuit node carrying the analog input channel `channel`
pub fn analog_node(channel: u8) -> String {
    format!("A{channel}")
}

pub fn is_logic_high(voltage: f64) -> bool {
    voltage > LOGIC_THRESHOLD
}

pub fn rail_voltage(high: bool) -> f64 {
    if high { VCC } else { GND }
}
