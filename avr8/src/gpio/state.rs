/**
 * @file gpio/state.rs
 * @date 17/10/2026
 * @brief Definition of the state of a GPIO pin
 */
use crate::common::rail_voltage;

/// Direction and level of a pin as configured by DDRx and PORTx
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    Input,
    InputPullUp,
    DrivenLow,
    DrivenHigh,
}

impl PinState {
    pub fn from_registers(ddr: bool, port: bool) -> Self {
        match (ddr, port) {
            (true, true) => Self::DrivenHigh,
            (true, false) => Self::DrivenLow,
            (false, true) => Self::InputPullUp,
            (false, false) => Self::Input,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input | Self::InputPullUp)
    }

    pub fn is_output(&self) -> bool {
        !self.is_input()
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Self::DrivenHigh)
    }

    /// Rail voltage of a driven pin, `None` for inputs
    pub fn output_voltage(&self) -> Option<f64> {
        self.is_output().then(|| rail_voltage(self.is_high()))
    }
}
