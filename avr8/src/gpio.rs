/**
 * @file gpio.rs
 * @date 17/10/2026
 * @brief GPIO ports of the AVR8
 */
mod port;
mod state;

pub use port::{GpioPort, PortRegister};
pub use state::PinState;
