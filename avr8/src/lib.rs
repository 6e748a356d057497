/**
 * @file lib.rs
 * @date 17/10/2026
 * @brief Execution synchronization core between an AVR8 instruction emulator
 *        and an external circuit simulator
 */
pub mod bridge;
pub mod bus;
pub mod chip;
pub mod circuit;
pub mod clock;
pub mod common;
pub mod error;
pub mod gpio;
pub mod inspector;
pub mod mcu;
pub mod memory;
pub mod peripherals;
pub mod processor;
pub mod simulator;
pub mod task;

mod utils;

pub use chip::Chip;
pub use circuit::{Circuit, FixedCircuit};
pub use common::Seconds;
pub use error::Error as SimulatorError;
pub use inspector::{InspectionEvent, Inspector, InspectorRef};
pub use mcu::Mcu;
pub use simulator::{PinSyncMode, Simulator, StepReport};
pub use task::{TaskHandle, TaskScheduler};
pub type Result<T> = core::result::Result<T, SimulatorError>;
