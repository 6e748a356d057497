use crate::chip::ChipError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Program image of {size} bytes does not fit into {capacity} bytes of flash")]
    ProgramTooLarge { size: usize, capacity: usize },

    #[error("Invalid chip descriptor: {0}")]
    InvalidChip(#[from] ChipError),

    #[error("Unknown chip: {0}")]
    UnknownChip(String),

    #[error("Invalid clock frequency: {0} Hz")]
    InvalidFrequency(f64),

    #[error("Invalid HEX file: {0}")]
    Hex(#[from] ihex::Error),

    #[error("Register {address:#04X} is already intercepted by {owner}")]
    RegisterConflict { address: u16, owner: String },

    #[error("Register {address:#04X} of {peripheral} lies outside the register space")]
    RegisterOutOfRange { address: u16, peripheral: String },

    #[error("Simulator step invoked while another step is running")]
    ReentrantStep,

    #[error("Circuit is borrowed elsewhere during a simulator step")]
    CircuitBusy,
}
