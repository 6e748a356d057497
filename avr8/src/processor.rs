/**
 * @file processor.rs
 * @date 17/10/2026
 * @brief Seam between the synchronization core and an AVR instruction engine
 */
pub mod idle;

use crate::bus::Bus;
use crate::memory::ProgramMemory;
pub use idle::IdleCore;

/// What an instruction may reach while it executes
pub struct ProcessorContext<'a> {
    pub program: &'a ProgramMemory,
    pub bus: Bus<'a>,
}

/// An AVR instruction decoder/executor.
///
/// `execute` runs exactly one instruction and returns the cycles it took.
/// Register side effects happen through `ctx.bus`, which dispatches them to
/// the peripheral that owns the address.
pub trait InstructionCore {
    /// Program counter, in words
    fn pc(&self) -> u32;
    fn set_pc(&mut self, value: u32);
    fn reset(&mut self);
    fn execute(&mut self, ctx: &mut ProcessorContext) -> u32;
}
