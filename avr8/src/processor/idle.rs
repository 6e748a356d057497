use super::{InstructionCore, ProcessorContext};

/// Walks the program one word per cycle without decoding anything
#[derive(Debug, Default)]
pub struct IdleCore {
    pc: u32,
}

impl IdleCore {
    pub fn new() -> Self {
        Default::default()
    }
}

impl InstructionCore for IdleCore {
    fn pc(&self) -> u32 {
        self.pc
    }

    fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    fn reset(&mut self) {
        self.pc = 0;
    }

    fn execute(&mut self, ctx: &mut ProcessorContext) -> u32 {
        let words = ctx.program.len() as u32;
        self.pc = if words == 0 { 0 } else { (self.pc + 1) % words };
        1
    }
}
