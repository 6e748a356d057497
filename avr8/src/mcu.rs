/**
 * @file mcu.rs
 * @date 17/10/2026
 * @brief Emulated AVR8 microcontroller: memories, peripherals and core
 */
use crate::bus::{Bus, HookTable};
use crate::chip::Chip;
use crate::circuit::Circuit;
use crate::gpio::{GpioPort, PinState};
use crate::inspector::{Inspector, InspectorRef};
use crate::memory::{DataMemory, ProgramMemory};
use crate::peripherals::{Adc, Peripheral, PeripheralAccessContext, Peripherals};
use crate::processor::{InstructionCore, ProcessorContext};
use crate::{Result, SimulatorError};
use std::rc::Rc;

pub struct Mcu {
    chip: &'static Chip,
    program: ProgramMemory,
    data: DataMemory,
    cycles: u64,
    core: Box<dyn InstructionCore>,
    peripherals: Peripherals,
    hooks: HookTable,
    inspector: InspectorRef,
}

impl Mcu {
    pub fn new(chip: &'static Chip, core: Box<dyn InstructionCore>) -> Result<Self> {
        chip.validate()?;

        let peripherals = Peripherals::new(chip);
        let mut hooks = HookTable::new(chip.register_space);
        peripherals.bind(&mut hooks)?;

        log::debug!(
            "Created {} with {} bytes of flash and {} bytes of data space",
            chip.name,
            chip.flash_size,
            chip.data_size()
        );

        Ok(Self {
            chip,
            program: ProgramMemory::new(chip.flash_size),
            data: DataMemory::new(chip.data_size()),
            cycles: 0,
            core,
            peripherals,
            hooks,
            inspector: InspectorRef::default(),
        })
    }

    pub fn with_program(mut self, image: &[u8]) -> Result<Self> {
        self.load_program(image)?;
        Ok(self)
    }

    /// Load a raw little-endian flash image and reset
    pub fn load_program(&mut self, image: &[u8]) -> Result<()> {
        self.program
            .load_bytes(image)
            .map_err(|_| SimulatorError::ProgramTooLarge {
                size: image.len(),
                capacity: self.program.capacity(),
            })?;

        log::info!("Loaded {} bytes of program into {}", image.len(), self.chip.name);
        self.reset();
        Ok(())
    }

    /// Load an Intel HEX image and reset
    pub fn load_hex(&mut self, text: &str) -> Result<()> {
        let mut image = vec![0u8; self.program.capacity()];
        let size = ihex::load_ihex(text, &mut image)?;
        self.load_program(&image[..size])
    }

    /// Hand the registers of `peripheral` over to it, replacing placeholders
    pub fn attach(&mut self, peripheral: Box<dyn Peripheral>) -> Result<()> {
        self.peripherals.attach(peripheral, &mut self.hooks)
    }

    /// Power-on state: data space cleared, PC at 0, cycle counter at 0.
    /// The program image is kept.
    pub fn reset(&mut self) {
        self.data.clear();
        self.core.reset();
        self.peripherals.reset();
        self.cycles = 0;
    }

    /// Execute one instruction and advance the peripherals by its cycles.
    /// An instruction always accounts for at least one cycle.
    pub fn tick(&mut self, circuit: &mut dyn Circuit) -> u32 {
        let Self {
            program,
            data,
            cycles,
            core,
            peripherals,
            hooks,
            inspector,
            ..
        } = self;

        let mut ctx = ProcessorContext {
            program: &*program,
            bus: Bus::new(data, hooks, peripherals, circuit, inspector),
        };

        let consumed = core.execute(&mut ctx).max(1);

        let mut access = PeripheralAccessContext::new(0, data, circuit, inspector);
        peripherals.tick(consumed, &mut access);

        *cycles += consumed as u64;
        consumed
    }

    pub fn chip(&self) -> &'static Chip {
        self.chip
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn pc(&self) -> u32 {
        self.core.pc()
    }

    pub fn program(&self) -> &ProgramMemory {
        &self.program
    }

    pub fn data(&self) -> &DataMemory {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataMemory {
        &mut self.data
    }

    pub fn peripherals(&self) -> &Peripherals {
        &self.peripherals
    }

    pub fn port(&self, letter: char) -> Option<&GpioPort> {
        self.peripherals.port(letter)
    }

    pub fn adc(&self) -> Option<&Adc> {
        self.peripherals.adc.as_ref()
    }

    pub fn pin_count(&self) -> usize {
        self.chip.pins.len()
    }

    /// Configured state of the digital pin `index`, `None` when unmapped
    pub fn pin_state(&self, index: usize) -> Option<PinState> {
        let mapping = self.chip.pin(index)?;
        let port = self.peripherals.port(mapping.port)?;
        Some(port.pin_state(&self.data, mapping.bit))
    }

    /// Apply an external logic level to the digital pin `index`.
    /// Returns whether the level seen by the program changed.
    pub fn set_pin_input(&mut self, index: usize, high: bool) -> bool {
        let Some(mapping) = self.chip.pin(index) else {
            log::warn!("Pin {index} is not mapped on {}", self.chip.name);
            return false;
        };

        match self.peripherals.port_mut(mapping.port) {
            Some(port) => port.set_pin(&mut self.data, mapping.bit, high),
            None => false,
        }
    }

    pub fn set_inspector(&mut self, inspector: Rc<dyn Inspector>) {
        self.inspector.set_inspector(inspector);
    }

    pub fn inspector(&self) -> &InspectorRef {
        &self.inspector
    }
}
