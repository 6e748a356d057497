/**
 * @file peripherals.rs
 * @date 17/10/2026
 * @brief Peripheral set of the AVR8 and its binding to the register space
 */
use crate::bus::{HookTable, RegisterHook};
use crate::chip::Chip;
use crate::circuit::Circuit;
use crate::gpio::GpioPort;
use crate::memory::DataMemory;
use crate::{InspectorRef, Result, SimulatorError};

pub mod adc;

pub use adc::Adc;

/// Everything a register handler may touch, lent for the duration of one access
pub struct PeripheralAccessContext<'a> {
    pub address: u16,
    pub data: &'a mut DataMemory,
    pub circuit: &'a mut dyn Circuit,
    pub inspector: &'a InspectorRef,
}

impl<'a> PeripheralAccessContext<'a> {
    pub fn new(
        address: u16,
        data: &'a mut DataMemory,
        circuit: &'a mut dyn Circuit,
        inspector: &'a InspectorRef,
    ) -> Self {
        Self {
            address,
            data,
            circuit,
            inspector,
        }
    }
}

pub trait Peripheral {
    fn name(&self) -> &str;

    /// Data-space addresses this peripheral intercepts
    fn registers(&self) -> Vec<u16>;

    /// `None` falls through to the raw data space
    fn read(&mut self, _address: u16, _ctx: &mut PeripheralAccessContext) -> Option<u8> {
        None
    }

    /// Returns `true` when the write was handled and must not be stored as is
    fn write(&mut self, _address: u16, _value: u8, _ctx: &mut PeripheralAccessContext) -> bool {
        false
    }

    fn tick(&mut self, _cycles: u32, _ctx: &mut PeripheralAccessContext) {}

    fn reset(&mut self) {}

    /// Placeholders give up their registers to any peripheral attached later
    fn is_placeholder(&self) -> bool {
        false
    }
}

pub struct Peripherals {
    pub ports: Vec<GpioPort>,
    pub adc: Option<Adc>,
    units: Vec<Box<dyn Peripheral>>,
}

impl Peripherals {
    pub fn new(chip: &Chip) -> Self {
        let ports = chip
            .gpio
            .iter()
            .map(|(letter, config)| GpioPort::new(*letter, *config))
            .collect();

        let mut placeholders: Vec<UnimplementedPeripheral> = Vec::new();
        for (owner, offset) in chip.registers() {
            // modeled here, see GpioPort and Adc
            if owner.starts_with("PORT") || owner == "ADC" {
                continue;
            }

            match placeholders.iter_mut().find(|p| p.name == owner) {
                Some(unit) => unit.registers.push(offset),
                None => placeholders.push(UnimplementedPeripheral::new(owner, vec![offset])),
            }
        }

        Self {
            ports,
            adc: chip.adc.map(Adc::new),
            units: placeholders
                .into_iter()
                .map(|p| Box::new(p) as Box<dyn Peripheral>)
                .collect(),
        }
    }

    /// Fill `hooks` with every register of the built-in peripherals
    pub fn bind(&self, hooks: &mut HookTable) -> Result<()> {
        for (index, port) in self.ports.iter().enumerate() {
            self.bind_all(hooks, port, RegisterHook::Port(index))?;
        }

        if let Some(adc) = &self.adc {
            self.bind_all(hooks, adc, RegisterHook::Adc)?;
        }

        for (index, unit) in self.units.iter().enumerate() {
            self.bind_all(hooks, unit.as_ref(), RegisterHook::Unit(index))?;
        }

        Ok(())
    }

    fn bind_all(
        &self,
        hooks: &mut HookTable,
        peripheral: &dyn Peripheral,
        hook: RegisterHook,
    ) -> Result<()> {
        let registers = peripheral.registers();
        self.check_free(hooks, peripheral.name(), &registers)?;

        for address in registers {
            hooks.bind(address, hook);
        }

        Ok(())
    }

    fn check_free(&self, hooks: &HookTable, name: &str, registers: &[u16]) -> Result<()> {
        for &address in registers {
            if address as usize >= hooks.len() {
                return Err(SimulatorError::RegisterOutOfRange {
                    address,
                    peripheral: name.to_string(),
                });
            }

            match hooks.get(address) {
                None => {}
                Some(RegisterHook::Unit(index)) if self.units[index].is_placeholder() => {}
                Some(existing) => {
                    return Err(SimulatorError::RegisterConflict {
                        address,
                        owner: self.owner(existing),
                    });
                }
            }
        }

        Ok(())
    }

    /// Add an externally modeled peripheral, taking over placeholder registers
    pub fn attach(&mut self, peripheral: Box<dyn Peripheral>, hooks: &mut HookTable) -> Result<()> {
        let hook = RegisterHook::Unit(self.units.len());
        self.bind_all(hooks, peripheral.as_ref(), hook)?;

        log::debug!(
            "Attached peripheral {} at {:X?}",
            peripheral.name(),
            peripheral.registers()
        );

        self.units.push(peripheral);
        Ok(())
    }

    pub fn owner(&self, hook: RegisterHook) -> String {
        match hook {
            RegisterHook::Port(index) => self.ports[index].name().to_string(),
            RegisterHook::Adc => "ADC".to_string(),
            RegisterHook::Unit(index) => self.units[index].name().to_string(),
        }
    }

    pub fn find_mut(&mut self, hook: RegisterHook) -> Option<&mut dyn Peripheral> {
        match hook {
            RegisterHook::Port(index) => self
                .ports
                .get_mut(index)
                .map(|port| port as &mut dyn Peripheral),
            RegisterHook::Adc => self.adc.as_mut().map(|adc| adc as &mut dyn Peripheral),
            RegisterHook::Unit(index) => self
                .units
                .get_mut(index)
                .map(|unit| &mut **unit as &mut dyn Peripheral),
        }
    }

    pub fn port(&self, letter: char) -> Option<&GpioPort> {
        self.ports.iter().find(|port| port.letter() == letter)
    }

    pub fn port_mut(&mut self, letter: char) -> Option<&mut GpioPort> {
        self.ports.iter_mut().find(|port| port.letter() == letter)
    }

    pub fn units(&self) -> impl Iterator<Item = &dyn Peripheral> {
        self.units.iter().map(|unit| unit.as_ref())
    }

    fn all_mut(&mut self) -> impl Iterator<Item = &mut dyn Peripheral> {
        let ports = self.ports.iter_mut().map(|p| p as &mut dyn Peripheral);
        let adc = self.adc.iter_mut().map(|a| a as &mut dyn Peripheral);
        let units = self.units.iter_mut().map(|u| &mut **u as &mut dyn Peripheral);
        ports.chain(adc).chain(units)
    }

    /// Advance every peripheral by the cycles the last instruction consumed
    pub fn tick(&mut self, cycles: u32, ctx: &mut PeripheralAccessContext) {
        for peripheral in self.all_mut() {
            peripheral.tick(cycles, ctx);
        }
    }

    pub fn reset(&mut self) {
        for peripheral in self.all_mut() {
            peripheral.reset();
        }
    }
}

/// Register window of a unit declared by the chip but not modeled here.
/// Accesses are traced and fall through to plain storage.
pub struct UnimplementedPeripheral {
    name: String,
    registers: Vec<u16>,
}

impl UnimplementedPeripheral {
    pub fn new(name: String, registers: Vec<u16>) -> Self {
        Self { name, registers }
    }
}

impl Peripheral for UnimplementedPeripheral {
    fn name(&self) -> &str {
        &self.name
    }

    fn registers(&self) -> Vec<u16> {
        self.registers.clone()
    }

    fn write(&mut self, address: u16, value: u8, _ctx: &mut PeripheralAccessContext) -> bool {
        log::trace!(
            "Unimplemented peripheral {} write at address {:#04X} with value {:#04X}",
            self.name,
            address,
            value
        );
        false
    }

    fn is_placeholder(&self) -> bool {
        true
    }
}
