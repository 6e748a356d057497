/**
 * @file bus.rs
 * @date 17/10/2026
 * @brief Data-space access with register side-effect interception
 */
use crate::InspectorRef;
use crate::circuit::Circuit;
use crate::memory::DataMemory;
use crate::peripherals::{PeripheralAccessContext, Peripherals};

/// Handler owning an intercepted register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterHook {
    Port(usize),
    Adc,
    Unit(usize),
}

/// Address to handler table over the register space, filled at construction
pub struct HookTable {
    slots: Vec<Option<RegisterHook>>,
}

impl HookTable {
    pub fn new(register_space: usize) -> Self {
        Self {
            slots: vec![None; register_space],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, address: u16) -> Option<RegisterHook> {
        self.slots.get(address as usize).copied().flatten()
    }

    /// Returns the previous owner of `address`
    pub fn bind(&mut self, address: u16, hook: RegisterHook) -> Option<RegisterHook> {
        self.slots
            .get_mut(address as usize)
            .and_then(|slot| slot.replace(hook))
    }
}

/// View of the data space handed to the instruction core for one instruction
pub struct Bus<'a> {
    data: &'a mut DataMemory,
    hooks: &'a HookTable,
    peripherals: &'a mut Peripherals,
    circuit: &'a mut dyn Circuit,
    inspector: &'a InspectorRef,
}

impl<'a> Bus<'a> {
    pub fn new(
        data: &'a mut DataMemory,
        hooks: &'a HookTable,
        peripherals: &'a mut Peripherals,
        circuit: &'a mut dyn Circuit,
        inspector: &'a InspectorRef,
    ) -> Self {
        Self {
            data,
            hooks,
            peripherals,
            circuit,
            inspector,
        }
    }

    pub fn read(&mut self, address: u16) -> u8 {
        let peripheral = self
            .hooks
            .get(address)
            .and_then(|hook| self.peripherals.find_mut(hook));

        if let Some(peripheral) = peripheral {
            let mut ctx = PeripheralAccessContext::new(
                address,
                &mut *self.data,
                &mut *self.circuit,
                self.inspector,
            );

            if let Some(value) = peripheral.read(address, &mut ctx) {
                return value;
            }
        }

        self.data.reg(address)
    }

    pub fn write(&mut self, address: u16, value: u8) {
        let peripheral = self
            .hooks
            .get(address)
            .and_then(|hook| self.peripherals.find_mut(hook));

        if let Some(peripheral) = peripheral {
            let mut ctx = PeripheralAccessContext::new(
                address,
                &mut *self.data,
                &mut *self.circuit,
                self.inspector,
            );

            if peripheral.write(address, value, &mut ctx) {
                return;
            }
        }

        self.data.set_reg(address, value);
    }

    /// Raw data space, bypassing every hook
    pub fn data(&self) -> &DataMemory {
        &*self.data
    }

    pub fn data_mut(&mut self) -> &mut DataMemory {
        &mut *self.data
    }
}
