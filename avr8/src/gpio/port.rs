/**
 * @file gpio/port.rs
 * @date 17/10/2026
 * @brief 8-bit GPIO port backed by the PINx, DDRx and PORTx registers
 */
use super::PinState;
use crate::chip::PortConfig;
use crate::memory::DataMemory;
use crate::peripherals::{Peripheral, PeripheralAccessContext};
use crate::utils::{assign_bit, is_set};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Offset of each register from PINx
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum PortRegister {
    Pin = 0,
    Ddr = 1,
    Port = 2,
}

pub struct GpioPort {
    name: String,
    letter: char,
    config: PortConfig,
    // levels applied from outside the chip
    inputs: u8,
}

impl GpioPort {
    pub fn new(letter: char, config: PortConfig) -> Self {
        Self {
            name: format!("PORT{letter}"),
            letter,
            config,
            inputs: 0,
        }
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn register(&self, address: u16) -> Option<PortRegister> {
        PortRegister::from_u16(address.checked_sub(self.config.pin)?)
    }

    pub fn pin_state(&self, data: &DataMemory, bit: u8) -> PinState {
        let ddr = data.reg(self.config.ddr);
        let port = data.reg(self.config.port);
        PinState::from_registers(is_set(ddr, bit as usize), is_set(port, bit as usize))
    }

    pub fn input_level(&self, bit: u8) -> bool {
        is_set(self.inputs, bit as usize)
    }

    /// Apply an external level to `bit`. Returns whether the level changed.
    pub fn set_pin(&mut self, data: &mut DataMemory, bit: u8, high: bool) -> bool {
        let previous = self.inputs;
        self.inputs = assign_bit(self.inputs, bit as usize, high);
        self.update_pin_register(data);
        previous != self.inputs
    }

    // PINx reads back driven levels on outputs and external levels on inputs
    fn update_pin_register(&self, data: &mut DataMemory) {
        let ddr = data.reg(self.config.ddr);
        let port = data.reg(self.config.port);
        data.set_reg(self.config.pin, (port & ddr) | (self.inputs & !ddr));
    }
}

impl Peripheral for GpioPort {
    fn name(&self) -> &str {
        &self.name
    }

    fn registers(&self) -> Vec<u16> {
        vec![self.config.pin, self.config.ddr, self.config.port]
    }

    fn write(&mut self, address: u16, value: u8, ctx: &mut PeripheralAccessContext) -> bool {
        let Some(register) = self.register(address) else {
            return false;
        };

        match register {
            // writing ones to PINx toggles the matching PORTx bits
            PortRegister::Pin => {
                let port = ctx.data.reg(self.config.port);
                ctx.data.set_reg(self.config.port, port ^ value);
            }
            PortRegister::Ddr => ctx.data.set_reg(self.config.ddr, value),
            PortRegister::Port => ctx.data.set_reg(self.config.port, value),
        }

        self.update_pin_register(ctx.data);
        true
    }

    fn reset(&mut self) {
        self.inputs = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::atmega328p::PORT_B;
    use crate::circuit::FixedCircuit;
    use crate::inspector::InspectorRef;

    macro_rules! setup {
        ($port:ident, $data:ident) => {
            #[allow(unused_mut)]
            let mut $port = GpioPort::new('B', PORT_B);
            #[allow(unused_mut)]
            let mut $data = DataMemory::new(0x100);
        };
    }

    fn write(port: &mut GpioPort, data: &mut DataMemory, address: u16, value: u8) -> bool {
        let mut circuit = FixedCircuit::new();
        let inspector = InspectorRef::default();
        let mut ctx = PeripheralAccessContext::new(address, data, &mut circuit, &inspector);
        port.write(address, value, &mut ctx)
    }

    #[test]
    fn test_register_decoding() {
        setup!(port, _data);
        assert_eq!(port.register(0x23), Some(PortRegister::Pin));
        assert_eq!(port.register(0x24), Some(PortRegister::Ddr));
        assert_eq!(port.register(0x25), Some(PortRegister::Port));
        assert_eq!(port.register(0x22), None);
        assert_eq!(port.register(0x26), None);
    }

    #[test]
    fn test_pin_states() {
        setup!(port, data);

        assert!(write(&mut port, &mut data, PORT_B.ddr, 0b0010_0001));
        assert!(write(&mut port, &mut data, PORT_B.port, 0b0010_0010));

        assert_eq!(port.pin_state(&data, 0), PinState::DrivenLow);
        assert_eq!(port.pin_state(&data, 1), PinState::InputPullUp);
        assert_eq!(port.pin_state(&data, 2), PinState::Input);
        assert_eq!(port.pin_state(&data, 5), PinState::DrivenHigh);
    }

    #[test]
    fn test_pin_register_mirrors_outputs_and_inputs() {
        setup!(port, data);

        write(&mut port, &mut data, PORT_B.ddr, 0b0000_0001);
        write(&mut port, &mut data, PORT_B.port, 0b0000_0001);
        assert_eq!(data.reg(PORT_B.pin), 0b0000_0001);

        assert!(port.set_pin(&mut data, 3, true));
        assert!(!port.set_pin(&mut data, 3, true));
        assert_eq!(data.reg(PORT_B.pin), 0b0000_1001);

        // external level on an output bit is masked by DDR
        port.set_pin(&mut data, 0, false);
        assert_eq!(data.reg(PORT_B.pin), 0b0000_1001);
    }

    #[test]
    fn test_pin_write_toggles_port() {
        setup!(port, data);

        write(&mut port, &mut data, PORT_B.ddr, 0xFF);
        write(&mut port, &mut data, PORT_B.pin, 0b0010_0000);
        assert_eq!(data.reg(PORT_B.port), 0b0010_0000);
        assert_eq!(port.pin_state(&data, 5), PinState::DrivenHigh);

        write(&mut port, &mut data, PORT_B.pin, 0b0010_0000);
        assert_eq!(data.reg(PORT_B.port), 0);
        assert_eq!(port.pin_state(&data, 5), PinState::DrivenLow);
    }

    #[test]
    fn test_reset_clears_external_levels() {
        setup!(port, data);
        port.set_pin(&mut data, 4, true);
        port.reset();
        assert!(!port.input_level(4));
    }
}
