/**
 * @file chip.rs
 * @date 17/10/2026
 * @brief Static per-variant hardware descriptors
 */
use thiserror::Error;

pub mod atmega168;
pub mod atmega328p;

pub use atmega168::ATMEGA168;
pub use atmega328p::ATMEGA328P;

/// Interrupt vector, as a word address into flash
pub type Vector = u16;

/// Every variant this crate knows how to wire up
pub const SUPPORTED_CHIPS: &[&Chip] = &[&ATMEGA328P, &ATMEGA168];

pub fn by_name(name: &str) -> Option<&'static Chip> {
    SUPPORTED_CHIPS
        .iter()
        .copied()
        .find(|chip| chip.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    pub clkpr: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EepromConfig {
    pub eecr: u16,
    pub eedr: u16,
    pub eearl: u16,
    pub eearh: u16,
    pub ready_interrupt: Vector,
    pub erase_cycles: u32,
    pub write_cycles: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinChangeConfig {
    pub pcie: u8,
    pub pcicr: u16,
    pub pcifr: u16,
    pub pcmsk: u16,
    pub interrupt: Vector,
}

/// PINx, DDRx and PORTx of one 8-bit port. The three registers are consecutive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortConfig {
    pub pin: u16,
    pub ddr: u16,
    pub port: u16,
    pub pin_change: Option<PinChangeConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub bits: u8,
    pub tccra: u16,
    pub tccrb: u16,
    pub tccrc: Option<u16>,
    pub tcnt: u16,
    pub ocra: u16,
    pub ocrb: u16,
    pub icr: Option<u16>,
    pub timsk: u16,
    pub tifr: u16,
    pub capture_interrupt: Option<Vector>,
    pub compa_interrupt: Vector,
    pub compb_interrupt: Vector,
    pub ovf_interrupt: Vector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsartConfig {
    pub ucsra: u16,
    pub ucsrb: u16,
    pub ucsrc: u16,
    pub ubrrl: u16,
    pub ubrrh: u16,
    pub udr: u16,
    pub rx_complete_interrupt: Vector,
    pub data_register_empty_interrupt: Vector,
    pub tx_complete_interrupt: Vector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiConfig {
    pub spcr: u16,
    pub spsr: u16,
    pub spdr: u16,
    pub interrupt: Vector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwiConfig {
    pub twbr: u16,
    pub twsr: u16,
    pub twar: u16,
    pub twdr: u16,
    pub twcr: u16,
    pub twamr: u16,
    pub interrupt: Vector,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcConfig {
    pub adcl: u16,
    pub adch: u16,
    pub adcsra: u16,
    pub adcsrb: u16,
    pub admux: u16,
    pub didr0: u16,
    pub interrupt: Vector,
    /// Number of analog inputs routed to package pins
    pub channels: u8,
    pub reference_voltage: f64,
}

/// Physical pin number to (port letter, bit) decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMapping {
    pub port: char,
    pub bit: u8,
}

impl PinMapping {
    pub const fn new(port: char, bit: u8) -> Self {
        Self { port, bit }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chip {
    pub name: &'static str,
    pub flash_size: usize,
    pub ram_size: usize,
    pub eeprom_size: usize,
    pub register_space: usize,
    pub default_frequency: f64,
    pub clock: ClockConfig,
    pub eeprom: EepromConfig,
    pub gpio: &'static [(char, PortConfig)],
    pub timers: &'static [TimerConfig],
    pub usart: &'static [UsartConfig],
    pub spi: &'static [SpiConfig],
    pub twi: &'static [TwiConfig],
    pub adc: Option<AdcConfig>,
    pub pins: &'static [PinMapping],
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChipError {
    #[error("{field} must be a non-zero power of two, got {value:#X}")]
    SizeNotPowerOfTwo { field: &'static str, value: usize },

    #[error("{owner} references register {offset:#04X} outside of {limit:#X} bytes of register space")]
    RegisterOutOfRange {
        owner: String,
        offset: u16,
        limit: usize,
    },

    #[error("Port {port} registers must be laid out as consecutive PIN, DDR, PORT")]
    PortLayout { port: char },

    #[error("Pin {pin} references undeclared port {port}")]
    UnknownPort { pin: usize, port: char },

    #[error("Pin {pin} references bit {bit}, ports are 8 bits wide")]
    InvalidBit { pin: usize, bit: u8 },

    #[error("Pins {pin} and {other} map onto the same port bit")]
    DuplicatePin { pin: usize, other: usize },

    #[error("Default frequency must be positive and finite, got {0}")]
    InvalidFrequency(f64),
}

impl Chip {
    /// Size of the unified data space: register file, I/O registers and SRAM
    pub const fn data_size(&self) -> usize {
        self.register_space + self.ram_size
    }

    pub fn port(&self, letter: char) -> Option<&PortConfig> {
        self.gpio
            .iter()
            .find(|(name, _)| *name == letter)
            .map(|(_, config)| config)
    }

    pub fn pin(&self, index: usize) -> Option<PinMapping> {
        self.pins.get(index).copied()
    }

    /// Every register offset named by a peripheral config, with its owner
    pub fn registers(&self) -> Vec<(String, u16)> {
        let mut result = vec![("CLOCK".to_string(), self.clock.clkpr)];

        let eeprom = &self.eeprom;
        for offset in [eeprom.eecr, eeprom.eedr, eeprom.eearl, eeprom.eearh] {
            result.push(("EEPROM".to_string(), offset));
        }

        for (letter, port) in self.gpio {
            let owner = format!("PORT{letter}");
            for offset in [port.pin, port.ddr, port.port] {
                result.push((owner.clone(), offset));
            }

            if let Some(pc) = &port.pin_change {
                for offset in [pc.pcicr, pc.pcifr, pc.pcmsk] {
                    result.push((owner.clone(), offset));
                }
            }
        }

        for (index, timer) in self.timers.iter().enumerate() {
            let owner = format!("TIMER{index}");
            let fixed = [
                timer.tccra,
                timer.tccrb,
                timer.tcnt,
                timer.ocra,
                timer.ocrb,
                timer.timsk,
                timer.tifr,
            ];

            for offset in fixed.into_iter().chain(timer.tccrc).chain(timer.icr) {
                result.push((owner.clone(), offset));
            }
        }

        for (index, usart) in self.usart.iter().enumerate() {
            let owner = format!("USART{index}");
            for offset in [
                usart.ucsra,
                usart.ucsrb,
                usart.ucsrc,
                usart.ubrrl,
                usart.ubrrh,
                usart.udr,
            ] {
                result.push((owner.clone(), offset));
            }
        }

        for (index, spi) in self.spi.iter().enumerate() {
            let owner = format!("SPI{index}");
            for offset in [spi.spcr, spi.spsr, spi.spdr] {
                result.push((owner.clone(), offset));
            }
        }

        for (index, twi) in self.twi.iter().enumerate() {
            let owner = format!("TWI{index}");
            for offset in [twi.twbr, twi.twsr, twi.twar, twi.twdr, twi.twcr, twi.twamr] {
                result.push((owner.clone(), offset));
            }
        }

        if let Some(adc) = &self.adc {
            for offset in [adc.adcl, adc.adch, adc.adcsra, adc.adcsrb, adc.admux, adc.didr0] {
                result.push(("ADC".to_string(), offset));
            }
        }

        result
    }

    pub fn validate(&self) -> Result<(), ChipError> {
        let sizes = [
            ("flash_size", self.flash_size),
            ("ram_size", self.ram_size),
            ("eeprom_size", self.eeprom_size),
            ("register_space", self.register_space),
        ];

        for (field, value) in sizes {
            if !value.is_power_of_two() {
                return Err(ChipError::SizeNotPowerOfTwo { field, value });
            }
        }

        if !self.default_frequency.is_finite() || self.default_frequency <= 0.0 {
            return Err(ChipError::InvalidFrequency(self.default_frequency));
        }

        for (owner, offset) in self.registers() {
            if offset as usize >= self.register_space {
                return Err(ChipError::RegisterOutOfRange {
                    owner,
                    offset,
                    limit: self.register_space,
                });
            }
        }

        for (letter, port) in self.gpio {
            if port.ddr != port.pin + 1 || port.port != port.pin + 2 {
                return Err(ChipError::PortLayout { port: *letter });
            }
        }

        for (pin, mapping) in self.pins.iter().enumerate() {
            if self.port(mapping.port).is_none() {
                return Err(ChipError::UnknownPort {
                    pin,
                    port: mapping.port,
                });
            }

            if mapping.bit >= 8 {
                return Err(ChipError::InvalidBit {
                    pin,
                    bit: mapping.bit,
                });
            }

            if let Some(other) = self.pins[..pin].iter().position(|m| m == mapping) {
                return Err(ChipError::DuplicatePin { pin, other });
            }
        }

        Ok(())
    }
}
