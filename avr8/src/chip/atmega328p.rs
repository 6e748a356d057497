/**
 * @file chip/atmega328p.rs
 * @date 17/10/2026
 * @brief ATmega328P descriptor (Arduino Uno pinout)
 */
use super::*;
use crate::common::{KB, MHZ};

pub const CLOCK: ClockConfig = ClockConfig { clkpr: 0x61 };

pub const EEPROM: EepromConfig = EepromConfig {
    eecr: 0x3F,
    eedr: 0x40,
    eearl: 0x41,
    eearh: 0x42,
    ready_interrupt: 0x2C,
    erase_cycles: 28_800, // 1.8ms at 16MHz
    write_cycles: 28_800,
};

pub const PORT_B: PortConfig = PortConfig {
    pin: 0x23,
    ddr: 0x24,
    port: 0x25,
    pin_change: Some(PinChangeConfig {
        pcie: 0,
        pcicr: 0x68,
        pcifr: 0x3B,
        pcmsk: 0x6B,
        interrupt: 0x06,
    }),
};

pub const PORT_C: PortConfig = PortConfig {
    pin: 0x26,
    ddr: 0x27,
    port: 0x28,
    pin_change: Some(PinChangeConfig {
        pcie: 1,
        pcicr: 0x68,
        pcifr: 0x3B,
        pcmsk: 0x6C,
        interrupt: 0x08,
    }),
};

pub const PORT_D: PortConfig = PortConfig {
    pin: 0x29,
    ddr: 0x2A,
    port: 0x2B,
    pin_change: Some(PinChangeConfig {
        pcie: 2,
        pcicr: 0x68,
        pcifr: 0x3B,
        pcmsk: 0x6D,
        interrupt: 0x0A,
    }),
};

pub const TIMER0: TimerConfig = TimerConfig {
    bits: 8,
    tccra: 0x44,
    tccrb: 0x45,
    tccrc: None,
    tcnt: 0x46,
    ocra: 0x47,
    ocrb: 0x48,
    icr: None,
    timsk: 0x6E,
    tifr: 0x35,
    capture_interrupt: None,
    compa_interrupt: 0x1C,
    compb_interrupt: 0x1E,
    ovf_interrupt: 0x20,
};

pub const TIMER1: TimerConfig = TimerConfig {
    bits: 16,
    tccra: 0x80,
    tccrb: 0x81,
    tccrc: Some(0x82),
    tcnt: 0x84,
    ocra: 0x88,
    ocrb: 0x8A,
    icr: Some(0x86),
    timsk: 0x6F,
    tifr: 0x36,
    capture_interrupt: Some(0x14),
    compa_interrupt: 0x16,
    compb_interrupt: 0x18,
    ovf_interrupt: 0x1A,
};

pub const TIMER2: TimerConfig = TimerConfig {
    bits: 8,
    tccra: 0xB0,
    tccrb: 0xB1,
    tccrc: None,
    tcnt: 0xB2,
    ocra: 0xB3,
    ocrb: 0xB4,
    icr: None,
    timsk: 0x70,
    tifr: 0x37,
    capture_interrupt: None,
    compa_interrupt: 0x0E,
    compb_interrupt: 0x10,
    ovf_interrupt: 0x12,
};

pub const USART0: UsartConfig = UsartConfig {
    ucsra: 0xC0,
    ucsrb: 0xC1,
    ucsrc: 0xC2,
    ubrrl: 0xC4,
    ubrrh: 0xC5,
    udr: 0xC6,
    rx_complete_interrupt: 0x24,
    data_register_empty_interrupt: 0x26,
    tx_complete_interrupt: 0x28,
};

pub const SPI: SpiConfig = SpiConfig {
    spcr: 0x4C,
    spsr: 0x4D,
    spdr: 0x4E,
    interrupt: 0x22,
};

pub const TWI: TwiConfig = TwiConfig {
    twbr: 0xB8,
    twsr: 0xB9,
    twar: 0xBA,
    twdr: 0xBB,
    twcr: 0xBC,
    twamr: 0xBD,
    interrupt: 0x30,
};

pub const ADC: AdcConfig = AdcConfig {
    adcl: 0x78,
    adch: 0x79,
    adcsra: 0x7A,
    adcsrb: 0x7B,
    admux: 0x7C,
    didr0: 0x7E,
    interrupt: 0x2A,
    channels: 8,
    reference_voltage: 5.0,
};

/// Digital 0-7 on PORTD, 8-13 on PORTB, 14-19 (A0-A5) on PORTC
#[rustfmt::skip]
pub const PINS: [PinMapping; 20] = [
    PinMapping::new('D', 0), PinMapping::new('D', 1), PinMapping::new('D', 2), PinMapping::new('D', 3),
    PinMapping::new('D', 4), PinMapping::new('D', 5), PinMapping::new('D', 6), PinMapping::new('D', 7),
    PinMapping::new('B', 0), PinMapping::new('B', 1), PinMapping::new('B', 2), PinMapping::new('B', 3),
    PinMapping::new('B', 4), PinMapping::new('B', 5),
    PinMapping::new('C', 0), PinMapping::new('C', 1), PinMapping::new('C', 2), PinMapping::new('C', 3),
    PinMapping::new('C', 4), PinMapping::new('C', 5),
];

pub const ATMEGA328P: Chip = Chip {
    name: "atmega328p",
    flash_size: 32 * KB,
    ram_size: 2 * KB,
    eeprom_size: KB,
    register_space: 0x100,
    default_frequency: 16.0 * MHZ,
    clock: CLOCK,
    eeprom: EEPROM,
    gpio: &[('B', PORT_B), ('C', PORT_C), ('D', PORT_D)],
    timers: &[TIMER0, TIMER1, TIMER2],
    usart: &[USART0],
    spi: &[SPI],
    twi: &[TWI],
    adc: Some(ADC),
    pins: &PINS,
};
