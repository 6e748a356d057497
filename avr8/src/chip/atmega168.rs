/**
 * @file chip/atmega168.rs
 * @date 17/10/2026
 * @brief ATmega168 descriptor
 */
use super::*;
use crate::common::KB;

/// Same register map as the 328P, smaller memories
pub const ATMEGA168: Chip = Chip {
    name: "atmega168",
    flash_size: 16 * KB,
    ram_size: KB,
    eeprom_size: KB / 2,
    ..ATMEGA328P
};
