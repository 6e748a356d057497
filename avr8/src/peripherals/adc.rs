/**
 * @file peripherals/adc.rs
 * @date 17/10/2026
 * @brief Analog to digital converter sampling the circuit on conversion start
 */
use super::{Peripheral, PeripheralAccessContext};
use crate::chip::AdcConfig;
use crate::circuit::UnresolvedNodes;
use crate::common::{ADC_MAX, GND, analog_node};
use crate::inspector::InspectionEvent;
use crate::utils::{extract_bits, is_set};

/// ADCSRA: start conversion
pub const ADSC: usize = 6;
/// ADMUX: left adjust result
pub const ADLAR: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub channel: u8,
    pub voltage: f64,
    pub value: u16,
}

/// Map `voltage` onto the 10-bit range against `reference`.
/// Half steps round away from zero, readings outside the rails saturate.
pub fn quantize(voltage: f64, reference: f64) -> u16 {
    if voltage.is_nan() {
        return 0;
    }

    let scaled = (voltage * ADC_MAX as f64 / reference).round();
    scaled.clamp(0.0, ADC_MAX as f64) as u16
}

/// The conversion completes within the write that starts it: ADSC reads
/// back as cleared and the result is in ADCL/ADCH before the next instruction.
pub struct Adc {
    config: AdcConfig,
    nodes: UnresolvedNodes,
    /// Channels above `config.channels` already reported, one bit each
    unrouted: u16,
    last: Option<Conversion>,
    conversions: u64,
}

impl Adc {
    pub fn new(config: AdcConfig) -> Self {
        Self {
            config,
            nodes: UnresolvedNodes::default(),
            unrouted: 0,
            last: None,
            conversions: 0,
        }
    }

    pub fn last(&self) -> Option<Conversion> {
        self.last
    }

    pub fn conversions(&self) -> u64 {
        self.conversions
    }

    /// Whether a conversion was started on a channel with no analog input pin
    pub fn has_unrouted_channel(&self, channel: u8) -> bool {
        self.unrouted & (1 << channel) != 0
    }

    fn convert(&mut self, ctx: &mut PeripheralAccessContext) -> Conversion {
        let admux = ctx.data.reg(self.config.admux);
        let channel = extract_bits(admux, 0..=3);

        if channel >= self.config.channels && !self.has_unrouted_channel(channel) {
            log::warn!(
                "ADC channel {channel} has no analog input, only {} are available",
                self.config.channels
            );
            self.unrouted |= 1 << channel;
        }

        let node = analog_node(channel);
        let voltage = self
            .nodes
            .voltage_or(&*ctx.circuit, &node, GND, ctx.inspector);
        let value = quantize(voltage, self.config.reference_voltage);

        let (low, high) = if is_set(admux, ADLAR) {
            let adjusted = value << 6;
            (adjusted as u8, (adjusted >> 8) as u8)
        } else {
            (value as u8, (value >> 8) as u8)
        };

        ctx.data.set_reg(self.config.adcl, low);
        ctx.data.set_reg(self.config.adch, high);

        Conversion {
            channel,
            voltage,
            value,
        }
    }
}

impl Peripheral for Adc {
    fn name(&self) -> &str {
        "ADC"
    }

    fn registers(&self) -> Vec<u16> {
        vec![self.config.adcsra]
    }

    fn write(&mut self, address: u16, value: u8, ctx: &mut PeripheralAccessContext) -> bool {
        if address != self.config.adcsra || !is_set(value, ADSC) {
            return false;
        }

        ctx.data.set_reg(address, value & !(1 << ADSC));

        let conversion = self.convert(ctx);
        self.last = Some(conversion);
        self.conversions += 1;

        ctx.inspector.raise(InspectionEvent::AdcConversion {
            channel: conversion.channel,
            voltage: conversion.voltage,
            value: conversion.value,
        });

        true
    }

    fn reset(&mut self) {
        self.last = None;
        self.conversions = 0;
    }
}
