//! Bit manipulation helpers for the 8-bit register file.

use num_traits::PrimInt;
use std::ops::RangeInclusive;

fn width<T: PrimInt>() -> usize {
    T::zero().count_zeros() as usize
}

pub fn extract_bits<T: PrimInt>(bits: T, range: RangeInclusive<usize>) -> T {
    let lsb = *range.start();
    let len = range.end() + 1 - lsb;

    let mask = if len >= width::<T>() {
        !T::zero()
    } else {
        (T::one() << len) - T::one()
    };

    (bits >> lsb) & mask
}

pub fn extract_bit<T: PrimInt>(bits: T, bit: usize) -> T {
    extract_bits(bits, bit..=bit)
}

pub fn is_set<T: PrimInt>(bits: T, bit: usize) -> bool {
    extract_bit(bits, bit) == T::one()
}

pub fn assign_bit<T: PrimInt>(bits: T, bit: usize, value: bool) -> T {
    let mask = T::one() << bit;
    if value { bits | mask } else { bits & !mask }
}
