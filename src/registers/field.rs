//! Bit-field writes
//!
//! A [`RegisterField`] is the unit of every partial register write: a
//! register address, a bit range and a value. The value is in register
//! position, bits outside `[lsb, msb]` are ignored and left untouched in
//! the register.

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterField {
    /// Register address
    pub address: u8,
    /// Most significant bit of the field, 0..=7
    pub msb: u8,
    /// Least significant bit of the field, 0..=7
    pub lsb: u8,
    /// Field value, already shifted into position
    pub value: u8,
}

impl RegisterField {
    /// Field spanning bits `[lsb, msb]` of `address`.
    pub const fn new(address: u8, value: u8, msb: u8, lsb: u8) -> Self {
        Self {
            address,
            msb,
            lsb,
            value,
        }
    }

    /// Field covering the whole register.
    pub const fn full(address: u8, value: u8) -> Self {
        Self::new(address, value, 7, 0)
    }

    /// Bit mask of the field, `InvalidBitRange` if the range is malformed.
    pub fn mask(&self) -> Result<u8, Error> {
        if self.msb > 7 || self.lsb > 7 || self.lsb > self.msb {
            return Err(Error::InvalidBitRange);
        }
        Ok(((0xFFu16 << self.lsb) & (0xFFu16 >> (7 - self.msb))) as u8)
    }

    /// Register contents after writing this field over `current`.
    pub fn apply(&self, current: u8) -> Result<u8, Error> {
        let mask = self.mask()?;
        Ok((current & !mask) | (self.value & mask))
    }

    /// True if `current` holds this field's value.
    pub fn matches(&self, current: u8) -> Result<bool, Error> {
        let mask = self.mask()?;
        Ok(current & mask == self.value & mask)
    }
}
