//! Shared SX127x radio core
//!
//! [`RadioCore`] is the capability the chip specific configurators are
//! built on: raw register access, bit-field writes, standby and frequency
//! synthesis, plus the initialisation steps common to every SX127x part.
//! [`Device`](crate::Device) implements it over SPI. The configurator owns
//! its core, so any other implementation (a shared bus wrapper, a test
//! double) can be slotted in.

use crate::registers::RegisterField;
use crate::Error;

/// Register level access to an SX127x radio.
pub trait RadioCore {
    /// Reads one register.
    fn read_reg(&mut self, address: u8) -> Result<u8, Error>;

    /// Writes one register.
    fn write_reg(&mut self, address: u8, value: u8) -> Result<(), Error>;

    /// Writes a bit-field, leaving the bits outside `[lsb, msb]` as they were.
    ///
    /// The register is read back afterwards and `SpiWriteFailed` is returned
    /// if the field does not hold the written value.
    fn set_reg_field(&mut self, field: RegisterField) -> Result<(), Error> {
        field.mask()?;
        let current = self.read_reg(field.address)?;
        self.write_reg(field.address, field.apply(current)?)?;

        let written = self.read_reg(field.address)?;
        if field.matches(written)? {
            Ok(())
        } else {
            Err(Error::SpiWriteFailed {
                address: field.address,
            })
        }
    }

    /// Puts the radio in standby, where configuration is safe.
    fn standby(&mut self) -> Result<(), Error>;

    /// Programs the carrier frequency without any validation or correction.
    fn set_frequency_raw(&mut self, freq_mhz: f32) -> Result<(), Error>;

    /// Common initialisation: checks the silicon version, selects the LoRa
    /// modem and sets sync word, over-current limit and preamble length.
    fn begin(
        &mut self,
        chip_version: u8,
        sync_word: u8,
        current_limit: u8,
        preamble_length: u16,
    ) -> Result<(), Error>;

    /// Common register configuration that has no public setter.
    fn config(&mut self) -> Result<(), Error>;
}

impl<T: RadioCore + ?Sized> RadioCore for &mut T {
    fn read_reg(&mut self, address: u8) -> Result<u8, Error> {
        (**self).read_reg(address)
    }

    fn write_reg(&mut self, address: u8, value: u8) -> Result<(), Error> {
        (**self).write_reg(address, value)
    }

    fn set_reg_field(&mut self, field: RegisterField) -> Result<(), Error> {
        (**self).set_reg_field(field)
    }

    fn standby(&mut self) -> Result<(), Error> {
        (**self).standby()
    }

    fn set_frequency_raw(&mut self, freq_mhz: f32) -> Result<(), Error> {
        (**self).set_frequency_raw(freq_mhz)
    }

    fn begin(
        &mut self,
        chip_version: u8,
        sync_word: u8,
        current_limit: u8,
        preamble_length: u16,
    ) -> Result<(), Error> {
        (**self).begin(chip_version, sync_word, current_limit, preamble_length)
    }

    fn config(&mut self) -> Result<(), Error> {
        (**self).config()
    }
}
