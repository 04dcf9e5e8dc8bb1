//! SX127x SPI Device Interface
//!
//! This module provides the SPI backed [`RadioCore`] for the SX127x family.
//! Registers are addressed with a single header byte: bit 7 set for a
//! write, cleared for a read, followed by the register address. Multi-byte
//! registers use burst access, the address increments after every byte.
//!
//! `Device<SPI>` offers:
//! - Typed register access through `regiface`
//! - Raw byte and bit-field register access
//! - The initialisation steps shared by every SX127x part
//!
//! # Example
//! ```no_run
//! use embedded_hal::spi::SpiDevice;
//! use sx1278::{Device, Error, Mode};
//!
//! fn wake<SPI: SpiDevice>(spi: SPI) -> Result<Device<SPI>, Error> {
//!     let mut device = Device::new(spi);
//!     device.find_chip(0x12)?;
//!     device.set_mode(Mode::Standby)?;
//!     Ok(device)
//! }
//! ```

use core::convert::Infallible;

use regiface::{ByteArray, ReadableRegister, WritableRegister};

use crate::radio::RadioCore;
use crate::registers::{
    FifoRxBaseAddr, FifoTxBaseAddr, Frf, HopPeriod, Mode, Ocp, OpMode, PreambleLength,
    RegisterField, SyncWord, Version, REG_OP_MODE,
};
use crate::Error;

const WRITE_FLAG: u8 = 0x80;

/// Number of RegVersion reads before the chip is declared missing
const FIND_CHIP_ATTEMPTS: usize = 10;

/// Shortest preamble the modem accepts, in symbols
pub const MIN_PREAMBLE_LENGTH: u16 = 6;

/// Main device interface for SX127x radios.
///
/// This struct wraps an SPI interface and implements [`RadioCore`] on it.
pub struct Device<SPI> {
    spi: SPI,
}

impl<SPI> Device<SPI> {
    /// Creates a new Device instance wrapping the provided SPI interface.
    ///
    /// # Arguments
    /// * `spi` - An SPI interface implementing `embedded_hal::spi::SpiDevice`
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Reads a register value from the device.
    ///
    /// # Type Parameters
    /// * `R` - Register type implementing ReadableRegister with u8 ID
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    /// * `Error::Deserialization` - Failed to parse register value
    pub fn read_register<R>(&mut self) -> Result<R, Error>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[R::id() & !WRITE_FLAG]),
                embedded_hal::spi::Operation::Read(raw_value.as_mut()),
            ])
            .map_err(|_| Error::Bus)?;

        R::from_bytes(raw_value).map_err(|_| Error::Deserialization)
    }

    /// Writes a value to a device register.
    ///
    /// # Errors
    /// * `Error::Bus` - SPI communication failed
    pub fn write_register<R>(&mut self, register: R) -> Result<(), Error>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = match register.to_bytes() {
            Ok(raw_value) => raw_value,
            Err(never) => match never {},
        };

        trace!("write register {=u8:#x}", R::id());
        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[R::id() | WRITE_FLAG]),
                embedded_hal::spi::Operation::Write(raw_value.as_ref()),
            ])
            .map_err(|_| Error::Bus)
    }

    /// Reads RegVersion until it holds `chip_version`.
    ///
    /// # Errors
    /// * `Error::ChipNotFound` - Version did not match, carries the last value read
    pub fn find_chip(&mut self, chip_version: u8) -> Result<(), Error> {
        let mut found = 0;
        for _ in 0..FIND_CHIP_ATTEMPTS {
            found = self.read_register::<Version>()?.value;
            if found == chip_version {
                debug!("found chip version {=u8:#x}", found);
                return Ok(());
            }
        }
        warn!(
            "chip version {=u8:#x} not found, read {=u8:#x}",
            chip_version, found
        );
        Err(Error::ChipNotFound(found))
    }

    /// Current operating mode.
    pub fn mode(&mut self) -> Result<Mode, Error> {
        Ok(self.read_register::<OpMode>()?.mode)
    }

    /// Switches the operating mode, leaving the modem selection untouched.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), Error> {
        self.set_reg_field(RegisterField::new(REG_OP_MODE, mode as u8, 2, 0))
    }

    /// Selects the LoRa modem. The radio is left in sleep mode.
    pub fn set_lora_mode(&mut self) -> Result<(), Error> {
        self.set_mode(Mode::Sleep)?;
        let op_mode = self.read_register::<OpMode>()?;
        if op_mode.long_range {
            return Ok(());
        }
        self.write_register(OpMode {
            long_range: true,
            ..op_mode
        })
    }

    /// Sets the LoRa sync word.
    pub fn set_sync_word(&mut self, sync_word: u8) -> Result<(), Error> {
        self.standby()?;
        self.write_register(SyncWord { value: sync_word })
    }

    /// Sets the over-current protection limit in mA.
    ///
    /// # Errors
    /// * `Error::InvalidCurrentLimit` - Limit outside 45..=240 mA
    pub fn set_current_limit(&mut self, limit: u8) -> Result<(), Error> {
        let Some(ocp) = Ocp::from_milliamps(limit) else {
            debug!("rejected current limit {=u8} mA", limit);
            return Err(Error::InvalidCurrentLimit);
        };
        self.standby()?;
        self.write_register(ocp)
    }

    /// Sets the preamble length in symbols.
    ///
    /// # Errors
    /// * `Error::InvalidPreambleLength` - Length below 6 symbols
    pub fn set_preamble_length(&mut self, length: u16) -> Result<(), Error> {
        if length < MIN_PREAMBLE_LENGTH {
            debug!("rejected preamble length {=u16}", length);
            return Err(Error::InvalidPreambleLength);
        }
        self.standby()?;
        self.write_register(PreambleLength { length })
    }
}

impl<SPI> RadioCore for Device<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    fn read_reg(&mut self, address: u8) -> Result<u8, Error> {
        let mut value = [0u8];
        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[address & !WRITE_FLAG]),
                embedded_hal::spi::Operation::Read(&mut value),
            ])
            .map_err(|_| Error::Bus)?;
        Ok(value[0])
    }

    fn write_reg(&mut self, address: u8, value: u8) -> Result<(), Error> {
        trace!("write {=u8:#x} = {=u8:#x}", address, value);
        self.spi
            .write(&[address | WRITE_FLAG, value])
            .map_err(|_| Error::Bus)
    }

    fn standby(&mut self) -> Result<(), Error> {
        self.set_mode(Mode::Standby)
    }

    fn set_frequency_raw(&mut self, freq_mhz: f32) -> Result<(), Error> {
        self.standby()?;
        self.write_register(Frf::from_mhz(freq_mhz))
    }

    fn begin(
        &mut self,
        chip_version: u8,
        sync_word: u8,
        current_limit: u8,
        preamble_length: u16,
    ) -> Result<(), Error> {
        self.find_chip(chip_version)?;
        self.set_lora_mode()?;
        self.set_sync_word(sync_word)?;
        self.set_current_limit(current_limit)?;
        self.set_preamble_length(preamble_length)
    }

    fn config(&mut self) -> Result<(), Error> {
        self.write_register(HopPeriod { period: 0 })?;
        self.write_register(FifoTxBaseAddr { value: 0 })?;
        self.write_register(FifoRxBaseAddr { value: 0 })
    }
}
