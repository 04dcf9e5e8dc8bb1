#![cfg_attr(not(test), no_std)]
//! SX1278 LoRa Radio Driver
//!
//! This crate configures the LoRa modem of the Semtech SX1278 transceiver.
//! It validates modulation parameters, translates them into register
//! values and applies the silicon errata corrections that depend on them.
//!
//! # Features
//! - Frequency range: 137-525 MHz
//! - LoRa modulation: SF6-12, BW 7.8-500 kHz, CR 4/5-4/8
//! - Output power: -3 to +17 dBm, +20 dBm with the high power DAC
//! - Manual LNA gain or AGC
//! - Automatic low datarate optimisation
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`device`]: SPI backed register access
//!   - Typed and raw register reads and writes
//!   - Initialisation shared by the SX127x family
//!
//! - [`radio`]: The [`RadioCore`] trait the configurator is built on
//!
//! - [`sx1278`]: The [`Sx1278`] configurator and its cached [`RadioState`]
//!
//! - [`params`]: Accepted parameter values and their register encodings
//!
//! - [`errata`]: Frequency dependent errata corrections
//!
//! - [`registers`]: Register definitions for direct hardware access
//!   - [`registers::lora`]: LoRa modem registers and field values
//!
//! # Usage
//! Wrap an SPI device in a [`Device`], hand it to [`Sx1278::new`] and call
//! [`Sx1278::begin`] with a [`LoRaConfig`]. Individual parameters can be
//! changed afterwards through the setters.
//!
//! # Important Notes
//! - Setters put the radio in standby before touching any register
//! - A parameter is only cached once all of its register writes succeeded
//! - Set the bandwidth before the frequency, the errata corrections depend on it
//!
//! # Example
//! ```no_run
//! use embedded_hal::spi::SpiDevice;
//! use sx1278::{Device, Error, LoRaConfig, Sx1278};
//!
//! fn configure_radio<SPI: SpiDevice>(spi: SPI) -> Result<Sx1278<Device<SPI>>, Error> {
//!     let mut radio = Sx1278::new(Device::new(spi));
//!
//!     let config = LoRaConfig {
//!         frequency_mhz: 433.0,
//!         spreading_factor: 12,
//!         ..LoRaConfig::default()
//!     };
//!     radio.begin(&config)?.into_result()?;
//!
//!     radio.set_bandwidth(62.5)?;
//!     radio.set_frequency(433.0)?;
//!
//!     Ok(radio)
//! }
//! ```

#[macro_use]
mod fmt;

pub mod device;
pub mod errata;
pub mod error;
pub mod params;
pub mod radio;
pub mod registers;
pub mod sx1278;

pub use device::Device;
pub use error::{status_code, Error, CODE_NONE};
pub use params::*;
pub use radio::RadioCore;
pub use registers::{Mode, RegisterField};
pub use sx1278::*;
