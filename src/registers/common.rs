//! Registers shared by the whole SX127x family
//!
//! This module contains the registers the common core touches during
//! initialisation:
//! - Operating mode and modem selection
//! - RF carrier frequency
//! - Over-current protection
//! - LoRa sync word and preamble length
//! - FIFO base addresses and frequency hopping
//! - Silicon version
//!
//! Multi-byte registers are accessed with SPI burst transfers, the address
//! auto-increments after each byte.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// RegOpMode address, for bit-field writes
pub const REG_OP_MODE: u8 = 0x01;

/// Operating modes selectable through RegOpMode bits [2:0]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Lowest power, only mode in which LongRangeMode can change
    Sleep = 0b000,
    /// Oscillator and baseband running, safe for configuration
    Standby = 0b001,
    /// Frequency synthesis for TX
    FsTx = 0b010,
    /// Transmit
    Tx = 0b011,
    /// Frequency synthesis for RX
    FsRx = 0b100,
    /// Continuous receive
    RxContinuous = 0b101,
    /// Single packet receive
    RxSingle = 0b110,
    /// Channel activity detection
    Cad = 0b111,
}

impl Mode {
    /// Decodes the three mode bits of RegOpMode.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Self::Sleep,
            0b001 => Self::Standby,
            0b010 => Self::FsTx,
            0b011 => Self::Tx,
            0b100 => Self::FsRx,
            0b101 => Self::RxContinuous,
            0b110 => Self::RxSingle,
            _ => Self::Cad,
        }
    }
}

/// Operating mode register (address: 0x01)
///
/// # Important Notes
/// - LongRangeMode can only be modified in Sleep mode
/// - The SX1278 covers the low frequency band, LowFrequencyModeOn is set at reset
#[register(0x01u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct OpMode {
    /// LoRa modem selected (bit 7), FSK/OOK otherwise
    pub long_range: bool,
    /// Low frequency register bank (bit 3)
    pub low_frequency: bool,
    /// Transceiver mode (bits [2:0])
    pub mode: Mode,
}

impl Default for OpMode {
    fn default() -> Self {
        Self {
            long_range: false,
            low_frequency: true,
            mode: Mode::Standby,
        }
    }
}

/// RF carrier frequency register (address: 0x06, 3 bytes)
///
/// Frf = F(rf) * 2^19 / F(xosc), with F(xosc) = 32 MHz.
/// The frequency change takes effect when the LSB is written.
#[register(0x06u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct Frf {
    /// 24-bit frequency word
    pub value: u32,
}

/// Crystal oscillator frequency in Hz
pub const XOSC_HZ: f32 = 32_000_000.0;

impl Frf {
    /// Computes the frequency word for a carrier frequency in MHz.
    pub fn from_mhz(freq_mhz: f32) -> Self {
        let step = XOSC_HZ / (1u32 << 19) as f32;
        let value = (freq_mhz * 1_000_000.0 / step) as u32;
        Self {
            value: value & 0x00FF_FFFF,
        }
    }

    /// Carrier frequency in MHz represented by this frequency word.
    pub fn as_mhz(self) -> f32 {
        let step = XOSC_HZ / (1u32 << 19) as f32;
        self.value as f32 * step / 1_000_000.0
    }
}

/// Over-current protection register (address: 0x0B)
///
/// Imax = 45 + 5 * trim mA for trim <= 15
/// Imax = -30 + 10 * trim mA for 15 < trim <= 27
#[register(0x0Bu8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct Ocp {
    /// OCP enabled (bit 5)
    pub enabled: bool,
    /// Current trim (bits [4:0])
    pub trim: u8,
}

impl Default for Ocp {
    fn default() -> Self {
        Self {
            enabled: true,
            trim: 0x0B,
        }
    }
}

impl Ocp {
    /// Lowest configurable limit in mA
    pub const MIN_MA: u8 = 45;
    /// Highest configurable limit in mA
    pub const MAX_MA: u8 = 240;

    /// Builds the OCP setting for a current limit in mA, `None` when out of range.
    pub fn from_milliamps(limit: u8) -> Option<Self> {
        let trim = match limit {
            Self::MIN_MA..=120 => (limit - Self::MIN_MA) / 5,
            121..=Self::MAX_MA => ((limit as u16 + 30) / 10) as u8,
            _ => return None,
        };
        Some(Self {
            enabled: true,
            trim,
        })
    }
}

/// FIFO TX base address register (address: 0x0E)
#[register(0x0Eu8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister, Default)]
pub struct FifoTxBaseAddr {
    /// Write base address in the FIFO data buffer
    pub value: u8,
}

/// FIFO RX base address register (address: 0x0F)
#[register(0x0Fu8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister, Default)]
pub struct FifoRxBaseAddr {
    /// Read base address in the FIFO data buffer
    pub value: u8,
}

/// LoRa preamble length register (address: 0x20, 2 bytes)
///
/// The transmitted preamble is `length + 4.25` symbols.
#[register(0x20u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct PreambleLength {
    /// Preamble length in symbols
    pub length: u16,
}

impl Default for PreambleLength {
    fn default() -> Self {
        Self { length: 8 }
    }
}

/// Frequency hopping period register (address: 0x24)
#[register(0x24u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister, Default)]
pub struct HopPeriod {
    /// Symbol periods between hops, 0 disables hopping
    pub period: u8,
}

/// LoRa sync word register (address: 0x39)
///
/// 0x34 is reserved for LoRaWAN networks.
#[register(0x39u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct SyncWord {
    /// Sync word value
    pub value: u8,
}

impl Default for SyncWord {
    fn default() -> Self {
        Self { value: 0x12 }
    }
}

/// Silicon version register (address: 0x42)
#[register(0x42u8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct Version {
    /// Full revision number in bits [7:4], metal mask revision in bits [3:0]
    pub value: u8,
}

impl FromByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            long_range: bytes[0] & 0x80 != 0,
            low_frequency: bytes[0] & 0x08 != 0,
            mode: Mode::from_bits(bytes[0]),
        })
    }
}

impl ToByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let mut value = self.mode as u8;
        if self.long_range {
            value |= 0x80;
        }
        if self.low_frequency {
            value |= 0x08;
        }
        Ok([value])
    }
}

impl FromByteArray for Frf {
    type Error = Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            value: u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
        })
    }
}

impl ToByteArray for Frf {
    type Error = Infallible;
    type Array = [u8; 3];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let [_, msb, mid, lsb] = self.value.to_be_bytes();
        Ok([msb, mid, lsb])
    }
}

impl FromByteArray for Ocp {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            enabled: bytes[0] & 0x20 != 0,
            trim: bytes[0] & 0x1F,
        })
    }
}

impl ToByteArray for Ocp {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.enabled as u8) << 5 | (self.trim & 0x1F)])
    }
}

impl FromByteArray for FifoTxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for FifoTxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}

impl FromByteArray for FifoRxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for FifoRxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}

impl FromByteArray for PreambleLength {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            length: u16::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for PreambleLength {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.length.to_be_bytes())
    }
}

impl FromByteArray for HopPeriod {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { period: bytes[0] })
    }
}

impl ToByteArray for HopPeriod {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.period])
    }
}

impl FromByteArray for SyncWord {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

impl ToByteArray for SyncWord {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}

impl FromByteArray for Version {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}
