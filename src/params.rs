//! LoRa modulation parameters
//!
//! Each parameter kind has a table of the values the SX1278 accepts and
//! the register bit pattern each one encodes to. Converting a raw user
//! value through these tables is the only validation the driver does, so
//! anything that reaches a register write has already been checked.

use crate::registers::lora::{
    PA_BOOST_OFF, PA_BOOST_ON, PA_MAX_POWER_HIGH, PA_MAX_POWER_LOW, PA_SELECT_BOOST,
    PA_SELECT_RFO,
};
use crate::Error;

/// LoRa signal bandwidth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bandwidth {
    /// 7.8 kHz
    Khz7_8,
    /// 10.4 kHz
    Khz10_4,
    /// 15.6 kHz
    Khz15_6,
    /// 20.8 kHz
    Khz20_8,
    /// 31.25 kHz
    Khz31_25,
    /// 41.7 kHz
    Khz41_7,
    /// 62.5 kHz
    Khz62_5,
    /// 125 kHz
    Khz125,
    /// 250 kHz
    Khz250,
    /// 500 kHz
    Khz500,
}

const BANDWIDTHS: [(f32, Bandwidth); 10] = [
    (7.8, Bandwidth::Khz7_8),
    (10.4, Bandwidth::Khz10_4),
    (15.6, Bandwidth::Khz15_6),
    (20.8, Bandwidth::Khz20_8),
    (31.25, Bandwidth::Khz31_25),
    (41.7, Bandwidth::Khz41_7),
    (62.5, Bandwidth::Khz62_5),
    (125.0, Bandwidth::Khz125),
    (250.0, Bandwidth::Khz250),
    (500.0, Bandwidth::Khz500),
];

impl Bandwidth {
    /// Every supported bandwidth, narrowest first.
    pub const ALL: [Bandwidth; 10] = [
        Self::Khz7_8,
        Self::Khz10_4,
        Self::Khz15_6,
        Self::Khz20_8,
        Self::Khz31_25,
        Self::Khz41_7,
        Self::Khz62_5,
        Self::Khz125,
        Self::Khz250,
        Self::Khz500,
    ];

    /// Looks up a bandwidth given in kHz. Only the exact table values are accepted.
    pub fn from_khz(khz: f32) -> Result<Self, Error> {
        BANDWIDTHS
            .iter()
            .find(|(value, _)| *value == khz)
            .map(|(_, bw)| *bw)
            .ok_or(Error::InvalidBandwidth)
    }

    /// Bandwidth in kHz.
    pub fn khz(self) -> f32 {
        BANDWIDTHS[self as usize].0
    }

    /// RegModemConfig1 bits [7:4].
    pub const fn bits(self) -> u8 {
        (self as u8) << 4
    }

    /// Bandwidths below 62.5 kHz, which need the IF offset compensation.
    pub const fn is_narrow(self) -> bool {
        (self as u8) < (Self::Khz62_5 as u8)
    }
}

impl Default for Bandwidth {
    fn default() -> Self {
        Self::Khz125
    }
}

/// LoRa spreading factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpreadingFactor {
    /// 64 chips per symbol, implicit header only
    Sf6 = 6,
    /// 128 chips per symbol
    Sf7 = 7,
    /// 256 chips per symbol
    Sf8 = 8,
    /// 512 chips per symbol
    Sf9 = 9,
    /// 1024 chips per symbol
    Sf10 = 10,
    /// 2048 chips per symbol
    Sf11 = 11,
    /// 4096 chips per symbol
    Sf12 = 12,
}

impl SpreadingFactor {
    /// Converts a raw spreading factor, `InvalidSpreadingFactor` outside 6..=12.
    pub fn from_u8(sf: u8) -> Result<Self, Error> {
        Ok(match sf {
            6 => Self::Sf6,
            7 => Self::Sf7,
            8 => Self::Sf8,
            9 => Self::Sf9,
            10 => Self::Sf10,
            11 => Self::Sf11,
            12 => Self::Sf12,
            _ => return Err(Error::InvalidSpreadingFactor),
        })
    }

    /// Raw spreading factor.
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Chips per symbol, 2^SF.
    pub const fn chips(self) -> u32 {
        1 << self as u32
    }

    /// RegModemConfig2 bits [7:4].
    pub const fn bits(self) -> u8 {
        (self as u8) << 4
    }
}

impl Default for SpreadingFactor {
    fn default() -> Self {
        Self::Sf7
    }
}

/// LoRa forward error correction coding rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodingRate {
    /// 4/5
    Cr4_5 = 5,
    /// 4/6
    Cr4_6 = 6,
    /// 4/7
    Cr4_7 = 7,
    /// 4/8
    Cr4_8 = 8,
}

impl CodingRate {
    /// Converts a coding rate denominator, `InvalidCodingRate` outside 5..=8.
    pub fn from_denominator(cr: u8) -> Result<Self, Error> {
        Ok(match cr {
            5 => Self::Cr4_5,
            6 => Self::Cr4_6,
            7 => Self::Cr4_7,
            8 => Self::Cr4_8,
            _ => return Err(Error::InvalidCodingRate),
        })
    }

    /// Coding rate denominator.
    pub const fn denominator(self) -> u8 {
        self as u8
    }

    /// RegModemConfig1 bits [3:1].
    pub const fn bits(self) -> u8 {
        (self as u8 - 4) << 1
    }
}

impl Default for CodingRate {
    fn default() -> Self {
        Self::Cr4_5
    }
}

/// Register settings for one output power level
///
/// The SX1278 reaches the power range through three amplifier setups:
/// RFO below 2 dBm, PA_BOOST from 2 to 17 dBm and PA_BOOST with the high
/// power DAC at 20 dBm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PaSetting {
    /// RegPaConfig bit 7
    pub select: u8,
    /// RegPaConfig bits [6:0], MaxPower | OutputPower
    pub config: u8,
    /// RegPaDac bits [2:0]
    pub dac: u8,
}

impl PaSetting {
    /// Lowest output power in dBm
    pub const MIN_DBM: i8 = -3;
    /// Highest output power without the high power DAC
    pub const MAX_BOOST_DBM: i8 = 17;
    /// Output power with the high power DAC
    pub const HIGH_POWER_DBM: i8 = 20;

    /// Amplifier setup for `power` dBm, `InvalidOutputPower` outside -3..=17 and 20.
    pub fn from_dbm(power: i8) -> Result<Self, Error> {
        match power {
            Self::MIN_DBM..=1 => Ok(Self {
                select: PA_SELECT_RFO,
                config: PA_MAX_POWER_LOW | (power - Self::MIN_DBM) as u8,
                dac: PA_BOOST_OFF,
            }),
            2..=Self::MAX_BOOST_DBM => Ok(Self {
                select: PA_SELECT_BOOST,
                config: PA_MAX_POWER_HIGH | (power - 2) as u8,
                dac: PA_BOOST_OFF,
            }),
            Self::HIGH_POWER_DBM => Ok(Self {
                select: PA_SELECT_BOOST,
                config: PA_MAX_POWER_HIGH | (power - 5) as u8,
                dac: PA_BOOST_ON,
            }),
            _ => Err(Error::InvalidOutputPower),
        }
    }

    /// OutputPower field, RegPaConfig bits [3:0].
    pub const fn output_power(&self) -> u8 {
        self.config & 0x0F
    }

    /// True if the PA_BOOST pin is used.
    pub const fn is_boost(&self) -> bool {
        self.select == PA_SELECT_BOOST
    }

    /// True if the +20 dBm DAC is enabled.
    pub const fn is_high_power(&self) -> bool {
        self.dac == PA_BOOST_ON
    }
}

/// Receiver LNA gain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// Gain controlled by the AGC loop
    Auto,
    /// Fixed gain, 1 (highest) to 6 (lowest)
    Manual(u8),
}

impl Gain {
    /// Converts a raw gain, 0 selects the AGC, `InvalidGain` above 6.
    pub fn from_u8(gain: u8) -> Result<Self, Error> {
        match gain {
            0 => Ok(Self::Auto),
            1..=6 => Ok(Self::Manual(gain)),
            _ => Err(Error::InvalidGain),
        }
    }
}

/// Symbol length from which low datarate optimisation is enabled
pub const LOW_DATA_RATE_SYMBOL_LENGTH: f32 = 0.016;

/// Symbol length as chips per symbol over the bandwidth in kHz, 2^SF / BW.
pub fn symbol_length(sf: SpreadingFactor, bw: Bandwidth) -> f32 {
    sf.chips() as f32 / bw.khz()
}

/// True when the symbol duration requires low datarate optimisation.
pub fn needs_low_data_rate_optimize(sf: SpreadingFactor, bw: Bandwidth) -> bool {
    symbol_length(sf, bw) >= LOW_DATA_RATE_SYMBOL_LENGTH
}
