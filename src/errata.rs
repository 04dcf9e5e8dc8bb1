//! SX1276/77/78 silicon errata workarounds
//!
//! Two corrections depend on the configured bandwidth and have to be
//! applied every time the carrier frequency is set:
//!
//! - Section 2.1, sensitivity optimisation with a 500 kHz bandwidth:
//!   two trim registers take band specific values.
//! - Section 2.3, receiver spurious response: the automatic IF is turned
//!   off for every bandwidth below 500 kHz and the IF frequency registers
//!   are programmed by hand. Below 62.5 kHz the carrier is also raised by
//!   the bandwidth value, added as is to the frequency in MHz.
//!
//! The corrections are computed here as plain register writes so the
//! configurator only has to issue them.

use crate::registers::lora::{
    AUTOMATIC_IF_OFF, AUTOMATIC_IF_ON, REG_DETECT_OPTIMIZE, REG_HIGH_BW_OPTIMIZE_1,
    REG_HIGH_BW_OPTIMIZE_2, REG_IF_FREQ_1, REG_IF_FREQ_2,
};
use crate::registers::RegisterField;
use crate::Bandwidth;

/// Band limits in MHz and the (0x36, 0x3A) values for 500 kHz sensitivity.
const HIGH_BW_TRIMS: [(f32, f32, u8, u8); 2] = [
    (862.0, 1020.0, 0x02, 0x64),
    (410.0, 525.0, 0x03, 0x65),
];

/// Register writes and frequency offset that go with one carrier frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrequencyCorrection {
    /// Full register writes for the 500 kHz sensitivity optimisation
    pub sensitivity: Option<[(u8, u8); 2]>,
    /// Automatic IF bit of RegDetectOptimize
    pub automatic_if: RegisterField,
    /// IF frequency writes of the spurious response fix
    pub if_frequency: Option<[RegisterField; 2]>,
    /// Offset to add to the carrier before synthesis, in MHz
    pub offset_mhz: f32,
}

impl FrequencyCorrection {
    /// Corrections for a carrier of `freq_mhz` with bandwidth `bw` configured.
    pub fn new(bw: Bandwidth, freq_mhz: f32) -> Self {
        let sensitivity = match bw {
            Bandwidth::Khz500 => HIGH_BW_TRIMS
                .iter()
                .find(|(low, high, _, _)| freq_mhz >= *low && freq_mhz <= *high)
                .map(|(_, _, trim_1, trim_2)| {
                    [(REG_HIGH_BW_OPTIMIZE_1, *trim_1), (REG_HIGH_BW_OPTIMIZE_2, *trim_2)]
                }),
            _ => None,
        };

        let if_freq_2 = match bw {
            Bandwidth::Khz7_8 => Some(0x48),
            Bandwidth::Khz10_4
            | Bandwidth::Khz15_6
            | Bandwidth::Khz20_8
            | Bandwidth::Khz31_25
            | Bandwidth::Khz41_7 => Some(0x44),
            Bandwidth::Khz62_5 | Bandwidth::Khz125 | Bandwidth::Khz250 => Some(0x40),
            Bandwidth::Khz500 => None,
        };

        let automatic_if = match if_freq_2 {
            Some(_) => RegisterField::new(REG_DETECT_OPTIMIZE, AUTOMATIC_IF_OFF, 7, 7),
            None => RegisterField::new(REG_DETECT_OPTIMIZE, AUTOMATIC_IF_ON, 7, 7),
        };

        let if_frequency = if_freq_2.map(|value| {
            [
                RegisterField::full(REG_IF_FREQ_2, value),
                RegisterField::full(REG_IF_FREQ_1, 0x00),
            ]
        });

        let offset_mhz = if bw.is_narrow() { bw.khz() } else { 0.0 };

        Self {
            sensitivity,
            automatic_if,
            if_frequency,
            offset_mhz,
        }
    }
}
