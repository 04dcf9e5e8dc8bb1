//! LoRa modem registers
//!
//! These registers are configured one bit-field at a time through
//! [`RegisterField`](super::RegisterField) writes, so they are described as
//! addresses plus the in-position values of their fields rather than as
//! typed registers.
//!
//! Field values are given already shifted into place. A field written
//! with `msb = 7, lsb = 4` takes its value from bits [7:4] of the constant.

use bitflags::bitflags;

/// Power amplifier selection and output power (address: 0x09)
pub const REG_PA_CONFIG: u8 = 0x09;
/// LNA gain and boost (address: 0x0C)
pub const REG_LNA: u8 = 0x0C;
/// Bandwidth, coding rate and header mode (address: 0x1D)
pub const REG_MODEM_CONFIG_1: u8 = 0x1D;
/// Spreading factor, TX mode and RX CRC (address: 0x1E)
pub const REG_MODEM_CONFIG_2: u8 = 0x1E;
/// Low datarate optimisation and AGC (address: 0x26)
pub const REG_MODEM_CONFIG_3: u8 = 0x26;
/// LoRa detection optimisation, automatic IF in bit 7 (address: 0x31)
pub const REG_DETECT_OPTIMIZE: u8 = 0x31;
/// LoRa detection threshold (address: 0x37)
pub const REG_DETECTION_THRESHOLD: u8 = 0x37;
/// High power PA_BOOST DAC (address: 0x4D)
pub const REG_PA_DAC: u8 = 0x4D;

// Errata registers, see SX1276/77/78 errata note sections 2.1 and 2.3.
/// Receiver sensitivity trim for 500 kHz bandwidth (address: 0x36)
pub const REG_HIGH_BW_OPTIMIZE_1: u8 = 0x36;
/// Receiver sensitivity trim for 500 kHz bandwidth (address: 0x3A)
pub const REG_HIGH_BW_OPTIMIZE_2: u8 = 0x3A;
/// IF frequency, low byte of the spurious response fix (address: 0x2F)
pub const REG_IF_FREQ_2: u8 = 0x2F;
/// IF frequency, high byte of the spurious response fix (address: 0x30)
pub const REG_IF_FREQ_1: u8 = 0x30;

/// PaSelect = RFO pin, max 14 dBm
pub const PA_SELECT_RFO: u8 = 0b0000_0000;
/// PaSelect = PA_BOOST pin, max 20 dBm
pub const PA_SELECT_BOOST: u8 = 0b1000_0000;
/// MaxPower = 0b010, Pmax = 11.4 dBm
pub const PA_MAX_POWER_LOW: u8 = 0b0010_0000;
/// MaxPower = 0b111, Pmax = 15 dBm
pub const PA_MAX_POWER_HIGH: u8 = 0b0111_0000;
/// PaDac default, PA_BOOST limited to 17 dBm
pub const PA_BOOST_OFF: u8 = 0b0000_0100;
/// PaDac +20 dBm on PA_BOOST
pub const PA_BOOST_ON: u8 = 0b0000_0111;

/// LnaBoostHf = 150% LNA current
pub const LNA_BOOST_ON: u8 = 0b0000_0011;

/// ImplicitHeaderModeOn cleared
pub const HEADER_EXPLICIT: u8 = 0b0000_0000;
/// ImplicitHeaderModeOn set, required for SF6
pub const HEADER_IMPLICIT: u8 = 0b0000_0001;

/// TxContinuousMode cleared
pub const TX_MODE_SINGLE: u8 = 0b0000_0000;
/// RxPayloadCrcOn cleared
pub const RX_CRC_OFF: u8 = 0b0000_0000;

/// DetectionOptimize for SF6
pub const DETECT_OPTIMIZE_SF6: u8 = 0b0000_0101;
/// DetectionOptimize for SF7 to SF12
pub const DETECT_OPTIMIZE_SF7_12: u8 = 0b0000_0011;
/// DetectionThreshold for SF6
pub const DETECTION_THRESHOLD_SF6: u8 = 0x0C;
/// DetectionThreshold for SF7 to SF12
pub const DETECTION_THRESHOLD_SF7_12: u8 = 0x0A;

/// Automatic IF bit of RegDetectOptimize
pub const AUTOMATIC_IF_ON: u8 = 0b1000_0000;
/// Automatic IF off, used with the spurious response fix
pub const AUTOMATIC_IF_OFF: u8 = 0b0000_0000;

bitflags! {
    /// RegModemConfig3 flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModemConfig3: u8 {
        /// Mandated when the symbol length exceeds 16 ms
        const LOW_DATA_RATE_OPTIMIZE = 1 << 3;
        /// LNA gain set by the internal AGC loop instead of RegLna
        const AGC_AUTO_ON = 1 << 2;
    }
}
