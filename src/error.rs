//! Driver error type
//!
//! Every fallible operation in the crate returns [`Error`]. Parameter
//! validation errors are raised before the radio is touched; transport
//! errors come from the register access layer.
//!
//! Each error also carries a stable numeric [`code`](Error::code). The
//! codes are negative, so OR-ing the codes of several operations yields a
//! non-zero value as soon as one of them failed. [`ConfigReport`] uses this
//! to offer a single combined status next to the per-stage results.
//!
//! [`ConfigReport`]: crate::ConfigReport

use regiface::errors::Error as RegifaceError;

/// Numeric code for success, used by the combined status view
pub const CODE_NONE: i16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// SPI transaction failed
    Bus,
    /// Register contents could not be decoded
    Deserialization,
    /// RegVersion did not hold the expected chip version
    ChipNotFound(u8),
    /// A field write did not read back as written
    SpiWriteFailed {
        /// Address of the register that failed verification
        address: u8,
    },
    /// Bit range outside 0..=7 or `lsb > msb`
    InvalidBitRange,
    /// Frequency outside 137.0..=525.0 MHz
    InvalidFrequency,
    /// Bandwidth not one of the LoRa bandwidths supported by the chip
    InvalidBandwidth,
    /// Spreading factor outside 6..=12
    InvalidSpreadingFactor,
    /// Coding rate denominator outside 5..=8
    InvalidCodingRate,
    /// Output power outside -3..=17 dBm and not 20 dBm
    InvalidOutputPower,
    /// Over-current protection limit outside 45..=240 mA
    InvalidCurrentLimit,
    /// Preamble shorter than 6 symbols
    InvalidPreambleLength,
    /// LNA gain above 6
    InvalidGain,
}

impl Error {
    /// Numeric status code of this error.
    pub const fn code(self) -> i16 {
        match self {
            Self::ChipNotFound(_) => -2,
            Self::InvalidBandwidth => -8,
            Self::InvalidSpreadingFactor => -9,
            Self::InvalidCodingRate => -10,
            Self::InvalidBitRange => -11,
            Self::InvalidFrequency => -12,
            Self::InvalidOutputPower => -13,
            Self::SpiWriteFailed { .. } => -16,
            Self::InvalidCurrentLimit => -17,
            Self::InvalidPreambleLength => -18,
            Self::InvalidGain => -19,
            Self::Bus => -20,
            Self::Deserialization => -21,
        }
    }
}

impl From<RegifaceError> for Error {
    fn from(err: RegifaceError) -> Self {
        match err {
            RegifaceError::DeserializationError => Self::Deserialization,
            _ => Self::Bus,
        }
    }
}

/// Numeric code of a result, `CODE_NONE` on success.
pub fn status_code(result: Result<(), Error>) -> i16 {
    match result {
        Ok(()) => CODE_NONE,
        Err(err) => err.code(),
    }
}

/// Folds the outcome of one write into the outcome of a write sequence.
///
/// Writes in a sequence are all attempted; the sequence reports the first
/// failure it saw.
pub(crate) fn merge(acc: Result<(), Error>, next: Result<(), Error>) -> Result<(), Error> {
    match (acc, next) {
        (Err(first), _) => Err(first),
        (Ok(()), next) => next,
    }
}
