//! SX1278 LoRa parameter configuration
//!
//! [`Sx1278`] translates LoRa parameters into SX1278 register settings on
//! top of a [`RadioCore`]. Every setter follows the same pattern:
//!
//! 1. Validate the raw value against the SX1278 tables in [`params`](crate::params).
//!    Invalid values return immediately, the radio is not touched.
//! 2. Put the radio in standby and issue the register writes. All writes
//!    are attempted even if one fails; the first failure is returned.
//! 3. Commit the new value to the cached [`RadioState`] only if every
//!    write succeeded.
//!
//! # Important Notes
//! - The errata corrections applied by [`Sx1278::set_frequency`] depend on
//!   the cached bandwidth. Set the bandwidth first, then the frequency.
//! - Low datarate optimisation is derived from spreading factor and
//!   bandwidth and is updated whenever either of them changes.

use crate::errata::FrequencyCorrection;
use crate::error::{merge, status_code, CODE_NONE};
use crate::params::{needs_low_data_rate_optimize, Gain, PaSetting};
use crate::radio::RadioCore;
use crate::registers::lora::{
    ModemConfig3, DETECTION_THRESHOLD_SF6, DETECTION_THRESHOLD_SF7_12, DETECT_OPTIMIZE_SF6,
    DETECT_OPTIMIZE_SF7_12, HEADER_EXPLICIT, HEADER_IMPLICIT, LNA_BOOST_ON, REG_DETECTION_THRESHOLD,
    REG_DETECT_OPTIMIZE, REG_LNA, REG_MODEM_CONFIG_1, REG_MODEM_CONFIG_2, REG_MODEM_CONFIG_3,
    REG_PA_CONFIG, REG_PA_DAC, RX_CRC_OFF, TX_MODE_SINGLE,
};
use crate::registers::RegisterField;
use crate::{Bandwidth, CodingRate, Error, SpreadingFactor};

/// RegVersion value of the SX1278
pub const CHIP_VERSION: u8 = 0x12;

/// Lowest carrier frequency in MHz
pub const MIN_FREQUENCY_MHZ: f32 = 137.0;
/// Highest carrier frequency in MHz
pub const MAX_FREQUENCY_MHZ: f32 = 525.0;

/// Modulation settings last written to the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioState {
    /// Signal bandwidth
    pub bandwidth: Bandwidth,
    /// Spreading factor
    pub spreading_factor: SpreadingFactor,
    /// Coding rate
    pub coding_rate: CodingRate,
}

/// Settings applied by [`Sx1278::begin`]
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoRaConfig {
    /// Carrier frequency in MHz, 137.0 to 525.0
    pub frequency_mhz: f32,
    /// Bandwidth in kHz, one of 7.8, 10.4, 15.6, 20.8, 31.25, 41.7, 62.5, 125, 250, 500
    pub bandwidth_khz: f32,
    /// Spreading factor, 6 to 12
    pub spreading_factor: u8,
    /// Coding rate denominator, 5 to 8 for 4/5 to 4/8
    pub coding_rate: u8,
    /// LoRa sync word
    pub sync_word: u8,
    /// Output power in dBm, -3 to 17 or 20
    pub power_dbm: i8,
    /// Over-current protection limit in mA, 45 to 240
    pub current_limit_ma: u8,
    /// Preamble length in symbols, at least 6
    pub preamble_length: u16,
    /// LNA gain, 0 for AGC or 1 (highest) to 6 (lowest)
    pub gain: u8,
}

impl Default for LoRaConfig {
    fn default() -> Self {
        Self {
            frequency_mhz: 434.0,
            bandwidth_khz: 125.0,
            spreading_factor: 9,
            coding_rate: 7,
            sync_word: 0x12,
            power_dbm: 17,
            current_limit_ma: 100,
            preamble_length: 8,
            gain: 0,
        }
    }
}

/// Configuration stages run by [`Sx1278::begin`], in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    Frequency,
    Bandwidth,
    SpreadingFactor,
    CodingRate,
    OutputPower,
    Gain,
}

/// Outcome of each configuration stage of [`Sx1278::begin`]
///
/// A failed stage does not stop the following ones, so several stages can
/// fail independently.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigReport {
    pub frequency: Result<(), Error>,
    pub bandwidth: Result<(), Error>,
    pub spreading_factor: Result<(), Error>,
    pub coding_rate: Result<(), Error>,
    pub output_power: Result<(), Error>,
    pub gain: Result<(), Error>,
}

impl ConfigReport {
    /// Stage results in execution order.
    pub fn stages(&self) -> [(Stage, Result<(), Error>); 6] {
        [
            (Stage::Frequency, self.frequency),
            (Stage::Bandwidth, self.bandwidth),
            (Stage::SpreadingFactor, self.spreading_factor),
            (Stage::CodingRate, self.coding_rate),
            (Stage::OutputPower, self.output_power),
            (Stage::Gain, self.gain),
        ]
    }

    /// True if every stage succeeded.
    pub fn is_ok(&self) -> bool {
        self.first_error().is_none()
    }

    /// First failed stage and its error.
    pub fn first_error(&self) -> Option<(Stage, Error)> {
        self.stages()
            .into_iter()
            .find_map(|(stage, result)| result.err().map(|err| (stage, err)))
    }

    /// Bitwise OR of the numeric codes of all stages, `CODE_NONE` if all succeeded.
    pub fn combined_code(&self) -> i16 {
        self.stages()
            .into_iter()
            .fold(CODE_NONE, |code, (_, result)| code | status_code(result))
    }

    /// Collapses the report into the first error, if any.
    pub fn into_result(self) -> Result<(), Error> {
        match self.first_error() {
            Some((_, err)) => Err(err),
            None => Ok(()),
        }
    }
}

/// SX1278 LoRa configurator.
///
/// Owns the radio core it configures and caches the modulation settings
/// that later register values are derived from.
pub struct Sx1278<C> {
    core: C,
    state: RadioState,
}

impl<C> Sx1278<C> {
    /// Wraps a radio core. The cached state starts at the chip reset values.
    pub fn new(core: C) -> Self {
        Self {
            core,
            state: RadioState::default(),
        }
    }

    /// Releases the radio core.
    pub fn release(self) -> C {
        self.core
    }

    /// Shared access to the radio core.
    pub fn core(&self) -> &C {
        &self.core
    }

    /// Exclusive access to the radio core.
    ///
    /// Register writes made through it are not reflected in the cached state.
    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    /// Cached modulation settings.
    pub fn state(&self) -> RadioState {
        self.state
    }

    /// Cached bandwidth in kHz.
    pub fn bandwidth(&self) -> f32 {
        self.state.bandwidth.khz()
    }

    /// Cached spreading factor.
    pub fn spreading_factor(&self) -> u8 {
        self.state.spreading_factor.value()
    }

    /// Cached coding rate denominator.
    pub fn coding_rate(&self) -> u8 {
        self.state.coding_rate.denominator()
    }
}

impl<C> Sx1278<C>
where
    C: RadioCore,
{
    /// Initialises the radio and applies `config`.
    ///
    /// Runs the common core initialisation and register configuration, then
    /// frequency, bandwidth, spreading factor, coding rate, output power and
    /// gain. Those six stages all run even if some fail; their outcomes are
    /// returned in the [`ConfigReport`].
    ///
    /// # Errors
    /// Returns an error without configuring anything if the core could not be
    /// initialised, e.g. `Error::ChipNotFound`.
    pub fn begin(&mut self, config: &LoRaConfig) -> Result<ConfigReport, Error> {
        self.core.begin(
            CHIP_VERSION,
            config.sync_word,
            config.current_limit_ma,
            config.preamble_length,
        )?;
        self.config()?;

        let report = ConfigReport {
            frequency: self.set_frequency(config.frequency_mhz),
            bandwidth: self.set_bandwidth(config.bandwidth_khz),
            spreading_factor: self.set_spreading_factor(config.spreading_factor),
            coding_rate: self.set_coding_rate(config.coding_rate),
            output_power: self.set_output_power(config.power_dbm),
            gain: self.set_gain(config.gain),
        };

        for (stage, result) in report.stages() {
            if let Err(err) = result {
                warn!("{} failed: {}", stage, err);
            }
        }
        Ok(report)
    }

    /// Sets the carrier frequency in MHz.
    ///
    /// Applies the errata corrections for the cached bandwidth before the
    /// frequency is synthesised. Below 62.5 kHz the synthesised frequency is
    /// raised by the bandwidth.
    ///
    /// # Errors
    /// * `Error::InvalidFrequency` - Frequency outside 137.0..=525.0 MHz
    pub fn set_frequency(&mut self, freq_mhz: f32) -> Result<(), Error> {
        if !(MIN_FREQUENCY_MHZ..=MAX_FREQUENCY_MHZ).contains(&freq_mhz) {
            debug!("rejected frequency {=f32} MHz", freq_mhz);
            return Err(Error::InvalidFrequency);
        }

        let correction = FrequencyCorrection::new(self.state.bandwidth, freq_mhz);

        let mut result = Ok(());
        if let Some(trims) = correction.sensitivity {
            for (address, value) in trims {
                result = merge(result, self.core.write_reg(address, value));
            }
        }
        result = merge(result, self.core.set_reg_field(correction.automatic_if));
        if let Some(fields) = correction.if_frequency {
            result = merge(result, self.write_fields(&fields));
        }
        result?;

        if correction.offset_mhz != 0.0 {
            debug!(
                "IF offset compensation, {=f32} MHz moved by {=f32} MHz",
                freq_mhz, correction.offset_mhz
            );
        }
        self.core.set_frequency_raw(freq_mhz + correction.offset_mhz)
    }

    /// Sets the bandwidth in kHz.
    ///
    /// # Errors
    /// * `Error::InvalidBandwidth` - Not one of the supported bandwidths
    pub fn set_bandwidth(&mut self, bw_khz: f32) -> Result<(), Error> {
        let bandwidth = Bandwidth::from_khz(bw_khz).inspect_err(|_| {
            debug!("rejected bandwidth {=f32} kHz", bw_khz);
        })?;

        let next = RadioState {
            bandwidth,
            ..self.state
        };
        let result = merge(
            self.core.standby(),
            self.core
                .set_reg_field(RegisterField::new(REG_MODEM_CONFIG_1, bandwidth.bits(), 7, 4)),
        );
        self.commit(next, result)
    }

    /// Sets the spreading factor.
    ///
    /// SF6 switches the modem to implicit header mode, SF7 to SF12 to explicit
    /// header mode. Detection settings follow the spreading factor.
    ///
    /// # Errors
    /// * `Error::InvalidSpreadingFactor` - Spreading factor outside 6..=12
    pub fn set_spreading_factor(&mut self, sf: u8) -> Result<(), Error> {
        let spreading_factor = SpreadingFactor::from_u8(sf).inspect_err(|_| {
            debug!("rejected spreading factor {=u8}", sf);
        })?;

        let (header, detect_optimize, detection_threshold) = match spreading_factor {
            SpreadingFactor::Sf6 => (HEADER_IMPLICIT, DETECT_OPTIMIZE_SF6, DETECTION_THRESHOLD_SF6),
            _ => (
                HEADER_EXPLICIT,
                DETECT_OPTIMIZE_SF7_12,
                DETECTION_THRESHOLD_SF7_12,
            ),
        };

        let next = RadioState {
            spreading_factor,
            ..self.state
        };
        let result = merge(
            self.core.standby(),
            self.write_fields(&[
                RegisterField::new(REG_MODEM_CONFIG_1, header, 0, 0),
                RegisterField::new(
                    REG_MODEM_CONFIG_2,
                    spreading_factor.bits() | TX_MODE_SINGLE | RX_CRC_OFF,
                    7,
                    2,
                ),
                RegisterField::new(REG_DETECT_OPTIMIZE, detect_optimize, 2, 0),
                RegisterField::full(REG_DETECTION_THRESHOLD, detection_threshold),
            ]),
        );
        self.commit(next, result)
    }

    /// Sets the coding rate from its denominator, 5 to 8 for 4/5 to 4/8.
    ///
    /// # Errors
    /// * `Error::InvalidCodingRate` - Denominator outside 5..=8
    pub fn set_coding_rate(&mut self, cr: u8) -> Result<(), Error> {
        let coding_rate = CodingRate::from_denominator(cr).inspect_err(|_| {
            debug!("rejected coding rate 4/{=u8}", cr);
        })?;

        let next = RadioState {
            coding_rate,
            ..self.state
        };
        let result = merge(
            self.core.standby(),
            self.core
                .set_reg_field(RegisterField::new(REG_MODEM_CONFIG_1, coding_rate.bits(), 3, 1)),
        );
        if result.is_ok() {
            self.state = next;
        }
        result
    }

    /// Sets the output power in dBm.
    ///
    /// - -3 to 1 dBm: RFO pin
    /// - 2 to 17 dBm: PA_BOOST pin
    /// - 20 dBm: PA_BOOST pin with the high power DAC
    ///
    /// # Errors
    /// * `Error::InvalidOutputPower` - Power outside -3..=17 dBm and not 20 dBm
    pub fn set_output_power(&mut self, power_dbm: i8) -> Result<(), Error> {
        let pa = PaSetting::from_dbm(power_dbm).inspect_err(|_| {
            debug!("rejected output power {=i8} dBm", power_dbm);
        })?;

        merge(
            self.core.standby(),
            self.write_fields(&[
                RegisterField::new(REG_PA_CONFIG, pa.select, 7, 7),
                RegisterField::new(REG_PA_CONFIG, pa.config, 6, 0),
                RegisterField::new(REG_PA_DAC, pa.dac, 2, 0),
            ]),
        )
    }

    /// Sets the LNA gain: 0 hands control to the AGC, 1 (highest) to 6
    /// (lowest) fixes the gain with the LNA boost on.
    ///
    /// # Errors
    /// * `Error::InvalidGain` - Gain above 6
    pub fn set_gain(&mut self, gain: u8) -> Result<(), Error> {
        let gain = Gain::from_u8(gain).inspect_err(|_| {
            debug!("rejected gain {=u8}", gain);
        })?;

        let result = self.core.standby();
        match gain {
            Gain::Auto => merge(
                result,
                self.core.set_reg_field(RegisterField::new(
                    REG_MODEM_CONFIG_3,
                    ModemConfig3::AGC_AUTO_ON.bits(),
                    2,
                    2,
                )),
            ),
            Gain::Manual(level) => merge(
                result,
                self.write_fields(&[
                    RegisterField::new(REG_MODEM_CONFIG_3, ModemConfig3::empty().bits(), 2, 2),
                    RegisterField::full(REG_LNA, (level << 5) | LNA_BOOST_ON),
                ]),
            ),
        }
    }

    /// Common register configuration followed by the settings without a
    /// public setter.
    fn config(&mut self) -> Result<(), Error> {
        self.core.config()?;
        self.update_low_data_rate_optimize()
    }

    /// Enables low datarate optimisation when 2^SF over the bandwidth in kHz
    /// reaches `LOW_DATA_RATE_SYMBOL_LENGTH`.
    fn update_low_data_rate_optimize(&mut self) -> Result<(), Error> {
        let RadioState {
            bandwidth,
            spreading_factor,
            ..
        } = self.state;
        let flags = if needs_low_data_rate_optimize(spreading_factor, bandwidth) {
            ModemConfig3::LOW_DATA_RATE_OPTIMIZE
        } else {
            ModemConfig3::empty()
        };
        trace!("low datarate optimize {}", !flags.is_empty());
        self.core
            .set_reg_field(RegisterField::new(REG_MODEM_CONFIG_3, flags.bits(), 3, 3))
    }

    /// Commits a new spreading factor or bandwidth once its writes succeeded
    /// and refreshes the settings derived from them.
    fn commit(&mut self, next: RadioState, result: Result<(), Error>) -> Result<(), Error> {
        result?;
        self.state = next;
        self.update_low_data_rate_optimize()
    }

    /// Writes every field, returning the first failure.
    fn write_fields(&mut self, fields: &[RegisterField]) -> Result<(), Error> {
        fields.iter().fold(Ok(()), |result, field| {
            merge(result, self.core.set_reg_field(*field))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory radio core recording every register write.
    struct MockCore {
        regs: [u8; 0x80],
        writes: Vec<(u8, u8)>,
        frequencies: Vec<f32>,
        standby_count: usize,
        fail_address: Option<u8>,
        fail_begin: bool,
        begun_with: Option<(u8, u8, u8, u16)>,
        configured: bool,
    }

    impl MockCore {
        fn new() -> Self {
            Self {
                regs: [0; 0x80],
                writes: Vec::new(),
                frequencies: Vec::new(),
                standby_count: 0,
                fail_address: None,
                fail_begin: false,
                begun_with: None,
                configured: false,
            }
        }

        fn failing_at(address: u8) -> Self {
            Self {
                fail_address: Some(address),
                ..Self::new()
            }
        }

        fn reg(&self, address: u8) -> u8 {
            self.regs[address as usize]
        }

        fn bit(&self, address: u8, bit: u8) -> bool {
            self.reg(address) & (1 << bit) != 0
        }

        fn wrote(&self, address: u8) -> bool {
            self.writes.iter().any(|(a, _)| *a == address)
        }
    }

    impl RadioCore for MockCore {
        fn read_reg(&mut self, address: u8) -> Result<u8, Error> {
            Ok(self.reg(address))
        }

        fn write_reg(&mut self, address: u8, value: u8) -> Result<(), Error> {
            if self.fail_address == Some(address) {
                return Err(Error::Bus);
            }
            self.writes.push((address, value));
            self.regs[address as usize] = value;
            Ok(())
        }

        fn standby(&mut self) -> Result<(), Error> {
            self.standby_count += 1;
            Ok(())
        }

        fn set_frequency_raw(&mut self, freq_mhz: f32) -> Result<(), Error> {
            self.frequencies.push(freq_mhz);
            Ok(())
        }

        fn begin(
            &mut self,
            chip_version: u8,
            sync_word: u8,
            current_limit: u8,
            preamble_length: u16,
        ) -> Result<(), Error> {
            if self.fail_begin {
                return Err(Error::ChipNotFound(0x00));
            }
            self.begun_with = Some((chip_version, sync_word, current_limit, preamble_length));
            Ok(())
        }

        fn config(&mut self) -> Result<(), Error> {
            self.configured = true;
            Ok(())
        }
    }

    const BANDWIDTHS_KHZ: [f32; 10] = [
        7.8, 10.4, 15.6, 20.8, 31.25, 41.7, 62.5, 125.0, 250.0, 500.0,
    ];

    #[test]
    fn starts_from_reset_values() {
        let radio = Sx1278::new(MockCore::new());
        assert_eq!(radio.bandwidth(), 125.0);
        assert_eq!(radio.spreading_factor(), 7);
        assert_eq!(radio.coding_rate(), 5);
    }

    #[test]
    fn every_legal_bandwidth_is_written_and_cached() {
        let mut radio = Sx1278::new(MockCore::new());
        for (code, bw) in BANDWIDTHS_KHZ.into_iter().enumerate() {
            assert_eq!(radio.set_bandwidth(bw), Ok(()));
            assert_eq!(radio.bandwidth(), bw);
            assert_eq!(radio.core().reg(0x1D) >> 4, code as u8);
        }
    }

    #[test]
    fn illegal_bandwidth_touches_nothing() {
        let mut radio = Sx1278::new(MockCore::new());
        assert_eq!(radio.set_bandwidth(250.0), Ok(()));
        let writes = radio.core().writes.len();

        for bw in [0.0, 7.0, 100.0, 125.5, 1000.0] {
            assert_eq!(radio.set_bandwidth(bw), Err(Error::InvalidBandwidth));
        }
        assert_eq!(radio.bandwidth(), 250.0);
        assert_eq!(radio.core().writes.len(), writes);
        assert_eq!(radio.core().standby_count, 1);
    }

    #[test]
    fn failed_bandwidth_write_keeps_cached_value() {
        let mut radio = Sx1278::new(MockCore::failing_at(0x1D));
        assert_eq!(radio.set_bandwidth(500.0), Err(Error::Bus));
        assert_eq!(radio.bandwidth(), 125.0);
    }

    #[test]
    fn bandwidth_write_keeps_coding_rate_and_header_bits() {
        let mut core = MockCore::new();
        core.regs[0x1D] = 0x73;
        let mut radio = Sx1278::new(core);

        assert_eq!(radio.set_bandwidth(41.7), Ok(()));
        assert_eq!(radio.core().reg(0x1D), 0x53);
    }

    #[test]
    fn sf6_uses_implicit_header_and_sf6_detection() {
        let mut core = MockCore::new();
        // SymbTimeout MSB lives in the low bits of ModemConfig2
        core.regs[0x1E] = 0x03;
        core.regs[0x31] = 0xC0;
        let mut radio = Sx1278::new(core);

        assert_eq!(radio.set_spreading_factor(6), Ok(()));
        let core = radio.core();
        assert!(core.bit(0x1D, 0));
        assert_eq!(core.reg(0x1E), 0x63);
        assert_eq!(core.reg(0x31), 0xC5);
        assert_eq!(core.reg(0x37), 0x0C);
        assert_eq!(radio.spreading_factor(), 6);
    }

    #[test]
    fn sf7_to_sf12_use_explicit_header_and_shared_detection() {
        for sf in 7..=12u8 {
            let mut core = MockCore::new();
            core.regs[0x1D] = 0x01;
            let mut radio = Sx1278::new(core);

            assert_eq!(radio.set_spreading_factor(sf), Ok(()));
            let core = radio.core();
            assert!(!core.bit(0x1D, 0));
            assert_eq!(core.reg(0x1E) >> 4, sf);
            assert_eq!(core.reg(0x1E) & 0b1100, 0);
            assert_eq!(core.reg(0x31) & 0b111, 0b011);
            assert_eq!(core.reg(0x37), 0x0A);
            assert_eq!(radio.spreading_factor(), sf);
        }
    }

    #[test]
    fn invalid_spreading_factor_touches_nothing() {
        let mut radio = Sx1278::new(MockCore::new());
        for sf in [0, 5, 13, 255] {
            assert_eq!(radio.set_spreading_factor(sf), Err(Error::InvalidSpreadingFactor));
        }
        assert!(radio.core().writes.is_empty());
        assert_eq!(radio.core().standby_count, 0);
    }

    #[test]
    fn spreading_factor_failure_attempts_every_write_and_keeps_cache() {
        let mut radio = Sx1278::new(MockCore::failing_at(0x1E));
        assert_eq!(radio.set_spreading_factor(10), Err(Error::Bus));
        assert_eq!(radio.spreading_factor(), 7);

        let core = radio.core();
        assert!(core.wrote(0x1D));
        assert!(core.wrote(0x31));
        assert!(core.wrote(0x37));
        // derived settings are left alone
        assert!(!core.wrote(0x26));
    }

    #[test]
    fn coding_rate_is_written_to_bits_3_to_1() {
        let mut core = MockCore::new();
        core.regs[0x1D] = 0x71;
        let mut radio = Sx1278::new(core);

        assert_eq!(radio.set_coding_rate(8), Ok(()));
        assert_eq!(radio.core().reg(0x1D), 0x79);
        assert_eq!(radio.coding_rate(), 8);

        assert_eq!(radio.set_coding_rate(5), Ok(()));
        assert_eq!(radio.core().reg(0x1D), 0x73);

        assert_eq!(radio.set_coding_rate(9), Err(Error::InvalidCodingRate));
        assert_eq!(radio.set_coding_rate(4), Err(Error::InvalidCodingRate));
        assert_eq!(radio.coding_rate(), 5);
    }

    #[test]
    fn failed_coding_rate_write_keeps_cached_value() {
        let mut radio = Sx1278::new(MockCore::failing_at(0x1D));
        assert_eq!(radio.set_coding_rate(6), Err(Error::Bus));
        assert_eq!(radio.coding_rate(), 5);
    }

    #[test]
    fn lowest_power_uses_rfo() {
        let mut radio = Sx1278::new(MockCore::new());
        assert_eq!(radio.set_output_power(-3), Ok(()));
        let core = radio.core();
        assert!(!core.bit(0x09, 7));
        assert_eq!(core.reg(0x09) & 0x0F, 0);
        assert_eq!(core.reg(0x09) & 0x70, 0x20);
        assert_eq!(core.reg(0x4D) & 0x07, 0x04);
        assert_eq!(core.standby_count, 1);
    }

    #[test]
    fn boost_power_limits() {
        let mut radio = Sx1278::new(MockCore::new());

        assert_eq!(radio.set_output_power(2), Ok(()));
        assert_eq!(radio.core().reg(0x09), 0xF0);

        assert_eq!(radio.set_output_power(17), Ok(()));
        assert_eq!(radio.core().reg(0x09), 0xFF);
        assert_eq!(radio.core().reg(0x4D) & 0x07, 0x04);

        assert_eq!(radio.set_output_power(20), Ok(()));
        assert_eq!(radio.core().reg(0x09), 0xFF);
        assert_eq!(radio.core().reg(0x4D) & 0x07, 0x07);

        // back below 20 dBm turns the DAC off again
        assert_eq!(radio.set_output_power(10), Ok(()));
        assert_eq!(radio.core().reg(0x09), 0xF8);
        assert_eq!(radio.core().reg(0x4D) & 0x07, 0x04);
    }

    #[test]
    fn power_gap_below_max_is_rejected() {
        let mut radio = Sx1278::new(MockCore::new());
        for power in [-4, 18, 19, 21] {
            assert_eq!(radio.set_output_power(power), Err(Error::InvalidOutputPower));
        }
        assert!(radio.core().writes.is_empty());
        assert_eq!(radio.core().standby_count, 0);
    }

    #[test]
    fn power_dac_keeps_reserved_bits() {
        let mut core = MockCore::new();
        core.regs[0x4D] = 0x84;
        let mut radio = Sx1278::new(core);

        assert_eq!(radio.set_output_power(20), Ok(()));
        assert_eq!(radio.core().reg(0x4D), 0x87);
    }

    #[test]
    fn gain_zero_enables_agc() {
        let mut radio = Sx1278::new(MockCore::new());
        assert_eq!(radio.set_gain(0), Ok(()));
        assert!(radio.core().bit(0x26, 2));
        assert!(!radio.core().wrote(0x0C));
    }

    #[test]
    fn manual_gain_disables_agc_and_boosts_lna() {
        let mut core = MockCore::new();
        core.regs[0x26] = 0x0C;
        let mut radio = Sx1278::new(core);

        assert_eq!(radio.set_gain(1), Ok(()));
        assert_eq!(radio.core().reg(0x26), 0x08);
        assert_eq!(radio.core().reg(0x0C), 0x23);

        assert_eq!(radio.set_gain(6), Ok(()));
        assert_eq!(radio.core().reg(0x0C), 0xC3);

        assert_eq!(radio.set_gain(7), Err(Error::InvalidGain));
        assert_eq!(radio.core().reg(0x0C), 0xC3);
    }

    #[test]
    fn frequency_outside_band_touches_nothing() {
        let mut radio = Sx1278::new(MockCore::new());
        for freq in [0.0, 136.9, 525.1, 868.0, f32::NAN] {
            assert_eq!(radio.set_frequency(freq), Err(Error::InvalidFrequency));
        }
        assert!(radio.core().writes.is_empty());
        assert!(radio.core().frequencies.is_empty());
    }

    #[test]
    fn frequency_band_edges_are_accepted() {
        let mut radio = Sx1278::new(MockCore::new());
        assert_eq!(radio.set_frequency(137.0), Ok(()));
        assert_eq!(radio.set_frequency(525.0), Ok(()));
        assert_eq!(radio.core().frequencies, [137.0, 525.0]);
    }

    #[test]
    fn narrow_bandwidth_raises_synthesised_frequency() {
        let mut radio = Sx1278::new(MockCore::new());
        assert_eq!(radio.set_bandwidth(7.8), Ok(()));
        assert_eq!(radio.set_frequency(433.0), Ok(()));

        let core = radio.core();
        let synthesised = core.frequencies[0];
        assert!((synthesised - (433.0 + 7.8)).abs() < 1e-4);
        assert!(!core.bit(0x31, 7));
        assert_eq!(core.reg(0x2F), 0x48);
        assert_eq!(core.reg(0x30), 0x00);
        assert!(!core.wrote(0x36));
    }

    #[test]
    fn narrow_bandwidths_share_if_setting() {
        for bw in [10.4, 15.6, 20.8, 31.25, 41.7] {
            let mut radio = Sx1278::new(MockCore::new());
            assert_eq!(radio.set_bandwidth(bw), Ok(()));
            assert_eq!(radio.set_frequency(433.0), Ok(()));

            let core = radio.core();
            assert_eq!(core.reg(0x2F), 0x44);
            assert!((core.frequencies[0] - (433.0 + bw)).abs() < 1e-4);
        }
    }

    #[test]
    fn medium_bandwidth_keeps_frequency() {
        let mut core = MockCore::new();
        core.regs[0x31] = 0xC3;
        let mut radio = Sx1278::new(core);

        assert_eq!(radio.set_frequency(433.0), Ok(()));
        let core = radio.core();
        assert_eq!(core.frequencies, [433.0]);
        assert_eq!(core.reg(0x31), 0x43);
        assert_eq!(core.reg(0x2F), 0x40);
        assert_eq!(core.reg(0x30), 0x00);
    }

    #[test]
    fn wide_bandwidth_trims_sensitivity() {
        let mut radio = Sx1278::new(MockCore::new());
        assert_eq!(radio.set_bandwidth(500.0), Ok(()));
        assert_eq!(radio.set_frequency(433.0), Ok(()));

        let core = radio.core();
        assert_eq!(core.reg(0x36), 0x03);
        assert_eq!(core.reg(0x3A), 0x65);
        assert!(core.bit(0x31, 7));
        assert!(!core.wrote(0x2F));
        assert_eq!(core.frequencies, [433.0]);
    }

    #[test]
    fn wide_bandwidth_below_trim_bands_only_sets_automatic_if() {
        let mut radio = Sx1278::new(MockCore::new());
        assert_eq!(radio.set_bandwidth(500.0), Ok(()));
        assert_eq!(radio.set_frequency(169.0), Ok(()));

        let core = radio.core();
        assert!(!core.wrote(0x36));
        assert!(!core.wrote(0x3A));
        assert!(core.bit(0x31, 7));
    }

    #[test]
    fn failed_correction_skips_synthesis() {
        let mut radio = Sx1278::new(MockCore::failing_at(0x2F));
        assert_eq!(radio.set_frequency(433.0), Err(Error::Bus));

        let core = radio.core();
        assert!(core.wrote(0x30));
        assert!(core.frequencies.is_empty());
    }

    #[test]
    fn low_data_rate_optimize_follows_symbol_length() {
        let mut radio = Sx1278::new(MockCore::new());

        assert_eq!(radio.set_bandwidth(7.8), Ok(()));
        assert_eq!(radio.set_spreading_factor(12), Ok(()));
        assert!(radio.core().bit(0x26, 3));

        // 4096 / 500 = 8.192
        assert_eq!(radio.set_bandwidth(500.0), Ok(()));
        assert!(radio.core().bit(0x26, 3));

        // 128 / 500 = 0.256
        assert_eq!(radio.set_spreading_factor(7), Ok(()));
        assert!(radio.core().bit(0x26, 3));
    }

    #[test]
    fn low_data_rate_optimize_rewritten_on_every_change() {
        for bw in BANDWIDTHS_KHZ {
            for sf in 6..=12u8 {
                let mut core = MockCore::new();
                core.regs[0x26] = 0x04;
                let mut radio = Sx1278::new(core);

                assert_eq!(radio.set_bandwidth(bw), Ok(()));
                radio.core_mut().regs[0x26] = 0x04;
                assert_eq!(radio.set_spreading_factor(sf), Ok(()));
                assert_eq!(radio.core().reg(0x26), 0x0C);
            }
        }
    }

    #[test]
    fn failed_setter_leaves_low_data_rate_optimize_alone() {
        let mut radio = Sx1278::new(MockCore::failing_at(0x1D));
        assert_eq!(radio.set_bandwidth(7.8), Err(Error::Bus));
        assert!(!radio.core().wrote(0x26));
    }

    #[test]
    fn low_data_rate_optimize_keeps_agc_bit() {
        let mut radio = Sx1278::new(MockCore::new());
        assert_eq!(radio.set_gain(0), Ok(()));
        assert_eq!(radio.set_bandwidth(7.8), Ok(()));
        assert_eq!(radio.core().reg(0x26), 0x0C);
    }

    #[test]
    fn begin_applies_every_stage() {
        let mut radio = Sx1278::new(MockCore::new());
        let config = LoRaConfig {
            frequency_mhz: 433.0,
            bandwidth_khz: 62.5,
            spreading_factor: 12,
            coding_rate: 8,
            sync_word: 0x34,
            power_dbm: 20,
            current_limit_ma: 140,
            preamble_length: 12,
            gain: 2,
        };

        let report = radio.begin(&config).unwrap();
        assert!(report.is_ok());
        assert_eq!(report.combined_code(), CODE_NONE);

        let core = radio.core();
        assert_eq!(core.begun_with, Some((0x12, 0x34, 140, 12)));
        assert!(core.configured);
        assert_eq!(core.frequencies, [433.0]);
        assert_eq!(core.reg(0x1D), 0x68);
        assert_eq!(core.reg(0x1E) >> 4, 12);
        assert_eq!(core.reg(0x09), 0xFF);
        assert_eq!(core.reg(0x4D) & 0x07, 0x07);
        assert_eq!(core.reg(0x0C), 0x43);
        // 4096 / 62.5 = 65.5
        assert!(core.bit(0x26, 3));
        assert_eq!(
            radio.state(),
            RadioState {
                bandwidth: Bandwidth::Khz62_5,
                spreading_factor: SpreadingFactor::Sf12,
                coding_rate: CodingRate::Cr4_8,
            }
        );
    }

    #[test]
    fn begin_continues_past_invalid_stage() {
        let mut radio = Sx1278::new(MockCore::new());
        let config = LoRaConfig {
            coding_rate: 9,
            ..LoRaConfig::default()
        };

        let report = radio.begin(&config).unwrap();
        assert_eq!(report.coding_rate, Err(Error::InvalidCodingRate));
        assert_eq!(report.first_error(), Some((Stage::CodingRate, Error::InvalidCodingRate)));
        assert_ne!(report.combined_code(), CODE_NONE);
        assert_eq!(report.into_result(), Err(Error::InvalidCodingRate));

        assert_eq!(report.frequency, Ok(()));
        assert_eq!(report.bandwidth, Ok(()));
        assert_eq!(report.spreading_factor, Ok(()));
        assert_eq!(report.output_power, Ok(()));
        assert_eq!(report.gain, Ok(()));

        // stages after the invalid one still reached the radio
        let core = radio.core();
        assert_eq!(core.reg(0x09), 0xFF);
        assert!(core.bit(0x26, 2));
        assert_eq!(radio.spreading_factor(), 9);
        assert_eq!(radio.coding_rate(), 5);
    }

    #[test]
    fn begin_reports_several_failures() {
        let mut radio = Sx1278::new(MockCore::new());
        let config = LoRaConfig {
            frequency_mhz: 915.0,
            power_dbm: 19,
            ..LoRaConfig::default()
        };

        let report = radio.begin(&config).unwrap();
        assert_eq!(report.frequency, Err(Error::InvalidFrequency));
        assert_eq!(report.output_power, Err(Error::InvalidOutputPower));
        assert_eq!(
            report.combined_code(),
            Error::InvalidFrequency.code() | Error::InvalidOutputPower.code()
        );
        assert_eq!(report.first_error(), Some((Stage::Frequency, Error::InvalidFrequency)));
        assert_eq!(radio.bandwidth(), 125.0);
    }

    #[test]
    fn begin_stops_when_core_fails() {
        let mut core = MockCore::new();
        core.fail_begin = true;
        let mut radio = Sx1278::new(core);

        assert_eq!(radio.begin(&LoRaConfig::default()), Err(Error::ChipNotFound(0x00)));
        assert!(!radio.core().configured);
        assert!(radio.core().writes.is_empty());
    }
}
