use crate::environment::EnvironmentSample;
use crate::{compute_crc, debug, error, Command};

/// The two low bits of the LSB are status bits, not part of the value.
/// Datasheet page 15.
const STATUS_MASK: u8 = 0b0000_0011;

/// Status bit 1 tells which quantity was measured: 0 is temperature, 1 is humidity.
const STATUS_HUMIDITY: u8 = 0b0000_0010;

/// Which quantity the sensor says it measured, taken from the status bits of a transfer.
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementKind {
    Temperature,
    Humidity,
}

/// A single decoded transfer from the sensor.
///
/// `raw_code` has the status bits cleared and is ready for `temperature_c` or `humidity_pct`.
/// `crc_valid` is false if the CRC byte did not match the data. The value is still handed out in
/// that case, it is up to the caller to decide whether a flagged reading is good enough.
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub raw_code: u16,
    /// The two status bits that were cleared from `raw_code`.
    pub status: u8,
    pub crc_valid: bool,
}

impl Measurement {
    /// Decode the three bytes (MSB, LSB, CRC) the sensor sends back for `command`.
    ///
    /// The command is only used to label diagnostics. The status bits are not checked against
    /// it, see `kind`.
    pub fn decode(command: Command, raw: [u8; 3]) -> Self {
        let [msb, lsb, crc] = raw;
        debug!("{} measurement bytes (raw): {:?}", command.quantity(), raw);

        let raw_code = (msb as u16) << 8 | (lsb & !STATUS_MASK) as u16;

        let expected_crc = compute_crc([msb, lsb]);
        let crc_valid = expected_crc == crc;
        if !crc_valid {
            error!(
                "{} CRC error: got: {}, computed: {}, data: {:?}",
                command.quantity(),
                crc,
                expected_crc,
                raw
            );
        }

        Measurement {
            raw_code,
            status: lsb & STATUS_MASK,
            crc_valid,
        }
    }

    /// The quantity the sensor reported in the status bits.
    pub fn kind(&self) -> MeasurementKind {
        if self.status & STATUS_HUMIDITY != 0 {
            MeasurementKind::Humidity
        } else {
            MeasurementKind::Temperature
        }
    }

    /// Interpret this measurement as a temperature in °C.
    pub fn temperature(&self) -> f64 {
        temperature_c(self.raw_code)
    }

    /// Interpret this measurement as relative humidity in %.
    pub fn humidity(&self) -> f64 {
        humidity_pct(self.raw_code)
    }
}

/// Temperature in °C from a raw code. Datasheet page 15:
///
/// > Temp = -46.85 + 175.72 * S_Temp / 2^16
///
/// Values outside the sensor's range are not clamped.
pub fn temperature_c(raw_code: u16) -> f64 {
    raw_code as f64 * 175.72 / 65536.0 - 46.85
}

/// Relative humidity in % from a raw code. Datasheet page 15:
///
/// > RH = -6 + 125 * S_RH / 2^16
///
/// Values below 0% or above 100% are not clamped.
pub fn humidity_pct(raw_code: u16) -> f64 {
    raw_code as f64 * 125.00 / 65536.0 - 6.0
}

/// SensorReading is one temperature and one humidity measurement, taken back to back.
///
/// This is returned from the `measure` method.
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature: Measurement,
    pub humidity: Measurement,
}

impl SensorReading {
    /// True if both transfers passed the CRC check.
    pub fn crc_valid(&self) -> bool {
        self.temperature.crc_valid && self.humidity.crc_valid
    }

    /// Convert to physical values and work out the derived quantities.
    pub fn environment(&self) -> EnvironmentSample {
        EnvironmentSample::new(self.temperature.temperature(), self.humidity.humidity())
    }
}
