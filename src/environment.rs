//! Derived environmental quantities: humidity compensation, saturation vapour pressure and dew
//! point.
//!
//! These are pure functions of temperature and humidity, using the formulas and constants from
//! the HTU21D(F) datasheet (pages 15 and 16). `EnvironmentSample` puts them together for one
//! temperature/humidity pair.

use core::fmt;
use core::ops::RangeInclusive;

use crate::error;

/// Coefficients of the Antoine-type saturation vapour pressure formula,
/// `log10(PP) = A - B / (T + C)`, with PP in mmHg and T in °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnusCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// The coefficients the datasheet gives for the -40 to 125 °C range.
pub const MAGNUS: MagnusCoefficients = MagnusCoefficients {
    a: 8.1332,
    b: 1762.39,
    c: 235.66,
};

/// Pascals in one mmHg.
pub const PA_PER_MMHG: f64 = 133.32239;

/// Temperature at which the humidity sensor is calibrated, and needs no compensation.
pub const COMPENSATION_REFERENCE_C: f64 = 25.0;

/// Temperature coefficient of the humidity reading, in %RH per °C.
pub const COMPENSATION_COEFFICIENT: f64 = -0.15;

/// Temperatures the compensation formula is specified for.
pub const COMPENSATION_RANGE_C: RangeInclusive<f64> = 0.0..=80.0;

/// The dew point formula was asked for something it has no answer to.
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainError {
    /// Humidity times vapour pressure was zero, negative or NaN, so its logarithm is undefined.
    /// This happens for a humidity of 0% or below.
    NonPositiveLogArgument,
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::NonPositiveLogArgument => {
                write!(f, "dew point undefined for non-positive vapour pressure")
            }
        }
    }
}

/// Temperature compensated relative humidity:
///
/// > RH_compensated = RH_actual + (25 - T_actual) * CoeffTemp
///
/// The formula is only specified between 0 and 80 °C. Outside that range an error is logged, but
/// the formula is applied anyway.
pub fn compensate_humidity(humidity_pct: f64, temperature_c: f64) -> f64 {
    if !COMPENSATION_RANGE_C.contains(&temperature_c) {
        error!(
            "Temperature out of range 0 to 80 degC for compensation: {}",
            temperature_c
        );
    }

    humidity_pct + (COMPENSATION_REFERENCE_C - temperature_c) * COMPENSATION_COEFFICIENT
}

/// Saturation vapour pressure at `temperature_c`, in mmHg.
pub fn partial_pressure_mmhg(temperature_c: f64) -> f64 {
    libm::pow(10.0, MAGNUS.a - MAGNUS.b / (temperature_c + MAGNUS.c))
}

/// Saturation vapour pressure at `temperature_c`, in Pa.
pub fn partial_pressure_pa(temperature_c: f64) -> f64 {
    PA_PER_MMHG * partial_pressure_mmhg(temperature_c)
}

/// Dew point in °C, the inverse of `partial_pressure_mmhg`:
///
/// > Td = -(B / (log10(RH * PP(T) / 100) - A) + C)
///
/// This uses `humidity_pct` as given. Whether to pass compensated humidity is the caller's
/// decision, `EnvironmentSample::new` shows the policy this crate uses.
pub fn dewpoint_c(humidity_pct: f64, temperature_c: f64) -> Result<f64, DomainError> {
    let vapour_pressure = humidity_pct * partial_pressure_mmhg(temperature_c) / 100.0;
    if vapour_pressure.is_nan() || vapour_pressure <= 0.0 {
        return Err(DomainError::NonPositiveLogArgument);
    }

    Ok(-(MAGNUS.b / (libm::log10(vapour_pressure) - MAGNUS.a) + MAGNUS.c))
}

/// Physical and derived values for one temperature and humidity pair.
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentSample {
    pub temperature_c: f64,
    /// Relative humidity as measured, not compensated.
    pub humidity_pct: f64,
    /// Only meaningful between 0 and 80 °C.
    pub humidity_compensated_pct: f64,
    /// Saturation vapour pressure at `temperature_c`.
    pub partial_pressure_pa: f64,
    /// `None` if the dew point is undefined, for a humidity of 0% or below.
    pub dewpoint_c: Option<f64>,
}

impl EnvironmentSample {
    /// Work out the derived quantities.
    ///
    /// The dew point uses compensated humidity when the temperature is strictly between 0 and
    /// 80 °C, and the humidity as measured otherwise. `dewpoint_c` itself never compensates.
    pub fn new(temperature_c: f64, humidity_pct: f64) -> Self {
        let humidity_compensated_pct = compensate_humidity(humidity_pct, temperature_c);

        let dewpoint_humidity = if temperature_c > 0.0 && temperature_c < 80.0 {
            humidity_compensated_pct
        } else {
            humidity_pct
        };
        let dewpoint_c = match dewpoint_c(dewpoint_humidity, temperature_c) {
            Ok(dewpoint) => Some(dewpoint),
            Err(_) => {
                error!(
                    "No dew point for humidity {} at temperature {}",
                    dewpoint_humidity, temperature_c
                );
                None
            }
        };

        EnvironmentSample {
            temperature_c,
            humidity_pct,
            humidity_compensated_pct,
            partial_pressure_pa: partial_pressure_pa(temperature_c),
            dewpoint_c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// No correction at the 25C reference point.
    #[test]
    fn compensation_at_reference() {
        assert_eq!(compensate_humidity(50.0, 25.0), 50.0);
    }

    /// 10C above the reference adds 1.5%RH.
    #[test]
    fn compensation_above_reference() {
        assert!((compensate_humidity(50.0, 35.0) - 51.5).abs() < 1e-9);
    }

    /// Out of range temperatures are still compensated.
    #[test]
    fn compensation_extrapolates() {
        assert!((compensate_humidity(50.0, -5.0) - 45.5).abs() < 1e-9);
        assert!((compensate_humidity(50.0, 85.0) - 59.0).abs() < 1e-9);
    }

    /// Saturation vapour pressure at 25C is about 23.5 mmHg, or 3.14 kPa.
    #[test]
    fn partial_pressure() {
        assert!((partial_pressure_mmhg(25.0) - 23.547).abs() < 0.001);
        assert!((partial_pressure_pa(25.0) - 3139.4).abs() < 0.1);
    }

    /// Feeding the dew point back into the pressure formula gives the humidity back.
    #[test]
    fn dewpoint_inverts_partial_pressure() {
        for &(humidity, temperature) in &[(50.0, 25.0), (10.0, -10.0), (95.0, 60.0), (33.3, 0.0)] {
            let dewpoint = dewpoint_c(humidity, temperature).unwrap();
            let ratio = partial_pressure_mmhg(dewpoint) / partial_pressure_mmhg(temperature);
            assert!(
                (ratio - humidity / 100.0).abs() < 1e-9,
                "humidity {} temperature {}",
                humidity,
                temperature
            );
        }
    }

    /// At 100% humidity the air is already saturated.
    #[test]
    fn dewpoint_at_saturation() {
        assert!((dewpoint_c(100.0, 20.0).unwrap() - 20.0).abs() < 1e-9);
    }

    /// 50% at 25C gives a dew point of about 13.9C.
    #[test]
    fn dewpoint_reference_value() {
        assert!((dewpoint_c(50.0, 25.0).unwrap() - 13.89).abs() < 0.01);
    }

    /// No logarithm of zero or below.
    #[test]
    fn dewpoint_domain_error() {
        assert_eq!(dewpoint_c(0.0, 25.0), Err(DomainError::NonPositiveLogArgument));
        assert_eq!(dewpoint_c(-3.0, 25.0), Err(DomainError::NonPositiveLogArgument));
        assert_eq!(
            dewpoint_c(f64::NAN, 25.0),
            Err(DomainError::NonPositiveLogArgument)
        );
    }

    /// Inside the compensation range the dew point uses compensated humidity.
    #[test]
    fn sample_uses_compensated_humidity_in_range() {
        let sample = EnvironmentSample::new(35.0, 50.0);
        assert_eq!(sample.humidity_pct, 50.0);
        assert_eq!(sample.humidity_compensated_pct, compensate_humidity(50.0, 35.0));
        assert_eq!(
            sample.dewpoint_c,
            Some(dewpoint_c(compensate_humidity(50.0, 35.0), 35.0).unwrap())
        );
        assert_eq!(sample.partial_pressure_pa, partial_pressure_pa(35.0));
    }

    /// Outside the range, and at its exact ends, the measured humidity is used.
    #[test]
    fn sample_uses_measured_humidity_out_of_range() {
        for &temperature in &[-5.0, 0.0, 80.0, 90.0] {
            let sample = EnvironmentSample::new(temperature, 50.0);
            assert_eq!(
                sample.dewpoint_c,
                Some(dewpoint_c(50.0, temperature).unwrap()),
                "temperature {}",
                temperature
            );
        }
    }

    /// A dry reading has no dew point, but the rest of the sample is there.
    #[test]
    fn sample_without_dewpoint() {
        let sample = EnvironmentSample::new(-10.0, 0.0);
        assert_eq!(sample.dewpoint_c, None);
        assert_eq!(sample.temperature_c, -10.0);
    }
}
