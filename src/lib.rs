#![cfg_attr(not(test), no_std)]
//! HTU21D-F driver.
//!
//! Example:
//!
//!     # use embedded_hal_mock::eh1::delay::NoopDelay as MockDelay;
//!     # use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
//!     # use htu21df_driver::{Command, HTU21DF, SENSOR_ADDRESS};
//!     # let expectations = vec![
//!     #     Transaction::write(SENSOR_ADDRESS, vec![Command::SoftReset as u8]),
//!     #     // MSB, LSB, CRC. Both samples are the worked examples from the datasheet.
//!     #     Transaction::write_read(
//!     #         SENSOR_ADDRESS,
//!     #         vec![Command::ReadTemperature as u8],
//!     #         vec![0x68, 0x3A, 0x7C],
//!     #     ),
//!     #     Transaction::write_read(
//!     #         SENSOR_ADDRESS,
//!     #         vec![Command::ReadHumidity as u8],
//!     #         vec![0x4E, 0x85, 0x6B],
//!     #     ),
//!     # ];
//!     # let mock_i2c = I2cMock::new(&expectations);
//!     # let mut mock_delay = MockDelay::new();
//!     let mut htu21df = HTU21DF::new(mock_i2c, SENSOR_ADDRESS);
//!     htu21df.soft_reset(&mut mock_delay).unwrap();
//!     let reading = htu21df.measure().unwrap();
//!     let environment = reading.environment();
//!
//!     println!("temperature (htu21df): {:.2}C", environment.temperature_c);
//!     println!("humidity (htu21df): {:.2}%", environment.humidity_pct);
//!     println!("dew point (htu21df): {:?}C", environment.dewpoint_c);
//!     # htu21df.destroy().done();
//!
//! [HTU21D(F) Datasheet](https://cdn-shop.adafruit.com/datasheets/1899_HTU21D.pdf)
//!
//! Every measurement is a single "hold master" exchange: the command byte is written, the sensor
//! stretches the clock while it converts, and then three bytes come back. The CRC is checked, but
//! a mismatch does not discard the reading. The caller gets the value together with a
//! `crc_valid` flag and decides what to do with it.
//!
//! ```text
//!           Start (Power on)
//!                  │
//!                  ▼
//!   Command::SoftReset  (0xFE)
//!                  │
//!                  ▼
//!              Wait 15 ms
//!                  │
//!                  ▼
//!   Command::ReadUserRegister (0xE7)   (optional, diagnostics)
//!                  │
//!                  ▼
//! Command::ReadTemperature (0xE3)  ◄───────┐
//! Command::ReadHumidity    (0xE5)          │
//!                  │                       │
//!                  ▼                       │
//!       Read 3 bytes: MSB, LSB, CRC        │
//!                  │                       │
//!                  ▼                       │
//!             Calculate CRC                │
//!                  │                       │
//!                  ▼                       │
//!    CRC good ─► No ─► log error ─┐        │
//!                  │              │        │
//!                  ▼              │        │
//!                 Yes             │        │
//!                  │              │        │
//!                  ▼              ▼        │
//!       Clear status bits, calc value ─────┘
//! ```
//!
//! ## Features
//!
//! - `use-defmt`: diagnostics are logged through `defmt`.
//! - `use-log`: diagnostics are logged through `log`.
//!
//! Without either feature the diagnostics compile to nothing.

#[cfg(all(feature = "use-defmt", feature = "use-log"))]
compile_error!("Features \"use-defmt\" and \"use-log\" are mutually exclusive");

#[cfg(feature = "use-defmt")]
pub(crate) use defmt::{debug, error};
#[cfg(feature = "use-log")]
pub(crate) use log::{debug, error};

// Without a logging backend the arguments are still evaluated, so nothing goes unused.
#[cfg(not(any(feature = "use-defmt", feature = "use-log")))]
macro_rules! debug {
    ($($arg:expr),* $(,)?) => {{ $( let _ = &$arg; )* }};
}
#[cfg(not(any(feature = "use-defmt", feature = "use-log")))]
macro_rules! error {
    ($($arg:expr),* $(,)?) => {{ $( let _ = &$arg; )* }};
}
#[cfg(not(any(feature = "use-defmt", feature = "use-log")))]
pub(crate) use {debug, error};

pub mod environment;
mod measurement;
pub mod register;

pub use environment::{
    compensate_humidity, dewpoint_c, partial_pressure_mmhg, partial_pressure_pa, DomainError,
    EnvironmentSample,
};
pub use measurement::{humidity_pct, temperature_c, Measurement, MeasurementKind, SensorReading};
pub use register::{decode_user_register, Resolution, UserRegister};

use crc_any::CRCu8;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// HTU21D-F sensor's I2C address.
pub const SENSOR_ADDRESS: u8 = 0b0100_0000; // This is I2C address 0x40;

/// The sensor is guaranteed to be back up 15ms after a soft reset. Datasheet page 12.
const SOFT_RESET_DELAY_MS: u32 = 15;

/// The CRC generator polynomial, x^8 + x^5 + x^4 + 1. Datasheet page 14.
pub const CRC_GENERATOR: u16 = 0b1_0011_0001; // 0x131

/// Commands that can be sent to the HTU21D-F sensor.
///
/// Datasheet page 10, Table 1. Only the "hold master" variants of the measurement commands are
/// used: the sensor holds SCL low until the conversion is done, so a measurement is one
/// write-then-read exchange.
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ReadTemperature = 0b1110_0011, // 0xE3, Trigger temperature measurement, hold master.
    // Answered with MSB, LSB and a CRC byte.
    ReadHumidity = 0b1110_0101, // 0xE5, Trigger humidity measurement, hold master.
    // Answered with MSB, LSB and a CRC byte.
    WriteUserRegister = 0b1110_0110, // 0xE6
    // Takes one byte of parameter, the new register value. The reserved bits 3, 4 and 5 must
    // be written back exactly as they were read.
    ReadUserRegister = 0b1110_0111, // 0xE7
    // Answered with one byte, see the `register` module for the layout.
    SoftReset = 0b1111_1110, // 0xFE
    // Reboots the sensor and resets the user register to its defaults, except for the heater
    // bit. Takes 15ms or less to complete.
}

impl Command {
    /// Name of the quantity a measurement command reads, for diagnostics.
    pub(crate) fn quantity(self) -> &'static str {
        match self {
            Command::ReadTemperature => "Temperature",
            Command::ReadHumidity => "Humidity",
            Command::WriteUserRegister | Command::ReadUserRegister => "User register",
            Command::SoftReset => "Soft reset",
        }
    }
}

/// Driver errors.
///
/// Only a failing bus transaction is an error. CRC mismatches are reported through
/// `Measurement::crc_valid` instead.
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq)]
pub enum Error<E> {
    /// I2C bus error
    I2c(E),
}

/// An HTU21D-F sensor on the I2C bus `I`.
///
/// The address of the sensor will be `SENSOR_ADDRESS` from this package, unless there is some kind
/// of special address translating hardware in use. The driver owns the bus for as long as it
/// lives; use `destroy` to get it back.
pub struct HTU21DF<I>
where
    I: I2c,
{
    i2c: I,
    address: u8,
}

impl<E, I> HTU21DF<I>
where
    I: I2c<Error = E>,
{
    /// Creates the HTU21D-F driver.
    ///
    /// This consumes the I2C bus `I`. No bus traffic happens here. You may want to call
    /// `soft_reset` first to get the sensor into a known state.
    pub fn new(i2c: I, address: u8) -> Self {
        HTU21DF { i2c, address }
    }

    /// Send the Soft Reset command to the sensor.
    ///
    /// This reboots the sensor and restores the default user register. The datasheet guarantees
    /// the reboot takes less than 15ms, and we wait the full 15ms so the next command is accepted.
    pub fn soft_reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error<E>> {
        self.send_command(Command::SoftReset)?;
        delay.delay_ms(SOFT_RESET_DELAY_MS);

        Ok(())
    }

    /// Read the user register.
    ///
    /// If you intend to write the register back, change fields on the returned value rather than
    /// building a new byte, so the reserved bits survive.
    pub fn read_user_register(&mut self) -> Result<UserRegister, Error<E>> {
        let mut read_buffer = [0u8; 1];

        self.send_command(Command::ReadUserRegister)?;
        self.i2c
            .read(self.address, &mut read_buffer)
            .map_err(Error::I2c)?;

        let register = decode_user_register(read_buffer[0]);
        debug!("User register read: {}", read_buffer[0]);
        Ok(register)
    }

    /// Write the user register.
    ///
    /// The battery bit is read-only on the sensor, writing it has no effect.
    pub fn write_user_register(&mut self, register: UserRegister) -> Result<(), Error<E>> {
        let command: [u8; 2] = [Command::WriteUserRegister as u8, u8::from(register)];

        self.i2c.write(self.address, &command).map_err(Error::I2c)?;

        Ok(())
    }

    /// Change the measurement resolution, keeping every other bit of the user register.
    ///
    /// Returns the register as written.
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<UserRegister, Error<E>> {
        let register = self.read_user_register()?.with_resolution(resolution);
        self.write_user_register(register)?;

        Ok(register)
    }

    /// Measure the temperature.
    ///
    /// The returned `Measurement` can be converted with `Measurement::temperature`. Check
    /// `crc_valid` if you care about transmission errors.
    pub fn read_temperature(&mut self) -> Result<Measurement, Error<E>> {
        self.read_measurement(Command::ReadTemperature)
    }

    /// Measure the relative humidity.
    ///
    /// The returned `Measurement` can be converted with `Measurement::humidity`. The value is not
    /// temperature compensated, see `compensate_humidity`.
    pub fn read_humidity(&mut self) -> Result<Measurement, Error<E>> {
        self.read_measurement(Command::ReadHumidity)
    }

    /// Measure temperature, then humidity.
    pub fn measure(&mut self) -> Result<SensorReading, Error<E>> {
        let temperature = self.read_temperature()?;
        let humidity = self.read_humidity()?;

        Ok(SensorReading {
            temperature,
            humidity,
        })
    }

    /// One hold-master measurement exchange: write the command, read MSB, LSB and CRC.
    fn read_measurement(&mut self, command: Command) -> Result<Measurement, Error<E>> {
        let mut read_buffer = [0u8; 3];

        self.i2c
            .write_read(self.address, &[command as u8], &mut read_buffer)
            .map_err(Error::I2c)?;

        Ok(Measurement::decode(command, read_buffer))
    }

    fn send_command(&mut self, command: Command) -> Result<(), Error<E>> {
        self.i2c
            .write(self.address, &[command as u8])
            .map_err(Error::I2c)
    }

    /// Destroys this driver and releases the I2C bus `I`
    pub fn destroy(self) -> I {
        self.i2c
    }
}

/// compute_crc uses the CRCu8 algorithm from crc-any over the two data bytes of a transfer.
///
/// From the datasheet, page 14: the generator polynomial is `x**8 + x**5 + x**4 + 1`, that is
/// `0b1_0011_0001` (0x131). crc-any takes the polynomial without its top bit, which leaves 0x31.
/// The register starts at 0x00, nothing is reflected and there is no final XOR, which makes this
/// plain polynomial long division of `msb << 16 | lsb << 8` by the generator.
///
/// Datasheet examples: 0x00DC gives 0x79, 0x683A gives 0x7C, 0x4E85 gives 0x6B.
pub fn compute_crc(bytes: [u8; 2]) -> u8 {
    // An all-zero message has no set bit to align the generator against. Its remainder is
    // defined as the generator's low byte.
    if bytes == [0x00, 0x00] {
        return (CRC_GENERATOR & 0xFF) as u8;
    }

    // Poly (0x31), bits (8), initial (0x00), final_xor (0x00), reflect (false).
    let mut crc = CRCu8::create_crc((CRC_GENERATOR & 0xFF) as u8, 8, 0x00, 0x00, false);
    crc.digest(&bytes);
    crc.get_crc()
}
