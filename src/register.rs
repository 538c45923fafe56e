//! The user register.
//!
//! Datasheet page 13, Table 2:
//!
//! ```text
//!  bit 7   6   5   4   3   2   1   0
//!      │   │   └───┴───┤   │   │   │
//!      │   │           │   │   │   └─ resolution, low bit
//!      │   │           │   │   └───── disable OTP reload
//!      │   │           │   └───────── enable on-chip heater
//!      │   │           └───────────── reserved, write back as read
//!      │   └───────────────────────── end of battery (VDD < 2.25V), read-only
//!      └───────────────────────────── resolution, high bit
//! ```

use core::fmt;

const RESOLUTION_MASK: u8 = 0b1000_0001;
const OTP_RELOAD_DISABLE: u8 = 0b0000_0010;
const HEATER_ENABLE: u8 = 0b0000_0100;
const RESERVED_MASK: u8 = 0b0011_1000;
const END_OF_BATTERY: u8 = 0b0100_0000;

/// Measurement resolution, humidity bits then temperature bits.
///
/// The discriminants are the register bits 7 and 0 in place.
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Power-on default.
    #[default]
    Rh12Temp14 = 0b0000_0000,
    Rh8Temp12 = 0b0000_0001,
    Rh10Temp13 = 0b1000_0000,
    Rh11Temp11 = 0b1000_0001,
}

impl Resolution {
    /// Look up a resolution from register bits 7 and 0. Any other bit set gives `None`.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b0000_0000 => Some(Resolution::Rh12Temp14),
            0b0000_0001 => Some(Resolution::Rh8Temp12),
            0b1000_0000 => Some(Resolution::Rh10Temp13),
            0b1000_0001 => Some(Resolution::Rh11Temp11),
            _ => None,
        }
    }

    /// Resolution from a full user register byte. Bits 7 and 0 always form one of the four codes.
    fn from_register(reg: u8) -> Self {
        match reg & RESOLUTION_MASK {
            0b0000_0000 => Resolution::Rh12Temp14,
            0b0000_0001 => Resolution::Rh8Temp12,
            0b1000_0000 => Resolution::Rh10Temp13,
            _ => Resolution::Rh11Temp11,
        }
    }

    pub fn humidity_bits(self) -> u8 {
        match self {
            Resolution::Rh12Temp14 => 12,
            Resolution::Rh8Temp12 => 8,
            Resolution::Rh10Temp13 => 10,
            Resolution::Rh11Temp11 => 11,
        }
    }

    pub fn temperature_bits(self) -> u8 {
        match self {
            Resolution::Rh12Temp14 => 14,
            Resolution::Rh8Temp12 => 12,
            Resolution::Rh10Temp13 => 13,
            Resolution::Rh11Temp11 => 11,
        }
    }
}

/// A decoded user register.
///
/// The reserved bits are kept as read so that a register can be changed and written back
/// without disturbing them. Convert back to the register byte with `u8::from`.
#[cfg_attr(feature = "use-defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRegister {
    pub resolution: Resolution,
    /// When false, the default settings are reloaded before every measurement.
    pub otp_reload_disabled: bool,
    /// The on-chip heater, about 5.5mW and 0.5 to 1.5 °C of self-heating. For diagnostics only.
    pub heater_enabled: bool,
    /// VDD is below 2.25V.
    pub battery_low: bool,
    reserved: u8,
}

impl UserRegister {
    /// The three reserved bits, shifted down to bits 0 to 2.
    pub fn reserved(&self) -> u8 {
        self.reserved >> 3
    }

    /// This register with a different resolution.
    pub fn with_resolution(self, resolution: Resolution) -> Self {
        UserRegister { resolution, ..self }
    }
}

/// Decode a user register byte.
///
/// Every field is one bit or a pair of bits with all four patterns assigned, so any byte decodes.
pub fn decode_user_register(reg: u8) -> UserRegister {
    let resolution = Resolution::from_register(reg);

    UserRegister {
        resolution,
        otp_reload_disabled: reg & OTP_RELOAD_DISABLE != 0,
        heater_enabled: reg & HEATER_ENABLE != 0,
        battery_low: reg & END_OF_BATTERY != 0,
        reserved: reg & RESERVED_MASK,
    }
}

impl From<u8> for UserRegister {
    fn from(reg: u8) -> Self {
        decode_user_register(reg)
    }
}

impl From<UserRegister> for u8 {
    fn from(register: UserRegister) -> u8 {
        let mut reg = register.resolution as u8 | register.reserved;
        if register.otp_reload_disabled {
            reg |= OTP_RELOAD_DISABLE;
        }
        if register.heater_enabled {
            reg |= HEATER_ENABLE;
        }
        if register.battery_low {
            reg |= END_OF_BATTERY;
        }
        reg
    }
}

impl fmt::Display for UserRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reg = u8::from(*self);
        write!(
            f,
            "User register: {:#04x} ({:#010b}), resolution RH/T: {}/{} bit, otp_reload_disabled: {}, \
             heater_enabled: {}, reserved_bits: {:#05b}, battery_low: {}",
            reg,
            reg,
            self.resolution.humidity_bits(),
            self.resolution.temperature_bits(),
            self.otp_reload_disabled,
            self.heater_enabled,
            self.reserved(),
            self.battery_low
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_user_register, Resolution, UserRegister};

    /// All zeroes is the power-on default resolution with every flag off.
    #[test]
    fn decode_zero() {
        let register = decode_user_register(0b0000_0000);
        assert_eq!(register.resolution, Resolution::Rh12Temp14);
        assert!(!register.otp_reload_disabled);
        assert!(!register.heater_enabled);
        assert!(!register.battery_low);
        assert_eq!(register.reserved(), 0);
    }

    #[test]
    fn decode_resolution_and_otp() {
        let register = decode_user_register(0b1000_0010);
        assert_eq!(register.resolution, Resolution::Rh10Temp13);
        assert_eq!(register.resolution.humidity_bits(), 10);
        assert_eq!(register.resolution.temperature_bits(), 13);
        assert!(register.otp_reload_disabled);
    }

    #[test]
    fn decode_other_resolutions() {
        assert_eq!(decode_user_register(0b0000_0001).resolution, Resolution::Rh8Temp12);
        assert_eq!(decode_user_register(0b1000_0001).resolution, Resolution::Rh11Temp11);
    }

    #[test]
    fn decode_heater_and_battery() {
        let register = decode_user_register(0b0100_0100);
        assert!(register.heater_enabled);
        assert!(register.battery_low);
        assert!(!register.otp_reload_disabled);
    }

    /// Only the four resolution codes are accepted.
    #[test]
    fn resolution_from_bits() {
        assert_eq!(Resolution::from_bits(0b1000_0000), Some(Resolution::Rh10Temp13));
        assert_eq!(Resolution::from_bits(0b0000_0010), None);
        assert_eq!(Resolution::from_bits(0b1111_1111), None);
    }

    /// Reserved bits survive a decode, a change, and an encode.
    #[test]
    fn reserved_bits_are_preserved() {
        let register = UserRegister::from(0b0011_1010);
        assert_eq!(register.reserved(), 0b111);

        let changed = register.with_resolution(Resolution::Rh8Temp12);
        assert_eq!(u8::from(changed), 0b0011_1011);
        assert_eq!(u8::from(register), 0b0011_1010);
    }

    /// The resolution comes from bits 7 and 0 alone, whatever else is set.
    #[test]
    fn decode_resolution_ignores_other_bits() {
        assert_eq!(decode_user_register(0b0111_1110).resolution, Resolution::Rh12Temp14);
        assert_eq!(decode_user_register(0b0111_1111).resolution, Resolution::Rh8Temp12);
        assert_eq!(decode_user_register(0b1111_1110).resolution, Resolution::Rh10Temp13);
        assert_eq!(decode_user_register(0b1111_1111).resolution, Resolution::Rh11Temp11);
    }

    #[test]
    fn encode_every_field() {
        assert_eq!(u8::from(UserRegister::from(0b1111_1111)), 0b1111_1111);
        assert_eq!(u8::from(UserRegister::from(0b0100_0110)), 0b0100_0110);
    }

    #[test]
    fn display() {
        let register = decode_user_register(0b1000_0010);
        assert_eq!(
            format!("{}", register),
            "User register: 0x82 (0b10000010), resolution RH/T: 10/13 bit, \
             otp_reload_disabled: true, heater_enabled: false, reserved_bits: 0b000, \
             battery_low: false"
        );
    }
}
