// SPDX-License-Identifier: Apache-2.0
//! Addresses within the camera's memory map.
use core::fmt;

use num_enum::IntoPrimitive;

/// A 16-bit address in the camera's memory map.
///
/// The MLX90640 exposes its EEPROM, measurement RAM and configuration registers through one
/// flat, word-addressed memory map. Every transfer on the bus starts with one of these
/// addresses, sent big-endian.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Address(u16);

impl Address {
    /// The big-endian byte representation used on the wire.
    pub(crate) const fn as_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// The address `words` 16-bit words past this one.
    pub(crate) const fn offset(self, words: u16) -> Self {
        Self(self.0 + words)
    }
}

impl From<u16> for Address {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Address> for u16 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// RAM locations used when reading out a measurement.
///
/// The pixel data is one contiguous block starting at [`PixelBase`][RamAddress::PixelBase],
/// followed by a sparse collection of analog measurements the compensation process needs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive)]
#[repr(u16)]
pub(crate) enum RamAddress {
    /// The first pixel, at row 0, column 0. The rest follow in row-major order.
    PixelBase = 0x0400,

    /// The proportional-to-base-voltage half of the ambient temperature measurement.
    TaVBe = 0x0700,

    /// The gain measurement for the current frame.
    Gain = 0x070A,

    /// The proportional-to-absolute-temperature half of the ambient temperature measurement.
    TaPtat = 0x0720,

    /// The raw pixel supply voltage measurement.
    VddPixel = 0x072A,

    /// One past the last RAM address.
    End = 0x0740,
}

impl From<RamAddress> for Address {
    fn from(ram: RamAddress) -> Self {
        Self(ram.into())
    }
}

/// The bounds of the calibration EEPROM.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive)]
#[repr(u16)]
pub(crate) enum EepromAddress {
    Base = 0x2400,
    /// One past the last EEPROM address.
    End = 0x2740,
}

impl From<EepromAddress> for Address {
    fn from(eeprom: EepromAddress) -> Self {
        Self(eeprom.into())
    }
}

/// The configuration registers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive)]
#[repr(u16)]
pub(crate) enum RegisterAddress {
    Status = 0x8000,
    Control = 0x800D,
    I2cConfig = 0x800F,
}

impl From<RegisterAddress> for Address {
    fn from(register: RegisterAddress) -> Self {
        Self(register.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn wire_format_is_big_endian() {
        let address = Address::from(0x2400);
        assert_eq!(address.as_bytes(), [0x24, 0x00]);
    }

    #[test]
    fn offsets() {
        let base: Address = EepromAddress::Base.into();
        assert_eq!(u16::from(base.offset(0x40)), 0x2440);
    }

    #[test]
    fn ram_extent() {
        // 768 pixels followed by the analog measurement block.
        let pixels = u16::from(RamAddress::End) - u16::from(RamAddress::PixelBase);
        assert_eq!(pixels, 832);
    }
}
