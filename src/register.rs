// SPDX-License-Identifier: Apache-2.0
//! Typed views of the camera's configuration registers.
use core::convert::TryFrom;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::address::{Address, RegisterAddress};
use crate::error::LibraryError;
use crate::pattern::AccessPattern;
use crate::util::is_bit_set;

/// Trait for common register functionality.
///
/// Registers are converted to and from the raw 16-bit word stored on the camera. The
/// configuration registers also contain reserved bits whose values have to be preserved, which
/// is what [`write_mask`][Register::write_mask] is for.
pub trait Register: Into<u16> + From<u16> {
    /// A bit mask of which bits may be modified by the controller.
    ///
    /// When changing register values on the camera, the current value is read, bitwise-ANDed
    /// with the complement of this mask, then bitwise-ORed with the new value. This preserves
    /// reserved bits as well as any fields this library does not model.
    fn write_mask() -> u16;

    /// The address of this register in the camera's memory map.
    fn address() -> Address;
}

/// Represents the possible states of the status register (0x8000).
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct StatusRegister {
    /// The subpage which was last updated by the camera. Read-only.
    pub(crate) last_updated_subpage: Subpage,

    /// Set when there is new data available in RAM.
    ///
    /// This flag is set to true by the camera, and can only be reset by the controller.
    pub(crate) new_data: bool,

    /// Whether data in RAM may be overwritten by the camera.
    pub(crate) overwrite_enabled: bool,
}

impl Register for StatusRegister {
    fn write_mask() -> u16 {
        // The three least significant bits (the last updated subpage) are read-only.
        0x0018
    }

    fn address() -> Address {
        RegisterAddress::Status.into()
    }
}

impl From<u16> for StatusRegister {
    fn from(raw: u16) -> Self {
        // Only the first bit is used; the other two bits of the subpage field are reserved.
        let subpage = raw & 0x0001;
        Self {
            // Unwrap is safe, the mask above leaves only 0 or 1.
            last_updated_subpage: Subpage::try_from_primitive(subpage as usize).unwrap(),
            new_data: is_bit_set(raw, 3),
            overwrite_enabled: is_bit_set(raw, 4),
        }
    }
}

impl From<StatusRegister> for u16 {
    fn from(status: StatusRegister) -> Self {
        let subpage_int: usize = status.last_updated_subpage.into();
        let mut raw = subpage_int as u16;
        raw |= (status.new_data as u16) << 3;
        raw |= (status.overwrite_enabled as u16) << 4;
        raw
    }
}

/// Represents the possible states of the control register (0x800D).
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct ControlRegister {
    // The fields in this struct are laid out from least to most significant bit in the control
    // register.
    /// Whether or not to use subpages.
    ///
    /// If subpages are disabled, only one subpage will ever be updated. The default is enabled.
    pub(crate) use_subpages: bool,

    /// Whether to keep measuring the same subpage instead of alternating.
    ///
    /// This value only has an effect when `use_subpages` is enabled. The default is disabled.
    pub(crate) subpage_repeat: bool,

    /// Which subpage to measure when `subpage_repeat` is enabled.
    pub(crate) subpage: Subpage,

    /// The rate at which the camera takes measurements.
    pub(crate) refresh_rate: RefreshRate,

    /// The resolution to run the internal ADC at.
    pub(crate) resolution: Resolution,

    /// Which access pattern the camera splits subpages by.
    pub(crate) access_pattern: AccessPattern,
}

impl Default for ControlRegister {
    /// The power-on defaults documented in the datasheet.
    fn default() -> Self {
        Self {
            use_subpages: true,
            subpage_repeat: false,
            subpage: Subpage::Zero,
            refresh_rate: RefreshRate::default(),
            resolution: Resolution::default(),
            access_pattern: AccessPattern::Chess,
        }
    }
}

impl Register for ControlRegister {
    fn write_mask() -> u16 {
        // Bits 1 and 2 (step mode and data hold) are not modeled, leave them alone.
        0x1FF9
    }

    fn address() -> Address {
        RegisterAddress::Control.into()
    }
}

impl From<u16> for ControlRegister {
    fn from(raw: u16) -> Self {
        let subpage = if is_bit_set(raw, 4) {
            Subpage::One
        } else {
            Subpage::Zero
        };
        // Unwrapping is safe for both: the masks leave three and two bits respectively, and
        // every value of those bits is a valid variant.
        let refresh_rate = RefreshRate::from_raw((raw & 0x0380) >> 7).unwrap();
        let resolution = Resolution::from_raw((raw & 0x0C00) >> 10).unwrap();
        let access_pattern = if is_bit_set(raw, 12) {
            AccessPattern::Chess
        } else {
            AccessPattern::Interleaved
        };
        Self {
            use_subpages: is_bit_set(raw, 0),
            subpage_repeat: is_bit_set(raw, 3),
            subpage,
            refresh_rate,
            resolution,
            access_pattern,
        }
    }
}

impl From<ControlRegister> for u16 {
    fn from(register: ControlRegister) -> Self {
        let mut raw = register.use_subpages as u16;
        raw |= (register.subpage_repeat as u16) << 3;
        let subpage_int: usize = register.subpage.into();
        raw |= (subpage_int as u16) << 4;
        raw |= register.refresh_rate.as_raw() << 7;
        raw |= register.resolution.as_raw() << 10;
        if register.access_pattern == AccessPattern::Chess {
            raw |= 1u16 << 12;
        }
        raw
    }
}

/// Identify which subpage to access.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(usize)]
pub enum Subpage {
    Zero = 0,
    One = 1,
}

impl Subpage {
    /// The other subpage.
    pub fn other(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
        }
    }
}

/// The possible refresh rates supported by the camera.
///
/// Before using the higher refresh rates, ensure your I²C bus is fast enough. A quick rundown
/// of the maximum refresh rate some common bus speeds can support:
///
/// * 100kHz: [4Hz][RefreshRate::Four]
/// * 400kHz: [16Hz][RefreshRate::Sixteen]
/// * 1MHz: [64Hz][RefreshRate::SixtyFour] (barely, [32Hz][RefreshRate::ThirtyTwo] is safer)
///
/// On top of this, your hardware has to be able to process each frame of data before the next
/// one is ready.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum RefreshRate {
    /// 0.5Hz, one measurement every two seconds.
    Half,

    /// 1Hz.
    One,

    /// 2Hz, the camera's default.
    Two,

    /// 4Hz.
    Four,

    /// 8Hz.
    Eight,

    /// 16Hz.
    Sixteen,

    /// 32Hz.
    ThirtyTwo,

    /// 64Hz.
    SixtyFour,
}

impl RefreshRate {
    /// Attempt to create a `RefreshRate` from the raw field value used by the camera.
    pub(crate) fn from_raw(raw_value: u16) -> Result<Self, LibraryError> {
        match raw_value {
            0 => Ok(Self::Half),
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Four),
            4 => Ok(Self::Eight),
            5 => Ok(Self::Sixteen),
            6 => Ok(Self::ThirtyTwo),
            7 => Ok(Self::SixtyFour),
            _ => Err(LibraryError::InvalidData("Invalid refresh rate given")),
        }
    }

    /// Map a refresh rate variant into the representation used by the camera.
    pub(crate) fn as_raw(&self) -> u16 {
        match self {
            Self::Half => 0,
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 3,
            Self::Eight => 4,
            Self::Sixteen => 5,
            Self::ThirtyTwo => 6,
            Self::SixtyFour => 7,
        }
    }
}

impl Default for RefreshRate {
    fn default() -> Self {
        Self::Two
    }
}

impl TryFrom<f32> for RefreshRate {
    type Error = LibraryError;

    /// Attempt to create a `RefreshRate` from a number of hertz.
    ///
    /// This only works if the source number *exactly* matches one of the values named as a
    /// variant.
    /// ```
    /// # use core::convert::TryFrom;
    /// # use mlx90640::RefreshRate;
    /// assert_eq!(RefreshRate::try_from(0.5), Ok(RefreshRate::Half));
    /// let almost_half = 0.50001;
    /// assert!(RefreshRate::try_from(almost_half).is_err());
    /// ```
    #[allow(clippy::float_cmp)]
    fn try_from(value: f32) -> Result<Self, Self::Error> {
        if value == 0.5 {
            Ok(Self::Half)
        } else if value == 1.0 {
            Ok(Self::One)
        } else if value == 2.0 {
            Ok(Self::Two)
        } else if value == 4.0 {
            Ok(Self::Four)
        } else if value == 8.0 {
            Ok(Self::Eight)
        } else if value == 16.0 {
            Ok(Self::Sixteen)
        } else if value == 32.0 {
            Ok(Self::ThirtyTwo)
        } else if value == 64.0 {
            Ok(Self::SixtyFour)
        } else {
            Err(LibraryError::InvalidData(
                "The given number does not match a valid refresh rate",
            ))
        }
    }
}

impl From<RefreshRate> for f32 {
    fn from(refresh_rate: RefreshRate) -> Self {
        match refresh_rate {
            RefreshRate::Half => 0.5,
            RefreshRate::One => 1f32,
            RefreshRate::Two => 2f32,
            RefreshRate::Four => 4f32,
            RefreshRate::Eight => 8f32,
            RefreshRate::Sixteen => 16f32,
            RefreshRate::ThirtyTwo => 32f32,
            RefreshRate::SixtyFour => 64f32,
        }
    }
}

/// The resolution of the internal [ADC][adc].
///
/// [adc]: https://en.wikipedia.org/wiki/Analog-to-digital_converter
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Resolution {
    /// 16-bit.
    Sixteen,

    /// 17-bit.
    Seventeen,

    /// 18-bit, the camera's default.
    Eighteen,

    /// 19-bit.
    Nineteen,
}

impl Resolution {
    /// Attempt to create a `Resolution` from the raw field value used by the camera.
    pub(crate) fn from_raw(raw_value: u16) -> Result<Self, LibraryError> {
        match raw_value {
            0 => Ok(Self::Sixteen),
            1 => Ok(Self::Seventeen),
            2 => Ok(Self::Eighteen),
            3 => Ok(Self::Nineteen),
            _ => Err(LibraryError::InvalidData(
                "Invalid raw resolution value given",
            )),
        }
    }

    /// Map a resolution variant into the representation used by the camera.
    pub(crate) fn as_raw(&self) -> u16 {
        match self {
            Self::Sixteen => 0,
            Self::Seventeen => 1,
            Self::Eighteen => 2,
            Self::Nineteen => 3,
        }
    }
}

impl TryFrom<u8> for Resolution {
    type Error = LibraryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            16 => Ok(Self::Sixteen),
            17 => Ok(Self::Seventeen),
            18 => Ok(Self::Eighteen),
            19 => Ok(Self::Nineteen),
            _ => Err(LibraryError::InvalidData(
                "The given value did not match a valid ADC resolution",
            )),
        }
    }
}

impl From<Resolution> for u8 {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Sixteen => 16,
            Resolution::Seventeen => 17,
            Resolution::Eighteen => 18,
            Resolution::Nineteen => 19,
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::Eighteen
    }
}
