// SPDX-License-Identifier: Apache-2.0
use core::fmt;

use embedded_hal::blocking::i2c;

use crate::address::Address;
use crate::register::Subpage;

/// Errors that don't involve the I²C bus.
#[derive(Clone, Debug, PartialEq)]
pub enum LibraryError {
    /// The camera did not acknowledge its I²C address when probed.
    CameraDetect {
        /// The 7-bit bus address that was probed.
        i2c_address: u8,
    },

    /// The calibration data read from the camera was not usable.
    MalformedCalibration {
        /// The number of 16-bit words a full calibration block contains.
        expected: usize,

        /// The number of words actually provided.
        actual: usize,
    },

    /// An operation that needs calibration data was attempted before it was loaded.
    CalibrationNotLoaded,

    /// An attempt was made to write to a location outside the writable registers.
    ReadOnlyViolation(Address),

    /// The camera did not signal a completed measurement within the polling limit.
    DataNotAvailable {
        /// How many times the status register was polled before giving up.
        attempts: usize,
    },

    /// The camera produced a measurement for a different subpage than the one expected.
    SubpageOutOfSync {
        expected: Subpage,
        actual: Subpage,
    },

    /// A value read from the camera is malformed in some way.
    InvalidData(&'static str),
}

impl fmt::Display for LibraryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::CameraDetect { i2c_address } => {
                write!(f, "No camera responding at I2C address 0x{:02X}", i2c_address)
            }
            LibraryError::MalformedCalibration { expected, actual } => write!(
                f,
                "Malformed calibration data: expected {} words, got {}",
                expected, actual
            ),
            LibraryError::CalibrationNotLoaded => {
                write!(f, "Calibration data has not been loaded yet")
            }
            LibraryError::ReadOnlyViolation(address) => {
                write!(f, "Attempted write to read-only address {}", address)
            }
            LibraryError::DataNotAvailable { attempts } => write!(
                f,
                "No new measurement available after polling {} times",
                attempts
            ),
            LibraryError::SubpageOutOfSync { expected, actual } => write!(
                f,
                "Camera measured subpage {:?} while subpage {:?} was expected",
                actual, expected
            ),
            LibraryError::InvalidData(msg) => write!(f, "{}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LibraryError {}

/// All the ways interacting with the camera can fail.
///
/// This type is generic over the I²C implementation so bus errors can be passed through
/// unchanged. Separate variants are kept for read and write failures as `embedded-hal` allows
/// the two traits to have different error types.
pub enum Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    /// An error from the I²C implementation during a combined write-read transfer.
    I2cWriteReadError(<I2C as i2c::WriteRead>::Error),

    /// An error from the I²C implementation during a write.
    I2cWriteError(<I2C as i2c::Write>::Error),

    /// An error originating within this library.
    LibraryError(LibraryError),
}

// Manual implementation so the bound lands on the error types instead of on I2C itself.
impl<I2C> Clone for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: Clone,
    <I2C as i2c::Write>::Error: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Error::I2cWriteReadError(i2c_error) => Error::I2cWriteReadError(i2c_error.clone()),
            Error::I2cWriteError(i2c_error) => Error::I2cWriteError(i2c_error.clone()),
            Error::LibraryError(lib_err) => Error::LibraryError(lib_err.clone()),
        }
    }
}

// Same reasoning as the Clone implementation above.
impl<I2C> PartialEq for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: PartialEq,
    <I2C as i2c::Write>::Error: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::I2cWriteReadError(left), Error::I2cWriteReadError(right)) => left == right,
            (Error::I2cWriteError(left), Error::I2cWriteError(right)) => left == right,
            (Error::LibraryError(left), Error::LibraryError(right)) => left == right,
            _ => false,
        }
    }
}

// Custom Debug implementation so that I2C itself doesn't need to implement Debug (like the one
// from linux-embedded-hal).
impl<I2C> fmt::Debug for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: fmt::Debug,
    <I2C as i2c::Write>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2cWriteReadError(i2c_error) => f
                .debug_tuple("Error::I2cWriteReadError")
                .field(i2c_error)
                .finish(),
            Error::I2cWriteError(i2c_error) => f
                .debug_tuple("Error::I2cWriteError")
                .field(i2c_error)
                .finish(),
            Error::LibraryError(err) => f.debug_tuple("Error::LibraryError").field(err).finish(),
        }
    }
}

impl<I2C> fmt::Display for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: fmt::Debug,
    <I2C as i2c::Write>::Error: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2cWriteReadError(i2c_error) => write!(f, "I2C Error: {:?}", i2c_error),
            Error::I2cWriteError(i2c_error) => write!(f, "I2C Error: {:?}", i2c_error),
            Error::LibraryError(err) => write!(f, "Library Error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<I2C> std::error::Error for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
    <I2C as i2c::WriteRead>::Error: std::error::Error + 'static,
    <I2C as i2c::Write>::Error: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::I2cWriteReadError(i2c_error) => Some(i2c_error),
            Error::I2cWriteError(i2c_error) => Some(i2c_error),
            Error::LibraryError(lib_err) => Some(lib_err),
        }
    }
}

impl<I2C> From<LibraryError> for Error<I2C>
where
    I2C: i2c::WriteRead + i2c::Write,
{
    fn from(lib_err: LibraryError) -> Self {
        Self::LibraryError(lib_err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::address::RegisterAddress;
    use crate::test::{mock_camera, MockCamera};

    #[test]
    fn errors_clone_and_compare_through_their_error_types() {
        // The bus type itself only needs its *error* types to be Clone and PartialEq.
        let library: Error<MockCamera> = LibraryError::CalibrationNotLoaded.into();
        assert_eq!(library.clone(), library);

        let mut bus = mock_camera();
        bus.set_responding(false);
        let transport =
            crate::bus::read_word(&mut bus, 0x33, RegisterAddress::Control.into()).unwrap_err();
        assert_eq!(transport.clone(), transport);
        assert_ne!(transport, library);
    }
}
